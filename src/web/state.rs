use std::sync::Arc;

use anyhow::{Result, anyhow};
use argon2::Argon2;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::Settings;

// Fixed salt for stretching the configured secret into cookie signing material.
const COOKIE_KEY_SALT: &[u8] = b"form-portal.cookie-signing";

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let cookie_key = derive_cookie_key(settings.secret_key())?;
        Ok(Self {
            settings: Arc::new(settings),
            cookie_key,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Signing keys need 64 bytes; secrets are commonly shorter, so run them through argon2 first.
fn derive_cookie_key(secret: &str) -> Result<Key> {
    let mut material = [0u8; 64];
    Argon2::default()
        .hash_password_into(secret.as_bytes(), COOKIE_KEY_SALT, &mut material)
        .map_err(|err| anyhow!("failed to derive cookie signing key: {err}"))?;
    Ok(Key::from(&material))
}
