use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use cookie::time::Duration as CookieDuration;
use rand_core::{OsRng, RngCore};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::Settings;

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_FIELD: &str = "csrf_token";

const TOKEN_BYTES: usize = 32;

/// Reasons a submission is rejected before its fields are looked at.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsrfError {
    #[error("The CSRF token is missing.")]
    MissingToken,
    #[error("The CSRF session token is missing.")]
    MissingSessionToken,
    #[error("The CSRF token has expired.")]
    Expired,
    #[error("The CSRF tokens do not match.")]
    Mismatch,
}

/// Return the token to embed in the form's hidden field, stamping the signed
/// cookie with the render time.
///
/// The secret lives for the whole browser session: a still-valid cookie keeps its
/// token so forms open in other tabs stay submittable. A new secret is minted only
/// when the cookie is missing, unsigned or expired.
pub fn issue_token(jar: SignedCookieJar, settings: &Settings) -> (SignedCookieJar, String) {
    issue_token_at(jar, settings, Utc::now())
}

fn issue_token_at(
    jar: SignedCookieJar,
    settings: &Settings,
    now: DateTime<Utc>,
) -> (SignedCookieJar, String) {
    let token = match stored_token(&jar) {
        Some((issued_at, token)) if !is_expired(issued_at, settings.csrf_time_limit, now) => token,
        _ => mint_token(),
    };

    let mut cookie = Cookie::new(CSRF_COOKIE, format!("{}.{}", now.timestamp(), token));
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::seconds(
        settings.permanent_session_lifetime.num_seconds(),
    ));

    (jar.add(cookie), token)
}

fn mint_token() -> String {
    let mut raw = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Issue time and secret held by the signed cookie, if it is present and intact.
fn stored_token(jar: &SignedCookieJar) -> Option<(i64, String)> {
    // A cookie whose signature does not check out is dropped by the jar.
    let cookie = jar.get(CSRF_COOKIE)?;
    let (issued, token) = cookie.value().split_once('.')?;
    let issued = issued.parse::<i64>().ok()?;
    (!token.is_empty()).then(|| (issued, token.to_string()))
}

fn is_expired(issued_at: i64, time_limit: Duration, now: DateTime<Utc>) -> bool {
    now.timestamp() - issued_at > time_limit.num_seconds()
}

/// Check the submitted hidden field against the signed cookie.
pub fn verify_token(
    jar: &SignedCookieJar,
    submitted: Option<&str>,
    time_limit: Duration,
) -> Result<(), CsrfError> {
    verify_token_at(jar, submitted, time_limit, Utc::now())
}

fn verify_token_at(
    jar: &SignedCookieJar,
    submitted: Option<&str>,
    time_limit: Duration,
    now: DateTime<Utc>,
) -> Result<(), CsrfError> {
    let submitted = submitted
        .filter(|value| !value.is_empty())
        .ok_or(CsrfError::MissingToken)?;

    let (issued_at, expected) = stored_token(jar).ok_or(CsrfError::MissingSessionToken)?;

    if is_expired(issued_at, time_limit, now) {
        return Err(CsrfError::Expired);
    }

    let matches: bool = submitted.as_bytes().ct_eq(expected.as_bytes()).into();
    if !matches {
        return Err(CsrfError::Mismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use axum_extra::extract::cookie::Key;

    fn settings() -> Settings {
        Settings::resolve(|key| (key == "APP_ENV").then(|| "testing".to_string()))
            .expect("settings")
    }

    fn jar() -> SignedCookieJar {
        SignedCookieJar::new(Key::generate())
    }

    #[test]
    fn issued_token_verifies() {
        let settings = settings();
        let (jar, token) = issue_token(jar(), &settings);
        assert_eq!(
            verify_token(&jar, Some(&token), settings.csrf_time_limit),
            Ok(())
        );
    }

    #[test]
    fn missing_field_is_reported_first() {
        let settings = settings();
        assert_eq!(
            verify_token(&jar(), None, settings.csrf_time_limit),
            Err(CsrfError::MissingToken)
        );
        assert_eq!(
            verify_token(&jar(), Some(""), settings.csrf_time_limit),
            Err(CsrfError::MissingToken)
        );
    }

    #[test]
    fn missing_cookie_is_rejected() {
        let settings = settings();
        assert_eq!(
            verify_token(&jar(), Some("anything"), settings.csrf_time_limit),
            Err(CsrfError::MissingSessionToken)
        );
    }

    #[test]
    fn unsigned_cookie_is_ignored() {
        let settings = settings();
        let forged = format!("{CSRF_COOKIE}={}.forged", Utc::now().timestamp());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&forged).expect("header"),
        );
        let jar = SignedCookieJar::from_headers(&headers, Key::generate());
        assert_eq!(
            verify_token(&jar, Some("forged"), settings.csrf_time_limit),
            Err(CsrfError::MissingSessionToken)
        );
    }

    #[test]
    fn stale_token_expires() {
        let settings = settings();
        let issued = Utc::now() - Duration::hours(2);
        let (jar, token) = issue_token_at(jar(), &settings, issued);
        assert_eq!(
            verify_token(&jar, Some(&token), Duration::hours(1)),
            Err(CsrfError::Expired)
        );
        assert_eq!(
            verify_token_at(&jar, Some(&token), Duration::hours(1), issued),
            Ok(())
        );
    }

    #[test]
    fn different_token_mismatches() {
        let settings = settings();
        let (jar, token) = issue_token(jar(), &settings);
        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(
            verify_token(&jar, Some(&tampered), settings.csrf_time_limit),
            Err(CsrfError::Mismatch)
        );
        let (_, other) = issue_token(self::jar(), &settings);
        assert_eq!(
            verify_token(&jar, Some(&other), settings.csrf_time_limit),
            Err(CsrfError::Mismatch)
        );
    }

    #[test]
    fn live_cookie_keeps_its_secret() {
        let settings = settings();
        let (jar, first) = issue_token(jar(), &settings);
        let (jar, second) = issue_token(jar, &settings);
        assert_eq!(first, second);
        assert_eq!(
            verify_token(&jar, Some(&first), settings.csrf_time_limit),
            Ok(())
        );
    }

    #[test]
    fn expired_cookie_gets_a_new_secret() {
        let settings = settings();
        let issued = Utc::now() - settings.csrf_time_limit - Duration::seconds(1);
        let (jar, stale) = issue_token_at(jar(), &settings, issued);
        let (jar, fresh) = issue_token(jar, &settings);
        assert_ne!(stale, fresh);
        assert_eq!(
            verify_token(&jar, Some(&fresh), settings.csrf_time_limit),
            Ok(())
        );
        assert_eq!(
            verify_token(&jar, Some(&stale), settings.csrf_time_limit),
            Err(CsrfError::Mismatch)
        );
    }

    #[test]
    fn prefix_of_token_mismatches() {
        let settings = settings();
        let (jar, token) = issue_token(jar(), &settings);
        assert_eq!(
            verify_token(&jar, Some(&token[..token.len() - 1]), settings.csrf_time_limit),
            Err(CsrfError::Mismatch)
        );
    }
}
