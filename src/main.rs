mod config;
mod web;

use std::{env, net::SocketAddr};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::Settings,
    web::{AppState, uploads},
};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let settings = Settings::from_env();
    init_tracing(settings.as_ref().is_ok_and(|settings| settings.debug));

    let result = match settings {
        Ok(settings) => app_main(settings).await,
        Err(err) => Err(err).context("failed to resolve configuration"),
    };

    if let Err(err) = result {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main(settings: Settings) -> Result<()> {
    info!(
        environment = settings.environment.as_str(),
        debug = settings.debug,
        testing = settings.testing,
        session_type = settings.session_type.as_str(),
        database = settings.database_url().split(':').next().unwrap_or_default(),
        "configuration resolved"
    );
    debug!(?settings, "effective settings");

    uploads::ensure_directory(&settings.upload_folder)
        .await
        .context("failed to prepare upload folder")?;

    let state = AppState::new(settings)?;
    let app = web::router::build_router(state);

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
