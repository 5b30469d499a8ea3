use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::web::{
    AppState,
    registration::{self, UPLOADS_URL_PREFIX},
    signup,
};

pub fn build_router(state: AppState) -> Router {
    let settings = state.settings();
    let uploads = ServeDir::new(&settings.upload_folder);
    let body_limit = settings.max_content_length;

    Router::new()
        .route(
            "/",
            get(registration::registration_page).post(registration::submit_registration),
        )
        .route(
            "/signup",
            get(signup::signup_page).post(signup::submit_signup),
        )
        .route("/healthz", get(healthz))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
