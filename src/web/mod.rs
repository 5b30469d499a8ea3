pub mod auth;
pub mod csrf;
pub mod forms;
pub mod registration;
pub mod responses;
pub mod router;
pub mod signup;
pub mod state;
pub mod submission;
pub mod templates;
pub mod uploads;

pub use state::AppState;
