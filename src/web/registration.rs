use std::borrow::Cow;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{debug, error, info, warn};

use crate::web::{
    AppState,
    auth::hash_password,
    csrf::{self, CSRF_FIELD},
    forms::{self, FormState, REGISTRATION_FORM, ValidatedForm},
    responses::{csrf_rejection, server_error},
    submission::Submission,
    templates::{PageLayout, escape_html, render_form, render_page, render_summary},
    uploads::{SavedFile, save_upload},
};

pub const UPLOADS_URL_PREFIX: &str = "/uploads";

pub async fn registration_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Html<String>) {
    let (jar, token) = csrf::issue_token(jar, state.settings());
    (jar, Html(render_registration_page(&FormState::default(), &token)))
}

pub async fn submit_registration(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    submission: Submission,
) -> Response {
    let settings = state.settings();

    if let Err(err) = csrf::verify_token(
        &jar,
        submission.first_text(CSRF_FIELD),
        settings.csrf_time_limit,
    ) {
        warn!(form = REGISTRATION_FORM.name, reason = %err, "rejected submission");
        return csrf_rejection(&err).into_response();
    }

    let form = match forms::validate(&REGISTRATION_FORM, &submission) {
        Ok(form) => form,
        Err(form_state) => {
            debug!(
                form = REGISTRATION_FORM.name,
                fields = ?form_state.fields_with_errors(),
                "validation failed"
            );
            let (jar, token) = csrf::issue_token(jar, settings);
            return (jar, Html(render_registration_page(&form_state, &token))).into_response();
        }
    };

    let password_hash = match hash_password(form.text("password").unwrap_or_default()) {
        Ok(hash) => hash,
        Err(err) => {
            error!(%err, "failed to hash password");
            return server_error().into_response();
        }
    };

    let saved = match form.file("profile_picture") {
        Some(file) => match save_upload(file, &settings.upload_folder).await {
            Ok(saved) => {
                debug!(
                    original = %saved.original_name,
                    stored = %saved.stored_path.display(),
                    bytes = saved.file_size,
                    content_type = file.content_type.as_deref(),
                    "stored upload"
                );
                Some(saved)
            }
            Err(err) => {
                error!(?err, "failed to store uploaded file");
                return server_error().into_response();
            }
        },
        None => None,
    };

    info!(
        form = REGISTRATION_FORM.name,
        stored_file = saved.as_ref().map(|file| file.stored_name.as_str()),
        "registration submitted"
    );

    Html(render_registration_success(&form, &password_hash, saved.as_ref())).into_response()
}

fn render_registration_page(state: &FormState, csrf_token: &str) -> String {
    render_page(PageLayout {
        meta_title: "Registration",
        page_heading: "Registration",
        note_html: Cow::Borrowed("Fill in every field; the profile picture is optional."),
        body_html: Cow::Owned(render_form(
            &REGISTRATION_FORM,
            "/",
            state,
            csrf_token,
            "Submit",
        )),
    })
}

fn render_registration_success(
    form: &ValidatedForm,
    password_hash: &str,
    saved: Option<&SavedFile>,
) -> String {
    let text = |name: &str| escape_html(form.text(name).unwrap_or_default());
    let choice = |name: &str| {
        escape_html(form.choice(name).map(|c| c.value).unwrap_or_default())
    };
    let remember_me = if form.flag("remember_me") { "True" } else { "False" };
    let picture = match saved {
        Some(file) => format!(
            r#"<img src="{prefix}/{name}" alt="Profile picture" width="150">"#,
            prefix = UPLOADS_URL_PREFIX,
            name = escape_html(&file.stored_name),
        ),
        None => "No file uploaded".to_string(),
    };

    let rows = [
        ("Username", text("username")),
        ("Password", escape_html(password_hash)),
        ("Remember Me", remember_me.to_string()),
        ("Salary", text("salary")),
        ("Gender", choice("gender")),
        ("Country", choice("country")),
        ("Message", text("message")),
        ("Profile Picture", picture),
    ];

    render_page(PageLayout {
        meta_title: "Registration",
        page_heading: "Form Submitted Successfully!",
        note_html: Cow::Borrowed("The values below were received."),
        body_html: Cow::Owned(render_summary(&rows)),
    })
}
