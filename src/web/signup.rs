use std::borrow::Cow;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{debug, info, warn};

use crate::web::{
    AppState,
    csrf::{self, CSRF_FIELD},
    forms::{self, FormState, LOGIN_FORM},
    responses::csrf_rejection,
    submission::Submission,
    templates::{PageLayout, escape_html, render_form, render_page},
};

pub async fn signup_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Html<String>) {
    let (jar, token) = csrf::issue_token(jar, state.settings());
    (jar, Html(render_signup_page(&FormState::default(), &token)))
}

pub async fn submit_signup(
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
        warn!(form = LOGIN_FORM.name, reason = %err, "rejected submission");
        return csrf_rejection(&err).into_response();
    }

    match forms::validate(&LOGIN_FORM, &submission) {
        Ok(form) => {
            let username = form.text("username").unwrap_or_default();
            info!(form = LOGIN_FORM.name, "signup submitted");
            Html(render_signup_success(username)).into_response()
        }
        Err(form_state) => {
            debug!(
                form = LOGIN_FORM.name,
                fields = ?form_state.fields_with_errors(),
                "validation failed"
            );
            let (jar, token) = csrf::issue_token(jar, settings);
            (jar, Html(render_signup_page(&form_state, &token))).into_response()
        }
    }
}

fn render_signup_page(state: &FormState, csrf_token: &str) -> String {
    render_page(PageLayout {
        meta_title: "Sign up",
        page_heading: "Sign up",
        note_html: Cow::Borrowed(
            "Usernames are 4 to 15 characters; passwords are 8 to 80 characters.",
        ),
        body_html: Cow::Owned(render_form(&LOGIN_FORM, "/signup", state, csrf_token, "Submit")),
    })
}

fn render_signup_success(username: &str) -> String {
    let body = format!(
        r#"        <section class="panel">
            <h2>Signup Successful! Username: {username}</h2>
        </section>"#,
        username = escape_html(username),
    );
    render_page(PageLayout {
        meta_title: "Sign up",
        page_heading: "Sign up",
        note_html: Cow::Borrowed("Your details were accepted."),
        body_html: Cow::Owned(body),
    })
}
