use std::collections::HashMap;

use axum::{
    Form, async_trait,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::web::templates::render_error_page;

/// A file part buffered from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to parse form body: {message}")]
    Malformed { status: StatusCode, message: String },
}

impl SubmissionError {
    fn malformed(status: StatusCode, message: impl Into<String>) -> Self {
        SubmissionError::Malformed {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SubmissionError::Malformed { status, .. } => *status,
        }
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Bad Request");
        (status, Html(render_error_page(status, reason, &self.to_string()))).into_response()
    }
}

/// Raw POST body: every text value keyed by field name, plus buffered file parts.
///
/// Nothing here is validated; the body is only read so the CSRF check and the
/// form schema can look at it afterwards. Size is bounded by the router's body limit.
#[derive(Debug, Default)]
pub struct Submission {
    text_fields: HashMap<String, Vec<String>>,
    files: Vec<UploadedFile>,
}

impl Submission {
    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.text_fields
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn first_text(&self, field_name: &str) -> Option<&str> {
        self.text_fields
            .get(field_name)
            .and_then(|values| values.first().map(|s| s.as_str()))
    }

    pub fn first_file(&self, field_name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.field_name == field_name)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, SubmissionError> {
        let mut submission = Submission::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| SubmissionError::malformed(err.status(), err.body_text()))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field
                    .text()
                    .await
                    .map_err(|err| SubmissionError::malformed(err.status(), err.body_text()))?;
                submission.push_text(field_name, value);
                continue;
            };

            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| SubmissionError::malformed(err.status(), err.body_text()))?;

            submission.push_file(UploadedFile {
                field_name,
                original_name: file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        }

        Ok(submission)
    }
}

#[async_trait]
impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = SubmissionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|err| SubmissionError::malformed(err.status(), err.body_text()))?;
            return Submission::from_multipart(multipart).await;
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|err| SubmissionError::malformed(err.status(), err.body_text()))?;

        let mut submission = Submission::default();
        for (name, value) in pairs {
            submission.push_text(name, value);
        }
        Ok(submission)
    }
}
