use std::borrow::Cow;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};

use crate::web::{
    csrf::CSRF_FIELD,
    forms::{Choice, FieldDescriptor, FieldKind, FormSchema, FormState},
};

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 2rem 1.5rem; border-bottom: 1px solid #e2e8f0; }
        .header-bar { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        .nav-link { display: inline-flex; align-items: center; gap: 0.4rem; color: #1d4ed8; text-decoration: none; font-weight: 600; background: #e0f2fe; padding: 0.5rem 0.95rem; border-radius: 999px; border: 1px solid #bfdbfe; }
        .nav-link:hover { background: #bfdbfe; border-color: #93c5fd; }
        main { padding: 2rem 1.5rem; max-width: 720px; margin: 0 auto; box-sizing: border-box; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        .field { margin-bottom: 1.25rem; }
        label { display: block; margin-bottom: 0.5rem; font-weight: 600; color: #0f172a; }
        label.inline { display: inline-flex; align-items: center; gap: 0.4rem; font-weight: 500; margin-right: 1rem; }
        input[type="text"], input[type="password"], select, textarea { width: 100%; padding: 0.75rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; box-sizing: border-box; font-size: 1rem; }
        input:focus, select:focus, textarea:focus { outline: none; border-color: #2563eb; box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.12); }
        textarea { min-height: 6rem; }
        .field.has-error input, .field.has-error select, .field.has-error textarea { border-color: #dc2626; }
        .field-errors { list-style: none; margin: 0.4rem 0 0; padding: 0; color: #b91c1c; font-size: 0.9rem; }
        button { padding: 0.85rem 1.2rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        button:hover { background: #1d4ed8; }
        .note { color: #475569; font-size: 0.95rem; line-height: 1.6; }
        .summary { width: 100%; border-collapse: collapse; }
        .summary th, .summary td { padding: 0.65rem 0.85rem; border-bottom: 1px solid #e2e8f0; text-align: left; vertical-align: top; }
        .summary th { width: 30%; color: #475569; font-weight: 600; }
        .summary td { word-break: break-all; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
        @media (max-width: 768px) {
            header { padding: 1.5rem 1rem; }
            main { padding: 1.5rem 1rem; }
            .header-bar { flex-direction: column; align-items: flex-start; }
        }
"#;

pub struct PageLayout<'a> {
    pub meta_title: &'a str,
    pub page_heading: &'a str,
    pub note_html: Cow<'a, str>,
    pub body_html: Cow<'a, str>,
}

pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        meta_title,
        page_heading,
        note_html,
        body_html,
    } = layout;

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <div class="header-bar">
            <h1>{page_heading}</h1>
            <div style="display:flex; gap:0.75rem; align-items:center; flex-wrap:wrap;">
                <a class="nav-link" href="/">Register</a>
                <a class="nav-link" href="/signup">Sign up</a>
            </div>
        </div>
        <p class="note">{note_html}</p>
    </header>
    <main>
{body_html}
        {footer}
    </main>
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        page_heading = escape_html(page_heading),
        styles = PAGE_BASE_STYLES,
        footer = render_footer(),
    )
}

/// Render `schema` as an HTML form posting to `action`, annotated with the values and
/// errors held in `state`.
pub fn render_form(
    schema: &FormSchema,
    action: &str,
    state: &FormState,
    csrf_token: &str,
    submit_label: &str,
) -> String {
    let has_file = schema
        .fields
        .iter()
        .any(|field| matches!(field.kind, FieldKind::File));
    let enctype = if has_file {
        r#" enctype="multipart/form-data""#
    } else {
        ""
    };

    let fields = schema
        .fields
        .iter()
        .map(|field| render_field(field, state))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <section class="panel">
            <form method="post" action="{action}" data-form="{name}"{enctype} novalidate>
                <input type="hidden" name="{csrf_field}" value="{csrf_token}">
{fields}
                <button type="submit">{submit_label}</button>
            </form>
        </section>"#,
        action = escape_html(action),
        name = schema.name,
        csrf_field = CSRF_FIELD,
        csrf_token = escape_html(csrf_token),
        submit_label = escape_html(submit_label),
    )
}

fn render_field(field: &FieldDescriptor, state: &FormState) -> String {
    let name = field.name;
    let label = escape_html(field.label);
    let value = escape_html(state.value(name).unwrap_or(""));
    let required = if field.is_required() { " required" } else { "" };

    let control = match &field.kind {
        FieldKind::Text => format!(
            r#"<label for="{name}">{label}</label>
                    <input type="text" id="{name}" name="{name}" value="{value}"{required}>"#
        ),
        FieldKind::Secret => format!(
            r#"<label for="{name}">{label}</label>
                    <input type="password" id="{name}" name="{name}" value=""{required}>"#
        ),
        FieldKind::Boolean => {
            let checked = if value.is_empty() || value == "false" {
                ""
            } else {
                " checked"
            };
            format!(
                r#"<label class="inline"><input type="checkbox" id="{name}" name="{name}" value="y"{checked}> {label}</label>"#
            )
        }
        FieldKind::Decimal => format!(
            r#"<label for="{name}">{label}</label>
                    <input type="text" inputmode="decimal" id="{name}" name="{name}" value="{value}"{required}>"#
        ),
        FieldKind::Radio(choices) => {
            let options = choices
                .iter()
                .enumerate()
                .map(|(index, choice)| render_radio(name, index, choice, &value))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<label>{label}</label>
{options}"#
            )
        }
        FieldKind::Select(choices) => {
            let options = choices
                .iter()
                .map(|choice| {
                    let selected = if choice.value == value { " selected" } else { "" };
                    format!(
                        r#"                        <option value="{value}"{selected}>{label}</option>"#,
                        value = escape_html(choice.value),
                        label = escape_html(choice.label),
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<label for="{name}">{label}</label>
                    <select id="{name}" name="{name}"{required}>
{options}
                    </select>"#
            )
        }
        FieldKind::TextArea => format!(
            r#"<label for="{name}">{label}</label>
                    <textarea id="{name}" name="{name}"{required}>{value}</textarea>"#
        ),
        FieldKind::File => format!(
            r#"<label for="{name}">{label}</label>
                    <input type="file" id="{name}" name="{name}"{required}>"#
        ),
    };

    let errors = state.errors_for(name);
    let (class, error_list) = if errors.is_empty() {
        ("field", String::new())
    } else {
        let items = errors
            .iter()
            .map(|message| format!("<li>{}</li>", escape_html(message)))
            .collect::<String>();
        (
            "field has-error",
            format!("\n                    <ul class=\"field-errors\" data-errors-for=\"{name}\">{items}</ul>"),
        )
    };

    format!(
        r#"                <div class="{class}">
                    {control}{error_list}
                </div>"#
    )
}

fn render_radio(name: &str, index: usize, choice: &Choice, current: &str) -> String {
    let checked = if choice.value == current {
        " checked"
    } else {
        ""
    };
    format!(
        r#"                    <label class="inline" for="{name}-{index}"><input type="radio" id="{name}-{index}" name="{name}" value="{value}"{checked}> {label}</label>"#,
        value = escape_html(choice.value),
        label = escape_html(choice.label),
    )
}

/// Two-column table of already-escaped values.
pub fn render_summary(rows: &[(&str, String)]) -> String {
    let rows = rows
        .iter()
        .map(|(label, value_html)| {
            format!(
                r#"                <tr><th>{label}</th><td>{value_html}</td></tr>"#,
                label = escape_html(label),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <section class="panel">
            <table class="summary">
{rows}
            </table>
        </section>"#
    )
}

pub fn render_error_page(status: StatusCode, title: &str, detail: &str) -> String {
    let body = format!(
        r#"        <section class="panel">
            <h2>{code} {title}</h2>
            <p>{detail}</p>
        </section>"#,
        code = status.as_u16(),
        title = escape_html(title),
        detail = escape_html(detail),
    );
    render_page(PageLayout {
        meta_title: title,
        page_heading: title,
        note_html: Cow::Borrowed("The request could not be processed."),
        body_html: Cow::Owned(body),
    })
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© {year} Form Portal</footer>"#,
        year = current_year
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::forms::{LOGIN_FORM, REGISTRATION_FORM};

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn registration_form_is_multipart_with_every_field() {
        let html = render_form(&REGISTRATION_FORM, "/", &FormState::default(), "tok", "Submit");
        assert!(html.contains(r#"enctype="multipart/form-data""#));
        assert!(html.contains(r#"name="csrf_token" value="tok""#));
        for field in REGISTRATION_FORM.fields {
            assert!(html.contains(&format!(r#"name="{}""#, field.name)), "{}", field.name);
        }
        assert!(html.contains(r#"<option value="US">United States</option>"#));
        assert!(html.contains(r#"value="F"> Female"#));
        assert!(!html.contains("field-errors"));
    }

    #[test]
    fn login_form_is_urlencoded() {
        let html = render_form(&LOGIN_FORM, "/signup", &FormState::default(), "tok", "Submit");
        assert!(!html.contains("enctype"));
        assert!(html.contains(r#"type="password""#));
    }

    #[test]
    fn error_page_escapes_detail() {
        let html = render_error_page(StatusCode::BAD_REQUEST, "Bad Request", "<b>nope</b>");
        assert!(html.contains("400 Bad Request"));
        assert!(html.contains("&lt;b&gt;nope&lt;/b&gt;"));
    }
}
