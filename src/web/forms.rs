use std::collections::HashMap;

use crate::web::submission::{Submission, UploadedFile};

const REQUIRED_MESSAGE: &str = "This field is required.";
const INVALID_DECIMAL_MESSAGE: &str = "Not a valid decimal value.";
const INVALID_CHOICE_MESSAGE: &str = "Not a valid choice.";

// Checkbox values that count as unchecked.
const FALSE_VALUES: &[&str] = &["", "false"];

#[derive(Debug, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug)]
pub enum FieldKind {
    Text,
    Secret,
    Boolean,
    Decimal,
    Radio(&'static [Choice]),
    Select(&'static [Choice]),
    TextArea,
    File,
}

#[derive(Debug)]
pub enum Rule {
    Required {
        message: Option<&'static str>,
    },
    /// Bounds are inclusive and counted in characters.
    Length {
        min: usize,
        max: usize,
        message: Option<&'static str>,
    },
}

#[derive(Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
}

impl FieldDescriptor {
    fn required_message(&self) -> Option<&'static str> {
        self.rules.iter().find_map(|rule| match rule {
            Rule::Required { message } => Some(message.unwrap_or(REQUIRED_MESSAGE)),
            _ => None,
        })
    }

    pub fn is_required(&self) -> bool {
        self.required_message().is_some()
    }
}

#[derive(Debug)]
pub struct FormSchema {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

pub const GENDER_CHOICES: &[Choice] = &[
    Choice {
        value: "M",
        label: "Male",
    },
    Choice {
        value: "F",
        label: "Female",
    },
];

pub const COUNTRY_CHOICES: &[Choice] = &[
    Choice {
        value: "US",
        label: "United States",
    },
    Choice {
        value: "CA",
        label: "Canada",
    },
];

const REQUIRED: &[Rule] = &[Rule::Required { message: None }];

pub static REGISTRATION_FORM: FormSchema = FormSchema {
    name: "registration",
    fields: &[
        FieldDescriptor {
            name: "username",
            label: "Username",
            kind: FieldKind::Text,
            rules: REQUIRED,
        },
        FieldDescriptor {
            name: "password",
            label: "Password",
            kind: FieldKind::Secret,
            rules: REQUIRED,
        },
        FieldDescriptor {
            name: "remember_me",
            label: "Remember Me",
            kind: FieldKind::Boolean,
            rules: &[],
        },
        FieldDescriptor {
            name: "salary",
            label: "Salary",
            kind: FieldKind::Decimal,
            rules: REQUIRED,
        },
        FieldDescriptor {
            name: "gender",
            label: "Gender",
            kind: FieldKind::Radio(GENDER_CHOICES),
            rules: REQUIRED,
        },
        FieldDescriptor {
            name: "country",
            label: "Country",
            kind: FieldKind::Select(COUNTRY_CHOICES),
            rules: REQUIRED,
        },
        FieldDescriptor {
            name: "message",
            label: "Message",
            kind: FieldKind::TextArea,
            rules: REQUIRED,
        },
        FieldDescriptor {
            name: "profile_picture",
            label: "Profile Picture",
            kind: FieldKind::File,
            rules: &[],
        },
    ],
};

pub static LOGIN_FORM: FormSchema = FormSchema {
    name: "login",
    fields: &[
        FieldDescriptor {
            name: "username",
            label: "Username",
            kind: FieldKind::Text,
            rules: &[
                Rule::Required {
                    message: Some("Username Required"),
                },
                Rule::Length {
                    min: 4,
                    max: 15,
                    message: Some("Username must be between 4 and 15 characters"),
                },
            ],
        },
        FieldDescriptor {
            name: "password",
            label: "Password",
            kind: FieldKind::Secret,
            rules: &[
                Rule::Required {
                    message: Some("Password Required"),
                },
                Rule::Length {
                    min: 8,
                    max: 80,
                    message: None,
                },
            ],
        },
    ],
};

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    /// Kept as submitted once it has been checked to parse.
    Decimal(String),
    Choice(&'static Choice),
    File(Option<UploadedFile>),
}

#[derive(Debug)]
pub struct ValidatedForm {
    values: Vec<(&'static str, FieldValue)>,
}

impl ValidatedForm {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(value) | FieldValue::Decimal(value) => Some(value.as_str()),
            FieldValue::Choice(choice) => Some(choice.value),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FieldValue::Flag(true)))
    }

    pub fn choice(&self, name: &str) -> Option<&'static Choice> {
        match self.get(name)? {
            FieldValue::Choice(choice) => Some(*choice),
            _ => None,
        }
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        match self.get(name)? {
            FieldValue::File(file) => file.as_ref(),
            _ => None,
        }
    }
}

/// State needed to re-render a form: what the user typed and what went wrong.
#[derive(Debug, Default)]
pub struct FormState {
    values: HashMap<&'static str, String>,
    errors: HashMap<&'static str, Vec<String>>,
}

impl FormState {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }

    pub fn errors_for(&self, name: &str) -> &[String] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn fields_with_errors(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.errors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn add_error(&mut self, name: &'static str, message: impl Into<String>) {
        self.errors.entry(name).or_default().push(message.into());
    }
}

/// Check every field of `schema` against the raw submission.
///
/// Per field: a required rule runs first and stops the chain when it fails, then the
/// kind-specific conversion, then length bounds. The secret and file fields are never
/// copied into the returned [`FormState`], so a re-rendered form does not echo them.
pub fn validate(schema: &FormSchema, submission: &Submission) -> Result<ValidatedForm, FormState> {
    let mut state = FormState::default();
    let mut values = Vec::with_capacity(schema.fields.len());

    for field in schema.fields {
        let raw = submission.first_text(field.name);

        if let Some(value) = raw {
            if !matches!(field.kind, FieldKind::Secret | FieldKind::File) {
                state.values.insert(field.name, value.to_string());
            }
        }

        if let FieldKind::File = field.kind {
            let file = submission
                .first_file(field.name)
                .filter(|file| !file.original_name.is_empty())
                .cloned();
            if file.is_none() {
                if let Some(message) = field.required_message() {
                    state.add_error(field.name, message);
                    continue;
                }
            }
            values.push((field.name, FieldValue::File(file)));
            continue;
        }

        if let FieldKind::Boolean = field.kind {
            let checked = raw.is_some_and(|value| !FALSE_VALUES.contains(&value));
            values.push((field.name, FieldValue::Flag(checked)));
            continue;
        }

        let raw = raw.unwrap_or("");
        if raw.is_empty() {
            if let Some(message) = field.required_message() {
                state.add_error(field.name, message);
                continue;
            }
        }

        let converted = match &field.kind {
            FieldKind::Decimal if raw.is_empty() => FieldValue::Decimal(String::new()),
            FieldKind::Decimal => match parse_decimal(raw) {
                Some(normalized) => FieldValue::Decimal(normalized),
                None => {
                    state.add_error(field.name, INVALID_DECIMAL_MESSAGE);
                    continue;
                }
            },
            FieldKind::Radio(choices) | FieldKind::Select(choices) => {
                let choices: &'static [Choice] = *choices;
                match choices.iter().find(|choice| choice.value == raw) {
                    Some(choice) => FieldValue::Choice(choice),
                    None => {
                        state.add_error(field.name, INVALID_CHOICE_MESSAGE);
                        continue;
                    }
                }
            }
            _ => FieldValue::Text(raw.to_string()),
        };

        let length = raw.chars().count();
        for rule in field.rules {
            if let Rule::Length { min, max, message } = rule {
                if length < *min || length > *max {
                    let message = message.map(str::to_string).unwrap_or_else(|| {
                        format!("Field must be between {min} and {max} characters long.")
                    });
                    state.add_error(field.name, message);
                }
            }
        }

        if state.errors_for(field.name).is_empty() {
            values.push((field.name, converted));
        }
    }

    if state.has_errors() {
        Err(state)
    } else {
        Ok(ValidatedForm { values })
    }
}

/// Accept a finite decimal literal: optional sign, digits with an optional fraction,
/// optional exponent. Single underscores may separate digits. No magnitude limit, so
/// `1e400` passes; `NaN` and `Infinity` do not.
fn parse_decimal(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };

    let (integer, fraction) = match mantissa.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (mantissa, None),
    };
    let mantissa_ok = match fraction {
        Some(fraction) if integer.is_empty() => is_digit_run(fraction),
        Some(fraction) => is_digit_run(integer) && (fraction.is_empty() || is_digit_run(fraction)),
        None => is_digit_run(integer),
    };
    let exponent_ok = exponent.is_none_or(|exponent| {
        is_digit_run(exponent.strip_prefix(['+', '-']).unwrap_or(exponent))
    });

    (mantissa_ok && exponent_ok).then(|| trimmed.to_string())
}

fn is_digit_run(part: &str) -> bool {
    !part.is_empty()
        && !part.starts_with('_')
        && !part.ends_with('_')
        && !part.contains("__")
        && part.chars().all(|c| c.is_ascii_digit() || c == '_')
}
