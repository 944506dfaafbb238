//! Form wire types, field-error mapping and submission errors.
//!
//! The server answers a successful save with the serialized record
//! (`[{"pk": 1, "fields": {"image": "…", …}}]`) and a rejected one with a
//! non-2xx status and `{"field": ["message", …]}`.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Deserialize;

use crate::error::ErrorCode;

/// Key Django uses for errors not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

// =============================================================================
// FIELD ERRORS
// =============================================================================

/// Field name → messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Insert `messages` ahead of whatever the field already shows.
    pub fn prepend(&mut self, field: impl Into<String>, messages: impl IntoIterator<Item = String>) {
        let entry = self.0.entry(field.into()).or_default();
        let mut merged: Vec<String> = messages.into_iter().collect();
        merged.append(entry);
        *entry = merged;
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field has an error.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl IntoIterator for FieldErrors {
    type Item = (String, Vec<String>);
    type IntoIter = btree_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<&validator::ValidationErrors> for FieldErrors {
    fn from(errors: &validator::ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, list) in errors.field_errors() {
            for err in list {
                let message = err
                    .message
                    .as_ref()
                    .map_or_else(|| err.code.to_string(), ToString::to_string);
                out.push(field.to_string(), message);
            }
        }
        out
    }
}

/// A server error entry is either one message or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for FieldErrors {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
        let map = raw
            .into_iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    OneOrMany::One(message) => vec![message],
                    OneOrMany::Many(messages) => messages,
                };
                (field, messages)
            })
            .collect();
        Ok(Self(map))
    }
}

// =============================================================================
// WIRE PARSING
// =============================================================================

#[derive(Deserialize)]
struct SavedRecord {
    fields: SavedFields,
}

#[derive(Deserialize)]
struct SavedFields {
    #[serde(default)]
    image: Option<String>,
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSuccess {
    /// Stored image path relative to the uploads root; empty means no image.
    pub image: String,
}

/// Parse a 2xx body: the first serialized record's `fields.image`.
pub(crate) fn parse_success_body(body: &str) -> Result<SubmitSuccess, SubmitError> {
    let records: Vec<SavedRecord> =
        serde_json::from_str(body).map_err(|e| SubmitError::MalformedSuccessBody(e.to_string()))?;
    let first = records
        .into_iter()
        .next()
        .ok_or_else(|| SubmitError::MalformedSuccessBody("empty record list".into()))?;
    Ok(SubmitSuccess { image: first.fields.image.unwrap_or_default() })
}

/// Parse a non-2xx body into per-field errors.
pub(crate) fn parse_error_body(status: u16, body: &str) -> SubmitError {
    match serde_json::from_str::<FieldErrors>(body) {
        Ok(errors) => SubmitError::ServerValidation { status, errors },
        Err(_) => SubmitError::MalformedErrorBody { status, body: body.to_string() },
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by form validation and submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Client-side pre-check failed; nothing was sent.
    #[error("form is invalid: {} field(s) rejected", .0.len())]
    ClientValidation(FieldErrors),

    /// The server rejected the submission with per-field errors.
    #[error("server rejected submission: status {status}")]
    ServerValidation { status: u16, errors: FieldErrors },

    /// The server answered non-2xx with a body that is not a field-error map.
    #[error("unreadable error response: status {status}")]
    MalformedErrorBody { status: u16, body: String },

    /// The server answered 2xx with a body that is not a serialized record.
    #[error("unreadable success response: {0}")]
    MalformedSuccessBody(String),

    /// The request could not be completed.
    #[error("request failed: {0}")]
    Transport(String),

    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    Busy,

    /// The form action does not resolve to a URL.
    #[error("invalid form action: {0}")]
    InvalidAction(String),

    /// The image part could not be built.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl ErrorCode for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ClientValidation(_) => "E_CLIENT_VALIDATION",
            Self::ServerValidation { .. } => "E_SERVER_VALIDATION",
            Self::MalformedErrorBody { .. } => "E_MALFORMED_ERROR_BODY",
            Self::MalformedSuccessBody(_) => "E_MALFORMED_SUCCESS_BODY",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Busy => "E_BUSY",
            Self::InvalidAction(_) => "E_INVALID_ACTION",
            Self::InvalidUpload(_) => "E_INVALID_UPLOAD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Busy | Self::MalformedErrorBody { status: 500..=599, .. }
        )
    }
}

impl SubmitError {
    /// Field errors to show inline, if this error carries any.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::ClientValidation(errors) | Self::ServerValidation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
