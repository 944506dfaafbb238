//! Request-log records as delivered by `/requests_ajax/`.
//!
//! WIRE FORMAT
//! ===========
//! The endpoint answers with a 2-tuple `[context_id, records]` where
//! `records` is itself a JSON-encoded string holding Django-serialized rows:
//! `[{"pk": 1, "fields": {"path", "method", "date", "priority", "new_request"}}]`.
//! Loose values (`new_request` as `1` or `"1"`, a falsy context id) are read
//! the way the page script read them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ErrorCode;

/// One logged HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub id: i64,
    pub path: String,
    pub method: String,
    pub date: String,
    pub priority: i64,
    /// Not yet seen by a focused viewer; drives row emphasis only.
    pub is_new: bool,
}

/// A full poll result. Replaced wholesale on every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestList {
    /// Unread-count style badge for the page title.
    pub context_id: Option<String>,
    pub records: Vec<RequestRecord>,
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The request could not be completed.
    #[error("poll request failed: {0}")]
    Transport(String),

    /// The server returned a non-success status.
    #[error("poll response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body is not a `[context_id, records]` tuple.
    #[error("poll response parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for PollError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_POLL_TRANSPORT",
            Self::Status { .. } => "E_POLL_STATUS",
            Self::Parse(_) => "E_POLL_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct Envelope(Value, EncodedRecords);

#[derive(Deserialize)]
#[serde(untagged)]
enum EncodedRecords {
    Encoded(String),
    Inline(Vec<SerializedRequest>),
}

#[derive(Deserialize)]
struct SerializedRequest {
    pk: i64,
    fields: SerializedFields,
}

#[derive(Deserialize)]
struct SerializedFields {
    path: String,
    method: String,
    #[serde(default)]
    date: String,
    #[serde(default, deserialize_with = "deserialize_priority")]
    priority: i64,
    #[serde(default)]
    new_request: Value,
}

impl From<SerializedRequest> for RequestRecord {
    fn from(row: SerializedRequest) -> Self {
        Self {
            id: row.pk,
            path: row.fields.path,
            method: row.fields.method,
            date: row.fields.date,
            priority: row.fields.priority,
            is_new: parse_int(&row.fields.new_request) == Some(1),
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a poll response body.
///
/// # Errors
///
/// Returns [`PollError::Parse`] if either the envelope or the embedded record
/// list is malformed.
pub fn parse_poll_body(body: &str) -> Result<RequestList, PollError> {
    let Envelope(context, records) = serde_json::from_str(body).map_err(|e| PollError::Parse(e.to_string()))?;
    let rows = match records {
        EncodedRecords::Encoded(raw) => {
            serde_json::from_str::<Vec<SerializedRequest>>(&raw).map_err(|e| PollError::Parse(e.to_string()))?
        }
        EncodedRecords::Inline(rows) => rows,
    };

    Ok(RequestList { context_id: context_id(&context), records: rows.into_iter().map(RequestRecord::from).collect() })
}

/// Text of a truthy context id; `null`, `false`, `0` and `""` mean no badge.
#[must_use]
pub fn context_id(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Leading-integer parse of a number or string (`"1abc"` → 1, `1.9` → 1).
#[must_use]
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    // Accumulate negatively so i64::MIN is reachable; overflow saturates.
    let value = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_sub(i64::from(b - b'0')));
    Some(if negative { value } else { value.saturating_neg() })
}

fn deserialize_priority<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_int(&value).unwrap_or(0))
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
