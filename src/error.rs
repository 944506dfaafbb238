//! Shared error surface.
//!
//! Every error type in the crate carries a grepable code and a retry hint so
//! the CLI (and any embedding UI) can report failures uniformly.

/// Grepable error code and retry hint for an error value.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// One-line rendering used by the CLI: `E_CODE: message (retryable)`.
pub fn describe(err: &(impl ErrorCode + ?Sized)) -> String {
    if err.retryable() {
        format!("{}: {err} (retryable)", err.error_code())
    } else {
        format!("{}: {err}", err.error_code())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
