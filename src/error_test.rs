use super::*;

#[derive(Debug)]
struct Flaky;

impl std::fmt::Display for Flaky {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection reset")
    }
}

impl ErrorCode for Flaky {
    fn error_code(&self) -> &'static str {
        "E_FLAKY"
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[derive(Debug)]
struct Fatal;

impl std::fmt::Display for Fatal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bad input")
    }
}

impl ErrorCode for Fatal {
    fn error_code(&self) -> &'static str {
        "E_FATAL"
    }
}

#[test]
fn describe_marks_retryable_errors() {
    assert_eq!(describe(&Flaky), "E_FLAKY: connection reset (retryable)");
}

#[test]
fn describe_defaults_to_not_retryable() {
    assert_eq!(describe(&Fatal), "E_FATAL: bad input");
}
