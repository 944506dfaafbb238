use super::*;

#[test]
fn success_body_reads_first_image() {
    let body = r#"[{"pk": 1, "model": "hello.contact", "fields": {"name": "Aleks", "image": "photos/me.png"}}]"#;
    let ok = parse_success_body(body).unwrap();
    assert_eq!(ok.image, "photos/me.png");
}

#[test]
fn success_body_null_or_missing_image_is_empty() {
    let null_image = r#"[{"pk": 1, "fields": {"image": null}}]"#;
    assert_eq!(parse_success_body(null_image).unwrap().image, "");

    let no_image = r#"[{"pk": 1, "fields": {"name": "Aleks"}}]"#;
    assert_eq!(parse_success_body(no_image).unwrap().image, "");
}

#[test]
fn success_body_empty_list_is_malformed() {
    assert!(matches!(parse_success_body("[]"), Err(SubmitError::MalformedSuccessBody(_))));
}

#[test]
fn success_body_not_json_is_malformed() {
    assert!(matches!(parse_success_body("<html>"), Err(SubmitError::MalformedSuccessBody(_))));
}

#[test]
fn error_body_accepts_single_and_list_messages() {
    let body = r#"{"name": ["This field is required."], "email": "Enter a valid email address."}"#;
    let err = parse_error_body(400, body);
    let SubmitError::ServerValidation { status, errors } = err else {
        panic!("expected server validation, got {err:?}");
    };
    assert_eq!(status, 400);
    assert_eq!(errors.get("name"), Some(&["This field is required.".to_string()][..]));
    assert_eq!(errors.get("email"), Some(&["Enter a valid email address.".to_string()][..]));
}

#[test]
fn error_body_not_a_mapping_is_malformed() {
    let err = parse_error_body(500, "Internal Server Error");
    assert!(matches!(err, SubmitError::MalformedErrorBody { status: 500, .. }));
    assert!(err.retryable());
    assert!(err.field_errors().is_none());

    let err = parse_error_body(400, r#"["not", "a", "map"]"#);
    assert!(matches!(err, SubmitError::MalformedErrorBody { status: 400, .. }));
    assert!(!err.retryable());
}

#[test]
fn prepend_places_new_messages_first() {
    let mut errors = FieldErrors::new();
    errors.push("name", "old");
    errors.prepend("name", vec!["a".to_string(), "b".to_string()]);
    assert_eq!(errors.get("name"), Some(&["a".to_string(), "b".to_string(), "old".to_string()][..]));
}

#[test]
fn into_result_reflects_emptiness() {
    assert!(FieldErrors::new().into_result().is_ok());

    let mut errors = FieldErrors::new();
    errors.push(NON_FIELD_ERRORS, "nope");
    assert!(errors.into_result().is_err());
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(SubmitError::Busy.error_code(), "E_BUSY");
    assert_eq!(SubmitError::Transport("reset".into()).error_code(), "E_TRANSPORT");
    assert_eq!(
        SubmitError::ServerValidation { status: 400, errors: FieldErrors::new() }.error_code(),
        "E_SERVER_VALIDATION"
    );
}
