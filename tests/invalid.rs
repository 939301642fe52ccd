use form_field_validator::{field, ConfigError, Form, Sources};
use serde_json::json;

fn body(tree: serde_json::Value) -> Sources {
    Sources::from([("body".to_string(), tree)])
}

// Declaration mistakes are fatal and surface as ConfigError, never as
// entries in the report.

#[tokio::test]
async fn test_unknown_validator_name_fails_fast() {
    let form = Form::new().field(field("a").check("isWombat", vec![]));
    let err = form.validate(&body(json!({"a": 1}))).await.unwrap_err();
    assert!(matches!(err, ConfigError::UnknownOperation { .. }));
}

#[tokio::test]
async fn test_unknown_sanitizer_name_fails_fast() {
    let form = Form::new().field(field("a").sanitize("entropy", vec![]));
    let err = form.validate(&body(json!({"a": 1}))).await.unwrap_err();
    assert!(matches!(err, ConfigError::UnknownOperation { .. }));
}

#[tokio::test]
async fn test_malformed_path_fails_before_any_field_runs() {
    let form = Form::new()
        .field(field("ok"))
        .field(field("user..name").required());
    let err = form.validate(&body(json!({}))).await.unwrap_err();
    assert!(matches!(err, ConfigError::Path { .. }));
}

#[tokio::test]
async fn test_unquoted_non_ascii_path_is_a_config_error() {
    let form = Form::new().field(field("a[café]").required());
    let err = form.validate(&body(json!({}))).await.unwrap_err();
    assert!(matches!(err, ConfigError::Path { .. }));
}

#[tokio::test]
async fn test_misused_primitive_is_fatal_not_a_validation_error() {
    // truncate without a length argument is a declaration bug.
    let form = Form::new().field(field("bio").sanitize("truncate", vec![]));
    let err = form
        .validate(&body(json!({"bio": "hello"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Operation { .. }));
}

#[tokio::test]
async fn test_bad_cross_field_token_path_is_fatal() {
    let form = Form::new().field(field("confirm").equals("field::a..b"));
    let err = form
        .validate(&body(json!({"confirm": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Path { .. }));
}
