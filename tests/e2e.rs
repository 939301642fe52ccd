use form_field_validator as ffv;
use form_field_validator::{field, Config, Form, Sources};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sources(pairs: &[(&str, serde_json::Value)]) -> Sources {
    pairs
        .iter()
        .map(|(n, v)| (n.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn test_signup_form_happy_path() {
    let form = Form::new()
        .field(field("username").trim().required().is_alphanumeric())
        .field(field("email").label("Email address").trim().is_email())
        .field(field("age").to_int().is_int());

    let srcs = sources(&[(
        "body",
        json!({"username": "  ada99  ", "email": " ada@example.com ", "age": "36"}),
    )]);
    let report = form.validate(&srcs).await.unwrap();

    assert!(report.is_valid());
    assert_eq!(report.messages(), Vec::<String>::new());
    assert_eq!(
        report.values,
        json!({"username": "ada99", "email": "ada@example.com", "age": 36})
    );
}

#[tokio::test]
async fn test_errors_use_labels_and_declaration_order() {
    let form = Form::new()
        .field(field("email").label("Email address").is_email())
        .field(field("age").is_int().message("Age must be a whole number"));

    let srcs = sources(&[("body", json!({"email": "nope", "age": "4.5"}))]);
    let report = form.validate(&srcs).await.unwrap();

    assert!(!report.is_valid());
    assert_eq!(
        report.messages(),
        vec![
            "Email address is not an email address",
            "Age must be a whole number"
        ]
    );
}

#[tokio::test]
async fn test_declared_paths_exist_even_when_input_is_empty() {
    let form = Form::new()
        .field(field("user.name"))
        .field(field("user.tags").array())
        .field(field("meta[0].id"));

    let report = form.validate(&sources(&[("body", json!({}))])).await.unwrap();

    assert!(report.is_valid());
    assert_eq!(
        report.values,
        json!({"user": {"name": null, "tags": []}, "meta": [{"id": null}]})
    );
}

#[tokio::test]
async fn test_source_priority_claims_top_level_keys_whole() {
    let config = Config::default().sources(["body", "query"]);
    let form = Form::with_config(config).field(field("user.name").trim());

    let srcs = sources(&[
        ("query", json!({"user": {"name": "from-query"}, "page": "2"})),
        ("body", json!({"user": {"name": " from-body "}})),
    ]);
    let report = form.validate(&srcs).await.unwrap();

    // body outranks query in the configured priority; `page` still carries
    // through from query untouched.
    assert_eq!(
        report.values,
        json!({"user": {"name": "from-body"}, "page": "2"})
    );
}

#[tokio::test]
async fn test_auto_trim_prepends_once() {
    let config = Config::default().auto_trim(true);
    let form = Form::with_config(config)
        .field(field("a").min_length(2))
        .field(field("b").trim().min_length(2));

    let srcs = sources(&[("body", json!({"a": "  hi  ", "b": "  yo  "}))]);
    let report = form.validate(&srcs).await.unwrap();

    assert!(report.is_valid());
    assert_eq!(report.values, json!({"a": "hi", "b": "yo"}));
}

#[tokio::test]
async fn test_validators_do_not_short_circuit_within_a_field() {
    let form = Form::new().field(
        field("code")
            .label("Code")
            .min_length(10)
            .is_numeric()
            .to_upper(),
    );

    let srcs = sources(&[("body", json!({"code": "abc"}))]);
    let report = form.validate(&srcs).await.unwrap();

    // Both validators fail and the later sanitizer still runs.
    assert_eq!(
        report.messages(),
        vec!["Code is too short", "Code is not a number"]
    );
    assert_eq!(report.values["code"], json!("ABC"));
}

#[tokio::test]
async fn test_validate_tree_wraps_a_single_source() {
    let form = Form::new().field(field("q").trim());
    let report = ffv::validate_tree(&form, json!({"q": " term "})).await.unwrap();
    assert_eq!(report.values["q"], json!("term"));
}

#[tokio::test]
async fn test_idempotent_across_runs() {
    let form = Form::new()
        .field(field("name").trim().required())
        .field(field("email").is_email());

    let input = json!({"name": " x ", "email": "bad"});
    let first = form
        .validate(&sources(&[("body", input.clone())]))
        .await
        .unwrap();
    let second = form
        .validate(&sources(&[("body", input)]))
        .await
        .unwrap();

    assert_eq!(first.errors, second.errors);
    assert_eq!(first.values, second.values);
}
