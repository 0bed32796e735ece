use formstate::resolver::{flatten_issues, to_nest_error, PathSegment};
use formstate::{
    resolver, Form, FormError, FormOptions, SchemaError, SchemaIssue, SubmitHandler,
};
use futures::executor::block_on;
use serde_json::{json, Value};

/// Requires a non-empty `name` and, for every user, a non-empty `email`.
fn signup_schema(values: &Value) -> Result<(), SchemaError> {
    let mut issues = Vec::new();
    if values["name"].as_str().is_none_or(str::is_empty) {
        issues.push(SchemaIssue::new([PathSegment::from("name")], "Name is required"));
        issues.push(SchemaIssue::new([PathSegment::from("name")], "Name is too short"));
    }
    if let Some(users) = values["users"].as_array() {
        for (i, user) in users.iter().enumerate() {
            if user["email"].as_str().is_none_or(str::is_empty) {
                issues.push(SchemaIssue::new(
                    [PathSegment::from("users"), PathSegment::from(i), PathSegment::from("email")],
                    "Email is required",
                ));
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Invalid(issues))
    }
}

fn form_with_schema(values: Value) -> Form {
    Form::new(
        FormOptions::new(values, SubmitHandler::sync(|_, _| {})).validate(resolver(signup_schema)),
    )
}

#[test]
fn schema_issues_become_nested_errors() {
    let form = form_with_schema(json!({
        "name": "",
        "users": [{ "email": "a@b.c" }, { "email": "" }]
    }));

    let errors = block_on(form.validate_form()).unwrap();
    assert_eq!(
        errors,
        json!({
            "name": "Name is required",
            "users": [null, { "email": "Email is required" }]
        })
    );
    assert_eq!(form.field_error("users.1.email"), Some(json!("Email is required")));
    assert_eq!(form.field_error("users.0"), None);
}

#[test]
fn passing_schema_is_empty_tree() {
    let form = form_with_schema(json!({ "name": "Ann", "users": [] }));
    assert_eq!(block_on(form.validate_form()).unwrap(), json!({}));
}

#[test]
fn schema_failure_is_a_validator_error() {
    let form = Form::new(
        FormOptions::new(json!({}), SubmitHandler::sync(|_, _| {})).validate(resolver(
            |_: &Value| -> Result<(), SchemaError> { Err(SchemaError::Other("schema unavailable".into())) },
        )),
    );
    match block_on(form.validate_form()) {
        Err(FormError::Validator(e)) => assert_eq!(e.message, "schema unavailable"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn union_branches_flatten_first_wins() {
    let issue = SchemaIssue::at("contact", "Invalid input").with_union(vec![
        vec![SchemaIssue::at("contact.email", "Invalid email")],
        vec![
            SchemaIssue::at("contact.email", "Expected null"),
            SchemaIssue::at("contact.phone", "Invalid phone"),
        ],
    ]);
    let flat = flatten_issues(vec![issue]);
    assert_eq!(flat.len(), 3);
    let tree = to_nest_error(flat);
    // The parent message is overwritten once children are nested under it.
    assert_eq!(tree["contact"]["email"], json!("Invalid email"));
    assert_eq!(tree["contact"]["phone"], json!("Invalid phone"));
}
