use super::common::{counting, form_with, required};
use formstate::reactive::Cell as StateCell;
use formstate::{
    FieldName, Form, FormOptions, RegisterOptions, ResetState, SubmitHandler, TargetEvent,
    ValidateMode,
};
use futures::executor::block_on;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

// ─── Sparse state ───────────────────────────────────────────────────────────

#[test]
fn unset_error_paths_are_absent() {
    let form = form_with(json!({ "name": "", "list": [1, 2] }));
    assert_eq!(form.errors(), json!({}));
    for name in ["name", "list", "list.0", "deep.nested.path"] {
        assert_eq!(form.field_error(name), None, "{}", name);
        assert!(!form.field_touched(name), "{}", name);
    }
}

// ─── Dirty tracking ─────────────────────────────────────────────────────────

#[test]
fn fresh_form_is_clean() {
    let form = form_with(json!({ "name": "Alex", "tags": ["a"] }));
    assert!(!form.dirty());
}

#[test]
fn writing_then_restoring_a_value_is_clean() {
    let form = form_with(json!({ "name": "Alex" }));
    block_on(form.set_field_value("name", json!("Alex"), None)).unwrap();
    assert!(!form.dirty());
    block_on(form.set_field_value("name", json!("Sam"), None)).unwrap();
    block_on(form.set_field_value("name", json!("Alex"), None)).unwrap();
    assert!(!form.dirty());
}

#[test]
fn set_field_value_with_defaults_is_dirty_without_validation() {
    let calls = Rc::new(Cell::new(0));
    let form = form_with(json!({ "name": "Alex" }));
    form.register_field("name", counting(&calls, None));

    block_on(form.set_field_value("name", json!("Hunter"), None)).unwrap();

    assert!(form.dirty());
    assert_eq!(form.values()["name"], json!("Hunter"));
    assert_eq!(calls.get(), 0);
}

#[test]
fn reset_form_is_clean() {
    let form = form_with(json!({ "name": "Alex" }));
    block_on(form.set_field_value("name", json!("Sam"), None)).unwrap();
    form.reset_form(None);
    assert!(!form.dirty());
    assert_eq!(form.values(), json!({ "name": "Alex" }));
}

#[test]
fn dirty_derived_is_memoized() {
    let form = form_with(json!({ "name": "Alex" }));
    let dirty = form.dirty_derived();
    assert!(!dirty.get());
    assert!(!dirty.get());
    assert_eq!(dirty.computations(), 1);
    form.set_field_error("name", Some(json!("nope")));
    assert!(!dirty.is_stale());
    block_on(form.set_field_value("name", json!("Sam"), None)).unwrap();
    assert!(dirty.get());
    assert_eq!(dirty.computations(), 2);
}

// ─── Reset ──────────────────────────────────────────────────────────────────

#[test]
fn reset_with_state_rebaselines() {
    let form = form_with(json!({ "name": "Alex" }));
    block_on(form.handle_submit(None)).unwrap();
    assert_eq!(form.submit_count(), 1);

    form.reset_form(Some(ResetState {
        values: Some(json!({ "name": "Reset" })),
        touched: Some(json!({ "name": true })),
        ..ResetState::default()
    }));

    assert_eq!(form.values(), json!({ "name": "Reset" }));
    assert_eq!(form.touched(), json!({ "name": true }));
    assert_eq!(form.errors(), json!({}));
    assert_eq!(form.submit_count(), 0);
    assert!(!form.dirty());
    assert_eq!(form.state().initial_values.get(), json!({ "name": "Reset" }));
}

#[test]
fn reset_keeps_explicit_submit_count() {
    let form = form_with(json!({}));
    form.reset_form(Some(ResetState {
        submit_count: Some(3),
        ..ResetState::default()
    }));
    assert_eq!(form.submit_count(), 3);
}

#[test]
fn handle_reset_prevents_default() {
    let form = form_with(json!({ "name": "Alex" }));
    block_on(form.set_field_value("name", json!("Sam"), None)).unwrap();
    let mut event = TargetEvent::default();
    form.handle_reset(Some(&mut event));
    assert!(event.default_prevented);
    assert_eq!(form.values(), json!({ "name": "Alex" }));
}

// ─── Bindings ───────────────────────────────────────────────────────────────

#[test]
fn register_returns_live_binding() {
    let form = form_with(json!({ "user": { "email": "" } }));
    let email = form.register("user.email", RegisterOptions::default());

    assert_eq!(email.value(), Some(json!("")));
    assert_eq!(email.attrs().name, "user.email");
    assert!(!email.dirty());

    block_on(email.set_value(json!("a@b.c"))).unwrap();
    assert_eq!(form.field_value("user.email"), Some(json!("a@b.c")));
    assert!(email.dirty());

    block_on(email.blur()).unwrap();
    assert!(email.touched());
    assert_eq!(form.touched(), json!({ "user": { "email": true } }));
}

#[test]
fn dynamic_name_retargets_binding() {
    let form = form_with(json!({ "a": 1, "b": 2 }));
    let which = StateCell::new("a".to_string());
    let field = form.register(FieldName::from(&which), RegisterOptions::default());

    assert_eq!(field.value(), Some(json!(1)));
    which.set("b".to_string());
    assert_eq!(field.name(), "b");
    assert_eq!(field.value(), Some(json!(2)));
}

#[test]
fn binding_derivation_follows_state() {
    let form = form_with(json!({ "name": "" }));
    let field = form.register("name", RegisterOptions::default());
    let shown = field.derive(|f| f.value().and_then(|v| v.as_str().map(str::len)));

    assert_eq!(shown.get(), Some(0));
    block_on(field.set_value(json!("abc"))).unwrap();
    assert_eq!(shown.get(), Some(3));
}

#[test]
fn registering_twice_replaces_validator() {
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let form = form_with(json!({ "name": "" }));
    form.register("name", RegisterOptions::validate(counting(&first, None)));
    form.register("name", RegisterOptions::validate(counting(&second, None)));

    block_on(form.validate_form()).unwrap();
    assert_eq!((first.get(), second.get()), (0, 1));
}

// ─── Handlers ───────────────────────────────────────────────────────────────

#[test]
fn blur_resolves_path_from_event() {
    let form = form_with(json!({}));

    block_on(form.handle_blur(Some(&TargetEvent::named("email")), None)).unwrap();
    assert!(form.field_touched("email"));

    let by_id = TargetEvent {
        id: Some("phone".into()),
        ..TargetEvent::default()
    };
    block_on(form.handle_blur(Some(&by_id), None)).unwrap();
    assert!(form.field_touched("phone"));

    block_on(form.handle_blur(Some(&TargetEvent::named("ignored")), Some("zip"))).unwrap();
    assert!(form.field_touched("zip"));
    assert!(!form.field_touched("ignored"));

    assert_eq!(block_on(form.handle_blur(None, None)), Ok(None));
}

#[test]
fn blur_skips_an_empty_name() {
    let form = Form::new(
        FormOptions::new(json!({}), SubmitHandler::sync(|_, _| {}))
            .initial_touched(json!({ "other": true })),
    );
    let unnamed = TargetEvent {
        name: Some(String::new()),
        id: Some("email".into()),
        ..TargetEvent::default()
    };

    block_on(form.handle_blur(Some(&unnamed), None)).unwrap();

    assert_eq!(form.touched(), json!({ "other": true, "email": true }));
    assert!(form.field_touched("email"));
}

#[test]
fn root_writes_are_ignored() {
    let form = form_with(json!({ "name": "Ann" }));
    block_on(form.set_field_touched("", true)).unwrap();
    block_on(form.set_field_value("", json!(null), Some(false))).unwrap();
    form.set_field_error("", Some(json!("boom")));

    assert_eq!(form.touched(), json!({}));
    assert_eq!(form.values(), json!({ "name": "Ann" }));
    assert_eq!(form.errors(), json!({}));
    assert_eq!(block_on(form.handle_blur(Some(&TargetEvent::default()), Some(""))), Ok(None));
}

#[test]
fn touched_subtree_reads_touched() {
    let form = form_with(json!({}));
    block_on(form.set_field_touched("list.1", true)).unwrap();
    assert!(form.field_touched("list"));
    assert!(!form.field_touched("list.0"));
    block_on(form.set_field_touched("list.1", false)).unwrap();
    assert!(!form.field_touched("list"));
}

// ─── Mount ──────────────────────────────────────────────────────────────────

#[test]
fn mount_validates_when_enabled() {
    let form = Form::new(
        FormOptions::new(json!({ "name": "" }), SubmitHandler::sync(|_, _| {}))
            .validate_on_mounted(true),
    );
    form.register("name", RegisterOptions::validate(required()));

    let errors = block_on(form.mount()).unwrap();
    assert_eq!(errors, Some(json!({ "name": "required" })));
    assert_eq!(form.errors(), json!({ "name": "required" }));
    assert_eq!(form.submit_count(), 0);
}

#[test]
fn mount_is_idle_by_default() {
    let form = form_with(json!({ "name": "" }));
    form.register("name", RegisterOptions::validate(required()));
    assert_eq!(block_on(form.mount()), Ok(None));
    assert_eq!(form.errors(), json!({}));
}

#[test]
fn options_builder_seeds_state() {
    let form = Form::new(
        FormOptions::new(json!({ "a": 1 }), SubmitHandler::sync(|_, _| {}))
            .initial_errors(json!({ "a": "bad" }))
            .initial_touched(json!({ "a": true }))
            .validate_mode(ValidateMode::Blur)
            .re_validate_mode(ValidateMode::Submit),
    );
    assert_eq!(form.field_error("a"), Some(json!("bad")));
    assert!(form.field_touched("a"));
    assert_eq!(form.validate_timing(), ValidateMode::Blur);
    assert_eq!(form.re_validate_mode(), ValidateMode::Submit);
}
