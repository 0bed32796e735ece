use super::common::{counting, form_with, required};
use formstate::error::{FormError, ValidatorError};
use formstate::validate::{is_valid, merge_errors};
use formstate::{
    FieldArray, Form, FormOptions, RegisterOptions, SubmitHandler, ValidateMode, Validator,
};
use futures::channel::oneshot;
use futures::executor::{block_on, LocalPool};
use futures::task::LocalSpawnExt;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

fn form_in(mode: ValidateMode, re_mode: ValidateMode, values: Value) -> Form {
    Form::new(
        FormOptions::new(values, SubmitHandler::sync(|_, helper| helper.set_submitting(false)))
            .validate_mode(mode)
            .re_validate_mode(re_mode),
    )
}

// ─── Timing ─────────────────────────────────────────────────────────────────

#[test]
fn blur_mode_validates_on_blur_only() {
    let calls = Rc::new(Cell::new(0));
    let form = form_in(ValidateMode::Blur, ValidateMode::Change, json!({ "name": "" }));
    let name = form.register("name", RegisterOptions::validate(counting(&calls, None)));

    block_on(name.change()).unwrap();
    block_on(name.input()).unwrap();
    block_on(name.set_value(json!("x"))).unwrap();
    assert_eq!(calls.get(), 0);

    block_on(name.blur()).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(form.submit_count(), 0);
}

#[test]
fn change_mode_validates_on_change_and_writes() {
    let calls = Rc::new(Cell::new(0));
    let form = form_in(ValidateMode::Change, ValidateMode::Change, json!({ "name": "" }));
    let name = form.register("name", RegisterOptions::validate(counting(&calls, None)));

    block_on(name.set_value(json!("x"))).unwrap();
    assert_eq!(calls.get(), 1);
    block_on(name.change()).unwrap();
    assert_eq!(calls.get(), 2);
    block_on(name.blur()).unwrap();
    block_on(name.input()).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn input_mode_validates_on_input() {
    let calls = Rc::new(Cell::new(0));
    let form = form_in(ValidateMode::Input, ValidateMode::Change, json!({ "name": "" }));
    let name = form.register("name", RegisterOptions::validate(counting(&calls, None)));

    block_on(name.input()).unwrap();
    block_on(name.blur()).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn explicit_should_validate_overrides_timing() {
    let calls = Rc::new(Cell::new(0));
    let form = form_in(ValidateMode::Submit, ValidateMode::Change, json!({ "name": "" }));
    form.register_field("name", counting(&calls, None));

    block_on(form.set_field_value("name", json!("a"), Some(true))).unwrap();
    block_on(form.set_values(json!({ "name": "b" }), Some(true))).unwrap();
    block_on(form.set_values(json!({ "name": "c" }), None)).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn submit_switches_to_re_validate_mode() {
    let calls = Rc::new(Cell::new(0));
    let form = form_in(ValidateMode::Submit, ValidateMode::Change, json!({ "name": "" }));
    form.register_field("name", counting(&calls, Some(json!("required"))));

    block_on(form.set_field_value("name", json!("a"), None)).unwrap();
    assert_eq!(calls.get(), 0);

    let status = block_on(form.handle_submit(None)).unwrap();
    assert!(!status.is_submitted());
    assert_eq!(form.submit_count(), 1);
    assert_eq!(calls.get(), 1);

    assert_eq!(form.validate_timing(), ValidateMode::Change);
    block_on(form.set_field_value("name", json!("b"), None)).unwrap();
    assert_eq!(calls.get(), 2);
}

// ─── Orchestration ──────────────────────────────────────────────────────────

#[test]
fn field_and_form_errors_merge() {
    let form = Form::new(
        FormOptions::new(json!({ "name": "", "age": 3 }), SubmitHandler::sync(|_, _| {}))
            .validate(Validator::sync(|values| {
                (values["age"].as_u64() < Some(18)).then(|| json!({ "age": "too young" }))
            })),
    );
    form.register("name", RegisterOptions::validate(required()));

    let errors = block_on(form.validate_form()).unwrap();
    assert_eq!(errors, json!({ "name": "required", "age": "too young" }));
    assert_eq!(form.errors(), errors);
    assert!(!form.is_validating());
}

#[test]
fn empty_results_count_as_valid() {
    let form = form_with(json!({ "a": 1, "b": 2, "c": 3, "d": 4 }));
    form.register_field("a", Validator::sync(|_| Some(json!(""))));
    form.register_field("b", Validator::sync(|_| Some(json!(false))));
    form.register_field("c", Validator::sync(|_| Some(json!([]))));
    form.register_field("d", Validator::sync(|_| None));

    let errors = block_on(form.validate_form()).unwrap();
    assert!(is_valid(&errors));
}

#[test]
fn empty_form_result_keeps_the_tree_sparse() {
    for empty in [Value::Null, json!(""), json!(false), json!([""])] {
        let form = Form::new(
            FormOptions::new(json!({ "name": "" }), SubmitHandler::sync(|_, _| {}))
                .validate(Validator::sync(move |_| Some(empty.clone()))),
        );
        form.register("name", RegisterOptions::validate(required()));

        let errors = block_on(form.validate_form()).unwrap();
        assert_eq!(errors, json!({ "name": "required" }));
        assert!(!is_valid(&errors));
        assert!(form.errors().is_object());
    }
}

#[test]
fn validation_replaces_stale_errors() {
    let form = form_with(json!({ "name": "Alex" }));
    form.register_field("name", required());
    form.set_errors(json!({ "name": "old", "other": "old" }));

    let errors = block_on(form.validate_form()).unwrap();
    assert_eq!(errors, json!({}));
    assert_eq!(form.errors(), json!({}));
}

#[test]
fn array_validator_receives_whole_array() {
    let seen = Rc::new(RefCell::new(Value::Null));
    let form = form_with(json!({ "list": [1, 2] }));
    let record = seen.clone();
    let _list = FieldArray::new(
        &form,
        "list",
        RegisterOptions::validate(Validator::sync(move |value| {
            *record.borrow_mut() = value.clone();
            None
        })),
    );

    block_on(form.validate_form()).unwrap();
    assert_eq!(*seen.borrow(), json!([1, 2]));
}

#[test]
fn validate_field_writes_and_clears_its_leaf() {
    let form = form_with(json!({ "name": "" }));
    form.register_field("name", required());

    let error = block_on(form.validate_field("name")).unwrap();
    assert_eq!(error, Some(json!("required")));
    assert_eq!(form.errors(), json!({ "name": "required" }));

    block_on(form.set_field_value("name", json!("Ann"), None)).unwrap();
    assert_eq!(block_on(form.validate_field("name")), Ok(None));
    assert_eq!(form.errors(), json!({}));
    assert!(!form.is_validating());
}

#[test]
fn validate_field_without_validator_is_a_no_op() {
    let form = form_with(json!({ "name": "" }));
    form.set_field_error("name", Some(json!("kept")));
    assert_eq!(block_on(form.validate_field("name")), Ok(None));
    assert_eq!(form.field_error("name"), Some(json!("kept")));
}

#[test]
fn failing_validator_surfaces_as_error() {
    let form = form_with(json!({ "name": "" }));
    form.register_field(
        "name",
        Validator::try_sync(|_| Err(ValidatorError::new("lookup service unavailable"))),
    );

    let err = block_on(form.validate_form()).unwrap_err();
    match err {
        FormError::Validator(e) => {
            assert_eq!(e.path, "name");
            assert_eq!(e.message, "lookup service unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!form.is_validating());
    assert_eq!(form.errors(), json!({}));
}

// ─── Overlapping runs ───────────────────────────────────────────────────────

#[test]
fn only_latest_run_commits() {
    let gates: Rc<RefCell<VecDeque<oneshot::Receiver<Value>>>> = Rc::default();
    let form = form_with(json!({ "name": "" }));
    let queue = gates.clone();
    form.register_field(
        "name",
        Validator::future(move |_| {
            let gate = queue.borrow_mut().pop_front().expect("a gate per run");
            async move { Ok(gate.await.ok()) }
        }),
    );

    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    gates.borrow_mut().extend([first_rx, second_rx]);

    let results: Rc<RefCell<Vec<Value>>> = Rc::default();
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    for _ in 0..2 {
        let (form, results) = (form.clone(), results.clone());
        spawner
            .spawn_local(async move {
                let errors = form.validate_form().await.expect("validators run");
                results.borrow_mut().push(errors);
            })
            .unwrap();
        pool.run_until_stalled();
    }
    assert!(form.is_validating());

    second_tx.send(json!("second")).unwrap();
    pool.run_until_stalled();
    assert_eq!(form.errors(), json!({ "name": "second" }));
    assert!(!form.is_validating());

    first_tx.send(json!("first")).unwrap();
    pool.run_until_stalled();
    assert_eq!(form.errors(), json!({ "name": "second" }));
    assert_eq!(
        *results.borrow(),
        vec![json!({ "name": "second" }), json!({ "name": "first" })]
    );
}

#[test]
fn is_validating_spans_an_async_run() {
    let form = form_with(json!({ "name": "" }));
    let (tx, rx) = oneshot::channel::<()>();
    let gate = Rc::new(RefCell::new(Some(rx)));
    form.register_field(
        "name",
        Validator::future(move |_| {
            let rx = gate.borrow_mut().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(None)
            }
        }),
    );

    let mut pool = LocalPool::new();
    let run = form.clone();
    pool.spawner()
        .spawn_local(async move {
            run.validate_form().await.expect("validators run");
        })
        .unwrap();
    pool.run_until_stalled();
    assert!(form.is_validating());

    tx.send(()).unwrap();
    pool.run_until_stalled();
    assert!(!form.is_validating());
}

#[test]
fn merge_policy_matches_array_rules() {
    let merged = merge_errors(
        json!({ "list": [null, { "a": "x" }], "name": "field" }),
        json!({ "list": ["first", { "b": "y" }], "name": "form" }),
    );
    assert_eq!(
        merged,
        json!({ "list": ["first", { "a": "x", "b": "y" }], "name": "form" })
    );
}
