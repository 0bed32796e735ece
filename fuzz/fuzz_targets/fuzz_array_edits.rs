#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use formstate::array::ArrayEdit;
use serde_json::{json, Value};

#[derive(Arbitrary, Debug)]
enum Op {
    Append(u8),
    Prepend(u8),
    Insert(u8, u8),
    Remove(Option<u8>),
    Update(u8, u8),
    Swap(u8, u8),
    Move(u8, u8),
}

impl Op {
    fn edit(&self) -> ArrayEdit {
        match *self {
            Op::Append(v) => ArrayEdit::Append(json!(v)),
            Op::Prepend(v) => ArrayEdit::Prepend(json!(v)),
            Op::Insert(i, v) => ArrayEdit::Insert(i as usize, json!(v)),
            Op::Remove(i) => ArrayEdit::Remove(i.map(usize::from)),
            Op::Update(i, v) => ArrayEdit::Update(i as usize, json!(v)),
            Op::Swap(a, b) => ArrayEdit::Swap(a as usize, b as usize),
            Op::Move(a, b) => ArrayEdit::Move(a as usize, b as usize),
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut values: Vec<Value> = Vec::new();
    let mut meta: Vec<Value> = Vec::new();

    for op in ops.iter().take(64) {
        let edit = op.edit();
        values = edit.apply(&values);
        if let Some(next) = edit.apply_meta(&meta) {
            meta = next;
        }
        // Metadata stays aligned with values through every edit.
        assert_eq!(values.len(), meta.len(), "after {:?}", op);
    }
});
