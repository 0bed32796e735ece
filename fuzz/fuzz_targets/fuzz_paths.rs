#![no_main]

use libfuzzer_sys::fuzz_target;
use formstate::path;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the split between path and JSON value.
    let split = data[0] as usize % data.len().max(1);
    let (path_bytes, value_bytes) = data.split_at(split.min(data.len()));

    let name = String::from_utf8_lossy(path_bytes);
    let Ok(mut root) = serde_json::from_slice::<serde_json::Value>(value_bytes) else {
        return;
    };

    let segments = path::string_to_path(&name);

    let _ = path::get(&root, &name);
    let marker = serde_json::json!({ "fuzz": true });
    path::set(&mut root, &name, marker.clone());

    // Any path with at least one segment reads back what was written.
    if !segments.is_empty() {
        assert_eq!(path::get(&root, &name), Some(&marker), "path {:?}", name);
    }

    let _ = path::unset(&mut root, &name);
});
