#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    let Ok(config) = formstate::FormConfig::from_yaml(&s) else {
        return;
    };

    // A loaded configuration must survive a JSON round-trip.
    let json = match serde_json::to_string(&config) {
        Ok(j) => j,
        Err(_) => return,
    };
    if formstate::FormConfig::from_json(&json).as_ref() != Ok(&config) {
        panic!("config round-trip failure for input {:?}", s.get(..200).unwrap_or(&s));
    }
});
