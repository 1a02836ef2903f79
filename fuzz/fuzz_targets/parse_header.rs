#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok((name, _)) = trafficgen::fuzzing::parse_header_input(input) {
            debug_assert!(!name.is_empty());
        }
    }
});
