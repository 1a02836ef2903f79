#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let Some((selector, rest)) = data.split_first() else {
        return;
    };

    let suffix = match selector % 5 {
        0 => ".toml",
        1 => ".json",
        2 => ".yaml",
        3 => ".txt",
        _ => "",
    };

    let payload = rest.get(..1_000_000).unwrap_or(rest);
    let content = String::from_utf8_lossy(payload).to_string();

    let Ok(mut file) = tempfile::Builder::new().suffix(suffix).tempfile() else {
        return;
    };

    if file.write_all(content.as_bytes()).is_err() {
        return;
    }

    let path = file.path().to_path_buf();
    if let Ok(config) = trafficgen::fuzzing::load_config_file_input(&path) {
        debug_assert!(matches!(suffix, ".toml" | ".json" | ".yaml"));
        debug_assert!(config.rate > 0.0 && config.concurrency > 0);
    }
});
