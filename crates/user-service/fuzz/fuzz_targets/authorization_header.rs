#![no_main]

use common::jwt::parse_authorization;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        if let Some((_, credential)) = parse_authorization(value) {
            assert!(!credential.is_empty());
            assert!(value.trim().ends_with(credential));
        }
    }
});
