#![no_main]

use common::jwt::verify_identity_token;
use libfuzzer_sys::fuzz_target;

const KEY: &[u8] = b"fuzz-signing-key-0123456789";

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must be rejected, never panic
    if let Ok(token) = std::str::from_utf8(data) {
        let _ = verify_identity_token(token, KEY, "https://authn.fuzz");
    }
});
