#![no_main]

use authn_service::config::RuleConfig;
use authn_service::models::{LoginRequest, RegistrationRequest};
use authn_service::validation::{login_validator, registration_validator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let rules = RuleConfig::default();

    // Request bodies arrive as JSON; any that deserialize must validate
    // without panicking, whatever their content.
    if let Ok(request) = serde_json::from_slice::<LoginRequest>(data) {
        let _ = login_validator().validate(&request, &rules);
    }
    if let Ok(request) = serde_json::from_slice::<RegistrationRequest>(data) {
        let _ = registration_validator().validate(&request, &rules);
    }
});
