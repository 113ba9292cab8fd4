//! Fuzz target for engine.toml parsing.

#![no_main]

use fg_core::EngineConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Should never panic, only return an error
        if let Ok(config) = EngineConfig::from_toml_str(text) {
            assert!(config.validate().is_ok());
        }
    }
});
