//! Fuzz target: `FeederConfig` JSON decoding + validation
//!
//! Feeds arbitrary bytes to the config deserializer. Anything that parses
//! and validates must survive a serialize/parse cycle unchanged.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use feeder::config::FeederConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<FeederConfig>(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    let text = serde_json::to_string(&config).expect("valid config serializes");
    let again: FeederConfig = serde_json::from_str(&text).expect("own output parses");
    assert_eq!(again, config);
});
