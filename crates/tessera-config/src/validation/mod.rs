//! Full configuration validation.
//!
//! Each section has its own validator; errors from all of them are
//! collected into a single `ConfigError`.

mod helpers;


use crate::schema::TesseraConfig;
use tessera_common::ConfigError;

use helpers::{validate_range, validate_range_u64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TesseraConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_bridge(&mut errors, config);
    validate_launcher(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_bridge(errors: &mut Vec<String>, config: &TesseraConfig) {
    let bridge = &config.bridge;
    validate_range_u64(
        errors,
        "bridge.handshake_timeout_ms",
        bridge.handshake_timeout_ms,
        100,
        120_000,
    );
    validate_range_u64(
        errors,
        "bridge.keepalive_interval_secs",
        bridge.keepalive_interval_secs,
        1,
        300,
    );
    validate_range_u64(
        errors,
        "bridge.keepalive_timeout_secs",
        bridge.keepalive_timeout_secs,
        2,
        600,
    );
    validate_range_u64(
        errors,
        "bridge.call_timeout_secs",
        bridge.call_timeout_secs,
        1,
        600,
    );
    if bridge.keepalive_timeout_secs <= bridge.keepalive_interval_secs {
        errors.push(format!(
            "bridge.keepalive_timeout_secs = {} must exceed bridge.keepalive_interval_secs = {}",
            bridge.keepalive_timeout_secs, bridge.keepalive_interval_secs
        ));
    }
    if bridge.max_message_bytes < 64 * 1024 {
        errors.push(format!(
            "bridge.max_message_bytes = {} is below the 65536 minimum",
            bridge.max_message_bytes
        ));
    }
}

fn validate_launcher(errors: &mut Vec<String>, config: &TesseraConfig) {
    let launcher = &config.launcher;
    validate_range(
        errors,
        "launcher.portrait_columns",
        launcher.portrait_columns,
        1,
        12,
    );
    validate_range(
        errors,
        "launcher.landscape_columns",
        launcher.landscape_columns,
        1,
        12,
    );
    validate_range(errors, "launcher.rows_per_page", launcher.rows_per_page, 1, 20);
    validate_range(errors, "launcher.width", launcher.width, 100, 8192);
    validate_range(errors, "launcher.height", launcher.height, 100, 8192);
}
