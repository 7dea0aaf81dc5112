//! Global subscriber installation. Kept in its own test binary since the
//! subscriber can only be set once per process.

use warden_telemetry::{init_logging, LogConfig, TelemetryError};

#[test]
fn installs_once() {
    assert!(matches!(
        init_logging(&LogConfig {
            level: "warden=notalevel".to_string(),
            ..LogConfig::default()
        }),
        Err(TelemetryError::InvalidConfig(_))
    ));

    init_logging(&LogConfig::development()).unwrap();
    tracing::info!(chain_index = 0, "subscriber installed");

    assert!(matches!(
        init_logging(&LogConfig::production()),
        Err(TelemetryError::LoggingInit(_))
    ));
}
