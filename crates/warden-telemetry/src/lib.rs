//! Structured logging for Warden.
//!
//! Every Warden crate logs through [`tracing`] macros with structured fields.
//! This crate installs the subscriber that renders them, as JSON in production
//! or pretty-printed during development.
//!
//! ```rust,ignore
//! use warden_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![doc(html_root_url = "https://docs.rs/warden-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
