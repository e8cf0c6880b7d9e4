//! # Fusion Bridge Telemetry
//!
//! `tracing` subscriber set-up shared by bridge binaries and tools.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fb_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `fusion-bridge` | Service name in logs |
//! | `FB_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `FB_JSON_LOGS` | `false` (`true` in containers) | JSON output |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
