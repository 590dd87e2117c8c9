//! Courier Runtime - configuration, command sync and lifecycle.
//!
//! This crate provides:
//! - Layered configuration (`CourierConfig`, `ConfigLoader`)
//! - Logging setup on `tracing-subscriber` (`LoggingBuilder`)
//! - Command registration against the platform API (`sync_commands`,
//!   `RestRegistrar`)
//! - The gateway seam (`Gateway`) with an in-memory implementation
//! - The lifecycle controller (`CourierRuntime`)
//!
//! ```ignore
//! use courier_runtime::{ChannelGateway, CourierRuntime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder().build()?;
//!     courier_runtime::logging::init_from_config(&runtime.config().logging);
//!
//!     let (gateway, _events) = ChannelGateway::new(user, 64);
//!     runtime.actions(actions).gateway(Arc::new(gateway)).run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod rest;
pub mod runtime;
pub mod sync;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, CourierConfig, validate_config};
pub use error::{
    GatewayError, GatewayResult, RuntimeError, RuntimeResult, SyncError, SyncResult,
};
pub use gateway::{ChannelGateway, Gateway, GatewaySession, InteractionSender};
pub use logging::{LoggingBuilder, SpanEvents};
pub use rest::RestRegistrar;
pub use runtime::{
    CourierRuntime, DEFAULT_DRAIN_TIMEOUT, PreparedRuntime, RunReport, RuntimeBuilder, StopReason,
    wait_for_shutdown,
};
pub use sync::{CommandRegistrar, RegistrationScope, SyncOutcome, spawn_sync, sync_commands};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros and `Level`.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
