//! Configuration module for the Courier runtime.
//!
//! This module provides layered configuration loading (defaults, files,
//! environment) and validation for the bot credentials, handler directories,
//! the registration API and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ApiConfig, BotConfig, CourierConfig, HandlerConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, PresenceConfig, SpanEventConfig,
};
pub use validation::validate_config;
