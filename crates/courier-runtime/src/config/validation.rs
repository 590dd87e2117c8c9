//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ApiConfig, BotConfig, CourierConfig, HandlerConfig, LogOutput, LoggingConfig};

/// Longest presence text the platform accepts.
const MAX_PRESENCE_LEN: usize = 128;

/// Validates the entire configuration.
///
/// A missing `bot.auth_token` or `bot.application_id` is reported as
/// [`ConfigError::MissingField`]; the binary treats it as fatal.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_handler_config(&config.handlers)?;
    validate_api_config(&config.api)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates credentials, ids and presence.
fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    match bot.auth_token.as_deref().map(str::trim) {
        None | Some("") => return Err(ConfigError::missing_field("bot.auth_token (TOKEN)")),
        Some(token) if token.contains(char::is_whitespace) => {
            return Err(ConfigError::validation("Auth token cannot contain whitespace"));
        }
        Some(_) => {}
    }

    match bot.application_id.as_deref() {
        None | Some("") => {
            return Err(ConfigError::missing_field(
                "bot.application_id (CLIENT_ID)",
            ));
        }
        Some(id) => validate_snowflake("bot.application_id", id)?,
    }

    if let Some(guild_id) = bot.guild_id.as_deref() {
        validate_snowflake("bot.guild_id", guild_id)?;
    }

    let presence = &bot.presence;
    if presence.enabled
        && (presence.name.is_empty() || presence.name.chars().count() > MAX_PRESENCE_LEN)
    {
        return Err(ConfigError::validation(format!(
            "Presence text must be 1-{MAX_PRESENCE_LEN} characters"
        )));
    }

    Ok(())
}

/// Platform ids are unsigned decimal numbers.
fn validate_snowflake(field: &str, id: &str) -> ConfigResult<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::validation(format!(
            "{field} must be a numeric id, got '{id}'"
        )));
    }
    Ok(())
}

fn validate_handler_config(handlers: &HandlerConfig) -> ConfigResult<()> {
    if handlers.commands_dir.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("handlers.commands_dir"));
    }
    if handlers.components_dir.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("handlers.components_dir"));
    }
    Ok(())
}

fn validate_api_config(api: &ApiConfig) -> ConfigResult<()> {
    validate_url(&api.base_url)?;
    if api.timeout_ms == 0 {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates an HTTP(S) URL.
fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("api.base_url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {:?}", valid_schemes),
        ));
    }

    Ok(())
}
