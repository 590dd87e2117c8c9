//! HTTP implementation of the command registrar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::config::CourierConfig;
use crate::error::{SyncError, SyncResult};
use crate::sync::{CommandRegistrar, RegistrationScope};
use courier_core::RegistrationBatch;

/// Registers commands through the platform's REST API.
///
/// Both scopes use the "bulk overwrite" endpoint, which replaces the whole
/// remote command set with the request body.
#[derive(Clone)]
pub struct RestRegistrar {
    client: Client,
    base_url: String,
    application_id: String,
    token: String,
}

impl RestRegistrar {
    /// Creates a registrar for `application_id`, authenticating with `token`.
    pub fn new(
        base_url: impl Into<String>,
        application_id: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> SyncResult<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            application_id: application_id.into(),
            token: token.into(),
        })
    }

    /// Creates a registrar from the `bot` and `api` sections.
    pub fn from_config(config: &CourierConfig) -> SyncResult<Self> {
        let token = config
            .bot
            .auth_token
            .as_deref()
            .ok_or_else(|| SyncError::Misconfigured("no auth token".to_string()))?;
        let application_id = config
            .bot
            .application_id
            .as_deref()
            .ok_or_else(|| SyncError::Misconfigured("no application id".to_string()))?;

        Self::new(
            config.api.base_url.as_str(),
            application_id,
            token,
            config.api.timeout(),
        )
    }

    /// The bulk overwrite endpoint for `scope`.
    pub fn endpoint(&self, scope: &RegistrationScope) -> String {
        match scope {
            RegistrationScope::Global => format!(
                "{}/applications/{}/commands",
                self.base_url, self.application_id
            ),
            RegistrationScope::Guild(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.base_url, self.application_id, guild
            ),
        }
    }
}

#[async_trait]
impl CommandRegistrar for RestRegistrar {
    async fn bulk_overwrite(
        &self,
        scope: &RegistrationScope,
        batch: &RegistrationBatch,
    ) -> SyncResult<()> {
        let url = self.endpoint(scope);
        debug!(url = %url, count = batch.len(), "PUT command batch");

        let resp = self
            .client
            .put(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(batch)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for RestRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRegistrar")
            .field("base_url", &self.base_url)
            .field("application_id", &self.application_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registrar() -> RestRegistrar {
        RestRegistrar::new(
            "https://discord.com/api/v10/",
            "1234",
            "secret",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoints() {
        let registrar = registrar();
        assert_eq!(
            registrar.endpoint(&RegistrationScope::Global),
            "https://discord.com/api/v10/applications/1234/commands"
        );
        assert_eq!(
            registrar.endpoint(&RegistrationScope::Guild("99".to_string())),
            "https://discord.com/api/v10/applications/1234/guilds/99/commands"
        );
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = CourierConfig::default();
        assert!(matches!(
            RestRegistrar::from_config(&config),
            Err(SyncError::Misconfigured(_))
        ));

        let mut config = CourierConfig::default();
        config.bot.auth_token = Some("secret".to_string());
        config.bot.application_id = Some("1234".to_string());
        let registrar = RestRegistrar::from_config(&config).unwrap();
        assert!(registrar.endpoint(&RegistrationScope::Global).ends_with("/1234/commands"));
    }

    #[test]
    fn test_debug_hides_token() {
        let debug = format!("{:?}", registrar());
        assert!(!debug.contains("secret"));
    }
}
