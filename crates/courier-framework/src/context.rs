//! The process-wide bot context.
//!
//! [`BotContext`] is built once at startup, after the handler registry is
//! loaded, and is handed to the router and to every action. It holds the
//! immutable registry and the connection state of the client.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::registry::Registry;
use courier_core::{CurrentUser, ReadyInfo};

/// Shared state visible to every handler.
pub struct BotContext {
    application_id: String,
    guild_id: Option<String>,
    registry: Arc<Registry>,
    ready: watch::Sender<Option<ReadyInfo>>,
}

impl BotContext {
    /// Creates a context for a client that is not connected yet.
    pub fn new(application_id: impl Into<String>, registry: Arc<Registry>) -> Self {
        let (ready, _) = watch::channel(None);
        Self {
            application_id: application_id.into(),
            guild_id: None,
            registry,
            ready,
        }
    }

    /// Sets the guild commands are registered to.
    pub fn with_guild(mut self, guild_id: Option<String>) -> Self {
        self.guild_id = guild_id;
        self
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// The guild commands are registered to, if registration is guild-scoped.
    pub fn guild_id(&self) -> Option<&str> {
        self.guild_id.as_deref()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Records that the gateway connection is established.
    pub fn mark_ready(&self, info: ReadyInfo) {
        info!(user = %info.user.tag(), guilds = info.guild_count, "Client ready");
        self.ready.send_replace(Some(info));
    }

    /// Records that the gateway connection was lost.
    pub fn mark_disconnected(&self) {
        self.ready.send_replace(None);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.borrow().is_some()
    }

    /// The connected bot user, once ready.
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.ready.borrow().as_ref().map(|info| info.user.clone())
    }

    pub fn ready_info(&self) -> Option<ReadyInfo> {
        self.ready.borrow().clone()
    }

    /// Waits until the client is ready.
    pub async fn wait_ready(&self) -> ReadyInfo {
        let mut rx = self.ready.subscribe();
        loop {
            if let Some(info) = rx.borrow_and_update().clone() {
                return info;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl std::fmt::Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("registry", &self.registry)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ready_info() -> ReadyInfo {
        ReadyInfo {
            user: CurrentUser {
                id: "1".into(),
                name: "courier".into(),
                discriminator: None,
            },
            session_id: None,
            guild_count: 2,
        }
    }

    #[tokio::test]
    async fn test_ready_state() {
        let ctx = Arc::new(BotContext::new("app", Arc::new(Registry::default())));
        assert!(!ctx.is_ready());
        assert!(ctx.current_user().is_none());

        let waiter = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { ctx.wait_ready().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.mark_ready(ready_info());

        let info = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.guild_count, 2);
        assert!(ctx.is_ready());
        assert_eq!(ctx.current_user().unwrap().name, "courier");

        ctx.mark_disconnected();
        assert!(!ctx.is_ready());
    }
}
