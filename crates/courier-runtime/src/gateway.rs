//! The gateway seam.
//!
//! A [`Gateway`] is the persistent event source: it authenticates, reports
//! the connected user and then delivers interactions until the connection
//! ends. Reconnection and heartbeats are the implementation's business; the
//! runtime only sees a stream of [`Interaction`]s.
//!
//! [`ChannelGateway`] is an in-memory gateway fed through a channel. It backs
//! the console demo and the lifecycle tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{GatewayError, GatewayResult};
use courier_core::{Activity, CurrentUser, Interaction, ReadyInfo};

/// An established gateway connection.
#[derive(Debug)]
pub struct GatewaySession {
    /// What the gateway reported on connect.
    pub ready: ReadyInfo,
    /// Inbound interactions. Closes when the connection ends.
    pub events: mpsc::Receiver<Interaction>,
}

/// A persistent connection to the platform.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Authenticates with `token` and opens the event stream.
    ///
    /// Rejected credentials must be reported as
    /// [`GatewayError::Authentication`].
    async fn connect(&self, token: &str) -> GatewayResult<GatewaySession>;

    /// Sets the bot's presence.
    async fn set_presence(&self, activity: &Activity) -> GatewayResult<()>;
}

/// Sends interactions into a [`ChannelGateway`].
pub type InteractionSender = mpsc::Sender<Interaction>;

/// An in-memory gateway whose events come from an [`InteractionSender`].
///
/// The event stream closes once every sender is dropped.
#[derive(Debug)]
pub struct ChannelGateway {
    ready: ReadyInfo,
    expected_token: Option<String>,
    events: Mutex<Option<mpsc::Receiver<Interaction>>>,
    presence: Mutex<Option<Activity>>,
}

impl ChannelGateway {
    /// Creates a gateway that reports `user` on connect.
    pub fn new(user: CurrentUser, buffer: usize) -> (Self, InteractionSender) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let gateway = Self {
            ready: ReadyInfo {
                user,
                session_id: None,
                guild_count: 0,
            },
            expected_token: None,
            events: Mutex::new(Some(rx)),
            presence: Mutex::new(None),
        };
        (gateway, tx)
    }

    /// Rejects every token except `token`.
    pub fn require_token(mut self, token: impl Into<String>) -> Self {
        self.expected_token = Some(token.into());
        self
    }

    /// Sets the guild count reported on connect.
    pub fn with_guild_count(mut self, count: usize) -> Self {
        self.ready.guild_count = count;
        self
    }

    /// The last presence that was set.
    pub fn presence(&self) -> Option<Activity> {
        self.presence.lock().clone()
    }
}

#[async_trait]
impl Gateway for ChannelGateway {
    async fn connect(&self, token: &str) -> GatewayResult<GatewaySession> {
        if let Some(expected) = &self.expected_token
            && expected != token
        {
            return Err(GatewayError::Authentication("invalid token".to_string()));
        }

        let events = self
            .events
            .lock()
            .take()
            .ok_or_else(|| GatewayError::Connection("already connected".to_string()))?;

        info!(user = %self.ready.user.tag(), "Channel gateway connected");
        Ok(GatewaySession {
            ready: self.ready.clone(),
            events,
        })
    }

    async fn set_presence(&self, activity: &Activity) -> GatewayResult<()> {
        debug!(activity = %activity, "Presence updated");
        *self.presence.lock() = Some(activity.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use courier_core::testing::RecordingResponder;
    use courier_core::{ActivityKind, InteractionData};

    fn user() -> CurrentUser {
        CurrentUser {
            id: "1".to_string(),
            name: "courier".to_string(),
            discriminator: None,
        }
    }

    #[tokio::test]
    async fn test_connect_once() {
        let (gateway, tx) = ChannelGateway::new(user(), 4);
        let mut session = gateway.connect("any").await.unwrap();
        assert_eq!(session.ready.user.name, "courier");

        let responder = Arc::new(RecordingResponder::new());
        tx.send(Interaction::new("i1", InteractionData::command("ping"), responder))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(session.events.recv().await.unwrap().id(), "i1");
        assert!(session.events.recv().await.is_none());

        assert!(matches!(
            gateway.connect("any").await,
            Err(GatewayError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_wrong_token() {
        let (gateway, _tx) = ChannelGateway::new(user(), 1);
        let gateway = gateway.require_token("right");
        assert!(matches!(
            gateway.connect("wrong").await,
            Err(GatewayError::Authentication(_))
        ));
        assert!(gateway.connect("right").await.is_ok());
    }

    #[tokio::test]
    async fn test_presence_is_recorded() {
        let (gateway, _tx) = ChannelGateway::new(user(), 1);
        let activity = Activity::new(ActivityKind::Watching, "/help");
        gateway.set_presence(&activity).await.unwrap();
        assert_eq!(gateway.presence(), Some(activity));
    }
}
