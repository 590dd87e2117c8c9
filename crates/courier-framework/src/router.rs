//! The interaction router.
//!
//! The [`Router`] receives one interaction at a time, classifies it by kind,
//! resolves it to a handler unit and invokes the unit's action:
//!
//! - chat-input commands are looked up by command name;
//! - buttons and select menus are resolved by routing token, exact key
//!   first, then the prefix before the first `:`;
//! - autocomplete requests go to the command's autocomplete action, if any;
//! - anything else is ignored.
//!
//! Unresolved commands and components get a short private reply. Errors and
//! panics raised while a handler runs are caught here: they are logged, and if
//! the interaction has not been acknowledged yet one private error reply is
//! attempted. A failure of that reply is swallowed. Nothing that happens
//! inside one dispatch reaches the caller.
//!
//! ```rust,ignore
//! let router = Router::new(ctx);
//! while let Some(interaction) = events.recv().await {
//!     router.spawn(interaction);
//! }
//! ```

use std::any::Any;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::task::JoinHandle;
use tower::Service;
use tracing::{Instrument, debug, error, info_span, trace, warn};

use crate::context::BotContext;
use crate::error::HandlerError;
use crate::handler::BoxFuture;
use crate::routing::MatchKind;
use courier_core::{Interaction, InteractionKind};

// ============================================================================
// Messages and Outcomes
// ============================================================================

/// User-visible texts sent by the router. All of them are sent privately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterMessages {
    pub command_not_found: String,
    pub component_not_found: String,
    pub internal_error: String,
}

impl Default for RouterMessages {
    fn default() -> Self {
        Self {
            command_not_found: "Command not found.".to_string(),
            component_not_found: "Component handler not found.".to_string(),
            internal_error: "An error occurred while processing your interaction.".to_string(),
        }
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The interaction kind is not routed, or an autocomplete request had no
    /// autocomplete action.
    Ignored,
    /// A handler ran to completion.
    Completed,
    /// No handler matched; the "not found" reply was sent.
    NotFound,
    /// A handler failed or panicked.
    Failed,
}

// ============================================================================
// Router
// ============================================================================

/// Routes interactions to handler units. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Router {
    ctx: Arc<BotContext>,
    messages: Arc<RouterMessages>,
}

impl Router {
    /// Creates a router with the default messages.
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            ctx,
            messages: Arc::new(RouterMessages::default()),
        }
    }

    /// Replaces the user-visible messages.
    pub fn with_messages(mut self, messages: RouterMessages) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    pub fn messages(&self) -> &RouterMessages {
        &self.messages
    }

    /// Dispatches one interaction on its own task.
    pub fn spawn(&self, interaction: Interaction) -> JoinHandle<DispatchOutcome> {
        let router = self.clone();
        tokio::spawn(async move { router.dispatch(interaction).await })
    }

    /// Dispatches one interaction and waits for its handler to finish.
    pub async fn dispatch(&self, interaction: Interaction) -> DispatchOutcome {
        let interaction = Arc::new(interaction);
        let span = info_span!(
            "dispatch",
            interaction = %interaction.id(),
            kind = %interaction.kind()
        );
        self.dispatch_shared(interaction).instrument(span).await
    }

    async fn dispatch_shared(&self, interaction: Arc<Interaction>) -> DispatchOutcome {
        let routed = AssertUnwindSafe(self.route(Arc::clone(&interaction)))
            .catch_unwind()
            .await;

        let err = match routed {
            Ok(Ok(outcome)) => {
                trace!(?outcome, "Dispatch finished");
                return outcome;
            }
            Ok(Err(e)) => e,
            Err(payload) => HandlerError::Panicked(panic_message(payload.as_ref())),
        };

        error!(error = %err, "Error while handling interaction");
        self.reply_internal_error(&interaction).await;
        DispatchOutcome::Failed
    }

    async fn route(&self, interaction: Arc<Interaction>) -> Result<DispatchOutcome, HandlerError> {
        match interaction.kind() {
            InteractionKind::ChatInput => self.route_command(interaction).await,
            InteractionKind::Button | InteractionKind::SelectMenu => {
                self.route_component(interaction).await
            }
            InteractionKind::Autocomplete => self.route_autocomplete(interaction).await,
            kind => {
                trace!(%kind, "Ignoring interaction");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    async fn route_command(
        &self,
        interaction: Arc<Interaction>,
    ) -> Result<DispatchOutcome, HandlerError> {
        let name = interaction.command_name().unwrap_or_default();
        let Some(unit) = self.ctx.registry().command(name) else {
            debug!(command = %name, "Command not found");
            if let Err(e) = interaction
                .reply_private(self.messages.command_not_found.clone())
                .await
            {
                warn!(error = %e, "Could not send not-found reply");
            }
            return Ok(DispatchOutcome::NotFound);
        };

        debug!(command = %name, "Invoking command");
        let action = Arc::clone(unit.action());
        action
            .execute(Arc::clone(&interaction), Arc::clone(&self.ctx))
            .await?;
        Ok(DispatchOutcome::Completed)
    }

    async fn route_component(
        &self,
        interaction: Arc<Interaction>,
    ) -> Result<DispatchOutcome, HandlerError> {
        let token = interaction.custom_id().unwrap_or_default();
        let Some(resolved) = self.ctx.registry().resolve_component(token) else {
            debug!(routing_token = %token, "Component handler not found");
            if let Err(e) = interaction
                .reply_private(self.messages.component_not_found.clone())
                .await
            {
                warn!(error = %e, "Could not send not-found reply");
            }
            return Ok(DispatchOutcome::NotFound);
        };

        let routing_key = resolved.unit.routing_key();
        match resolved.kind {
            MatchKind::Exact => debug!(routing_token = %token, "Invoking component"),
            MatchKind::Prefix => {
                debug!(routing_token = %token, routing_key, "Invoking component by prefix")
            }
        }
        let action = Arc::clone(resolved.unit.action());
        action
            .execute(Arc::clone(&interaction), Arc::clone(&self.ctx))
            .await?;
        Ok(DispatchOutcome::Completed)
    }

    async fn route_autocomplete(
        &self,
        interaction: Arc<Interaction>,
    ) -> Result<DispatchOutcome, HandlerError> {
        let name = interaction.command_name().unwrap_or_default();
        let Some(action) = self
            .ctx
            .registry()
            .command(name)
            .and_then(|unit| unit.autocomplete())
            .map(Arc::clone)
        else {
            trace!(command = %name, "No autocomplete action");
            return Ok(DispatchOutcome::Ignored);
        };

        action.complete(Arc::clone(&interaction)).await?;
        Ok(DispatchOutcome::Completed)
    }

    async fn reply_internal_error(&self, interaction: &Interaction) {
        if interaction.is_acknowledged() {
            debug!("Interaction already acknowledged, no error reply sent");
            return;
        }
        if let Err(e) = interaction
            .reply_private(self.messages.internal_error.clone())
            .await
        {
            warn!(error = %e, "Could not send error reply");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Service<Interaction> for Router {
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<DispatchOutcome, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, interaction: Interaction) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { Ok(router.dispatch(interaction).await) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::HandlerResult;
    use crate::registry::{Registry, RegistryBuilder};
    use crate::unit::{CommandUnit, ComponentUnit};
    use courier_core::testing::RecordingResponder;
    use courier_core::{
        CommandOptionValue, CommandSchema, InteractionData, InteractionResponse, OptionChoice,
        OptionValue, ReplyMessage,
    };
    use tower::ServiceExt;

    fn make_router(builder: RegistryBuilder) -> Router {
        let registry = Arc::new(builder.build());
        Router::new(Arc::new(BotContext::new("app", registry)))
    }

    fn make_interaction(data: InteractionData) -> (Interaction, Arc<RecordingResponder>) {
        make_interaction_with(data, RecordingResponder::new())
    }

    fn make_interaction_with(
        data: InteractionData,
        responder: RecordingResponder,
    ) -> (Interaction, Arc<RecordingResponder>) {
        let responder = Arc::new(responder);
        (
            Interaction::new("1", data, responder.clone()).with_user("42"),
            responder,
        )
    }

    fn counting_command(name: &str, calls: &Arc<AtomicUsize>) -> CommandUnit {
        let calls = Arc::clone(calls);
        CommandUnit::new(
            CommandSchema::new(name, "test command"),
            move |i: Arc<Interaction>, _c: Arc<BotContext>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    i.reply("ok").await?;
                    Ok(())
                }
            },
        )
    }

    fn counting_component(key: &str, calls: &Arc<AtomicUsize>) -> ComponentUnit {
        let calls = Arc::clone(calls);
        ComponentUnit::new(key, move |i: Arc<Interaction>, _c: Arc<BotContext>| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                i.update(format!("handled {}", i.custom_id().unwrap_or_default()))
                    .await?;
                Ok(())
            }
        })
    }

    fn private(content: &str) -> InteractionResponse {
        InteractionResponse::Message(ReplyMessage::private(content))
    }

    #[tokio::test]
    async fn test_command_is_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = make_router(Registry::builder().command(counting_command("ping", &calls)));
        let (interaction, responder) = make_interaction(InteractionData::command("ping"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(responder.messages(), vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_command_gets_private_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = make_router(Registry::builder().command(counting_command("help", &calls)));
        let (interaction, responder) = make_interaction(InteractionData::command("ping"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(responder.responses(), vec![private("Command not found.")]);
    }

    #[tokio::test]
    async fn test_component_prefix_routing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = make_router(Registry::builder().component(counting_component("confirm", &calls)));
        let (interaction, responder) = make_interaction(InteractionData::button("confirm:42"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(responder.messages(), vec!["handled confirm:42".to_string()]);
    }

    #[tokio::test]
    async fn test_exact_component_beats_prefix() {
        let prefix_calls = Arc::new(AtomicUsize::new(0));
        let exact_calls = Arc::new(AtomicUsize::new(0));
        let router = make_router(
            Registry::builder()
                .component(counting_component("colors", &prefix_calls))
                .component(counting_component("colors:menu", &exact_calls)),
        );
        let (interaction, _) = make_interaction(InteractionData::select_menu(
            "colors:menu",
            vec!["red".into()],
        ));

        router.dispatch(interaction).await;
        assert_eq!(exact_calls.load(Ordering::SeqCst), 1);
        assert_eq!(prefix_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_component_gets_private_not_found() {
        let router = make_router(Registry::builder());
        let (interaction, responder) = make_interaction(InteractionData::button("cancel:1"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::NotFound);
        assert_eq!(responder.responses(), vec![private("Component handler not found.")]);
    }

    #[tokio::test]
    async fn test_failing_handler_gets_one_error_reply() {
        let router = make_router(Registry::builder().command(CommandUnit::new(
            CommandSchema::new("fail", "always fails"),
            |_i: Arc<Interaction>, _c: Arc<BotContext>| async {
                Err(HandlerError::msg("database unavailable"))
            },
        )));
        let (interaction, responder) = make_interaction(InteractionData::command("fail"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Failed);
        assert_eq!(
            responder.responses(),
            vec![private("An error occurred while processing your interaction.")]
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_is_isolated() {
        async fn explode(_i: Arc<Interaction>, _c: Arc<BotContext>) -> HandlerResult {
            panic!("handler exploded")
        }

        let router = make_router(Registry::builder().component(ComponentUnit::new("boom", explode)));
        let (interaction, responder) = make_interaction(InteractionData::button("boom"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Failed);
        assert_eq!(responder.count(), 1);
    }

    #[tokio::test]
    async fn test_no_second_reply_after_handler_replied() {
        let router = make_router(Registry::builder().command(CommandUnit::new(
            CommandSchema::new("half", "replies then fails"),
            |i: Arc<Interaction>, _c: Arc<BotContext>| async move {
                i.reply("partial result").await?;
                Err(HandlerError::msg("later step failed"))
            },
        )));
        let (interaction, responder) = make_interaction(InteractionData::command("half"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Failed);
        assert_eq!(responder.messages(), vec!["partial result".to_string()]);
    }

    #[tokio::test]
    async fn test_no_error_reply_after_defer() {
        let router = make_router(Registry::builder().command(CommandUnit::new(
            CommandSchema::new("slow", "defers then fails"),
            |i: Arc<Interaction>, _c: Arc<BotContext>| async move {
                i.defer(true).await?;
                Err(HandlerError::msg("timed out"))
            },
        )));
        let (interaction, responder) = make_interaction(InteractionData::command("slow"));

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Failed);
        assert_eq!(
            responder.responses(),
            vec![InteractionResponse::Deferred { ephemeral: true }]
        );
    }

    #[tokio::test]
    async fn test_failed_error_reply_is_swallowed() {
        let router = make_router(Registry::builder().command(CommandUnit::new(
            CommandSchema::new("fail", "always fails"),
            |_i: Arc<Interaction>, _c: Arc<BotContext>| async { Err(HandlerError::msg("nope")) },
        )));
        let (interaction, responder) =
            make_interaction_with(InteractionData::command("fail"), RecordingResponder::failing());

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Failed);
        assert_eq!(responder.count(), 1);
    }

    #[tokio::test]
    async fn test_failed_not_found_reply_is_not_retried() {
        let router = make_router(Registry::builder());
        let (interaction, responder) =
            make_interaction_with(InteractionData::command("ghost"), RecordingResponder::failing());
        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::NotFound);
        assert_eq!(responder.count(), 1);

        let (interaction, responder) =
            make_interaction_with(InteractionData::button("ghost:1"), RecordingResponder::failing());
        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::NotFound);
        assert_eq!(responder.count(), 1);
    }

    #[tokio::test]
    async fn test_autocomplete_routing() {
        let unit = CommandUnit::new(
            CommandSchema::new("echo", "echoes"),
            |_i: Arc<Interaction>, _c: Arc<BotContext>| async { Ok(()) },
        )
        .with_autocomplete(|i: Arc<Interaction>| async move {
            let typed = i
                .focused_option()
                .map(|o| o.value.to_string())
                .unwrap_or_default();
            i.autocomplete(vec![OptionChoice::new(typed.clone(), typed)])
                .await?;
            Ok(())
        });
        let router = make_router(
            Registry::builder()
                .command(unit)
                .command(CommandUnit::new(
                    CommandSchema::new("plain", "no autocomplete"),
                    |_i: Arc<Interaction>, _c: Arc<BotContext>| async { Ok(()) },
                )),
        );

        let data = InteractionData::autocomplete(
            "echo",
            vec![CommandOptionValue::new("text", OptionValue::String("hel".into())).focused()],
        );
        let (interaction, responder) = make_interaction(data);
        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Completed);
        assert_eq!(
            responder.responses(),
            vec![InteractionResponse::Autocomplete {
                choices: vec![OptionChoice::new("hel", "hel")]
            }]
        );

        let (interaction, responder) =
            make_interaction(InteractionData::autocomplete("plain", Vec::new()));
        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Ignored);
        assert_eq!(responder.count(), 0);
    }

    #[tokio::test]
    async fn test_other_kinds_are_ignored() {
        let router = make_router(Registry::builder());
        let (interaction, responder) = make_interaction(InteractionData::Unknown);

        assert_eq!(router.dispatch(interaction).await, DispatchOutcome::Ignored);
        assert_eq!(responder.count(), 0);
    }

    #[tokio::test]
    async fn test_spawn_and_service() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = make_router(Registry::builder().command(counting_command("ping", &calls)));

        let (interaction, _) = make_interaction(InteractionData::command("ping"));
        let outcome = router.spawn(interaction).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Completed);

        let (interaction, _) = make_interaction(InteractionData::command("ping"));
        let outcome = router.clone().oneshot(interaction).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Completed);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_custom_messages() {
        let router = make_router(Registry::builder()).with_messages(RouterMessages {
            command_not_found: "Unknown command.".into(),
            ..RouterMessages::default()
        });
        assert_eq!(router.messages().command_not_found, "Unknown command.");
        assert_eq!(
            router.messages().internal_error,
            RouterMessages::default().internal_error
        );
    }
}
