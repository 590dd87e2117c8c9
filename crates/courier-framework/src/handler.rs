//! Handler actions and the action table.
//!
//! An action is the executable half of a handler unit. Actions are plain
//! async functions or closures; the blanket implementations below make any
//! `Fn(Arc<Interaction>, Arc<BotContext>) -> impl Future<Output = HandlerResult>`
//! usable as a command or component action, in the same spirit as Axum
//! handlers.
//!
//! ```rust,ignore
//! async fn ping(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
//!     interaction.reply("Pong!").await?;
//!     Ok(())
//! }
//!
//! let actions = ActionTable::new().command("ping", ping);
//! ```
//!
//! Handler manifests refer to actions by id, and the [`ActionTable`] is where
//! those ids are bound to code. This keeps the set of executable code fixed
//! at compile time while the routing keys and schemas stay declarative.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use crate::context::BotContext;
use crate::error::HandlerResult;
use courier_core::Interaction;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Action Traits
// ============================================================================

/// The executable part of a command unit.
pub trait CommandAction: Send + Sync + 'static {
    /// Runs the command.
    fn execute(
        &self,
        interaction: Arc<Interaction>,
        ctx: Arc<BotContext>,
    ) -> BoxFuture<'static, HandlerResult>;
}

/// The executable part of a component unit.
pub trait ComponentAction: Send + Sync + 'static {
    /// Handles a button press or menu selection.
    fn execute(
        &self,
        interaction: Arc<Interaction>,
        ctx: Arc<BotContext>,
    ) -> BoxFuture<'static, HandlerResult>;
}

/// The optional autocomplete capability of a command unit.
pub trait AutocompleteAction: Send + Sync + 'static {
    /// Answers an autocomplete request.
    fn complete(&self, interaction: Arc<Interaction>) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> CommandAction for F
where
    F: Fn(Arc<Interaction>, Arc<BotContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn execute(
        &self,
        interaction: Arc<Interaction>,
        ctx: Arc<BotContext>,
    ) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(interaction, ctx))
    }
}

impl<F, Fut> ComponentAction for F
where
    F: Fn(Arc<Interaction>, Arc<BotContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn execute(
        &self,
        interaction: Arc<Interaction>,
        ctx: Arc<BotContext>,
    ) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(interaction, ctx))
    }
}

impl<F, Fut> AutocompleteAction for F
where
    F: Fn(Arc<Interaction>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn complete(&self, interaction: Arc<Interaction>) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(interaction))
    }
}

/// A shared command action.
pub type BoxedCommandAction = Arc<dyn CommandAction>;
/// A shared component action.
pub type BoxedComponentAction = Arc<dyn ComponentAction>;
/// A shared autocomplete action.
pub type BoxedAutocompleteAction = Arc<dyn AutocompleteAction>;

// ============================================================================
// ActionTable
// ============================================================================

/// Binds action ids used in handler manifests to their implementations.
///
/// The three namespaces are independent: a command action and a component
/// action may share an id. Registering the same id twice in one namespace
/// replaces the earlier action and logs a warning.
#[derive(Clone, Default)]
pub struct ActionTable {
    commands: HashMap<String, BoxedCommandAction>,
    components: HashMap<String, BoxedComponentAction>,
    autocompletes: HashMap<String, BoxedAutocompleteAction>,
}

impl ActionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command action (builder pattern).
    pub fn command<A: CommandAction>(mut self, id: impl Into<String>, action: A) -> Self {
        self.register_command(id, action);
        self
    }

    /// Registers a component action (builder pattern).
    pub fn component<A: ComponentAction>(mut self, id: impl Into<String>, action: A) -> Self {
        self.register_component(id, action);
        self
    }

    /// Registers an autocomplete action (builder pattern).
    pub fn autocomplete<A: AutocompleteAction>(
        mut self,
        id: impl Into<String>,
        action: A,
    ) -> Self {
        self.register_autocomplete(id, action);
        self
    }

    /// Registers a command action.
    pub fn register_command<A: CommandAction>(&mut self, id: impl Into<String>, action: A) {
        let id = id.into();
        if self.commands.insert(id.clone(), Arc::new(action)).is_some() {
            warn!(action = %id, "Command action registered twice, last registration wins");
        }
    }

    /// Registers a component action.
    pub fn register_component<A: ComponentAction>(&mut self, id: impl Into<String>, action: A) {
        let id = id.into();
        if self.components.insert(id.clone(), Arc::new(action)).is_some() {
            warn!(action = %id, "Component action registered twice, last registration wins");
        }
    }

    /// Registers an autocomplete action.
    pub fn register_autocomplete<A: AutocompleteAction>(
        &mut self,
        id: impl Into<String>,
        action: A,
    ) {
        let id = id.into();
        if self.autocompletes.insert(id.clone(), Arc::new(action)).is_some() {
            warn!(action = %id, "Autocomplete action registered twice, last registration wins");
        }
    }

    pub fn command_action(&self, id: &str) -> Option<BoxedCommandAction> {
        self.commands.get(id).cloned()
    }

    pub fn component_action(&self, id: &str) -> Option<BoxedComponentAction> {
        self.components.get(id).cloned()
    }

    pub fn autocomplete_action(&self, id: &str) -> Option<BoxedAutocompleteAction> {
        self.autocompletes.get(id).cloned()
    }

    /// Total number of registered actions across all namespaces.
    pub fn len(&self) -> usize {
        self.commands.len() + self.components.len() + self.autocompletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<_> = self.commands.keys().collect();
        let mut components: Vec<_> = self.components.keys().collect();
        let mut autocompletes: Vec<_> = self.autocompletes.keys().collect();
        commands.sort();
        components.sort();
        autocompletes.sort();
        f.debug_struct("ActionTable")
            .field("commands", &commands)
            .field("components", &components)
            .field("autocompletes", &autocompletes)
            .finish()
    }
}
