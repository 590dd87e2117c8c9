//! Handler units.
//!
//! A unit pairs an identity (a command name or a component routing key) with
//! the actions that handle it. Units come either from manifest files found by
//! the [`HandlerLoader`](crate::loader::HandlerLoader) or from code.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use courier_core::{CommandSchema, SchemaError};

use crate::error::SkipReason;
use crate::handler::{
    AutocompleteAction, BoxedAutocompleteAction, BoxedCommandAction, BoxedComponentAction,
    CommandAction, ComponentAction,
};
use crate::routing::MAX_ROUTING_KEY_LEN;

/// Where a unit was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSource {
    /// Loaded from a manifest file.
    File(PathBuf),
    /// Registered directly in code.
    Inline,
}

impl UnitSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Inline => None,
        }
    }
}

impl fmt::Display for UnitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline => f.write_str("<inline>"),
        }
    }
}

/// The two shapes a handler unit can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Command,
    Component,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Component => f.write_str("component"),
        }
    }
}

// ============================================================================
// Command Units
// ============================================================================

/// A slash command: its schema, its action and an optional autocomplete
/// action.
#[derive(Clone)]
pub struct CommandUnit {
    schema: CommandSchema,
    execute: BoxedCommandAction,
    autocomplete: Option<BoxedAutocompleteAction>,
    source: UnitSource,
}

impl CommandUnit {
    /// Creates an inline command unit.
    pub fn new<A: CommandAction>(schema: CommandSchema, execute: A) -> Self {
        Self::from_parts(schema, Arc::new(execute), None, UnitSource::Inline)
    }

    pub(crate) fn from_parts(
        schema: CommandSchema,
        execute: BoxedCommandAction,
        autocomplete: Option<BoxedAutocompleteAction>,
        source: UnitSource,
    ) -> Self {
        Self {
            schema,
            execute,
            autocomplete,
            source,
        }
    }

    /// Attaches an autocomplete action.
    pub fn with_autocomplete<A: AutocompleteAction>(mut self, action: A) -> Self {
        self.autocomplete = Some(Arc::new(action));
        self
    }

    /// The command name, which is the unit's identity.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    pub fn action(&self) -> &BoxedCommandAction {
        &self.execute
    }

    pub fn autocomplete(&self) -> Option<&BoxedAutocompleteAction> {
        self.autocomplete.as_ref()
    }

    pub fn source(&self) -> &UnitSource {
        &self.source
    }

    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        self.schema.validate()
    }
}

impl fmt::Debug for CommandUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandUnit")
            .field("name", &self.schema.name)
            .field("autocomplete", &self.autocomplete.is_some())
            .field("source", &self.source)
            .finish()
    }
}

// ============================================================================
// Component Units
// ============================================================================

/// A button or select-menu handler, identified by its routing key.
#[derive(Clone)]
pub struct ComponentUnit {
    routing_key: String,
    execute: BoxedComponentAction,
    source: UnitSource,
}

impl ComponentUnit {
    /// Creates an inline component unit.
    pub fn new<A: ComponentAction>(routing_key: impl Into<String>, execute: A) -> Self {
        Self::from_parts(
            routing_key.into(),
            Arc::new(execute),
            UnitSource::Inline,
        )
    }

    pub(crate) fn from_parts(
        routing_key: String,
        execute: BoxedComponentAction,
        source: UnitSource,
    ) -> Self {
        Self {
            routing_key,
            execute,
            source,
        }
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn action(&self) -> &BoxedComponentAction {
        &self.execute
    }

    pub fn source(&self) -> &UnitSource {
        &self.source
    }

    pub(crate) fn validate(&self) -> Result<(), SkipReason> {
        validate_routing_key(&self.routing_key)
    }
}

impl fmt::Debug for ComponentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentUnit")
            .field("routing_key", &self.routing_key)
            .field("source", &self.source)
            .finish()
    }
}

/// Routing keys must be non-empty and fit in a platform custom id.
pub(crate) fn validate_routing_key(key: &str) -> Result<(), SkipReason> {
    if key.is_empty() {
        return Err(SkipReason::InvalidField {
            field: "routing_key",
            reason: "must not be empty".to_string(),
        });
    }
    if key.chars().count() > MAX_ROUTING_KEY_LEN {
        return Err(SkipReason::InvalidField {
            field: "routing_key",
            reason: format!("longer than {MAX_ROUTING_KEY_LEN} characters"),
        });
    }
    Ok(())
}

// ============================================================================
// HandlerUnit
// ============================================================================

/// A loaded unit of either kind.
#[derive(Debug, Clone)]
pub enum HandlerUnit {
    Command(CommandUnit),
    Component(ComponentUnit),
}

impl HandlerUnit {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Command(_) => HandlerKind::Command,
            Self::Component(_) => HandlerKind::Component,
        }
    }

    /// The command name or routing key.
    pub fn identity(&self) -> &str {
        match self {
            Self::Command(unit) => unit.name(),
            Self::Component(unit) => unit.routing_key(),
        }
    }

    pub fn source(&self) -> &UnitSource {
        match self {
            Self::Command(unit) => unit.source(),
            Self::Component(unit) => unit.source(),
        }
    }
}

impl From<CommandUnit> for HandlerUnit {
    fn from(unit: CommandUnit) -> Self {
        Self::Command(unit)
    }
}

impl From<ComponentUnit> for HandlerUnit {
    fn from(unit: ComponentUnit) -> Self {
        Self::Component(unit)
    }
}
