//! The handler registry.
//!
//! The [`Registry`] holds two lookup tables, command name to
//! [`CommandUnit`] and routing key to [`ComponentUnit`]. It is built once at
//! startup with a [`RegistryBuilder`] and is read-only afterwards; the router
//! and every handler share it through an `Arc`.
//!
//! There is one entry per identity. When two units share an identity, the
//! one added later replaces the earlier one and a
//! [`LoadWarning::Duplicate`] is logged and recorded. A replaced command
//! keeps its original position in the registration order.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::loader::{LoadReport, LoadWarning};
use crate::routing::{self, Resolution};
use crate::unit::{CommandUnit, ComponentUnit, HandlerKind, HandlerUnit, UnitSource};
use courier_core::RegistrationBatch;

/// Read-only lookup tables for commands and components.
#[derive(Default)]
pub struct Registry {
    commands: Vec<CommandUnit>,
    command_index: HashMap<String, usize>,
    components: HashMap<String, ComponentUnit>,
    warnings: Vec<LoadWarning>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a command by name.
    pub fn command(&self, name: &str) -> Option<&CommandUnit> {
        self.command_index.get(name).map(|&i| &self.commands[i])
    }

    /// Looks up a component by its exact routing key.
    pub fn component(&self, key: &str) -> Option<&ComponentUnit> {
        self.components.get(key)
    }

    /// Resolves a routing token: exact key first, then the prefix before the
    /// first `:`.
    pub fn resolve_component(&self, token: &str) -> Option<Resolution<'_, ComponentUnit>> {
        routing::resolve(&self.components, token)
    }

    /// Command units in registration order.
    pub fn commands(&self) -> &[CommandUnit] {
        &self.commands
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentUnit> {
        self.components.values()
    }

    /// Number of commands and components.
    pub fn counts(&self) -> (usize, usize) {
        (self.commands.len(), self.components.len())
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.components.is_empty()
    }

    /// The command schemas in registration order.
    pub fn registration_batch(&self) -> RegistrationBatch {
        self.commands.iter().map(|c| c.schema().clone()).collect()
    }

    /// Everything that went wrong while the registry was built.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.commands.len())
            .field("components", &self.components.len())
            .field("warnings", &self.warnings.len())
            .finish()
    }
}

// ============================================================================
// RegistryBuilder
// ============================================================================

/// Collects handler units into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    /// Adds a command unit (builder pattern).
    pub fn command(mut self, unit: CommandUnit) -> Self {
        self.add_command(unit);
        self
    }

    /// Adds a component unit (builder pattern).
    pub fn component(mut self, unit: ComponentUnit) -> Self {
        self.add_component(unit);
        self
    }

    /// Adds every unit of a load report and keeps its warnings.
    pub fn extend(mut self, report: LoadReport) -> Self {
        self.registry.warnings.extend(report.warnings);
        for unit in report.units {
            self.add(unit);
        }
        self
    }

    pub fn add(&mut self, unit: HandlerUnit) {
        match unit {
            HandlerUnit::Command(unit) => self.add_command(unit),
            HandlerUnit::Component(unit) => self.add_component(unit),
        }
    }

    /// Adds a command unit, replacing any unit with the same name.
    ///
    /// Inline units are validated here; invalid ones are skipped with a
    /// warning, like invalid manifests.
    pub fn add_command(&mut self, unit: CommandUnit) {
        if matches!(unit.source(), UnitSource::Inline)
            && let Err(e) = unit.validate()
        {
            self.skip(unit.source().clone(), e.into());
            return;
        }

        let registry = &mut self.registry;
        match registry.command_index.get(unit.name()) {
            Some(&i) => {
                let replaced = std::mem::replace(&mut registry.commands[i], unit);
                let by = registry.commands[i].source().clone();
                Self::duplicate(
                    &mut registry.warnings,
                    HandlerKind::Command,
                    replaced.name(),
                    replaced.source().clone(),
                    by,
                );
            }
            None => {
                registry
                    .command_index
                    .insert(unit.name().to_string(), registry.commands.len());
                registry.commands.push(unit);
            }
        }
    }

    /// Adds a component unit, replacing any unit with the same routing key.
    pub fn add_component(&mut self, unit: ComponentUnit) {
        if matches!(unit.source(), UnitSource::Inline)
            && let Err(reason) = unit.validate()
        {
            self.skip(unit.source().clone(), reason);
            return;
        }

        let key = unit.routing_key().to_string();
        let by = unit.source().clone();
        if let Some(replaced) = self.registry.components.insert(key.clone(), unit) {
            Self::duplicate(
                &mut self.registry.warnings,
                HandlerKind::Component,
                &key,
                replaced.source().clone(),
                by,
            );
        }
    }

    /// Finishes the registry.
    pub fn build(self) -> Registry {
        let registry = self.registry;
        info!(
            commands = registry.commands.len(),
            components = registry.components.len(),
            warnings = registry.warnings.len(),
            "Handler registry built"
        );
        registry
    }

    fn skip(&mut self, source: UnitSource, reason: crate::error::SkipReason) {
        warn!(%source, %reason, "Skipping invalid handler unit");
        self.registry
            .warnings
            .push(LoadWarning::Skipped { source, reason });
    }

    fn duplicate(
        warnings: &mut Vec<LoadWarning>,
        kind: HandlerKind,
        identity: &str,
        replaced: UnitSource,
        by: UnitSource,
    ) {
        warn!(
            %kind,
            identity,
            %replaced,
            %by,
            "Duplicate handler identity, last registration wins"
        );
        warnings.push(LoadWarning::Duplicate {
            kind,
            identity: identity.to_string(),
            replaced,
            by,
        });
    }
}
