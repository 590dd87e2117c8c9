//! Handler manifest loading.
//!
//! Handler units are described by manifest files, one unit per file, kept in
//! two directories: one for commands and one for components. A manifest
//! names its actions by id; the ids are resolved against an
//! [`ActionTable`] populated in code.
//!
//! Command manifest (`commands/ping.toml`):
//!
//! ```toml
//! execute = "ping"
//!
//! [schema]
//! name = "ping"
//! description = "Replies with pong"
//! ```
//!
//! Component manifest (`components/confirm.json`):
//!
//! ```json
//! { "routing_key": "confirm", "execute": "confirm" }
//! ```
//!
//! Loading never fails as a whole. Files are processed in file-name order;
//! a file that cannot be read, parsed or validated is skipped and reported as
//! a [`LoadWarning`], and a missing directory is an empty source.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::SkipReason;
use crate::handler::ActionTable;
use crate::registry::Registry;
use crate::unit::{CommandUnit, ComponentUnit, HandlerKind, HandlerUnit, UnitSource};
use courier_core::CommandSchema;

/// File extensions recognized as handler manifests.
pub const MANIFEST_EXTENSIONS: &[&str] = &["toml", "json"];

// ============================================================================
// Outcomes
// ============================================================================

/// The result of loading a single manifest.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(HandlerUnit),
    Skip(SkipReason),
}

/// A non-fatal problem found while loading handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// A handler directory exists but could not be listed.
    SourceUnavailable { path: PathBuf, reason: String },

    /// A unit was excluded.
    Skipped { source: UnitSource, reason: SkipReason },

    /// Two units share an identity; the later one replaced the earlier one.
    Duplicate {
        kind: HandlerKind,
        identity: String,
        replaced: UnitSource,
        by: UnitSource,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { path, reason } => {
                write!(f, "cannot read handler directory {}: {reason}", path.display())
            }
            Self::Skipped { source, reason } => write!(f, "skipped {source}: {reason}"),
            Self::Duplicate {
                kind,
                identity,
                replaced,
                by,
            } => write!(
                f,
                "duplicate {kind} '{identity}': {by} replaces {replaced}"
            ),
        }
    }
}

/// The units loaded from one directory, in file-name order, plus warnings.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub units: Vec<HandlerUnit>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

// ============================================================================
// HandlerLoader
// ============================================================================

/// Loads handler manifests and binds them to actions.
#[derive(Debug)]
pub struct HandlerLoader<'a> {
    actions: &'a ActionTable,
}

impl<'a> HandlerLoader<'a> {
    pub fn new(actions: &'a ActionTable) -> Self {
        Self { actions }
    }

    /// Loads command manifests from `dir`.
    pub fn load_commands(&self, dir: impl AsRef<Path>) -> LoadReport {
        self.load(dir, HandlerKind::Command)
    }

    /// Loads component manifests from `dir`.
    pub fn load_components(&self, dir: impl AsRef<Path>) -> LoadReport {
        self.load(dir, HandlerKind::Component)
    }

    /// Loads every manifest in `dir` as a unit of the given kind.
    pub fn load(&self, dir: impl AsRef<Path>, kind: HandlerKind) -> LoadReport {
        let dir = dir.as_ref();
        let mut report = LoadReport::default();

        let files = match manifest_files(dir) {
            Ok(Some(files)) => files,
            Ok(None) => {
                debug!(dir = %dir.display(), %kind, "Handler directory not found, nothing to load");
                return report;
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot read handler directory");
                report.warnings.push(LoadWarning::SourceUnavailable {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
                return report;
            }
        };

        for path in files {
            match self.load_file(&path, kind) {
                LoadOutcome::Loaded(unit) => {
                    debug!(%kind, identity = unit.identity(), path = %path.display(), "Loaded handler");
                    report.units.push(unit);
                }
                LoadOutcome::Skip(reason) => {
                    warn!(%kind, path = %path.display(), %reason, "Skipping handler manifest");
                    report.warnings.push(LoadWarning::Skipped {
                        source: UnitSource::File(path),
                        reason,
                    });
                }
            }
        }

        info!(
            %kind,
            dir = %dir.display(),
            loaded = report.units.len(),
            skipped = report.warnings.len(),
            "Handlers loaded"
        );
        report
    }

    /// Loads a single manifest file.
    pub fn load_file(&self, path: &Path, kind: HandlerKind) -> LoadOutcome {
        let document = match read_manifest(path) {
            Ok(document) => document,
            Err(reason) => return LoadOutcome::Skip(reason),
        };

        let source = UnitSource::File(path.to_path_buf());
        let result = match kind {
            HandlerKind::Command => self.command_unit(&document, source).map(HandlerUnit::from),
            HandlerKind::Component => {
                self.component_unit(&document, source).map(HandlerUnit::from)
            }
        };

        match result {
            Ok(unit) => LoadOutcome::Loaded(unit),
            Err(reason) => LoadOutcome::Skip(reason),
        }
    }

    /// Loads both directories and builds the registry.
    pub fn load_registry(
        &self,
        commands_dir: impl AsRef<Path>,
        components_dir: impl AsRef<Path>,
    ) -> Registry {
        Registry::builder()
            .extend(self.load_commands(commands_dir))
            .extend(self.load_components(components_dir))
            .build()
    }

    fn command_unit(
        &self,
        document: &Map<String, Value>,
        source: UnitSource,
    ) -> Result<CommandUnit, SkipReason> {
        let schema_value = document
            .get("schema")
            .ok_or(SkipReason::MissingField("schema"))?;
        let schema: CommandSchema =
            serde_json::from_value(schema_value.clone()).map_err(|e| SkipReason::InvalidField {
                field: "schema",
                reason: e.to_string(),
            })?;
        schema.validate()?;

        let execute_id = string_field(document, "execute")?;
        let execute =
            self.actions
                .command_action(execute_id)
                .ok_or_else(|| SkipReason::UnknownAction {
                    field: "execute",
                    action: execute_id.to_string(),
                })?;

        let autocomplete = match optional_string_field(document, "autocomplete")? {
            Some(id) => Some(self.actions.autocomplete_action(id).ok_or_else(|| {
                SkipReason::UnknownAction {
                    field: "autocomplete",
                    action: id.to_string(),
                }
            })?),
            None => None,
        };

        if schema.wants_autocomplete() && autocomplete.is_none() {
            warn!(
                command = %schema.name,
                "Command has autocomplete options but no autocomplete action"
            );
        }

        Ok(CommandUnit::from_parts(schema, execute, autocomplete, source))
    }

    fn component_unit(
        &self,
        document: &Map<String, Value>,
        source: UnitSource,
    ) -> Result<ComponentUnit, SkipReason> {
        let routing_key = string_field(document, "routing_key")?;
        crate::unit::validate_routing_key(routing_key)?;

        let execute_id = string_field(document, "execute")?;
        let execute =
            self.actions
                .component_action(execute_id)
                .ok_or_else(|| SkipReason::UnknownAction {
                    field: "execute",
                    action: execute_id.to_string(),
                })?;

        Ok(ComponentUnit::from_parts(
            routing_key.to_string(),
            execute,
            source,
        ))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Lists manifest files in `dir`, sorted by file name.
///
/// Returns `Ok(None)` when the directory does not exist.
fn manifest_files(dir: &Path) -> io::Result<Option<Vec<PathBuf>>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_manifest(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(Some(files))
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
}

fn read_manifest(path: &Path) -> Result<Map<String, Value>, SkipReason> {
    let text = fs::read_to_string(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;

    let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            serde_json::from_str(&text).map_err(|e| SkipReason::Parse(e.to_string()))?
        }
        _ => toml::from_str(&text).map_err(|e| SkipReason::Parse(e.to_string()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SkipReason::NotATable),
    }
}

fn string_field<'d>(
    document: &'d Map<String, Value>,
    field: &'static str,
) -> Result<&'d str, SkipReason> {
    optional_string_field(document, field)?.ok_or(SkipReason::MissingField(field))
}

fn optional_string_field<'d>(
    document: &'d Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'d str>, SkipReason> {
    match document.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(SkipReason::InvalidField {
            field,
            reason: format!("expected a string, found {}", json_type(other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::context::BotContext;
    use crate::error::HandlerResult;
    use courier_core::Interaction;

    async fn noop(_i: Arc<Interaction>, _c: Arc<BotContext>) -> HandlerResult {
        Ok(())
    }

    async fn suggest(_i: Arc<Interaction>) -> HandlerResult {
        Ok(())
    }

    fn actions() -> ActionTable {
        ActionTable::new()
            .command("ping", noop)
            .command("echo", noop)
            .component("confirm", noop)
            .autocomplete("echo", suggest)
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let actions = actions();
        let report = HandlerLoader::new(&actions).load_commands(dir.path().join("nope"));
        assert!(report.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_loads_toml_and_json_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "b_ping.toml",
            r#"
execute = "ping"

[schema]
name = "ping"
description = "Replies with pong"
"#,
        );
        write(
            dir.path(),
            "a_echo.json",
            r#"{
  "execute": "echo",
  "autocomplete": "echo",
  "schema": {
    "name": "echo",
    "description": "Echoes text",
    "options": [
      { "type": "string", "name": "text", "description": "Text", "required": true, "autocomplete": true }
    ]
  }
}"#,
        );
        write(dir.path(), "README.md", "not a manifest");

        let actions = actions();
        let report = HandlerLoader::new(&actions).load_commands(dir.path());

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        let names: Vec<_> = report.units.iter().map(|u| u.identity()).collect();
        assert_eq!(names, vec!["echo", "ping"]);
        match &report.units[0] {
            HandlerUnit::Command(unit) => assert!(unit.autocomplete().is_some()),
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_manifests_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.toml", "routing_key = \"confirm\"\nexecute = \"confirm\"\n");
        write(dir.path(), "no_execute.toml", "routing_key = \"colors\"\n");
        write(dir.path(), "no_key.json", r#"{ "execute": "confirm" }"#);
        write(dir.path(), "broken.toml", "routing_key = ");
        write(dir.path(), "array.json", "[1, 2]");
        write(dir.path(), "unknown.toml", "routing_key = \"x\"\nexecute = \"missing\"\n");

        let actions = actions();
        let report = HandlerLoader::new(&actions).load_components(dir.path());

        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings.len(), 5);

        let reasons: Vec<_> = report
            .warnings
            .iter()
            .filter_map(|w| match w {
                LoadWarning::Skipped { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect();
        assert!(reasons.contains(&SkipReason::MissingField("execute")));
        assert!(reasons.contains(&SkipReason::MissingField("routing_key")));
        assert!(reasons.contains(&SkipReason::NotATable));
        assert!(reasons.contains(&SkipReason::UnknownAction {
            field: "execute",
            action: "missing".into()
        }));
    }

    #[test]
    fn test_invalid_schema_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bad.toml",
            "execute = \"ping\"\n[schema]\nname = \"Ping Me\"\ndescription = \"x\"\n",
        );
        write(
            dir.path(),
            "no_schema.toml",
            "execute = \"ping\"\n",
        );

        let actions = actions();
        let report = HandlerLoader::new(&actions).load_commands(dir.path());
        assert!(report.is_empty());
        assert!(matches!(
            &report.warnings[0],
            LoadWarning::Skipped {
                reason: SkipReason::InvalidSchema(_),
                ..
            }
        ));
        assert!(matches!(
            &report.warnings[1],
            LoadWarning::Skipped {
                reason: SkipReason::MissingField("schema"),
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_field_type() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "num.toml", "routing_key = 5\nexecute = \"confirm\"\n");

        let actions = actions();
        let report = HandlerLoader::new(&actions).load_components(dir.path());
        assert!(report.is_empty());
        assert!(matches!(
            &report.warnings[0],
            LoadWarning::Skipped {
                reason: SkipReason::InvalidField { field: "routing_key", .. },
                ..
            }
        ));
    }

    #[test]
    fn test_load_registry_counts() {
        let root = tempfile::tempdir().unwrap();
        let commands = root.path().join("commands");
        let components = root.path().join("components");
        fs::create_dir(&commands).unwrap();
        fs::create_dir(&components).unwrap();
        write(
            &commands,
            "ping.toml",
            "execute = \"ping\"\n[schema]\nname = \"ping\"\ndescription = \"Pong\"\n",
        );
        write(&components, "confirm.toml", "routing_key = \"confirm\"\nexecute = \"confirm\"\n");

        let actions = actions();
        let registry = HandlerLoader::new(&actions).load_registry(&commands, &components);
        assert_eq!(registry.counts(), (1, 1));
        assert!(registry.command("ping").is_some());
        assert!(registry.resolve_component("confirm:7").is_some());
    }
}
