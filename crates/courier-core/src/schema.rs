//! Declarative command schemas and the registration wire format.
//!
//! A [`CommandSchema`] is what a command handler declares about itself: its
//! name, description and options. The same type is read from handler
//! manifests and written to the remote registration endpoint, so option types
//! accept either their name (`"string"`) or their numeric wire code (`3`) on
//! input and always serialize as the code.
//!
//! [`CommandSchema::validate`] enforces the platform naming and size rules.
//! A schema that passes validation is guaranteed to serialize.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SchemaError, SchemaResult};

/// Maximum length of a command or option name.
pub const MAX_NAME_LEN: usize = 32;
/// Maximum length of a command or option description.
pub const MAX_DESCRIPTION_LEN: usize = 100;
/// Maximum number of options per command (or per subcommand).
pub const MAX_OPTIONS: usize = 25;
/// Maximum number of choices per option.
pub const MAX_CHOICES: usize = 25;

// ============================================================================
// Option Types
// ============================================================================

/// The type of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionType {
    /// Returns the numeric code used in the registration payload.
    pub fn code(self) -> u8 {
        match self {
            Self::SubCommand => 1,
            Self::SubCommandGroup => 2,
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
            Self::User => 6,
            Self::Channel => 7,
            Self::Role => 8,
            Self::Mentionable => 9,
            Self::Number => 10,
            Self::Attachment => 11,
        }
    }

    /// Looks up an option type by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::SubCommand,
            2 => Self::SubCommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            7 => Self::Channel,
            8 => Self::Role,
            9 => Self::Mentionable,
            10 => Self::Number,
            11 => Self::Attachment,
            _ => return None,
        })
    }

    /// Looks up an option type by its manifest name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "sub_command" | "subcommand" => Self::SubCommand,
            "sub_command_group" | "subcommand_group" => Self::SubCommandGroup,
            "string" => Self::String,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "user" => Self::User,
            "channel" => Self::Channel,
            "role" => Self::Role,
            "mentionable" => Self::Mentionable,
            "number" => Self::Number,
            "attachment" => Self::Attachment,
            _ => return None,
        })
    }

    /// Returns the manifest name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubCommand => "sub_command",
            Self::SubCommandGroup => "sub_command_group",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::User => "user",
            Self::Channel => "channel",
            Self::Role => "role",
            Self::Mentionable => "mentionable",
            Self::Number => "number",
            Self::Attachment => "attachment",
        }
    }

    /// Whether options of this type may declare choices or autocomplete.
    pub fn supports_choices(self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number)
    }

    /// Whether options of this type nest further options.
    pub fn is_subcommand(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for OptionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Self::from_code(code).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown option type code {code}"))
            }),
            Repr::Name(name) => Self::from_name(&name).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown option type '{name}'"))
            }),
        }
    }
}

// ============================================================================
// Choices
// ============================================================================

/// The value of a predefined choice or an autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Number(f64),
    String(String),
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// A named choice, used both for predefined option choices and for
/// autocomplete suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: ChoiceValue,
}

impl OptionChoice {
    /// Creates a choice.
    pub fn new(name: impl Into<String>, value: impl Into<ChoiceValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Options and Commands
// ============================================================================

/// One option of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: OptionType,

    pub name: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub autocomplete: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    /// Nested options, only for subcommands and subcommand groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    /// Creates an optional option of the given type.
    pub fn new(kind: OptionType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            autocomplete: false,
            min_value: None,
            max_value: None,
            options: Vec::new(),
        }
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Enables autocomplete for this option.
    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }

    /// Adds a predefined choice.
    pub fn choice(mut self, choice: OptionChoice) -> Self {
        self.choices.push(choice);
        self
    }

    fn validate(&self) -> SchemaResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.name, &self.description)?;

        if !self.choices.is_empty() || self.autocomplete {
            if !self.kind.supports_choices() {
                return Err(SchemaError::Unsupported {
                    option: self.name.clone(),
                    kind: self.kind.to_string(),
                    what: if self.autocomplete {
                        "autocomplete"
                    } else {
                        "choices"
                    },
                });
            }
            if self.autocomplete && !self.choices.is_empty() {
                return Err(SchemaError::Unsupported {
                    option: self.name.clone(),
                    kind: self.kind.to_string(),
                    what: "choices together with autocomplete",
                });
            }
        }

        if self.choices.len() > MAX_CHOICES {
            return Err(SchemaError::TooMany {
                name: self.name.clone(),
                what: "choices",
                count: self.choices.len(),
                max: MAX_CHOICES,
            });
        }
        for choice in &self.choices {
            if choice.name.is_empty() || choice.name.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(SchemaError::InvalidDescription {
                    name: format!("{}.{}", self.name, choice.name),
                    max: MAX_DESCRIPTION_LEN,
                });
            }
        }

        if self.kind.is_subcommand() {
            validate_options(&self.name, &self.options)?;
        } else if !self.options.is_empty() {
            return Err(SchemaError::Unsupported {
                option: self.name.clone(),
                kind: self.kind.to_string(),
                what: "nested options",
            });
        }

        Ok(())
    }
}

/// The declarative description of a slash command, in registration format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,

    /// Permission bit set, as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_permission: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
}

impl CommandSchema {
    /// Creates a schema with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            default_member_permissions: None,
            dm_permission: None,
            nsfw: None,
        }
    }

    /// Adds an option.
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Whether any option (at any depth) requests autocomplete.
    pub fn wants_autocomplete(&self) -> bool {
        fn any(options: &[CommandOption]) -> bool {
            options.iter().any(|o| o.autocomplete || any(&o.options))
        }
        any(&self.options)
    }

    /// Checks the schema against the platform rules and makes sure it
    /// serializes to the registration format.
    pub fn validate(&self) -> SchemaResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.name, &self.description)?;
        validate_options(&self.name, &self.options)?;
        serde_json::to_value(self).map_err(|e| SchemaError::Serialize(e.to_string()))?;
        Ok(())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn validate_name(name: &str) -> SchemaResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(SchemaError::InvalidName {
            name: name.to_string(),
            reason: "must be 1-32 characters",
        });
    }
    if !name
        .chars()
        .all(|c| c == '-' || c == '_' || c.is_alphanumeric())
    {
        return Err(SchemaError::InvalidName {
            name: name.to_string(),
            reason: "only letters, digits, '-' and '_' are allowed",
        });
    }
    if name.chars().any(char::is_uppercase) {
        return Err(SchemaError::InvalidName {
            name: name.to_string(),
            reason: "must be lowercase",
        });
    }
    Ok(())
}

fn validate_description(name: &str, description: &str) -> SchemaResult<()> {
    let len = description.chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LEN {
        return Err(SchemaError::InvalidDescription {
            name: name.to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

fn validate_options(owner: &str, options: &[CommandOption]) -> SchemaResult<()> {
    if options.len() > MAX_OPTIONS {
        return Err(SchemaError::TooMany {
            name: owner.to_string(),
            what: "options",
            count: options.len(),
            max: MAX_OPTIONS,
        });
    }

    let mut seen = HashSet::new();
    let mut optional_seen = false;
    for option in options {
        if !seen.insert(option.name.as_str()) {
            return Err(SchemaError::DuplicateOption {
                command: owner.to_string(),
                option: option.name.clone(),
            });
        }
        if option.required && optional_seen {
            return Err(SchemaError::RequiredAfterOptional {
                command: owner.to_string(),
                option: option.name.clone(),
            });
        }
        optional_seen |= !option.required && !option.kind.is_subcommand();
        option.validate()?;
    }
    Ok(())
}

// ============================================================================
// Registration Batch
// ============================================================================

/// The ordered set of command schemas sent in one bulk registration call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RegistrationBatch(Vec<CommandSchema>);

impl RegistrationBatch {
    /// Creates a batch from schemas, keeping their order.
    pub fn new(schemas: Vec<CommandSchema>) -> Self {
        Self(schemas)
    }

    /// Number of commands in the batch.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the schemas in order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSchema> {
        self.0.iter()
    }

    /// Returns the command names in order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.name.as_str()).collect()
    }
}

impl FromIterator<CommandSchema> for RegistrationBatch {
    fn from_iter<I: IntoIterator<Item = CommandSchema>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
