//! Inbound interactions.
//!
//! An interaction payload is discriminated purely on its numeric `type`
//! field; every other field is interpreted according to that tag. Command
//! options are kept as raw wire nodes here and only validated into
//! [`CommandOption`] trees by the router, so that an argument-shape problem
//! is reported as a validation failure of the command rather than a malformed
//! payload.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::{ParseError, ValidationError};
use crate::types::option::{validate_options, CommandOption};
use crate::types::Snowflake;

/// Maximum number of action rows in a modal.
pub const MAX_MODAL_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Discriminator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum InteractionType {
    Ping = 1,
    ApplicationCommand = 2,
    MessageComponent = 3,
    ApplicationCommandAutocomplete = 4,
    ModalSubmit = 5,
}

impl InteractionType {
    pub fn from_tag(tag: u64) -> Option<Self> {
        Some(match tag {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::ApplicationCommandAutocomplete,
            5 => Self::ModalSubmit,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUser {
    pub id: Snowflake,
    pub username: String,
}

/// The guild member who triggered the interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: MemberUser,
}

/// Name and raw options of an invoked (or autocompleting) command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandData {
    pub name: String,
    /// Command type (1 = chat input). Not used for routing.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

impl CommandData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(1),
            options: Vec::new(),
        }
    }

    /// Append an option node.
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option.to_json());
        self
    }

    /// Validate the raw option list into an option tree.
    pub fn parse_options(&self) -> Result<Vec<CommandOption>, ValidationError> {
        validate_options(&self.options)
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInteraction {
    pub member: Member,
    pub guild_id: Snowflake,
    pub data: CommandData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Snowflake,
}

/// Metadata about the command that produced the message a component lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInteraction {
    /// Full command name, e.g. `moves list`.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub user: UserRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<MessageInteraction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentData {
    pub component_type: u8,
    pub custom_id: String,
    /// Selected values, for select menus.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInteraction {
    pub member: Member,
    pub guild_id: Snowflake,
    pub message: ComponentMessage,
    pub data: ComponentData,
}

impl ComponentInteraction {
    /// The name components are routed by: the originating command when the
    /// message carries one, otherwise the component's own custom id.
    pub fn route_name(&self) -> &str {
        self.message
            .interaction
            .as_ref()
            .map(|origin| origin.name.as_str())
            .unwrap_or(&self.data.custom_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteInteraction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    pub guild_id: Snowflake,
    pub data: CommandData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalInput {
    #[serde(rename = "type")]
    pub kind: u8,
    pub custom_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<ModalInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSubmitData {
    pub custom_id: String,
    pub components: Vec<ModalRow>,
}

impl ModalSubmitData {
    /// `(custom_id, value)` of every text input, in row order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components
            .iter()
            .flat_map(|row| row.components.iter())
            .map(|input| (input.custom_id.as_str(), input.value.as_str()))
    }

    fn check(&self) -> Result<(), &'static str> {
        if self.components.is_empty() {
            return Err("modal has no rows");
        }
        if self.components.len() > MAX_MODAL_ROWS {
            return Err("modal has more than 5 rows");
        }
        for row in &self.components {
            if row.kind != 1 {
                return Err("modal row is not an action row");
            }
            match row.components.as_slice() {
                [input] if input.kind == 4 => {}
                [_] => return Err("modal row does not hold a text input"),
                _ => return Err("modal row must hold exactly one text input"),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSubmitInteraction {
    pub member: Member,
    pub guild_id: Snowflake,
    pub data: ModalSubmitData,
}

// ---------------------------------------------------------------------------
// The interaction union
// ---------------------------------------------------------------------------

/// One inbound interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Ping,
    ApplicationCommand(CommandInteraction),
    MessageComponent(ComponentInteraction),
    Autocomplete(AutocompleteInteraction),
    ModalSubmit(ModalSubmitInteraction),
}

impl Interaction {
    pub fn kind(&self) -> InteractionType {
        match self {
            Self::Ping => InteractionType::Ping,
            Self::ApplicationCommand(_) => InteractionType::ApplicationCommand,
            Self::MessageComponent(_) => InteractionType::MessageComponent,
            Self::Autocomplete(_) => InteractionType::ApplicationCommandAutocomplete,
            Self::ModalSubmit(_) => InteractionType::ModalSubmit,
        }
    }

    /// Parse a raw payload, dispatching on `type` alone.
    pub fn parse(raw: &Value) -> Result<Self, ParseError> {
        let tag = raw
            .get("type")
            .and_then(Value::as_u64)
            .ok_or(ParseError::MissingType)?;
        let kind = InteractionType::from_tag(tag).ok_or(ParseError::UnknownType(tag))?;

        Ok(match kind {
            InteractionType::Ping => Self::Ping,
            InteractionType::ApplicationCommand => Self::ApplicationCommand(shape(raw, kind)?),
            InteractionType::MessageComponent => Self::MessageComponent(shape(raw, kind)?),
            InteractionType::ApplicationCommandAutocomplete => {
                Self::Autocomplete(shape(raw, kind)?)
            }
            InteractionType::ModalSubmit => {
                let modal: ModalSubmitInteraction = shape(raw, kind)?;
                modal
                    .data
                    .check()
                    .map_err(|reason| ParseError::Constraint { kind, reason })?;
                Self::ModalSubmit(modal)
            }
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        let raw: Value = serde_json::from_str(text).map_err(ParseError::Json)?;
        Self::parse(&raw)
    }

    /// Guild the interaction came from. `None` only for pings.
    pub fn guild_id(&self) -> Option<&str> {
        match self {
            Self::Ping => None,
            Self::ApplicationCommand(i) => Some(&i.guild_id),
            Self::MessageComponent(i) => Some(&i.guild_id),
            Self::Autocomplete(i) => Some(&i.guild_id),
            Self::ModalSubmit(i) => Some(&i.guild_id),
        }
    }

    pub fn member(&self) -> Option<&Member> {
        match self {
            Self::Ping => None,
            Self::ApplicationCommand(i) => Some(&i.member),
            Self::MessageComponent(i) => Some(&i.member),
            Self::Autocomplete(i) => i.member.as_ref(),
            Self::ModalSubmit(i) => Some(&i.member),
        }
    }
}

fn shape<T: DeserializeOwned>(raw: &Value, kind: InteractionType) -> Result<T, ParseError> {
    T::deserialize(raw).map_err(|source| ParseError::Shape { kind, source })
}

impl<'de> Deserialize<'de> for Interaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
