//! Outbound interaction responses.
//!
//! Handlers build one [`InteractionResponse`] value and return it; the
//! transport serializes it as `{ "type": <callback type>, "data": { … } }`.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::types::component::ActionRow;

/// The type of callback for an interaction response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum InteractionCallbackType {
    Pong = 1,
    ChannelMessageWithSource = 4,
    ApplicationCommandAutocompleteResult = 8,
    Modal = 9,
}

bitflags! {
    /// Message flags settable on an interaction reply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u64 {
        const SUPPRESS_EMBEDS = 1 << 2;
        /// Only the invoking user can see the reply.
        const EPHEMERAL = 1 << 6;
        const SUPPRESS_NOTIFICATIONS = 1 << 12;
    }
}

impl Serialize for MessageFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessageFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Body of a channel message reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<MessageFlags>,
}

impl MessageData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }

    pub fn component_row(mut self, row: ActionRow) -> Self {
        self.components.get_or_insert_with(Vec::new).push(row);
        self
    }

    pub fn flags(mut self, flags: MessageFlags) -> Self {
        *self.flags.get_or_insert_with(MessageFlags::empty) |= flags;
        self
    }

    pub fn ephemeral(self) -> Self {
        self.flags(MessageFlags::EPHEMERAL)
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags.is_some_and(|f| f.contains(MessageFlags::EPHEMERAL))
    }
}

impl From<MessageData> for InteractionResponse {
    fn from(data: MessageData) -> Self {
        Self::ChannelMessage(data)
    }
}

/// Autocomplete choice value; strings for string options, integers for
/// integer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
}

impl From<String> for ChoiceValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for ChoiceValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<i64> for ChoiceValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: ChoiceValue,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<ChoiceValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteData {
    pub choices: Vec<AutocompleteChoice>,
}

/// A pop-up form. Each row holds one text input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalData {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<ActionRow>,
}

// ---------------------------------------------------------------------------
// The response union
// ---------------------------------------------------------------------------

/// A response to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
    Pong,
    ChannelMessage(MessageData),
    AutocompleteResult(AutocompleteData),
    Modal(ModalData),
}

impl InteractionResponse {
    pub fn kind(&self) -> InteractionCallbackType {
        match self {
            Self::Pong => InteractionCallbackType::Pong,
            Self::ChannelMessage(_) => InteractionCallbackType::ChannelMessageWithSource,
            Self::AutocompleteResult(_) => {
                InteractionCallbackType::ApplicationCommandAutocompleteResult
            }
            Self::Modal(_) => InteractionCallbackType::Modal,
        }
    }

    /// Short human-readable name of the variant, for logs and errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Pong => "pong",
            Self::ChannelMessage(_) => "channel message",
            Self::AutocompleteResult(_) => "autocomplete result",
            Self::Modal(_) => "modal",
        }
    }

    /// A plain-text channel message.
    pub fn message(content: impl Into<String>) -> Self {
        MessageData::new().content(content).into()
    }

    /// A plain-text channel message only the invoking user can see.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        MessageData::new().content(content).ephemeral().into()
    }

    pub fn autocomplete(choices: impl IntoIterator<Item = AutocompleteChoice>) -> Self {
        Self::AutocompleteResult(AutocompleteData {
            choices: choices.into_iter().collect(),
        })
    }

    pub fn modal(
        custom_id: impl Into<String>,
        title: impl Into<String>,
        rows: Vec<ActionRow>,
    ) -> Self {
        Self::Modal(ModalData {
            custom_id: custom_id.into(),
            title: title.into(),
            components: rows,
        })
    }
}

#[derive(Serialize)]
struct ResponseWire<'a, T> {
    #[serde(rename = "type")]
    kind: InteractionCallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
}

impl Serialize for InteractionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.kind();
        match self {
            Self::Pong => ResponseWire::<()> { kind, data: None }.serialize(serializer),
            Self::ChannelMessage(data) => ResponseWire {
                kind,
                data: Some(data),
            }
            .serialize(serializer),
            Self::AutocompleteResult(data) => ResponseWire {
                kind,
                data: Some(data),
            }
            .serialize(serializer),
            Self::Modal(data) => ResponseWire {
                kind,
                data: Some(data),
            }
            .serialize(serializer),
        }
    }
}

// Allow deserializing as well (useful in tests and when replaying logs).
impl<'de> Deserialize<'de> for InteractionResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct Raw {
            #[serde(rename = "type")]
            kind: InteractionCallbackType,
            #[serde(default)]
            data: Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let response = match raw.kind {
            InteractionCallbackType::Pong => return Ok(Self::Pong),
            InteractionCallbackType::ChannelMessageWithSource => {
                MessageData::deserialize(raw.data).map(Self::ChannelMessage)
            }
            InteractionCallbackType::ApplicationCommandAutocompleteResult => {
                AutocompleteData::deserialize(raw.data).map(Self::AutocompleteResult)
            }
            InteractionCallbackType::Modal => ModalData::deserialize(raw.data).map(Self::Modal),
        };
        response.map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
