//! Outbound message components: action rows, buttons, string selects, and
//! text inputs.
//!
//! Components are tagged on the wire by a numeric `type` field next to the
//! component's own fields, which serde can't express with an integer tag, so
//! [`Component`] and [`ActionRow`] carry hand-written impls.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ComponentType {
    ActionRow = 1,
    Button = 2,
    StringSelect = 3,
    TextInput = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
    Link = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TextInputStyle {
    Short = 1,
    Paragraph = 2,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl Emoji {
    /// A unicode emoji.
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            animated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub style: ButtonStyle,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    /// Only for [`ButtonStyle::Link`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSelect {
    pub custom_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_values: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_values: Option<u8>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub custom_id: String,
    pub style: TextInputStyle,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// An interactive component inside an action row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Button(Button),
    StringSelect(StringSelect),
    TextInput(TextInput),
}

impl Component {
    pub fn kind(&self) -> ComponentType {
        match self {
            Self::Button(_) => ComponentType::Button,
            Self::StringSelect(_) => ComponentType::StringSelect,
            Self::TextInput(_) => ComponentType::TextInput,
        }
    }
}

/// A horizontal row of components. Messages and modals hold a list of these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRow {
    pub components: Vec<Component>,
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: ComponentType,
    #[serde(flatten)]
    inner: &'a T,
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.kind();
        match self {
            Self::Button(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::StringSelect(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::TextInput(inner) => Tagged { kind, inner }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Component {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let raw = Value::deserialize(deserializer)?;
        let kind = ComponentType::deserialize(raw.get("type").unwrap_or(&Value::Null))
            .map_err(D::Error::custom)?;
        let component = match kind {
            ComponentType::Button => Button::deserialize(raw).map(Self::Button),
            ComponentType::StringSelect => StringSelect::deserialize(raw).map(Self::StringSelect),
            ComponentType::TextInput => TextInput::deserialize(raw).map(Self::TextInput),
            ComponentType::ActionRow => {
                return Err(D::Error::custom("action rows cannot be nested"));
            }
        };
        component.map_err(D::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
struct RowWire<C> {
    #[serde(rename = "type")]
    kind: ComponentType,
    components: C,
}

impl Serialize for ActionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RowWire {
            kind: ComponentType::ActionRow,
            components: &self.components,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ActionRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let row = RowWire::<Vec<Component>>::deserialize(deserializer)?;
        if row.kind != ComponentType::ActionRow {
            return Err(serde::de::Error::custom("expected an action row"));
        }
        Ok(Self {
            components: row.components,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn button_serializes_with_type_tag() {
        let button = Component::Button(Button {
            style: ButtonStyle::Secondary,
            label: "Make a Strong Move".to_string(),
            emoji: Some(Emoji::unicode("💪")),
            custom_id: Some("move-strong".to_string()),
            url: None,
            disabled: false,
        });
        assert_eq!(
            serde_json::to_value(&button).unwrap(),
            json!({
                "type": 2,
                "style": 2,
                "label": "Make a Strong Move",
                "emoji": { "name": "💪" },
                "custom_id": "move-strong"
            })
        );
    }

    #[test]
    fn action_row_wraps_components() {
        let row = ActionRow {
            components: vec![Component::TextInput(TextInput {
                custom_id: "name".to_string(),
                style: TextInputStyle::Short,
                label: "Name".to_string(),
                min_length: None,
                max_length: Some(32),
                required: Some(true),
                value: None,
                placeholder: None,
            })],
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["components"][0]["type"], 4);
        assert_eq!(json["components"][0]["max_length"], 32);

        let back: ActionRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn nested_action_row_is_rejected() {
        let raw = json!({ "type": 1, "components": [{ "type": 1, "components": [] }] });
        assert!(serde_json::from_value::<ActionRow>(raw).is_err());
    }
}
