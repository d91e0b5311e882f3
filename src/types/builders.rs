//! Helper functions for building message components.
//!
//! The component structs have enough optional fields that filling them in by
//! hand gets noisy; these helpers cover the common shapes and leave the rest
//! at their defaults.

use crate::types::component::{
    ActionRow, Button, ButtonStyle, Component, Emoji, SelectOption, StringSelect, TextInput,
    TextInputStyle,
};

/// Wrap components into an action row.
pub fn action_row(components: Vec<Component>) -> ActionRow {
    ActionRow { components }
}

/// A clickable button that sends `custom_id` back as a component interaction.
pub fn button(style: ButtonStyle, label: impl Into<String>, custom_id: impl Into<String>) -> Component {
    Component::Button(Button {
        style,
        label: label.into(),
        emoji: None,
        custom_id: Some(custom_id.into()),
        url: None,
        disabled: false,
    })
}

/// Same as [`button`], with a leading unicode emoji.
pub fn emoji_button(
    style: ButtonStyle,
    emoji: &str,
    label: impl Into<String>,
    custom_id: impl Into<String>,
) -> Component {
    let mut component = button(style, label, custom_id);
    if let Component::Button(b) = &mut component {
        b.emoji = Some(Emoji::unicode(emoji));
    }
    component
}

pub fn select_option(label: impl Into<String>, value: impl Into<String>) -> SelectOption {
    SelectOption {
        label: label.into(),
        value: value.into(),
        description: None,
        emoji: None,
        default: false,
    }
}

/// A single-choice string select menu.
pub fn string_select(
    custom_id: impl Into<String>,
    placeholder: impl Into<String>,
    options: Vec<SelectOption>,
) -> Component {
    Component::StringSelect(StringSelect {
        custom_id: custom_id.into(),
        placeholder: Some(placeholder.into()),
        min_values: None,
        max_values: None,
        disabled: false,
        options,
    })
}

/// A text input for a modal.
pub fn text_input(
    custom_id: impl Into<String>,
    label: impl Into<String>,
    style: TextInputStyle,
    required: bool,
) -> Component {
    Component::TextInput(TextInput {
        custom_id: custom_id.into(),
        style,
        label: label.into(),
        min_length: None,
        max_length: None,
        required: Some(required),
        value: None,
        placeholder: None,
    })
}

/// One modal row holding a single text input, as modals require.
pub fn text_input_row(
    custom_id: impl Into<String>,
    label: impl Into<String>,
    style: TextInputStyle,
    required: bool,
) -> ActionRow {
    action_row(vec![text_input(custom_id, label, style, required)])
}
