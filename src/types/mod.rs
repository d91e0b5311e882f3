//! Typed representations of the interaction protocol.
//!
//! Inbound: [`Interaction`] and the [`CommandOption`] tree its commands carry.
//! Outbound: [`InteractionResponse`] and the message [`component`]s it can
//! hold. The rest of the crate does `use crate::types::*`, so the commonly
//! used items are re-exported here.

/// Option trees and their structural validation.
pub mod option;

/// Inbound interaction payloads.
pub mod interaction;

/// Outbound interaction responses.
pub mod response;

/// Buttons, selects, text inputs, and action rows.
pub mod component;

/// Component helper functions.
pub mod builders;

/// Extension traits.
pub mod ext;

/// Discord IDs are snowflakes transmitted as strings in JSON.
pub type Snowflake = String;

// ---- Options --------------------------------------------------------------
pub use self::option::{validate_options, CommandOption, OptionKind, MAX_CONTAINER_DEPTH};

// ---- Interactions ---------------------------------------------------------
pub use self::interaction::{
    AutocompleteInteraction, CommandData, CommandInteraction, ComponentData,
    ComponentInteraction, ComponentMessage, Interaction, InteractionType, Member, MemberUser,
    MessageInteraction, ModalInput, ModalRow, ModalSubmitData, ModalSubmitInteraction, UserRef,
};

// ---- Responses ------------------------------------------------------------
pub use self::response::{
    AutocompleteChoice, AutocompleteData, ChoiceValue, InteractionCallbackType,
    InteractionResponse, MessageData, MessageFlags, ModalData,
};

// ---- Components -----------------------------------------------------------
pub use self::component::{
    ActionRow, Button, ButtonStyle, Component, ComponentType, Emoji, SelectOption, StringSelect,
    TextInput, TextInputStyle,
};
pub use self::builders::{
    action_row, button, emoji_button, select_option, string_select, text_input,
    text_input_row,
};

// ---- Extension traits -----------------------------------------------------
pub use self::ext::{mention, InteractionExt, OptionsExt};
