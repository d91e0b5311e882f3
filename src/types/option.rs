//! Command option trees.
//!
//! A slash command's arguments arrive as a tree of options: at most two
//! levels of containers (subcommand group, subcommand) above a flat list of
//! typed leaf values. [`CommandOption`] is the one canonical representation
//! of that tree; everything downstream matches on it exhaustively.
//!
//! Validation is a structural recursive descent over the raw JSON. It is
//! total: either every node in a list validates, or the whole list is
//! rejected with the first failure.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::ValidationError;
use crate::types::Snowflake;

/// Containers may only appear at depth 1 (directly in the command's option
/// list) and depth 2 (inside a subcommand group).
pub const MAX_CONTAINER_DEPTH: usize = 2;

/// Path reported for the command's own option list.
pub(crate) const ROOT_PATH: &str = "<root>";

// ---------------------------------------------------------------------------
// Option kind
// ---------------------------------------------------------------------------

/// Wire tag of an option node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OptionKind {
    Subcommand = 1,
    SubcommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
}

impl OptionKind {
    pub fn from_tag(tag: u64) -> Option<Self> {
        Some(match tag {
            1 => Self::Subcommand,
            2 => Self::SubcommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            _ => return None,
        })
    }

    /// Subcommands and subcommand groups.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Subcommand | Self::SubcommandGroup)
    }
}

// ---------------------------------------------------------------------------
// Option tree
// ---------------------------------------------------------------------------

/// One validated node of a command's argument tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum CommandOption {
    SubcommandGroup {
        name: String,
        options: Vec<CommandOption>,
    },
    Subcommand {
        name: String,
        options: Vec<CommandOption>,
    },
    String {
        name: String,
        value: String,
        focused: bool,
    },
    Integer {
        name: String,
        value: i64,
        focused: bool,
    },
    Boolean {
        name: String,
        value: bool,
    },
    User {
        name: String,
        value: Snowflake,
    },
}

impl CommandOption {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::String {
            name: name.into(),
            value: value.into(),
            focused: false,
        }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::Integer {
            name: name.into(),
            value,
            focused: false,
        }
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::Boolean {
            name: name.into(),
            value,
        }
    }

    pub fn user(name: impl Into<String>, id: impl Into<Snowflake>) -> Self {
        Self::User {
            name: name.into(),
            value: id.into(),
        }
    }

    pub fn subcommand(name: impl Into<String>, options: Vec<CommandOption>) -> Self {
        Self::Subcommand {
            name: name.into(),
            options,
        }
    }

    pub fn group(name: impl Into<String>, options: Vec<CommandOption>) -> Self {
        Self::SubcommandGroup {
            name: name.into(),
            options,
        }
    }

    /// Mark a string or integer option as the autocomplete target. No-op for
    /// other kinds.
    pub fn with_focus(mut self) -> Self {
        match &mut self {
            Self::String { focused, .. } | Self::Integer { focused, .. } => *focused = true,
            _ => {}
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Self::SubcommandGroup { name, .. }
            | Self::Subcommand { name, .. }
            | Self::String { name, .. }
            | Self::Integer { name, .. }
            | Self::Boolean { name, .. }
            | Self::User { name, .. } => name,
        }
    }

    pub fn kind(&self) -> OptionKind {
        match self {
            Self::SubcommandGroup { .. } => OptionKind::SubcommandGroup,
            Self::Subcommand { .. } => OptionKind::Subcommand,
            Self::String { .. } => OptionKind::String,
            Self::Integer { .. } => OptionKind::Integer,
            Self::Boolean { .. } => OptionKind::Boolean,
            Self::User { .. } => OptionKind::User,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    /// Nested options of a container; empty for leaf values.
    pub fn children(&self) -> &[CommandOption] {
        match self {
            Self::SubcommandGroup { options, .. } | Self::Subcommand { options, .. } => options,
            _ => &[],
        }
    }

    pub fn is_focused(&self) -> bool {
        match self {
            Self::String { focused, .. } | Self::Integer { focused, .. } => *focused,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&str> {
        match self {
            Self::User { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Validate a single raw option node (and everything below it).
    pub fn validate(raw: &Value) -> Result<Self, ValidationError> {
        validate_node(raw, "", 1)
    }
}

impl TryFrom<Value> for CommandOption {
    type Error = ValidationError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        Self::validate(&raw)
    }
}

/// Validate a command's top-level option list.
pub fn validate_options(raw: &[Value]) -> Result<Vec<CommandOption>, ValidationError> {
    validate_list(raw, "", 1)
}

// ---------------------------------------------------------------------------
// Recursive descent
// ---------------------------------------------------------------------------

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.to_string()
    }
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == ROOT_PATH {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Best-effort look at a node's tag, used to reject misplaced children before
/// descending into them.
fn peek_kind(raw: &Value) -> Option<OptionKind> {
    raw.get("type")?.as_u64().and_then(OptionKind::from_tag)
}

fn validate_list(
    raw: &[Value],
    path: &str,
    depth: usize,
) -> Result<Vec<CommandOption>, ValidationError> {
    let options = raw
        .iter()
        .map(|node| validate_node(node, path, depth))
        .collect::<Result<Vec<_>, _>>()?;

    // A container is always the only entry of its list.
    if options.len() > 1 && options.iter().any(CommandOption::is_container) {
        return Err(ValidationError::ExpectedContainer {
            path: display_path(path),
            found: options.len(),
        });
    }

    Ok(options)
}

fn validate_children(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    parent: OptionKind,
    depth: usize,
) -> Result<Vec<CommandOption>, ValidationError> {
    let raw = match obj.get("options") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            return Err(ValidationError::TypeMismatch {
                path: path.to_string(),
                expected: "array",
                found: json_kind(other),
            })
        }
    };

    for node in raw {
        if let Some(child) = peek_kind(node) {
            let allowed = match parent {
                OptionKind::SubcommandGroup => child.is_container(),
                _ => !child.is_container(),
            };
            if !allowed {
                return Err(ValidationError::UnexpectedChild {
                    path: path.to_string(),
                    parent,
                    child,
                });
            }
        }
    }

    validate_list(raw, path, depth + 1)
}

fn validate_node(raw: &Value, parent: &str, depth: usize) -> Result<CommandOption, ValidationError> {
    let obj = raw.as_object().ok_or_else(|| ValidationError::NotAnObject {
        path: display_path(parent),
    })?;

    let name = match obj.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(ValidationError::TypeMismatch {
                path: display_path(parent),
                expected: "string",
                found: json_kind(other),
            })
        }
        None => {
            return Err(ValidationError::MissingField {
                path: display_path(parent),
                field: "name",
            })
        }
    };
    let path = child_path(parent, &name);

    let tag = obj.get("type").ok_or_else(|| ValidationError::MissingField {
        path: path.clone(),
        field: "type",
    })?;
    let kind = tag
        .as_u64()
        .and_then(OptionKind::from_tag)
        .ok_or_else(|| ValidationError::UnknownKind {
            path: path.clone(),
            tag: tag.to_string(),
        })?;

    if kind.is_container() && depth > MAX_CONTAINER_DEPTH {
        return Err(ValidationError::TooDeep {
            path,
            max: MAX_CONTAINER_DEPTH,
        });
    }

    Ok(match kind {
        OptionKind::SubcommandGroup => {
            let options = validate_children(obj, &path, kind, depth)?;
            if options.is_empty() {
                return Err(ValidationError::EmptyGroup { path });
            }
            CommandOption::SubcommandGroup { name, options }
        }
        OptionKind::Subcommand => CommandOption::Subcommand {
            options: validate_children(obj, &path, kind, depth)?,
            name,
        },
        OptionKind::String => CommandOption::String {
            value: leaf_value(obj, &path, "string", Value::as_str)?.to_string(),
            focused: focused(obj, &path)?,
            name,
        },
        OptionKind::Integer => CommandOption::Integer {
            value: integer_value(obj, &path)?,
            focused: focused(obj, &path)?,
            name,
        },
        OptionKind::Boolean => CommandOption::Boolean {
            value: leaf_value(obj, &path, "boolean", Value::as_bool)?,
            name,
        },
        OptionKind::User => CommandOption::User {
            value: leaf_value(obj, &path, "user id", Value::as_str)?.to_string(),
            name,
        },
    })
}

fn leaf_value<'a, T>(
    obj: &'a serde_json::Map<String, Value>,
    path: &str,
    expected: &'static str,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T, ValidationError> {
    let value = obj.get("value").ok_or_else(|| ValidationError::MissingField {
        path: path.to_string(),
        field: "value",
    })?;
    extract(value).ok_or_else(|| ValidationError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: json_kind(value),
    })
}

/// Whole numbers past `i64` parse as `u64`; those get their own error.
fn integer_value(obj: &serde_json::Map<String, Value>, path: &str) -> Result<i64, ValidationError> {
    match obj.get("value") {
        Some(Value::Number(n)) if n.is_u64() && !n.is_i64() => {
            Err(ValidationError::IntegerOutOfRange {
                path: path.to_string(),
                value: n.to_string(),
            })
        }
        _ => leaf_value(obj, path, "integer", Value::as_i64),
    }
}

/// Absent or null means unfocused.
fn focused(obj: &serde_json::Map<String, Value>, path: &str) -> Result<bool, ValidationError> {
    match obj.get("focused") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ValidationError::TypeMismatch {
            path: path.to_string(),
            expected: "boolean",
            found: json_kind(other),
        }),
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

impl CommandOption {
    /// The option as a wire node.
    pub fn to_json(&self) -> Value {
        let mut node = serde_json::Map::new();
        node.insert("type".to_string(), Value::from(self.kind() as u8));
        node.insert("name".to_string(), Value::from(self.name()));
        match self {
            Self::SubcommandGroup { options, .. } | Self::Subcommand { options, .. } => {
                if !options.is_empty() {
                    let children = options.iter().map(CommandOption::to_json).collect();
                    node.insert("options".to_string(), Value::Array(children));
                }
            }
            Self::String { value, .. } => {
                node.insert("value".to_string(), Value::from(value.as_str()));
            }
            Self::Integer { value, .. } => {
                node.insert("value".to_string(), Value::from(*value));
            }
            Self::Boolean { value, .. } => {
                node.insert("value".to_string(), Value::from(*value));
            }
            Self::User { value, .. } => {
                node.insert("value".to_string(), Value::from(value.as_str()));
            }
        }
        if self.is_focused() {
            node.insert("focused".to_string(), Value::Bool(true));
        }
        Value::Object(node)
    }
}

impl Serialize for CommandOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assign_character() -> Value {
        json!({
            "type": 2,
            "name": "assign",
            "options": [{
                "type": 1,
                "name": "character",
                "options": [
                    { "type": 6, "name": "user", "value": "123" },
                    { "type": 3, "name": "character", "value": "abc" }
                ]
            }]
        })
    }

    #[test]
    fn validates_nested_group() {
        let opt = CommandOption::validate(&assign_character()).unwrap();
        assert_eq!(
            opt,
            CommandOption::group(
                "assign",
                vec![CommandOption::subcommand(
                    "character",
                    vec![
                        CommandOption::user("user", "123"),
                        CommandOption::string("character", "abc"),
                    ]
                )]
            )
        );
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(validate_options(&[]).unwrap().is_empty());
    }

    #[test]
    fn subcommand_without_options_is_valid() {
        let opt = CommandOption::validate(&json!({ "type": 1, "name": "init" })).unwrap();
        assert!(opt.children().is_empty());
    }

    #[test]
    fn integer_with_string_value_is_rejected() {
        let err = validate_options(&[json!({ "type": 4, "name": "tokens", "value": "3" })])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                path: "tokens".to_string(),
                expected: "integer",
                found: "string",
            }
        );
    }

    #[test]
    fn integer_with_fractional_value_is_rejected() {
        let err = validate_options(&[json!({ "type": 4, "name": "n", "value": 1.5 })]).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { found: "float", .. }));
    }

    #[test]
    fn integer_past_i64_is_out_of_range() {
        let err = validate_options(&[json!({ "type": 4, "name": "tokens", "value": 9223372036854775808u64 })])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::IntegerOutOfRange {
                path: "tokens".to_string(),
                value: "9223372036854775808".to_string(),
            }
        );

        let max = validate_options(&[json!({ "type": 4, "name": "tokens", "value": i64::MAX })]).unwrap();
        assert_eq!(max[0].as_i64(), Some(i64::MAX));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = validate_options(&[json!({ "type": 11, "name": "file", "value": "x" })])
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownKind { .. }));
    }

    #[test]
    fn missing_value_is_rejected() {
        let err = validate_options(&[json!({ "type": 3, "name": "character" })]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                path: "character".to_string(),
                field: "value",
            }
        );
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = CommandOption::validate(&json!({ "type": 2, "name": "gm", "options": [] }))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyGroup { path: "gm".to_string() });
    }

    #[test]
    fn leaf_inside_group_is_rejected() {
        let err = CommandOption::validate(&json!({
            "type": 2,
            "name": "gm",
            "options": [{ "type": 3, "name": "x", "value": "y" }]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnexpectedChild {
                parent: OptionKind::SubcommandGroup,
                child: OptionKind::String,
                ..
            }
        ));
    }

    #[test]
    fn container_inside_subcommand_is_rejected() {
        let err = CommandOption::validate(&json!({
            "type": 1,
            "name": "list",
            "options": [{ "type": 1, "name": "inner" }]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnexpectedChild {
                parent: OptionKind::Subcommand,
                child: OptionKind::Subcommand,
                ..
            }
        ));
    }

    #[test]
    fn third_level_container_is_too_deep() {
        let err = CommandOption::validate(&json!({
            "type": 2,
            "name": "a",
            "options": [{
                "type": 2,
                "name": "b",
                "options": [{ "type": 1, "name": "c" }]
            }]
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooDeep {
                path: "a.b.c".to_string(),
                max: MAX_CONTAINER_DEPTH,
            }
        );
    }

    #[test]
    fn container_must_be_alone_in_its_list() {
        let err = validate_options(&[
            json!({ "type": 1, "name": "characters" }),
            json!({ "type": 1, "name": "players" }),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ExpectedContainer {
                path: ROOT_PATH.to_string(),
                found: 2,
            }
        );
    }

    #[test]
    fn one_bad_leaf_fails_the_whole_list() {
        let result = validate_options(&[
            json!({ "type": 3, "name": "a", "value": "ok" }),
            json!({ "type": 5, "name": "b", "value": true }),
            json!({ "type": 6, "name": "c", "value": 42 }),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn focused_is_read_on_strings_and_ignored_on_booleans() {
        let opts = validate_options(&[
            json!({ "type": 3, "name": "character", "value": "ab", "focused": true }),
            json!({ "type": 5, "name": "flag", "value": false, "focused": true }),
        ])
        .unwrap();
        assert!(opts[0].is_focused());
        assert!(!opts[1].is_focused());
    }

    #[test]
    fn non_boolean_focused_is_rejected() {
        let err = validate_options(&[json!({ "type": 3, "name": "c", "value": "", "focused": 1 })])
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { expected: "boolean", .. }));
    }

    #[test]
    fn serializes_to_wire_form() {
        let opt = CommandOption::validate(&assign_character()).unwrap();
        assert_eq!(serde_json::to_value(&opt).unwrap(), assign_character());
    }

    #[test]
    fn deserializes_through_validation() {
        let bad: Result<CommandOption, _> =
            serde_json::from_value(json!({ "type": 5, "name": "b", "value": "yes" }));
        assert!(bad.is_err());

        let good: CommandOption =
            serde_json::from_value(json!({ "type": 4, "name": "n", "value": 3, "focused": true }))
                .unwrap();
        assert_eq!(good, CommandOption::integer("n", 3).with_focus());
    }
}
