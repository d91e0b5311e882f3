//! Error types for parsing, validation, route construction, and dispatch.
//!
//! Every failure the router can produce ends up as a [`RouteError`] returned
//! from the dispatch entry point. The narrower enums exist so that the option
//! validator, the interaction parser, and the context carrier can be used (and
//! tested) on their own.

use thiserror::Error;

use crate::types::{InteractionType, OptionKind};

/// Boxed error used for handler and collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Inbound payload
// ---------------------------------------------------------------------------

/// A malformed or unrecognised inbound interaction payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid interaction JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("interaction payload is missing a numeric `type` field")]
    MissingType,

    #[error("unknown interaction type: {0}")]
    UnknownType(u64),

    /// The `type` tag was recognised but the variant's fields don't match.
    #[error("malformed {kind:?} interaction: {source}")]
    Shape {
        kind: InteractionType,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {kind:?} interaction: {reason}")]
    Constraint {
        kind: InteractionType,
        reason: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Option validation
// ---------------------------------------------------------------------------

/// An option list that doesn't match its declared shape.
///
/// Structural errors carry the dotted path of the offending option, e.g.
/// `assign.character.user`, with `<root>` for the top of a list. Schema
/// errors carry the route path instead, e.g. `gm assign character`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{path}`: option is not a JSON object")]
    NotAnObject { path: String },

    #[error("`{path}`: missing field `{field}`")]
    MissingField { path: String, field: &'static str },

    #[error("`{path}`: unknown option type {tag}")]
    UnknownKind { path: String, tag: String },

    #[error("`{path}`: expected {expected} value, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{path}`: integer {value} is outside the signed 64-bit range")]
    IntegerOutOfRange { path: String, value: String },

    #[error("`{path}`: subcommand group has no subcommands")]
    EmptyGroup { path: String },

    #[error("`{path}`: {child:?} option is not allowed inside a {parent:?}")]
    UnexpectedChild {
        path: String,
        parent: OptionKind,
        child: OptionKind,
    },

    #[error("`{path}`: container nested deeper than {max} levels")]
    TooDeep { path: String, max: usize },

    #[error("`{path}`: expected a single subcommand, found {found} option(s)")]
    ExpectedContainer { path: String, found: usize },

    #[error("`{path}`: unexpected subcommand `{name}`")]
    UnexpectedContainer { path: String, name: String },

    #[error("`{path}`: unknown argument `{name}`")]
    UnknownArgument { path: String, name: String },

    #[error("`{path}`: argument `{name}` given more than once")]
    DuplicateArgument { path: String, name: String },

    #[error("`{path}`: missing required argument `{name}`")]
    MissingArgument { path: String, name: String },

    #[error("`{path}`: argument `{name}` should be {expected:?}, found {found:?}")]
    WrongArgumentKind {
        path: String,
        name: String,
        expected: OptionKind,
        found: OptionKind,
    },

    #[error("`{path}`: command takes no arguments, found {found}")]
    UnexpectedArguments { path: String, found: usize },
}

// ---------------------------------------------------------------------------
// Route construction
// ---------------------------------------------------------------------------

/// A route tree that can't be built. Raised at startup, never at dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("duplicate route `{name}` in the same table")]
    DuplicateRoute { name: String },
}

// ---------------------------------------------------------------------------
// Ambient context
// ---------------------------------------------------------------------------

/// Misuse of the ambient request context. These are programming errors in a
/// handler, not data errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no request context is active (called outside `context::run`)")]
    Missing,

    #[error("request context extra is not a `{expected}`")]
    ExtraType { expected: &'static str },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Terminal failure of one request's dispatch.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route not found: `{path}`")]
    NotFound { path: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid arguments for `{path}`: {source}")]
    Validation {
        path: String,
        #[source]
        source: ValidationError,
    },

    /// The caller's context builder failed before dispatch started.
    #[error("failed to build request context: {0}")]
    Context(#[source] BoxError),

    #[error(transparent)]
    ContextMisuse(#[from] ContextError),

    #[error("`{path}` returned a {found} response, expected {expected}")]
    UnexpectedResponse {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("handler for `{path}` failed: {source}")]
    Handler {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl RouteError {
    /// The option-level validation failure, if that's what this is.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            RouteError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_mentions_path() {
        let err = ValidationError::MissingArgument {
            path: "gm assign character".to_string(),
            name: "user".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("gm assign character"));
        assert!(text.contains("user"));
    }

    #[test]
    fn route_error_exposes_validation() {
        let err = RouteError::Validation {
            path: "tokens".to_string(),
            source: ValidationError::UnexpectedArguments {
                path: "tokens".to_string(),
                found: 2,
            },
        };
        assert!(err.validation().is_some());
        assert!(RouteError::NotFound {
            path: "nope".to_string()
        }
        .validation()
        .is_none());
    }

    #[test]
    fn context_error_converts_into_route_error() {
        let err: RouteError = ContextError::Missing.into();
        assert!(matches!(err, RouteError::ContextMisuse(ContextError::Missing)));
    }
}
