//! Demo game table.
//!
//! A small tabletop helper wired through the router: a GM starts a game in a
//! guild, creates characters, hands them to players, and tracks each
//! character's tokens; players list and make moves. Every routable
//! interaction kind is used somewhere in [`routes`].
//!
//! Handlers find the store and the guild's game through the request context
//! (see [`GameContext`]), which [`GameContext::resolve`] builds once per
//! request.

pub mod routes;
pub mod store;

use std::convert::Infallible;
use std::sync::Arc;

use thiserror::Error;

use crate::context;
use crate::error::ContextError;

pub use self::routes::router;
pub use self::store::{Character, Game, GameStore};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("No game in this server")]
    NoGame,

    #[error("A game is already running in this server")]
    AlreadyRunning,

    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    #[error("You don't have a character in this game")]
    NoCharacter,

    #[error("{0} doesn't have enough tokens")]
    NotEnoughTokens(String),

    #[error("No value selected")]
    NothingSelected,

    #[error("interaction has no member")]
    NoMember,

    #[error("unknown moveset `{0}`")]
    UnknownMoveset(String),

    #[error("invalid seed file: {0}")]
    Seed(#[source] serde_json::Error),

    #[error("failed to read seed file: {0}")]
    Io(#[source] std::io::Error),
}

/// Per-request state handed to the router's context builder.
#[derive(Debug, Clone)]
pub struct GameContext {
    pub store: Arc<GameStore>,
    /// Snapshot of the guild's game at the start of the request.
    pub game: Option<Game>,
}

impl GameContext {
    /// Look up the game for `guild_id`. Pings carry no guild and get no game.
    pub async fn resolve(store: Arc<GameStore>, guild_id: Option<&str>) -> Result<Self, Infallible> {
        let game = match guild_id {
            Some(guild_id) => store.game(guild_id).await,
            None => None,
        };
        Ok(Self { store, game })
    }

    /// The context of the request being handled.
    pub fn current() -> Result<Arc<Self>, ContextError> {
        context::extra::<Self>()
    }

    pub fn game(&self) -> Result<&Game, GameError> {
        self.game.as_ref().ok_or(GameError::NoGame)
    }
}

/// The four movesets a character can list or perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moveset {
    Strong,
    Normal,
    Weak,
    Social,
}

impl Moveset {
    /// Parse the wire value, e.g. `strongMoves`.
    pub fn parse(value: &str) -> Result<Self, GameError> {
        Ok(match value {
            "strongMoves" => Self::Strong,
            "normalMoves" => Self::Normal,
            "weakMoves" => Self::Weak,
            "socialMoves" => Self::Social,
            other => return Err(GameError::UnknownMoveset(other.to_string())),
        })
    }

    pub fn value(self) -> &'static str {
        match self {
            Self::Strong => "strongMoves",
            Self::Normal => "normalMoves",
            Self::Weak => "weakMoves",
            Self::Social => "socialMoves",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Normal => "normal",
            Self::Weak => "weak",
            Self::Social => "social",
        }
    }
}

/// `ash` → `Ash`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
