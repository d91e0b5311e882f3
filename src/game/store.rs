//! In-memory game store.
//!
//! One [`Game`] per guild, each owning its characters. The store can be seeded
//! from a JSON array of games so the demo binary has something to show.

use std::collections::HashMap;
use std::path::Path;

use async_lock::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::game::GameError;
use crate::types::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    /// Stored lowercase.
    pub name: String,
    #[serde(default)]
    pub tokens: i64,
    /// Discord id of the player controlling this character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Snowflake>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub guild_id: Snowflake,
    pub gm_id: Snowflake,
    #[serde(default)]
    pub characters: Vec<Character>,
}

impl Game {
    pub fn new(guild_id: impl Into<Snowflake>, gm_id: impl Into<Snowflake>) -> Self {
        Self {
            guild_id: guild_id.into(),
            gm_id: gm_id.into(),
            characters: Vec::new(),
        }
    }

    pub fn is_gm(&self, user_id: &str) -> bool {
        self.gm_id == user_id
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// The character controlled by `user_id`.
    pub fn character_of(&self, user_id: &str) -> Option<&Character> {
        self.characters
            .iter()
            .find(|c| c.player.as_deref() == Some(user_id))
    }

    /// Distinct players, in character order.
    pub fn players(&self) -> Vec<&str> {
        let mut players: Vec<&str> = Vec::new();
        for player in self.characters.iter().filter_map(|c| c.player.as_deref()) {
            if !players.contains(&player) {
                players.push(player);
            }
        }
        players
    }

    /// Characters whose name contains `fragment`, case-insensitively.
    pub fn search(&self, fragment: &str) -> Vec<&Character> {
        let fragment = fragment.to_lowercase();
        self.characters
            .iter()
            .filter(|c| c.name.contains(&fragment))
            .collect()
    }

    fn character_mut(&mut self, id: &str) -> Result<&mut Character, GameError> {
        self.characters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| GameError::CharacterNotFound(id.to_string()))
    }
}

/// Games keyed by guild id.
#[derive(Debug, Default)]
pub struct GameStore {
    games: RwLock<HashMap<Snowflake, Game>>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON array of games.
    pub fn from_seed(json: &str) -> Result<Self, GameError> {
        let games: Vec<Game> = serde_json::from_str(json).map_err(GameError::Seed)?;
        info!(games = games.len(), "seeded game store");
        Ok(Self {
            games: RwLock::new(
                games
                    .into_iter()
                    .map(|game| (game.guild_id.clone(), game))
                    .collect(),
            ),
        })
    }

    /// Read a seed file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let text = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(GameError::Io)?;
        Self::from_seed(&text)
    }

    /// Snapshot of the game running in `guild_id`.
    pub async fn game(&self, guild_id: &str) -> Option<Game> {
        self.games.read().await.get(guild_id).cloned()
    }

    pub async fn init(&self, guild_id: &str, gm_id: &str) -> Result<Game, GameError> {
        let mut games = self.games.write().await;
        if games.contains_key(guild_id) {
            return Err(GameError::AlreadyRunning);
        }
        let game = Game::new(guild_id, gm_id);
        games.insert(guild_id.to_string(), game.clone());
        info!(guild = guild_id, gm = gm_id, "started game");
        Ok(game)
    }

    pub async fn create_character(&self, guild_id: &str, name: &str) -> Result<Character, GameError> {
        self.update(guild_id, |game| {
            let character = Character {
                id: format!("{}-{}", game.guild_id, game.characters.len() + 1),
                name: name.to_lowercase(),
                tokens: 0,
                player: None,
            };
            game.characters.push(character.clone());
            Ok(character)
        })
        .await
    }

    /// Give `character_id` to `user_id`, releasing any character they held.
    pub async fn assign_character(
        &self,
        guild_id: &str,
        user_id: &str,
        character_id: &str,
    ) -> Result<Character, GameError> {
        self.update(guild_id, |game| {
            game.character_mut(character_id)?;
            for character in &mut game.characters {
                if character.player.as_deref() == Some(user_id) {
                    character.player = None;
                }
            }
            let character = game.character_mut(character_id)?;
            character.player = Some(user_id.to_string());
            Ok(character.clone())
        })
        .await
    }

    pub async fn set_tokens(
        &self,
        guild_id: &str,
        character_id: &str,
        tokens: i64,
    ) -> Result<Character, GameError> {
        self.update(guild_id, |game| {
            let character = game.character_mut(character_id)?;
            character.tokens = tokens;
            Ok(character.clone())
        })
        .await
    }

    /// Add `delta` to a character's tokens. Fails rather than going negative.
    pub async fn adjust_tokens(
        &self,
        guild_id: &str,
        character_id: &str,
        delta: i64,
    ) -> Result<Character, GameError> {
        self.update(guild_id, |game| {
            let character = game.character_mut(character_id)?;
            let tokens = character.tokens + delta;
            if tokens < 0 {
                return Err(GameError::NotEnoughTokens(character.name.clone()));
            }
            character.tokens = tokens;
            Ok(character.clone())
        })
        .await
    }

    async fn update<T>(
        &self,
        guild_id: &str,
        f: impl FnOnce(&mut Game) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut games = self.games.write().await;
        let game = games.get_mut(guild_id).ok_or(GameError::NoGame)?;
        let result = f(game);
        debug!(guild = guild_id, ok = result.is_ok(), "updated game");
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_game() -> GameStore {
        let store = GameStore::new();
        store.init("g1", "gm").await.unwrap();
        store
    }

    #[tokio::test]
    async fn init_twice_fails() {
        let store = store_with_game().await;
        assert!(matches!(
            store.init("g1", "other").await,
            Err(GameError::AlreadyRunning)
        ));
        assert!(store.game("g1").await.unwrap().is_gm("gm"));
    }

    #[tokio::test]
    async fn characters_are_lowercased_and_numbered() {
        let store = store_with_game().await;
        let ash = store.create_character("g1", "Ash").await.unwrap();
        let brin = store.create_character("g1", "Brin").await.unwrap();
        assert_eq!(ash.name, "ash");
        assert_eq!(ash.id, "g1-1");
        assert_eq!(brin.id, "g1-2");
    }

    #[tokio::test]
    async fn no_game_is_reported() {
        let store = GameStore::new();
        assert!(matches!(
            store.create_character("nope", "Ash").await,
            Err(GameError::NoGame)
        ));
    }

    #[tokio::test]
    async fn assigning_moves_player_between_characters() {
        let store = store_with_game().await;
        let ash = store.create_character("g1", "ash").await.unwrap();
        let brin = store.create_character("g1", "brin").await.unwrap();
        store.assign_character("g1", "p1", &ash.id).await.unwrap();
        store.assign_character("g1", "p1", &brin.id).await.unwrap();

        let game = store.game("g1").await.unwrap();
        assert_eq!(game.character_of("p1").map(|c| c.name.as_str()), Some("brin"));
        assert_eq!(game.character(&ash.id).unwrap().player, None);
        assert_eq!(game.players(), ["p1"]);
    }

    #[tokio::test]
    async fn tokens_never_go_negative() {
        let store = store_with_game().await;
        let ash = store.create_character("g1", "ash").await.unwrap();
        assert!(matches!(
            store.adjust_tokens("g1", &ash.id, -1).await,
            Err(GameError::NotEnoughTokens(_))
        ));
        store.set_tokens("g1", &ash.id, 2).await.unwrap();
        let ash = store.adjust_tokens("g1", &ash.id, -1).await.unwrap();
        assert_eq!(ash.tokens, 1);
    }

    #[test]
    fn seed_and_search() {
        let store = GameStore::from_seed(
            r#"[{ "guild_id": "g1", "gm_id": "gm", "characters": [
                { "id": "c1", "name": "ash", "tokens": 1, "player": "p1" },
                { "id": "c2", "name": "brin" }
            ]}]"#,
        )
        .unwrap();
        let game = store.games.try_read().unwrap().get("g1").cloned().unwrap();
        let found: Vec<_> = game.search("AS").into_iter().map(|c| c.id.as_str()).collect();
        assert_eq!(found, ["c1"]);
        assert_eq!(game.character("c2").unwrap().tokens, 0);
    }

    #[test]
    fn bad_seed_is_an_error() {
        assert!(matches!(GameStore::from_seed("{"), Err(GameError::Seed(_))));
    }
}
