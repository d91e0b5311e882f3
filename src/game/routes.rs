//! The game's route tree.
//!
//! Commands:
//!
//! - `tokens`: the GM sees every character's tokens, a player sees their own
//! - `list characters` / `list players`
//! - `moves list <moveset>` / `moves do <moveset>`
//! - `gm game init|info`, `gm assign character|tokens`, `gm create character`
//!
//! Components are keyed by the command that produced their message (`moves
//! list`) or by their own custom id (`moves`, `move-*`). Autocomplete fills in
//! character names; the `moves` button opens a character search modal.

use tracing::info;

use crate::context;
use crate::error::{BoxError, BuildError, ValidationError};
use crate::game::{capitalize, Character, GameContext, GameError, Moveset};
use crate::route::{ArgSpec, Args, FromArgs, HandlerResult, Route, Schema};
use crate::router::Router;
use crate::types::{
    action_row, emoji_button, mention, select_option, string_select, text_input_row,
    ActionRow, AutocompleteChoice, ButtonStyle, CommandOption, InteractionExt,
    InteractionResponse, MessageData, TextInputStyle,
};

/// Custom id of the character search modal.
pub const CHARACTER_SEARCH_MODAL: &str = "gm-character-select-moves-list";

/// Discord shows at most this many autocomplete choices.
const MAX_CHOICES: usize = 25;

/// Build the game's router.
pub fn router() -> Result<Router, BuildError> {
    Router::builder()
        .command(Route::typed("tokens", tokens))
        .command(Route::branch(
            "list",
            vec![
                Route::typed("characters", list_characters),
                Route::typed("players", list_players),
            ],
        )?)
        .command(Route::branch(
            "moves",
            vec![Route::typed("list", moves_list), Route::typed("do", moves_do)],
        )?)
        .command(Route::branch(
            "gm",
            vec![
                Route::branch(
                    "game",
                    vec![Route::typed("init", game_init), Route::typed("info", game_info)],
                )?,
                Route::branch(
                    "assign",
                    vec![
                        Route::typed("character", assign_character),
                        Route::typed("tokens", assign_tokens),
                    ],
                )?,
                Route::branch("create", vec![Route::typed("character", create_character)])?,
            ],
        )?)
        .component(Route::leaf("moves", Schema::Any, search_modal))
        .component(Route::leaf("moves list", Schema::Any, selected_character_moves))
        .component(Route::leaf("move-strong", Schema::Any, under_construction))
        .component(Route::leaf("move-normal", Schema::Any, under_construction))
        .component(Route::leaf("move-weak", Schema::Any, under_construction))
        .autocomplete(Route::branch(
            "gm",
            vec![Route::branch(
                "assign",
                vec![
                    Route::leaf("character", Schema::Any, character_choices),
                    Route::leaf("tokens", Schema::Any, character_choices),
                ],
            )?],
        )?)
        .autocomplete(Route::leaf("moves", Schema::Any, character_choices))
        .modal(Route::leaf(
            CHARACTER_SEARCH_MODAL,
            Schema::Any,
            search_characters,
        ))
        .build()
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

struct MoveArgs {
    character: Option<String>,
    moveset: Moveset,
}

impl FromArgs for MoveArgs {
    fn schema() -> Schema {
        Schema::args([
            ArgSpec::string("character").optional(),
            ArgSpec::string("moveset"),
        ])
    }

    fn from_args(args: &Args) -> Result<Self, ValidationError> {
        let value = args.string("moveset")?;
        // Unknown movesets are a bad value for a known argument.
        let moveset = Moveset::parse(value).map_err(|_| ValidationError::TypeMismatch {
            path: args.path().to_string(),
            expected: "moveset",
            found: "string",
        })?;
        Ok(Self {
            character: args.opt_string("character")?.map(str::to_string),
            moveset,
        })
    }
}

struct AssignCharacter {
    user: String,
    character: String,
}

impl FromArgs for AssignCharacter {
    fn schema() -> Schema {
        Schema::args([ArgSpec::user("user"), ArgSpec::string("character")])
    }

    fn from_args(args: &Args) -> Result<Self, ValidationError> {
        Ok(Self {
            user: args.user("user")?.to_string(),
            character: args.string("character")?.to_string(),
        })
    }
}

struct AssignTokens {
    character: String,
    tokens: i64,
}

impl FromArgs for AssignTokens {
    fn schema() -> Schema {
        Schema::args([ArgSpec::string("character"), ArgSpec::integer("tokens")])
    }

    fn from_args(args: &Args) -> Result<Self, ValidationError> {
        Ok(Self {
            character: args.string("character")?.to_string(),
            tokens: args.integer("tokens")?,
        })
    }
}

struct CreateCharacter {
    name: String,
}

impl FromArgs for CreateCharacter {
    fn schema() -> Schema {
        Schema::args([ArgSpec::string("name")])
    }

    fn from_args(args: &Args) -> Result<Self, ValidationError> {
        Ok(Self {
            name: args.string("name")?.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn reply(content: impl Into<String>) -> HandlerResult {
    Ok(Some(InteractionResponse::ephemeral(content)))
}

/// Id of the member who triggered the current interaction.
fn author() -> Result<String, BoxError> {
    let interaction = context::interaction()?;
    let author = interaction.author_id().ok_or(GameError::NoMember)?;
    Ok(author.to_string())
}

fn move_buttons() -> ActionRow {
    action_row(vec![
        emoji_button(ButtonStyle::Secondary, "💪", "Make a Strong Move", "move-strong"),
        emoji_button(ButtonStyle::Secondary, "😐", "Make a Normal Move", "move-normal"),
        emoji_button(ButtonStyle::Secondary, "😭", "Make a Weak Move", "move-weak"),
    ])
}

fn render_moves(character: &Character, moveset: Moveset) -> InteractionResponse {
    MessageData::new()
        .content(format!(
            "{} is ready to make a {} move.",
            capitalize(&character.name),
            moveset.label()
        ))
        .component_row(move_buttons())
        .ephemeral()
        .into()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn tokens(_: ()) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;
    let author = author()?;

    if game.is_gm(&author) {
        if game.characters.is_empty() {
            return reply("No characters yet");
        }
        let lines: Vec<String> = game
            .characters
            .iter()
            .map(|c| format!("- {}: {}", capitalize(&c.name), c.tokens))
            .collect();
        return reply(lines.join("\n"));
    }

    let character = game.character_of(&author).ok_or(GameError::NoCharacter)?;
    let plural = if character.tokens == 1 { "" } else { "s" };
    reply(format!(
        "{} has {} token{plural}!",
        capitalize(&character.name),
        character.tokens
    ))
}

async fn list_characters(_: ()) -> HandlerResult {
    let ctx = GameContext::current()?;
    let names: Vec<String> = ctx
        .game()?
        .characters
        .iter()
        .map(|c| format!("- {}", capitalize(&c.name)))
        .collect();
    reply(names.join("\n"))
}

async fn list_players(_: ()) -> HandlerResult {
    let ctx = GameContext::current()?;
    let players: Vec<String> = ctx
        .game()?
        .players()
        .into_iter()
        .map(|id| format!("- {}", mention(id)))
        .collect();
    reply(players.join("\n"))
}

async fn moves_list(args: MoveArgs) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;
    let author = author()?;

    if game.is_gm(&author) && args.character.is_none() {
        let options = game
            .characters
            .iter()
            .map(|c| select_option(capitalize(&c.name), c.id.clone()))
            .collect();
        let message = MessageData::new()
            .content("Select a character to proceed with")
            .component_row(action_row(vec![string_select(
                args.moveset.value(),
                "Choose a character",
                options,
            )]))
            .ephemeral();
        return Ok(Some(message.into()));
    }

    let character = match &args.character {
        Some(id) => game
            .character(id)
            .ok_or_else(|| GameError::CharacterNotFound(id.clone()))?,
        None => game.character_of(&author).ok_or(GameError::NoCharacter)?,
    };
    Ok(Some(render_moves(character, args.moveset)))
}

async fn moves_do(args: MoveArgs) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;
    let author = author()?;

    if game.is_gm(&author) {
        return reply("You are the gm of this game");
    }
    let character = game.character_of(&author).ok_or(GameError::NoCharacter)?;
    let name = capitalize(&character.name);

    let content = match args.moveset {
        Moveset::Strong => {
            match ctx.store.adjust_tokens(&game.guild_id, &character.id, -1).await {
                Ok(_) => format!("{name} has spent a token and made a strong move!"),
                Err(GameError::NotEnoughTokens(_)) => {
                    format!("{name} can't make a strong move without a token!")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Moveset::Weak => {
            ctx.store
                .adjust_tokens(&game.guild_id, &character.id, 1)
                .await?;
            format!("{name} has made a weak move and earned a token!")
        }
        Moveset::Normal => format!("{name} has made a normal move."),
        Moveset::Social => format!("{name} has made a social move? Ask your GM what happens next."),
    };
    reply(content)
}

async fn game_init(_: ()) -> HandlerResult {
    let ctx = GameContext::current()?;
    let interaction = context::interaction()?;
    let guild_id = interaction.guild_id().ok_or(GameError::NoGame)?;
    let author = author()?;

    ctx.store.init(guild_id, &author).await?;
    let gm = interaction.author_mention().ok_or(GameError::NoMember)?;
    reply(format!("Started a new game run by {gm}"))
}

async fn game_info(_: ()) -> HandlerResult {
    let ctx = GameContext::current()?;
    match &ctx.game {
        Some(game) => reply(format!(
            "This server has a game run by {}",
            mention(&game.gm_id)
        )),
        None => reply("No game running in this server"),
    }
}

async fn assign_character(args: AssignCharacter) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;

    match ctx
        .store
        .assign_character(&game.guild_id, &args.user, &args.character)
        .await
    {
        Ok(character) => {
            info!(character = %character.id, player = %args.user, "assigned character");
            reply(format!(
                "Assigned {} to {}",
                capitalize(&character.name),
                mention(&args.user)
            ))
        }
        Err(GameError::CharacterNotFound(_)) => reply("Character not found"),
        Err(e) => Err(e.into()),
    }
}

async fn assign_tokens(args: AssignTokens) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;
    let character = ctx
        .store
        .set_tokens(&game.guild_id, &args.character, args.tokens)
        .await?;
    reply(format!(
        "{} has {} tokens",
        capitalize(&character.name),
        args.tokens
    ))
}

async fn create_character(args: CreateCharacter) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;
    ctx.store.create_character(&game.guild_id, &args.name).await?;
    reply(format!("Created new character: {}", args.name))
}

// ---------------------------------------------------------------------------
// Components, autocomplete, modals
// ---------------------------------------------------------------------------

async fn under_construction(_: Args) -> HandlerResult {
    reply("Working, but not implemented")
}

async fn search_modal(_: Args) -> HandlerResult {
    Ok(Some(InteractionResponse::modal(
        CHARACTER_SEARCH_MODAL,
        "Find a character",
        vec![text_input_row(
            "name",
            "Character name",
            TextInputStyle::Short,
            true,
        )],
    )))
}

/// The GM picked a character from the `moves list` select menu. The select's
/// custom id is the moveset, its value the character id.
async fn selected_character_moves(args: Args) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;

    let selected = args.first().ok_or(GameError::NothingSelected)?;
    let moveset = Moveset::parse(selected.name())?;
    let id = selected.as_str().ok_or(GameError::NothingSelected)?;
    let character = game
        .character(id)
        .ok_or_else(|| GameError::CharacterNotFound(id.to_string()))?;
    Ok(Some(render_moves(character, moveset)))
}

async fn character_choices(args: Args) -> HandlerResult {
    let ctx = GameContext::current()?;
    let typed = args
        .focused()
        .and_then(CommandOption::as_str)
        .unwrap_or_default();

    let choices = ctx
        .game
        .iter()
        .flat_map(|game| game.search(typed))
        .take(MAX_CHOICES)
        .map(|c| AutocompleteChoice::new(c.name.to_uppercase(), c.id.clone()));
    Ok(Some(InteractionResponse::autocomplete(choices)))
}

async fn search_characters(args: Args) -> HandlerResult {
    let ctx = GameContext::current()?;
    let game = ctx.game()?;
    let fragment = args.first().and_then(CommandOption::as_str).unwrap_or_default();

    let names: Vec<String> = game
        .search(fragment)
        .into_iter()
        .map(|c| capitalize(&c.name))
        .collect();
    if names.is_empty() {
        return reply("No characters match");
    }
    reply(names.join("\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::error::RouteError;
    use crate::game::GameStore;
    use crate::types::{Component, Interaction};

    const GUILD: &str = "g1";
    const GM: &str = "100";
    const PLAYER: &str = "200";

    async fn send(store: &Arc<GameStore>, raw: Value) -> Result<Option<InteractionResponse>, RouteError> {
        let router = router().unwrap();
        let interaction = Interaction::parse(&raw).unwrap();
        let guild = interaction.guild_id().map(str::to_string);
        let store = Arc::clone(store);
        router
            .dispatch(interaction, || async move {
                GameContext::resolve(store, guild.as_deref()).await
            })
            .await
    }

    fn member(id: &str) -> Value {
        json!({ "user": { "id": id, "username": format!("user{id}") } })
    }

    fn command(user: &str, name: &str, options: Value) -> Value {
        json!({
            "type": 2,
            "member": member(user),
            "guild_id": GUILD,
            "data": { "name": name, "options": options }
        })
    }

    fn sub(name: &str, options: Value) -> Value {
        json!({ "type": 1, "name": name, "options": options })
    }

    fn group(name: &str, options: Value) -> Value {
        json!({ "type": 2, "name": name, "options": [options] })
    }

    fn content(response: Option<InteractionResponse>) -> String {
        match response {
            Some(InteractionResponse::ChannelMessage(data)) => {
                assert!(data.is_ephemeral());
                data.content.unwrap_or_default()
            }
            other => panic!("expected a message, got {other:?}"),
        }
    }

    /// A game with `ash` (3 tokens, played by PLAYER) and `brin`.
    async fn seeded() -> Arc<GameStore> {
        let store = Arc::new(GameStore::new());
        store.init(GUILD, GM).await.unwrap();
        let ash = store.create_character(GUILD, "Ash").await.unwrap();
        store.create_character(GUILD, "Brin").await.unwrap();
        store.assign_character(GUILD, PLAYER, &ash.id).await.unwrap();
        store.set_tokens(GUILD, &ash.id, 3).await.unwrap();
        store
    }

    #[test]
    fn router_builds() {
        let router = router().unwrap();
        assert_eq!(router.commands().names(), ["gm", "list", "moves", "tokens"]);
        assert_eq!(router.components().len(), 5);
        assert_eq!(router.autocomplete().names(), ["gm", "moves"]);
        assert!(router.modal_submits().get(CHARACTER_SEARCH_MODAL).is_some());
    }

    #[tokio::test]
    async fn gm_starts_and_describes_game() {
        let store = Arc::new(GameStore::new());

        let info = command(GM, "gm", json!([group("game", sub("info", json!([])))]));
        assert_eq!(
            content(send(&store, info.clone()).await.unwrap()),
            "No game running in this server"
        );

        let init = command(GM, "gm", json!([group("game", sub("init", json!([])))]));
        assert_eq!(
            content(send(&store, init.clone()).await.unwrap()),
            "Started a new game run by <@100>"
        );
        assert_eq!(
            content(send(&store, info).await.unwrap()),
            "This server has a game run by <@100>"
        );

        let err = send(&store, init).await.unwrap_err();
        assert!(matches!(err, RouteError::Handler { ref path, .. } if path == "gm game init"));
    }

    #[tokio::test]
    async fn gm_creates_and_assigns() {
        let store = Arc::new(GameStore::new());
        store.init(GUILD, GM).await.unwrap();

        let create = command(
            GM,
            "gm",
            json!([group(
                "create",
                sub("character", json!([{ "type": 3, "name": "name", "value": "Cora" }]))
            )]),
        );
        assert_eq!(
            content(send(&store, create).await.unwrap()),
            "Created new character: Cora"
        );

        let assign = command(
            GM,
            "gm",
            json!([group(
                "assign",
                sub(
                    "character",
                    json!([
                        { "type": 6, "name": "user", "value": PLAYER },
                        { "type": 3, "name": "character", "value": "g1-1" }
                    ])
                )
            )]),
        );
        assert_eq!(
            content(send(&store, assign).await.unwrap()),
            "Assigned Cora to <@200>"
        );

        let tokens = command(
            GM,
            "gm",
            json!([group(
                "assign",
                sub(
                    "tokens",
                    json!([
                        { "type": 3, "name": "character", "value": "g1-1" },
                        { "type": 4, "name": "tokens", "value": 2 }
                    ])
                )
            )]),
        );
        assert_eq!(content(send(&store, tokens).await.unwrap()), "Cora has 2 tokens");
    }

    #[tokio::test]
    async fn assign_with_wrong_argument_kind_is_rejected() {
        let store = seeded().await;
        let assign = command(
            GM,
            "gm",
            json!([group(
                "assign",
                sub(
                    "tokens",
                    json!([
                        { "type": 3, "name": "character", "value": "g1-1" },
                        { "type": 3, "name": "tokens", "value": "two" }
                    ])
                )
            )]),
        );
        let err = send(&store, assign).await.unwrap_err();
        assert!(matches!(
            err.validation(),
            Some(ValidationError::WrongArgumentKind { name, .. }) if name == "tokens"
        ));
    }

    #[tokio::test]
    async fn tokens_view_depends_on_caller() {
        let store = seeded().await;
        assert_eq!(
            content(send(&store, command(GM, "tokens", json!([]))).await.unwrap()),
            "- Ash: 3\n- Brin: 0"
        );
        assert_eq!(
            content(send(&store, command(PLAYER, "tokens", json!([]))).await.unwrap()),
            "Ash has 3 tokens!"
        );
    }

    #[tokio::test]
    async fn lists() {
        let store = seeded().await;
        let characters = command(PLAYER, "list", json!([sub("characters", json!([]))]));
        assert_eq!(content(send(&store, characters).await.unwrap()), "- Ash\n- Brin");
        let players = command(PLAYER, "list", json!([sub("players", json!([]))]));
        assert_eq!(content(send(&store, players).await.unwrap()), "- <@200>");
    }

    #[tokio::test]
    async fn strong_and_weak_moves_move_tokens() {
        let store = seeded().await;
        store.set_tokens(GUILD, "g1-1", 0).await.unwrap();
        let perform = |moveset: &str| {
            command(
                PLAYER,
                "moves",
                json!([sub("do", json!([{ "type": 3, "name": "moveset", "value": moveset }]))]),
            )
        };

        assert_eq!(
            content(send(&store, perform("strongMoves")).await.unwrap()),
            "Ash can't make a strong move without a token!"
        );
        assert_eq!(
            content(send(&store, perform("weakMoves")).await.unwrap()),
            "Ash has made a weak move and earned a token!"
        );
        assert_eq!(
            content(send(&store, perform("strongMoves")).await.unwrap()),
            "Ash has spent a token and made a strong move!"
        );
        assert_eq!(store.game(GUILD).await.unwrap().characters[0].tokens, 0);

        let gm = command(
            GM,
            "moves",
            json!([sub("do", json!([{ "type": 3, "name": "moveset", "value": "normalMoves" }]))]),
        );
        assert_eq!(content(send(&store, gm).await.unwrap()), "You are the gm of this game");
    }

    #[tokio::test]
    async fn unknown_moveset_is_a_validation_error() {
        let store = seeded().await;
        let raw = command(
            PLAYER,
            "moves",
            json!([sub("do", json!([{ "type": 3, "name": "moveset", "value": "dance" }]))]),
        );
        let err = send(&store, raw).await.unwrap_err();
        assert!(matches!(err, RouteError::Validation { ref path, .. } if path == "moves do"));
    }

    #[tokio::test]
    async fn gm_moves_list_offers_select_then_component_renders_moves() {
        let store = seeded().await;
        let list = command(
            GM,
            "moves",
            json!([sub("list", json!([{ "type": 3, "name": "moveset", "value": "strongMoves" }]))]),
        );
        let Some(InteractionResponse::ChannelMessage(message)) = send(&store, list).await.unwrap()
        else {
            panic!("expected a message");
        };
        let rows = message.components.unwrap();
        let Component::StringSelect(select) = &rows[0].components[0] else {
            panic!("expected a select menu");
        };
        assert_eq!(select.custom_id, "strongMoves");
        assert_eq!(select.options.len(), 2);

        let picked = json!({
            "type": 3,
            "member": member(GM),
            "guild_id": GUILD,
            "message": { "interaction": { "name": "moves list", "type": 2, "user": { "id": GM } } },
            "data": { "component_type": 3, "custom_id": "strongMoves", "values": ["g1-2"] }
        });
        let Some(InteractionResponse::ChannelMessage(message)) = send(&store, picked).await.unwrap()
        else {
            panic!("expected a message");
        };
        assert_eq!(message.content.as_deref(), Some("Brin is ready to make a strong move."));
        assert_eq!(message.components.unwrap()[0].components.len(), 3);
    }

    #[tokio::test]
    async fn move_buttons_are_placeholders() {
        let store = seeded().await;
        let click = json!({
            "type": 3,
            "member": member(PLAYER),
            "guild_id": GUILD,
            "message": {},
            "data": { "component_type": 2, "custom_id": "move-weak" }
        });
        assert_eq!(
            content(send(&store, click).await.unwrap()),
            "Working, but not implemented"
        );
    }

    #[tokio::test]
    async fn autocomplete_suggests_characters() {
        let store = seeded().await;
        let raw = json!({
            "type": 4,
            "guild_id": GUILD,
            "data": { "name": "gm", "options": [group(
                "assign",
                sub("tokens", json!([{ "type": 3, "name": "character", "value": "AS", "focused": true }]))
            )]}
        });
        let Some(InteractionResponse::AutocompleteResult(data)) = send(&store, raw).await.unwrap()
        else {
            panic!("expected autocomplete choices");
        };
        assert_eq!(data.choices, vec![AutocompleteChoice::new("ASH", "g1-1")]);
    }

    #[tokio::test]
    async fn search_button_opens_modal_and_modal_searches() {
        let store = seeded().await;
        let click = json!({
            "type": 3,
            "member": member(GM),
            "guild_id": GUILD,
            "message": {},
            "data": { "component_type": 2, "custom_id": "moves" }
        });
        let Some(InteractionResponse::Modal(modal)) = send(&store, click).await.unwrap() else {
            panic!("expected a modal");
        };
        assert_eq!(modal.custom_id, CHARACTER_SEARCH_MODAL);

        let submit = json!({
            "type": 5,
            "member": member(GM),
            "guild_id": GUILD,
            "data": { "custom_id": CHARACTER_SEARCH_MODAL, "components": [
                { "type": 1, "components": [{ "type": 4, "custom_id": "name", "value": "br" }] }
            ]}
        });
        assert_eq!(content(send(&store, submit).await.unwrap()), "Brin");
    }

    #[tokio::test]
    async fn commands_need_a_game() {
        let store = Arc::new(GameStore::new());
        let err = send(&store, command(PLAYER, "tokens", json!([]))).await.unwrap_err();
        assert_eq!(err.to_string(), "handler for `tokens` failed: No game in this server");
    }
}
