//! The interaction router.
//!
//! A [`Router`] owns four frozen route tables, one per routable interaction
//! kind. [`Router::dispatch`] builds the request context once, then resolves
//! the interaction against the matching table inside that context:
//!
//! - application commands and autocomplete walk the table along the command
//!   path (`gm` → `assign` → `character`), validating each level's options
//!   against the matched route's schema;
//! - components and modal submits resolve a single name and hand the handler
//!   their values as string arguments.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::{self, RequestContext};
use crate::error::{BoxError, BuildError, ContextError, RouteError, ValidationError};
use crate::route::{Args, Node, Route, RouteTable};
use crate::types::{
    CommandData, CommandOption, ComponentInteraction, Interaction, InteractionResponse,
    ModalSubmitInteraction,
};

/// Result of one dispatch. `None` means the handler chose not to reply.
pub type DispatchResult = Result<Option<InteractionResponse>, RouteError>;

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// The four root route lists, as accepted by [`router_root`].
#[derive(Debug, Default)]
pub struct RootRoutes {
    pub application_commands: Vec<Route>,
    pub components: Vec<Route>,
    pub autocomplete: Vec<Route>,
    pub modal_submits: Vec<Route>,
}

/// Build a router from its root route lists.
pub fn router_root(routes: RootRoutes) -> Result<Router, BuildError> {
    Ok(Router {
        commands: RouteTable::new(routes.application_commands)?,
        components: RouteTable::new(routes.components)?,
        autocomplete: RouteTable::new(routes.autocomplete)?,
        modal_submits: RouteTable::new(routes.modal_submits)?,
    })
}

/// Incremental alternative to [`router_root`].
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: RootRoutes,
}

impl RouterBuilder {
    pub fn command(mut self, route: Route) -> Self {
        self.routes.application_commands.push(route);
        self
    }

    pub fn component(mut self, route: Route) -> Self {
        self.routes.components.push(route);
        self
    }

    pub fn autocomplete(mut self, route: Route) -> Self {
        self.routes.autocomplete.push(route);
        self
    }

    pub fn modal(mut self, route: Route) -> Self {
        self.routes.modal_submits.push(route);
        self
    }

    /// Freeze the tables. Fails on the first duplicate name in any table.
    pub fn build(self) -> Result<Router, BuildError> {
        router_root(self.routes)
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Immutable dispatcher. Cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct Router {
    commands: RouteTable,
    components: RouteTable,
    autocomplete: RouteTable,
    modal_submits: RouteTable,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    pub fn commands(&self) -> &RouteTable {
        &self.commands
    }

    pub fn components(&self) -> &RouteTable {
        &self.components
    }

    pub fn autocomplete(&self) -> &RouteTable {
        &self.autocomplete
    }

    pub fn modal_submits(&self) -> &RouteTable {
        &self.modal_submits
    }

    /// Dispatch one interaction.
    ///
    /// `context_builder` runs exactly once, before routing, and its value
    /// becomes the request context's extra (see [`context::extra`]).
    pub async fn dispatch<C, E, F, Fut>(
        &self,
        interaction: Interaction,
        context_builder: F,
    ) -> DispatchResult
    where
        C: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, E>>,
    {
        let extra = context_builder()
            .await
            .map_err(|e| RouteError::Context(e.into()))?;

        let interaction = Arc::new(interaction);
        let ctx = RequestContext::shared(Arc::clone(&interaction), extra);
        context::run(ctx, self.route(&interaction)).await
    }

    /// Parse a raw payload and dispatch it.
    pub async fn dispatch_value<C, E, F, Fut>(&self, raw: &Value, context_builder: F) -> DispatchResult
    where
        C: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, E>>,
    {
        let interaction = Interaction::parse(raw)?;
        self.dispatch(interaction, context_builder).await
    }

    /// Parse a JSON payload and dispatch it.
    pub async fn dispatch_json<C, E, F, Fut>(&self, text: &str, context_builder: F) -> DispatchResult
    where
        C: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, E>>,
    {
        let interaction = Interaction::from_json(text)?;
        self.dispatch(interaction, context_builder).await
    }

    async fn route(&self, interaction: &Interaction) -> DispatchResult {
        debug!(kind = ?interaction.kind(), guild = ?interaction.guild_id(), "dispatching interaction");

        match interaction {
            Interaction::Ping => Ok(Some(InteractionResponse::Pong)),
            Interaction::ApplicationCommand(command) => {
                let (_, response) = dispatch_command(&self.commands, &command.data).await?;
                Ok(response)
            }
            Interaction::MessageComponent(component) => {
                let (name, args) = component_args(component);
                let (_, response) = walk(&self.components, name, args).await?;
                Ok(response)
            }
            Interaction::Autocomplete(autocomplete) => {
                let (path, response) =
                    dispatch_command(&self.autocomplete, &autocomplete.data).await?;
                let found = match response {
                    Some(InteractionResponse::AutocompleteResult(_)) => return Ok(response),
                    Some(other) => other.kind_name(),
                    None => "no response",
                };
                Err(RouteError::UnexpectedResponse {
                    path,
                    expected: "autocomplete result",
                    found,
                })
            }
            Interaction::ModalSubmit(modal) => {
                let (name, args) = modal_args(modal);
                let (_, response) = walk(&self.modal_submits, name, args).await?;
                Ok(response)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

async fn dispatch_command(
    table: &RouteTable,
    data: &CommandData,
) -> Result<(String, Option<InteractionResponse>), RouteError> {
    let options = data
        .parse_options()
        .map_err(|source| validation(&data.name, source))?;
    walk(table, &data.name, options).await
}

/// Resolve `name` in `table`, descending through branches along the single
/// container option at each level, and run the leaf it ends on.
///
/// Returns the space-separated path of the leaf with its response.
async fn walk(
    table: &RouteTable,
    name: &str,
    options: Vec<CommandOption>,
) -> Result<(String, Option<InteractionResponse>), RouteError> {
    let mut table = table;
    let mut path = name.to_string();
    let mut name = name.to_string();
    let mut options = options;

    loop {
        let Some(route) = table.get(&name) else {
            debug!(path = %path, "no route");
            return Err(RouteError::NotFound { path });
        };
        route
            .schema()
            .validate(&options, &path)
            .map_err(|source| validation(&path, source))?;

        match route.node() {
            Node::Leaf(handler) => {
                debug!(path = %path, args = options.len(), "invoking handler");
                let future = handler
                    .call(Args::new(path.clone(), options))
                    .map_err(|source| validation(&path, source))?;
                let response = future.await.map_err(|source| handler_error(&path, source))?;
                return Ok((path, response));
            }
            Node::Branch(children) => {
                let (child, child_options) = single_container(options, &path)?;
                path.push(' ');
                path.push_str(&child);
                table = children;
                name = child;
                options = child_options;
            }
        }
    }
}

/// Split off the one container a branch descends through.
fn single_container(
    options: Vec<CommandOption>,
    path: &str,
) -> Result<(String, Vec<CommandOption>), RouteError> {
    let found = options.len();
    let mut iter = options.into_iter();
    match (iter.next(), iter.next()) {
        (Some(CommandOption::Subcommand { name, options }), None)
        | (Some(CommandOption::SubcommandGroup { name, options }), None) => Ok((name, options)),
        _ => Err(validation(
            path,
            ValidationError::ExpectedContainer {
                path: path.to_string(),
                found,
            },
        )),
    }
}

/// Selected values become String args. The first is named by the custom id,
/// later ones by `<custom_id>.<index>`, so `["a", "b"]` from `pick` arrives
/// as `pick = a`, `pick.1 = b`.
fn component_args(component: &ComponentInteraction) -> (&str, Vec<CommandOption>) {
    let custom_id = &component.data.custom_id;
    let args = component
        .data
        .values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let name = match index {
                0 => custom_id.clone(),
                n => format!("{custom_id}.{n}"),
            };
            CommandOption::string(name, value.clone())
        })
        .collect();
    (component.route_name(), args)
}

fn modal_args(modal: &ModalSubmitInteraction) -> (&str, Vec<CommandOption>) {
    let args = modal
        .data
        .values()
        .map(|(custom_id, value)| CommandOption::string(custom_id, value))
        .collect();
    (&modal.data.custom_id, args)
}

fn validation(path: &str, source: ValidationError) -> RouteError {
    RouteError::Validation {
        path: path.to_string(),
        source,
    }
}

fn handler_error(path: &str, source: BoxError) -> RouteError {
    match source.downcast::<ContextError>() {
        Ok(misuse) => {
            warn!(path = %path, error = %misuse, "handler misused the request context");
            RouteError::ContextMisuse(*misuse)
        }
        Err(source) => {
            warn!(path = %path, error = %source, "handler failed");
            RouteError::Handler {
                path: path.to_string(),
                source,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
