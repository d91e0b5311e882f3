//! Routes and route tables.
//!
//! A [`Route`] binds one command-path segment to either a leaf handler or a
//! nested [`RouteTable`], together with the [`Schema`] its option list must
//! satisfy. Tables are built once at startup; sibling names must be unique
//! and a duplicate fails the build instead of silently replacing the earlier
//! route.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use futures_lite::future::{Boxed, FutureExt};

use crate::error::{BoxError, BuildError, ValidationError};
use crate::types::{CommandOption, InteractionResponse, OptionKind, OptionsExt};

/// What a handler produces. `Ok(None)` means "no direct reply".
pub type HandlerResult = Result<Option<InteractionResponse>, BoxError>;

/// Boxed handler future.
pub type HandlerFuture = Boxed<HandlerResult>;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// One expected leaf argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: OptionKind,
    pub required: bool,
}

impl ArgSpec {
    fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Boolean)
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::User)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// The declared shape of a route's option list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Schema {
    /// Anything that passed structural validation.
    #[default]
    Any,
    /// No options at all.
    Empty,
    /// Named leaf arguments. Unknown, duplicate, or mistyped arguments and
    /// missing required ones are rejected, as are containers.
    Args(Vec<ArgSpec>),
    /// Exactly one subcommand or subcommand group. Used by branch routes.
    Container,
}

impl Schema {
    pub fn args(specs: impl IntoIterator<Item = ArgSpec>) -> Self {
        Self::Args(specs.into_iter().collect())
    }

    /// Check `options` against this schema. `path` is only used for errors.
    pub fn validate(&self, options: &[CommandOption], path: &str) -> Result<(), ValidationError> {
        match self {
            Self::Any => Ok(()),
            Self::Empty if options.is_empty() => Ok(()),
            Self::Empty => Err(ValidationError::UnexpectedArguments {
                path: path.to_string(),
                found: options.len(),
            }),
            Self::Container => match options {
                [single] if single.is_container() => Ok(()),
                _ => Err(ValidationError::ExpectedContainer {
                    path: path.to_string(),
                    found: options.len(),
                }),
            },
            Self::Args(specs) => validate_args(specs, options, path),
        }
    }
}

fn validate_args(
    specs: &[ArgSpec],
    options: &[CommandOption],
    path: &str,
) -> Result<(), ValidationError> {
    let mut seen: Vec<&str> = Vec::with_capacity(options.len());

    for option in options {
        let name = option.name();
        if option.is_container() {
            return Err(ValidationError::UnexpectedContainer {
                path: path.to_string(),
                name: name.to_string(),
            });
        }
        let spec = specs.iter().find(|s| s.name == name).ok_or_else(|| {
            ValidationError::UnknownArgument {
                path: path.to_string(),
                name: name.to_string(),
            }
        })?;
        if spec.kind != option.kind() {
            return Err(ValidationError::WrongArgumentKind {
                path: path.to_string(),
                name: name.to_string(),
                expected: spec.kind,
                found: option.kind(),
            });
        }
        if seen.contains(&name) {
            return Err(ValidationError::DuplicateArgument {
                path: path.to_string(),
                name: name.to_string(),
            });
        }
        seen.push(name);
    }

    match specs
        .iter()
        .find(|s| s.required && !seen.contains(&s.name.as_str()))
    {
        Some(missing) => Err(ValidationError::MissingArgument {
            path: path.to_string(),
            name: missing.name.clone(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// The validated option list handed to a leaf handler, in wire order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    path: String,
    options: Vec<CommandOption>,
}

impl Args {
    pub fn new(path: impl Into<String>, options: Vec<CommandOption>) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Command path of the route these arguments were validated for.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn into_inner(self) -> Vec<CommandOption> {
        self.options
    }

    /// The option being autocompleted, if any.
    pub fn focused(&self) -> Option<&CommandOption> {
        self.options.focused()
    }

    fn missing(&self, name: &str) -> ValidationError {
        ValidationError::MissingArgument {
            path: self.path.clone(),
            name: name.to_string(),
        }
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: OptionKind,
        extract: impl FnOnce(&'a CommandOption) -> Option<T>,
    ) -> Result<Option<T>, ValidationError> {
        let Some(option) = self.options.find(name) else {
            return Ok(None);
        };
        extract(option)
            .map(Some)
            .ok_or_else(|| ValidationError::WrongArgumentKind {
                path: self.path.clone(),
                name: name.to_string(),
                expected,
                found: option.kind(),
            })
    }

    pub fn opt_string(&self, name: &str) -> Result<Option<&str>, ValidationError> {
        self.typed(name, OptionKind::String, CommandOption::as_str)
    }

    pub fn string(&self, name: &str) -> Result<&str, ValidationError> {
        self.opt_string(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn opt_integer(&self, name: &str) -> Result<Option<i64>, ValidationError> {
        self.typed(name, OptionKind::Integer, CommandOption::as_i64)
    }

    pub fn integer(&self, name: &str) -> Result<i64, ValidationError> {
        self.opt_integer(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn opt_boolean(&self, name: &str) -> Result<Option<bool>, ValidationError> {
        self.typed(name, OptionKind::Boolean, CommandOption::as_bool)
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ValidationError> {
        self.opt_boolean(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn opt_user(&self, name: &str) -> Result<Option<&str>, ValidationError> {
        self.typed(name, OptionKind::User, CommandOption::as_user)
    }

    pub fn user(&self, name: &str) -> Result<&str, ValidationError> {
        self.opt_user(name)?.ok_or_else(|| self.missing(name))
    }
}

impl Deref for Args {
    type Target = [CommandOption];

    fn deref(&self) -> &Self::Target {
        &self.options
    }
}

impl IntoIterator for Args {
    type Item = CommandOption;
    type IntoIter = std::vec::IntoIter<CommandOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.into_iter()
    }
}

/// A struct that can be extracted from a validated argument list.
///
/// Used with [`Route::typed`] so a handler receives one typed value instead of
/// the positional list.
pub trait FromArgs: Sized + Send + 'static {
    /// Schema the option list is validated against before extraction.
    fn schema() -> Schema;

    fn from_args(args: &Args) -> Result<Self, ValidationError>;
}

impl FromArgs for () {
    fn schema() -> Schema {
        Schema::Empty
    }

    fn from_args(_: &Args) -> Result<Self, ValidationError> {
        Ok(())
    }
}

impl FromArgs for Args {
    fn schema() -> Schema {
        Schema::Any
    }

    fn from_args(args: &Args) -> Result<Self, ValidationError> {
        Ok(args.clone())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

type Invoke = dyn Fn(Args) -> Result<HandlerFuture, ValidationError> + Send + Sync;

/// A type-erased leaf handler.
#[derive(Clone)]
pub struct LeafHandler(Arc<Invoke>);

impl LeafHandler {
    /// Wrap a handler taking the positional argument list.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |args| Ok(handler(args).boxed())))
    }

    /// Wrap a handler taking a single extracted struct.
    pub fn typed<T, F, Fut>(handler: F) -> Self
    where
        T: FromArgs,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |args: Args| {
            let value = T::from_args(&args)?;
            Ok(handler(value).boxed())
        }))
    }

    /// Extract arguments and start the handler. Extraction failures are
    /// reported before any handler code runs.
    pub(crate) fn call(&self, args: Args) -> Result<HandlerFuture, ValidationError> {
        (self.0)(args)
    }
}

impl fmt::Debug for LeafHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LeafHandler")
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// What a route resolves to, as passed to [`define_route`].
pub enum RouteTarget {
    Leaf(LeafHandler),
    Branch(Vec<Route>),
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(LeafHandler),
    Branch(RouteTable),
}

/// A named binding of a command-path segment to a handler or a nested table.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    schema: Schema,
    node: Node,
}

/// Build a route from a name, a schema, and either a handler or children.
///
/// Children are collapsed into a [`RouteTable`] here, so duplicate sibling
/// names fail now rather than at dispatch.
pub fn define_route(
    name: impl Into<String>,
    schema: Schema,
    target: RouteTarget,
) -> Result<Route, BuildError> {
    let node = match target {
        RouteTarget::Leaf(handler) => Node::Leaf(handler),
        RouteTarget::Branch(children) => Node::Branch(RouteTable::new(children)?),
    };
    Ok(Route {
        name: name.into(),
        schema,
        node,
    })
}

impl Route {
    /// A leaf route whose handler receives the positional argument list.
    pub fn leaf<F, Fut>(name: impl Into<String>, schema: Schema, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            schema,
            node: Node::Leaf(LeafHandler::new(handler)),
        }
    }

    /// A leaf route whose handler receives one value extracted with
    /// [`FromArgs`]. The schema is `T::schema()`.
    pub fn typed<T, F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        T: FromArgs,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            schema: T::schema(),
            node: Node::Leaf(LeafHandler::typed(handler)),
        }
    }

    /// A branch route dispatching on its single subcommand option.
    pub fn branch(name: impl Into<String>, children: Vec<Route>) -> Result<Self, BuildError> {
        define_route(name, Schema::Container, RouteTarget::Branch(children))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.node, Node::Branch(_))
    }

    /// Nested table of a branch route.
    pub fn children(&self) -> Option<&RouteTable> {
        match &self.node {
            Node::Branch(table) => Some(table),
            Node::Leaf(_) => None,
        }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }
}

/// Name-keyed lookup over a set of sibling routes. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Result<Self, BuildError> {
        let mut table = HashMap::new();
        for route in routes {
            if table.contains_key(route.name()) {
                return Err(BuildError::DuplicateRoute { name: route.name });
            }
            table.insert(route.name.clone(), route);
        }
        Ok(Self { routes: table })
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
