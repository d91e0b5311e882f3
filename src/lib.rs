//! Typed command routing for Discord interactions.
//!
//! Inbound interactions are parsed into [`types::Interaction`], resolved
//! against a tree of [`route::Route`]s by a [`router::Router`], and answered
//! with an optional [`types::InteractionResponse`]. Every level of a command
//! path validates its options against the route's declared schema before the
//! leaf handler runs. Handlers reach the current interaction and any
//! per-request state through [`context`].
//!
//! The webhook transport (HTTP, signature verification) is left to the
//! caller. The `io` feature adds a demo game and a binary that dispatches one
//! payload from a file or stdin.

pub mod context;
pub mod error;
pub mod route;
pub mod router;
pub mod types;

#[cfg(feature = "io")]
pub mod game;

pub use crate::error::{BoxError, BuildError, ContextError, ParseError, RouteError, ValidationError};
pub use crate::route::{
    define_route, ArgSpec, Args, FromArgs, HandlerResult, LeafHandler, Route, RouteTable,
    RouteTarget, Schema,
};
pub use crate::router::{router_root, DispatchResult, RootRoutes, Router, RouterBuilder};

pub mod prelude {
    pub use crate::context::{self, RequestContext};
    pub use crate::error::*;
    pub use crate::route::*;
    pub use crate::router::*;
    pub use crate::types::*;
}
