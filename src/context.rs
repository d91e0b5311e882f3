//! Ambient per-request context.
//!
//! The router wraps each dispatch in [`run`], which makes the current
//! [`Interaction`] and the caller's extra value (e.g. the resolved game for
//! the guild) visible to every handler invoked during that request through
//! [`current`], [`interaction`], and [`extra`], without threading a parameter
//! through the route tree.
//!
//! Storage is a tokio task-local bound to the future passed to [`run`], so the
//! value follows the request across `.await` points and concurrent requests
//! never see each other's context. A nested [`run`] shadows the outer value
//! for its own extent. Tasks spawned from a handler do not inherit the
//! context; clone the [`RequestContext`] into them and call [`run`] again if
//! they need it.

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::ContextError;
use crate::types::Interaction;

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// The interaction being handled plus caller-supplied extra state.
#[derive(Clone)]
pub struct RequestContext {
    interaction: Arc<Interaction>,
    extra: Arc<dyn Any + Send + Sync>,
}

impl RequestContext {
    pub fn new<C: Send + Sync + 'static>(interaction: Interaction, extra: C) -> Self {
        Self::shared(Arc::new(interaction), extra)
    }

    /// Same as [`RequestContext::new`] for an interaction that is already
    /// shared with the caller.
    pub fn shared<C: Send + Sync + 'static>(interaction: Arc<Interaction>, extra: C) -> Self {
        Self {
            interaction,
            extra: Arc::new(extra),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// The extra value, if it is a `C`.
    pub fn extra<C: Send + Sync + 'static>(&self) -> Result<Arc<C>, ContextError> {
        Arc::clone(&self.extra)
            .downcast::<C>()
            .map_err(|_| ContextError::ExtraType {
                expected: type_name::<C>(),
            })
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("interaction", &self.interaction.kind())
            .finish_non_exhaustive()
    }
}

/// Run `body` with `ctx` as the current request context.
pub async fn run<F: Future>(ctx: RequestContext, body: F) -> F::Output {
    CURRENT.scope(ctx, body).await
}

/// The active request context.
pub fn current() -> Result<RequestContext, ContextError> {
    CURRENT.try_with(Clone::clone).map_err(|_| ContextError::Missing)
}

/// The interaction of the active request.
pub fn interaction() -> Result<Arc<Interaction>, ContextError> {
    CURRENT
        .try_with(|ctx| Arc::clone(&ctx.interaction))
        .map_err(|_| ContextError::Missing)
}

/// The extra value of the active request.
pub fn extra<C: Send + Sync + 'static>() -> Result<Arc<C>, ContextError> {
    current()?.extra::<C>()
}

pub fn is_active() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Game {
        id: u32,
    }

    fn ctx(id: u32) -> RequestContext {
        RequestContext::new(Interaction::Ping, Game { id })
    }

    #[test]
    fn outside_run_is_missing() {
        assert!(!is_active());
        assert_eq!(current().unwrap_err(), ContextError::Missing);
        assert_eq!(extra::<Game>().unwrap_err(), ContextError::Missing);
        assert!(interaction().is_err());
    }

    #[tokio::test]
    async fn inside_run_sees_value_across_awaits() {
        run(ctx(1), async {
            assert!(is_active());
            tokio::task::yield_now().await;
            assert_eq!(extra::<Game>().unwrap().id, 1);
            assert_eq!(*interaction().unwrap(), Interaction::Ping);
        })
        .await;
        assert!(!is_active());
    }

    #[tokio::test]
    async fn nested_run_shadows_outer() {
        run(ctx(1), async {
            run(ctx(2), async {
                assert_eq!(extra::<Game>().unwrap().id, 2);
            })
            .await;
            assert_eq!(extra::<Game>().unwrap().id, 1);
        })
        .await;
    }

    #[tokio::test]
    async fn concurrent_runs_are_isolated() {
        async fn observe(id: u32) -> Vec<u32> {
            run(ctx(id), async {
                let mut seen = Vec::new();
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                    seen.push(extra::<Game>().unwrap().id);
                }
                seen
            })
            .await
        }

        let (a, b) = tokio::join!(observe(1), observe(2));
        assert_eq!(a, vec![1; 5]);
        assert_eq!(b, vec![2; 5]);
    }

    #[tokio::test]
    async fn wrong_extra_type_is_reported() {
        run(ctx(1), async {
            let err = extra::<String>().unwrap_err();
            assert!(matches!(err, ContextError::ExtraType { .. }));
        })
        .await;
    }

    #[tokio::test]
    async fn spawned_tasks_do_not_inherit() {
        run(ctx(1), async {
            let inherited = tokio::spawn(async { is_active() }).await.unwrap();
            assert!(!inherited);
        })
        .await;
    }
}
