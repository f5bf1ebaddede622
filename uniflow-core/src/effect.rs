//! Effects: declarative descriptions of asynchronous work
//!
//! Reducers never perform side effects themselves. They return an [`Effect`]
//! describing the work to be done, and the store executes it, feeding any
//! resulting actions back through the same dispatch cycle.
//!
//! An effect is one of a small number of shapes:
//!
//! - [`Effect::none`]: completes immediately with no result
//! - [`Effect::action`]: immediate feedback, one action queued synchronously
//! - [`Effect::future`]: one action after a suspension
//! - [`Effect::fire_and_forget`]: runs to completion, produces no action
//! - [`Effect::after`]: a delay followed by one action
//! - [`Effect::stream`]: zero or more actions over time
//! - [`Effect::cancel`]: terminates in-flight effects registered under an id
//!
//! Any effect can be tagged with a cancellation identity via
//! [`Effect::cancellable`]. The store keeps a registry of in-flight handles
//! keyed by [`EffectId`]; executing `Effect::cancel(id)` stops every effect
//! registered under that id and guarantees none of its results are delivered
//! afterwards, even if the underlying work had already buffered them.
//!
//! # Example
//!
//! ```ignore
//! fn reducer(state: &mut State, action: Action, env: &Env) -> Effect<Action> {
//!     match action {
//!         Action::FactRequested => {
//!             state.in_flight = true;
//!             let fact = (env.fact)(state.count);
//!             Effect::future(async move { Action::FactResponse(fact.await) })
//!                 .cancellable("fact")
//!         }
//!         Action::CancelTapped => {
//!             state.in_flight = false;
//!             Effect::cancel("fact")
//!         }
//!         Action::FactResponse(result) => {
//!             state.in_flight = false;
//!             state.fact = result.ok();
//!             Effect::none()
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};

use crate::action::Action;

/// Identifies an in-flight effect for cancellation.
///
/// Ids are opaque, equality-comparable keys. Issuing a new effect under an id
/// that is already in flight does *not* cancel the previous one — both race,
/// and `Effect::cancel(id)` terminates all of them. Cancellation is always
/// explicit; reducers that want at-most-one-in-flight emit a cancel for the
/// old id alongside the new effect.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EffectId(String);

impl EffectId {
    /// Create a new effect id.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the id name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EffectId {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EffectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A unit of deferred work returned by a reducer.
///
/// Effects are inert values until the store executes them. See the module
/// docs for the available shapes.
pub struct Effect<A> {
    pub(crate) kind: EffectKind<A>,
}

pub(crate) enum EffectKind<A> {
    None,
    Action(A),
    Future(BoxFuture<'static, Option<A>>),
    Stream(BoxStream<'static, A>),
    Cancellable {
        id: EffectId,
        inner: Box<Effect<A>>,
    },
    Cancel(EffectId),
    Merge(Vec<Effect<A>>),
}

impl<A: Action> Effect<A> {
    /// An effect that completes immediately with no result.
    pub fn none() -> Self {
        Self {
            kind: EffectKind::None,
        }
    }

    /// An effect that feeds one action straight back into the store.
    ///
    /// The action is queued and processed before the triggering `send`
    /// returns, after the current action finishes reducing.
    pub fn action(action: A) -> Self {
        Self {
            kind: EffectKind::Action(action),
        }
    }

    /// An effect that produces exactly one action when the future resolves.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self {
            kind: EffectKind::Future(future.map(Some).boxed()),
        }
    }

    /// An effect that runs to completion without producing an action.
    pub fn fire_and_forget<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            kind: EffectKind::Future(future.map(|()| None).boxed()),
        }
    }

    /// An effect that delivers `action` after `delay`.
    ///
    /// Useful for debounced retries and timer-driven follow-ups.
    pub fn after(delay: Duration, action: A) -> Self {
        Self::future(async move {
            tokio::time::sleep(delay).await;
            action
        })
    }

    /// An effect that produces zero or more actions over time.
    ///
    /// The effect completes when the stream ends or is cancelled.
    pub fn stream<S>(stream: S) -> Self
    where
        S: futures::Stream<Item = A> + Send + 'static,
    {
        Self {
            kind: EffectKind::Stream(stream.boxed()),
        }
    }

    /// The distinguished cancel effect.
    ///
    /// When executed, every in-flight effect registered under `id` is
    /// terminated and no further results from it are delivered. Cancelling an
    /// id with nothing registered is a no-op.
    pub fn cancel(id: impl Into<EffectId>) -> Self {
        Self {
            kind: EffectKind::Cancel(id.into()),
        }
    }

    /// Run several effects concurrently as one.
    ///
    /// Empty members are dropped; merging nothing yields [`Effect::none`].
    pub fn merge(effects: impl IntoIterator<Item = Self>) -> Self {
        let mut merged: Vec<Self> = effects
            .into_iter()
            .filter(|effect| !effect.is_none())
            .collect();
        match merged.len() {
            0 => Self::none(),
            1 => merged.remove(0),
            _ => Self {
                kind: EffectKind::Merge(merged),
            },
        }
    }

    /// Tag this effect with a cancellation identity.
    ///
    /// The store registers a handle under `id` while the effect is in
    /// flight. Tagging [`Effect::none`] is a no-op.
    pub fn cancellable(self, id: impl Into<EffectId>) -> Self {
        if self.is_none() {
            return self;
        }
        Self {
            kind: EffectKind::Cancellable {
                id: id.into(),
                inner: Box::new(self),
            },
        }
    }

    /// Whether this effect is the terminal no-op.
    pub fn is_none(&self) -> bool {
        matches!(self.kind, EffectKind::None)
    }

    /// Transform every action this effect produces.
    ///
    /// This is how `pullback` re-embeds a child feature's effect results as
    /// parent actions: when they flow back into the store, the same case
    /// match reconstructs the path to the same sub-state.
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        B: Action,
        F: Fn(A) -> B + Clone + Send + Sync + 'static,
    {
        let kind = match self.kind {
            EffectKind::None => EffectKind::None,
            EffectKind::Action(action) => EffectKind::Action(f(action)),
            EffectKind::Future(future) => {
                EffectKind::Future(future.map(move |output| output.map(f)).boxed())
            }
            EffectKind::Stream(stream) => EffectKind::Stream(stream.map(f).boxed()),
            EffectKind::Cancellable { id, inner } => EffectKind::Cancellable {
                id,
                inner: Box::new(inner.map(f)),
            },
            EffectKind::Cancel(id) => EffectKind::Cancel(id),
            EffectKind::Merge(effects) => EffectKind::Merge(
                effects
                    .into_iter()
                    .map(|effect| effect.map(f.clone()))
                    .collect(),
            ),
        };
        Effect { kind }
    }
}

impl<A> EffectKind<A> {
    fn label(&self) -> &'static str {
        match self {
            EffectKind::None => "none",
            EffectKind::Action(_) => "action",
            EffectKind::Future(_) => "future",
            EffectKind::Stream(_) => "stream",
            EffectKind::Cancellable { .. } => "cancellable",
            EffectKind::Cancel(_) => "cancel",
            EffectKind::Merge(_) => "merge",
        }
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EffectKind::Cancellable { id, inner } => f
                .debug_struct("Effect")
                .field("kind", &self.kind.label())
                .field("id", &id.name())
                .field("inner", &inner)
                .finish(),
            EffectKind::Cancel(id) => f
                .debug_struct("Effect")
                .field("kind", &self.kind.label())
                .field("id", &id.name())
                .finish(),
            EffectKind::Merge(effects) => f
                .debug_struct("Effect")
                .field("kind", &self.kind.label())
                .field("effects", &effects)
                .finish(),
            _ => f
                .debug_struct("Effect")
                .field("kind", &self.kind.label())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Child {
        Done,
    }

    #[test]
    fn test_effect_id() {
        let a = EffectId::new("fact");
        let b = EffectId::from("fact");
        let c: EffectId = "fact".into();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.name(), "fact");
    }

    #[test]
    fn test_none_is_none() {
        assert!(Effect::<Child>::none().is_none());
        assert!(!Effect::action(Child::Done).is_none());
    }

    #[test]
    fn test_merge_drops_empty_members() {
        let merged = Effect::merge([Effect::<Child>::none(), Effect::none()]);
        assert!(merged.is_none());

        let merged = Effect::merge([Effect::none(), Effect::action(Child::Done)]);
        assert!(matches!(merged.kind, EffectKind::Action(Child::Done)));

        let merged = Effect::merge([
            Effect::action(Child::Done),
            Effect::action(Child::Done),
        ]);
        assert!(matches!(&merged.kind, EffectKind::Merge(effects) if effects.len() == 2));
    }

    #[test]
    fn test_cancellable_none_is_noop() {
        let effect = Effect::<Child>::none().cancellable("id");
        assert!(effect.is_none());
    }

    #[test]
    fn test_map_embeds_actions() {
        let effect = Effect::action(Child::Done).map(Parent::Child);
        assert!(matches!(
            effect.kind,
            EffectKind::Action(Parent::Child(Child::Done))
        ));
    }

    #[test]
    fn test_map_preserves_cancellation_identity() {
        let effect = Effect::action(Child::Done)
            .cancellable("fact")
            .map(Parent::Child);
        match effect.kind {
            EffectKind::Cancellable { id, inner } => {
                assert_eq!(id.name(), "fact");
                assert!(matches!(
                    inner.kind,
                    EffectKind::Action(Parent::Child(Child::Done))
                ));
            }
            other => panic!("expected cancellable, got {:?}", other.label()),
        }

        let effect = Effect::<Child>::cancel("fact").map(Parent::Child);
        assert!(matches!(effect.kind, EffectKind::Cancel(id) if id.name() == "fact"));
    }
}
