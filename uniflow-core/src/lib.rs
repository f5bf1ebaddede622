//! Core types for uniflow
//!
//! This crate provides the runtime for building applications with composable,
//! unidirectional state management: a Redux/Elm-style dispatch cycle with
//! structurally composed reducers and identity-cancellable effects.
//!
//! # Core Concepts
//!
//! - **Action**: inert data describing what happened
//! - **Reducer**: pure transition `(state, action, environment) -> effect`,
//!   composed with `combine` and `pullback`
//! - **Effect**: declarative asynchronous work that redelivers actions
//! - **Store**: the single owner of a state value, serializing every
//!   transition and running effects
//! - **Scope / ViewStore**: narrowed, non-owning views for sub-components
//!
//! # Basic Example
//!
//! ```ignore
//! use uniflow_core::prelude::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct Counter { count: i64 }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction { Increment, Decrement }
//!
//! let reducer: Reducer<Counter, CounterAction, ()> =
//!     Reducer::new(|state, action, _| {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!             CounterAction::Decrement => state.count -= 1,
//!         }
//!         Effect::none()
//!     });
//!
//! let store = Store::new(Counter::default(), reducer, ());
//! store.send(CounterAction::Increment);
//! assert_eq!(store.state().count, 1);
//! ```
//!
//! # The dispatch cycle
//!
//! An external event produces an action and hands it to [`Store::send`]. The
//! store runs the composed root reducer against the current state with the
//! bound environment, installs the new state, notifies subscribers, and
//! starts any returned effect. Effects run as tokio tasks; when one produces
//! a value it re-enters through the same `send` entry point, so every result
//! rejoins the single reducer/state cycle. Reducer code never blocks or
//! awaits — only effects do, off to the side.
//!
//! Cancellation is a keyed registry, not structured task teardown: tag an
//! effect with [`Effect::cancellable`], terminate it later with
//! [`Effect::cancel`]. Re-issuing under a live id races the prior effect;
//! superseding is always an explicit cancel.

pub mod action;
pub mod effect;
pub mod reducer;
pub mod store;
pub mod testing;
pub mod view_store;

// Core trait exports
pub use action::Action;

// Effect exports
pub use effect::{Effect, EffectId};

// Reducer exports
pub use reducer::Reducer;

// Store exports
pub use store::{Store, Subscription};

// View store exports
pub use view_store::{Binding, ViewStore};

// Testing exports
pub use testing::{settle, StateRecorder};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::effect::{Effect, EffectId};
    pub use crate::reducer::Reducer;
    pub use crate::store::{Store, Subscription};
    pub use crate::view_store::{Binding, ViewStore};
}
