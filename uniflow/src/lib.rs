//! uniflow: composable unidirectional state management
//!
//! Build features as pure reducers over their own state, action, and
//! environment types; assemble them with `combine` and `pullback`; hold the
//! result in a single `Store` that serializes every transition and runs
//! cancellable asynchronous effects.
//!
//! # Example
//! ```ignore
//! use uniflow::prelude::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct App {
//!     counter1: Counter,
//!     counter2: Counter,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Counter1(CounterAction),
//!     Counter2(CounterAction),
//! }
//!
//! let reducer = Reducer::combine([
//!     counter_reducer().pullback(
//!         |s: &mut App| &mut s.counter1,
//!         |a| match a { AppAction::Counter1(a) => Some(a), _ => None },
//!         AppAction::Counter1,
//!         |_| CounterEnv,
//!     ),
//!     counter_reducer().pullback(
//!         |s: &mut App| &mut s.counter2,
//!         |a| match a { AppAction::Counter2(a) => Some(a), _ => None },
//!         AppAction::Counter2,
//!         |_| CounterEnv,
//!     ),
//! ]);
//!
//! let store = Store::new(App::default(), reducer, ());
//! let counter1 = store.scope(|s| s.counter1.clone(), AppAction::Counter1);
//! ```

// Re-export everything from core
pub use uniflow_core::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use uniflow_core::{
        Action, Binding, Effect, EffectId, Reducer, Store, Subscription, ViewStore,
    };
}
