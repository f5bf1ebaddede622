//! Action trait for type-safe state transitions

use std::fmt::Debug;

/// Marker trait for actions that can be sent to a store
///
/// Actions describe what happened, never how to react. They should be:
/// - Clone: `combine` feeds the same action to several reducers
/// - Debug: for tracing and test output
/// - Send + 'static: effect completions cross task boundaries
///
/// The trait is blanket-implemented for every type meeting the bounds;
/// plain `enum`s deriving `Clone` and `Debug` qualify automatically.
pub trait Action: Clone + Debug + Send + 'static {}

impl<T: Clone + Debug + Send + 'static> Action for T {}
