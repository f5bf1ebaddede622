//! Test utilities for uniflow applications
//!
//! - [`StateRecorder`]: an observer that records every published state
//! - [`settle`]: yield to the runtime so spawned effects get to deliver
//! - Time control helpers (behind the `testing-time` feature) for testing
//!   delayed and debounced effects deterministically
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(Counter::default(), counter_reducer(), ());
//! let (recorder, _sub) = StateRecorder::attach(&store);
//!
//! store.send(CounterAction::Increment);
//! store.send(CounterAction::Decrement);
//!
//! assert_eq!(recorder.states().len(), 2);
//! ```

use std::sync::{Arc, Mutex};

use crate::action::Action;
use crate::store::{lock, Store, Subscription};

/// Records every state a store publishes.
///
/// Attach one in a test, drive the store, then assert on the recorded
/// sequence. The recorder observes only; it never dispatches.
pub struct StateRecorder<S> {
    states: Arc<Mutex<Vec<S>>>,
}

impl<S> StateRecorder<S>
where
    S: Clone + Send + 'static,
{
    /// Subscribe a recorder to `store`.
    ///
    /// The recorder stops receiving states when the returned subscription is
    /// dropped.
    pub fn attach<A: Action>(store: &Store<S, A>) -> (Self, Subscription) {
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&states);
        let subscription = store.subscribe(move |state: &S| {
            lock(&sink).push(state.clone());
        });
        (Self { states }, subscription)
    }

    /// All recorded states, oldest first.
    pub fn states(&self) -> Vec<S> {
        lock(&self.states).clone()
    }

    /// The most recently recorded state.
    pub fn last(&self) -> Option<S> {
        lock(&self.states).last().cloned()
    }

    /// Number of recorded states.
    pub fn len(&self) -> usize {
        lock(&self.states).len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        lock(&self.states).is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.states).clear();
    }
}

/// Yield to the runtime so already-scheduled effect tasks can run and
/// deliver their results.
///
/// Useful on a current-thread test runtime after an action whose effect
/// completes without a timer.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Pause tokio's clock (requires a current-thread runtime).
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume tokio's clock after [`pause_time`].
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Advance tokio's paused clock, firing any timers that come due.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: std::time::Duration) {
    tokio::time::advance(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;
    use crate::reducer::Reducer;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        count: i64,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CounterAction {
        Increment,
        Decrement,
    }

    fn counter() -> Reducer<Counter, CounterAction, ()> {
        Reducer::new(|state: &mut Counter, action, _| {
            match action {
                CounterAction::Increment => state.count += 1,
                CounterAction::Decrement => state.count -= 1,
            }
            Effect::none()
        })
    }

    #[test]
    fn test_recorder_captures_in_order() {
        let store = Store::new(Counter::default(), counter(), ());
        let (recorder, _sub) = StateRecorder::attach(&store);

        store.send(CounterAction::Increment);
        store.send(CounterAction::Increment);
        store.send(CounterAction::Decrement);

        assert_eq!(
            recorder.states(),
            vec![
                Counter { count: 1 },
                Counter { count: 2 },
                Counter { count: 1 },
            ]
        );
        assert_eq!(recorder.last(), Some(Counter { count: 1 }));
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn test_recorder_stops_with_subscription() {
        let store = Store::new(Counter::default(), counter(), ());
        let (recorder, sub) = StateRecorder::attach(&store);

        store.send(CounterAction::Increment);
        sub.dispose();
        store.send(CounterAction::Increment);

        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_recorder_clear() {
        let store = Store::new(Counter::default(), counter(), ());
        let (recorder, _sub) = StateRecorder::attach(&store);

        store.send(CounterAction::Increment);
        recorder.clear();

        assert!(recorder.is_empty());
    }
}
