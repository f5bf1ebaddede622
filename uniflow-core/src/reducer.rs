//! Reducers and structural composition
//!
//! A [`Reducer`] is a pure transition function `(state, action, environment)
//! -> effect`. Reducers mutate the state they are handed in place, return an
//! [`Effect`] describing any follow-up work, and never perform side effects
//! directly.
//!
//! Composition is structural, not dynamic: [`Reducer::combine`] runs several
//! reducers over the same state within one transition, and
//! [`Reducer::pullback`] lifts a reducer written against a sub-state and
//! sub-action into one operating on the containing feature. Composed reducers
//! are themselves reducers, so whole applications assemble from independent
//! features by plain value composition.
//!
//! # Example
//!
//! ```ignore
//! let two_counters = Reducer::combine([
//!     counter_reducer().pullback(
//!         |s: &mut TwoCounters| &mut s.counter1,
//!         |a| match a { TwoCountersAction::Counter1(a) => Some(a), _ => None },
//!         TwoCountersAction::Counter1,
//!         |_| CounterEnv,
//!     ),
//!     counter_reducer().pullback(
//!         |s: &mut TwoCounters| &mut s.counter2,
//!         |a| match a { TwoCountersAction::Counter2(a) => Some(a), _ => None },
//!         TwoCountersAction::Counter2,
//!         |_| CounterEnv,
//!     ),
//! ]);
//! ```

use std::sync::Arc;

use crate::action::Action;
use crate::effect::Effect;

/// A composable state-transition function.
///
/// Reducers are cheaply cloneable values; cloning shares the underlying
/// closure. State is never owned by a reducer — it lives in the store (or in
/// a parent feature's state struct for embedded sub-state).
///
/// # Type Parameters
/// * `S` - The state this reducer operates on
/// * `A` - The action type it recognizes
/// * `E` - The environment (dependency bag) it reads from
pub struct Reducer<S, A, E> {
    reduce: Arc<dyn Fn(&mut S, A, &E) -> Effect<A> + Send + Sync>,
}

impl<S, A, E> Clone for Reducer<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            reduce: Arc::clone(&self.reduce),
        }
    }
}

impl<S, A, E> Reducer<S, A, E>
where
    S: 'static,
    A: Action,
    E: 'static,
{
    /// Create a reducer from a transition closure.
    pub fn new(reduce: impl Fn(&mut S, A, &E) -> Effect<A> + Send + Sync + 'static) -> Self {
        Self {
            reduce: Arc::new(reduce),
        }
    }

    /// A reducer that ignores every action.
    ///
    /// The identity for [`Reducer::combine`].
    pub fn empty() -> Self {
        Self::new(|_, _, _| Effect::none())
    }

    /// Run one transition.
    pub fn reduce(&self, state: &mut S, action: A, environment: &E) -> Effect<A> {
        (self.reduce)(state, action, environment)
    }

    /// Run several reducers in listed order against the same state.
    ///
    /// Each reducer sees the field writes of the ones before it within a
    /// single invocation. The resulting effect is the merge of every returned
    /// effect — all run concurrently, none depends on another's output.
    pub fn combine(reducers: impl IntoIterator<Item = Self>) -> Self {
        let reducers: Vec<Self> = reducers.into_iter().collect();
        Self::new(move |state, action, environment| {
            let mut effects = Vec::with_capacity(reducers.len());
            for reducer in &reducers {
                effects.push(reducer.reduce(state, action.clone(), environment));
            }
            Effect::merge(effects)
        })
    }

    /// Lift this reducer into a containing parent domain.
    ///
    /// * `state` addresses the embedded sub-state field (the key-path analog)
    /// * `extract` matches the embedded action case; a non-match makes the
    ///   lifted reducer a no-op returning an empty effect
    /// * `embed` wraps child actions back into the parent action, so effect
    ///   results re-enter the store on the same path
    /// * `environment` derives the child dependency bag from the parent's
    pub fn pullback<PS, PA, PE>(
        self,
        state: impl for<'a> Fn(&'a mut PS) -> &'a mut S + Send + Sync + 'static,
        extract: impl Fn(PA) -> Option<A> + Send + Sync + 'static,
        embed: impl Fn(A) -> PA + Send + Sync + 'static,
        environment: impl Fn(&PE) -> E + Send + Sync + 'static,
    ) -> Reducer<PS, PA, PE>
    where
        PS: 'static,
        PA: Action,
        PE: 'static,
    {
        let embed = Arc::new(embed);
        Reducer::new(move |parent_state, parent_action, parent_environment| {
            let Some(child_action) = extract(parent_action) else {
                return Effect::none();
            };
            let child_environment = environment(parent_environment);
            let effect = self.reduce(state(parent_state), child_action, &child_environment);
            let embed = Arc::clone(&embed);
            effect.map(move |action| embed(action))
        })
    }

    /// Lift this reducer over optional state.
    ///
    /// Absence is a valid steady state: when the state is `None`, the action
    /// is dropped without invoking the child reducer. Composes with
    /// [`Reducer::pullback`] for features that are only conditionally
    /// present.
    pub fn optional(self) -> Reducer<Option<S>, A, E> {
        Reducer::new(move |state: &mut Option<S>, action, environment| match state {
            Some(state) => self.reduce(state, action, environment),
            None => {
                tracing::debug!(action = ?action, "dropping action for absent optional state");
                Effect::none()
            }
        })
    }
}
