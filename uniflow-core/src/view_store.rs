//! View stores and derived bindings
//!
//! A [`ViewStore`] mirrors the most recently published state of a store so a
//! rendering layer can read it synchronously, and turns "two-way binding"
//! style mutation back into unidirectional dispatch: a [`Binding`] couples a
//! getter over the mirrored state with a setter that sends an action built
//! from the new value. The binding is a convenience, never a second source
//! of truth.
//!
//! # Example
//!
//! ```ignore
//! let view = ViewStore::new(&store);
//! let stepper = view.binding(|s| s.count, Action::StepperChanged);
//!
//! stepper.set(5);                 // == store.send(Action::StepperChanged(5))
//! assert_eq!(stepper.get(), 5);   // reflects the published state
//! ```

use std::sync::{Arc, Mutex};

use crate::action::Action;
use crate::store::{lock, Store, Subscription};

/// A read-plus-dispatch projection of a store for rendering layers.
///
/// Holds a clone of the most recently published state, kept current by its
/// own subscription. All writes go through [`ViewStore::send`].
pub struct ViewStore<S, A> {
    store: Store<S, A>,
    current: Arc<Mutex<S>>,
    _subscription: Subscription,
}

impl<S, A> ViewStore<S, A>
where
    S: Clone + Send + 'static,
    A: Action,
{
    /// Attach a view store to a store (root or scoped).
    pub fn new(store: &Store<S, A>) -> Self {
        let current = Arc::new(Mutex::new(store.state()));
        let mirror = Arc::clone(&current);
        let subscription = store.subscribe(move |state: &S| {
            *lock(&mirror) = state.clone();
        });
        Self {
            store: store.clone(),
            current,
            _subscription: subscription,
        }
    }

    /// The most recently published state.
    pub fn state(&self) -> S {
        lock(&self.current).clone()
    }

    /// Dispatch an action to the underlying store.
    pub fn send(&self, action: A) {
        self.store.send(action);
    }

    /// Derive a binding from a getter and an action constructor.
    ///
    /// Reading the binding projects the most recently published state;
    /// writing it dispatches `set(new_value)` — exactly equivalent to
    /// calling [`ViewStore::send`] yourself.
    pub fn binding<V>(
        &self,
        get: impl Fn(&S) -> V + Send + Sync + 'static,
        set: impl Fn(V) -> A + Send + Sync + 'static,
    ) -> Binding<V>
    where
        V: 'static,
    {
        let current = Arc::clone(&self.current);
        let store = self.store.clone();
        Binding {
            read: Arc::new(move || get(&lock(&current))),
            write: Arc::new(move |value| store.send(set(value))),
        }
    }
}

/// A getter/setter pair derived from a [`ViewStore`].
///
/// Cloning shares the underlying store handle.
pub struct Binding<V> {
    read: Arc<dyn Fn() -> V + Send + Sync>,
    write: Arc<dyn Fn(V) + Send + Sync>,
}

impl<V> Clone for Binding<V> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}

impl<V> Binding<V> {
    /// Read the bound value from the most recently published state.
    pub fn get(&self) -> V {
        (self.read)()
    }

    /// Dispatch the constructed action with the new value.
    pub fn set(&self, value: V) {
        (self.write)(value);
    }
}
