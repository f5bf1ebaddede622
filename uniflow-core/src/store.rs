//! Store: single owner of state, serializing transitions and effects
//!
//! A [`Store`] holds exactly one state value. Every mutation flows through
//! [`Store::send`]: the bound root reducer runs against the current state,
//! subscribers are notified with the new state, and any returned effect is
//! started. Effects run as tokio tasks off to the side; their results
//! re-enter through the same `send` path, so every completion rejoins the
//! single reducer/state cycle.
//!
//! Processing is strictly serialized through an internal action queue.
//! Re-entrant sends — from an observer callback, or an effect that completes
//! synchronously — are enqueued and fully drained before the outermost `send`
//! returns. A multi-threaded host needs no extra synchronization: the queue
//! and state locks funnel every transition through one logical context.
//!
//! [`Store::scope`] derives a narrowed handle over a sub-state and sub-action
//! pair. A scope owns nothing: sends are embedded and forwarded to the
//! parent, and every state read re-projects from the parent's current value.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(Counter::default(), counter_reducer(), CounterEnv);
//! let _sub = store.subscribe(|state: &Counter| println!("count = {}", state.count));
//! store.send(CounterAction::Increment);
//! assert_eq!(store.state().count, 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::effect::{Effect, EffectId, EffectKind};
use crate::reducer::Reducer;

/// Lock a mutex, tolerating poisoning.
///
/// A panicking reducer can poison the state lock mid-transition; the store
/// keeps serving whatever state the reducer left behind rather than turning
/// every later access into a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Erased store backend: either a root store or a scope onto one.
trait Driver<S, A>: Send + Sync {
    fn send(&self, action: A);
    fn subscribe(&self, observer: Observer<S>) -> Subscription;
    fn with_state(&self, f: &mut dyn FnMut(&S));
}

/// Tracks one registered cancellation handle; removes its registry entry
/// when the last task or queued result referencing it is done.
struct Registration<S, A> {
    root: Weak<Root<S, A>>,
    id: EffectId,
    seq: u64,
    // Keeps an enclosing cancellable registration alive while nested work
    // under a different id is still in flight.
    _parent: Option<Arc<Registration<S, A>>>,
}

impl<S, A> Drop for Registration<S, A> {
    fn drop(&mut self) {
        if let Some(root) = self.root.upgrade() {
            root.remove_registration(&self.id, self.seq);
        }
    }
}

/// Where a queued action came from. Results of cancellable effects carry
/// their token so cancelled output can be dropped at the delivery boundary.
struct Provenance<S, A> {
    token: CancellationToken,
    registration: Option<Arc<Registration<S, A>>>,
}

impl<S, A> Clone for Provenance<S, A> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            registration: self.registration.clone(),
        }
    }
}

struct Envelope<S, A> {
    action: A,
    provenance: Option<Provenance<S, A>>,
}

struct Queue<S, A> {
    items: VecDeque<Envelope<S, A>>,
    draining: bool,
}

struct Core<S, A> {
    state: S,
    reduce: Box<dyn Fn(&mut S, A) -> Effect<A> + Send>,
    in_flight: HashMap<EffectId, Vec<(u64, CancellationToken)>>,
    next_seq: u64,
}

struct Subscribers<S> {
    entries: Vec<(u64, Observer<S>)>,
    next_id: u64,
}

/// The root driver: owns the state, the bound reducer, the in-flight effect
/// registry, and the subscriber list.
struct Root<S, A> {
    weak_self: Weak<Root<S, A>>,
    queue: Mutex<Queue<S, A>>,
    core: Mutex<Core<S, A>>,
    subscribers: Mutex<Subscribers<S>>,
}

impl<S, A> Root<S, A>
where
    S: Clone + Send + 'static,
    A: Action,
{
    fn new(state: S, reduce: Box<dyn Fn(&mut S, A) -> Effect<A> + Send>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            queue: Mutex::new(Queue {
                items: VecDeque::new(),
                draining: false,
            }),
            core: Mutex::new(Core {
                state,
                reduce,
                in_flight: HashMap::new(),
                next_seq: 0,
            }),
            subscribers: Mutex::new(Subscribers {
                entries: Vec::new(),
                next_id: 0,
            }),
        })
    }

    /// Queue an action; if no drain is in progress, drain until empty.
    ///
    /// The draining flag guarantees a single drainer at a time, which is
    /// what serializes every transition. Re-entrant calls (observers,
    /// synchronous effect feedback) hit the `draining` fast path and their
    /// actions are processed by the already-running drain.
    fn enqueue(&self, envelope: Envelope<S, A>) {
        {
            let mut queue = lock(&self.queue);
            queue.items.push_back(envelope);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let envelope = {
                let mut queue = lock(&self.queue);
                match queue.items.pop_front() {
                    Some(envelope) => envelope,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };

            // At-most-one delivery: results of a cancelled effect are dropped
            // here even if the producing task had already handed them off.
            if envelope
                .provenance
                .as_ref()
                .is_some_and(|provenance| provenance.token.is_cancelled())
            {
                tracing::trace!(action = ?envelope.action, "dropping result of cancelled effect");
                continue;
            }

            let Envelope { action, provenance } = envelope;
            let (effect, notification) = {
                let mut core = lock(&self.core);
                let core = &mut *core;
                tracing::trace!(action = ?action, "reducing");
                let effect = (core.reduce)(&mut core.state, action);

                // Snapshot the subscribers and the new state. The single
                // drainer is the only mutator, so the snapshot stays the
                // published state for this action once the lock is released.
                let observers: Vec<Observer<S>> = lock(&self.subscribers)
                    .entries
                    .iter()
                    .map(|(_, observer)| Arc::clone(observer))
                    .collect();
                let notification =
                    (!observers.is_empty()).then(|| (core.state.clone(), observers));
                (effect, notification)
            };

            // New state is installed and published before effects start.
            // No lock is held here: observers may read the store, send, and
            // manage subscriptions freely.
            if let Some((state, observers)) = notification {
                for observer in observers {
                    observer(&state);
                }
            }

            // Effects returned for a delivered result are new work; they do
            // not inherit the result's cancellation identity.
            drop(provenance);
            self.run_effect(effect, None);
        }
    }

    fn run_effect(&self, effect: Effect<A>, provenance: Option<Provenance<S, A>>) {
        match effect.kind {
            EffectKind::None => {}

            EffectKind::Action(action) => self.enqueue(Envelope { action, provenance }),

            EffectKind::Future(future) => {
                let root = self.weak_self.clone();
                tokio::spawn(async move {
                    let output = match &provenance {
                        Some(provenance) => tokio::select! {
                            _ = provenance.token.cancelled() => None,
                            output = future => output,
                        },
                        None => future.await,
                    };
                    if let Some(action) = output {
                        if let Some(root) = root.upgrade() {
                            root.enqueue(Envelope { action, provenance });
                        }
                    }
                });
            }

            EffectKind::Stream(stream) => {
                let root = self.weak_self.clone();
                tokio::spawn(async move {
                    let mut stream = stream;
                    loop {
                        let next = match &provenance {
                            Some(provenance) => tokio::select! {
                                _ = provenance.token.cancelled() => None,
                                next = stream.next() => next,
                            },
                            None => stream.next().await,
                        };
                        let Some(action) = next else { break };
                        let Some(root) = root.upgrade() else { break };
                        root.enqueue(Envelope {
                            action,
                            provenance: provenance.clone(),
                        });
                    }
                });
            }

            EffectKind::Cancellable { id, inner } => {
                // A child token: cancelling an enclosing identity also stops
                // work tagged with this one.
                let token = match &provenance {
                    Some(provenance) => provenance.token.child_token(),
                    None => CancellationToken::new(),
                };
                let registration = {
                    let mut core = lock(&self.core);
                    let seq = core.next_seq;
                    core.next_seq += 1;
                    core.in_flight
                        .entry(id.clone())
                        .or_default()
                        .push((seq, token.clone()));
                    Arc::new(Registration {
                        root: self.weak_self.clone(),
                        id: id.clone(),
                        seq,
                        _parent: provenance.and_then(|provenance| provenance.registration),
                    })
                };
                tracing::trace!(id = %id.name(), "registered cancellable effect");
                self.run_effect(
                    *inner,
                    Some(Provenance {
                        token,
                        registration: Some(registration),
                    }),
                );
            }

            EffectKind::Cancel(id) => {
                let removed = lock(&self.core).in_flight.remove(&id);
                match removed {
                    Some(handles) => {
                        tracing::debug!(id = %id.name(), count = handles.len(), "cancelling in-flight effects");
                        for (_, token) in handles {
                            token.cancel();
                        }
                    }
                    None => {
                        tracing::trace!(id = %id.name(), "cancel for unregistered effect id");
                    }
                }
            }

            EffectKind::Merge(effects) => {
                for effect in effects {
                    self.run_effect(effect, provenance.clone());
                }
            }
        }
    }

}

impl<S, A> Root<S, A> {
    fn remove_registration(&self, id: &EffectId, seq: u64) {
        let mut core = lock(&self.core);
        if let Some(handles) = core.in_flight.get_mut(id) {
            handles.retain(|(registered, _)| *registered != seq);
            if handles.is_empty() {
                core.in_flight.remove(id);
            }
        }
    }
}

impl<S, A> Drop for Root<S, A> {
    fn drop(&mut self) {
        // Store teardown cancels every still-running effect.
        let core = self.core.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, handles) in core.in_flight.drain() {
            for (_, token) in handles {
                token.cancel();
            }
        }
    }
}

impl<S, A> Driver<S, A> for Root<S, A>
where
    S: Clone + Send + 'static,
    A: Action,
{
    fn send(&self, action: A) {
        self.enqueue(Envelope {
            action,
            provenance: None,
        });
    }

    fn subscribe(&self, observer: Observer<S>) -> Subscription {
        let id = {
            let mut subscribers = lock(&self.subscribers);
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.entries.push((id, observer));
            id
        };
        let root = self.weak_self.clone();
        Subscription::new(move || {
            if let Some(root) = root.upgrade() {
                lock(&root.subscribers)
                    .entries
                    .retain(|(entry, _)| *entry != id);
            }
        })
    }

    fn with_state(&self, f: &mut dyn FnMut(&S)) {
        let core = lock(&self.core);
        f(&core.state);
    }
}

/// A derived view over a parent driver: embeds actions on the way in and
/// re-projects state on the way out. Owns no state of its own.
struct Scoped<PS, PA, S, A> {
    parent: Arc<dyn Driver<PS, PA>>,
    project: Arc<dyn Fn(&PS) -> S + Send + Sync>,
    embed: Arc<dyn Fn(A) -> PA + Send + Sync>,
}

impl<PS, PA, S, A> Driver<S, A> for Scoped<PS, PA, S, A>
where
    PS: 'static,
    PA: 'static,
    S: 'static,
    A: 'static,
{
    fn send(&self, action: A) {
        self.parent.send((self.embed)(action));
    }

    fn subscribe(&self, observer: Observer<S>) -> Subscription {
        let project = Arc::clone(&self.project);
        self.parent.subscribe(Arc::new(move |parent_state: &PS| {
            observer(&project(parent_state));
        }))
    }

    fn with_state(&self, f: &mut dyn FnMut(&S)) {
        let project = &self.project;
        self.parent
            .with_state(&mut |parent_state| f(&project(parent_state)));
    }
}

/// Removes an observer registered with [`Store::subscribe`] when dropped.
///
/// Disposal is idempotent and safe to perform from inside a notification:
/// delivery iterates a snapshot, so observers already visited or not yet
/// visited are unaffected.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// Remove the observer now.
    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }

    /// Keep the observer registered for the life of the store.
    pub fn detach(mut self) {
        self.dispose = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

/// A cheap, cloneable handle to a state container.
///
/// A root store (from [`Store::new`]) owns the single state value; handles
/// from [`Store::scope`] are non-owning views that forward to it. Cloning a
/// handle never duplicates state.
pub struct Store<S, A> {
    driver: Arc<dyn Driver<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Send + 'static,
    A: Action,
{
    /// Create a root store from initial state, a reducer, and the
    /// environment the reducer will be invoked with.
    ///
    /// The environment is bound once, for the life of the store.
    pub fn new<E>(state: S, reducer: Reducer<S, A, E>, environment: E) -> Self
    where
        S: Clone,
        E: Send + 'static,
    {
        let reduce = Box::new(move |state: &mut S, action: A| {
            reducer.reduce(state, action, &environment)
        });
        Self {
            driver: Root::new(state, reduce),
        }
    }

    /// Dispatch an action.
    ///
    /// Synchronous: the action (and any actions fed back by observers or by
    /// immediate effects) is fully processed before this returns. Effects
    /// needing real asynchrony are spawned on the ambient tokio runtime.
    pub fn send(&self, action: A) {
        self.driver.send(action);
    }

    /// Register an observer called with every new state after each processed
    /// action.
    ///
    /// The observer runs on the dispatching context after the new state is
    /// installed and the state lock released: it receives a snapshot of the
    /// published state and may freely `send` (the action is queued and
    /// processed before the outermost `send` returns), read the store, and
    /// manage subscriptions.
    ///
    /// Dropping the returned [`Subscription`] removes the observer.
    pub fn subscribe(&self, observer: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        self.driver.subscribe(Arc::new(observer))
    }

    /// Read the current state through a closure.
    ///
    /// On a scoped store this re-projects from the parent's current state at
    /// time of access; no copy is retained.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let mut f = Some(f);
        let mut output = None;
        self.driver.with_state(&mut |state| {
            if let Some(f) = f.take() {
                output = Some(f(state));
            }
        });
        output.expect("store driver did not invoke the state closure")
    }

    /// Clone out the current state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.with_state(S::clone)
    }

    /// Derive a narrowed handle over a sub-state and sub-action pair.
    ///
    /// `state` projects the parent state (an owned projection, so computed
    /// sub-states work as well as stored fields); `action` embeds child
    /// actions into the parent's action type. All mutation still flows
    /// through the root store.
    pub fn scope<CS, CA>(
        &self,
        state: impl Fn(&S) -> CS + Send + Sync + 'static,
        action: impl Fn(CA) -> A + Send + Sync + 'static,
    ) -> Store<CS, CA>
    where
        CS: Send + 'static,
        CA: Action,
    {
        Store {
            driver: Arc::new(Scoped {
                parent: Arc::clone(&self.driver),
                project: Arc::new(state),
                embed: Arc::new(action),
            }),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
