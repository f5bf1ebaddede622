//! Reducer composition through the full store cycle: pullback and combine
//! laws, optional sub-state, and scoped stores.

use uniflow::prelude::*;
use uniflow::StateRecorder;

#[derive(Clone, Debug, Default, PartialEq)]
struct Counter {
    count: i64,
}

#[derive(Clone, Debug, PartialEq)]
enum CounterAction {
    Increment,
    Decrement,
}

fn counter_reducer() -> Reducer<Counter, CounterAction, ()> {
    Reducer::new(|state: &mut Counter, action, _| {
        match action {
            CounterAction::Increment => state.count += 1,
            CounterAction::Decrement => state.count -= 1,
        }
        Effect::none()
    })
}

#[derive(Clone, Debug, Default, PartialEq)]
struct TwoCounters {
    counter1: Counter,
    counter2: Counter,
}

#[derive(Clone, Debug, PartialEq)]
enum TwoCountersAction {
    Counter1(CounterAction),
    Counter2(CounterAction),
}

fn two_counters_reducer() -> Reducer<TwoCounters, TwoCountersAction, ()> {
    Reducer::combine([
        counter_reducer().pullback(
            |s: &mut TwoCounters| &mut s.counter1,
            |a| match a {
                TwoCountersAction::Counter1(a) => Some(a),
                TwoCountersAction::Counter2(_) => None,
            },
            TwoCountersAction::Counter1,
            |&()| (),
        ),
        counter_reducer().pullback(
            |s: &mut TwoCounters| &mut s.counter2,
            |a| match a {
                TwoCountersAction::Counter2(a) => Some(a),
                TwoCountersAction::Counter1(_) => None,
            },
            TwoCountersAction::Counter2,
            |&()| (),
        ),
    ])
}

#[test]
fn pullback_routes_to_the_addressed_counter_only() {
    let store = Store::new(TwoCounters::default(), two_counters_reducer(), ());

    store.send(TwoCountersAction::Counter1(CounterAction::Increment));

    let state = store.state();
    assert_eq!(state.counter1.count, 1);
    assert_eq!(state.counter2.count, 0);
}

#[test]
fn pullback_nonmatching_action_leaves_state_untouched() {
    let lifted = counter_reducer().pullback(
        |s: &mut TwoCounters| &mut s.counter1,
        |a| match a {
            TwoCountersAction::Counter1(a) => Some(a),
            TwoCountersAction::Counter2(_) => None,
        },
        TwoCountersAction::Counter1,
        |&()| (),
    );
    let store = Store::new(TwoCounters::default(), lifted, ());
    let before = store.state();

    store.send(TwoCountersAction::Counter2(CounterAction::Increment));

    assert_eq!(store.state(), before);
}

#[test]
fn scoped_stores_share_the_single_source_of_truth() {
    let store = Store::new(TwoCounters::default(), two_counters_reducer(), ());
    let counter1: Store<Counter, CounterAction> =
        store.scope(|s| s.counter1.clone(), TwoCountersAction::Counter1);
    let counter2: Store<Counter, CounterAction> =
        store.scope(|s| s.counter2.clone(), TwoCountersAction::Counter2);

    counter1.send(CounterAction::Increment);
    counter1.send(CounterAction::Increment);
    counter2.send(CounterAction::Decrement);

    assert_eq!(counter1.state().count, 2);
    assert_eq!(counter2.state().count, -1);
    assert_eq!(store.state().counter1.count, 2);

    // A scope's subscriber sees the projection of every parent publish.
    let (recorder, _sub) = StateRecorder::attach(&counter1);
    store.send(TwoCountersAction::Counter1(CounterAction::Decrement));
    assert_eq!(recorder.last(), Some(Counter { count: 1 }));
}

#[derive(Clone, Debug, Default, PartialEq)]
struct OptionalHost {
    counter: Option<Counter>,
}

#[derive(Clone, Debug, PartialEq)]
enum OptionalHostAction {
    ToggleCounter,
    Counter(CounterAction),
}

fn optional_host_reducer() -> Reducer<OptionalHost, OptionalHostAction, ()> {
    Reducer::combine([
        Reducer::new(|state: &mut OptionalHost, action, _| {
            match action {
                OptionalHostAction::ToggleCounter => {
                    state.counter = match state.counter {
                        None => Some(Counter::default()),
                        Some(_) => None,
                    };
                }
                OptionalHostAction::Counter(_) => {}
            }
            Effect::none()
        }),
        counter_reducer().optional().pullback(
            |s: &mut OptionalHost| &mut s.counter,
            |a| match a {
                OptionalHostAction::Counter(a) => Some(a),
                OptionalHostAction::ToggleCounter => None,
            },
            OptionalHostAction::Counter,
            |&()| (),
        ),
    ])
}

#[test]
fn optional_pullback_drops_actions_while_absent() {
    let store = Store::new(OptionalHost::default(), optional_host_reducer(), ());

    store.send(OptionalHostAction::Counter(CounterAction::Increment));
    assert_eq!(store.state(), OptionalHost::default());
}

#[test]
fn optional_pullback_reduces_while_present() {
    let store = Store::new(OptionalHost::default(), optional_host_reducer(), ());

    store.send(OptionalHostAction::ToggleCounter);
    store.send(OptionalHostAction::Counter(CounterAction::Increment));
    assert_eq!(store.state().counter, Some(Counter { count: 1 }));

    // Toggling away and back resets; stale child actions in between drop.
    store.send(OptionalHostAction::ToggleCounter);
    store.send(OptionalHostAction::Counter(CounterAction::Increment));
    store.send(OptionalHostAction::ToggleCounter);
    assert_eq!(store.state().counter, Some(Counter { count: 0 }));
}

#[test]
fn combine_matches_sequential_application() {
    let combined = Reducer::combine([counter_reducer(), counter_reducer()]);
    let store = Store::new(Counter::default(), combined, ());

    store.send(CounterAction::Increment);
    assert_eq!(store.state().count, 2);
}
