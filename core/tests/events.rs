//! Event dispatcher contract: emit-only-on-change, before/after values,
//! cascade ordering, filtering, async draining and listener reentrancy.

use scoreboard_core::{
    ClockEvent, ClockProperty, EventFilter, MemorySettings, PropertyValue, ScoreboardSession,
};
use std::sync::{Arc, Mutex};

type Collected = Arc<Mutex<Vec<ClockEvent>>>;

fn session() -> ScoreboardSession {
    ScoreboardSession::start_paused(Arc::new(MemorySettings::new())).expect("session")
}

fn collect(session: &ScoreboardSession, filter: EventFilter) -> Collected {
    let events: Collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session
        .events()
        .subscribe(filter, move |event| sink.lock().unwrap().push(event.clone()));
    events
}

fn drain_collected(events: &Collected) -> Vec<ClockEvent> {
    std::mem::take(&mut *events.lock().unwrap())
}

#[test]
fn events_carry_new_and_previous_value() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    let events = collect(&session, EventFilter::property("TEST", ClockProperty::Name));

    clock.set_name("Test Clock");

    let events = drain_collected(&events);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].clock, "TEST");
    assert_eq!(events[0].property, ClockProperty::Name);
    assert_eq!(events[0].value, PropertyValue::Text(Some("Test Clock".to_string())));
    assert_eq!(events[0].previous, PropertyValue::Text(None));
}

#[test]
fn direction_setter_is_idempotent() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    let events = collect(&session, EventFilter::property("TEST", ClockProperty::Direction));

    clock.set_count_direction_down(true);
    clock.set_count_direction_down(true);

    let collected = drain_collected(&events);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].value, PropertyValue::Flag(true));
    assert_eq!(collected[0].previous, PropertyValue::Flag(false));

    clock.set_count_direction_down(false);
    assert_eq!(drain_collected(&events).len(), 1);
}

#[test]
fn start_and_stop_are_idempotent() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    let events = collect(&session, EventFilter::property("TEST", ClockProperty::Running));

    clock.stop();
    assert_eq!(drain_collected(&events).len(), 0);

    clock.start();
    clock.start();
    assert_eq!(drain_collected(&events).len(), 1);

    clock.stop();
    clock.stop();
    assert_eq!(drain_collected(&events).len(), 1);
}

#[test]
fn cascade_emits_one_event_per_changed_field_in_derivation_order() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    let events = collect(&session, EventFilter::clock("TEST"));

    // All three number fields move from the defaults.
    clock.set_minimum_number(1);
    let collected = drain_collected(&events);
    let properties: Vec<ClockProperty> = collected.iter().map(|e| e.property).collect();
    assert_eq!(
        properties,
        vec![
            ClockProperty::MinimumNumber,
            ClockProperty::MaximumNumber,
            ClockProperty::Number
        ]
    );
}

#[test]
fn cascade_does_not_emit_for_unchanged_fields() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    clock.set_minimum_number(10);
    let events = collect(&session, EventFilter::clock("TEST"));

    // minimum drops; maximum and number stay where they are
    clock.set_minimum_number(5);
    let collected = drain_collected(&events);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].property, ClockProperty::MinimumNumber);

    // a maximum below the minimum pins to the minimum, which it already is
    clock.set_maximum_number(5);
    assert_eq!(drain_collected(&events).len(), 0);
}

#[test]
fn time_change_also_reports_inverted_time() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    clock.set_maximum_time(5000);
    clock.set_minimum_time(1000);
    clock.set_time(3200);
    let events = collect(&session, EventFilter::clock("TEST"));

    clock.change_time(-5000);

    let collected = drain_collected(&events);
    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].property, ClockProperty::Time);
    assert_eq!(collected[0].value, PropertyValue::Millis(1000));
    assert_eq!(collected[0].previous, PropertyValue::Millis(3200));
    assert_eq!(collected[1].property, ClockProperty::InvertedTime);
    assert_eq!(collected[1].value, PropertyValue::Millis(5000));
    assert_eq!(collected[1].previous, PropertyValue::Millis(2800));
}

#[test]
fn filters_isolate_source_and_property() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    let other = session.register_clock("OTHER", false).expect("register");
    clock.set_maximum_time(5000);
    other.set_maximum_time(5000);
    let events = collect(&session, EventFilter::property("TEST", ClockProperty::Time));

    other.set_time(2000); // different clock
    clock.set_number(0); // unchanged, no event at all
    clock.set_maximum_time(4000); // different property
    clock.set_time(2000);

    let collected = drain_collected(&events);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].clock, "TEST");
    assert_eq!(collected[0].value, PropertyValue::Millis(2000));
}

#[test]
fn async_listeners_only_see_events_on_drain() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    clock.set_maximum_time(5000);

    let events: Collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session
        .events()
        .subscribe_async(EventFilter::property("TEST", ClockProperty::Time), move |event| {
            sink.lock().unwrap().push(event.clone())
        });

    clock.set_time(1000);
    clock.set_time(2500);
    assert!(events.lock().unwrap().is_empty());
    assert!(session.events().pending() > 0);

    let delivered = session.events().drain();
    assert!(delivered >= 2);
    let collected = drain_collected(&events);
    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].value, PropertyValue::Millis(1000));
    assert_eq!(collected[1].value, PropertyValue::Millis(2500));
    assert_eq!(session.events().pending(), 0);
}

#[test]
fn listeners_may_reenter_the_clock() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    clock.set_maximum_number(5);
    clock.set_maximum_time(5000);

    let time_events = collect(&session, EventFilter::property("TEST", ClockProperty::Time));

    // a Number listener that immediately adjusts the clock's time
    let reentrant = Arc::clone(&clock);
    session.events().subscribe(
        EventFilter::property("TEST", ClockProperty::Number),
        move |_| reentrant.set_time(500),
    );

    clock.set_number(3);

    // the nested mutation completed before set_number returned
    assert_eq!(clock.time(), 500);
    let collected = drain_collected(&time_events);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].value, PropertyValue::Millis(500));
}

#[test]
fn countdown_reaching_the_minimum_reports_exactly_zero() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    clock.set_count_direction_down(true);
    clock.set_maximum_time(1000);
    clock.set_time(1000);
    clock.start();

    let events = collect(&session, EventFilter::property("TEST", ClockProperty::Time));
    for _ in 0..5 {
        session.ticker().advance(200);
    }

    let collected = drain_collected(&events);
    assert_eq!(collected.len(), 5);
    assert_eq!(collected.last().map(|e| e.value.clone()), Some(PropertyValue::Millis(0)));

    // already at the end: further ticking changes nothing and emits nothing
    session.ticker().advance(200);
    assert_eq!(drain_collected(&events).len(), 0);
    assert_eq!(clock.time(), 0);
}

#[test]
fn restore_emits_events_for_each_changed_field() {
    let session = session();
    let clock = session.register_clock("TEST", false).expect("register");
    clock.set_maximum_time(5000);
    clock.set_time(4000);
    clock.set_maximum_number(3);
    clock.set_number(2);
    let snapshot = clock.snapshot();

    clock.reset();
    let events = collect(&session, EventFilter::clock("TEST"));
    clock.restore_snapshot(&snapshot);

    let collected = drain_collected(&events);
    let properties: Vec<ClockProperty> = collected.iter().map(|e| e.property).collect();
    assert_eq!(
        properties,
        vec![
            ClockProperty::Number,
            ClockProperty::Time,
            ClockProperty::InvertedTime
        ]
    );
}
