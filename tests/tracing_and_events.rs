//! Integration tests for lifecycle tracing and events.
//!
//! NOTE: Tests touching the process-global trace callback use #[serial]
//! because the callback slot is shared. Scoped-manager tests create their
//! own scope per test and can run in parallel.

use serial_test::serial;
use singleton_lifecycle::{
    clear_trace_callback, define_manager, instance, set_trace_callback, BoxError, InitToken,
    LifecycleEvent, ManagedSingleton,
};
use std::sync::{Arc, Mutex};

struct Probe;

impl ManagedSingleton for Probe {
    fn construct(_token: &InitToken) -> Result<Self, BoxError> {
        Ok(Probe)
    }
}

fn capture() -> (Arc<Mutex<Vec<String>>>, impl Fn(&LifecycleEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event: &LifecycleEvent| {
        sink.lock().unwrap().push(event.to_string());
    })
}

#[test]
fn test_construct_and_access_events() {
    define_manager!(traced);

    let (events, callback) = capture();
    traced::set_trace_callback(callback);

    traced::instance::<Probe>().unwrap();
    traced::instance::<Probe>().unwrap();

    let captured = events.lock().unwrap();
    let probe_name = std::any::type_name::<Probe>();
    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0], format!("construct {{ type_name: {probe_name} }}"));
    assert_eq!(
        captured[1],
        format!("access {{ type_name: {probe_name}, ready: true }}")
    );
    // The second access constructs nothing.
    assert_eq!(
        captured[2],
        format!("access {{ type_name: {probe_name}, ready: true }}")
    );
}

#[test]
fn test_dispose_events_record_who_tore_down() {
    define_manager!(disposing);

    let (events, callback) = capture();
    disposing::set_trace_callback(callback);

    disposing::instance::<Probe>().unwrap();
    disposing::dispose::<Probe>();
    disposing::dispose::<Probe>();

    let captured = events.lock().unwrap();
    let probe_name = std::any::type_name::<Probe>();
    assert_eq!(
        captured[2],
        format!("dispose {{ type_name: {probe_name}, torn_down: true }}")
    );
    assert_eq!(
        captured[3],
        format!("dispose {{ type_name: {probe_name}, torn_down: false }}")
    );
}

#[test]
fn test_rejected_access_is_traced_as_not_ready() {
    define_manager!(rejected);

    rejected::instance::<Probe>().unwrap();
    rejected::dispose::<Probe>();

    let (events, callback) = capture();
    rejected::set_trace_callback(callback);

    let _ = rejected::instance::<Probe>();

    let captured = events.lock().unwrap();
    let probe_name = std::any::type_name::<Probe>();
    assert_eq!(captured.len(), 1);
    assert_eq!(
        captured[0],
        format!("access {{ type_name: {probe_name}, ready: false }}")
    );
}

#[test]
fn test_clear_trace_callback_stops_events() {
    define_manager!(muted);

    let (events, callback) = capture();
    muted::set_trace_callback(callback);

    muted::instance::<Probe>().unwrap();
    let seen_before = events.lock().unwrap().len();
    assert!(seen_before > 0);

    muted::clear_trace_callback();

    muted::dispose::<Probe>();
    let _ = muted::instance::<Probe>();

    // No new events after the callback was cleared.
    assert_eq!(events.lock().unwrap().len(), seen_before);
}

#[test]
fn test_reset_emits_event() {
    define_manager!(resettable);

    let (events, callback) = capture();
    resettable::set_trace_callback(callback);

    resettable::reset();

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0], "Resetting the manager");
}

#[test]
#[serial]
fn test_global_trace_callback() {
    struct GloballyTraced;
    impl ManagedSingleton for GloballyTraced {
        fn construct(_token: &InitToken) -> Result<Self, BoxError> {
            Ok(GloballyTraced)
        }
    }

    let (events, callback) = capture();
    set_trace_callback(callback);

    instance::<GloballyTraced>().unwrap();

    let captured = events.lock().unwrap();
    let name = std::any::type_name::<GloballyTraced>();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0], format!("construct {{ type_name: {name} }}"));
    assert_eq!(
        captured[1],
        format!("access {{ type_name: {name}, ready: true }}")
    );
    drop(captured);

    clear_trace_callback();
}
