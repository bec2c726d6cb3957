/// Lifecycle tests: triggers, lifetimes, readiness hooks and observers.
///
/// Construction counts come from `MetricsObserver`, which the container
/// notifies once per constructed instance.
use ferrous_inject::{
    Container, ContainerObserver, Inject, Injectable, InjectionPoints, Key, MetricsObserver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Clock {
    ready: AtomicUsize,
}
impl Injectable for Clock {
    fn on_ready(&self) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Scheduler {
    clock: Inject<Clock>,
    ready: AtomicUsize,
    clock_seen_in_ready: AtomicUsize,
}
impl Injectable for Scheduler {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("clock", |s| &s.clock);
    }

    fn on_ready(&self) {
        self.ready.fetch_add(1, Ordering::SeqCst);
        if self.clock.is_injected() {
            self.clock_seen_in_ready.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn observed() -> (Container, Arc<MetricsObserver>) {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::new();
    container.add_observer(metrics.clone()).unwrap();
    (container, metrics)
}

#[test]
fn on_install_constructs_once_at_install() {
    let (container, metrics) = observed();
    container.bind::<Clock>().unwrap().to_new().as_cached().on_install().unwrap();

    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 0);
    container.install().unwrap();
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 1);

    for _ in 0..5 {
        container.resolve::<Clock>().unwrap();
    }
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 1);
    assert_eq!(container.resolve::<Clock>().unwrap().ready.load(Ordering::SeqCst), 1);
}

#[test]
fn on_request_cached_constructs_on_first_use() {
    let (container, metrics) = observed();
    container.bind::<Clock>().unwrap().to_new().as_cached().on_request().unwrap();
    container.install().unwrap();
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 0);

    container.resolve::<Clock>().unwrap();
    container.resolve::<Clock>().unwrap();
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 1);
}

#[test]
fn on_request_transient_constructs_per_call() {
    let (container, metrics) = observed();
    container.bind::<Clock>().unwrap().to_new().as_transient().on_request().unwrap();
    container.install().unwrap();
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 0);

    for expected in 1..=3 {
        let clock = container.resolve::<Clock>().unwrap();
        assert_eq!(clock.ready.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), expected);
    }
}

#[test]
fn eager_binding_pulls_in_lazy_dependencies() {
    let (container, metrics) = observed();
    container.bind::<Clock>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Scheduler>().unwrap().to_new().as_cached().on_install().unwrap();
    container.install().unwrap();

    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 1);
    assert_eq!(metrics.constructions_of(&Key::of::<Scheduler>()), 1);
}

#[test]
fn on_ready_runs_after_injection() {
    let container = Container::new();
    container.bind::<Clock>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Scheduler>().unwrap().to_new().as_transient().on_request().unwrap();
    container.install().unwrap();

    let scheduler = container.resolve::<Scheduler>().unwrap();
    assert_eq!(scheduler.ready.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.clock_seen_in_ready.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.clock.ready.load(Ordering::SeqCst), 1);
}

#[test]
fn constants_are_injected_and_readied_once() {
    let constant = Arc::new(Scheduler::default());

    let (container, metrics) = observed();
    container.bind::<Clock>().unwrap().to_new().as_cached().on_request().unwrap();
    container
        .bind::<Scheduler>()
        .unwrap()
        .to_constant(constant.clone())
        .as_cached()
        .on_install()
        .unwrap();
    container.install().unwrap();

    assert!(constant.clock.is_injected());
    assert_eq!(constant.ready.load(Ordering::SeqCst), 1);

    container.resolve::<Scheduler>().unwrap();
    container.resolve::<Scheduler>().unwrap();
    assert_eq!(constant.ready.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.constructions_of(&Key::of::<Scheduler>()), 1);
}

#[test]
fn validate_keeps_the_instances_it_creates() {
    let (container, metrics) = observed();
    container.bind::<Clock>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Scheduler>().unwrap().to_new().as_transient().on_request().unwrap();

    container.validate().unwrap();
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 1);
    // Transient bindings are never constructed by a sweep
    assert_eq!(metrics.constructions_of(&Key::of::<Scheduler>()), 0);

    container.install().unwrap();
    container.resolve::<Clock>().unwrap();
    assert_eq!(metrics.constructions_of(&Key::of::<Clock>()), 1);
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl ContainerObserver for EventLog {
    fn binding_added(&self, descriptor: &ferrous_inject::BindingDescriptor) {
        self.events
            .lock()
            .unwrap()
            .push(format!("bound {}", descriptor.service.short_name()));
    }

    fn constructed(&self, service: &Key, _implementation: &Key) {
        self.events
            .lock()
            .unwrap()
            .push(format!("constructed {}", service.short_name()));
    }

    fn installed(&self, eager: usize, _duration: Duration) {
        self.events.lock().unwrap().push(format!("installed {}", eager));
    }
}

#[test]
fn observer_sees_events_in_order() {
    let log = Arc::new(EventLog::default());
    let container = Container::new();
    container.add_observer(log.clone()).unwrap();

    container.bind::<Clock>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Scheduler>().unwrap().to_new().as_cached().on_install().unwrap();
    container.install().unwrap();

    let events = log.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "bound Clock",
            "bound Scheduler",
            "constructed Clock",
            "constructed Scheduler",
            "installed 1",
        ]
    );

    // Observers cannot be added once sealed
    assert!(container.add_observer(Arc::new(MetricsObserver::new())).is_err());
}
