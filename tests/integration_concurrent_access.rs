use crossbeam_utils::thread;
use ferrous_inject::{Container, Inject, Injectable, InjectionPoints, Key, MetricsObserver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static BUILT: AtomicUsize = AtomicUsize::new(0);

struct Registry {
    id: usize,
}
impl Default for Registry {
    fn default() -> Self {
        // Slow enough for racing threads to overlap
        std::thread::sleep(std::time::Duration::from_millis(5));
        Self { id: BUILT.fetch_add(1, Ordering::SeqCst) }
    }
}
impl Injectable for Registry {}

#[derive(Default)]
struct Session {
    registry: Inject<Registry>,
}
impl Injectable for Session {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("registry", |s| &s.registry);
    }
}

fn installed() -> (Container, Arc<MetricsObserver>) {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::new();
    container.add_observer(metrics.clone()).unwrap();
    container.bind::<Registry>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Session>().unwrap().to_new().as_transient().on_request().unwrap();
    container.install().unwrap();
    (container, metrics)
}

#[test]
fn test_cached_service_built_once_under_contention() {
    let (container, metrics) = installed();

    let ids: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| s.spawn(|_| container.resolve::<Registry>().unwrap().id))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(metrics.constructions_of(&Key::of::<Registry>()), 1);
    assert_eq!(metrics.resolution_count(), 16);
}

#[test]
fn test_transients_are_distinct_across_threads() {
    let (container, metrics) = installed();

    let sessions: Vec<Arc<Session>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                s.spawn(move |_| {
                    (0..10)
                        .map(|_| container.resolve::<Session>().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(sessions.len(), 80);
    for (i, a) in sessions.iter().enumerate() {
        for b in &sessions[i + 1..] {
            assert!(!Arc::ptr_eq(a, b));
        }
        assert!(Arc::ptr_eq(a.registry.get().unwrap(), sessions[0].registry.get().unwrap()));
    }
    assert_eq!(metrics.constructions_of(&Key::of::<Session>()), 80);
    assert_eq!(metrics.constructions_of(&Key::of::<Registry>()), 1);
}

#[test]
fn test_handles_resolve_from_many_threads() {
    let (container, _) = installed();
    let handle = container.handle();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                for _ in 0..25 {
                    assert!(handle.resolve::<Session>().is_ok());
                }
            });
        }
    })
    .unwrap();
}
