#![no_main]

use ferrous_inject::{Container, DiError, Inject, Injectable, InjectionPoints};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Default)]
struct Leaf;
impl Injectable for Leaf {}

#[derive(Default)]
struct Branch {
    leaf: Inject<Leaf>,
}
impl Injectable for Branch {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("leaf", |b| &b.leaf);
    }
}

#[derive(Default)]
struct Root {
    branch: Inject<Branch>,
    leaf: Inject<Leaf>,
}
impl Injectable for Root {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("branch", |r| &r.branch).field("leaf", |r| &r.leaf);
    }
}

// Ping <-> Pong
#[derive(Default)]
struct Ping {
    pong: Inject<Pong>,
}
impl Injectable for Ping {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("pong", |p| &p.pong);
    }
}

#[derive(Default)]
struct Pong {
    ping: Inject<Ping>,
}
impl Injectable for Pong {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("ping", |p| &p.ping);
    }
}

fn declare<T: Injectable + Default>(container: &Container, mode: u8) -> Result<(), DiError> {
    let builder = container.bind::<T>()?.to_new();
    match mode % 3 {
        0 => builder.as_cached().on_install(),
        1 => builder.as_cached().on_request(),
        _ => builder.as_transient().on_request(),
    }
}

fn resolve<T: Injectable>(container: &Container) {
    let first = container.resolve::<T>();
    let second = container.resolve::<T>();
    match (first, second) {
        (Ok(a), Ok(b)) => {
            // Cached bindings hand out one instance, transient ones never repeat
            let cached = !container.contains::<ferrous_inject::Factory<T>>();
            assert_eq!(Arc::ptr_eq(&a, &b), cached);
        }
        (Err(a), Err(b)) => assert_eq!(a.kind(), b.kind()),
        _ => {}
    }
}

fuzz_target!(|data: &[u8]| {
    let container = Container::new();

    for pair in data.chunks(2) {
        let op = pair[0];
        let arg = pair.get(1).copied().unwrap_or(0);

        match op % 8 {
            0 => {
                let _ = match arg % 5 {
                    0 => declare::<Leaf>(&container, arg / 5),
                    1 => declare::<Branch>(&container, arg / 5),
                    2 => declare::<Root>(&container, arg / 5),
                    3 => declare::<Ping>(&container, arg / 5),
                    _ => declare::<Pong>(&container, arg / 5),
                };
            }
            1 => {
                // Abandoned half-built declaration
                if let Ok(builder) = container.bind::<Leaf>() {
                    drop(builder.to_new());
                }
            }
            2 => {
                let _ = container.validate();
            }
            3 => {
                if container.install().is_ok() {
                    assert!(container.is_sealed());
                }
            }
            4 => resolve::<Leaf>(&container),
            5 => resolve::<Branch>(&container),
            6 => resolve::<Root>(&container),
            _ => {
                let target = Root::default();
                if container.inject(&target).is_ok() {
                    assert!(target.branch.is_injected() && target.leaf.is_injected());
                }
            }
        }
    }

    // The container is never left in a declaring state
    if !container.is_sealed() {
        assert!(!matches!(container.bind::<Leaf>(), Err(DiError::DeclarationPending(_))));
    }
});
