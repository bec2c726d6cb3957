/// Validation and install-time checks.
use ferrous_inject::{
    Container, ContainerConfig, DiError, ErrorKind, Inject, Injectable, InjectionPoints,
};
use std::any::type_name;
use std::sync::Arc;

#[derive(Default)]
struct Settings;
impl Injectable for Settings {}

#[derive(Default)]
struct Mailer {
    settings: Inject<Settings>,
}
impl Injectable for Mailer {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("settings", |m| &m.settings);
    }
}

#[derive(Default)]
struct Left {
    right: Inject<Right>,
}
impl Injectable for Left {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("right", |l| &l.right);
    }
}

#[derive(Default)]
struct Right {
    left: Inject<Left>,
}
impl Injectable for Right {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("left", |r| &r.left);
    }
}

#[derive(Default)]
struct Shape {
    sides: u32,
}
impl Injectable for Shape {}

#[derive(Default)]
struct Square {
    shape: Shape,
}
impl Injectable for Square {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.base(|s| &s.shape);
    }
}

fn missing_settings() -> DiError {
    DiError::MissingBinding {
        service: type_name::<Mailer>(),
        dependency: type_name::<Settings>(),
    }
}

#[test]
fn test_missing_dependency_fails_validate() {
    let container = Container::new();
    container.bind::<Mailer>().unwrap().to_new().as_cached().on_request().unwrap();

    let err = container.validate().unwrap_err();
    assert_eq!(err, missing_settings());
    assert_eq!(err.kind(), ErrorKind::MissingBinding);
    assert_eq!(
        err.to_string(),
        format!("{} has a dependency on {} which is not bound", type_name::<Mailer>(), type_name::<Settings>())
    );
}

#[test]
fn test_missing_dependency_fails_eager_install() {
    let container = Container::new();
    container.bind::<Mailer>().unwrap().to_new().as_cached().on_install().unwrap();
    assert_eq!(container.install().unwrap_err(), missing_settings());
}

#[test]
fn test_missing_dependency_fails_lazy_resolve() {
    let container = Container::new();
    container.bind::<Mailer>().unwrap().to_new().as_transient().on_request().unwrap();
    container.install().unwrap();
    assert_eq!(container.resolve::<Mailer>().err().unwrap(), missing_settings());
}

#[test]
fn test_validate_passes_and_can_repeat() {
    let container = Container::new();
    container.bind::<Settings>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Mailer>().unwrap().to_new().as_cached().on_install().unwrap();

    container.validate().unwrap();
    container.validate().unwrap();
    container.install().unwrap();

    let mailer = container.resolve::<Mailer>().unwrap();
    assert!(Arc::ptr_eq(mailer.settings.get().unwrap(), &container.resolve::<Settings>().unwrap()));
}

#[test]
fn test_validate_with_open_declaration() {
    let container = Container::new();
    container.bind::<Settings>().unwrap().to_new().as_cached().on_request().unwrap();
    let pending = container.bind::<Mailer>().unwrap();

    container.validate().unwrap();

    pending.to_new().as_cached().on_request().unwrap();
    container.install().unwrap();
}

#[test]
fn test_validate_on_install() {
    let config = ContainerConfig::new().with_validate_on_install(true);
    let container = Container::with_config(config);
    container.bind::<Left>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Right>().unwrap().to_new().as_cached().on_request().unwrap();

    assert_eq!(
        container.install().unwrap_err(),
        DiError::Circular(vec![type_name::<Left>(), type_name::<Right>(), type_name::<Left>()])
    );
    // The failed validation ran before sealing
    assert!(!container.is_sealed());
}

#[test]
fn test_lazy_cycle_installs_without_validation() {
    let container = Container::new();
    container.bind::<Left>().unwrap().to_new().as_cached().on_request().unwrap();
    container.bind::<Right>().unwrap().to_new().as_cached().on_request().unwrap();

    container.install().unwrap();
    assert!(matches!(container.resolve::<Right>(), Err(DiError::Circular(_))));
}

#[test]
fn test_ancestor_cannot_implement_descendant() {
    let container = Container::new();
    let err = container
        .bind::<Square>()
        .unwrap()
        .to_new_as::<Shape>(|_| Arc::new(Square::default()))
        .unwrap_err();
    assert_eq!(
        err,
        DiError::InvalidImplementation {
            service: type_name::<Square>(),
            implementation: type_name::<Shape>(),
            reason: "the implementation is an ancestor of the service type",
        }
    );

    // The rejected builder was dropped, the container is open again
    container.bind::<Square>().unwrap().to_new().as_cached().on_request().unwrap();
    container.install().unwrap();
    assert_eq!(container.resolve::<Square>().unwrap().shape.sides, 0);
}

#[test]
fn test_explicit_self_implementation() {
    let container = Container::new();
    container
        .bind::<Shape>()
        .unwrap()
        .to_constant(Arc::new(Shape { sides: 4 }))
        .as_cached()
        .on_request()
        .unwrap();
    container
        .bind::<Mailer>()
        .unwrap()
        .to_new_as::<Mailer>(|m| m)
        .unwrap()
        .as_cached()
        .on_request()
        .unwrap();
    container.bind::<Settings>().unwrap().to_new().as_cached().on_request().unwrap();
    container.install().unwrap();
    assert_eq!(container.resolve::<Shape>().unwrap().sides, 4);
    assert!(container.resolve::<Mailer>().unwrap().settings.is_injected());
}
