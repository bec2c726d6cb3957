//! # ferrous-inject
//!
//! A dependency injection container with declarative bindings, field
//! injection and up-front circular dependency detection.
//!
//! ## Features
//!
//! - **Typestate bindings**: every declaration picks an implementation, a
//!   lifetime and a trigger, in that order, checked by the compiler
//! - **Two lifetimes**: `Cached` (one instance per container) and
//!   `Transient` (a new instance per resolution, plus a `Factory<S>`)
//! - **Two triggers**: `OnInstall` (built eagerly at install) and
//!   `OnRequest` (built on first use)
//! - **Field injection**: services declare `Inject<D>` fields, inherited
//!   from embedded base types too, and an `on_ready` hook
//! - **Circular dependency detection**: cycles are rejected with the full
//!   dependency path, before anything in the cycle is constructed
//! - **Thread-safe**: the container is `Send + Sync` and hands out `Arc`s
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{Container, Inject, Injectable, InjectionPoints};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Database;
//! impl Injectable for Database {}
//!
//! #[derive(Default)]
//! struct UserService {
//!     db: Inject<Database>,
//! }
//! impl Injectable for UserService {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("db", |s| &s.db);
//!     }
//! }
//!
//! let container = Container::new();
//! container.bind::<Database>().unwrap().to_new().as_cached().on_install().unwrap();
//! container.bind::<UserService>().unwrap().to_new().as_transient().on_request().unwrap();
//! container.install().unwrap();
//!
//! let first = container.resolve::<UserService>().unwrap();
//! let second = container.resolve::<UserService>().unwrap();
//! assert!(!Arc::ptr_eq(&first, &second));
//! assert!(Arc::ptr_eq(first.db.get().unwrap(), second.db.get().unwrap()));
//! ```
//!
//! ## Trait Services
//!
//! ```rust
//! use ferrous_inject::{Container, Injectable};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct ConsoleLogger;
//! impl Injectable for ConsoleLogger {}
//! impl Logger for ConsoleLogger {
//!     fn name(&self) -> &'static str {
//!         "console"
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .bind_trait::<dyn Logger>()
//!     .unwrap()
//!     .to_new_as::<ConsoleLogger>(|l| l as Arc<dyn Logger>)
//!     .unwrap()
//!     .as_cached()
//!     .on_request()
//!     .unwrap();
//! container.install().unwrap();
//!
//! let logger = container.resolve::<dyn Logger>().unwrap();
//! assert_eq!(logger.name(), "console");
//! ```
//!
//! ## Circular Dependencies
//!
//! ```rust
//! use ferrous_inject::{Container, DiError, Inject, Injectable, InjectionPoints};
//!
//! #[derive(Default)]
//! struct A { b: Inject<B> }
//! impl Injectable for A {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("b", |a| &a.b);
//!     }
//! }
//!
//! #[derive(Default)]
//! struct B { a: Inject<A> }
//! impl Injectable for B {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("a", |b| &b.a);
//!     }
//! }
//!
//! let container = Container::new();
//! container.bind::<A>().unwrap().to_new().as_cached().on_request().unwrap();
//! container.bind::<B>().unwrap().to_new().as_cached().on_request().unwrap();
//!
//! assert!(matches!(container.validate(), Err(DiError::Circular(_))));
//! ```

// Module declarations
pub mod binder;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod factory;
pub mod inject;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod traits;

// Internal modules
mod internal;
mod registration;
mod validation;

// Re-exports
pub use binder::{step, BindingBuilder, BindingModule};
pub use config::ContainerConfig;
pub use descriptors::BindingDescriptor;
pub use error::{DiError, DiResult, ErrorKind};
pub use factory::{AnyFactory, Factory};
pub use inject::{Inject, Injectable, InjectionPlan, InjectionPoint, InjectionPoints};
pub use key::{key_of_type, Key};
pub use lifetime::{Lifetime, Trigger};
pub use observer::{ContainerObserver, LoggingObserver, MetricsObserver};
pub use provider::{Container, ContainerRef};
pub use traits::{Resolver, ResolverCore};
