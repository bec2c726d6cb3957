//! Weak handle back to a container.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{DiError, DiResult};
use crate::inject::{Injectable, InjectionPlan};
use crate::key::Key;
use crate::traits::{Resolver, ResolverCore};

use super::{Container, ContainerInner};

/// Handle through which services reach the container that created them.
///
/// Every container binds `ContainerRef` to itself as a cached constant, so a
/// service declares an `Inject<ContainerRef>` field to resolve further
/// services at run time. The handle is weak: it does not keep the container
/// alive, and using it after the container is gone fails with
/// [`DiError::ContainerDropped`].
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Container, ContainerRef, Inject, Injectable, InjectionPoints};
///
/// #[derive(Default)]
/// struct Plugin;
/// impl Injectable for Plugin {}
///
/// #[derive(Default)]
/// struct Host {
///     container: Inject<ContainerRef>,
/// }
/// impl Injectable for Host {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("container", |h| &h.container);
///     }
/// }
///
/// let container = Container::new();
/// container.bind::<Plugin>().unwrap().to_new().as_transient().on_request().unwrap();
/// container.bind::<Host>().unwrap().to_new().as_cached().on_request().unwrap();
/// container.install().unwrap();
///
/// let host = container.resolve::<Host>().unwrap();
/// let plugin = host.container.resolve::<Plugin>().unwrap();
/// # let _ = plugin;
/// ```
#[derive(Clone)]
pub struct ContainerRef {
    inner: Weak<ContainerInner>,
}

impl ContainerRef {
    pub(crate) fn new(inner: Weak<ContainerInner>) -> Self {
        Self { inner }
    }

    fn upgrade_inner(&self) -> DiResult<Arc<ContainerInner>> {
        self.inner.upgrade().ok_or(DiError::ContainerDropped)
    }

    /// The container, if it is still alive.
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }

    /// Whether the container is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Resolves a service from the container.
    pub fn resolve<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.get::<S>()
    }
}

impl Injectable for ContainerRef {}

impl ResolverCore for ContainerRef {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.upgrade_inner()?.resolve_any(key)
    }

    fn inject_any(
        &self,
        target: &(dyn Any + Send + Sync),
        owner: Key,
        describe: fn() -> InjectionPlan,
    ) -> DiResult<()> {
        self.upgrade_inner()?.inject_any(target, owner, describe)
    }
}

impl Resolver for ContainerRef {}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}
