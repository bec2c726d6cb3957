//! Factories for transient services.
//!
//! Declaring a transient binding for `S` also registers `Factory<S>` as a
//! cached service. A service that needs fresh instances of `S` at run time
//! depends on the factory instead of on `S` itself, since transient bindings
//! cannot be field-injected.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::inject::{Inject, Injectable, InjectionPoints};
use crate::key::Key;
use crate::provider::ContainerRef;
use crate::traits::ResolverCore;

/// Creates instances of a transient service on demand.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Container, Factory, Inject, Injectable, InjectionPoints};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Request;
/// impl Injectable for Request {}
///
/// #[derive(Default)]
/// struct Server {
///     requests: Inject<Factory<Request>>,
/// }
/// impl Injectable for Server {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("requests", |s| &s.requests);
///     }
/// }
///
/// let container = Container::new();
/// container.bind::<Request>().unwrap().to_new().as_transient().on_request().unwrap();
/// container.bind::<Server>().unwrap().to_new().as_cached().on_install().unwrap();
/// container.install().unwrap();
///
/// let server = container.resolve::<Server>().unwrap();
/// let a = server.requests.create().unwrap();
/// let b = server.requests.create().unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
pub struct Factory<T: ?Sized> {
    container: Inject<ContainerRef>,
    _product: PhantomData<fn() -> Arc<T>>,
}

impl<T> Factory<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// A factory bound to the given container.
    pub fn with_container(container: ContainerRef) -> Self {
        Self {
            container: Inject::with(Arc::new(container)),
            _product: PhantomData,
        }
    }

    /// Resolves a fresh, injected and readied instance of `T`.
    ///
    /// Fails with [`DiError::ContainerDropped`] when the factory was never
    /// attached to a container or the container is gone.
    pub fn create(&self) -> DiResult<Arc<T>> {
        self.attached()?.resolve::<T>()
    }

    fn attached(&self) -> DiResult<&ContainerRef> {
        self.container
            .get()
            .map(|c| c.as_ref())
            .ok_or(DiError::ContainerDropped)
    }
}

impl<T: ?Sized> Default for Factory<T> {
    fn default() -> Self {
        Self {
            container: Inject::new(),
            _product: PhantomData,
        }
    }
}

impl<T> Injectable for Factory<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("container", |f| &f.container);
    }
}

impl<T: ?Sized> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("product", &type_name::<T>())
            .field("attached", &self.container.is_injected())
            .finish()
    }
}

/// Object-safe view of a [`Factory`] for callers that do not know the
/// product type.
pub trait AnyFactory: Send + Sync {
    /// Key of the type this factory creates.
    fn product(&self) -> Key;

    /// Creates an instance; the value holds an `Arc<T>` of the product type.
    fn create_any(&self) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

impl<T> AnyFactory for Factory<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn product(&self) -> Key {
        Key::of::<T>()
    }

    fn create_any(&self) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.attached()?.resolve_any(&Key::of::<T>())
    }
}
