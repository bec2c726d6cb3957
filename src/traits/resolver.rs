//! Resolver traits for service resolution.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::inject::{Injectable, InjectionPlan};
use crate::key::Key;

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`Container`](crate::Container) and by the weak
/// [`ContainerRef`](crate::ContainerRef) handle. Most users should use the
/// [`Resolver`] trait instead, which provides typed generic methods built on
/// top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves a service by key.
    ///
    /// The returned value holds an `Arc<S>` where `S` is the service type of
    /// the binding, so concrete and trait-object services share one shape.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved service, an `Arc<S>` behind `Arc<dyn Any>`
    /// * `Err(DiError)` - Resolution error (not installed, not found, circular, etc.)
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Fills every injectable field of `target` with cached instances,
    /// resolving the field bindings first.
    ///
    /// `owner` is the type of `target`; `describe` builds its plan the first
    /// time that type is injected.
    fn inject_any(
        &self,
        target: &(dyn Any + Send + Sync),
        owner: Key,
        describe: fn() -> InjectionPlan,
    ) -> DiResult<()>;
}

/// High-level resolver interface with generic methods for type-safe service
/// resolution.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Container, Injectable, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// #[derive(Default)]
/// struct ConsoleLogger;
/// impl Injectable for ConsoleLogger {}
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let container = Container::new();
/// container
///     .bind_trait::<dyn Logger>()
///     .unwrap()
///     .to_new_as::<ConsoleLogger>(|l| l as Arc<dyn Logger>)
///     .unwrap()
///     .as_cached()
///     .on_request()
///     .unwrap();
/// container.install().unwrap();
///
/// let logger = container.get_required::<dyn Logger>();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a service type, concrete or `dyn Trait`.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<S>)` - The resolved service instance
    /// * `Err(DiError)` - Resolution error
    fn get<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let any = self.resolve_any(&Key::of::<S>())?;
        any.downcast_ref::<Arc<S>>()
            .cloned()
            .ok_or(DiError::TypeMismatch(type_name::<S>()))
    }

    /// Resolves a service type, panicking if resolution fails.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error's message.
    fn get_required<S>(&self) -> Arc<S>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        match self.get::<S>() {
            Ok(service) => service,
            Err(err) => panic!("Failed to resolve {}: {}", type_name::<S>(), err),
        }
    }

    /// Injects the fields of an object the container did not create, then
    /// runs its `on_ready` hook.
    fn inject<T: Injectable>(&self, target: &T) -> DiResult<()> {
        self.inject_any(target, Key::of::<T>(), InjectionPlan::of::<T>)?;
        target.on_ready();
        Ok(())
    }
}
