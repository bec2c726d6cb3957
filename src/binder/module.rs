//! Binding modules for grouped, reusable declarations.

use crate::error::DiResult;
use crate::provider::Container;

/// A group of binding declarations applied to a container in one call.
///
/// # Example
///
/// ```rust
/// use ferrous_inject::{BindingModule, Container, DiResult, Inject, Injectable, InjectionPoints};
///
/// #[derive(Default)]
/// struct UserConfig;
/// impl Injectable for UserConfig {}
///
/// #[derive(Default)]
/// struct UserService {
///     config: Inject<UserConfig>,
/// }
/// impl Injectable for UserService {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("config", |s| &s.config);
///     }
/// }
///
/// struct UserModule;
///
/// impl BindingModule for UserModule {
///     fn register_bindings(self, container: &Container) -> DiResult<()> {
///         container.bind::<UserConfig>()?.to_new().as_cached().on_request()?;
///         container.bind::<UserService>()?.to_new().as_transient().on_request()?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let container = Container::new();
/// container.add_module(UserModule)?.install()?;
/// let service = container.resolve::<UserService>()?;
/// assert!(service.config.is_injected());
/// # Ok(())
/// # }
/// ```
pub trait BindingModule {
    /// Declare this module's bindings on the container.
    fn register_bindings(self, container: &Container) -> DiResult<()>;
}

impl<F> BindingModule for F
where
    F: FnOnce(&Container) -> DiResult<()>,
{
    fn register_bindings(self, container: &Container) -> DiResult<()> {
        self(container)
    }
}

impl Container {
    /// Applies a module's declarations. Stops at the first failing one;
    /// bindings declared before the failure stay registered.
    pub fn add_module<M: BindingModule>(&self, module: M) -> DiResult<&Self> {
        module.register_bindings(self)?;
        Ok(self)
    }
}
