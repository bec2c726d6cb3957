//! Typestate builder for binding declarations.
//!
//! A declaration walks a fixed sequence of steps, each one a distinct builder
//! type, so an out-of-order or incomplete chain does not compile:
//!
//! ```text
//! bind / bind_trait      -> BindingBuilder<S, Unbound>
//!   to_new / to_new_as / to_new_with   -> Implemented
//!   to_constant / to_constant_as       -> Constant
//! Implemented.as_cached  -> Cached      Implemented.as_transient -> Transient
//! Constant.as_cached     -> Cached
//! Cached.on_install | Cached.on_request | Transient.on_request  -> DiResult<()>
//! ```
//!
//! Only one declaration can be open at a time. Dropping a builder before its
//! trigger step abandons the declaration and reopens the container.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::DiResult;
use crate::factory::Factory;
use crate::inject::{Injectable, InjectionPlan};
use crate::key::Key;
use crate::lifetime::{Lifetime, Trigger};
use crate::provider::Container;
use crate::registration::{same, Activation, Binding, Draft};

pub mod module;
pub use module::BindingModule;

/// Builder steps.
pub mod step {
    /// Waiting for an implementation strategy
    pub struct Unbound;
    /// Implementation chosen, waiting for a lifetime
    pub struct Implemented;
    /// Constant chosen, only `as_cached` remains
    pub struct Constant;
    /// Cached lifetime chosen, waiting for a trigger
    pub struct Cached;
    /// Transient lifetime chosen, only `on_request` remains
    pub struct Transient;
}

/// An open declaration. Releases the container's declaring state when
/// dropped unfinished.
struct Declaration {
    container: Container,
    draft: Draft,
    /// Synthetic binding registered together with this one
    companion: Option<Binding>,
    finished: bool,
}

impl Declaration {
    fn finish(&mut self, trigger: Trigger) -> DiResult<()> {
        self.finished = true;
        self.draft.trigger = Some(trigger);
        let binding = match self.draft.complete() {
            Ok(binding) => binding,
            Err(err) => {
                self.container.inner.abandon_declaration();
                return Err(err);
            }
        };
        let mut bindings = vec![binding];
        bindings.extend(self.companion.take());
        self.container.inner.complete_declaration(bindings)
    }
}

impl Drop for Declaration {
    fn drop(&mut self) {
        if !self.finished {
            self.container.inner.abandon_declaration();
        }
    }
}

/// Declaration builder for a binding of service type `S`.
///
/// Created by [`Container::bind`] or [`Container::bind_trait`].
#[must_use = "a binding is only added by its trigger step (`on_install` / `on_request`)"]
pub struct BindingBuilder<S: ?Sized, Step> {
    declaration: Declaration,
    _marker: PhantomData<(fn() -> Arc<S>, Step)>,
}

impl<S: ?Sized, Step> BindingBuilder<S, Step> {
    fn step<Next>(self) -> BindingBuilder<S, Next> {
        BindingBuilder {
            declaration: self.declaration,
            _marker: PhantomData,
        }
    }

    /// The service type being declared.
    pub fn service(&self) -> Key {
        self.declaration.draft.service
    }
}

impl<S: ?Sized, Step> fmt::Debug for BindingBuilder<S, Step> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingBuilder")
            .field("service", &self.declaration.draft.service)
            .field("step", &std::any::type_name::<Step>())
            .finish()
    }
}

impl Container {
    /// Starts a binding declaration for a concrete service type.
    ///
    /// Fails with [`DiError::Sealed`](crate::DiError::Sealed) after install,
    /// [`DiError::DeclarationPending`](crate::DiError::DeclarationPending)
    /// while another builder is alive and
    /// [`DiError::DuplicateBinding`](crate::DiError::DuplicateBinding) when
    /// `S` is already bound.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_inject::{Container, Injectable};
    ///
    /// #[derive(Default)]
    /// struct Settings;
    /// impl Injectable for Settings {}
    ///
    /// let container = Container::new();
    /// container.bind::<Settings>()?.to_new().as_cached().on_install()?;
    /// container.install()?;
    /// # Ok::<(), ferrous_inject::DiError>(())
    /// ```
    pub fn bind<S: Injectable>(&self) -> DiResult<BindingBuilder<S, step::Unbound>> {
        // Ancestors come from user code; collect them before taking any lock
        let ancestors = InjectionPlan::of::<S>().ancestors().to_vec();
        self.open::<S>(ancestors)
    }

    /// Starts a binding declaration for a trait-object service type such as
    /// `dyn Logger`. The implementation is chosen with `to_new_as` or
    /// `to_constant_as`, which take the upcast to the trait object.
    pub fn bind_trait<S>(&self) -> DiResult<BindingBuilder<S, step::Unbound>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.open::<S>(Vec::new())
    }

    fn open<S>(&self, ancestors: Vec<Key>) -> DiResult<BindingBuilder<S, step::Unbound>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let service = Key::of::<S>();
        self.inner.begin_declaration(service)?;
        Ok(BindingBuilder {
            declaration: Declaration {
                container: self.clone(),
                draft: Draft::new(service, ancestors),
                companion: None,
                finished: false,
            },
            _marker: PhantomData,
        })
    }
}

impl<S> BindingBuilder<S, step::Unbound>
where
    S: ?Sized + Send + Sync + 'static,
{
    /// Creates instances of `I` through `Default` and publishes them as `S`.
    ///
    /// Fails with [`DiError::InvalidImplementation`](crate::DiError::InvalidImplementation)
    /// when `I` is a declared base of `S`.
    pub fn to_new_as<I>(mut self, upcast: fn(Arc<I>) -> Arc<S>) -> DiResult<BindingBuilder<S, step::Implemented>>
    where
        I: Injectable + Default,
    {
        self.declaration.draft.check_implementation(Key::of::<I>())?;
        self.declaration.draft.activation = Some(Activation::with_default::<I, S>(upcast));
        Ok(self.step())
    }

    /// Binds `S` to a supplied instance of `I`.
    pub fn to_constant_as<I>(mut self, value: Arc<I>, upcast: fn(Arc<I>) -> Arc<S>) -> DiResult<BindingBuilder<S, step::Constant>>
    where
        I: Injectable,
    {
        self.declaration.draft.check_implementation(Key::of::<I>())?;
        self.declaration.draft.activation = Some(Activation::with_constant::<I, S>(value, upcast));
        Ok(self.step())
    }
}

impl<S: Injectable> BindingBuilder<S, step::Unbound> {
    /// Creates instances of `S` itself through `Default`.
    pub fn to_new(mut self) -> BindingBuilder<S, step::Implemented>
    where
        S: Default,
    {
        self.declaration.draft.activation = Some(Activation::with_default::<S, S>(same));
        self.step()
    }

    /// Creates instances of `S` with a fallible zero-argument constructor.
    ///
    /// A constructor error surfaces as
    /// [`DiError::Construction`](crate::DiError::Construction) from whichever
    /// operation first needs the instance.
    pub fn to_new_with<F, E>(mut self, ctor: F) -> BindingBuilder<S, step::Implemented>
    where
        F: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.declaration.draft.activation = Some(Activation::with_constructor::<S, S, F, E>(ctor, same));
        self.step()
    }

    /// Binds `S` to a supplied instance. Resolving `S` hands out this very
    /// `Arc`; its fields are injected and its `on_ready` hook runs once.
    pub fn to_constant(mut self, value: Arc<S>) -> BindingBuilder<S, step::Constant> {
        self.declaration.draft.activation = Some(Activation::with_constant::<S, S>(value, same));
        self.step()
    }
}

impl<S: ?Sized> BindingBuilder<S, step::Implemented>
where
    S: Send + Sync + 'static,
{
    /// One instance for the life of the container.
    pub fn as_cached(mut self) -> BindingBuilder<S, step::Cached> {
        self.declaration.draft.lifetime = Some(Lifetime::Cached);
        self.step()
    }

    /// A new instance per resolution.
    ///
    /// Also registers `Factory<S>` (cached, on request) once the declaration
    /// completes, so other services can create instances of `S` on demand.
    pub fn as_transient(mut self) -> BindingBuilder<S, step::Transient> {
        self.declaration.draft.lifetime = Some(Lifetime::Transient);
        self.declaration.companion = Some(Binding {
            service: Key::of::<Factory<S>>(),
            activation: Activation::with_default::<Factory<S>, Factory<S>>(same),
            lifetime: Lifetime::Cached,
            trigger: Trigger::OnRequest,
            synthetic: true,
        });
        self.step()
    }
}

impl<S: ?Sized> BindingBuilder<S, step::Constant> {
    /// Constants are always cached.
    pub fn as_cached(mut self) -> BindingBuilder<S, step::Cached> {
        self.declaration.draft.lifetime = Some(Lifetime::Cached);
        self.step()
    }
}

impl<S: ?Sized> BindingBuilder<S, step::Cached> {
    /// Completes the declaration; the instance is created during `install`.
    pub fn on_install(mut self) -> DiResult<()> {
        self.declaration.finish(Trigger::OnInstall)
    }

    /// Completes the declaration; the instance is created on first use.
    pub fn on_request(mut self) -> DiResult<()> {
        self.declaration.finish(Trigger::OnRequest)
    }
}

impl<S: ?Sized> BindingBuilder<S, step::Transient> {
    /// Completes the declaration. Transient bindings are always on request.
    pub fn on_request(mut self) -> DiResult<()> {
        self.declaration.finish(Trigger::OnRequest)
    }
}
