//! Binding records and the registry that owns them.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::inject::{Injectable, InjectionPlan};
use crate::internal::HashMap;
use crate::key::Key;
use crate::lifetime::{Lifetime, Trigger};

// Service view stored in the instance table: an `Arc<S>` boxed behind `Any`,
// so concrete and trait-object services share one representation.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

// Freshly constructed implementation instance (`Arc<I>` erased), before it
// is published as the service view.
pub(crate) type RawArc = Arc<dyn Any + Send + Sync>;

pub(crate) type RawRef<'a> = &'a (dyn Any + Send + Sync);

pub(crate) type Construct = Arc<dyn Fn() -> DiResult<RawArc> + Send + Sync>;
pub(crate) type Publish = Arc<dyn Fn(RawArc) -> DiResult<AnyArc> + Send + Sync>;

/// Arena index of a binding. Bindings are compared by identity, never by
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct BindingId(pub(crate) usize);

/// How instances of an implementation type come to be.
#[derive(Clone)]
pub(crate) struct Activation {
    pub(crate) implementation: Key,
    /// Zero-argument creation: a new instance, or the bound constant
    pub(crate) construct: Construct,
    pub(crate) describe: fn() -> InjectionPlan,
    pub(crate) on_ready: fn(RawRef<'_>),
    /// Turns `Arc<I>` into the stored `Arc<S>` view
    pub(crate) publish: Publish,
    pub(crate) constant: bool,
}

impl Activation {
    /// Activation for implementation `I` published as service `S`.
    pub(crate) fn new<I, S>(construct: Construct, upcast: fn(Arc<I>) -> Arc<S>) -> Self
    where
        I: Injectable,
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            implementation: Key::of::<I>(),
            construct,
            describe: InjectionPlan::of::<I>,
            on_ready: ready::<I>,
            publish: Arc::new(move |raw: RawArc| -> DiResult<AnyArc> {
                let instance = raw
                    .downcast::<I>()
                    .map_err(|_| DiError::TypeMismatch(type_name::<I>()))?;
                Ok(Arc::new(upcast(instance)) as AnyArc)
            }),
            constant: false,
        }
    }

    /// New instances through `Default`.
    pub(crate) fn with_default<I, S>(upcast: fn(Arc<I>) -> Arc<S>) -> Self
    where
        I: Injectable + Default,
        S: ?Sized + Send + Sync + 'static,
    {
        let construct: Construct = Arc::new(|| -> DiResult<RawArc> { Ok(Arc::new(I::default())) });
        Self::new::<I, S>(construct, upcast)
    }

    /// New instances through a fallible zero-argument constructor.
    pub(crate) fn with_constructor<I, S, F, E>(ctor: F, upcast: fn(Arc<I>) -> Arc<S>) -> Self
    where
        I: Injectable,
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<I, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let construct: Construct = Arc::new(move || -> DiResult<RawArc> {
            match ctor() {
                Ok(instance) => Ok(Arc::new(instance)),
                Err(err) => Err(DiError::Construction {
                    implementation: type_name::<I>(),
                    reason: err.to_string(),
                }),
            }
        });
        Self::new::<I, S>(construct, upcast)
    }

    /// Always the same, supplied instance.
    pub(crate) fn with_constant<I, S>(value: Arc<I>, upcast: fn(Arc<I>) -> Arc<S>) -> Self
    where
        I: Injectable,
        S: ?Sized + Send + Sync + 'static,
    {
        let construct: Construct = Arc::new(move || -> DiResult<RawArc> { Ok(value.clone()) });
        Self {
            constant: true,
            ..Self::new::<I, S>(construct, upcast)
        }
    }
}

fn ready<I: Injectable>(raw: RawRef<'_>) {
    if let Some(instance) = raw.downcast_ref::<I>() {
        instance.on_ready();
    }
}

/// Upcast used when the implementation is the service type itself.
pub(crate) fn same<T: ?Sized>(value: Arc<T>) -> Arc<T> {
    value
}

/// A completed, immutable binding.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) service: Key,
    pub(crate) activation: Activation,
    pub(crate) lifetime: Lifetime,
    pub(crate) trigger: Trigger,
    /// Registered implicitly (factory bindings, the container self-binding)
    pub(crate) synthetic: bool,
}

impl Binding {
    pub(crate) fn implementation(&self) -> Key {
        self.activation.implementation
    }

    pub(crate) fn is_transient(&self) -> bool {
        self.lifetime == Lifetime::Transient
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.service.short_name())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("service", &self.service)
            .field("implementation", &self.activation.implementation)
            .field("lifetime", &self.lifetime)
            .field("trigger", &self.trigger)
            .field("constant", &self.activation.constant)
            .field("synthetic", &self.synthetic)
            .finish()
    }
}

/// A binding under declaration. Every attribute stays optional until the
/// terminal step turns the draft into a [`Binding`].
pub(crate) struct Draft {
    pub(crate) service: Key,
    /// Declared bases of the service type; empty for trait-object services
    pub(crate) service_ancestors: Vec<Key>,
    pub(crate) activation: Option<Activation>,
    pub(crate) lifetime: Option<Lifetime>,
    pub(crate) trigger: Option<Trigger>,
}

impl Draft {
    pub(crate) fn new(service: Key, service_ancestors: Vec<Key>) -> Self {
        Self {
            service,
            service_ancestors,
            activation: None,
            lifetime: None,
            trigger: None,
        }
    }

    /// Rejects implementations that are declared ancestors of the service.
    pub(crate) fn check_implementation(&self, implementation: Key) -> DiResult<()> {
        if self.service_ancestors.contains(&implementation) {
            return Err(DiError::InvalidImplementation {
                service: self.service.display_name(),
                implementation: implementation.display_name(),
                reason: "the implementation is an ancestor of the service type",
            });
        }
        Ok(())
    }

    /// Freezes the draft. Attributes are taken out, so a draft completes once.
    pub(crate) fn complete(&mut self) -> DiResult<Binding> {
        let service = self.service.display_name();
        let missing = |what| DiError::IncompleteBinding { service, missing: what };
        let activation = self.activation.take().ok_or_else(|| missing("implementation"))?;
        let lifetime = self.lifetime.take().ok_or_else(|| missing("lifetime"))?;
        let trigger = self.trigger.take().ok_or_else(|| missing("trigger"))?;
        Ok(Binding {
            service: self.service,
            activation,
            lifetime,
            trigger,
            synthetic: false,
        })
    }
}

/// Service registry holding all bindings in declaration order
#[derive(Default)]
pub(crate) struct Registry {
    bindings: Vec<Binding>,
    by_service: HashMap<Key, BindingId>,
}

impl Registry {
    /// A registry seeded with one binding, which takes the first id.
    pub(crate) fn with_binding(binding: Binding) -> Self {
        let mut by_service = HashMap::default();
        by_service.insert(binding.service, BindingId(0));
        Self {
            bindings: vec![binding],
            by_service,
        }
    }

    pub(crate) fn contains(&self, service: &Key) -> bool {
        self.by_service.contains_key(service)
    }

    /// Appends a binding; a second binding for the same service is refused.
    pub(crate) fn insert(&mut self, binding: Binding) -> DiResult<BindingId> {
        if self.contains(&binding.service) {
            return Err(DiError::DuplicateBinding(binding.service.display_name()));
        }
        let id = BindingId(self.bindings.len());
        self.by_service.insert(binding.service, id);
        self.bindings.push(binding);
        Ok(id)
    }

    pub(crate) fn id_of(&self, service: &Key) -> Option<BindingId> {
        self.by_service.get(service).copied()
    }

    pub(crate) fn get(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Binding ids in declaration order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = BindingId> + '_ {
        (0..self.bindings.len()).map(BindingId)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings.iter().enumerate().map(|(i, b)| (BindingId(i), b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Leaf;
    impl Injectable for Leaf {}

    #[derive(Default)]
    struct Other;
    impl Injectable for Other {}

    fn binding<T: Injectable + Default>() -> Binding {
        Binding {
            service: Key::of::<T>(),
            activation: Activation::with_default::<T, T>(same),
            lifetime: Lifetime::Cached,
            trigger: Trigger::OnRequest,
            synthetic: false,
        }
    }

    #[test]
    fn seeded_registry_owns_its_first_binding() {
        let mut registry = Registry::with_binding(binding::<Leaf>());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.id_of(&Key::of::<Leaf>()), Some(BindingId(0)));
        assert_eq!(registry.get(BindingId(0)).implementation(), Key::of::<Leaf>());

        assert!(matches!(
            registry.insert(binding::<Leaf>()),
            Err(DiError::DuplicateBinding(_))
        ));
        assert_eq!(registry.insert(binding::<Other>()).unwrap(), BindingId(1));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![BindingId(0), BindingId(1)]);
    }
}
