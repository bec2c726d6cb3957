//! Binding descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::{Lifetime, Trigger};
use crate::registration::Binding;

/// Binding descriptor for introspection and diagnostics
///
/// A snapshot of one binding: which service it answers, which type backs it,
/// and how its instances are created. Descriptors are listed in declaration
/// order, the container's own self-binding first.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Container, ContainerRef, Injectable, Lifetime, Trigger};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// impl Injectable for Database {}
///
/// #[derive(Default)]
/// struct Job;
/// impl Injectable for Job {}
///
/// let container = Container::new();
/// container.bind::<Database>().unwrap().to_new().as_cached().on_install().unwrap();
/// container.bind::<Job>().unwrap().to_new().as_transient().on_request().unwrap();
///
/// let descriptors = container.descriptors();
/// assert!(descriptors[0].type_name().ends_with("ContainerRef"));
///
/// let db = descriptors.iter().find(|d| d.type_name().ends_with("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Cached);
/// assert_eq!(db.trigger, Trigger::OnInstall);
///
/// // Transient bindings bring a synthetic factory binding along
/// assert!(descriptors.iter().any(|d| d.synthetic && d.type_name().contains("Factory")));
/// ```
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    /// The service type the binding answers
    pub service: Key,
    /// The concrete type that backs the service
    pub implementation: Key,
    /// Binding lifetime
    pub lifetime: Lifetime,
    /// Binding trigger
    pub trigger: Trigger,
    /// Whether the binding hands out a supplied constant
    pub constant: bool,
    /// Whether the container registered the binding on its own
    pub synthetic: bool,
    /// Whether a cached instance is currently stored
    pub resolved: bool,
}

impl BindingDescriptor {
    pub(crate) fn from_binding(binding: &Binding, resolved: bool) -> Self {
        Self {
            service: binding.service,
            implementation: binding.implementation(),
            lifetime: binding.lifetime,
            trigger: binding.trigger,
            constant: binding.activation.constant,
            synthetic: binding.synthetic,
            resolved,
        }
    }

    /// Get the service type name
    pub fn type_name(&self) -> &'static str {
        self.service.display_name()
    }

    /// Get the implementation type name
    pub fn implementation_name(&self) -> &'static str {
        self.implementation.display_name()
    }

    /// Whether the service is bound to itself rather than to a subtype.
    pub fn is_self_bound(&self) -> bool {
        self.service == self.implementation
    }
}
