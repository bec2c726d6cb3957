//! Injectable field discovery and write-once injection slots.
//!
//! A type opts into field injection by implementing [`Injectable`] and
//! declaring its [`Inject`] fields (and any embedded base types) in
//! [`Injectable::injection_points`]. The container turns that declaration
//! into an [`InjectionPlan`]: the ordered list of fields with a type-erased
//! setter for each, most-derived type first.

use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::{AnyArc, RawRef};

/// Type-erased setter: fills one field of a target with a resolved instance.
pub(crate) type Setter = Arc<dyn Fn(RawRef<'_>, &AnyArc) -> DiResult<()> + Send + Sync>;

/// A type whose dependencies the container can inject.
///
/// Types without dependencies implement it with an empty body. Types with
/// dependencies list each [`Inject`] field in declaration order, and each
/// embedded base type whose fields they inherit.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Inject, Injectable, InjectionPoints, InjectionPlan, Key};
///
/// #[derive(Default)]
/// struct Clock;
/// impl Injectable for Clock {}
///
/// #[derive(Default)]
/// struct Audit {
///     clock: Inject<Clock>,
/// }
/// impl Injectable for Audit {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("clock", |a| &a.clock);
///     }
/// }
///
/// let plan = InjectionPlan::of::<Audit>();
/// assert_eq!(plan.dependencies(), vec![Key::of::<Clock>()]);
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Declares the injectable fields and base types of `Self`.
    fn injection_points(points: &mut InjectionPoints<Self>)
    where
        Self: Sized,
    {
        let _ = points;
    }

    /// Runs once, right after every field has been injected and before the
    /// instance is stored or handed out.
    fn on_ready(&self) {}
}

/// A dependency slot filled by the container.
///
/// Slots are written once. Injecting an already filled slot again keeps the
/// first value, so re-injecting an object with cached dependencies is a no-op.
pub struct Inject<T: ?Sized> {
    slot: OnceCell<Arc<T>>,
}

impl<T: ?Sized> Inject<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self { slot: OnceCell::new() }
    }

    /// Creates a slot that is already filled.
    pub fn with(value: Arc<T>) -> Self {
        Self { slot: OnceCell::with_value(value) }
    }

    /// The injected instance, if the slot has been filled.
    pub fn get(&self) -> Option<&Arc<T>> {
        self.slot.get()
    }

    /// Whether the slot has been filled.
    pub fn is_injected(&self) -> bool {
        self.slot.get().is_some()
    }

    pub(crate) fn fill(&self, value: Arc<T>) {
        // First fill wins
        let _ = self.slot.set(value);
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.slot.get() {
            Some(value) => value,
            None => panic!("Dependency {} used before injection", type_name::<T>()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}

/// One injectable field of an implementation type.
#[derive(Clone)]
pub struct InjectionPoint {
    name: &'static str,
    declared_in: Key,
    dependency: Key,
    pub(crate) setter: Setter,
}

impl InjectionPoint {
    /// Field name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type that declares the field (the type itself or one of its bases).
    pub fn declared_in(&self) -> Key {
        self.declared_in
    }

    /// The service type the field depends on.
    pub fn dependency(&self) -> Key {
        self.dependency
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.declared_in.short_name(), self.name, self.dependency.short_name())
    }
}

/// Collector passed to [`Injectable::injection_points`].
pub struct InjectionPoints<T> {
    fields: Vec<InjectionPoint>,
    bases: Vec<(Key, InjectionPlan, Projection)>,
    _owner: PhantomData<fn(&T)>,
}

type Projection = Arc<dyn for<'a> Fn(RawRef<'a>) -> DiResult<RawRef<'a>> + Send + Sync>;

// Pins closure signatures to the higher-ranked shapes above
fn erase_setter<F>(f: F) -> F
where
    F: Fn(RawRef<'_>, &AnyArc) -> DiResult<()> + Send + Sync + 'static,
{
    f
}

fn erase_projection<F>(f: F) -> F
where
    F: for<'a> Fn(RawRef<'a>) -> DiResult<RawRef<'a>> + Send + Sync + 'static,
{
    f
}

impl<T: Injectable> InjectionPoints<T> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            bases: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Declares an injectable field of type `Inject<D>`.
    pub fn field<D>(&mut self, name: &'static str, access: fn(&T) -> &Inject<D>) -> &mut Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        let setter: Setter = Arc::new(erase_setter(move |target, value| {
            let target = target
                .downcast_ref::<T>()
                .ok_or(DiError::TypeMismatch(type_name::<T>()))?;
            let value = value
                .downcast_ref::<Arc<D>>()
                .ok_or(DiError::TypeMismatch(type_name::<D>()))?;
            access(target).fill(value.clone());
            Ok(())
        }));
        self.fields.push(InjectionPoint {
            name,
            declared_in: Key::of::<T>(),
            dependency: Key::of::<D>(),
            setter,
        });
        self
    }

    /// Declares an embedded base type whose injectable fields `T` inherits.
    pub fn base<B: Injectable>(&mut self, access: fn(&T) -> &B) -> &mut Self {
        let projection: Projection = Arc::new(erase_projection(move |target| {
            let target = target
                .downcast_ref::<T>()
                .ok_or(DiError::TypeMismatch(type_name::<T>()))?;
            Ok(access(target) as RawRef<'_>)
        }));
        self.bases.push((Key::of::<B>(), InjectionPlan::of::<B>(), projection));
        self
    }

    fn finish(self) -> InjectionPlan {
        let mut points = self.fields;
        let mut ancestors = Vec::new();
        for (base, plan, projection) in self.bases {
            ancestors.push(base);
            ancestors.extend(plan.ancestors.iter().copied());
            for point in plan.points.iter() {
                let inner = point.setter.clone();
                let projection = projection.clone();
                let setter: Setter = Arc::new(erase_setter(move |target, value| {
                    inner(projection(target)?, value)
                }));
                points.push(InjectionPoint {
                    name: point.name,
                    declared_in: point.declared_in,
                    dependency: point.dependency,
                    setter,
                });
            }
        }
        InjectionPlan {
            owner: Key::of::<T>(),
            points: points.into(),
            ancestors: ancestors.into(),
        }
    }
}

/// The injectable fields of a type, most-derived first.
#[derive(Clone)]
pub struct InjectionPlan {
    owner: Key,
    points: Arc<[InjectionPoint]>,
    ancestors: Arc<[Key]>,
}

impl InjectionPlan {
    /// Collects the injection points of `T` and all of its bases.
    pub fn of<T: Injectable>() -> Self {
        let mut points = InjectionPoints::<T>::new();
        T::injection_points(&mut points);
        points.finish()
    }

    /// The type this plan describes.
    pub fn owner(&self) -> Key {
        self.owner
    }

    /// Every injectable field, own fields in declaration order followed by
    /// each base's fields.
    pub fn points(&self) -> &[InjectionPoint] {
        &self.points
    }

    /// Distinct dependency types, in first-seen order.
    pub fn dependencies(&self) -> Vec<Key> {
        let mut out: Vec<Key> = Vec::with_capacity(self.points.len());
        for point in self.points.iter() {
            if !out.contains(&point.dependency) {
                out.push(point.dependency);
            }
        }
        out
    }

    /// Every declared base type, transitively.
    pub fn ancestors(&self) -> &[Key] {
        &self.ancestors
    }

    /// Whether `id` is one of the declared base types.
    pub fn has_ancestor(&self, id: TypeId) -> bool {
        self.ancestors.iter().any(|k| k.type_id() == id)
    }

    /// Runs every setter against `target` using `lookup` to supply values.
    pub(crate) fn apply<F>(&self, target: RawRef<'_>, mut lookup: F) -> DiResult<()>
    where
        F: FnMut(&InjectionPoint) -> DiResult<AnyArc>,
    {
        for point in self.points.iter() {
            let value = lookup(point)?;
            (point.setter)(target, &value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for InjectionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPlan")
            .field("owner", &self.owner)
            .field("points", &self.points)
            .field("ancestors", &self.ancestors)
            .finish()
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

    #[derive(Default)]
    struct Base {
        leaf: Inject<Leaf>,
    }
    impl Injectable for Base {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("leaf", |b| &b.leaf);
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
        other: Inject<Other>,
        again: Inject<Leaf>,
    }
    impl Injectable for Derived {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points
                .base(|d| &d.base)
                .field("other", |d| &d.other)
                .field("again", |d| &d.again);
        }
    }

    #[test]
    fn own_fields_come_before_base_fields() {
        let plan = InjectionPlan::of::<Derived>();
        let names: Vec<_> = plan.points().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["other", "again", "leaf"]);
        assert_eq!(plan.points()[2].declared_in(), Key::of::<Base>());
    }

    #[test]
    fn dependencies_are_distinct() {
        let plan = InjectionPlan::of::<Derived>();
        assert_eq!(plan.dependencies(), vec![Key::of::<Other>(), Key::of::<Leaf>()]);
        assert!(plan.has_ancestor(TypeId::of::<Base>()));
        assert!(!plan.has_ancestor(TypeId::of::<Leaf>()));
    }

    #[test]
    fn setters_reach_base_fields() {
        let plan = InjectionPlan::of::<Derived>();
        let target = Derived::default();
        let leaf: AnyArc = Arc::new(Arc::new(Leaf));
        let other: AnyArc = Arc::new(Arc::new(Other));
        plan.apply(&target, |point| {
            if point.dependency() == Key::of::<Leaf>() {
                Ok(leaf.clone())
            } else {
                Ok(other.clone())
            }
        })
        .unwrap();

        assert!(target.base.leaf.is_injected());
        assert!(target.other.is_injected());
        assert!(target.again.is_injected());
    }

    #[test]
    fn slot_keeps_first_value() {
        let slot = Inject::<Leaf>::new();
        let first = Arc::new(Leaf);
        slot.fill(first.clone());
        slot.fill(Arc::new(Leaf));
        assert!(Arc::ptr_eq(slot.get().unwrap(), &first));
    }

    #[test]
    #[should_panic(expected = "used before injection")]
    fn deref_before_injection_panics() {
        let slot = Inject::<Leaf>::new();
        let _ = &*slot;
    }
}
