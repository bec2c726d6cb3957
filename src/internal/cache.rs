//! Lazily computed, per-implementation memoisation.

use smallvec::SmallVec;

use crate::inject::InjectionPlan;
use crate::internal::HashMap;
use crate::key::Key;
use crate::registration::BindingId;

/// Direct dependency bindings of one implementation type.
pub(crate) type DirectDeps = SmallVec<[BindingId; 4]>;

/// Injection plans and direct dependency bindings, keyed by implementation
/// type. Entries are computed once and never invalidated: bindings are only
/// ever added, so a complete dependency mapping stays valid.
#[derive(Default)]
pub(crate) struct DependencyCache {
    plans: HashMap<Key, InjectionPlan>,
    direct: HashMap<Key, DirectDeps>,
}

impl DependencyCache {
    pub(crate) fn plan(&self, implementation: &Key) -> Option<InjectionPlan> {
        self.plans.get(implementation).cloned()
    }

    /// Stores a plan unless another one got there first; returns the stored one.
    pub(crate) fn store_plan(&mut self, implementation: Key, plan: InjectionPlan) -> InjectionPlan {
        self.plans.entry(implementation).or_insert(plan).clone()
    }

    pub(crate) fn direct(&self, implementation: &Key) -> Option<DirectDeps> {
        self.direct.get(implementation).cloned()
    }

    pub(crate) fn store_direct(&mut self, implementation: Key, deps: DirectDeps) {
        self.direct.entry(implementation).or_insert(deps);
    }

    #[cfg(test)]
    pub(crate) fn plan_count(&self) -> usize {
        self.plans.len()
    }
}
