//! The container: binding state, installation and the resolution engine.
//!
//! A [`Container`] moves through three phases. While *open* it accepts
//! binding declarations (one at a time, the registry is *declaring* while a
//! builder is alive). [`Container::install`] *seals* it: no declaration is
//! accepted any more, eager bindings are resolved, and `resolve` / `inject`
//! become available.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::config::ContainerConfig;
use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::inject::{Injectable, InjectionPlan, InjectionPoint};
use crate::internal::cache::DirectDeps;
use crate::internal::{DependencyCache, HashMap, HashSet, ResolutionStack};
use crate::key::Key;
use crate::lifetime::{Lifetime, Trigger};
use crate::observer::{ContainerObserver, Observers};
use crate::registration::{same, Activation, AnyArc, Binding, BindingId, RawRef, Registry};
use crate::traits::{Resolver, ResolverCore};
use crate::validation::check_circular;

pub mod context;
pub use context::ContainerRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Open,
    /// A builder for the named service is alive
    Declaring(&'static str),
    Sealed,
}

pub(crate) struct State {
    pub(crate) phase: Phase,
    pub(crate) registry: Registry,
    /// Cached instances only
    pub(crate) instances: HashMap<BindingId, AnyArc>,
    pub(crate) cache: DependencyCache,
}

/// Dependency injection container.
///
/// The container owns every binding and every cached instance. It is a cheap
/// handle: clones share the same state. All operations are synchronous and
/// the container is `Send + Sync`; each public operation runs under one
/// re-entrant lock, so calls from different threads never interleave while
/// nested calls from `on_ready` hooks on the same thread proceed.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Container, Inject, Injectable, InjectionPoints};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// impl Injectable for Database {}
///
/// #[derive(Default)]
/// struct UserService {
///     db: Inject<Database>,
/// }
/// impl Injectable for UserService {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("db", |s| &s.db);
///     }
/// }
///
/// let container = Container::new();
/// container.bind::<Database>().unwrap().to_new().as_cached().on_install().unwrap();
/// container.bind::<UserService>().unwrap().to_new().as_cached().on_request().unwrap();
/// container.install().unwrap();
///
/// let users = container.resolve::<UserService>().unwrap();
/// let db = container.resolve::<Database>().unwrap();
/// assert!(Arc::ptr_eq(users.db.get().unwrap(), &db));
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    op_lock: ReentrantMutex<()>,
    state: Mutex<State>,
    stack: ResolutionStack,
    observers: RwLock<Observers>,
    config: ContainerConfig,
}

impl Container {
    /// Creates an open container with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an open container.
    ///
    /// The container starts with one binding: [`ContainerRef`], a constant
    /// handle back to the container itself, so services and factories can
    /// depend on the resolver through field injection.
    pub fn with_config(config: ContainerConfig) -> Self {
        let inner = Arc::new_cyclic(|weak| {
            let handle = Arc::new(ContainerRef::new(weak.clone()));
            let binding = Binding {
                service: Key::of::<ContainerRef>(),
                activation: Activation::with_constant::<ContainerRef, ContainerRef>(handle, same),
                lifetime: Lifetime::Cached,
                trigger: Trigger::OnRequest,
                synthetic: true,
            };
            ContainerInner {
                op_lock: ReentrantMutex::new(()),
                state: Mutex::new(State {
                    phase: Phase::Open,
                    registry: Registry::with_binding(binding),
                    instances: HashMap::default(),
                    cache: DependencyCache::default(),
                }),
                stack: ResolutionStack::new(config.max_depth),
                observers: RwLock::new(Observers::new()),
                config,
            }
        });

        Self { inner }
    }

    /// The configuration the container was created with.
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// A weak handle to this container.
    pub fn handle(&self) -> ContainerRef {
        ContainerRef::new(Arc::downgrade(&self.inner))
    }

    /// Registers an observer. Only allowed before `install`.
    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) -> DiResult<()> {
        let _op = self.inner.op_lock.lock();
        if self.inner.state.lock().phase == Phase::Sealed {
            return Err(DiError::Sealed);
        }
        self.inner.observers.write().add(observer);
        Ok(())
    }

    /// Seals the container and resolves every `OnInstall` binding, in
    /// declaration order.
    ///
    /// Fails with [`DiError::Sealed`] when called twice and with
    /// [`DiError::DeclarationPending`] while a binding builder is alive.
    /// With [`ContainerConfig::validate_on_install`] set, [`validate`] runs
    /// first. An error during the eager sweep leaves the container sealed,
    /// with whatever was stored before the failure.
    ///
    /// [`validate`]: Container::validate
    pub fn install(&self) -> DiResult<()> {
        self.inner.install()
    }

    /// Checks the whole configuration before installation.
    ///
    /// In order: a circular dependency scan from every binding, resolution of
    /// every `OnInstall` binding, then resolution of every binding. Cached
    /// instances created here are kept, so a validated container starts warm.
    /// Fails with [`DiError::Sealed`] after `install`.
    pub fn validate(&self) -> DiResult<()> {
        self.inner.validate()
    }

    /// Resolves a service: the cached instance, or for transient bindings a
    /// freshly constructed, injected and readied one.
    pub fn resolve<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.get::<S>()
    }

    /// Fills the injectable fields of an object the container did not create,
    /// then runs its `on_ready` hook. The object's own type need not be bound.
    pub fn inject<T: Injectable>(&self, target: &T) -> DiResult<()> {
        Resolver::inject(self, target)
    }

    /// Whether `install` has run.
    pub fn is_sealed(&self) -> bool {
        self.inner.state.lock().phase == Phase::Sealed
    }

    /// Whether a binding for `S` exists.
    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        self.inner.state.lock().registry.contains(&Key::of::<S>())
    }

    /// Number of bindings, the self-binding and factory bindings included.
    pub fn len(&self) -> usize {
        self.inner.state.lock().registry.len()
    }

    /// Always false: the self-binding is present from the start.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors of every binding, in declaration order.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        let state = self.inner.state.lock();
        state
            .registry
            .iter()
            .map(|(id, binding)| {
                BindingDescriptor::from_binding(binding, state.instances.contains_key(&id))
            })
            .collect()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let state = self.inner.state.lock();
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str(&format!("Phase: {:?}\n", state.phase));
        s.push_str("Bindings:\n");
        for (id, binding) in state.registry.iter() {
            s.push_str(&format!(
                "  {} -> {}: {:?}/{:?}{}{}{}\n",
                binding.service.short_name(),
                binding.implementation().short_name(),
                binding.lifetime,
                binding.trigger,
                if binding.activation.constant { " constant" } else { "" },
                if binding.synthetic { " synthetic" } else { "" },
                if state.instances.contains_key(&id) { " [resolved]" } else { "" },
            ));
        }
        s
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Container")
            .field("phase", &state.phase)
            .field("bindings", &state.registry.len())
            .field("instances", &state.instances.len())
            .finish()
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.inner.resolve_any(key)
    }

    fn inject_any(
        &self,
        target: &(dyn Any + Send + Sync),
        owner: Key,
        describe: fn() -> InjectionPlan,
    ) -> DiResult<()> {
        self.inner.inject_any(target, owner, describe)
    }
}

impl Resolver for Container {}

impl ContainerInner {
    fn observers(&self) -> Option<Observers> {
        let observers = self.observers.read();
        observers.has_observers().then(|| observers.clone())
    }

    // ----- Declarations -----

    pub(crate) fn begin_declaration(&self, service: Key) -> DiResult<()> {
        let _op = self.op_lock.lock();
        let mut state = self.state.lock();
        match state.phase {
            Phase::Sealed => Err(DiError::Sealed),
            Phase::Declaring(pending) => Err(DiError::DeclarationPending(pending)),
            Phase::Open => {
                if state.registry.contains(&service) {
                    return Err(DiError::DuplicateBinding(service.display_name()));
                }
                state.phase = Phase::Declaring(service.display_name());
                Ok(())
            }
        }
    }

    /// Inserts the bindings of one declaration, all or none, and reopens the
    /// registry whatever the outcome.
    pub(crate) fn complete_declaration(&self, bindings: Vec<Binding>) -> DiResult<()> {
        let _op = self.op_lock.lock();
        let descriptors = {
            let mut state = self.state.lock();
            if let Phase::Declaring(_) = state.phase {
                state.phase = Phase::Open;
            }

            for (i, binding) in bindings.iter().enumerate() {
                let repeated = bindings[..i].iter().any(|b| b.service == binding.service);
                if repeated || state.registry.contains(&binding.service) {
                    return Err(DiError::DuplicateBinding(binding.service.display_name()));
                }
            }

            let mut descriptors = Vec::with_capacity(bindings.len());
            for binding in bindings {
                tracing::debug!(
                    service = binding.service.display_name(),
                    implementation = binding.implementation().display_name(),
                    lifetime = ?binding.lifetime,
                    trigger = ?binding.trigger,
                    "binding added"
                );
                descriptors.push(BindingDescriptor::from_binding(&binding, false));
                state.registry.insert(binding)?;
            }
            descriptors
        };

        if let Some(observers) = self.observers() {
            for descriptor in &descriptors {
                observers.binding_added(descriptor);
            }
        }
        Ok(())
    }

    pub(crate) fn abandon_declaration(&self) {
        let _op = self.op_lock.lock();
        let mut state = self.state.lock();
        if let Phase::Declaring(service) = state.phase {
            tracing::warn!(service, "binding declaration abandoned before completion");
            state.phase = Phase::Open;
        }
    }

    // ----- Lifecycle -----

    fn install(&self) -> DiResult<()> {
        let _op = self.op_lock.lock();
        let start = Instant::now();

        match self.state.lock().phase {
            Phase::Sealed => return Err(DiError::Sealed),
            Phase::Declaring(pending) => return Err(DiError::DeclarationPending(pending)),
            Phase::Open => {}
        }

        if self.config.validate_on_install {
            self.validate()?;
        }

        let (eager, total) = {
            let mut state = self.state.lock();
            state.phase = Phase::Sealed;
            let eager: Vec<BindingId> = state
                .registry
                .iter()
                .filter(|(_, b)| b.trigger == Trigger::OnInstall)
                .map(|(id, _)| id)
                .collect();
            (eager, state.registry.len())
        };

        tracing::info!(bindings = total, eager = eager.len(), "installing container");

        let mut visited = HashSet::default();
        for &id in &eager {
            self.ensure_resolved(id, &mut visited)?;
        }

        if let Some(observers) = self.observers() {
            observers.installed(eager.len(), start.elapsed());
        }
        Ok(())
    }

    fn validate(&self) -> DiResult<()> {
        let _op = self.op_lock.lock();
        let start = Instant::now();

        let (ids, eager) = {
            let state = self.state.lock();
            if state.phase == Phase::Sealed {
                return Err(DiError::Sealed);
            }
            let ids: Vec<BindingId> = state.registry.ids().collect();
            let eager: Vec<BindingId> = state
                .registry
                .iter()
                .filter(|(_, b)| b.trigger == Trigger::OnInstall)
                .map(|(id, _)| id)
                .collect();
            (ids, eager)
        };

        for &id in &ids {
            check_circular(id, |node| self.direct_dependencies(node), |node| self.service_name(node))?;
        }

        let mut visited = HashSet::default();
        for &id in &eager {
            self.ensure_resolved(id, &mut visited)?;
        }
        let mut visited = HashSet::default();
        for &id in &ids {
            self.ensure_resolved(id, &mut visited)?;
        }

        tracing::info!(bindings = ids.len(), elapsed = ?start.elapsed(), "container validated");
        Ok(())
    }

    // ----- Resolution -----

    pub(crate) fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let _op = self.op_lock.lock();
        let start = Instant::now();

        let (id, binding) = {
            let state = self.state.lock();
            if state.phase != Phase::Sealed {
                return Err(DiError::NotSealed);
            }
            let id = state
                .registry
                .id_of(key)
                .ok_or(DiError::NotFound(key.display_name()))?;
            (id, state.registry.get(id).clone())
        };

        tracing::trace!(service = key.display_name(), "resolving");

        let mut visited = HashSet::default();
        self.ensure_resolved(id, &mut visited)?;

        let instance = match binding.lifetime {
            Lifetime::Transient => {
                let _guard = self.stack.enter(id, binding.service.display_name())?;
                self.create(&binding)?
            }
            Lifetime::Cached => self
                .cached(id)
                .ok_or(DiError::NotFound(key.display_name()))?,
        };

        if let Some(observers) = self.observers() {
            observers.resolved(key, start.elapsed());
        }
        Ok(instance)
    }

    pub(crate) fn inject_any(
        &self,
        target: RawRef<'_>,
        owner: Key,
        describe: fn() -> InjectionPlan,
    ) -> DiResult<()> {
        let _op = self.op_lock.lock();
        if self.state.lock().phase != Phase::Sealed {
            return Err(DiError::NotSealed);
        }

        let plan = self.plan_for(owner, describe);
        let deps = self.dependency_ids(owner, &plan)?;

        tracing::trace!(target = owner.display_name(), fields = plan.points().len(), "injecting");

        let mut visited = HashSet::default();
        for id in deps {
            if visited.insert(id) {
                self.ensure_resolved(id, &mut visited)?;
            }
        }
        plan.apply(target, |point| self.injected_value(owner, point))
    }

    /// Makes sure a binding and everything it depends on is resolved.
    ///
    /// Cached bindings end up constructed and stored; transient bindings only
    /// get their dependencies resolved.
    fn ensure_resolved(&self, id: BindingId, visited: &mut HashSet<BindingId>) -> DiResult<()> {
        let binding = {
            let state = self.state.lock();
            let binding = state.registry.get(id);
            if binding.lifetime == Lifetime::Cached && state.instances.contains_key(&id) {
                return Ok(());
            }
            binding.clone()
        };

        let name = binding.service.display_name();
        let _guard = self.stack.enter(id, name)?;
        tracing::trace!(service = name, depth = self.stack.depth(), "ensuring resolved");

        for dep in self.direct_dependencies(id)? {
            if self.stack.contains(dep) {
                let path = self.stack.cycle_path(dep, self.service_name(dep));
                return Err(DiError::Circular(path));
            }
            if visited.insert(dep) {
                self.ensure_resolved(dep, visited)?;
            }
        }

        if binding.lifetime == Lifetime::Cached {
            let instance = self.create(&binding)?;
            self.store(id, instance);
        }
        Ok(())
    }

    /// Constructs, injects and readies one instance. No lock is held while
    /// constructors or hooks run.
    fn create(&self, binding: &Binding) -> DiResult<AnyArc> {
        let activation = &binding.activation;
        let raw = (activation.construct)()?;
        let plan = self.plan_for(activation.implementation, activation.describe);
        plan.apply(&*raw, |point| self.injected_value(binding.service, point))?;
        (activation.on_ready)(&*raw);
        let instance = (activation.publish)(raw)?;

        tracing::debug!(
            service = binding.service.display_name(),
            implementation = activation.implementation.display_name(),
            constant = activation.constant,
            "constructed"
        );
        if let Some(observers) = self.observers() {
            observers.constructed(&binding.service, &activation.implementation);
        }
        Ok(instance)
    }

    /// The cached instance a field of `dependent` receives.
    fn injected_value(&self, dependent: Key, point: &InjectionPoint) -> DiResult<AnyArc> {
        let dependency = point.dependency();
        let id = {
            let state = self.state.lock();
            let id = state.registry.id_of(&dependency).ok_or_else(|| DiError::MissingBinding {
                service: dependent.display_name(),
                dependency: dependency.display_name(),
            })?;
            if state.registry.get(id).is_transient() {
                return Err(DiError::TransientLookup {
                    dependent: dependent.display_name(),
                    dependency: dependency.display_name(),
                });
            }
            if let Some(instance) = state.instances.get(&id) {
                return Ok(instance.clone());
            }
            id
        };

        // Reached only when the dependency was not part of an earlier walk
        let mut visited = HashSet::default();
        self.ensure_resolved(id, &mut visited)?;
        self.cached(id).ok_or(DiError::NotFound(dependency.display_name()))
    }

    fn cached(&self, id: BindingId) -> Option<AnyArc> {
        self.state.lock().instances.get(&id).cloned()
    }

    fn store(&self, id: BindingId, instance: AnyArc) {
        self.state.lock().instances.entry(id).or_insert(instance);
    }

    fn service_name(&self, id: BindingId) -> &'static str {
        self.state.lock().registry.get(id).service.display_name()
    }

    /// Injection plan of a type, computed once.
    fn plan_for(&self, owner: Key, describe: fn() -> InjectionPlan) -> InjectionPlan {
        if let Some(plan) = self.state.lock().cache.plan(&owner) {
            return plan;
        }
        let plan = describe();
        self.state.lock().cache.store_plan(owner, plan)
    }

    /// Bindings of the distinct field types of a binding's implementation.
    fn direct_dependencies(&self, id: BindingId) -> DiResult<DirectDeps> {
        let (service, implementation, describe) = {
            let state = self.state.lock();
            let binding = state.registry.get(id);
            if let Some(deps) = state.cache.direct(&binding.implementation()) {
                return Ok(deps);
            }
            (binding.service, binding.implementation(), binding.activation.describe)
        };

        let plan = self.plan_for(implementation, describe);
        self.dependency_ids(service, &plan)
    }

    /// Maps the field types of `plan` to bindings. The mapping is stored
    /// only once every field type is bound.
    fn dependency_ids(&self, dependent: Key, plan: &InjectionPlan) -> DiResult<DirectDeps> {
        let mut state = self.state.lock();
        if let Some(deps) = state.cache.direct(&plan.owner()) {
            return Ok(deps);
        }
        let mut deps = DirectDeps::new();
        for dependency in plan.dependencies() {
            let id = state.registry.id_of(&dependency).ok_or_else(|| DiError::MissingBinding {
                service: dependent.display_name(),
                dependency: dependency.display_name(),
            })?;
            deps.push(id);
        }
        state.cache.store_direct(plan.owner(), deps.clone());
        Ok(deps)
    }
}
