//! Diagnostic observers for container events.
//!
//! Observers see every completed binding, every constructed instance, every
//! top-level resolution and the end of installation. They are called
//! synchronously, outside the container's data lock, so an observer may
//! inspect the container (for example through `descriptors`) while it runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::descriptors::BindingDescriptor;
use crate::internal::HashMap;
use crate::Key;

/// Observer trait for container events.
///
/// Every method has an empty default, so an observer only implements the
/// events it cares about.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Container, ContainerObserver, Injectable, Key};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ContainerObserver for Counter {
///     fn constructed(&self, _service: &Key, _implementation: &Key) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// #[derive(Default)]
/// struct Cache;
/// impl Injectable for Cache {}
///
/// let counter = Arc::new(Counter::default());
/// let container = Container::new();
/// container.add_observer(counter.clone()).unwrap();
/// container.bind::<Cache>().unwrap().to_new().as_cached().on_install().unwrap();
/// container.install().unwrap();
/// container.resolve::<Cache>().unwrap();
///
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// Called when a binding has been added to the registry.
    fn binding_added(&self, descriptor: &BindingDescriptor) {
        let _ = descriptor;
    }

    /// Called when an instance has been constructed, injected and readied.
    ///
    /// For constants this marks the moment the constant was injected and
    /// readied, which happens once.
    fn constructed(&self, service: &Key, implementation: &Key) {
        let _ = (service, implementation);
    }

    /// Called when a top-level `resolve` has succeeded.
    fn resolved(&self, service: &Key, duration: Duration) {
        let _ = (service, duration);
    }

    /// Called after `install` has sealed the container and resolved every
    /// eager binding.
    fn installed(&self, eager: usize, duration: Duration) {
        let _ = (eager, duration);
    }
}

/// Collection of observers for container events.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn binding_added(&self, descriptor: &BindingDescriptor) {
        for observer in &self.observers {
            observer.binding_added(descriptor);
        }
    }

    pub(crate) fn constructed(&self, service: &Key, implementation: &Key) {
        for observer in &self.observers {
            observer.constructed(service, implementation);
        }
    }

    pub(crate) fn resolved(&self, service: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(service, duration);
        }
    }

    pub(crate) fn installed(&self, eager: usize, duration: Duration) {
        for observer in &self.observers {
            observer.installed(eager, duration);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Container, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(LoggingObserver::new())).unwrap();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-inject]".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for LoggingObserver {
    fn binding_added(&self, descriptor: &BindingDescriptor) {
        tracing::debug!(
            service = descriptor.type_name(),
            implementation = descriptor.implementation_name(),
            lifetime = ?descriptor.lifetime,
            trigger = ?descriptor.trigger,
            "{} binding added",
            self.prefix
        );
    }

    fn constructed(&self, service: &Key, implementation: &Key) {
        tracing::debug!(
            service = service.display_name(),
            implementation = implementation.display_name(),
            "{} constructed",
            self.prefix
        );
    }

    fn resolved(&self, service: &Key, duration: Duration) {
        tracing::trace!(service = service.display_name(), ?duration, "{} resolved", self.prefix);
    }

    fn installed(&self, eager: usize, duration: Duration) {
        tracing::info!(eager, ?duration, "{} installed", self.prefix);
    }
}

/// Observer that counts events.
///
/// Construction counts are also kept per service type, which makes it easy
/// to check that a cached service was built exactly once.
pub struct MetricsObserver {
    pub binding_count: AtomicU64,
    pub construction_count: AtomicU64,
    pub resolution_count: AtomicU64,
    pub total_resolution_time: AtomicU64,
    per_service: Mutex<HashMap<Key, u64>>,
}

impl MetricsObserver {
    /// Creates a new metrics observer.
    pub fn new() -> Self {
        Self {
            binding_count: AtomicU64::new(0),
            construction_count: AtomicU64::new(0),
            resolution_count: AtomicU64::new(0),
            total_resolution_time: AtomicU64::new(0),
            per_service: Mutex::new(HashMap::default()),
        }
    }

    /// Gets the number of bindings added while observed.
    pub fn binding_count(&self) -> u64 {
        self.binding_count.load(Ordering::Relaxed)
    }

    /// Gets the total number of constructed instances.
    pub fn construction_count(&self) -> u64 {
        self.construction_count.load(Ordering::Relaxed)
    }

    /// Gets the number of instances constructed for one service type.
    pub fn constructions_of(&self, service: &Key) -> u64 {
        self.per_service.lock().get(service).copied().unwrap_or(0)
    }

    /// Gets the total number of resolutions observed.
    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    /// Gets the average resolution time.
    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }

        let total_ns = self.total_resolution_time.load(Ordering::Relaxed);
        Some(Duration::from_nanos(total_ns / count))
    }

    /// Resets all metrics.
    pub fn reset(&self) {
        self.binding_count.store(0, Ordering::Relaxed);
        self.construction_count.store(0, Ordering::Relaxed);
        self.resolution_count.store(0, Ordering::Relaxed);
        self.total_resolution_time.store(0, Ordering::Relaxed);
        self.per_service.lock().clear();
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for MetricsObserver {
    fn binding_added(&self, _descriptor: &BindingDescriptor) {
        self.binding_count.fetch_add(1, Ordering::Relaxed);
    }

    fn constructed(&self, service: &Key, _implementation: &Key) {
        self.construction_count.fetch_add(1, Ordering::Relaxed);
        *self.per_service.lock().entry(*service).or_insert(0) += 1;
    }

    fn resolved(&self, _service: &Key, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_time
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_observer() {
        let observer = MetricsObserver::new();
        let key = crate::key_of_type::<String>();

        assert_eq!(observer.resolution_count(), 0);
        assert!(observer.average_resolution_time().is_none());

        observer.resolved(&key, Duration::from_millis(10));
        observer.resolved(&key, Duration::from_millis(20));
        observer.constructed(&key, &key);

        assert_eq!(observer.resolution_count(), 2);
        assert_eq!(observer.average_resolution_time(), Some(Duration::from_millis(15)));
        assert_eq!(observer.constructions_of(&key), 1);
        assert_eq!(observer.constructions_of(&crate::key_of_type::<u32>()), 0);

        observer.reset();
        assert_eq!(observer.resolution_count(), 0);
        assert_eq!(observer.construction_count(), 0);
        assert_eq!(observer.constructions_of(&key), 0);
    }

    #[test]
    fn test_observers_fan_out() {
        let metrics = Arc::new(MetricsObserver::new());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());

        observers.add(metrics.clone());
        observers.add(Arc::new(LoggingObserver::with_prefix("[test]")));
        assert!(observers.has_observers());

        let key = crate::key_of_type::<String>();
        observers.constructed(&key, &key);
        observers.resolved(&key, Duration::from_millis(1));
        observers.installed(1, Duration::from_millis(1));

        assert_eq!(metrics.construction_count(), 1);
        assert_eq!(metrics.resolution_count(), 1);
    }
}
