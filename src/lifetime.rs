//! Binding lifetime and trigger definitions.

/// Binding lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Container, Injectable};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// impl Injectable for Database {}
///
/// #[derive(Default)]
/// struct RequestModel;
/// impl Injectable for RequestModel {}
///
/// let container = Container::new();
/// container.bind::<Database>().unwrap().to_new().as_cached().on_request().unwrap();
/// container.bind::<RequestModel>().unwrap().to_new().as_transient().on_request().unwrap();
/// container.install().unwrap();
///
/// // Cached: same instance on every resolve
/// let db1 = container.resolve::<Database>().unwrap();
/// let db2 = container.resolve::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Transient: new instance every time
/// let model1 = container.resolve::<RequestModel>().unwrap();
/// let model2 = container.resolve::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// Single instance per container, cached forever
    ///
    /// Constructed once, injected once, readied once, then shared by every
    /// resolve and every dependent for the life of the container.
    Cached,
    /// New instance per resolution, never cached
    ///
    /// Transient bindings hold no instance. Each `resolve` (or
    /// `Factory::create`) constructs, injects and readies a fresh one that
    /// the caller owns.
    Transient,
}

/// When a binding is first resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Trigger {
    /// Eagerly resolved while the container is installed
    OnInstall,
    /// Resolved lazily, on the first request that reaches it
    OnRequest,
}
