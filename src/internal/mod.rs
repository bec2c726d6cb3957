//! Internal implementation details.

pub(crate) mod cache;
pub(crate) mod circular;

pub(crate) use cache::DependencyCache;
pub(crate) use circular::ResolutionStack;

#[cfg(feature = "ahash")]
pub(crate) type HashMap<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "ahash")]
pub(crate) type HashSet<T> = ahash::AHashSet<T>;
#[cfg(not(feature = "ahash"))]
pub(crate) type HashSet<T> = std::collections::HashSet<T>;
