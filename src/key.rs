//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key for binding storage and lookup.
///
/// A key identifies a service or implementation type. It works for concrete
/// types and for trait objects alike, since `TypeId` is available for any
/// `'static` type including `dyn Trait`.
///
/// Equality and hashing use the `TypeId` only; the name is carried for
/// error messages and diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::Key;
///
/// trait Logger: Send + Sync {}
///
/// let concrete = Key::of::<String>();
/// let abstract_key = Key::of::<dyn Logger>();
///
/// assert_eq!(concrete, Key::of::<String>());
/// assert_ne!(concrete, abstract_key);
/// assert_eq!(concrete.display_name(), "alloc::string::String");
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Creates the key of `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` this key stands for.
    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Get the type name for display
    ///
    /// This is the `std::any::type_name` result of the keyed type.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path, e.g. `Factory<Logger>`.
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            match ch {
                ':' => segment.clear(),
                '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                    out.push_str(&segment);
                    segment.clear();
                    out.push(ch);
                }
                _ => segment.push(ch),
            }
        }
        out.push_str(&segment);
        out
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Names give a stable order for diagnostics output
impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Helper function for creating type keys
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
