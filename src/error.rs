//! Error types for the dependency injection container.

use thiserror::Error;

/// Dependency injection errors
///
/// Every error aborts the public operation that raised it. Nothing is
/// retried and no binding is skipped: a failed eager sweep leaves the
/// instance table as far as it got, which is safe because an instance is
/// only stored after construction and injection both succeeded.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Container, DiError, ErrorKind, Injectable};
///
/// #[derive(Default)]
/// struct Unbound;
/// impl Injectable for Unbound {}
///
/// let container = Container::new();
/// container.install().unwrap();
///
/// match container.resolve::<Unbound>() {
///     Err(err @ DiError::NotFound(_)) => {
///         assert_eq!(err.kind(), ErrorKind::MissingBinding);
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// A second binding was declared for an already bound service type
    #[error("Service {0} is already bound")]
    DuplicateBinding(&'static str),
    /// The terminal declaration step found an attribute that was never set
    #[error("Binding for {service} is incomplete: missing {missing}")]
    IncompleteBinding {
        service: &'static str,
        missing: &'static str,
    },
    /// The implementation type cannot back the service type
    #[error("{implementation} cannot implement {service}: {reason}")]
    InvalidImplementation {
        service: &'static str,
        implementation: &'static str,
        reason: &'static str,
    },
    /// Another binding declaration is still open
    #[error("Binding declaration for {0} has not been completed")]
    DeclarationPending(&'static str),
    /// The operation requires an open registry
    #[error("For this operation the container must not have been installed")]
    Sealed,
    /// The operation requires an installed registry
    #[error("For this operation the container must have been installed")]
    NotSealed,
    /// A transient binding was looked up in the instance table
    #[error("{dependency} is transient and cannot be injected into {dependent}; depend on Factory<{dependency}> instead")]
    TransientLookup {
        dependent: &'static str,
        dependency: &'static str,
    },
    /// No binding exists for a requested or depended-upon type
    #[error("{service} has a dependency on {dependency} which is not bound")]
    MissingBinding {
        service: &'static str,
        dependency: &'static str,
    },
    /// Requested service type has no binding
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// The zero-argument construction path failed
    #[error("Cannot construct {implementation}: {reason}")]
    Construction {
        implementation: &'static str,
        reason: String,
    },
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// A `ContainerRef` outlived its container
    #[error("The container behind this handle has been dropped")]
    ContainerDropped,
}

/// Coarse classification of [`DiError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Declarations or registry state are invalid for the requested operation
    Configuration,
    /// A dependency type has no binding
    MissingBinding,
    /// The dependency graph contains a cycle
    CircularDependency,
    /// An instance could not be constructed
    Construction,
    /// Broken internal invariant (downcast failures, dropped container)
    Internal,
}

impl DiError {
    /// Returns the error category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiError::DuplicateBinding(_)
            | DiError::IncompleteBinding { .. }
            | DiError::InvalidImplementation { .. }
            | DiError::DeclarationPending(_)
            | DiError::Sealed
            | DiError::NotSealed
            | DiError::TransientLookup { .. } => ErrorKind::Configuration,
            DiError::MissingBinding { .. } | DiError::NotFound(_) => ErrorKind::MissingBinding,
            DiError::Circular(_) | DiError::DepthExceeded(_) => ErrorKind::CircularDependency,
            DiError::Construction { .. } => ErrorKind::Construction,
            DiError::TypeMismatch(_) | DiError::ContainerDropped => ErrorKind::Internal,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
