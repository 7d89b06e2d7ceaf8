//! Error types for Wirebox container operations.
//!
//! Every failure is raised synchronously to the caller of the bind or
//! resolve operation that caused it. Nothing is retried internally.

use std::fmt;

use wirebox_support::rendering::render_chain;

use crate::key::DependencyKey;

/// Error type returned by release hooks and carried inside
/// [`ReleaseFailedError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Wirebox operations.
#[derive(Debug, thiserror::Error)]
pub enum WireboxError {
    /// The contract is already bound and the policy is error-if-exists.
    #[error("{}", .0)]
    DuplicateBinding(DuplicateBindingError),

    /// No binding for the contract anywhere in the fallback chain.
    #[error("{}", .0)]
    MissingBinding(MissingBindingError),

    /// A concrete type was re-entered during its own construction.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Every constructor of the concrete type is deprecated, or it has none.
    #[error("Type {concrete} has no usable constructors\n  Hint: register at least one constructor that is not marked deprecated")]
    NoUsableConstructor { concrete: DependencyKey },

    /// A constructor carries the mandatory-inject marker.
    #[error(
        "Constructor `{constructor}` of {concrete} is marked for injection\n  Hint: constructor parameters are injected already, remove the marker"
    )]
    InjectOnConstructor {
        concrete: DependencyKey,
        constructor: &'static str,
    },

    /// A produced value did not have the type its key promised.
    #[error("Type mismatch: expected a value of {expected}")]
    TypeMismatch { expected: DependencyKey },

    /// `instantiate` was asked for a contract that is not bound to a template.
    #[error("{key} is not bound to a template")]
    NotTemplate { key: DependencyKey },

    /// No template instantiation primitive is configured in the chain.
    #[error("Cannot instantiate {concrete}: no instantiator is configured\n  Hint: set one with ContainerBuilder::instantiator")]
    NoInstantiator { concrete: DependencyKey },

    /// The instantiation primitive produced nothing.
    #[error("The instantiator produced no object for template {concrete}")]
    InstantiationFailed { concrete: DependencyKey },

    /// One or more release hooks failed during teardown.
    #[error("{}", .0)]
    ReleaseFailed(ReleaseFailedError),

    /// The container was torn down and cannot be used again.
    #[error("Container has been disposed and cannot be reused")]
    ContainerDisposed,

    /// A non-lazy handle was used with a container other than the one it
    /// was bound in.
    #[error(
        "Singleton {concrete} was bound in another container\n  Hint: call as_non_lazy with the container that returned the handle"
    )]
    ForeignContainer { concrete: DependencyKey },
}

/// Error when a contract is bound twice under the strict policy.
#[derive(Debug)]
pub struct DuplicateBindingError {
    pub key: DependencyKey,
}

impl fmt::Display for DuplicateBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} has already been bound", self.key)?;
        write!(
            f,
            "\n  Hint: use the *_if_not_bound or force_* variants, or enable allow_override in the settings"
        )
    }
}

/// Error when a contract has no binding in the container or its fallbacks.
#[derive(Debug)]
pub struct MissingBindingError {
    /// The contract that was requested.
    pub requested: DependencyKey,
    /// The concrete type under construction when the lookup failed.
    pub required_by: Option<DependencyKey>,
    /// Bound contracts with similar names.
    pub suggestions: Vec<String>,
}

impl fmt::Display for MissingBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No binding exists for {} in the container or its fallbacks",
            self.requested
        )?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// Error when a circular dependency is detected.
///
/// `chain` runs from the first occurrence of the repeated type down to the
/// repeated type itself, so it starts and ends with the same key.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub chain: Vec<DependencyKey>,
}

impl CircularDependencyError {
    /// Returns true if `key` takes part in the cycle.
    pub fn involves(&self, key: &DependencyKey) -> bool {
        self.chain.contains(key)
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(DependencyKey::short_name).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))
    }
}

/// A single release hook failure.
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Concrete type whose release failed.
    pub key: DependencyKey,
    pub source: BoxError,
}

/// All release failures collected during one teardown.
#[derive(Debug)]
pub struct ReleaseFailedError {
    pub failures: Vec<ReleaseFailure>,
}

impl fmt::Display for ReleaseFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} value(s) failed to release:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  - {}: {}", failure.key, failure.source)?;
        }
        Ok(())
    }
}

/// Convenient Result type for Wirebox operations.
pub type Result<T> = std::result::Result<T, WireboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Session;
    struct Repository;

    #[test]
    fn missing_binding_display() {
        let err = WireboxError::MissingBinding(MissingBindingError {
            requested: DependencyKey::of::<String>(),
            required_by: Some(DependencyKey::of::<Vec<u8>>()),
            suggestions: vec!["alloc::string::Str".to_string()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("No binding exists"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Required by"));
        assert!(msg.contains("Did you mean"));
    }

    #[test]
    fn circular_dependency_display() {
        let err = WireboxError::CircularDependency(CircularDependencyError {
            chain: vec![
                DependencyKey::of::<Session>(),
                DependencyKey::of::<Repository>(),
                DependencyKey::of::<Session>(),
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Session -> Repository -> Session"));
    }

    #[test]
    fn release_failed_lists_every_failure() {
        let err = WireboxError::ReleaseFailed(ReleaseFailedError {
            failures: vec![
                ReleaseFailure {
                    key: DependencyKey::of::<Session>(),
                    source: "socket already closed".into(),
                },
                ReleaseFailure {
                    key: DependencyKey::of::<Repository>(),
                    source: "flush failed".into(),
                },
            ],
        });

        let msg = format!("{err}");
        assert!(msg.starts_with("2 value(s)"));
        assert!(msg.contains("socket already closed"));
        assert!(msg.contains("flush failed"));
    }

    #[test]
    fn foreign_container_display() {
        let err = WireboxError::ForeignContainer {
            concrete: DependencyKey::of::<Session>(),
        };
        assert!(format!("{err}").contains("bound in another container"));
    }

    #[test]
    fn duplicate_binding_display() {
        let err = WireboxError::DuplicateBinding(DuplicateBindingError {
            key: DependencyKey::of::<Session>(),
        });
        assert!(format!("{err}").contains("already been bound"));
    }
}
