//! Binding registry: stores the bindings of one container.
//!
//! The registry maps a contract [`DependencyKey`] to exactly one
//! [`Binding`]. Re-registration is governed by a [`BindPolicy`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::container::Resolution;
use crate::dependency::Instance;
use crate::error::{DuplicateBindingError, Result, WireboxError};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;

/// Type alias for factory functions.
///
/// A factory receives the [`Resolution`] of the container that owns the
/// binding, so its own dependencies resolve from that container and its
/// fallbacks.
pub type FactoryFn = Arc<dyn Fn(&mut Resolution<'_>) -> Result<Instance> + Send + Sync>;

/// Wraps a closure as a [`FactoryFn`].
pub(crate) fn factory<F>(f: F) -> FactoryFn
where
    F: Fn(&mut Resolution<'_>) -> Result<Instance> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What to do when a contract is bound a second time in the same registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindPolicy {
    /// Fail with [`WireboxError::DuplicateBinding`].
    #[default]
    ErrorIfExists,
    /// Keep the existing binding and do nothing.
    SkipIfExists,
    /// Replace the existing binding.
    Overwrite,
}

/// A single contract binding.
#[derive(Clone)]
pub(crate) struct Binding {
    pub key: DependencyKey,
    pub lifetime: Lifetime,
    /// The concrete producer type, if the binding has one.
    pub concrete: Option<DependencyKey>,
    pub factory: FactoryFn,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("concrete", &self.concrete)
            .finish()
    }
}

/// Stores all bindings of one container.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    bindings: HashMap<DependencyKey, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `policy` to `key`.
    ///
    /// Returns `Ok(true)` when the caller should write the binding and
    /// `Ok(false)` when it should silently skip it.
    ///
    /// # Errors
    /// Returns [`WireboxError::DuplicateBinding`] if the key is already
    /// bound and the policy is [`BindPolicy::ErrorIfExists`].
    pub fn admit(&self, key: &DependencyKey, policy: BindPolicy) -> Result<bool> {
        if !self.bindings.contains_key(key) {
            return Ok(true);
        }

        match policy {
            BindPolicy::ErrorIfExists => Err(WireboxError::DuplicateBinding(
                DuplicateBindingError { key: *key },
            )),
            BindPolicy::SkipIfExists => {
                debug!(key = %key, "Binding already exists, skipping");
                Ok(false)
            }
            BindPolicy::Overwrite => {
                debug!(key = %key, "Overwriting existing binding");
                Ok(true)
            }
        }
    }

    pub fn insert(&mut self, binding: Binding) {
        debug!(
            key = %binding.key,
            lifetime = %binding.lifetime,
            concrete = binding.concrete.as_ref().map(DependencyKey::type_name),
            "Bound contract"
        );
        self.bindings.insert(binding.key, binding);
    }

    pub fn get(&self, key: &DependencyKey) -> Option<&Binding> {
        let binding = self.bindings.get(key);
        trace!(key = %key, found = binding.is_some(), "Registry lookup");
        binding
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DependencyKey> {
        self.bindings.keys()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
