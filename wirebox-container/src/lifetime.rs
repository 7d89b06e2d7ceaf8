//! Binding lifetimes and singleton storage.
//!
//! - [`Lifetime::Transient`]: a new value on every resolve
//! - [`Lifetime::Singleton`]: built on first resolve, then shared
//! - [`Lifetime::Instance`]: a value supplied at bind time
//! - [`Lifetime::Template`]: instantiated from a stored template on every
//!   resolve

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::construction::construct;
use crate::container::{Container, Resolution};
use crate::context::ResolutionContext;
use crate::error::{Result, WireboxError};
use crate::key::DependencyKey;
use crate::shape::Injectable;

/// How a binding produces its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    Transient,
    Singleton,
    Instance,
    Template,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => write!(f, "Transient"),
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Instance => write!(f, "Instance"),
            Lifetime::Template => write!(f, "Template"),
        }
    }
}

/// Lazily built shared value of a singleton binding.
///
/// The cell is read without blocking: a re-entrant resolve of the same
/// singleton during its construction reaches the construction planner and
/// is reported as a cycle. Two threads racing on an empty slot may both
/// construct; the first stored value wins and is the only one tracked for
/// release.
pub(crate) struct SingletonSlot<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T: Injectable> SingletonSlot<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_create(&self, res: &mut Resolution<'_>) -> Result<Arc<T>> {
        if let Some(value) = self.cell.get() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(construct::<T>(res)?);
        match self.cell.set(Arc::clone(&value)) {
            Ok(()) => {
                debug!(concrete = %DependencyKey::of::<T>(), "Materialized singleton");
                res.container().disposal().track(&value);
                Ok(value)
            }
            Err(_) => Ok(self.cell.get().map_or(value, Arc::clone)),
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Type-erased access to a [`SingletonSlot`].
pub(crate) trait Materialize: Send + Sync {
    fn materialize(&self, res: &mut Resolution<'_>) -> Result<()>;

    fn is_materialized(&self) -> bool;
}

impl<T: Injectable> Materialize for SingletonSlot<T> {
    fn materialize(&self, res: &mut Resolution<'_>) -> Result<()> {
        self.get_or_create(res).map(drop)
    }

    fn is_materialized(&self) -> bool {
        SingletonSlot::is_materialized(self)
    }
}

/// Handle returned by singleton bind operations.
///
/// Dropping it leaves the singleton lazy. The handle belongs to the
/// container that returned it.
#[derive(Clone)]
pub struct NonLazyBinding {
    slot: Arc<dyn Materialize>,
    owner: u64,
    concrete: DependencyKey,
}

impl NonLazyBinding {
    pub(crate) fn new(slot: Arc<dyn Materialize>, owner: &Container, concrete: DependencyKey) -> Self {
        Self {
            slot,
            owner: owner.id(),
            concrete,
        }
    }

    /// Builds the singleton now instead of on first resolve.
    ///
    /// The singleton's dependencies resolve from `container` and its
    /// fallbacks, and `container` records it for release.
    ///
    /// # Errors
    /// [`WireboxError::ForeignContainer`] if `container` is not the
    /// container the singleton was bound in.
    pub fn as_non_lazy(&self, container: &Container) -> Result<()> {
        container.ensure_live()?;
        if container.id() != self.owner {
            return Err(WireboxError::ForeignContainer {
                concrete: self.concrete,
            });
        }

        let mut context = ResolutionContext::new();
        let mut res = Resolution::new(container, &mut context, None);
        self.slot.materialize(&mut res)
    }

    pub fn is_materialized(&self) -> bool {
        self.slot.is_materialized()
    }
}

impl fmt::Debug for NonLazyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonLazyBinding")
            .field("concrete", &self.concrete)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
