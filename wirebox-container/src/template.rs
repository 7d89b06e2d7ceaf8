//! Template instantiation bridge.
//!
//! A template binding stores a prototype value. On every resolve the
//! configured [`Instantiator`] produces a fresh object from it, optionally
//! at a placement, and the injection engine then populates its members.
//! The container never creates template objects itself.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::container::Resolution;
use crate::error::{Result, WireboxError};
use crate::injection::inject;
use crate::key::DependencyKey;
use crate::shape::Injectable;

/// Where an instantiated object should live. Opaque to the container.
pub type Placement = dyn Any + Send + Sync;

/// External instantiation primitive.
pub trait Instantiator: Send + Sync {
    /// Produces a new object from `template`, or `None` if it cannot.
    ///
    /// The returned box must hold a value of the template's own type.
    fn instantiate(
        &self,
        template: &(dyn Any + Send + Sync),
        placement: Option<&Placement>,
    ) -> Option<Box<dyn Any + Send + Sync>>;
}

type CloneFn = fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn Any + Send + Sync>>;

fn clone_as<T: Clone + Send + Sync + 'static>(
    template: &(dyn Any + Send + Sync),
) -> Option<Box<dyn Any + Send + Sync>> {
    template
        .downcast_ref::<T>()
        .map(|value| Box::new(value.clone()) as Box<dyn Any + Send + Sync>)
}

/// Instantiates registered `Clone` types by cloning the template. The
/// placement is ignored.
#[derive(Default)]
pub struct CloningInstantiator {
    clones: HashMap<TypeId, CloneFn>,
}

impl CloningInstantiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows templates of type `T`.
    pub fn register<T: Clone + Send + Sync + 'static>(mut self) -> Self {
        self.clones.insert(TypeId::of::<T>(), clone_as::<T>);
        self
    }
}

impl Instantiator for CloningInstantiator {
    fn instantiate(
        &self,
        template: &(dyn Any + Send + Sync),
        _placement: Option<&Placement>,
    ) -> Option<Box<dyn Any + Send + Sync>> {
        let clone = self.clones.get(&template.type_id())?;
        clone(template)
    }
}

impl fmt::Debug for CloningInstantiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloningInstantiator")
            .field("types", &self.clones.len())
            .finish()
    }
}

/// Instantiates `template` with the first instantiator in the requesting
/// container's chain, then injects the new object.
pub(crate) fn instantiate_into<T: Injectable>(template: &T, res: &mut Resolution<'_>) -> Result<T> {
    let concrete = DependencyKey::of::<T>();
    let instantiator = res
        .requester()
        .instantiator()
        .ok_or(WireboxError::NoInstantiator { concrete })?;

    let produced = instantiator
        .instantiate(template, res.placement())
        .ok_or(WireboxError::InstantiationFailed { concrete })?;
    let mut value = produced
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| WireboxError::TypeMismatch { expected: concrete })?;
    trace!(concrete = %concrete, "Instantiated template");

    inject(&mut value, res)?;
    Ok(value)
}
