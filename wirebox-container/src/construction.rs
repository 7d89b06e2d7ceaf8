//! Construction planner.
//!
//! Picks the constructor the container calls for a concrete type and builds
//! values with it. The choice depends only on the type, so it is made once
//! per type and cached for the life of the process.
//!
//! Selection rules:
//! - constructors marked deprecated are never chosen;
//! - among the rest, the one with the most parameters wins;
//! - on a tie, the one registered first wins.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::container::Resolution;
use crate::dependency::{Arguments, ParamSpec};
use crate::error::{Result, WireboxError};
use crate::injection::{self, InjectionPlan};
use crate::key::DependencyKey;
use crate::shape::{ConstructFn, ConstructorDescriptor, Constructors, Injectable};

static PLANS: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// The selected constructor of a concrete type.
pub struct ConstructionPlan<T> {
    concrete: DependencyKey,
    constructor: &'static str,
    params: Vec<ParamSpec>,
    invoke: ConstructFn<T>,
}

impl<T> ConstructionPlan<T> {
    pub fn concrete(&self) -> DependencyKey {
        self.concrete
    }

    /// Name of the selected constructor.
    pub fn constructor(&self) -> &'static str {
        self.constructor
    }

    /// Parameters of the selected constructor, in call order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

impl<T> std::fmt::Debug for ConstructionPlan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionPlan")
            .field("concrete", &self.concrete)
            .field("constructor", &self.constructor)
            .field("params", &self.params)
            .finish()
    }
}

/// Returns the cached construction plan of `T`, computing it on first use.
///
/// # Errors
/// Returns [`WireboxError::NoUsableConstructor`] if `T` has no constructor
/// that is not deprecated.
pub fn plan<T: Injectable>() -> Result<Arc<ConstructionPlan<T>>> {
    let id = TypeId::of::<T>();
    let cached = PLANS.get(&id).map(|entry| Arc::clone(entry.value()));
    if let Some(plan) = cached.and_then(|erased| erased.downcast::<ConstructionPlan<T>>().ok()) {
        return Ok(plan);
    }

    let plan = Arc::new(select::<T>()?);
    let erased: Arc<dyn Any + Send + Sync> = plan.clone();
    PLANS.insert(id, erased);
    Ok(plan)
}

fn select<T: Injectable>() -> Result<ConstructionPlan<T>> {
    let concrete = DependencyKey::of::<T>();
    let mut constructors = Constructors::<T>::new();
    T::constructors(&mut constructors);

    let mut best: Option<ConstructorDescriptor<T>> = None;
    for candidate in constructors.entries.into_iter().filter(|c| !c.deprecated) {
        match &best {
            Some(current) if candidate.arity() <= current.arity() => {}
            _ => best = Some(candidate),
        }
    }

    let chosen = best.ok_or(WireboxError::NoUsableConstructor { concrete })?;
    trace!(
        concrete = %concrete,
        constructor = chosen.name,
        arity = chosen.arity(),
        "Selected constructor"
    );

    Ok(ConstructionPlan {
        concrete,
        constructor: chosen.name,
        params: chosen.params,
        invoke: chosen.invoke,
    })
}

/// Builds a fully injected `T`.
///
/// `T` stays on the resolution stack while its constructor arguments
/// resolve and its members are injected. It is popped again on every path.
pub(crate) fn construct<T: Injectable>(res: &mut Resolution<'_>) -> Result<T> {
    let construction = plan::<T>()?;
    let injection = injection::plan::<T>()?;

    res.context_mut().enter(construction.concrete)?;
    let built = build(&construction, &injection, res);
    res.context_mut().leave();
    built
}

fn build<T: Injectable>(
    construction: &ConstructionPlan<T>,
    injection: &InjectionPlan,
    res: &mut Resolution<'_>,
) -> Result<T> {
    let mut slots = Vec::with_capacity(construction.params.len());
    for param in &construction.params {
        slots.push(res.resolve_param(param)?);
    }

    let mut value = (construction.invoke)(&mut Arguments::new(slots))?;
    injection.apply(&mut value, res)?;
    Ok(value)
}
