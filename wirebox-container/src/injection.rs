//! Injection planner and engine.
//!
//! After a value is constructed (or instantiated from a template) the
//! engine populates its marked members: fields first, then properties,
//! then methods, each group in the order the members were registered.
//!
//! Failure handling per target:
//! - a parameter typed `Option<Arc<C>>` that cannot be resolved becomes
//!   `None`;
//! - otherwise, if the target is marked optional, the whole target is
//!   skipped;
//! - otherwise the error propagates to the caller.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{trace, warn};

use crate::container::Resolution;
use crate::dependency::{Arguments, Slot};
use crate::error::{Result, WireboxError};
use crate::key::DependencyKey;
use crate::shape::{Constructors, InjectTarget, Injectable, Members};

static PLANS: Lazy<DashMap<TypeId, Arc<InjectionPlan>>> = Lazy::new(DashMap::new);

static EMPTY_PLAN: Lazy<Arc<InjectionPlan>> = Lazy::new(|| {
    Arc::new(InjectionPlan {
        targets: Vec::new(),
    })
});

/// Ordered injection targets of a concrete type.
#[derive(Debug)]
pub struct InjectionPlan {
    targets: Vec<InjectTarget>,
}

impl InjectionPlan {
    pub fn targets(&self) -> &[InjectTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Runs every target against `target`.
    pub(crate) fn apply(&self, target: &mut dyn Any, res: &mut Resolution<'_>) -> Result<()> {
        for member in &self.targets {
            let Some(slots) = collect(member, res)? else {
                continue;
            };
            (member.apply)(target, &mut Arguments::new(slots))?;
            trace!(member = member.name, kind = ?member.kind, "Injected member");
        }
        Ok(())
    }
}

/// Resolves the arguments of one target. `None` means the target is
/// skipped.
fn collect(member: &InjectTarget, res: &mut Resolution<'_>) -> Result<Option<Vec<Slot>>> {
    let mut slots = Vec::with_capacity(member.params.len());
    for param in &member.params {
        match res.resolve_key(&param.key) {
            Ok(instance) => slots.push(Slot::Resolved(instance)),
            Err(_) if param.optional => slots.push(Slot::Absent),
            Err(error) if member.optional => {
                warn!(
                    member = member.name,
                    dependency = %param.key,
                    %error,
                    "Skipping optional injection target"
                );
                return Ok(None);
            }
            Err(error) => return Err(error),
        }
    }
    Ok(Some(slots))
}

/// Returns the cached injection plan of `T`, computing it on first use.
///
/// Types without targets share one empty plan.
///
/// # Errors
/// Returns [`WireboxError::InjectOnConstructor`] if any constructor of `T`
/// carries the mandatory-inject marker.
pub fn plan<T: Injectable>() -> Result<Arc<InjectionPlan>> {
    let id = TypeId::of::<T>();
    if let Some(plan) = PLANS.get(&id).map(|entry| Arc::clone(entry.value())) {
        return Ok(plan);
    }

    let plan = build_plan::<T>()?;
    PLANS.insert(id, Arc::clone(&plan));
    Ok(plan)
}

fn build_plan<T: Injectable>() -> Result<Arc<InjectionPlan>> {
    let mut constructors = Constructors::<T>::new();
    T::constructors(&mut constructors);
    if let Some(marked) = constructors.entries.iter().find(|c| c.inject_marked) {
        return Err(WireboxError::InjectOnConstructor {
            concrete: DependencyKey::of::<T>(),
            constructor: marked.name,
        });
    }

    let mut members = Members::<T>::new();
    T::members(&mut members);
    if members.is_empty() {
        return Ok(Arc::clone(&EMPTY_PLAN));
    }

    let mut targets = members.targets;
    targets.sort_by_key(|target| target.kind);
    Ok(Arc::new(InjectionPlan { targets }))
}

/// Injects the members of an existing value. `T` is on the resolution
/// stack while its members resolve.
pub(crate) fn inject<T: Injectable>(target: &mut T, res: &mut Resolution<'_>) -> Result<()> {
    let plan = plan::<T>()?;

    res.context_mut().enter(DependencyKey::of::<T>())?;
    let applied = plan.apply(target, res);
    res.context_mut().leave();
    applied
}
