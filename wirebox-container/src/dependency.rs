//! Dependency values and the contract/concrete relation.
//!
//! Contracts are always handed out as `Arc<C>`. Inside the registry those
//! `Arc`s travel type-erased as [`Instance`] and are recovered with a
//! downcast when they reach a typed parameter.

use std::any::Any;
use std::sync::Arc;

use crate::error::{MissingBindingError, Result, WireboxError};
use crate::key::DependencyKey;

/// A type-erased produced value. Always wraps an `Arc<C>` for the contract
/// `C` it was bound under.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a contract value into an [`Instance`].
#[inline]
pub fn erase<C: ?Sized + Send + Sync + 'static>(value: Arc<C>) -> Instance {
    Arc::new(value)
}

/// Recovers the `Arc<C>` stored in an [`Instance`].
pub fn downcast_instance<C: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Result<Arc<C>> {
    (**instance)
        .downcast_ref::<Arc<C>>()
        .cloned()
        .ok_or_else(|| WireboxError::TypeMismatch {
            expected: DependencyKey::of::<C>(),
        })
}

/// States that `Self` can be handed out as the contract `C`.
///
/// Every type implements `Implements<Self>`. Trait-object contracts are
/// declared with [`implements!`](crate::implements) or with the
/// `implements = "..."` option of `#[derive(Injectable)]`.
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares trait-object contracts for a concrete type.
///
/// ```
/// use std::sync::Arc;
/// use wirebox_container::implements;
/// use wirebox_container::dependency::Implements;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// implements!(SystemClock: dyn Clock);
///
/// let clock: Arc<dyn Clock> = <SystemClock as Implements<dyn Clock>>::upcast(Arc::new(SystemClock));
/// # let _ = clock;
/// ```
#[macro_export]
macro_rules! implements {
    ($concrete:ty : $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::dependency::Implements<$contract> for $concrete {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// The outcome of resolving one parameter.
#[derive(Clone)]
pub enum Slot {
    Resolved(Instance),
    /// Resolution failed and the parameter is optional.
    Absent,
}

/// One dependency a constructor, setter or method asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub key: DependencyKey,
    pub optional: bool,
}

impl ParamSpec {
    pub fn of<D: Dependency>() -> Self {
        Self {
            key: D::key(),
            optional: D::OPTIONAL,
        }
    }
}

/// Resolved arguments, consumed in parameter order.
pub struct Arguments {
    slots: std::vec::IntoIter<Slot>,
}

impl Arguments {
    pub(crate) fn new(slots: Vec<Slot>) -> Self {
        Self {
            slots: slots.into_iter(),
        }
    }

    /// Takes the next argument as `D`.
    pub fn take<D: Dependency>(&mut self) -> Result<D> {
        D::from_slot(self.slots.next().unwrap_or(Slot::Absent))
    }
}

/// A type that can appear as an injected parameter.
///
/// `Arc<C>` is a mandatory dependency on the contract `C`;
/// `Option<Arc<C>>` is an optional one that becomes `None` when `C` cannot
/// be resolved.
pub trait Dependency: Sized + Send + 'static {
    const OPTIONAL: bool = false;

    /// The contract this parameter resolves.
    fn key() -> DependencyKey;

    fn from_slot(slot: Slot) -> Result<Self>;
}

impl<C: ?Sized + Send + Sync + 'static> Dependency for Arc<C> {
    fn key() -> DependencyKey {
        DependencyKey::of::<C>()
    }

    fn from_slot(slot: Slot) -> Result<Self> {
        match slot {
            Slot::Resolved(instance) => downcast_instance::<C>(&instance),
            Slot::Absent => Err(WireboxError::MissingBinding(MissingBindingError {
                requested: Self::key(),
                required_by: None,
                suggestions: Vec::new(),
            })),
        }
    }
}

impl<C: ?Sized + Send + Sync + 'static> Dependency for Option<Arc<C>> {
    const OPTIONAL: bool = true;

    fn key() -> DependencyKey {
        DependencyKey::of::<C>()
    }

    fn from_slot(slot: Slot) -> Result<Self> {
        match slot {
            Slot::Resolved(instance) => downcast_instance::<C>(&instance).map(Some),
            Slot::Absent => Ok(None),
        }
    }
}
