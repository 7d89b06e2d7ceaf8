//! Shape descriptors: what a concrete producer type looks like to the
//! container.
//!
//! A type describes itself once through [`Injectable`]: its candidate
//! constructors, the members to populate after construction, and the
//! contracts it can be bound under. The planners read this description a
//! single time per type and cache the result.
//!
//! ```
//! use std::sync::Arc;
//! use wirebox_container::shape::{Component, Constructors, Injectable, Members};
//!
//! trait Clock: Send + Sync {}
//!
//! #[derive(Default)]
//! struct Scheduler {
//!     clock: Option<Arc<dyn Clock>>,
//! }
//!
//! impl Component for Scheduler {}
//!
//! impl Injectable for Scheduler {
//!     fn constructors(constructors: &mut Constructors<Self>) {
//!         constructors.add("default", Scheduler::default);
//!     }
//!
//!     fn members(members: &mut Members<Self>) {
//!         members
//!             .field("clock", |this: &mut Self, clock: Arc<dyn Clock>| this.clock = Some(clock))
//!             .optional();
//!     }
//! }
//! ```

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::dependency::{Arguments, Dependency, Implements, Instance, ParamSpec, erase};
use crate::error::{BoxError, Result, WireboxError};
use crate::key::DependencyKey;

/// Releasable-resource capability, consumed by the disposal tracker.
pub trait Release: Send + Sync {
    fn release(&self) -> std::result::Result<(), BoxError>;
}

/// Capability queries the container runs on every value it records.
pub trait Component: Send + Sync + 'static {
    /// Returns the release hook if this value holds a releasable resource.
    fn as_release(&self) -> Option<&dyn Release> {
        None
    }
}

/// A concrete producer type the container can construct and inject.
///
/// Usually derived with `#[derive(Injectable)]`.
pub trait Injectable: Component + Sized {
    /// Registers every candidate constructor, in declaration order.
    fn constructors(constructors: &mut Constructors<Self>);

    /// Registers the members to populate after construction.
    fn members(_members: &mut Members<Self>) {}

    /// Registers every contract this type can be bound under.
    fn capabilities(_capabilities: &mut Capabilities<Self>) {}
}

// ═══════════════════════════════════════════
// Constructors
// ═══════════════════════════════════════════

pub(crate) type ConstructFn<T> = Arc<dyn Fn(&mut Arguments) -> Result<T> + Send + Sync>;

/// A function that can build `T` from resolved dependencies.
///
/// Implemented for every `Fn(A1, .., An) -> T` with `n <= 8` where each
/// parameter implements [`Dependency`].
pub trait ConstructorFn<T, Args>: Send + Sync + 'static {
    fn params() -> Vec<ParamSpec>;

    fn construct(&self, args: &mut Arguments) -> Result<T>;
}

/// One candidate constructor.
pub struct ConstructorDescriptor<T> {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) deprecated: bool,
    pub(crate) inject_marked: bool,
    pub(crate) invoke: ConstructFn<T>,
}

impl<T> ConstructorDescriptor<T> {
    /// Excludes this constructor from selection.
    pub fn deprecated(&mut self) -> &mut Self {
        self.deprecated = true;
        self
    }

    /// Puts the mandatory-inject marker on this constructor. Planning a type
    /// with a marked constructor fails with
    /// [`WireboxError::InjectOnConstructor`].
    pub fn marked_inject(&mut self) -> &mut Self {
        self.inject_marked = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Collects the candidate constructors of `T`.
pub struct Constructors<T> {
    pub(crate) entries: Vec<ConstructorDescriptor<T>>,
}

impl<T: 'static> Constructors<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a constructor. The dependency list is taken from the function
    /// signature.
    pub fn add<F, Args>(&mut self, name: &'static str, constructor: F) -> &mut ConstructorDescriptor<T>
    where
        F: ConstructorFn<T, Args>,
    {
        let index = self.entries.len();
        self.entries.push(ConstructorDescriptor {
            name,
            params: F::params(),
            deprecated: false,
            inject_marked: false,
            invoke: Arc::new(move |args: &mut Arguments| constructor.construct(args)),
        });
        &mut self.entries[index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════
// Members
// ═══════════════════════════════════════════

/// Kind of an injection target. Targets run in this order: fields, then
/// properties, then methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

pub(crate) type ApplyFn = Arc<dyn Fn(&mut dyn Any, &mut Arguments) -> Result<()> + Send + Sync>;

/// A member marked for injection.
#[derive(Clone)]
pub struct InjectTarget {
    pub(crate) name: &'static str,
    pub(crate) kind: MemberKind,
    pub(crate) optional: bool,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) apply: ApplyFn,
}

impl InjectTarget {
    /// Marks the whole target optional.
    pub fn optional(&mut self) -> &mut Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

impl std::fmt::Debug for InjectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectTarget")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("optional", &self.optional)
            .field("params", &self.params)
            .finish()
    }
}

/// A method that can be invoked on `&mut T` with resolved dependencies.
///
/// Implemented for every `Fn(&mut T, A1, .., An)` with `n <= 8` where each
/// parameter implements [`Dependency`].
pub trait MemberFn<T, Args>: Send + Sync + 'static {
    fn params() -> Vec<ParamSpec>;

    fn invoke(&self, target: &mut T, args: &mut Arguments) -> Result<()>;
}

fn downcast_target<T: 'static>(target: &mut dyn Any) -> Result<&mut T> {
    target
        .downcast_mut::<T>()
        .ok_or_else(|| WireboxError::TypeMismatch {
            expected: DependencyKey::of::<T>(),
        })
}

/// Collects the injection targets of `T`.
pub struct Members<T> {
    pub(crate) targets: Vec<InjectTarget>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T: 'static> Members<T> {
    pub(crate) fn new() -> Self {
        Self {
            targets: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Adds a field assignment.
    pub fn field<D, F>(&mut self, name: &'static str, assign: F) -> &mut InjectTarget
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.single(name, MemberKind::Field, assign)
    }

    /// Adds a settable property, given by its setter.
    pub fn property<D, F>(&mut self, name: &'static str, setter: F) -> &mut InjectTarget
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.single(name, MemberKind::Property, setter)
    }

    /// Adds a method. `Option<Arc<C>>` parameters are optional one by one.
    pub fn method<F, Args>(&mut self, name: &'static str, method: F) -> &mut InjectTarget
    where
        F: MemberFn<T, Args>,
    {
        self.push(InjectTarget {
            name,
            kind: MemberKind::Method,
            optional: false,
            params: F::params(),
            apply: Arc::new(move |target: &mut dyn Any, args: &mut Arguments| {
                method.invoke(downcast_target::<T>(target)?, args)
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn single<D, F>(&mut self, name: &'static str, kind: MemberKind, assign: F) -> &mut InjectTarget
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.push(InjectTarget {
            name,
            kind,
            optional: false,
            params: vec![ParamSpec::of::<D>()],
            apply: Arc::new(move |target: &mut dyn Any, args: &mut Arguments| {
                let target = downcast_target::<T>(target)?;
                assign(target, args.take::<D>()?);
                Ok(())
            }),
        })
    }

    fn push(&mut self, target: InjectTarget) -> &mut InjectTarget {
        let index = self.targets.len();
        self.targets.push(target);
        &mut self.targets[index]
    }
}

// ═══════════════════════════════════════════
// Capabilities
// ═══════════════════════════════════════════

pub(crate) type UpcastFn<T> = Arc<dyn Fn(Arc<T>) -> Instance + Send + Sync>;

pub(crate) struct Capability<T> {
    pub key: DependencyKey,
    pub upcast: UpcastFn<T>,
}

/// Collects the contracts `T` can be bound under.
pub struct Capabilities<T> {
    pub(crate) entries: Vec<Capability<T>>,
}

impl<T: Send + Sync + 'static> Capabilities<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declares that `T` exposes the contract `C`.
    pub fn add<C>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        let key = DependencyKey::of::<C>();
        if self.entries.iter().all(|entry| entry.key != key) {
            self.entries.push(Capability {
                key,
                upcast: Arc::new(|value: Arc<T>| erase(<T as Implements<C>>::upcast(value))),
            });
        }
        self
    }

    pub fn keys(&self) -> Vec<DependencyKey> {
        self.entries.iter().map(|entry| entry.key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════
// Arity impls
// ═══════════════════════════════════════════

macro_rules! impl_arity {
    ([$($ty:ident),*]) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<F, T, $($ty,)*> ConstructorFn<T, ($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> T + Send + Sync + 'static,
            $( $ty: Dependency, )*
        {
            fn params() -> Vec<ParamSpec> {
                vec![$(ParamSpec::of::<$ty>(),)*]
            }

            fn construct(&self, args: &mut Arguments) -> Result<T> {
                $( let $ty = args.take::<$ty>()?; )*
                Ok(self($($ty,)*))
            }
        }

        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<F, T, $($ty,)*> MemberFn<T, ($($ty,)*)> for F
        where
            F: Fn(&mut T, $($ty,)*) + Send + Sync + 'static,
            $( $ty: Dependency, )*
        {
            fn params() -> Vec<ParamSpec> {
                vec![$(ParamSpec::of::<$ty>(),)*]
            }

            fn invoke(&self, target: &mut T, args: &mut Arguments) -> Result<()> {
                $( let $ty = args.take::<$ty>()?; )*
                self(target, $($ty,)*);
                Ok(())
            }
        }
    };
}

impl_arity!([]);
impl_arity!([A1]);
impl_arity!([A1, A2]);
impl_arity!([A1, A2, A3]);
impl_arity!([A1, A2, A3, A4]);
impl_arity!([A1, A2, A3, A4, A5]);
impl_arity!([A1, A2, A3, A4, A5, A6]);
impl_arity!([A1, A2, A3, A4, A5, A6, A7]);
impl_arity!([A1, A2, A3, A4, A5, A6, A7, A8]);
