//! Contract identification keys.
//!
//! [`DependencyKey`] is the opaque, comparable type token the registry is
//! keyed by. Identity is nominal: two keys are equal exactly when they name
//! the same Rust type.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use wirebox_support::rendering::shorten_type_name;

/// Identifies a contract (or a concrete producer type) in the container.
///
/// # Examples
/// ```
/// use wirebox_container::key::DependencyKey;
///
/// trait Clock {}
///
/// let key = DependencyKey::of::<dyn Clock>();
/// assert!(key.type_name().contains("Clock"));
/// assert_eq!(key, DependencyKey::of::<dyn Clock>());
/// assert_ne!(key, DependencyKey::of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl DependencyKey {
    /// Creates a key for type `T`. Unsized contracts such as `dyn Trait`
    /// are allowed.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of this key.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name with module paths stripped.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({})", self.type_name)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
