//! Per-call resolution context.
//!
//! A [`ResolutionContext`] is created for every top-level resolve, inject or
//! instantiate call and threaded by `&mut` through all nested resolutions.
//! It holds the stack of concrete types currently under construction, which
//! is what circular dependency detection looks at.

use tracing::warn;

use crate::error::{CircularDependencyError, Result, WireboxError};
use crate::key::DependencyKey;

/// Stack of concrete types currently being constructed or injected.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    stack: Vec<DependencyKey>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `concrete` onto the stack.
    ///
    /// # Errors
    /// Returns [`WireboxError::CircularDependency`] if `concrete` is already
    /// on the stack. The stack is left unchanged in that case.
    pub fn enter(&mut self, concrete: DependencyKey) -> Result<()> {
        if let Some(pos) = self.stack.iter().position(|key| *key == concrete) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(concrete);

            let error = CircularDependencyError { chain };
            warn!(concrete = %concrete, "{error}");
            return Err(WireboxError::CircularDependency(error));
        }

        self.stack.push(concrete);
        Ok(())
    }

    /// Pops the innermost type.
    pub fn leave(&mut self) -> Option<DependencyKey> {
        self.stack.pop()
    }

    /// The innermost type under construction.
    pub fn current(&self) -> Option<DependencyKey> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// The whole stack, outermost first.
    pub fn path(&self) -> &[DependencyKey] {
        &self.stack
    }
}
