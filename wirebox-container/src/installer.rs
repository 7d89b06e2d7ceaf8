//! Installer trait: a unit of related bind operations.
//!
//! Installers group registrations by concern. Whether an installer plays a
//! global or a scene-local role depends only on the container it is
//! installed into.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! trait Clock: Send + Sync {}
//!
//! #[derive(Default)]
//! struct SystemClock;
//! impl Clock for SystemClock {}
//! impl Component for SystemClock {}
//! impl Injectable for SystemClock {
//!     fn constructors(constructors: &mut Constructors<Self>) {
//!         constructors.add("default", SystemClock::default);
//!     }
//! }
//! wirebox_container::implements!(SystemClock: dyn Clock);
//!
//! struct TimeInstaller;
//!
//! impl Installer for TimeInstaller {
//!     fn install_bindings(&self, container: &mut Container) -> Result<()> {
//!         container.bind_singleton::<dyn Clock, SystemClock>()?;
//!         Ok(())
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.install(&TimeInstaller).unwrap();
//! let clock: Arc<dyn Clock> = container.resolve().unwrap();
//! # let _ = clock;
//! ```

use crate::container::Container;
use crate::error::Result;

/// A group of bind operations applied to a container.
pub trait Installer: Send + Sync {
    /// Performs the bind operations.
    ///
    /// # Errors
    /// Any bind error, which aborts the install.
    fn install_bindings(&self, container: &mut Container) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Installer for F
where
    F: Fn(&mut Container) -> Result<()> + Send + Sync,
{
    fn install_bindings(&self, container: &mut Container) -> Result<()> {
        self(container)
    }
}
