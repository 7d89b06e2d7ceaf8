//! # Wirebox: object-graph container for Rust
//!
//! Bind contracts to concrete types, resolve fully wired values through a
//! chain of containers, and tear everything down in order.
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox::prelude::*;
//!
//! pub trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! #[derive(Default, Injectable)]
//! #[injectable(implements = "dyn Logger")]
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) {
//!         println!("{msg}");
//!     }
//! }
//!
//! #[derive(Injectable)]
//! #[injectable(constructor(path = "Service::new"))]
//! struct Service {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! impl Service {
//!     fn new(logger: Arc<dyn Logger>) -> Self {
//!         Self { logger }
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.bind_singleton::<dyn Logger, ConsoleLogger>()?;
//! container.bind_transient::<Service, Service>()?;
//!
//! let service = container.resolve::<Service>()?;
//! service.logger.log("wired");
//! # Ok::<(), wirebox::WireboxError>(())
//! ```

pub use wirebox_container::*;
pub use wirebox_macros::Injectable;
pub use wirebox_support::*;

/// Everything needed to declare and wire types.
pub mod prelude {
    pub use wirebox_container::prelude::*;
    pub use wirebox_macros::Injectable;
}
