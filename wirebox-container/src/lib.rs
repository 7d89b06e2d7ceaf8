//! Core container implementation for Wirebox DI.

pub mod construction;
pub mod container;
pub mod context;
pub mod dependency;
pub mod disposal;
pub mod error;
pub mod injection;
pub mod installer;
pub mod key;
pub mod lifetime;
pub mod registry;
pub mod settings;
pub mod shape;
pub mod template;

pub use container::{Container, ContainerBuilder, Resolution, prelude};
pub use context::ResolutionContext;
pub use dependency::{Dependency, Implements, Instance};
pub use error::{BoxError, Result, WireboxError};
pub use installer::Installer;
pub use key::DependencyKey;
pub use lifetime::{Lifetime, NonLazyBinding};
pub use registry::BindPolicy;
pub use settings::ContainerSettings;
pub use shape::{Capabilities, Component, Constructors, Injectable, Members, Release};
pub use template::{CloningInstantiator, Instantiator, Placement};
