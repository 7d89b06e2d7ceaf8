//! # The Container: heart of Wirebox
//!
//! Holds the bindings of one scope, resolves contracts through its fallback
//! chain, and owns the releasable values it produced.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──fallback──> Container ──> ...
//!                                   │
//!                     bind_* / install (configure, &mut)
//!                                   │
//!                     resolve / inject / instantiate (&self)
//!                                   │
//!                               dispose()
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! #[derive(Default)]
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) { println!("{msg}"); }
//! }
//! impl Component for ConsoleLogger {}
//! impl Injectable for ConsoleLogger {
//!     fn constructors(constructors: &mut Constructors<Self>) {
//!         constructors.add("default", ConsoleLogger::default);
//!     }
//! }
//! wirebox_container::implements!(ConsoleLogger: dyn Logger);
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//! impl Component for UserService {}
//! impl Injectable for UserService {
//!     fn constructors(constructors: &mut Constructors<Self>) {
//!         constructors.add("new", |logger: Arc<dyn Logger>| UserService { logger });
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.bind_singleton::<dyn Logger, ConsoleLogger>().expect("bind logger");
//! container.bind_transient::<UserService, UserService>().expect("bind service");
//!
//! let service: Arc<UserService> = container.resolve().expect("Failed to resolve");
//! service.logger.log("ready");
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, instrument, trace};
use wirebox_support::rendering::suggest_similar;

use crate::construction::{self, construct};
use crate::context::ResolutionContext;
use crate::dependency::{Implements, Instance, ParamSpec, Slot, downcast_instance, erase};
use crate::disposal::DisposalTracker;
use crate::error::{MissingBindingError, ReleaseFailedError, Result, WireboxError};
use crate::injection;
use crate::installer::Installer;
use crate::key::DependencyKey;
use crate::lifetime::{Lifetime, NonLazyBinding, SingletonSlot};
use crate::registry::{BindPolicy, Binding, Registry, factory};
use crate::settings::ContainerSettings;
use crate::shape::{Capabilities, Capability, Component, Injectable};
use crate::template::{Instantiator, Placement, instantiate_into};

const MAX_SUGGESTIONS: usize = 3;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`].
///
/// # Examples
/// ```rust,ignore
/// let scene = Container::builder()
///     .name("scene")
///     .fallback(global.clone())
///     .instantiator(CloningInstantiator::new().register::<Enemy>())
///     .build();
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    settings: ContainerSettings,
    fallback: Option<Arc<Container>>,
    instantiator: Option<Arc<dyn Instantiator>>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Label used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Replaces all settings at once.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Let strict binds replace existing bindings.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.settings.allow_override = allow;
        self
    }

    /// Container consulted when this one has no binding for a contract.
    pub fn fallback(mut self, fallback: Arc<Container>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Template instantiation primitive. Inherited by containers that fall
    /// back to this one.
    ///
    /// Templates are instantiated with the primitive found first in the
    /// chain of the container the resolve was called on, so a scene can
    /// override the primitive for templates bound in its fallbacks.
    pub fn instantiator(mut self, instantiator: impl Instantiator + 'static) -> Self {
        self.instantiator = Some(Arc::new(instantiator));
        self
    }

    pub fn build(self) -> Container {
        debug!(
            name = self.settings.name.as_deref(),
            allow_override = self.settings.allow_override,
            has_fallback = self.fallback.is_some(),
            "Building container"
        );
        Container {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            name: self.settings.name,
            allow_override: self.settings.allow_override,
            registry: Registry::new(),
            fallback: self.fallback,
            instantiator: self.instantiator,
            disposal: DisposalTracker::new(),
            disposed: false,
        }
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// A scope of bindings with an optional fallback container.
///
/// Bind operations take `&mut self`; resolution takes `&self` and may run
/// from many threads at once.
pub struct Container {
    id: u64,
    name: Option<String>,
    allow_override: bool,
    registry: Registry,
    fallback: Option<Arc<Container>>,
    instantiator: Option<Arc<dyn Instantiator>>,
    disposal: DisposalTracker,
    disposed: bool,
}

impl Container {
    /// Creates an empty container with default settings and no fallback.
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Creates an empty container that falls back to `fallback`.
    pub fn with_fallback(fallback: Arc<Container>) -> Self {
        ContainerBuilder::new().fallback(fallback).build()
    }

    pub fn set_fallback(&mut self, fallback: Option<Arc<Container>>) {
        self.fallback = fallback;
    }

    pub fn fallback(&self) -> Option<&Arc<Container>> {
        self.fallback.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of bindings in this container, fallbacks excluded.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Whether `C` is bound in this container. Fallbacks are not consulted.
    pub fn is_bound<C: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(&DependencyKey::of::<C>())
    }

    /// Whether `C` is bound anywhere in the fallback chain.
    pub fn can_resolve<C: ?Sized + 'static>(&self) -> bool {
        self.find_binding(&DependencyKey::of::<C>()).is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The instantiator of the first container in the chain that has one.
    pub fn instantiator(&self) -> Option<Arc<dyn Instantiator>> {
        self.chain()
            .find_map(|container| container.instantiator.as_ref())
            .map(Arc::clone)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(WireboxError::ContainerDisposed);
        }
        Ok(())
    }

    pub(crate) fn disposal(&self) -> &DisposalTracker {
        &self.disposal
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    fn chain(&self) -> impl Iterator<Item = &Container> {
        std::iter::successors(Some(self), |&container| container.fallback.as_deref())
    }

    // ── Policy ──

    fn effective(&self, policy: BindPolicy) -> BindPolicy {
        match policy {
            BindPolicy::ErrorIfExists if self.allow_override => BindPolicy::Overwrite,
            other => other,
        }
    }

    fn admit<C: ?Sized + 'static>(&self, policy: BindPolicy) -> Result<bool> {
        self.ensure_live()?;
        self.registry
            .admit(&DependencyKey::of::<C>(), self.effective(policy))
    }

    // ── Transient ──

    /// Binds `C` to a fresh, fully injected `T` per resolve.
    ///
    /// # Errors
    /// - [`WireboxError::DuplicateBinding`] if `C` is already bound here
    /// - [`WireboxError::NoUsableConstructor`] /
    ///   [`WireboxError::InjectOnConstructor`] if `T` cannot be planned
    pub fn bind_transient<C, T>(&mut self) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.admit::<C>(BindPolicy::ErrorIfExists)?;
        self.register_transient::<C, T>()
    }

    /// Like [`bind_transient`](Self::bind_transient), but keeps an existing
    /// binding. Returns whether the binding was written.
    pub fn bind_transient_if_not_bound<C, T>(&mut self) -> Result<bool>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.bind_transient_with::<C, T>(BindPolicy::SkipIfExists)
    }

    pub fn force_bind_transient<C, T>(&mut self) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.admit::<C>(BindPolicy::Overwrite)?;
        self.register_transient::<C, T>()
    }

    pub fn bind_transient_with<C, T>(&mut self, policy: BindPolicy) -> Result<bool>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        if !self.admit::<C>(policy)? {
            return Ok(false);
        }
        self.register_transient::<C, T>().map(|()| true)
    }

    fn register_transient<C, T>(&mut self) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        prepare::<T>()?;
        self.registry.insert(Binding {
            key: DependencyKey::of::<C>(),
            lifetime: Lifetime::Transient,
            concrete: Some(DependencyKey::of::<T>()),
            factory: factory(|res| {
                let value = Arc::new(construct::<T>(res)?);
                Ok(erase(<T as Implements<C>>::upcast(value)))
            }),
        });
        Ok(())
    }

    // ── Singleton ──

    /// Binds `C` to one `T`, built on first resolve and shared afterwards.
    ///
    /// The returned handle can build the value eagerly with
    /// [`NonLazyBinding::as_non_lazy`].
    ///
    /// # Errors
    /// Same as [`bind_transient`](Self::bind_transient).
    pub fn bind_singleton<C, T>(&mut self) -> Result<NonLazyBinding>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.admit::<C>(BindPolicy::ErrorIfExists)?;
        self.register_singleton::<C, T>()
    }

    /// Returns `None` if `C` was already bound.
    pub fn bind_singleton_if_not_bound<C, T>(&mut self) -> Result<Option<NonLazyBinding>>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.bind_singleton_with::<C, T>(BindPolicy::SkipIfExists)
    }

    pub fn force_bind_singleton<C, T>(&mut self) -> Result<NonLazyBinding>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.admit::<C>(BindPolicy::Overwrite)?;
        self.register_singleton::<C, T>()
    }

    pub fn bind_singleton_with<C, T>(&mut self, policy: BindPolicy) -> Result<Option<NonLazyBinding>>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        if !self.admit::<C>(policy)? {
            return Ok(None);
        }
        self.register_singleton::<C, T>().map(Some)
    }

    fn register_singleton<C, T>(&mut self) -> Result<NonLazyBinding>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        prepare::<T>()?;
        let slot = Arc::new(SingletonSlot::<T>::new());
        let shared = Arc::clone(&slot);
        self.registry.insert(Binding {
            key: DependencyKey::of::<C>(),
            lifetime: Lifetime::Singleton,
            concrete: Some(DependencyKey::of::<T>()),
            factory: factory(move |res| {
                let value = shared.get_or_create(res)?;
                Ok(erase(<T as Implements<C>>::upcast(value)))
            }),
        });
        Ok(NonLazyBinding::new(slot, self, DependencyKey::of::<T>()))
    }

    // ── Instance ──

    /// Binds `C` to an existing value. The container takes part ownership
    /// and releases it on teardown if it exposes a release hook.
    pub fn bind_instance<C, T>(&mut self, value: Arc<T>) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Component + Implements<C>,
    {
        self.admit::<C>(BindPolicy::ErrorIfExists)?;
        self.register_instance::<C, T>(value);
        Ok(())
    }

    pub fn bind_instance_if_not_bound<C, T>(&mut self, value: Arc<T>) -> Result<bool>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Component + Implements<C>,
    {
        self.bind_instance_with::<C, T>(value, BindPolicy::SkipIfExists)
    }

    pub fn force_bind_instance<C, T>(&mut self, value: Arc<T>) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Component + Implements<C>,
    {
        self.admit::<C>(BindPolicy::Overwrite)?;
        self.register_instance::<C, T>(value);
        Ok(())
    }

    pub fn bind_instance_with<C, T>(&mut self, value: Arc<T>, policy: BindPolicy) -> Result<bool>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Component + Implements<C>,
    {
        if !self.admit::<C>(policy)? {
            return Ok(false);
        }
        self.register_instance::<C, T>(value);
        Ok(true)
    }

    fn register_instance<C, T>(&mut self, value: Arc<T>)
    where
        C: ?Sized + Send + Sync + 'static,
        T: Component + Implements<C>,
    {
        self.disposal.track(&value);
        let instance = erase(<T as Implements<C>>::upcast(value));
        self.registry.insert(Binding {
            key: DependencyKey::of::<C>(),
            lifetime: Lifetime::Instance,
            concrete: Some(DependencyKey::of::<T>()),
            factory: factory(move |_| Ok(Arc::clone(&instance))),
        });
    }

    // ── Interface groups ──

    /// Binds every contract `T` declares in
    /// [`Injectable::capabilities`] to one shared `T`.
    ///
    /// The policy applies to each contract separately. Under the strict
    /// policy the first conflict aborts the operation; contracts bound
    /// before it stay bound.
    pub fn bind_interfaces_to_self<T: Injectable>(&mut self) -> Result<NonLazyBinding> {
        self.bind_interfaces_to_self_with::<T>(BindPolicy::ErrorIfExists)
    }

    pub fn bind_interfaces_to_self_if_not_bound<T: Injectable>(&mut self) -> Result<NonLazyBinding> {
        self.bind_interfaces_to_self_with::<T>(BindPolicy::SkipIfExists)
    }

    pub fn force_bind_interfaces_to_self<T: Injectable>(&mut self) -> Result<NonLazyBinding> {
        self.bind_interfaces_to_self_with::<T>(BindPolicy::Overwrite)
    }

    pub fn bind_interfaces_to_self_with<T: Injectable>(
        &mut self,
        policy: BindPolicy,
    ) -> Result<NonLazyBinding> {
        let mut capabilities = Capabilities::<T>::new();
        T::capabilities(&mut capabilities);
        self.register_group(capabilities, policy)
    }

    /// Like [`bind_interfaces_to_self`](Self::bind_interfaces_to_self), and
    /// also binds `T` itself to the same shared value.
    pub fn bind_interfaces_and_self<T: Injectable>(&mut self) -> Result<NonLazyBinding> {
        self.bind_interfaces_and_self_with::<T>(BindPolicy::ErrorIfExists)
    }

    pub fn bind_interfaces_and_self_if_not_bound<T: Injectable>(&mut self) -> Result<NonLazyBinding> {
        self.bind_interfaces_and_self_with::<T>(BindPolicy::SkipIfExists)
    }

    pub fn force_bind_interfaces_and_self<T: Injectable>(&mut self) -> Result<NonLazyBinding> {
        self.bind_interfaces_and_self_with::<T>(BindPolicy::Overwrite)
    }

    pub fn bind_interfaces_and_self_with<T: Injectable>(
        &mut self,
        policy: BindPolicy,
    ) -> Result<NonLazyBinding> {
        let mut capabilities = Capabilities::<T>::new();
        T::capabilities(&mut capabilities);
        capabilities.add::<T>();
        self.register_group(capabilities, policy)
    }

    fn register_group<T: Injectable>(
        &mut self,
        capabilities: Capabilities<T>,
        policy: BindPolicy,
    ) -> Result<NonLazyBinding> {
        self.ensure_live()?;
        prepare::<T>()?;

        let concrete = DependencyKey::of::<T>();
        if capabilities.is_empty() {
            debug!(concrete = %concrete, "Type declares no contracts, nothing bound");
        }

        let slot = Arc::new(SingletonSlot::<T>::new());
        let policy = self.effective(policy);
        for Capability { key, upcast } in capabilities.entries {
            if !self.registry.admit(&key, policy)? {
                continue;
            }
            let shared = Arc::clone(&slot);
            self.registry.insert(Binding {
                key,
                lifetime: Lifetime::Singleton,
                concrete: Some(concrete),
                factory: factory(move |res| Ok(upcast(shared.get_or_create(res)?))),
            });
        }

        Ok(NonLazyBinding::new(slot, self, concrete))
    }

    // ── Template ──

    /// Binds `C` to objects instantiated from `template` by the chain's
    /// [`Instantiator`]. Each resolve instantiates and injects a new object.
    ///
    /// # Errors
    /// - [`WireboxError::DuplicateBinding`] if `C` is already bound here
    /// - [`WireboxError::InjectOnConstructor`] if `T` cannot be planned
    pub fn bind_template<C, T>(&mut self, template: T) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.admit::<C>(BindPolicy::ErrorIfExists)?;
        self.register_template::<C, T>(template)
    }

    pub fn bind_template_if_not_bound<C, T>(&mut self, template: T) -> Result<bool>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.bind_template_with::<C, T>(template, BindPolicy::SkipIfExists)
    }

    pub fn force_bind_template<C, T>(&mut self, template: T) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        self.admit::<C>(BindPolicy::Overwrite)?;
        self.register_template::<C, T>(template)
    }

    pub fn bind_template_with<C, T>(&mut self, template: T, policy: BindPolicy) -> Result<bool>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        if !self.admit::<C>(policy)? {
            return Ok(false);
        }
        self.register_template::<C, T>(template).map(|()| true)
    }

    fn register_template<C, T>(&mut self, template: T) -> Result<()>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<C>,
    {
        injection::plan::<T>()?;
        let template = Arc::new(template);
        self.registry.insert(Binding {
            key: DependencyKey::of::<C>(),
            lifetime: Lifetime::Template,
            concrete: Some(DependencyKey::of::<T>()),
            factory: factory(move |res| {
                let value = Arc::new(instantiate_into::<T>(&template, res)?);
                Ok(erase(<T as Implements<C>>::upcast(value)))
            }),
        });
        Ok(())
    }

    // ── Installers ──

    /// Runs one installer against this container.
    #[instrument(skip(self, installer), name = "container_install")]
    pub fn install(&mut self, installer: &dyn Installer) -> Result<()> {
        self.ensure_live()?;
        let before = self.registry.len();
        installer.install_bindings(self)?;
        info!(
            container = self.label(),
            installer = installer.name(),
            added = self.registry.len().saturating_sub(before),
            "Installed bindings"
        );
        Ok(())
    }

    /// Runs installers in order, stopping at the first error.
    pub fn install_all(&mut self, installers: &[&dyn Installer]) -> Result<()> {
        for installer in installers {
            self.install(*installer)?;
        }
        Ok(())
    }

    // ── Resolution ──

    /// Resolves the contract `C`.
    ///
    /// ```rust,ignore
    /// let logger: Arc<dyn Logger> = container.resolve()?;
    /// ```
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        let instance = self.resolve_key(&DependencyKey::of::<C>())?;
        downcast_instance::<C>(&instance)
    }

    /// Resolves a contract by key, type-erased.
    pub fn resolve_key(&self, key: &DependencyKey) -> Result<Instance> {
        let mut context = ResolutionContext::new();
        self.resolve_key_in(key, &mut context)
    }

    /// Resolves a contract by key as part of an ongoing resolution.
    pub fn resolve_key_in(&self, key: &DependencyKey, context: &mut ResolutionContext) -> Result<Instance> {
        self.ensure_live()?;
        self.resolve_from_chain(key, context, None)
    }

    pub(crate) fn resolve_from_chain(
        &self,
        key: &DependencyKey,
        context: &mut ResolutionContext,
        placement: Option<&Placement>,
    ) -> Result<Instance> {
        self.resolve_for(self, key, context, placement)
    }

    /// Looks `key` up in this container's chain on behalf of `requester`,
    /// the container the top-level call was made on.
    fn resolve_for(
        &self,
        requester: &Container,
        key: &DependencyKey,
        context: &mut ResolutionContext,
        placement: Option<&Placement>,
    ) -> Result<Instance> {
        let Some((owner, binding)) = self.find_binding(key) else {
            return Err(self.missing(key, context));
        };

        trace!(
            key = %key,
            owner = owner.label(),
            lifetime = %binding.lifetime,
            depth = context.depth(),
            "Resolving"
        );
        let mut res = Resolution::new(owner, context, placement).requested_by(requester);
        (binding.factory)(&mut res)
    }

    fn find_binding(&self, key: &DependencyKey) -> Option<(&Container, &Binding)> {
        self.chain()
            .find_map(|container| container.registry.get(key).map(|binding| (container, binding)))
    }

    fn missing(&self, key: &DependencyKey, context: &ResolutionContext) -> WireboxError {
        let available: Vec<&str> = self
            .chain()
            .flat_map(|container| container.registry.keys())
            .map(DependencyKey::type_name)
            .collect();
        let suggestions = suggest_similar(key.type_name(), &available, MAX_SUGGESTIONS);

        debug!(key = %key, path = ?context.path(), "No binding in chain");
        WireboxError::MissingBinding(MissingBindingError {
            requested: *key,
            required_by: context.current(),
            suggestions,
        })
    }

    // ── Injection & templates ──

    /// Populates the marked members of an existing value.
    pub fn inject<T: Injectable>(&self, target: &mut T) -> Result<()> {
        self.ensure_live()?;
        let mut context = ResolutionContext::new();
        let mut res = Resolution::new(self, &mut context, None);
        injection::inject(target, &mut res)
    }

    /// Instantiates the template bound to `C` at `placement`.
    ///
    /// # Errors
    /// - [`WireboxError::MissingBinding`] if `C` is not bound in the chain
    /// - [`WireboxError::NotTemplate`] if `C` is bound with another lifetime
    /// - [`WireboxError::NoInstantiator`] / [`WireboxError::InstantiationFailed`]
    pub fn instantiate<C: ?Sized + Send + Sync + 'static>(
        &self,
        placement: Option<&Placement>,
    ) -> Result<Arc<C>> {
        self.ensure_live()?;
        let key = DependencyKey::of::<C>();
        let mut context = ResolutionContext::new();
        let Some((_, binding)) = self.find_binding(&key) else {
            return Err(self.missing(&key, &context));
        };
        if binding.lifetime != Lifetime::Template {
            return Err(WireboxError::NotTemplate { key });
        }

        let instance = self.resolve_from_chain(&key, &mut context, placement)?;
        downcast_instance::<C>(&instance)
    }

    /// Instantiates `template` and injects the result. No binding is
    /// involved.
    pub fn instantiate_and_inject<T: Injectable>(
        &self,
        template: &T,
        placement: Option<&Placement>,
    ) -> Result<T> {
        self.ensure_live()?;
        let mut context = ResolutionContext::new();
        let mut res = Resolution::new(self, &mut context, placement);
        instantiate_into(template, &mut res)
    }

    // ── Teardown ──

    /// Releases every owned releasable value in reverse order, then clears
    /// the container. Later bind and resolve calls fail with
    /// [`WireboxError::ContainerDisposed`]. A second call does nothing.
    ///
    /// # Errors
    /// [`WireboxError::ReleaseFailed`] listing every failed hook. All hooks
    /// run regardless.
    #[instrument(skip(self), name = "container_dispose")]
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        let failures = self.disposal.release_all();
        self.registry.clear();
        self.fallback = None;
        self.instantiator = None;
        self.disposed = true;

        info!(container = self.label(), failures = failures.len(), "Container disposed");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(WireboxError::ReleaseFailed(ReleaseFailedError { failures }))
        }
    }
}

fn prepare<T: Injectable>() -> Result<()> {
    construction::plan::<T>()?;
    injection::plan::<T>()?;
    Ok(())
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            error!(error = %err, "Teardown on drop failed");
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("bound", &self.registry.len())
            .field("has_fallback", &self.fallback.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Resolution (factory-side bridge)
// ═══════════════════════════════════════════

/// What a binding's factory sees while it runs: the container that owns
/// the binding, the container the top-level call was made on, the ongoing
/// resolution context, and the placement of a template instantiation.
pub struct Resolution<'a> {
    container: &'a Container,
    requester: &'a Container,
    context: &'a mut ResolutionContext,
    placement: Option<&'a Placement>,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(
        container: &'a Container,
        context: &'a mut ResolutionContext,
        placement: Option<&'a Placement>,
    ) -> Self {
        Self {
            container,
            requester: container,
            context,
            placement,
        }
    }

    pub(crate) fn requested_by(mut self, requester: &'a Container) -> Self {
        self.requester = requester;
        self
    }

    /// The container that owns the binding being resolved.
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// The container the top-level resolve was called on. Equal to
    /// [`container`](Self::container) unless the binding was found in a
    /// fallback.
    pub fn requester(&self) -> &'a Container {
        self.requester
    }

    pub fn placement(&self) -> Option<&'a Placement> {
        self.placement
    }

    pub fn context(&self) -> &ResolutionContext {
        &*self.context
    }

    pub fn context_mut(&mut self) -> &mut ResolutionContext {
        &mut *self.context
    }

    /// Resolves a dependency from the owning container's chain.
    pub fn resolve_key(&mut self, key: &DependencyKey) -> Result<Instance> {
        self.container
            .resolve_for(self.requester, key, &mut *self.context, None)
    }

    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<C>> {
        let instance = self.resolve_key(&DependencyKey::of::<C>())?;
        downcast_instance::<C>(&instance)
    }

    /// Resolves one constructor parameter. An optional parameter that
    /// cannot be resolved becomes [`Slot::Absent`].
    pub(crate) fn resolve_param(&mut self, param: &ParamSpec) -> Result<Slot> {
        match self.resolve_key(&param.key) {
            Ok(instance) => Ok(Slot::Resolved(instance)),
            Err(err) if param.optional => {
                debug!(dependency = %param.key, error = %err, "Optional parameter left empty");
                Ok(Slot::Absent)
            }
            Err(err) => Err(err),
        }
    }
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("container", &self.container.label())
            .field("requester", &self.requester.label())
            .field("context", &self.context)
            .field("has_placement", &self.placement.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, Resolution};
    pub use crate::dependency::Implements;
    pub use crate::error::{Result, WireboxError};
    pub use crate::installer::Installer;
    pub use crate::key::DependencyKey;
    pub use crate::lifetime::{Lifetime, NonLazyBinding};
    pub use crate::registry::BindPolicy;
    pub use crate::settings::ContainerSettings;
    pub use crate::shape::{Capabilities, Component, Constructors, Injectable, Members, Release};
    pub use crate::template::{CloningInstantiator, Instantiator, Placement};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::shape::{Constructors, Members, Release};
    use crate::template::CloningInstantiator;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Logger: Send + Sync {
        fn tag(&self) -> &str;
    }

    trait Sink: Send + Sync {}

    #[derive(Default)]
    struct MemoryLogger;
    impl Logger for MemoryLogger {
        fn tag(&self) -> &str {
            "memory"
        }
    }
    impl Sink for MemoryLogger {}
    impl Component for MemoryLogger {}
    impl Injectable for MemoryLogger {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("default", MemoryLogger::default);
        }

        fn capabilities(capabilities: &mut Capabilities<Self>) {
            capabilities.add::<dyn Logger>().add::<dyn Sink>();
        }
    }
    crate::implements!(MemoryLogger: dyn Logger, dyn Sink);

    struct TaggedLogger(&'static str);
    impl Logger for TaggedLogger {
        fn tag(&self) -> &str {
            self.0
        }
    }
    impl Component for TaggedLogger {}
    crate::implements!(TaggedLogger: dyn Logger);

    struct Service {
        logger: Arc<dyn Logger>,
    }
    impl Component for Service {}
    impl Injectable for Service {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("new", |logger: Arc<dyn Logger>| Service { logger });
        }
    }

    struct Left {
        _right: Arc<Right>,
    }
    impl Component for Left {}
    impl Injectable for Left {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("new", |right: Arc<Right>| Left { _right: right });
        }
    }

    struct Right {
        _left: Arc<Left>,
    }
    impl Component for Right {}
    impl Injectable for Right {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("new", |left: Arc<Left>| Right { _left: left });
        }
    }

    #[derive(Default)]
    struct ReleaseLog {
        released: Mutex<Vec<u8>>,
    }
    impl Component for ReleaseLog {}

    struct Handle<const N: u8> {
        log: Arc<ReleaseLog>,
    }
    impl<const N: u8> Component for Handle<N> {
        fn as_release(&self) -> Option<&dyn Release> {
            Some(self)
        }
    }
    impl<const N: u8> Release for Handle<N> {
        fn release(&self) -> std::result::Result<(), BoxError> {
            self.log.released.lock().push(N);
            if N == 0 {
                return Err("handle 0 always fails".into());
            }
            Ok(())
        }
    }
    impl<const N: u8> Injectable for Handle<N> {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("new", |log: Arc<ReleaseLog>| Handle::<N> { log });
        }
    }

    trait Reader: Send + Sync {}
    trait Writer: Send + Sync {}
    impl<const N: u8> Reader for Handle<N> {}
    impl<const N: u8> Writer for Handle<N> {}
    crate::implements!(Handle<5>: dyn Reader, dyn Writer);

    struct Counted;
    static COUNTED_BUILDS: AtomicUsize = AtomicUsize::new(0);
    impl Component for Counted {}
    impl Injectable for Counted {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("new", || {
                COUNTED_BUILDS.fetch_add(1, Ordering::SeqCst);
                Counted
            });
        }
    }

    struct Unbuildable;
    impl Component for Unbuildable {}
    impl Injectable for Unbuildable {
        fn constructors(constructors: &mut Constructors<Self>) {
            constructors.add("old", || Unbuildable).deprecated();
        }
    }

    #[derive(Clone, Default)]
    struct Sprite {
        frames: u8,
        logger: Option<Arc<dyn Logger>>,
    }
    impl Component for Sprite {}
    impl Injectable for Sprite {
        fn constructors(_: &mut Constructors<Self>) {}

        fn members(members: &mut Members<Self>) {
            members
                .field("logger", |this: &mut Sprite, logger: Arc<dyn Logger>| this.logger = Some(logger))
                .optional();
        }
    }

    struct RefusingInstantiator;
    impl Instantiator for RefusingInstantiator {
        fn instantiate(
            &self,
            _: &(dyn std::any::Any + Send + Sync),
            _: Option<&Placement>,
        ) -> Option<Box<dyn std::any::Any + Send + Sync>> {
            None
        }
    }

    struct PlacingInstantiator;
    impl Instantiator for PlacingInstantiator {
        fn instantiate(
            &self,
            template: &(dyn std::any::Any + Send + Sync),
            placement: Option<&Placement>,
        ) -> Option<Box<dyn std::any::Any + Send + Sync>> {
            let mut sprite = template.downcast_ref::<Sprite>()?.clone();
            if let Some(frames) = placement.and_then(|p| p.downcast_ref::<u8>()) {
                sprite.frames = *frames;
            }
            Some(Box::new(sprite))
        }
    }

    fn data_ptr<T: ?Sized>(value: &Arc<T>) -> *const () {
        Arc::as_ptr(value) as *const ()
    }

    // ── Registry & policies ──

    #[test]
    fn resolve_missing_binding() {
        let container = Container::new();
        match container.resolve::<dyn Logger>().err().expect("resolution should fail") {
            WireboxError::MissingBinding(e) => {
                assert_eq!(e.requested, DependencyKey::of::<dyn Logger>());
                assert!(e.required_by.is_none());
            }
            other => panic!("Expected MissingBinding, got: {other:?}"),
        }
    }

    #[test]
    fn missing_nested_dependency_names_requester() {
        let mut container = Container::new();
        container.bind_transient::<Service, Service>().unwrap();

        match container.resolve::<Service>().err().expect("resolution should fail") {
            WireboxError::MissingBinding(e) => {
                assert_eq!(e.requested, DependencyKey::of::<dyn Logger>());
                assert_eq!(e.required_by, Some(DependencyKey::of::<Service>()));
            }
            other => panic!("Expected MissingBinding, got: {other:?}"),
        }
    }

    #[test]
    fn transient_yields_distinct_values() {
        let mut container = Container::new();
        container.bind_transient::<dyn Logger, MemoryLogger>().unwrap();
        container.bind_transient::<Service, Service>().unwrap();

        let a = container.resolve::<Service>().unwrap();
        let b = container.resolve::<Service>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.logger.tag(), "memory");
    }

    #[test]
    fn singleton_yields_identical_values() {
        let mut container = Container::new();
        let _ = container.bind_singleton::<dyn Logger, MemoryLogger>().unwrap();

        let a = container.resolve::<dyn Logger>().unwrap();
        let b = container.resolve::<dyn Logger>().unwrap();
        assert_eq!(data_ptr(&a), data_ptr(&b));
    }

    #[test]
    fn strict_policy_rejects_rebinding() {
        let mut container = Container::new();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("first")))
            .unwrap();

        let err = container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("second")))
            .unwrap_err();
        assert!(matches!(err, WireboxError::DuplicateBinding(_)));
        assert_eq!(container.resolve::<dyn Logger>().unwrap().tag(), "first");
    }

    #[test]
    fn skip_policy_keeps_existing_binding() {
        let mut container = Container::new();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("first")))
            .unwrap();

        let written = container
            .bind_instance_if_not_bound::<dyn Logger, _>(Arc::new(TaggedLogger("second")))
            .unwrap();
        assert!(!written);
        assert!(container.bind_singleton_if_not_bound::<dyn Logger, MemoryLogger>().unwrap().is_none());
        assert_eq!(container.resolve::<dyn Logger>().unwrap().tag(), "first");
    }

    #[test]
    fn overwrite_policy_replaces_binding() {
        let mut container = Container::new();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("first")))
            .unwrap();
        container
            .force_bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("second")))
            .unwrap();
        assert_eq!(container.resolve::<dyn Logger>().unwrap().tag(), "second");

        container.force_bind_transient::<dyn Logger, MemoryLogger>().unwrap();
        assert_eq!(container.resolve::<dyn Logger>().unwrap().tag(), "memory");
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn allow_override_relaxes_strict_binds() {
        let mut container = Container::builder().allow_override(true).build();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("first")))
            .unwrap();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("second")))
            .unwrap();
        assert_eq!(container.resolve::<dyn Logger>().unwrap().tag(), "second");
    }

    #[test]
    fn unusable_type_is_rejected_at_bind() {
        let mut container = Container::new();
        let err = container.bind_transient::<Unbuildable, Unbuildable>().unwrap_err();
        assert!(matches!(err, WireboxError::NoUsableConstructor { .. }));
        assert!(!container.is_bound::<Unbuildable>());
    }

    // ── Fallback chain ──

    #[test]
    fn fallback_chain_and_shadowing() {
        let mut root = Container::builder().name("root").build();
        root.bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("root")))
            .unwrap();
        let root = Arc::new(root);

        let mut scene = Container::with_fallback(Arc::clone(&root));
        assert_eq!(scene.resolve::<dyn Logger>().unwrap().tag(), "root");
        assert!(scene.can_resolve::<dyn Logger>());
        assert!(!scene.is_bound::<dyn Logger>());

        scene
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("scene")))
            .unwrap();
        assert_eq!(scene.resolve::<dyn Logger>().unwrap().tag(), "scene");
        assert_eq!(root.resolve::<dyn Logger>().unwrap().tag(), "root");
    }

    #[test]
    fn factory_resolves_from_owning_container() {
        let mut root = Container::new();
        root.bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("root")))
            .unwrap();
        root.bind_transient::<Service, Service>().unwrap();
        let root = Arc::new(root);

        let mut scene = Container::with_fallback(root);
        scene
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("scene")))
            .unwrap();

        let service = scene.resolve::<Service>().unwrap();
        assert_eq!(service.logger.tag(), "root");
    }

    #[test]
    fn missing_binding_suggests_similar_contracts() {
        let mut container = Container::new();
        container.bind_transient::<dyn Sink, MemoryLogger>().unwrap();

        match container.resolve::<MemoryLogger>().err().expect("resolution should fail") {
            WireboxError::MissingBinding(e) => assert!(e.suggestions.is_empty()),
            other => panic!("Expected MissingBinding, got: {other:?}"),
        }

        container.bind_transient::<Handle<1>, Handle<1>>().unwrap();
        match container.resolve::<Handle<2>>().err().expect("resolution should fail") {
            WireboxError::MissingBinding(e) => {
                assert_eq!(e.suggestions.len(), 1);
                assert!(e.suggestions[0].ends_with("Handle<1>"));
            }
            other => panic!("Expected MissingBinding, got: {other:?}"),
        }
    }

    // ── Cycles ──

    #[test]
    fn singleton_cycle_is_reported_and_context_restored() {
        let mut container = Container::new();
        let _ = container.bind_singleton::<Left, Left>().unwrap();
        let _ = container.bind_singleton::<Right, Right>().unwrap();

        let mut context = ResolutionContext::new();
        let err = container
            .resolve_key_in(&DependencyKey::of::<Left>(), &mut context)
            .unwrap_err();

        match err {
            WireboxError::CircularDependency(e) => {
                assert_eq!(
                    e.chain,
                    vec![
                        DependencyKey::of::<Left>(),
                        DependencyKey::of::<Right>(),
                        DependencyKey::of::<Left>(),
                    ]
                );
                assert!(e.to_string().contains("Left -> Right -> Left"));
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
        assert!(context.is_empty());
    }

    #[test]
    fn transient_cycle_is_reported() {
        let mut container = Container::new();
        container.bind_transient::<Left, Left>().unwrap();
        container.bind_transient::<Right, Right>().unwrap();

        assert!(matches!(
            container.resolve::<Right>(),
            Err(WireboxError::CircularDependency(_))
        ));
    }

    // ── Singletons ──

    #[test]
    fn non_lazy_singleton_is_built_once() {
        let mut container = Container::new();
        let handle = container.bind_singleton::<Counted, Counted>().unwrap();
        assert!(!handle.is_materialized());

        let before = COUNTED_BUILDS.load(Ordering::SeqCst);
        handle.as_non_lazy(&container).unwrap();
        assert!(handle.is_materialized());
        container.resolve::<Counted>().unwrap();
        assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn non_lazy_handle_rejects_other_container() {
        let log = Arc::new(ReleaseLog::default());
        let mut global = Container::new();
        global.bind_instance::<ReleaseLog, _>(Arc::clone(&log)).unwrap();
        let handle = global.bind_singleton::<Handle<4>, Handle<4>>().unwrap();
        let global = Arc::new(global);

        let mut scene = Container::with_fallback(Arc::clone(&global));
        assert!(matches!(
            handle.as_non_lazy(&scene),
            Err(WireboxError::ForeignContainer { .. })
        ));
        assert!(!handle.is_materialized());

        scene.dispose().unwrap();
        assert!(log.released.lock().is_empty());

        handle.as_non_lazy(&global).unwrap();
        assert!(handle.is_materialized());
        assert!(log.released.lock().is_empty());
    }

    #[test]
    fn concurrent_resolution_shares_one_singleton() {
        let mut container = Container::new();
        let _ = container.bind_singleton::<dyn Logger, MemoryLogger>().unwrap();

        let pointers: Vec<*const ()> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| data_ptr(&container.resolve::<dyn Logger>().unwrap()) as usize))
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap() as *const ())
                .collect()
        });

        let first = data_ptr(&container.resolve::<dyn Logger>().unwrap());
        assert!(pointers.iter().all(|&p| p == first));
    }

    #[test]
    fn interfaces_share_one_value() {
        let mut container = Container::new();
        let handle = container.bind_interfaces_to_self::<MemoryLogger>().unwrap();

        let logger = container.resolve::<dyn Logger>().unwrap();
        let sink = container.resolve::<dyn Sink>().unwrap();
        assert_eq!(data_ptr(&logger), data_ptr(&sink));
        assert!(handle.is_materialized());
        assert!(!container.is_bound::<MemoryLogger>());
    }

    #[test]
    fn interfaces_and_self_binds_concrete_too() {
        let mut container = Container::new();
        let _ = container.bind_interfaces_and_self::<MemoryLogger>().unwrap();

        let concrete = container.resolve::<MemoryLogger>().unwrap();
        let logger = container.resolve::<dyn Logger>().unwrap();
        assert_eq!(data_ptr(&concrete), data_ptr(&logger));
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn strict_interface_group_stops_at_first_conflict() {
        let mut container = Container::new();
        container
            .bind_instance::<dyn Sink, _>(Arc::new(MemoryLogger))
            .unwrap();

        let err = container.bind_interfaces_to_self::<MemoryLogger>().unwrap_err();
        assert!(matches!(err, WireboxError::DuplicateBinding(_)));
        assert!(container.is_bound::<dyn Logger>());
    }

    #[test]
    fn lenient_interface_group_skips_conflicts() {
        let mut container = Container::new();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("kept")))
            .unwrap();

        let _ = container.bind_interfaces_to_self_if_not_bound::<MemoryLogger>().unwrap();
        assert_eq!(container.resolve::<dyn Logger>().unwrap().tag(), "kept");
        assert!(container.is_bound::<dyn Sink>());
    }

    // ── Disposal ──

    #[test]
    fn dispose_releases_in_reverse_materialization_order() {
        let log = Arc::new(ReleaseLog::default());
        let mut container = Container::new();
        container.bind_instance::<ReleaseLog, _>(Arc::clone(&log)).unwrap();
        let _ = container.bind_singleton::<Handle<1>, Handle<1>>().unwrap();
        let _ = container.bind_singleton::<Handle<2>, Handle<2>>().unwrap();
        let _ = container.bind_singleton::<Handle<3>, Handle<3>>().unwrap();

        container.resolve::<Handle<2>>().unwrap();
        container.resolve::<Handle<1>>().unwrap();
        container.resolve::<Handle<3>>().unwrap();

        container.dispose().unwrap();
        assert_eq!(*log.released.lock(), vec![3, 1, 2]);
    }

    #[test]
    fn instance_bound_under_two_contracts_is_released_once() {
        let log = Arc::new(ReleaseLog::default());
        let file = Arc::new(Handle::<5> { log: Arc::clone(&log) });
        let mut container = Container::new();
        container.bind_instance::<dyn Reader, _>(Arc::clone(&file)).unwrap();
        container.bind_instance::<dyn Writer, _>(file).unwrap();

        container.dispose().unwrap();
        assert_eq!(*log.released.lock(), vec![5]);
    }

    #[test]
    fn release_failure_is_reported_after_full_teardown() {
        let log = Arc::new(ReleaseLog::default());
        let mut container = Container::new();
        container.bind_instance::<ReleaseLog, _>(Arc::clone(&log)).unwrap();
        container
            .bind_instance::<Handle<1>, _>(Arc::new(Handle::<1> { log: Arc::clone(&log) }))
            .unwrap();
        container
            .bind_instance::<Handle<0>, _>(Arc::new(Handle::<0> { log: Arc::clone(&log) }))
            .unwrap();

        match container.dispose().unwrap_err() {
            WireboxError::ReleaseFailed(e) => {
                assert_eq!(e.failures.len(), 1);
                assert_eq!(e.failures[0].key, DependencyKey::of::<Handle<0>>());
            }
            other => panic!("Expected ReleaseFailed, got: {other:?}"),
        }
        assert_eq!(*log.released.lock(), vec![0, 1]);
    }

    #[test]
    fn disposed_container_rejects_use() {
        let mut container = Container::new();
        let _ = container.bind_singleton::<dyn Logger, MemoryLogger>().unwrap();
        container.dispose().unwrap();

        assert!(container.is_disposed());
        assert!(container.is_empty());
        assert!(matches!(
            container.resolve::<dyn Logger>(),
            Err(WireboxError::ContainerDisposed)
        ));
        assert!(matches!(
            container.bind_transient::<Service, Service>(),
            Err(WireboxError::ContainerDisposed)
        ));
        assert!(container.dispose().is_ok());
    }

    #[test]
    fn drop_releases_owned_values() {
        let log = Arc::new(ReleaseLog::default());
        {
            let mut container = Container::new();
            container.bind_instance::<ReleaseLog, _>(Arc::clone(&log)).unwrap();
            let _ = container.bind_singleton::<Handle<7>, Handle<7>>().unwrap();
            container.resolve::<Handle<7>>().unwrap();
        }
        assert_eq!(*log.released.lock(), vec![7]);
    }

    #[test]
    fn unmaterialized_singleton_is_not_released() {
        let log = Arc::new(ReleaseLog::default());
        let mut container = Container::new();
        container.bind_instance::<ReleaseLog, _>(Arc::clone(&log)).unwrap();
        let _ = container.bind_singleton::<Handle<5>, Handle<5>>().unwrap();

        container.dispose().unwrap();
        assert!(log.released.lock().is_empty());
    }

    // ── Templates ──

    #[test]
    fn template_without_instantiator_fails() {
        let mut container = Container::new();
        container.bind_template::<Sprite, _>(Sprite::default()).unwrap();

        assert!(matches!(
            container.resolve::<Sprite>(),
            Err(WireboxError::NoInstantiator { .. })
        ));
    }

    #[test]
    fn refusing_instantiator_fails() {
        let mut container = Container::builder().instantiator(RefusingInstantiator).build();
        container.bind_template::<Sprite, _>(Sprite::default()).unwrap();

        assert!(matches!(
            container.instantiate::<Sprite>(None),
            Err(WireboxError::InstantiationFailed { .. })
        ));
    }

    #[test]
    fn template_is_instantiated_and_injected() {
        let mut container = Container::builder()
            .instantiator(CloningInstantiator::new().register::<Sprite>())
            .build();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("scene")))
            .unwrap();
        container
            .bind_template::<Sprite, _>(Sprite {
                frames: 4,
                logger: None,
            })
            .unwrap();

        let a = container.resolve::<Sprite>().unwrap();
        let b = container.resolve::<Sprite>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.frames, 4);
        assert_eq!(a.logger.as_ref().map(|l| l.tag()), Some("scene"));
    }

    #[test]
    fn placement_reaches_instantiator_inherited_from_fallback() {
        let mut root = Container::builder().instantiator(PlacingInstantiator).build();
        root.bind_template::<Sprite, _>(Sprite::default()).unwrap();
        let scene = Container::with_fallback(Arc::new(root));

        let sprite = scene.instantiate::<Sprite>(Some(&9u8)).unwrap();
        assert_eq!(sprite.frames, 9);
        assert!(sprite.logger.is_none());
    }

    #[test]
    fn scene_instantiator_serves_templates_bound_in_fallback() {
        let mut root = Container::new();
        root.bind_template::<Sprite, _>(Sprite::default()).unwrap();
        let root = Arc::new(root);
        let scene = Container::builder()
            .fallback(Arc::clone(&root))
            .instantiator(PlacingInstantiator)
            .build();

        assert!(matches!(
            root.resolve::<Sprite>(),
            Err(WireboxError::NoInstantiator { .. })
        ));
        let sprite = scene.instantiate::<Sprite>(Some(&3u8)).unwrap();
        assert_eq!(sprite.frames, 3);
    }

    #[test]
    fn instantiate_rejects_non_template_binding() {
        let mut container = Container::new();
        container.bind_transient::<dyn Logger, MemoryLogger>().unwrap();

        assert!(matches!(
            container.instantiate::<dyn Logger>(None),
            Err(WireboxError::NotTemplate { .. })
        ));
    }

    #[test]
    fn instantiate_and_inject_without_binding() {
        let mut container = Container::builder()
            .instantiator(CloningInstantiator::new().register::<Sprite>())
            .build();
        container
            .bind_instance::<dyn Logger, _>(Arc::new(TaggedLogger("direct")))
            .unwrap();

        let template = Sprite {
            frames: 2,
            logger: None,
        };
        let sprite = container.instantiate_and_inject(&template, None).unwrap();
        assert_eq!(sprite.frames, 2);
        assert_eq!(sprite.logger.map(|l| l.tag().to_string()), Some("direct".to_string()));
        assert!(template.logger.is_none());
    }

    #[test]
    fn inject_existing_value() {
        let mut container = Container::new();
        container.bind_transient::<dyn Logger, MemoryLogger>().unwrap();

        let mut sprite = Sprite::default();
        container.inject(&mut sprite).unwrap();
        assert_eq!(sprite.logger.map(|l| l.tag().to_string()), Some("memory".to_string()));
    }

    #[test]
    fn debug_output() {
        let mut container = Container::builder().name("global").build();
        container.bind_transient::<dyn Logger, MemoryLogger>().unwrap();

        let debug = format!("{container:?}");
        assert!(debug.contains("global"));
        assert!(debug.contains("bound: 1"));
    }
}
