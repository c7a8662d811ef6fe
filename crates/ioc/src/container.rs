//! 📦 Container - API регистрации и разрешения поверх одного registry.
//!
//! # LOCKING
//!
//! Один reentrant lock на контейнер сериализует все top-level вызовы.
//! Конкурентные первые запросы к одному слоту строят его один раз: второй
//! вызов ждет lock и читает уже закэшированный instance.
//!
//! Reentrancy позволяет телу конструктора обращаться к тому же контейнеру в
//! своем потоке. Вложенный вызов продолжает текущий build stack, поэтому
//! запрос слота, который сейчас строится, дает ошибку цикла.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, info, warn};

use crate::build_stack::BuildStack;
use crate::callable::Callable;
use crate::container_config::ContainerConfig;
use crate::errors::{IocError, IocResult};
use crate::introspection::{TypeCatalog, TypeIntrospector};
use crate::metrics::{ContainerStats, ResolverMetrics};
use crate::registry::{ArgumentOverrides, Registry, Strategy};
use crate::resolver::Resolver;
use crate::types::{Frame, Instance, Key, TypeName};

pub struct Container {
    config: ContainerConfig,
    introspector: Arc<dyn TypeIntrospector>,
    state: ReentrantMutex<State>,
    metrics: RwLock<ResolverMetrics>,
}

/// Everything guarded by the container lock.
struct State {
    registry: RefCell<Registry>,
    stack: RefCell<BuildStack>,
}

impl Container {
    pub fn new(introspector: Arc<dyn TypeIntrospector>) -> Self {
        Self::with_config(introspector, ContainerConfig::default())
    }

    pub fn with_config(introspector: Arc<dyn TypeIntrospector>, config: ContainerConfig) -> Self {
        info!(
            "🏗️ Creating container '{}' (max depth {:?})",
            config.name, config.max_resolution_depth
        );

        Self {
            introspector,
            state: ReentrantMutex::new(State {
                registry: RefCell::new(Registry::new()),
                stack: RefCell::new(BuildStack::new(config.max_resolution_depth)),
            }),
            metrics: RwLock::new(ResolverMetrics::default()),
            config,
        }
    }

    pub fn from_catalog(catalog: TypeCatalog) -> Self {
        Self::new(catalog.into_shared())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn introspector(&self) -> &Arc<dyn TypeIntrospector> {
        &self.introspector
    }

    // === REGISTRATION ===

    /// Bind `(type, key)` to the type's own constructor.
    pub fn register_class(
        &self,
        type_name: impl Into<TypeName>,
        overrides: ArgumentOverrides,
        key: impl Into<Key>,
    ) -> IocResult<()> {
        let frame = Frame::new(type_name, key);
        self.ensure_exists(&frame)?;
        self.insert(frame, Strategy::Class, overrides, None)
    }

    /// Bind a concrete `(type, key)` to a factory callable.
    pub fn register_class_by_factory(
        &self,
        type_name: impl Into<TypeName>,
        factory: Callable,
        overrides: ArgumentOverrides,
        key: impl Into<Key>,
    ) -> IocResult<()> {
        let frame = Frame::new(type_name, key);
        self.ensure_exists(&frame)?;
        self.insert(frame, Strategy::Factory(factory), overrides, None)
    }

    /// Bind a concrete `(type, key)` to a pre-built instance.
    ///
    /// All checks run before the slot is touched: an instance that does not
    /// satisfy `type` is rejected with `NotTypeOfInstance` and leaves no class
    /// registration behind.
    pub fn register_class_by_instance(
        &self,
        type_name: impl Into<TypeName>,
        instance: Instance,
        key: impl Into<Key>,
    ) -> IocResult<()> {
        let frame = Frame::new(type_name, key);
        self.ensure_exists(&frame)?;
        self.insert_instance(frame, instance)
    }

    /// Redirect `(interface, key)` to `(implementation, implementation_key)`.
    /// The implementation must be registered separately.
    pub fn register_interface_by_class(
        &self,
        interface: impl Into<TypeName>,
        implementation: impl Into<TypeName>,
        key: impl Into<Key>,
        implementation_key: impl Into<Key>,
    ) -> IocResult<()> {
        let frame = Frame::new(interface, key);
        self.ensure_abstract(&frame)?;
        let target = Frame::new(implementation, implementation_key);
        self.insert(frame, Strategy::Redirect(target), ArgumentOverrides::new(), None)
    }

    pub fn register_interface_by_factory(
        &self,
        interface: impl Into<TypeName>,
        factory: Callable,
        overrides: ArgumentOverrides,
        key: impl Into<Key>,
    ) -> IocResult<()> {
        let frame = Frame::new(interface, key);
        self.ensure_abstract(&frame)?;
        self.insert(frame, Strategy::Factory(factory), overrides, None)
    }

    pub fn register_interface_by_instance(
        &self,
        interface: impl Into<TypeName>,
        instance: Instance,
        key: impl Into<Key>,
    ) -> IocResult<()> {
        let frame = Frame::new(interface, key);
        self.ensure_abstract(&frame)?;
        self.insert_instance(frame, instance)
    }

    // === QUERIES ===

    pub fn is_registered(&self, type_name: impl Into<TypeName>, key: impl Into<Key>) -> bool {
        let frame = Frame::new(type_name, key);
        let state = self.state.lock();
        let registry = state.registry.borrow();
        registry.contains(&frame)
    }

    pub fn has_any_registration(&self, type_name: impl Into<TypeName>) -> bool {
        let type_name = type_name.into();
        let state = self.state.lock();
        let registry = state.registry.borrow();
        registry.has_any(&type_name)
    }

    pub fn has_any_cached_instance(&self, type_name: impl Into<TypeName>) -> bool {
        let type_name = type_name.into();
        let state = self.state.lock();
        let registry = state.registry.borrow();
        registry.has_any_cached(&type_name)
    }

    /// Strategy name bound to a slot (`"class"`, `"factory"`, `"instance"`,
    /// `"redirect"`), if registered.
    pub fn strategy_of(&self, type_name: impl Into<TypeName>, key: impl Into<Key>) -> Option<&'static str> {
        let frame = Frame::new(type_name, key);
        let state = self.state.lock();
        let registry = state.registry.borrow();
        registry.strategy_kind(&frame)
    }

    // === RESOLUTION ===

    /// Instance for `(type, key)`, built on first request and cached after.
    pub fn get_instance(
        &self,
        type_name: impl Into<TypeName>,
        key: impl Into<Key>,
    ) -> IocResult<Instance> {
        let frame = Frame::new(type_name, key);
        self.top_level(&frame.to_string(), |resolver| resolver.resolve(&frame))
    }

    /// Default-key shorthand for [`Container::get_instance`].
    pub fn get(&self, type_name: impl Into<TypeName>) -> IocResult<Instance> {
        self.get_instance(type_name, Key::DEFAULT)
    }

    pub fn try_get_instance(
        &self,
        type_name: impl Into<TypeName>,
        key: impl Into<Key>,
    ) -> Option<Instance> {
        self.get_instance(type_name, key).ok()
    }

    /// Resolve and downcast to the Rust type held by the instance.
    pub fn get_as<T: Any + Send + Sync>(
        &self,
        type_name: impl Into<TypeName>,
        key: impl Into<Key>,
    ) -> IocResult<Arc<T>> {
        let frame = Frame::new(type_name, key);
        let instance = self.get_instance(frame.type_name.clone(), frame.key.clone())?;
        instance
            .downcast::<T>()
            .ok_or_else(|| IocError::downcast::<T>(format!("{frame} ({})", instance.type_name())))
    }

    /// Every instance already cached under `type`, in registration order.
    pub fn get_all_cached_instances(&self, type_name: impl Into<TypeName>) -> Vec<Instance> {
        let type_name = type_name.into();
        let state = self.state.lock();
        let registry = state.registry.borrow();
        registry.cached_instances(&type_name)
    }

    /// Resolve every key registered under `type`, in registration order.
    pub fn get_all_instances(&self, type_name: impl Into<TypeName>) -> IocResult<Vec<Instance>> {
        let type_name = type_name.into();
        let state = self.state.lock();
        let keys = state.registry.borrow().keys(&type_name);

        keys.into_iter()
            .map(|key| self.get_instance(type_name.clone(), key))
            .collect()
    }

    /// Call `callable` with its parameters injected, without registering it.
    pub fn invoke(&self, callable: &Callable, overrides: &ArgumentOverrides) -> IocResult<Instance> {
        self.top_level("invoked callable", |resolver| {
            resolver.call(callable, overrides, "invoked callable")
        })
    }

    // === LIFECYCLE ===

    /// Drop every registration, cached instance and counter.
    pub fn clear(&self) {
        let state = self.state.lock();
        let dropped = {
            let mut registry = state.registry.borrow_mut();
            let count = registry.registration_count();
            registry.clear();
            count
        };
        *self.metrics.write() = ResolverMetrics::default();
        info!(
            "🧹 Container '{}' cleared ({} registrations dropped)",
            self.config.name, dropped
        );
    }

    pub fn stats(&self) -> ContainerStats {
        let state = self.state.lock();
        let registry = state.registry.borrow();
        ContainerStats {
            name: self.config.name.clone(),
            registrations: registry.registration_count(),
            cached_instances: registry.cached_count(),
            resolver: self.metrics.read().clone(),
        }
    }

    pub fn reset_metrics(&self) {
        *self.metrics.write() = ResolverMetrics::default();
        debug!("🔄 Metrics of container '{}' reset", self.config.name);
    }

    // === PRIVATE IMPLEMENTATION ===

    fn top_level<T>(
        &self,
        subject: &str,
        op: impl FnOnce(&Resolver<'_>) -> IocResult<T>,
    ) -> IocResult<T> {
        let started = Instant::now();
        let state = self.state.lock();

        // Outermost call of a call tree; nested calls come from factory bodies
        let outermost = state.stack.borrow().is_empty();
        if outermost {
            state.stack.borrow_mut().reset_high_water();
        }

        let resolver = Resolver::new(
            self.introspector.as_ref(),
            &state.registry,
            &state.stack,
            &self.metrics,
            self.config.verbose_logging,
        );
        let result = op(&resolver);

        let high_water = {
            let stack = state.stack.borrow();
            debug_assert!(!outermost || stack.is_empty(), "build stack leaked frames");
            stack.high_water()
        };
        self.metrics
            .write()
            .record_outcome(result.is_ok(), started.elapsed(), high_water);

        if let Err(error) = &result {
            if self.config.verbose_logging || error.is_structural() {
                warn!(code = error.code(), "❌ Resolving {} failed: {}", subject, error);
            }
        }

        result
    }

    fn ensure_exists(&self, frame: &Frame) -> IocResult<()> {
        if self.introspector.type_exists(&frame.type_name) {
            Ok(())
        } else {
            warn!("❌ Refusing registration of unknown type {}", frame);
            Err(IocError::TypeNotFound {
                type_name: frame.type_name.clone(),
                key: frame.key.clone(),
            })
        }
    }

    fn ensure_abstract(&self, frame: &Frame) -> IocResult<()> {
        if self.introspector.is_abstract(&frame.type_name) {
            Ok(())
        } else {
            warn!("❌ Refusing interface binding for concrete type {}", frame);
            Err(IocError::InterfaceNotAbstract {
                type_name: frame.type_name.clone(),
                key: frame.key.clone(),
            })
        }
    }

    /// Duplicate check before the instance-of check, then bind.
    fn insert_instance(&self, frame: Frame, instance: Instance) -> IocResult<()> {
        let state = self.state.lock();
        if state.registry.borrow().contains(&frame) {
            return Err(IocError::already_registered(&frame));
        }

        if !self.introspector.is_instance_of(&instance, &frame.type_name) {
            warn!(
                "❌ Instance of {} does not satisfy {}",
                instance.type_name(),
                frame
            );
            return Err(IocError::NotTypeOfInstance {
                type_name: frame.type_name,
                key: frame.key,
                actual: instance.type_name().clone(),
            });
        }

        self.insert(frame, Strategy::Instance, ArgumentOverrides::new(), Some(instance))
    }

    fn insert(
        &self,
        frame: Frame,
        strategy: Strategy,
        overrides: ArgumentOverrides,
        cached: Option<Instance>,
    ) -> IocResult<()> {
        let state = self.state.lock();
        let kind = strategy.kind();
        let label = frame.to_string();

        let result = state
            .registry
            .borrow_mut()
            .insert(frame, strategy, overrides, cached);

        match &result {
            Ok(()) => {
                if self.config.verbose_logging {
                    debug!("📝 Registered {} ({})", label, kind);
                }
            }
            Err(error) => warn!("❌ Registration of {} rejected: {}", label, error),
        }
        result
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
