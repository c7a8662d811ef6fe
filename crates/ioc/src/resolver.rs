//! Resolver - построение instances для зарегистрированных `(type, key)` слотов.
//!
//! Читает build plans из registry, проходит по объявленным параметрам,
//! рекурсивно разрешает зависимости и кладет готовые instances в singleton
//! cache. Lock держит вызывающий код. Resolver заимствует registry и build
//! stack только на короткие участки и никогда во время выполнения user code.

use std::cell::RefCell;

use parking_lot::RwLock;
use tracing::debug;

use crate::build_stack::{BuildFrame, BuildStack};
use crate::callable::{Arguments, Callable, ParamDescriptor};
use crate::errors::{IocError, IocResult};
use crate::introspection::TypeIntrospector;
use crate::metrics::ResolverMetrics;
use crate::registry::{ArgumentOverrides, Registry, Strategy};
use crate::types::{Frame, Instance, Key};

/// Resolver на время одного top-level вызова, заимствует состояние контейнера
pub(crate) struct Resolver<'c> {
    introspector: &'c dyn TypeIntrospector,
    registry: &'c RefCell<Registry>,
    stack: &'c RefCell<BuildStack>,
    metrics: &'c RwLock<ResolverMetrics>,
    verbose: bool,
}

impl<'c> Resolver<'c> {
    pub fn new(
        introspector: &'c dyn TypeIntrospector,
        registry: &'c RefCell<Registry>,
        stack: &'c RefCell<BuildStack>,
        metrics: &'c RwLock<ResolverMetrics>,
        verbose: bool,
    ) -> Self {
        Self {
            introspector,
            registry,
            stack,
            metrics,
            verbose,
        }
    }

    /// Resolve one slot: cache first, then the bound strategy.
    pub fn resolve(&self, frame: &Frame) -> IocResult<Instance> {
        let plan = {
            let registry = self.registry.borrow();
            if !registry.contains(frame) {
                return Err(IocError::not_registered(frame));
            }

            if let Some(instance) = registry.cached(frame) {
                self.metrics.write().cache_hits += 1;
                if self.verbose {
                    let depth = self.stack.borrow().depth();
                    debug!(frame = %frame, depth, "✅ served from cache");
                }
                return Ok(instance);
            }

            registry
                .plan(frame)
                .ok_or_else(|| IocError::not_registered(frame))?
        };

        let guard = BuildFrame::enter(self.stack, frame.clone()).map_err(|error| {
            if matches!(error, IocError::DependencyCycle { .. }) {
                self.metrics.write().cycles_detected += 1;
            }
            error
        })?;

        if self.verbose {
            debug!(
                frame = %frame,
                strategy = plan.strategy.kind(),
                depth = guard.depth(),
                "🏭 building"
            );
        }

        let instance = match plan.strategy {
            Strategy::Redirect(target) => self.resolve(&target)?,
            Strategy::Factory(factory) => self.call(&factory, &plan.overrides, &frame.to_string())?,
            Strategy::Class => self.construct(frame, &plan.overrides)?,
            Strategy::Instance => {
                return Err(IocError::make_failed(frame, "bound instance is missing"));
            }
        };
        drop(guard);

        self.metrics.write().constructions += 1;
        Ok(self.registry.borrow_mut().store(frame, instance))
    }

    /// Resolve `callable`'s parameters and invoke it.
    pub fn call(
        &self,
        callable: &Callable,
        overrides: &ArgumentOverrides,
        owner: &str,
    ) -> IocResult<Instance> {
        let arguments = self.resolve_arguments(callable.parameters(), overrides, owner)?;

        callable.invoke(&arguments).map_err(|error| {
            // A body that resolved through the container itself may surface a
            // cycle; keep it recognisable.
            match error.downcast_ref::<IocError>() {
                Some(inner) if inner.is_structural() => inner.clone(),
                _ => IocError::ConstructionFailed {
                    owner: owner.to_string(),
                    reason: format!("{error:#}"),
                },
            }
        })
    }

    fn construct(
        &self,
        frame: &Frame,
        overrides: &ArgumentOverrides,
    ) -> IocResult<Instance> {
        if !self.introspector.type_exists(&frame.type_name) {
            return Err(IocError::make_failed(
                frame,
                "type does not exist and no factory or redirect is bound",
            ));
        }

        let constructor = self
            .introspector
            .constructor(&frame.type_name)
            .ok_or_else(|| {
                IocError::make_failed(frame, format!("{} is not instantiable", frame.type_name))
            })?;

        self.call(&constructor, overrides, &frame.to_string())
    }

    /// Порядок для каждого параметра: override, затем default для параметров
    /// без типа, затем рекурсивное разрешение с default как fallback.
    fn resolve_arguments(
        &self,
        parameters: &[ParamDescriptor],
        overrides: &ArgumentOverrides,
        owner: &str,
    ) -> IocResult<Arguments> {
        let named = overrides.by_name(parameters, owner)?;
        let mut names = Vec::with_capacity(parameters.len());
        let mut values = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            let value = match named.get(parameter.name()) {
                Some(value) => Some(value.clone()),
                None => self.resolve_parameter(parameter, owner)?,
            };
            names.push(parameter.name().to_string());
            values.push(value);
        }

        Ok(Arguments::new(names, values))
    }

    fn resolve_parameter(
        &self,
        parameter: &ParamDescriptor,
        owner: &str,
    ) -> IocResult<Option<Instance>> {
        let Some(declared) = parameter.declared_type() else {
            return parameter
                .default_value()
                .ok_or_else(|| unresolvable(owner, parameter, None));
        };

        match self.resolve(&Frame::new(declared, Key::DEFAULT)) {
            Ok(instance) => Ok(Some(instance)),
            Err(error) if error.is_structural() => Err(error),
            Err(error) => match parameter.default_value() {
                Some(default) => {
                    self.metrics.write().default_fallbacks += 1;
                    debug!(
                        owner,
                        parameter = parameter.name(),
                        cause = %error,
                        "↩️ falling back to declared default"
                    );
                    Ok(default)
                }
                None => Err(unresolvable(owner, parameter, Some(error))),
            },
        }
    }
}

fn unresolvable(owner: &str, parameter: &ParamDescriptor, source: Option<IocError>) -> IocError {
    IocError::UnresolvableParameter {
        owner: owner.to_string(),
        parameter: parameter.name().to_string(),
        source: source.map(Box::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::TypeCatalog;
    use crate::types::TypeName;

    struct Fixture {
        catalog: TypeCatalog,
        registry: RefCell<Registry>,
        stack: RefCell<BuildStack>,
        metrics: RwLock<ResolverMetrics>,
    }

    impl Fixture {
        fn new(catalog: TypeCatalog) -> Self {
            Self {
                catalog,
                registry: RefCell::new(Registry::new()),
                stack: RefCell::new(BuildStack::new(None)),
                metrics: RwLock::new(ResolverMetrics::default()),
            }
        }

        fn register(&self, type_name: &str, strategy: Strategy) {
            self.registry
                .borrow_mut()
                .insert(
                    Frame::new(type_name, Key::DEFAULT),
                    strategy,
                    ArgumentOverrides::new(),
                    None,
                )
                .expect("registration should succeed");
        }

        fn resolver(&self) -> Resolver<'_> {
            Resolver::new(&self.catalog, &self.registry, &self.stack, &self.metrics, true)
        }
    }

    fn catalog() -> TypeCatalog {
        TypeCatalog::builder()
            .nullary_class("Clock", || Ok(Instance::new("Clock", 0_u64)))
            .class_with(
                "Scheduler",
                vec![ParamDescriptor::typed("clock", "Clock")],
                |args| {
                    let clock = args.instance("clock").cloned();
                    Ok(Instance::new("Scheduler", clock.map(|c| c.type_name().clone())))
                },
            )
            .interface("Shape")
            .build()
    }

    #[test]
    fn test_constructor_dependency_is_resolved_and_cached() {
        let fixture = Fixture::new(catalog());
        fixture.register("Clock", Strategy::Class);
        fixture.register("Scheduler", Strategy::Class);

        let resolver = fixture.resolver();
        let scheduler = resolver
            .resolve(&Frame::new("Scheduler", Key::DEFAULT))
            .unwrap();

        let recorded = scheduler.downcast::<Option<TypeName>>().unwrap();
        assert_eq!(*recorded, Some(TypeName::from("Clock")));
        assert!(fixture.stack.borrow().is_empty());
        assert_eq!(fixture.stack.borrow().high_water(), 2);
        assert_eq!(fixture.registry.borrow().cached_count(), 2);
        assert_eq!(fixture.metrics.read().constructions, 2);
    }

    #[test]
    fn test_interface_with_class_strategy_is_make_failed() {
        let fixture = Fixture::new(catalog());
        fixture.register("Shape", Strategy::Class);

        let error = fixture
            .resolver()
            .resolve(&Frame::new("Shape", Key::DEFAULT))
            .unwrap_err();
        assert!(matches!(error, IocError::MakeFailed { .. }));
    }

    #[test]
    fn test_unknown_type_with_class_strategy_is_make_failed() {
        let fixture = Fixture::new(catalog());
        fixture.register("Ghost", Strategy::Class);

        let error = fixture
            .resolver()
            .resolve(&Frame::new("Ghost", Key::DEFAULT))
            .unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn test_instance_strategy_without_value_is_make_failed() {
        let fixture = Fixture::new(catalog());
        fixture.register("Clock", Strategy::Instance);

        let error = fixture
            .resolver()
            .resolve(&Frame::new("Clock", Key::DEFAULT))
            .unwrap_err();
        assert!(matches!(error, IocError::MakeFailed { .. }));
    }

    #[test]
    fn test_body_error_becomes_construction_failed() {
        let fixture = Fixture::new(catalog());
        let failing = Callable::nullary(|| Err(anyhow::anyhow!("disk full")));
        fixture.register("Clock", Strategy::Factory(failing));

        let error = fixture
            .resolver()
            .resolve(&Frame::new("Clock", Key::DEFAULT))
            .unwrap_err();
        match error {
            IocError::ConstructionFailed { owner, reason } => {
                assert_eq!(owner, "Clock[0]");
                assert!(reason.contains("disk full"));
            }
            other => panic!("expected ConstructionFailed, got {other:?}"),
        }
        assert!(!fixture.registry.borrow().has_any_cached(&"Clock".into()));
    }
}
