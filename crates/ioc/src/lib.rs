//! # IOC - inversion-of-control container
//!
//! Maps `(type, key)` pairs to construction strategies and builds singletons
//! on demand, wiring constructor and factory parameters recursively.
//!
//! ## Quick start
//!
//! ```
//! use ioc::{ArgumentOverrides, Container, Instance, Key, ParamDescriptor, TypeCatalog};
//!
//! let catalog = TypeCatalog::builder()
//!     .nullary_class("Clock", || Ok(Instance::new("Clock", 42_u64)))
//!     .class_with(
//!         "Scheduler",
//!         vec![ParamDescriptor::typed("clock", "Clock")],
//!         |args| {
//!             let ticks = args.get::<u64>("clock")?;
//!             Ok(Instance::new("Scheduler", *ticks + 1))
//!         },
//!     )
//!     .build();
//!
//! let container = Container::from_catalog(catalog);
//! container.register_class("Clock", ArgumentOverrides::new(), Key::DEFAULT)?;
//! container.register_class("Scheduler", ArgumentOverrides::new(), Key::DEFAULT)?;
//!
//! let scheduler = container.get_as::<u64>("Scheduler", Key::DEFAULT)?;
//! assert_eq!(*scheduler, 43);
//! # Ok::<(), ioc::IocError>(())
//! ```

pub mod build_stack;
pub mod callable;
pub mod container;
pub mod container_config;
pub mod errors;
pub mod global;
pub mod introspection;
pub mod logging;
pub mod metrics;
pub mod registry;
mod resolver;
pub mod types;

pub use callable::{Arguments, Callable, ParamDefault, ParamDescriptor};
pub use container::Container;
pub use container_config::ContainerConfig;
pub use errors::{IocError, IocResult};
pub use introspection::{TypeCatalog, TypeCatalogBuilder, TypeIntrospector};
pub use logging::{init_logging, LoggingConfig};
pub use metrics::{ContainerStats, ResolverMetrics};
pub use registry::{ArgumentOverrides, ParamRef, Strategy};
pub use types::{Frame, Instance, Key, TypeName};
