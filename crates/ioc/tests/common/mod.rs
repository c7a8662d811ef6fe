//! Shared type universe for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ioc::{Instance, ParamDescriptor, TypeCatalog, TypeCatalogBuilder};

#[derive(Debug)]
pub struct FileLogger {
    pub path: String,
}

#[derive(Debug)]
pub struct ConsoleLogger;

#[derive(Debug)]
pub struct Database {
    pub dsn: String,
    pub logger: Instance,
}

#[derive(Debug)]
pub struct Mailer {
    pub database: Instance,
    pub cache: Option<Instance>,
    pub retries: u32,
}

/// Declarations shared by most tests:
///
/// - `Logger` interface, implemented by `FileLogger` and `ConsoleLogger`
/// - `Cache` interface with no implementation
/// - `Storage` abstract class
/// - `Database(logger: Logger, dsn = "sqlite::memory:")`
/// - `Mailer(database: Database, cache: Cache = null, retries = 3)`
pub fn builder() -> TypeCatalogBuilder {
    TypeCatalog::builder()
        .interface("Logger")
        .interface("Cache")
        .abstract_class("Storage")
        .nullary_class("FileLogger", || {
            Ok(Instance::new(
                "FileLogger",
                FileLogger {
                    path: "/var/log/app.log".into(),
                },
            ))
        })
        .nullary_class("ConsoleLogger", || Ok(Instance::new("ConsoleLogger", ConsoleLogger)))
        .implements("FileLogger", "Logger")
        .implements("ConsoleLogger", "Logger")
        .class_with(
            "Database",
            vec![
                ParamDescriptor::typed("logger", "Logger"),
                ParamDescriptor::scalar("dsn")
                    .with_default(Instance::scalar("sqlite::memory:".to_string())),
            ],
            |args| {
                let logger = args
                    .instance("logger")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("logger missing"))?;
                let dsn = args.get::<String>("dsn")?;
                Ok(Instance::new(
                    "Database",
                    Database {
                        dsn: dsn.as_ref().clone(),
                        logger,
                    },
                ))
            },
        )
        .class_with(
            "Mailer",
            vec![
                ParamDescriptor::typed("database", "Database"),
                ParamDescriptor::typed("cache", "Cache").or_null(),
                ParamDescriptor::scalar("retries").with_default(Instance::scalar(3_u32)),
            ],
            |args| {
                let database = args
                    .instance("database")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("database missing"))?;
                Ok(Instance::new(
                    "Mailer",
                    Mailer {
                        database,
                        cache: args.instance("cache").cloned(),
                        retries: *args.get::<u32>("retries")?,
                    },
                ))
            },
        )
}

pub fn catalog() -> TypeCatalog {
    builder().build()
}

/// Nullary class `name` whose constructor bumps `counter` on every call.
pub fn counting(builder: TypeCatalogBuilder, name: &'static str, counter: Arc<AtomicUsize>) -> TypeCatalogBuilder {
    builder.nullary_class(name, move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Instance::new(name, n))
    })
}
