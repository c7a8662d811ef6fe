//! The default container is process-wide, so this binary keeps every check
//! in one test to avoid ordering between parallel tests.

mod common;

use std::sync::Arc;

use ioc::{global, ArgumentOverrides, ContainerConfig, IocError, Key, TypeCatalog};

#[test]
fn test_default_container_lifecycle() {
    global::configure(
        common::catalog().into_shared(),
        ContainerConfig::minimal().with_name("global"),
    );
    assert!(!global::is_initialized());

    let first = global::container();
    assert_eq!(first.name(), "global");
    first
        .register_class("FileLogger", ArgumentOverrides::new(), Key::DEFAULT)
        .unwrap();
    let logger = global::container().get("FileLogger").unwrap();

    global::clear();
    assert!(!global::is_initialized());
    // Old handles see an empty container
    assert!(!first.is_registered("FileLogger", Key::DEFAULT));

    let second = global::container();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.name(), "global");
    assert!(!second.has_any_registration("FileLogger"));

    // Same introspector survives the clear
    second
        .register_class("FileLogger", ArgumentOverrides::new(), Key::DEFAULT)
        .unwrap();
    let fresh = second.get("FileLogger").unwrap();
    assert!(!fresh.ptr_eq(&logger));

    // A new introspector applies to the next container created
    global::set_introspector(TypeCatalog::empty().into_shared());
    assert!(second.is_registered("FileLogger", Key::DEFAULT));
    global::clear();
    let third = global::container();
    assert_eq!(third.name(), "global");
    assert!(matches!(
        third.register_class("FileLogger", ArgumentOverrides::new(), Key::DEFAULT),
        Err(IocError::TypeNotFound { .. })
    ));

    global::clear();
}
