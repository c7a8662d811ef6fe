mod common;

use std::env;
use std::io::Write;

use ioc::{ArgumentOverrides, Container, ContainerConfig, IocError, Key};
use tempfile::NamedTempFile;

fn temp_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_toml_file() {
    let file = temp_config(
        ".toml",
        r#"
            name = "orders"
            max_resolution_depth = 2
            verbose_logging = true
        "#,
    );

    let config = ContainerConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.name, "orders");
    assert_eq!(config.max_resolution_depth, Some(2));
    assert!(config.verbose_logging);
}

#[test]
fn test_load_json_file() {
    let file = temp_config(".json", r#"{ "name": "billing" }"#);

    let config = ContainerConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.name, "billing");
    assert_eq!(
        config.max_resolution_depth,
        ContainerConfig::default().max_resolution_depth
    );
}

#[test]
fn test_unsupported_extension_and_missing_file() {
    let file = temp_config(".yaml", "name: nope");
    assert!(ContainerConfig::load_from_file(file.path()).is_err());

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let error = ContainerConfig::load_from_file(&missing).unwrap_err();
    assert!(format!("{error:#}").contains("absent.toml"));
}

#[test]
fn test_loaded_depth_limit_applies_to_resolution() {
    let file = temp_config(".toml", "max_resolution_depth = 2");
    let config = ContainerConfig::load_from_file(file.path()).unwrap();

    let container = Container::with_config(common::catalog().into_shared(), config);
    for type_name in ["FileLogger", "Database", "Mailer"] {
        container
            .register_class(type_name, ArgumentOverrides::new(), Key::DEFAULT)
            .unwrap();
    }
    container
        .register_interface_by_class("Logger", "FileLogger", Key::DEFAULT, Key::DEFAULT)
        .unwrap();

    // Mailer -> Database -> Logger -> FileLogger is four frames deep
    let error = container.get("Mailer").unwrap_err();
    assert!(matches!(error, IocError::DepthLimitExceeded { limit: 2, .. }));
    assert!(container.get("FileLogger").is_ok());
}

#[test]
fn test_environment_variables_override_preset() {
    env::set_var("IOC_CFG_TEST_NAME", "from-env");
    env::set_var("IOC_CFG_TEST_MAX_RESOLUTION_DEPTH", "7");
    env::set_var("IOC_CFG_TEST_VERBOSE_LOGGING", "off");

    let mut config = ContainerConfig::development();
    let applied = config.apply_environment_variables("IOC_CFG_TEST");

    env::remove_var("IOC_CFG_TEST_NAME");
    env::remove_var("IOC_CFG_TEST_MAX_RESOLUTION_DEPTH");
    env::remove_var("IOC_CFG_TEST_VERBOSE_LOGGING");

    applied.unwrap();
    assert_eq!(config.name, "from-env");
    assert_eq!(config.max_resolution_depth, Some(7));
    assert!(!config.verbose_logging);
}

// Every `load` call reads the real `IOC_*` variables, so the checks share one
// test.
#[test]
fn test_load_layers_file_preset_and_environment() {
    let config = ContainerConfig::load(Some("minimal"), None).unwrap();
    assert_eq!(config.name, "minimal");
    assert_eq!(config.max_resolution_depth, Some(16));

    let file = temp_config(".toml", "name = \"from-file\"");
    let config = ContainerConfig::load(Some("minimal"), Some(file.path())).unwrap();
    assert_eq!(config.name, "from-file");
    assert_eq!(config.max_resolution_depth, None);

    assert!(ContainerConfig::load(Some("turbo"), None).is_err());

    env::set_var("IOC_MAX_RESOLUTION_DEPTH", "0");
    let rejected = ContainerConfig::load(None, None);
    env::set_var("IOC_MAX_RESOLUTION_DEPTH", "12");
    let overridden = ContainerConfig::load(None, Some(file.path()));
    env::remove_var("IOC_MAX_RESOLUTION_DEPTH");

    assert!(rejected.is_err());
    let overridden = overridden.unwrap();
    assert_eq!(overridden.name, "from-file");
    assert_eq!(overridden.max_resolution_depth, Some(12));
}
