//! Declared parameter lists and the callables that consume them.
//!
//! Constructors and factories declare their dependencies when they are
//! registered. The resolver walks these declarations instead of discovering
//! parameters at runtime, then hands the resolved values to the body as
//! [`Arguments`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::IocError;
use crate::types::{Instance, TypeName};

/// Default of an optional parameter.
#[derive(Clone, Debug)]
pub enum ParamDefault {
    Value(Instance),
    /// The parameter may be absent; the body sees `None`
    Null,
}

/// One declared parameter of a constructor or factory.
#[derive(Clone, Debug)]
pub struct ParamDescriptor {
    name: String,
    declared_type: Option<TypeName>,
    default: Option<ParamDefault>,
}

impl ParamDescriptor {
    /// Parameter whose value the container resolves from `declared_type`.
    pub fn typed(name: impl Into<String>, declared_type: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(declared_type.into()),
            default: None,
        }
    }

    /// Parameter without a class/interface type; only overrides and defaults apply.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            default: None,
        }
    }

    pub fn with_default(mut self, value: Instance) -> Self {
        self.default = Some(ParamDefault::Value(value));
        self
    }

    pub fn or_null(mut self) -> Self {
        self.default = Some(ParamDefault::Null);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&TypeName> {
        self.declared_type.as_ref()
    }

    pub fn default(&self) -> Option<&ParamDefault> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<Option<Instance>> {
        self.default.as_ref().map(|default| match default {
            ParamDefault::Value(value) => Some(value.clone()),
            ParamDefault::Null => None,
        })
    }
}

/// Body of a constructor or factory.
pub type CallableBody = dyn Fn(&Arguments) -> anyhow::Result<Instance> + Send + Sync;

/// A declared parameter list plus the function consuming the resolved values.
#[derive(Clone)]
pub struct Callable {
    parameters: Arc<[ParamDescriptor]>,
    body: Arc<CallableBody>,
}

impl Callable {
    pub fn new<F>(parameters: Vec<ParamDescriptor>, body: F) -> Self
    where
        F: Fn(&Arguments) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into(),
            body: Arc::new(body),
        }
    }

    /// Callable without parameters.
    pub fn nullary<F>(body: F) -> Self
    where
        F: Fn() -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        Self::new(Vec::new(), move |_| body())
    }

    pub fn parameters(&self) -> &[ParamDescriptor] {
        &self.parameters
    }

    pub fn invoke(&self, arguments: &Arguments) -> anyhow::Result<Instance> {
        (self.body)(arguments)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field(
                "parameters",
                &self.parameters.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Resolved values for a parameter list, in declaration order.
///
/// A slot is `None` only when the parameter defaulted to null.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    names: Vec<String>,
    values: Vec<Option<Instance>>,
}

impl Arguments {
    pub(crate) fn new(names: Vec<String>, values: Vec<Option<Instance>>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw slot by parameter name; `None` for unknown names and null defaults.
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.position(name)
            .and_then(|index| self.values[index].as_ref())
    }

    pub fn instance_at(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Typed access by parameter name.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, IocError> {
        self.optional::<T>(name)?
            .ok_or_else(|| IocError::downcast::<T>(format!("null argument '{name}'")))
    }

    /// Typed access for parameters that may have defaulted to null.
    pub fn optional<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, IocError> {
        let index = self
            .position(name)
            .ok_or_else(|| IocError::downcast::<T>(format!("unknown argument '{name}'")))?;
        Self::typed(&self.values[index], name)
    }

    /// Typed positional access.
    pub fn at<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, IocError> {
        let slot = self
            .values
            .get(index)
            .ok_or_else(|| IocError::downcast::<T>(format!("missing argument #{index}")))?;
        Self::typed(slot, &format!("#{index}"))?
            .ok_or_else(|| IocError::downcast::<T>(format!("null argument #{index}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Instance>)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_ref))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    fn typed<T: Any + Send + Sync>(
        slot: &Option<Instance>,
        label: &str,
    ) -> Result<Option<Arc<T>>, IocError> {
        match slot {
            None => Ok(None),
            Some(instance) => instance.downcast::<T>().map(Some).ok_or_else(|| {
                IocError::downcast::<T>(format!(
                    "argument '{label}' ({})",
                    instance.type_name()
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments() -> Arguments {
        Arguments::new(
            vec!["port".into(), "host".into(), "logger".into()],
            vec![
                Some(Instance::scalar(8080_u16)),
                Some(Instance::scalar("localhost".to_string())),
                None,
            ],
        )
    }

    #[test]
    fn test_named_and_positional_access() {
        let args = arguments();
        assert_eq!(*args.get::<u16>("port").unwrap(), 8080);
        assert_eq!(args.at::<String>(1).unwrap().as_str(), "localhost");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_iteration_and_raw_positional_access() {
        let args = arguments();
        let names: Vec<_> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["port", "host", "logger"]);
        assert!(args.iter().last().is_some_and(|(_, value)| value.is_none()));

        assert!(args.instance_at(0).is_some_and(|port| port.is::<u16>()));
        assert!(args.instance_at(2).is_none());
        assert!(args.instance_at(7).is_none());
    }

    #[test]
    fn test_null_slot_is_optional_only() {
        let args = arguments();
        assert!(args.optional::<String>("logger").unwrap().is_none());
        assert!(matches!(
            args.get::<String>("logger"),
            Err(IocError::Downcast { .. })
        ));
        assert!(args.instance("logger").is_none());
    }

    #[test]
    fn test_wrong_type_is_downcast_error() {
        let args = arguments();
        let error = args.get::<u64>("port").unwrap_err();
        assert!(error.to_string().contains("argument 'port'"));
    }

    #[test]
    fn test_callable_invokes_body_with_arguments() {
        let callable = Callable::new(vec![ParamDescriptor::scalar("port")], |args| {
            let port = args.get::<u16>("port")?;
            Ok(Instance::scalar(format!("listening on {port}")))
        });

        let args = Arguments::new(vec!["port".into()], vec![Some(Instance::scalar(80_u16))]);
        let result = callable.invoke(&args).unwrap();
        assert_eq!(
            result.downcast::<String>().unwrap().as_str(),
            "listening on 80"
        );
        assert_eq!(callable.parameters().len(), 1);
    }

    #[test]
    fn test_descriptor_defaults() {
        let with_value = ParamDescriptor::scalar("retries").with_default(Instance::scalar(3_u8));
        let nullable = ParamDescriptor::typed("cache", "Cache").or_null();
        let required = ParamDescriptor::typed("db", "Db");

        assert!(matches!(with_value.default_value(), Some(Some(_))));
        assert!(matches!(nullable.default_value(), Some(None)));
        assert!(required.default_value().is_none());
        assert!(!required.has_default());
        assert_eq!(nullable.declared_type(), Some(&TypeName::from("Cache")));
    }
}
