//! 🚫 IOC ERROR HANDLING
//!
//! Единый error enum для всех ошибок регистрации и разрешения зависимостей.
//! Каждый вариант содержит `(type, key)`, к которому относится ошибка, поэтому
//! вызывающему коду не нужно парсить сообщения.
//!
//! # ERROR CLASSES
//!
//! - ошибки регистрации: [`IocError::TypeNotFound`],
//!   [`IocError::InterfaceNotAbstract`], [`IocError::AlreadyRegistered`],
//!   [`IocError::NotTypeOfInstance`]
//! - ошибки resolution: [`IocError::NotRegistered`],
//!   [`IocError::UnresolvableParameter`], [`IocError::MakeFailed`],
//!   [`IocError::ConstructionFailed`], [`IocError::InvalidOverride`],
//!   [`IocError::Downcast`]
//! - структурные ошибки: [`IocError::DependencyCycle`],
//!   [`IocError::DepthLimitExceeded`]. Это баги wiring, fallback на default
//!   значение параметра их никогда не скрывает.
//!
//! `IocError` реализует `std::error::Error`, так что тела конструкторов с
//! `anyhow::Result` используют `?` напрямую.

use thiserror::Error;

use crate::types::{Frame, Key, TypeName};

#[derive(Debug, Error, Clone)]
pub enum IocError {
    /// Registering a concrete type the introspector does not know
    #[error("Type {type_name} does not exist (key {key})")]
    TypeNotFound { type_name: TypeName, key: Key },

    /// Interface binding for a type that is neither abstract nor an interface
    #[error("Type {type_name} is not an interface or abstract type (key {key})")]
    InterfaceNotAbstract { type_name: TypeName, key: Key },

    #[error("{type_name}[{key}] is already registered")]
    AlreadyRegistered { type_name: TypeName, key: Key },

    #[error("Instance of {actual} does not satisfy {type_name}[{key}]")]
    NotTypeOfInstance {
        type_name: TypeName,
        key: Key,
        actual: TypeName,
    },

    #[error("{type_name}[{key}] is not registered")]
    NotRegistered { type_name: TypeName, key: Key },

    /// A frame reappeared in its own construction chain
    #[error("Dependency cycle detected: {}", format_chain(chain))]
    DependencyCycle { chain: Vec<Frame> },

    #[error("Resolution depth limit {limit} exceeded: {}", format_chain(chain))]
    DepthLimitExceeded { limit: usize, chain: Vec<Frame> },

    #[error("Cannot resolve parameter '{parameter}' of {owner}{}", format_cause(source))]
    UnresolvableParameter {
        owner: String,
        parameter: String,
        source: Option<Box<IocError>>,
    },

    /// No viable construction strategy for the slot
    #[error("Cannot make {type_name}[{key}]: {reason}")]
    MakeFailed {
        type_name: TypeName,
        key: Key,
        reason: String,
    },

    /// The constructor or factory body itself returned an error
    #[error("Construction of {owner} failed: {reason}")]
    ConstructionFailed { owner: String, reason: String },

    #[error("Positional override #{index} of {owner} is out of range ({arity} parameters)")]
    InvalidOverride {
        owner: String,
        index: usize,
        arity: usize,
    },

    #[error("{subject} is not a {expected}")]
    Downcast {
        subject: String,
        expected: &'static str,
    },
}

impl IocError {
    pub fn make_failed(frame: &Frame, reason: impl Into<String>) -> Self {
        IocError::MakeFailed {
            type_name: frame.type_name.clone(),
            key: frame.key.clone(),
            reason: reason.into(),
        }
    }

    pub fn not_registered(frame: &Frame) -> Self {
        IocError::NotRegistered {
            type_name: frame.type_name.clone(),
            key: frame.key.clone(),
        }
    }

    pub fn already_registered(frame: &Frame) -> Self {
        IocError::AlreadyRegistered {
            type_name: frame.type_name.clone(),
            key: frame.key.clone(),
        }
    }

    pub fn downcast<T: ?Sized>(subject: impl Into<String>) -> Self {
        IocError::Downcast {
            subject: subject.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Cycle and depth errors describe broken wiring rather than a missing
    /// leaf, so they bypass the parameter default fallback.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            IocError::DependencyCycle { .. } | IocError::DepthLimitExceeded { .. }
        )
    }

    /// Innermost error of an `UnresolvableParameter` chain.
    pub fn root_cause(&self) -> &IocError {
        match self {
            IocError::UnresolvableParameter {
                source: Some(inner),
                ..
            } => inner.root_cause(),
            other => other,
        }
    }

    /// Stable machine-readable code, for log fields and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            IocError::TypeNotFound { .. } => "IOC_TYPE_NOT_FOUND",
            IocError::InterfaceNotAbstract { .. } => "IOC_INTERFACE_NOT_ABSTRACT",
            IocError::AlreadyRegistered { .. } => "IOC_ALREADY_REGISTERED",
            IocError::NotTypeOfInstance { .. } => "IOC_NOT_TYPE_OF_INSTANCE",
            IocError::NotRegistered { .. } => "IOC_NOT_REGISTERED",
            IocError::DependencyCycle { .. } => "IOC_DEPENDENCY_CYCLE",
            IocError::DepthLimitExceeded { .. } => "IOC_DEPTH_LIMIT_EXCEEDED",
            IocError::UnresolvableParameter { .. } => "IOC_UNRESOLVABLE_PARAMETER",
            IocError::MakeFailed { .. } => "IOC_MAKE_FAILED",
            IocError::ConstructionFailed { .. } => "IOC_CONSTRUCTION_FAILED",
            IocError::InvalidOverride { .. } => "IOC_INVALID_OVERRIDE",
            IocError::Downcast { .. } => "IOC_DOWNCAST",
        }
    }
}

fn format_chain(chain: &[Frame]) -> String {
    chain
        .iter()
        .map(Frame::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_cause(source: &Option<Box<IocError>>) -> String {
    match source {
        Some(inner) => format!(": {inner}"),
        None => String::new(),
    }
}

pub type IocResult<T> = Result<T, IocError>;
