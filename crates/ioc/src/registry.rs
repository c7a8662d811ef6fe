//! Registry - состояние регистраций контейнера.
//!
//! Хранит каждую `(type, key)` регистрацию: стратегию создания, argument
//! overrides от вызывающего кода и singleton cache slot. Registry никогда не
//! запускает user code. Resolver читает из него планы и записывает обратно
//! готовые instances.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::callable::ParamDescriptor;
use crate::errors::IocError;
use crate::types::{Frame, Instance, Key, TypeName};

/// Reference to a declared parameter, by name or by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamRef {
    Name(String),
    Index(usize),
}

impl From<&str> for ParamRef {
    fn from(value: &str) -> Self {
        ParamRef::Name(value.to_string())
    }
}

impl From<String> for ParamRef {
    fn from(value: String) -> Self {
        ParamRef::Name(value)
    }
}

impl From<usize> for ParamRef {
    fn from(value: usize) -> Self {
        ParamRef::Index(value)
    }
}

/// Caller-supplied argument values that win over automatic resolution.
#[derive(Clone, Debug, Default)]
pub struct ArgumentOverrides {
    entries: Vec<(ParamRef, Instance)>,
}

impl ArgumentOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override. Later entries for the same parameter win.
    pub fn with(mut self, param: impl Into<ParamRef>, value: Instance) -> Self {
        self.entries.push((param.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remap positional entries to parameter names using the declared order.
    ///
    /// Names that match no declared parameter are kept and simply never
    /// consulted; a position past the end of the list is an error.
    pub fn by_name(
        &self,
        parameters: &[ParamDescriptor],
        owner: &str,
    ) -> Result<HashMap<String, Instance>, IocError> {
        let mut named = HashMap::with_capacity(self.entries.len());

        for (param, value) in &self.entries {
            let name = match param {
                ParamRef::Name(name) => name.clone(),
                ParamRef::Index(index) => parameters
                    .get(*index)
                    .map(|descriptor| descriptor.name().to_string())
                    .ok_or_else(|| IocError::InvalidOverride {
                        owner: owner.to_string(),
                        index: *index,
                        arity: parameters.len(),
                    })?,
            };
            named.insert(name, value.clone());
        }

        Ok(named)
    }
}

/// How a registration produces its instance.
#[derive(Clone, Debug)]
pub enum Strategy {
    /// The type's own constructor, as declared to the introspector
    Class,
    /// A stored callable
    Factory(crate::callable::Callable),
    /// A pre-built object bound at registration time
    Instance,
    /// Interface binding resolved through another registration
    Redirect(Frame),
}

impl Strategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Class => "class",
            Strategy::Factory(_) => "factory",
            Strategy::Instance => "instance",
            Strategy::Redirect(_) => "redirect",
        }
    }
}

#[derive(Debug)]
pub(crate) struct Registration {
    pub strategy: Strategy,
    pub overrides: ArgumentOverrides,
    /// Filled once the slot has been built; `Some` means "resolved"
    pub cached: Option<Instance>,
}

/// What the resolver needs to build a slot, copied out of the registry so no
/// borrow is held while user code runs.
#[derive(Clone, Debug)]
pub(crate) struct BuildPlan {
    pub strategy: Strategy,
    pub overrides: ArgumentOverrides,
}

/// Registration state keyed by type, then key, both in registration order.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: IndexMap<TypeName, IndexMap<Key, Registration>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, frame: &Frame) -> bool {
        self.get(frame).is_some()
    }

    pub fn has_any(&self, type_name: &TypeName) -> bool {
        self.entries
            .get(type_name)
            .is_some_and(|slots| !slots.is_empty())
    }

    pub fn has_any_cached(&self, type_name: &TypeName) -> bool {
        self.entries
            .get(type_name)
            .is_some_and(|slots| slots.values().any(|slot| slot.cached.is_some()))
    }

    /// Insert a new registration; the slot must be free.
    pub fn insert(
        &mut self,
        frame: Frame,
        strategy: Strategy,
        overrides: ArgumentOverrides,
        cached: Option<Instance>,
    ) -> Result<(), IocError> {
        if self.contains(&frame) {
            return Err(IocError::already_registered(&frame));
        }

        self.entries.entry(frame.type_name).or_default().insert(
            frame.key,
            Registration {
                strategy,
                overrides,
                cached,
            },
        );
        Ok(())
    }

    pub fn cached(&self, frame: &Frame) -> Option<Instance> {
        self.get(frame).and_then(|slot| slot.cached.clone())
    }

    pub fn plan(&self, frame: &Frame) -> Option<BuildPlan> {
        self.get(frame).map(|slot| BuildPlan {
            strategy: slot.strategy.clone(),
            overrides: slot.overrides.clone(),
        })
    }

    /// Store a built instance. Returns the instance that ends up cached: an
    /// earlier one wins if the slot was filled in the meantime.
    pub fn store(&mut self, frame: &Frame, instance: Instance) -> Instance {
        match self
            .entries
            .get_mut(&frame.type_name)
            .and_then(|slots| slots.get_mut(&frame.key))
        {
            Some(slot) => slot.cached.get_or_insert(instance).clone(),
            // Cleared mid-resolution; hand the instance out uncached
            None => instance,
        }
    }

    pub fn keys(&self, type_name: &TypeName) -> Vec<Key> {
        self.entries
            .get(type_name)
            .map(|slots| slots.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn cached_instances(&self, type_name: &TypeName) -> Vec<Instance> {
        self.entries
            .get(type_name)
            .map(|slots| {
                slots
                    .values()
                    .filter_map(|slot| slot.cached.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn strategy_kind(&self, frame: &Frame) -> Option<&'static str> {
        self.get(frame).map(|slot| slot.strategy.kind())
    }

    pub fn registration_count(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn cached_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(IndexMap::values)
            .filter(|slot| slot.cached.is_some())
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn get(&self, frame: &Frame) -> Option<&Registration> {
        self.entries
            .get(&frame.type_name)
            .and_then(|slots| slots.get(&frame.key))
    }
}
