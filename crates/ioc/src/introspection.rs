//! Type introspection - the container's view of the host's type universe.
//!
//! The resolver never inspects types on its own. Everything it needs to know
//! (does a type exist, is it abstract, does an object satisfy it, how is it
//! constructed) comes through [`TypeIntrospector`]. [`TypeCatalog`] is the
//! shipped implementation: the host declares its classes, interfaces and
//! subtype edges once, up front.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::callable::{Callable, ParamDescriptor};
use crate::types::{Instance, TypeName};

/// Capabilities the container consumes from the host.
#[cfg_attr(test, mockall::automock)]
pub trait TypeIntrospector: Send + Sync {
    /// Whether `name` denotes any known type (concrete, abstract or interface)
    fn type_exists(&self, name: &TypeName) -> bool;

    /// Whether `name` is an interface or an abstract type
    fn is_abstract(&self, name: &TypeName) -> bool;

    fn is_instance_of(&self, instance: &Instance, name: &TypeName) -> bool;

    /// Constructor of an instantiable type. `None` for abstract types,
    /// interfaces and unknown names.
    fn constructor(&self, name: &TypeName) -> Option<Callable>;
}

#[derive(Clone, Debug)]
enum TypeKind {
    Class { constructor: Callable },
    AbstractClass,
    Interface,
}

/// Declared type universe.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<TypeName, TypeKind>,
    supertypes: HashMap<TypeName, Vec<TypeName>>,
}

impl TypeCatalog {
    pub fn builder() -> TypeCatalogBuilder {
        TypeCatalogBuilder::default()
    }

    /// Catalog with no types; every registration against it fails with
    /// `TypeNotFound`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Reflexive, transitive subtype check over the declared `implements` edges.
    pub fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        if sub == sup {
            return true;
        }

        let mut visited: HashSet<&TypeName> = HashSet::new();
        let mut queue: VecDeque<&TypeName> = VecDeque::from([sub]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for parent in self.supertypes.get(current).into_iter().flatten() {
                if parent == sup {
                    return true;
                }
                queue.push_back(parent);
            }
        }

        false
    }

    pub fn into_shared(self) -> Arc<dyn TypeIntrospector> {
        Arc::new(self)
    }
}

impl TypeIntrospector for TypeCatalog {
    fn type_exists(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    fn is_abstract(&self, name: &TypeName) -> bool {
        matches!(
            self.types.get(name),
            Some(TypeKind::AbstractClass | TypeKind::Interface)
        )
    }

    fn is_instance_of(&self, instance: &Instance, name: &TypeName) -> bool {
        self.is_subtype(instance.type_name(), name)
    }

    fn constructor(&self, name: &TypeName) -> Option<Callable> {
        match self.types.get(name) {
            Some(TypeKind::Class { constructor }) => Some(constructor.clone()),
            _ => None,
        }
    }
}

/// Builder for [`TypeCatalog`]. Later declarations of the same name replace
/// earlier ones.
#[derive(Default)]
pub struct TypeCatalogBuilder {
    types: IndexMap<TypeName, TypeKind>,
    supertypes: HashMap<TypeName, Vec<TypeName>>,
}

impl TypeCatalogBuilder {
    /// Concrete type built by `constructor`.
    pub fn class(mut self, name: impl Into<TypeName>, constructor: Callable) -> Self {
        self.types
            .insert(name.into(), TypeKind::Class { constructor });
        self
    }

    /// Concrete type with a declared parameter list; shorthand for
    /// `class(name, Callable::new(parameters, body))`.
    pub fn class_with<F>(
        self,
        name: impl Into<TypeName>,
        parameters: Vec<ParamDescriptor>,
        body: F,
    ) -> Self
    where
        F: Fn(&crate::callable::Arguments) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.class(name, Callable::new(parameters, body))
    }

    /// Concrete type that takes no constructor arguments.
    pub fn nullary_class<F>(self, name: impl Into<TypeName>, build: F) -> Self
    where
        F: Fn() -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.class(name, Callable::nullary(build))
    }

    pub fn abstract_class(mut self, name: impl Into<TypeName>) -> Self {
        self.types.insert(name.into(), TypeKind::AbstractClass);
        self
    }

    pub fn interface(mut self, name: impl Into<TypeName>) -> Self {
        self.types.insert(name.into(), TypeKind::Interface);
        self
    }

    /// Declare `sub` as implementing or extending `sup`.
    pub fn implements(mut self, sub: impl Into<TypeName>, sup: impl Into<TypeName>) -> Self {
        let parents = self.supertypes.entry(sub.into()).or_default();
        let sup = sup.into();
        if !parents.contains(&sup) {
            parents.push(sup);
        }
        self
    }

    pub fn build(self) -> TypeCatalog {
        debug!(
            "📚 Type catalog built: {} types, {} subtype edges",
            self.types.len(),
            self.supertypes.values().map(Vec::len).sum::<usize>()
        );

        TypeCatalog {
            types: self.types.into_iter().collect(),
            supertypes: self.supertypes,
        }
    }
}
