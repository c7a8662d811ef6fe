//! Identity types of the container: type names, multiton keys, frames and
//! the type-erased instances handed out to callers.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Normalized identifier of a class, abstract type or interface.
///
/// Surrounding whitespace, `\` namespace decoration and a leading `::` are
/// stripped, so `"\\App\\Circle"` and `"App\\Circle\\"` name the same type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(Self::normalize(raw.as_ref())))
    }

    /// Name of a Rust type as reported by `std::any::type_name`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn normalize(raw: &str) -> &str {
        let trimmed = raw.trim().trim_matches('\\');
        trimmed.strip_prefix("::").unwrap_or(trimmed)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&String> for TypeName {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl From<&TypeName> for TypeName {
    fn from(value: &TypeName) -> Self {
        value.clone()
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({:?})", &*self.0)
    }
}

/// Multiton slot of a registration. Empty or absent keys collapse into
/// [`Key::DEFAULT`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
    pub const DEFAULT: Key = Key(Cow::Borrowed("0"));

    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self::DEFAULT
        } else {
            Self(Cow::Owned(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&Key> for Key {
    fn from(value: &Key) -> Self {
        value.clone()
    }
}

impl<T: Into<Key>> From<Option<T>> for Key {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

/// A `(type, key)` address: one registration slot, one build-stack entry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    pub type_name: TypeName,
    pub key: Key,
}

impl Frame {
    pub fn new(type_name: impl Into<TypeName>, key: impl Into<Key>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.type_name, self.key)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({self})")
    }
}

/// Shared object produced by the container.
///
/// Clones share identity. The tag records the concrete type the object was
/// built as; the introspector uses it for instance-of checks.
#[derive(Clone)]
pub struct Instance {
    type_name: TypeName,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<TypeName>, value: T) -> Self {
        Self::from_arc(type_name, Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(type_name: impl Into<TypeName>, value: Arc<T>) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    /// Plain value (number, string, config struct) tagged with its Rust type name.
    pub fn scalar<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(TypeName::of::<T>(), value)
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Identity comparison; the tag is ignored.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("addr", &Arc::as_ptr(&self.value).cast::<()>())
            .finish()
    }
}
