//! Logical type registry and scalar type converters
//!
//! A logical type is a named, bidirectional converter between application
//! values and the representation a backend stores. Types are registered by
//! name in a [`TypeRegistry`] exactly once and shared by every caller.

use super::driver::BindTag;
use super::error::{Error, Result};
use super::platform::Platform;
use super::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The coarse category a backend needs to know when accepting a bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Bind as text (the default)
    Text,
    /// Bind as an integer
    Integer,
    /// Bind as a boolean
    Boolean,
    /// Bind as binary data
    Binary,
    /// Bind as an SQL NULL
    Null,
}

impl BindingKind {
    /// Resolve the binding kind through the fixed type-kind map to the
    /// tag the native layer understands.
    ///
    /// Mirrors the classic driver mapping: text, null and binary bind as
    /// strings; integers and booleans bind as integers.
    pub fn bind_tag(self) -> BindTag {
        match self {
            BindingKind::Text | BindingKind::Null | BindingKind::Binary => BindTag::Text,
            BindingKind::Integer | BindingKind::Boolean => BindTag::Int,
        }
    }

    /// Canonical name of this binding kind
    pub fn as_str(self) -> &'static str {
        match self {
            BindingKind::Text => "string",
            BindingKind::Integer => "integer",
            BindingKind::Boolean => "boolean",
            BindingKind::Binary => "binary",
            BindingKind::Null => "null",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BindingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "string" | "str" | "text" => Ok(BindingKind::Text),
            "integer" | "int" => Ok(BindingKind::Integer),
            "boolean" | "bool" => Ok(BindingKind::Boolean),
            "binary" | "blob" | "lob" => Ok(BindingKind::Binary),
            "null" => Ok(BindingKind::Null),
            _ => Err(Error::unknown_binding_type(s)),
        }
    }
}

/// A named converter between domain values and backend representations
///
/// Implementations are stateless besides configuration and are shared behind
/// an `Arc` by all callers of a registry.
pub trait LogicalType: Send + Sync + std::fmt::Debug {
    /// The unique registry name of this type
    fn name(&self) -> &str;

    /// The binding category the backend should use for converted values
    fn binding_kind(&self) -> BindingKind {
        BindingKind::Text
    }

    /// Convert a domain value to the backend representation
    fn to_database_value(&self, value: &Value, platform: &Platform) -> Result<Value>;

    /// Convert a backend value to the domain representation
    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value>;
}

/// Registry mapping logical type name to a shared type instance
///
/// Built once at startup and passed by reference to all consumers; there is
/// no process-global instance. Reads are safe from multiple threads once
/// registration is complete. Concurrent registration of the same name is a
/// startup-ordering bug this design does not resolve: whichever call loses
/// the race gets [`Error::DuplicateType`].
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<dyn LogicalType>>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-loaded with the built-in scalar types
    pub fn with_builtins() -> Result<Self> {
        use super::temporal::{DateTimeType, DateType, TimeType};

        let registry = Self::new();
        registry.register(Arc::new(StringType))?;
        registry.register(Arc::new(IntegerType))?;
        registry.register(Arc::new(BooleanType))?;
        registry.register(Arc::new(FloatType))?;
        registry.register(Arc::new(BinaryType))?;
        registry.register(Arc::new(TimeType))?;
        registry.register(Arc::new(DateType))?;
        registry.register(Arc::new(DateTimeType))?;
        Ok(registry)
    }

    /// Register a type under its own name
    ///
    /// Fails with [`Error::DuplicateType`] if the name is already present;
    /// registration is never replaced silently.
    pub fn register(&self, logical_type: Arc<dyn LogicalType>) -> Result<()> {
        let name = logical_type.name().to_string();
        let mut types = self.types.write();
        if types.contains_key(&name) {
            return Err(Error::duplicate_type(name));
        }
        types.insert(name, logical_type);
        Ok(())
    }

    /// Look a type up by name
    ///
    /// Fails with [`Error::UnknownType`] if the name was never registered.
    pub fn get(&self, name: &str) -> Result<Arc<dyn LogicalType>> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_type(name))
    }

    /// Check whether a name is registered; never fails
    pub fn has(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Text type: renders any non-null scalar as text
#[derive(Debug)]
pub struct StringType;

impl LogicalType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn to_database_value(&self, value: &Value, _platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(_) => Ok(value.clone()),
            Value::Bytes(_) => Err(Error::conversion(value, self.name())),
            other => Ok(Value::Text(other.as_string())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        self.to_database_value(value, platform)
    }
}

/// Integer type: 64-bit integers, rejecting lossy input
#[derive(Debug)]
pub struct IntegerType;

impl LogicalType for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn binding_kind(&self) -> BindingKind {
        BindingKind::Integer
    }

    fn to_database_value(&self, value: &Value, _platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Int(_) | Value::Long(_) => Ok(value.clone()),
            Value::Double(v) if v.fract() == 0.0 => Ok(Value::Long(*v as i64)),
            other => other
                .as_long()
                .map(Value::Long)
                .ok_or_else(|| Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        self.to_database_value(value, platform)
    }
}

/// Boolean type: accepts the usual truthy/falsy text spellings
#[derive(Debug)]
pub struct BooleanType;

impl LogicalType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn binding_kind(&self) -> BindingKind {
        BindingKind::Boolean
    }

    fn to_database_value(&self, value: &Value, _platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            other => other
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        self.to_database_value(value, platform)
    }
}

/// Float type: 64-bit floating point, bound as text
#[derive(Debug)]
pub struct FloatType;

impl LogicalType for FloatType {
    fn name(&self) -> &str {
        "float"
    }

    fn to_database_value(&self, value: &Value, _platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            other => other
                .as_double()
                .map(Value::Double)
                .ok_or_else(|| Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        self.to_database_value(value, platform)
    }
}

/// Binary type: raw byte strings
#[derive(Debug)]
pub struct BinaryType;

impl LogicalType for BinaryType {
    fn name(&self) -> &str {
        "binary"
    }

    fn binding_kind(&self) -> BindingKind {
        BindingKind::Binary
    }

    fn to_database_value(&self, value: &Value, _platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Bytes(_) => Ok(value.clone()),
            Value::Text(s) => Ok(Value::Bytes(s.clone().into_bytes())),
            other => Err(Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        self.to_database_value(value, platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_get_returns_same_instance() {
        let registry = TypeRegistry::new();
        let ty: Arc<dyn LogicalType> = Arc::new(StringType);
        registry.register(Arc::clone(&ty)).unwrap();

        let looked_up = registry.get("string").unwrap();
        assert!(Arc::ptr_eq(&ty, &looked_up));
        assert!(registry.has("string"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = TypeRegistry::new();
        registry.register(Arc::new(StringType)).unwrap();

        let err = registry.register(Arc::new(StringType)).unwrap_err();
        assert!(matches!(err, Error::DuplicateType { .. }));
    }

    #[test]
    fn test_unknown_lookup_fails() {
        let registry = TypeRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
        assert!(!registry.has("nope"));
    }

    #[test]
    fn test_builtins_present() {
        let registry = TypeRegistry::with_builtins().unwrap();
        for name in [
            "string", "integer", "boolean", "float", "binary", "time", "date", "datetime",
        ] {
            assert!(registry.has(name), "missing builtin '{name}'");
        }
    }

    #[test]
    fn test_binding_kind_parse() {
        assert_eq!("int".parse::<BindingKind>().unwrap(), BindingKind::Integer);
        assert_eq!("blob".parse::<BindingKind>().unwrap(), BindingKind::Binary);
        assert_eq!("STRING".parse::<BindingKind>().unwrap(), BindingKind::Text);

        let err = "decimal".parse::<BindingKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownBindingType { .. }));
    }

    #[test]
    fn test_binding_kind_tag_map() {
        assert_eq!(BindingKind::Text.bind_tag(), BindTag::Text);
        assert_eq!(BindingKind::Null.bind_tag(), BindTag::Text);
        assert_eq!(BindingKind::Binary.bind_tag(), BindTag::Text);
        assert_eq!(BindingKind::Integer.bind_tag(), BindTag::Int);
        assert_eq!(BindingKind::Boolean.bind_tag(), BindTag::Int);
    }

    #[test]
    fn test_integer_type_rejects_fractional() {
        let platform = Platform::default();
        let err = IntegerType
            .to_database_value(&Value::Double(1.2), &platform)
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));

        let ok = IntegerType
            .to_database_value(&Value::Double(3.0), &platform)
            .unwrap();
        assert_eq!(ok, Value::Long(3));
    }

    #[test]
    fn test_boolean_type_text_spellings() {
        let platform = Platform::default();
        let ok = BooleanType
            .to_database_value(&Value::Text("yes".into()), &platform)
            .unwrap();
        assert_eq!(ok, Value::Bool(true));

        let err = BooleanType
            .to_database_value(&Value::Text("maybe".into()), &platform)
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }
}
