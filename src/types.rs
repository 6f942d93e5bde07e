use crate::error::{RecastError, Result};
use chrono::{DateTime, FixedOffset};
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A single column value, opaque to the mapper
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<FixedOffset>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(value: Vec<u8>) -> Self {
        Scalar::Bytes(value)
    }
}

impl From<DateTime<FixedOffset>> for Scalar {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Scalar::DateTime(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Bytes(bytes) => serializer.collect_seq(bytes),
            Scalar::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
        }
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar column value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Scalar, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
        // Integers beyond i64 keep their magnitude as a float
        Ok(i64::try_from(v).map_or(Scalar::Float(v as f64), Scalar::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
        Ok(Scalar::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Scalar, E> {
        Ok(Scalar::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Bytes(v.to_vec()))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// Hashable form of a non-null identity value, used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Bool(bool),
    Int(i64),
    /// Bit pattern of the float, with `-0.0` folded into `0.0`
    Float(u64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<FixedOffset>),
}

impl IdentityKey {
    /// `None` for a null identity: such rows are never deduplicated
    pub fn from_scalar(value: &Scalar) -> Option<Self> {
        let key = match value {
            Scalar::Null => return None,
            Scalar::Bool(b) => IdentityKey::Bool(*b),
            Scalar::Int(i) => IdentityKey::Int(*i),
            Scalar::Float(f) if *f == 0.0 => IdentityKey::Float(0.0f64.to_bits()),
            Scalar::Float(f) => IdentityKey::Float(f.to_bits()),
            Scalar::String(s) => IdentityKey::String(s.clone()),
            Scalar::Bytes(b) => IdentityKey::Bytes(b.clone()),
            Scalar::DateTime(dt) => IdentityKey::DateTime(*dt),
        };
        Some(key)
    }
}

/// A named column value
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Scalar,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One tabular result row, columns in the order the data source produced them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Row { fields }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.fields.push(Field::new(name, value));
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row {
            fields: iter.into_iter().map(|(k, v)| Field::new(k, v)).collect(),
        }
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Row, A::Error> {
        let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, Scalar>()? {
            fields.push(Field { name, value });
        }
        Ok(Row { fields })
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// The kind of value bound to a field name on a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Object,
    List,
    Array,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Scalar => "scalar",
            FieldKind::Object => "object",
            FieldKind::List => "list",
            FieldKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// A value stored on a [`Node`]
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Scalar(Scalar),
    /// A single nested object built from a `Group_Field` column group
    Object(Node),
    /// One entry per row that carried a `#List_Field` column group
    List(Vec<Node>),
    /// One value per row that carried a `#Array` column
    Array(Vec<Scalar>),
}

impl NodeValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            NodeValue::Scalar(_) => FieldKind::Scalar,
            NodeValue::Object(_) => FieldKind::Object,
            NodeValue::List(_) => FieldKind::List,
            NodeValue::Array(_) => FieldKind::Array,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            NodeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Node> {
        match self {
            NodeValue::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            NodeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            NodeValue::Array(values) => Some(values),
            _ => None,
        }
    }
}

impl Serialize for NodeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NodeValue::Scalar(s) => s.serialize(serializer),
            NodeValue::Object(node) => node.serialize(serializer),
            NodeValue::List(items) => serializer.collect_seq(items),
            NodeValue::Array(values) => serializer.collect_seq(values),
        }
    }
}

/// A reconstructed object: field names are unique and keep insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    fields: Vec<(String, NodeValue)>,
}

impl Node {
    pub fn new() -> Self {
        Node { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Bind a new field. Rebinding an existing name is an error.
    pub fn insert(&mut self, name: impl Into<String>, value: NodeValue) -> Result<()> {
        let name = name.into();
        if self.contains_key(&name) {
            return Err(RecastError::DuplicateFieldName { name });
        }
        self.fields.push((name, value));
        Ok(())
    }

    /// The list bound to `name`, created empty on first use
    pub fn list_mut(&mut self, name: &str) -> Result<&mut Vec<Node>> {
        let index = self.position_or_insert(name, || NodeValue::List(Vec::new()));
        match &mut self.fields[index].1 {
            NodeValue::List(items) => Ok(items),
            other => Err(RecastError::TypeMismatch {
                name: name.to_string(),
                existing: other.kind(),
                incoming: FieldKind::List,
            }),
        }
    }

    /// The array bound to `name`, created empty on first use
    pub fn array_mut(&mut self, name: &str) -> Result<&mut Vec<Scalar>> {
        let index = self.position_or_insert(name, || NodeValue::Array(Vec::new()));
        match &mut self.fields[index].1 {
            NodeValue::Array(values) => Ok(values),
            other => Err(RecastError::TypeMismatch {
                name: name.to_string(),
                existing: other.kind(),
                incoming: FieldKind::Array,
            }),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }

    fn position_or_insert(&mut self, name: &str, empty: impl FnOnce() -> NodeValue) -> usize {
        match self.position(name) {
            Some(index) => index,
            None => {
                self.fields.push((name.to_string(), empty()));
                self.fields.len() - 1
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Configuration for the column naming convention
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Leading character of the identity column, e.g. `@Id`
    pub identity_marker: char,

    /// Leading character of list (`#Moons_Name`) and array (`#Tags`) columns
    pub collection_marker: char,

    /// Splits a group name from the nested field name
    pub separator: char,

    /// Column name prefixes of server pseudo-columns, kept as plain scalars
    pub passthrough_prefixes: Vec<String>,

    /// Maximum nesting depth of composed objects
    pub max_depth: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            identity_marker: '@',
            collection_marker: '#',
            separator: '_',
            passthrough_prefixes: vec![String::from("@@")],
            max_depth: 32,
        }
    }
}
