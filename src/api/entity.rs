//! Entity payloads
//!
//! Records coming back from the server are open mappings from field name to
//! a [`FieldValue`]. The set of value kinds is closed; conversion to and from
//! the JSON wire form happens in [`crate::api::datetime::DateTimeNormalizer`],
//! which owns the timezone policy that datetime fields depend on.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::BTreeMap;

use super::datetime::DateTimeValue;

/// A single field value of an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTimeValue),
    Entity(EntityRef),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

/// Link to another record, sent as `{type, id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: i64,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Entity(reference) => Some(reference.id),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTimeValue> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get a field of a map value
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.as_map().and_then(|map| map.get(field))
    }

    /// Name of the value kind, used in validation messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Entity(_) => "entity",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }
}

// Convenient From implementations for FieldValue
impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(DateTimeValue::Naive(value))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FieldValue {
    fn from(value: DateTime<Tz>) -> Self {
        FieldValue::DateTime(DateTimeValue::zoned(value))
    }
}

impl From<DateTimeValue> for FieldValue {
    fn from(value: DateTimeValue) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<EntityRef> for FieldValue {
    fn from(value: EntityRef) -> Self {
        FieldValue::Entity(value)
    }
}

impl From<Entity> for FieldValue {
    fn from(value: Entity) -> Self {
        FieldValue::Map(value.fields)
    }
}

/// Structural conversion; strings stay text whatever they look like
impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Map(map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect()),
        }
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A record as returned by the server, or the field data sent to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    fields: BTreeMap<String, FieldValue>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(FieldValue::as_i64)
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.get("type").and_then(FieldValue::as_str)
    }

    /// Reference to this record, when it carries both `type` and `id`
    pub fn to_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::new(self.entity_type()?, self.id()?))
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<BTreeMap<String, FieldValue>> for Entity {
    fn from(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Entity {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl TryFrom<FieldValue> for Entity {
    type Error = FieldValue;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Map(fields) => Ok(Self { fields }),
            other => Err(other),
        }
    }
}
