//! Datetime handling between client values and the wire format
//!
//! The server stores datetimes in UTC and exchanges them as
//! `YYYY-MM-DDTHH:MM:SSZ` strings with second precision. Whether the client
//! converts between that and the local zone is fixed per client instance by
//! the `convert_datetimes_to_utc` policy:
//!
//! * policy on: naive values are taken as local time and zoned values are
//!   converted, so the wire always carries UTC. Values read back come out
//!   zoned in the local zone.
//! * policy off: the wall-clock reading is sent unchanged with any zone
//!   dropped, and values read back are naive.

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use super::entity::{EntityRef, FieldValue};
use super::error::{Result, ShotgunError};

/// Wire format of datetime fields
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Wire format of date-only fields
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A datetime that may or may not carry a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    Naive(NaiveDateTime),
    /// Compares by instant, not by offset
    Zoned(DateTime<FixedOffset>),
}

impl DateTimeValue {
    pub fn zoned<Tz2: TimeZone>(value: DateTime<Tz2>) -> Self {
        DateTimeValue::Zoned(value.fixed_offset())
    }

    pub fn is_zoned(&self) -> bool {
        matches!(self, DateTimeValue::Zoned(_))
    }

    /// Wall-clock reading, ignoring any zone
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            DateTimeValue::Naive(naive) => *naive,
            DateTimeValue::Zoned(zoned) => zoned.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            DateTimeValue::Naive(_) => None,
            DateTimeValue::Zoned(zoned) => Some(*zoned.offset()),
        }
    }
}

/// The zone that "local time" refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalZone {
    /// The host's zone as reported by the operating system
    System,
    Named(Tz),
}

impl LocalZone {
    /// Resolve an IANA zone name, `None` meaning the host's zone
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(LocalZone::System),
            Some(name) => name
                .parse::<Tz>()
                .map(LocalZone::Named)
                .map_err(|_| ShotgunError::configuration(format!("unknown timezone '{}'", name))),
        }
    }

    /// Attach this zone to a wall-clock reading
    ///
    /// Readings repeated by a fall-back transition resolve to the earlier
    /// occurrence; readings skipped by a spring-forward transition are errors.
    pub fn localize(&self, naive: &NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        let resolved = match self {
            LocalZone::System => map_local_result(Local.from_local_datetime(naive)),
            LocalZone::Named(tz) => map_local_result(tz.from_local_datetime(naive)),
        };

        resolved.ok_or_else(|| {
            ShotgunError::validation(format!(
                "local time {} does not exist (DST transition)",
                naive
            ))
        })
    }

    /// Express a UTC instant in this zone
    pub fn from_utc(&self, utc: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            LocalZone::System => utc.with_timezone(&Local).fixed_offset(),
            LocalZone::Named(tz) => utc.with_timezone(tz).fixed_offset(),
        }
    }
}

fn map_local_result<Tz2: TimeZone>(result: LocalResult<DateTime<Tz2>>) -> Option<DateTime<FixedOffset>> {
    match result {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(earlier, _later) => Some(earlier.fixed_offset()),
        LocalResult::None => None,
    }
}

/// Converts values between client form and wire form under one policy
#[derive(Debug, Clone)]
pub struct DateTimeNormalizer {
    convert_to_utc: bool,
    local: LocalZone,
}

impl DateTimeNormalizer {
    pub fn new(convert_to_utc: bool, local: LocalZone) -> Self {
        Self { convert_to_utc, local }
    }

    pub fn converts_to_utc(&self) -> bool {
        self.convert_to_utc
    }

    pub fn local_zone(&self) -> LocalZone {
        self.local
    }

    /// Render a datetime in the wire format
    pub fn to_wire(&self, value: &DateTimeValue) -> Result<String> {
        let wire = if self.convert_to_utc {
            match value {
                DateTimeValue::Naive(naive) => self.local.localize(naive)?.naive_utc(),
                DateTimeValue::Zoned(zoned) => zoned.naive_utc(),
            }
        } else {
            value.naive_local()
        };

        Ok(wire.format(WIRE_DATETIME_FORMAT).to_string())
    }

    /// Parse a wire datetime, `None` when the string is not one
    pub fn from_wire(&self, value: &str) -> Option<DateTimeValue> {
        let naive = parse_wire_datetime(value)?;

        if self.convert_to_utc {
            let utc = Utc.from_utc_datetime(&naive);
            Some(DateTimeValue::Zoned(self.local.from_utc(&utc)))
        } else {
            Some(DateTimeValue::Naive(naive))
        }
    }

    /// Convert a field value to its JSON wire form
    pub fn to_wire_value(&self, value: &FieldValue) -> Result<Value> {
        Ok(match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| ShotgunError::validation(format!("{} cannot be sent to the server", f)))?,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Date(date) => Value::String(date.format(WIRE_DATE_FORMAT).to_string()),
            FieldValue::DateTime(dt) => Value::String(self.to_wire(dt)?),
            FieldValue::Entity(reference) => entity_ref_to_wire(reference),
            FieldValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.to_wire_value(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            FieldValue::Map(map) => Value::Object(self.to_wire_map(map)?),
        })
    }

    pub fn to_wire_map(&self, map: &BTreeMap<String, FieldValue>) -> Result<Map<String, Value>> {
        map.iter()
            .map(|(field, value)| Ok((field.clone(), self.to_wire_value(value)?)))
            .collect()
    }

    /// Convert a JSON wire value back to a field value
    pub fn from_wire_value(&self, value: Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => match self.from_wire(&s) {
                Some(dt) => {
                    debug!("Inbound datetime {} -> {:?}", s, dt);
                    FieldValue::DateTime(dt)
                }
                None => FieldValue::Text(s),
            },
            Value::Array(items) => {
                FieldValue::List(items.into_iter().map(|item| self.from_wire_value(item)).collect())
            }
            Value::Object(map) => FieldValue::Map(
                map.into_iter()
                    .map(|(field, value)| (field, self.from_wire_value(value)))
                    .collect(),
            ),
        }
    }
}

fn entity_ref_to_wire(reference: &EntityRef) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(reference.entity_type.clone()));
    map.insert("id".to_string(), Value::from(reference.id));
    Value::Object(map)
}

/// Strictly parse `YYYY-MM-DDTHH:MM:SSZ`
fn parse_wire_datetime(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 20 || !value.ends_with('Z') {
        return None;
    }
    NaiveDateTime::parse_from_str(value, WIRE_DATETIME_FORMAT).ok()
}
