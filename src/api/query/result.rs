//! Result shapes of `read` and `summarize`
//!
//! Both are built from already-normalized values, so datetimes and local
//! paths are in client form by the time they land here.

use std::collections::BTreeMap;

use crate::api::entity::{Entity, FieldValue};
use crate::api::error::{Result, ShotgunError};

/// One page returned by `read`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadPage {
    pub entities: Vec<Entity>,
    pub entity_count: Option<i64>,
}

impl ReadPage {
    pub fn from_value(value: FieldValue) -> Result<Self> {
        let mut map = match value {
            FieldValue::Map(map) => map,
            other => {
                return Err(ShotgunError::response(format!(
                    "read returned {} instead of a mapping",
                    other.kind()
                )));
            }
        };

        let entities = match map.remove("entities") {
            Some(FieldValue::List(items)) => items
                .into_iter()
                .map(|item| {
                    Entity::try_from(item)
                        .map_err(|other| ShotgunError::response(format!("read returned a {} entity", other.kind())))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(FieldValue::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ShotgunError::response(format!(
                    "read entities must be a list, got {}",
                    other.kind()
                )));
            }
        };

        let entity_count = map
            .get("paging_info")
            .and_then(|paging| paging.get("entity_count"))
            .and_then(FieldValue::as_i64);

        Ok(Self { entities, entity_count })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// One bucket of a grouped summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryGroup {
    pub group_name: FieldValue,
    pub group_value: FieldValue,
    pub summaries: BTreeMap<String, FieldValue>,
    /// Sub-buckets when more than one grouping was requested
    pub groups: Vec<SummaryGroup>,
}

/// `{groups, summaries}` as returned by `summarize`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryResult {
    pub groups: Vec<SummaryGroup>,
    pub summaries: BTreeMap<String, FieldValue>,
}

impl SummaryResult {
    pub fn from_value(value: FieldValue) -> Result<Self> {
        let mut map = match value {
            FieldValue::Map(map) => map,
            other => {
                return Err(ShotgunError::response(format!(
                    "summarize returned {} instead of a mapping",
                    other.kind()
                )));
            }
        };

        Ok(Self {
            groups: take_groups(&mut map)?,
            summaries: take_map(&mut map, "summaries")?,
        })
    }

    /// Look up an overall summary by field name
    pub fn summary(&self, field: &str) -> Option<&FieldValue> {
        self.summaries.get(field)
    }
}

fn take_groups(map: &mut BTreeMap<String, FieldValue>) -> Result<Vec<SummaryGroup>> {
    match map.remove("groups") {
        Some(FieldValue::List(items)) => items
            .into_iter()
            .map(|item| match item {
                FieldValue::Map(mut group) => Ok(SummaryGroup {
                    group_name: group.remove("group_name").unwrap_or_default(),
                    group_value: group.remove("group_value").unwrap_or_default(),
                    summaries: take_map(&mut group, "summaries")?,
                    groups: take_groups(&mut group)?,
                }),
                other => Err(ShotgunError::response(format!(
                    "summary group must be a mapping, got {}",
                    other.kind()
                ))),
            })
            .collect(),
        Some(FieldValue::Null) | None => Ok(Vec::new()),
        Some(other) => Err(ShotgunError::response(format!(
            "summary groups must be a list, got {}",
            other.kind()
        ))),
    }
}

fn take_map(map: &mut BTreeMap<String, FieldValue>, key: &str) -> Result<BTreeMap<String, FieldValue>> {
    match map.remove(key) {
        Some(FieldValue::Map(inner)) => Ok(inner),
        Some(FieldValue::Null) | None => Ok(BTreeMap::new()),
        Some(other) => Err(ShotgunError::response(format!(
            "{} must be a mapping, got {}",
            key,
            other.kind()
        ))),
    }
}
