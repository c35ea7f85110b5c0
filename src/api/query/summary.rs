//! Aggregate requests for `summarize`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::filters::{self, FilterNode};
use super::orderby::SortDirection;
use crate::api::datetime::DateTimeNormalizer;
use crate::api::error::{Result, ShotgunError};

/// One aggregate to compute, e.g. `{field: "id", type: "count"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryField {
    pub field: String,
    #[serde(rename = "type")]
    pub summary_type: String,
}

impl SummaryField {
    pub fn new(field: impl Into<String>, summary_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            summary_type: summary_type.into(),
        }
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::new(field, "count")
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(field, "sum")
    }

    /// Parse a JSON list of `{field, type}` objects
    pub fn list_from_value(value: &Value) -> Result<Vec<SummaryField>> {
        list_of_mappings(value, "summary_fields")
    }
}

/// How to bucket records, e.g. `{field: "sg_status_list", type: "exact", direction: "asc"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub field: String,
    #[serde(rename = "type")]
    pub grouping_type: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Grouping {
    pub fn new(field: impl Into<String>, grouping_type: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            grouping_type: grouping_type.into(),
            direction,
        }
    }

    pub fn exact(field: impl Into<String>) -> Self {
        Self::new(field, "exact", SortDirection::Asc)
    }

    pub fn list_from_value(value: &Value) -> Result<Vec<Grouping>> {
        list_of_mappings(value, "grouping")
    }
}

fn list_of_mappings<T: for<'de> Deserialize<'de>>(value: &Value, what: &str) -> Result<Vec<T>> {
    let items = value
        .as_array()
        .ok_or_else(|| ShotgunError::validation(format!("{} must be a list, got {}", what, value)))?;

    items
        .iter()
        .map(|item| {
            if !item.is_object() {
                return Err(ShotgunError::validation(format!(
                    "{} entries must be mappings, got {}",
                    what, item
                )));
            }
            serde_json::from_value(item.clone())
                .map_err(|e| ShotgunError::validation(format!("invalid {} entry {}: {}", what, item, e)))
        })
        .collect()
}

/// Parameters of a `summarize` call
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    entity_type: String,
    filters: Vec<FilterNode>,
    summary_fields: Vec<SummaryField>,
    filter_operator: Option<String>,
    grouping: Option<Vec<Grouping>>,
}

impl SummaryRequest {
    pub fn new(entity_type: impl Into<String>, filters: Vec<FilterNode>, summary_fields: Vec<SummaryField>) -> Self {
        Self {
            entity_type: entity_type.into(),
            filters,
            summary_fields,
            filter_operator: None,
            grouping: None,
        }
    }

    pub fn filter_operator(mut self, filter_operator: impl Into<String>) -> Self {
        self.filter_operator = Some(filter_operator.into());
        self
    }

    pub fn grouping(mut self, grouping: Vec<Grouping>) -> Self {
        self.grouping = Some(grouping);
        self
    }

    /// Build the RPC parameters; `grouping` is left out entirely when unset
    pub fn build(&self, normalizer: &DateTimeNormalizer) -> Result<Value> {
        let tree = filters::compile(&self.filters, self.filter_operator.as_deref())?;

        let mut params = Map::new();
        params.insert("type".to_string(), json!(self.entity_type));
        params.insert("summaries".to_string(), json!(self.summary_fields));
        params.insert("filters".to_string(), tree.to_wire(normalizer)?);
        if let Some(grouping) = &self.grouping {
            params.insert("grouping".to_string(), json!(grouping));
        }

        Ok(Value::Object(params))
    }
}
