//! Sort order for reads and summary groupings

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::error::{Result, ShotgunError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(direction: &str) -> Result<Self> {
        match direction {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ShotgunError::validation(format!(
                "sort direction must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Asc(String),
    Desc(String),
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self::Asc(field.into())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::Desc(field.into())
    }

    pub fn field(&self) -> &str {
        match self {
            OrderBy::Asc(field) | OrderBy::Desc(field) => field,
        }
    }

    pub fn direction(&self) -> SortDirection {
        match self {
            OrderBy::Asc(_) => SortDirection::Asc,
            OrderBy::Desc(_) => SortDirection::Desc,
        }
    }

    /// Wire form `{field_name, direction}`
    pub fn to_wire(&self) -> Value {
        json!({
            "field_name": self.field(),
            "direction": self.direction().as_str(),
        })
    }

    /// Parse `{"field_name": ..., "direction": ...}`; direction defaults to ascending
    pub fn from_value(value: &Value) -> Result<Self> {
        let field = value
            .get("field_name")
            .and_then(Value::as_str)
            .ok_or_else(|| ShotgunError::validation(format!("order entry needs a field_name, got {}", value)))?;

        let direction = match value.get("direction") {
            None | Some(Value::Null) => SortDirection::Asc,
            Some(Value::String(direction)) => SortDirection::parse(direction)?,
            Some(other) => {
                return Err(ShotgunError::validation(format!("sort direction must be a string, got {}", other)));
            }
        };

        Ok(match direction {
            SortDirection::Asc => OrderBy::asc(field),
            SortDirection::Desc => OrderBy::desc(field),
        })
    }
}

/// Ordered list of sort clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderByClause {
    clauses: Vec<OrderBy>,
}

impl OrderByClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, order: OrderBy) -> Self {
        self.clauses.push(order);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Value of the `sorts` parameter, absent when nothing is ordered
    pub fn to_wire(&self) -> Option<Value> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(Value::Array(self.clauses.iter().map(OrderBy::to_wire).collect()))
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| ShotgunError::validation(format!("order must be a list, got {}", value)))?;

        items
            .iter()
            .try_fold(Self::new(), |clause, item| -> Result<Self> { Ok(clause.add(OrderBy::from_value(item)?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_orderby() {
        assert_eq!(OrderBy::asc("code").to_wire(), json!({"field_name": "code", "direction": "asc"}));
        assert_eq!(
            OrderBy::desc("created_at").to_wire(),
            json!({"field_name": "created_at", "direction": "desc"})
        );
    }

    #[test]
    fn test_multiple_orderby() {
        let clause = OrderByClause::new().add(OrderBy::asc("code")).add(OrderBy::desc("created_at"));

        assert_eq!(
            clause.to_wire(),
            Some(json!([
                {"field_name": "code", "direction": "asc"},
                {"field_name": "created_at", "direction": "desc"}
            ]))
        );
    }

    #[test]
    fn test_empty_orderby() {
        assert_eq!(OrderByClause::new().to_wire(), None);
    }

    #[test]
    fn test_from_value() {
        let clause = OrderByClause::from_value(&json!([
            {"field_name": "id", "direction": "desc"},
            {"field_name": "code"}
        ]))
        .unwrap();
        assert_eq!(clause, OrderByClause::new().add(OrderBy::desc("id")).add(OrderBy::asc("code")));

        assert!(OrderByClause::from_value(&json!({"field_name": "id"})).is_err());
        assert!(OrderBy::from_value(&json!({"field_name": "id", "direction": "up"})).is_err());
    }
}
