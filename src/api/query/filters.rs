//! Filter expressions and their compilation into the wire filter tree
//!
//! Callers describe conditions as `(path, relation, values)` rows, optionally
//! nested in groups with their own operator. [`compile`] validates every row
//! against the relation registry and produces the canonical
//! `{logical_operator, conditions}` tree the server expects.

use serde_json::{Value, json};

use crate::api::datetime::DateTimeNormalizer;
use crate::api::entity::FieldValue;
use crate::api::error::{Result, ShotgunError};

/// How many values a relation takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

/// Every relation the server understands, with its arity
const RELATIONS: &[(&str, Arity)] = &[
    ("is", Arity::Exactly(1)),
    ("is_not", Arity::Exactly(1)),
    ("less_than", Arity::Exactly(1)),
    ("greater_than", Arity::Exactly(1)),
    ("contains", Arity::Exactly(1)),
    ("not_contains", Arity::Exactly(1)),
    ("starts_with", Arity::Exactly(1)),
    ("ends_with", Arity::Exactly(1)),
    ("type_is", Arity::Exactly(1)),
    ("type_is_not", Arity::Exactly(1)),
    ("name_contains", Arity::Exactly(1)),
    ("name_not_contains", Arity::Exactly(1)),
    ("name_is", Arity::Exactly(1)),
    ("in_calendar_day", Arity::Exactly(1)),
    ("in_calendar_week", Arity::Exactly(1)),
    ("in_calendar_month", Arity::Exactly(1)),
    ("in_calendar_year", Arity::Exactly(1)),
    ("not_in_calendar_day", Arity::Exactly(1)),
    ("between", Arity::Exactly(2)),
    ("not_between", Arity::Exactly(2)),
    ("in_last", Arity::Exactly(2)),
    ("not_in_last", Arity::Exactly(2)),
    ("in_next", Arity::Exactly(2)),
    ("not_in_next", Arity::Exactly(2)),
    ("in", Arity::AtLeast(1)),
    ("not_in", Arity::AtLeast(1)),
];

/// Look up a relation in the registry
pub fn relation_arity(relation: &str) -> Option<Arity> {
    RELATIONS
        .iter()
        .find(|(name, _)| *name == relation)
        .map(|(_, arity)| *arity)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// `None` and `"all"` mean `and`, `"or"` means `or`; nothing else is accepted
    pub fn parse(filter_operator: Option<&str>) -> Result<Self> {
        match filter_operator {
            None | Some("all") => Ok(LogicalOperator::And),
            Some("or") => Ok(LogicalOperator::Or),
            Some(other) => Err(ShotgunError::validation(format!(
                "filter_operator must be 'all' or 'or', got '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

/// One filter row as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub path: String,
    pub relation: String,
    pub values: Vec<FieldValue>,
}

impl Filter {
    /// A row with one value; a list value is taken as the value sequence itself
    pub fn new(path: impl Into<String>, relation: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let values = match value.into() {
            FieldValue::List(values) => values,
            single => vec![single],
        };
        Self::with_values(path, relation, values)
    }

    pub fn with_values(path: impl Into<String>, relation: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            path: path.into(),
            relation: relation.into(),
            values,
        }
    }

    pub fn is(path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::with_values(path, "is", vec![value.into()])
    }

    pub fn is_not(path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::with_values(path, "is_not", vec![value.into()])
    }

    pub fn less_than(path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::with_values(path, "less_than", vec![value.into()])
    }

    pub fn greater_than(path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::with_values(path, "greater_than", vec![value.into()])
    }

    pub fn contains(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_values(path, "contains", vec![FieldValue::Text(value.into())])
    }

    pub fn starts_with(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_values(path, "starts_with", vec![FieldValue::Text(value.into())])
    }

    pub fn between(path: impl Into<String>, low: impl Into<FieldValue>, high: impl Into<FieldValue>) -> Self {
        Self::with_values(path, "between", vec![low.into(), high.into()])
    }

    pub fn is_in<V: Into<FieldValue>>(path: impl Into<String>, values: Vec<V>) -> Self {
        Self::with_values(path, "in", values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<V: Into<FieldValue>>(path: impl Into<String>, values: Vec<V>) -> Self {
        Self::with_values(path, "not_in", values.into_iter().map(Into::into).collect())
    }
}

/// A filter row or a nested group of them
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Condition(Filter),
    Group {
        filter_operator: Option<String>,
        filters: Vec<FilterNode>,
    },
}

impl FilterNode {
    pub fn group(filter_operator: Option<&str>, filters: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            filter_operator: filter_operator.map(str::to_string),
            filters,
        }
    }

    /// Parse a JSON filter list
    ///
    /// Rows are arrays `[path, relation, value...]`; groups are objects
    /// `{"filter_operator": ..., "filters": [...]}`. Anything that is not a
    /// list at the top is rejected.
    pub fn list_from_value(value: &Value) -> Result<Vec<FilterNode>> {
        let items = value
            .as_array()
            .ok_or_else(|| ShotgunError::validation(format!("filters must be a list, got {}", value)))?;

        items.iter().map(FilterNode::from_value).collect()
    }

    fn from_value(value: &Value) -> Result<FilterNode> {
        match value {
            Value::Array(row) => parse_row(row).map(FilterNode::Condition),
            Value::Object(group) => {
                let filter_operator = match group.get("filter_operator") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(op)) => Some(op.clone()),
                    Some(other) => {
                        return Err(ShotgunError::validation(format!(
                            "filter_operator must be a string, got {}",
                            other
                        )));
                    }
                };
                let filters = group
                    .get("filters")
                    .ok_or_else(|| ShotgunError::validation("filter group has no 'filters' list"))?;
                Ok(FilterNode::Group {
                    filter_operator,
                    filters: FilterNode::list_from_value(filters)?,
                })
            }
            other => Err(ShotgunError::validation(format!(
                "filter must be a [path, relation, value] row or a group, got {}",
                other
            ))),
        }
    }
}

impl From<Filter> for FilterNode {
    fn from(filter: Filter) -> Self {
        FilterNode::Condition(filter)
    }
}

fn parse_row(row: &[Value]) -> Result<Filter> {
    if row.len() < 3 {
        return Err(ShotgunError::validation(format!(
            "filter row needs path, relation and value, got {} elements",
            row.len()
        )));
    }

    let text = |value: &Value, what: &str| {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ShotgunError::validation(format!("filter {} must be a string, got {}", what, value)))
    };
    let path = text(&row[0], "path")?;
    let relation = text(&row[1], "relation")?;

    if row.len() == 3 {
        Ok(Filter::new(path, relation, FieldValue::from(row[2].clone())))
    } else {
        let values = row[2..].iter().cloned().map(FieldValue::from).collect();
        Ok(Filter::with_values(path, relation, values))
    }
}

/// A validated condition of the compiled tree
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub path: String,
    pub relation: String,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledCondition {
    Expression(FilterExpression),
    Tree(FilterTree),
}

/// Canonical filter tree sent to the server
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTree {
    pub logical_operator: LogicalOperator,
    pub conditions: Vec<CompiledCondition>,
}

impl FilterTree {
    pub fn to_wire(&self, normalizer: &DateTimeNormalizer) -> Result<Value> {
        let conditions = self
            .conditions
            .iter()
            .map(|condition| match condition {
                CompiledCondition::Expression(expression) => {
                    let values = expression
                        .values
                        .iter()
                        .map(|value| normalizer.to_wire_value(value))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(json!({
                        "path": expression.path,
                        "relation": expression.relation,
                        "values": values,
                    }))
                }
                CompiledCondition::Tree(tree) => tree.to_wire(normalizer),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(json!({
            "logical_operator": self.logical_operator.as_str(),
            "conditions": conditions,
        }))
    }
}

/// Compile caller filters into the canonical tree
pub fn compile(filters: &[FilterNode], filter_operator: Option<&str>) -> Result<FilterTree> {
    let logical_operator = LogicalOperator::parse(filter_operator)?;

    let conditions = filters
        .iter()
        .map(|node| match node {
            FilterNode::Condition(filter) => compile_condition(filter).map(CompiledCondition::Expression),
            FilterNode::Group { filter_operator, filters } => {
                compile(filters, filter_operator.as_deref()).map(CompiledCondition::Tree)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FilterTree {
        logical_operator,
        conditions,
    })
}

fn compile_condition(filter: &Filter) -> Result<FilterExpression> {
    if filter.path.is_empty() {
        return Err(ShotgunError::validation("filter path must not be empty"));
    }

    let arity = relation_arity(&filter.relation)
        .ok_or_else(|| ShotgunError::validation(format!("unknown filter relation '{}'", filter.relation)))?;

    if !arity.accepts(filter.values.len()) {
        return Err(ShotgunError::validation(format!(
            "relation '{}' on '{}' expects {:?} values, got {}",
            filter.relation,
            filter.path,
            arity,
            filter.values.len()
        )));
    }

    Ok(FilterExpression {
        path: filter.path.clone(),
        relation: filter.relation.clone(),
        values: filter.values.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::datetime::LocalZone;
    use crate::api::entity::EntityRef;

    fn normalizer() -> DateTimeNormalizer {
        DateTimeNormalizer::new(false, LocalZone::System)
    }

    #[test]
    fn test_filter_operator() {
        assert_eq!(compile(&[], None).unwrap().logical_operator, LogicalOperator::And);
        assert_eq!(compile(&[], Some("all")).unwrap().logical_operator, LogicalOperator::And);
        assert_eq!(compile(&[], Some("or")).unwrap().logical_operator, LogicalOperator::Or);
        assert!(compile(&[], Some("and")).unwrap_err().is_validation());
        assert!(compile(&[], Some("xor")).unwrap_err().is_validation());
    }

    #[test]
    fn test_single_value_is_wrapped() {
        let tree = compile(&[Filter::new("path", "is", "value").into()], None).unwrap();
        let wire = tree.to_wire(&normalizer()).unwrap();
        assert_eq!(
            wire["conditions"][0],
            json!({"path": "path", "relation": "is", "values": ["value"]})
        );
    }

    #[test]
    fn test_sequence_value_passes_through() {
        let tree = compile(&[Filter::new("id", "in", vec![1, 2, 3]).into()], None).unwrap();
        let wire = tree.to_wire(&normalizer()).unwrap();
        assert_eq!(wire["conditions"][0]["values"], json!([1, 2, 3]));
    }

    #[test]
    fn test_entity_values_and_dotted_paths() {
        let filters = vec![
            Filter::is("project", EntityRef::new("Project", 65)).into(),
            Filter::is("entity.Shot.code", "sh010").into(),
        ];
        let wire = compile(&filters, None).unwrap().to_wire(&normalizer()).unwrap();
        assert_eq!(wire["conditions"][0]["values"], json!([{"type": "Project", "id": 65}]));
        assert_eq!(wire["conditions"][1]["path"], "entity.Shot.code");
    }

    #[test]
    fn test_nested_groups() {
        let filters = vec![
            Filter::is("sg_status_list", "ip").into(),
            FilterNode::group(
                Some("or"),
                vec![Filter::contains("code", "sh01").into(), Filter::contains("code", "sh02").into()],
            ),
        ];
        let wire = compile(&filters, None).unwrap().to_wire(&normalizer()).unwrap();
        assert_eq!(wire["logical_operator"], "and");
        assert_eq!(wire["conditions"][1]["logical_operator"], "or");
        assert_eq!(wire["conditions"][1]["conditions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_registry_rejects_unknown_relation_and_bad_arity() {
        assert!(compile(&[Filter::new("code", "resembles", "x").into()], None).is_err());
        assert!(compile(&[Filter::with_values("id", "between", vec![1.into()]).into()], None).is_err());
        assert!(compile(&[Filter::is_in("id", Vec::<i64>::new()).into()], None).is_err());
        assert!(compile(&[Filter::between("id", 1, 5).into()], None).is_ok());
        assert!(compile(&[Filter::is("due_date", FieldValue::Null).into()], None).is_ok());
    }

    #[test]
    fn test_nested_group_operator_is_validated() {
        let filters = vec![FilterNode::group(Some("any"), vec![])];
        assert!(compile(&filters, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_list_from_value() {
        let nodes = FilterNode::list_from_value(&json!([
            ["project", "is", {"type": "Project", "id": 1}],
            ["id", "between", 1, 10],
            ["id", "in", [4, 5]],
            {"filter_operator": "or", "filters": [["code", "starts_with", "sh"]]}
        ]))
        .unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(
            nodes[1],
            FilterNode::Condition(Filter::with_values("id", "between", vec![1.into(), 10.into()]))
        );
        assert_eq!(nodes[2], FilterNode::Condition(Filter::is_in("id", vec![4, 5])));
        assert!(compile(&nodes, None).is_ok());
    }

    #[test]
    fn test_list_from_value_rejects_non_lists() {
        assert!(FilterNode::list_from_value(&json!("not a list")).unwrap_err().is_validation());
        assert!(FilterNode::list_from_value(&json!([["id", "is"]])).is_err());
        assert!(FilterNode::list_from_value(&json!([[1, "is", 2]])).is_err());
        assert!(FilterNode::list_from_value(&json!([42])).is_err());
    }
}
