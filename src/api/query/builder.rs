//! FindRequest for fluent read construction
//!
//! Collects everything `find` needs and turns it into a [`ReadPlan`]: the
//! `read` parameters plus the paging decisions the client loops on.

use serde_json::{Map, Value, json};

use super::filters::{self, FilterNode};
use super::orderby::{OrderBy, OrderByClause};
use crate::api::datetime::DateTimeNormalizer;
use crate::api::error::{Result, ShotgunError};

#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    entity_type: String,
    filters: Vec<FilterNode>,
    fields: Option<Vec<String>>,
    order: OrderByClause,
    filter_operator: Option<String>,
    limit: u32,
    page: u32,
    retired_only: bool,
}

impl FindRequest {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            filters: Vec::new(),
            fields: None,
            order: OrderByClause::new(),
            filter_operator: None,
            limit: 0,
            page: 0,
            retired_only: false,
        }
    }

    /// Add one filter row or group
    pub fn filter(mut self, filter: impl Into<FilterNode>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Replace all filters
    pub fn filters(mut self, filters: Vec<FilterNode>) -> Self {
        self.filters = filters;
        self
    }

    /// Fields to return; only `id` when never set
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = self.order.add(order);
        self
    }

    pub fn order_clause(mut self, order: OrderByClause) -> Self {
        self.order = order;
        self
    }

    /// `"all"` or `"or"`
    pub fn filter_operator(mut self, filter_operator: impl Into<String>) -> Self {
        self.filter_operator = Some(filter_operator.into());
        self
    }

    /// Maximum number of records, 0 for all of them
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Read only this page, 1-based; 0 reads every page
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn retired_only(mut self, retired_only: bool) -> Self {
        self.retired_only = retired_only;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn get_limit(&self) -> u32 {
        self.limit
    }

    /// Validate and compile into the parameters of a `read` call
    pub fn plan(&self, records_per_page: u32, normalizer: &DateTimeNormalizer) -> Result<ReadPlan> {
        if self.entity_type.is_empty() {
            return Err(ShotgunError::validation("find needs an entity type"));
        }

        let tree = filters::compile(&self.filters, self.filter_operator.as_deref())?;

        let mut params = Map::new();
        params.insert("type".to_string(), json!(self.entity_type));
        params.insert(
            "return_fields".to_string(),
            json!(self.fields.clone().unwrap_or_else(|| vec!["id".to_string()])),
        );
        params.insert("filters".to_string(), tree.to_wire(normalizer)?);
        params.insert(
            "return_only".to_string(),
            json!(if self.retired_only { "retired" } else { "active" }),
        );
        if let Some(sorts) = self.order.to_wire() {
            params.insert("sorts".to_string(), sorts);
        }

        let entities_per_page = if self.limit > 0 && self.limit < records_per_page {
            self.limit
        } else {
            records_per_page.max(1)
        };

        Ok(ReadPlan {
            params,
            entities_per_page,
            first_page: self.page.max(1),
            pinned: self.page > 0,
            limit: self.limit,
        })
    }
}

/// Compiled `read` parameters plus paging state
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    params: Map<String, Value>,
    entities_per_page: u32,
    first_page: u32,
    pinned: bool,
    limit: u32,
}

impl ReadPlan {
    /// Parameters for one page
    pub fn page_params(&self, current_page: u32) -> Value {
        let mut params = self.params.clone();
        params.insert(
            "paging".to_string(),
            json!({
                "entities_per_page": self.entities_per_page,
                "current_page": current_page,
            }),
        );
        Value::Object(params)
    }

    pub fn first_page(&self) -> u32 {
        self.first_page
    }

    pub fn entities_per_page(&self) -> u32 {
        self.entities_per_page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether paging stops after a page of `page_len` records, `collected` in total
    pub fn is_done(&self, collected: usize, page_len: usize) -> bool {
        self.pinned
            || (self.limit > 0 && collected >= self.limit as usize)
            || page_len < self.entities_per_page as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::datetime::LocalZone;
    use crate::api::entity::EntityRef;
    use crate::api::query::filters::Filter;

    fn normalizer() -> DateTimeNormalizer {
        DateTimeNormalizer::new(true, LocalZone::System)
    }

    #[test]
    fn test_basic_find_request() {
        let plan = FindRequest::new("Shot")
            .fields(&["code", "sg_status_list"])
            .filter(Filter::is("project", EntityRef::new("Project", 65)))
            .order(OrderBy::desc("created_at"))
            .plan(500, &normalizer())
            .unwrap();

        let params = plan.page_params(1);
        assert_eq!(params["type"], "Shot");
        assert_eq!(params["return_fields"], json!(["code", "sg_status_list"]));
        assert_eq!(params["return_only"], "active");
        assert_eq!(params["filters"]["logical_operator"], "and");
        assert_eq!(params["sorts"], json!([{"field_name": "created_at", "direction": "desc"}]));
        assert_eq!(params["paging"], json!({"entities_per_page": 500, "current_page": 1}));
    }

    #[test]
    fn test_defaults() {
        let params = FindRequest::new("Asset").plan(500, &normalizer()).unwrap().page_params(1);
        assert_eq!(params["return_fields"], json!(["id"]));
        assert_eq!(params["filters"], json!({"logical_operator": "and", "conditions": []}));
        assert!(params.get("sorts").is_none());
    }

    #[test]
    fn test_retired_only() {
        let params = FindRequest::new("Shot")
            .retired_only(true)
            .plan(500, &normalizer())
            .unwrap()
            .page_params(1);
        assert_eq!(params["return_only"], "retired");
    }

    #[test]
    fn test_page_size_follows_limit() {
        let small = FindRequest::new("Shot").limit(10).plan(500, &normalizer()).unwrap();
        assert_eq!(small.entities_per_page(), 10);

        let large = FindRequest::new("Shot").limit(1200).plan(500, &normalizer()).unwrap();
        assert_eq!(large.entities_per_page(), 500);
        assert!(!large.is_done(500, 500));
        assert!(large.is_done(1200, 200));
        assert!(large.is_done(700, 200));
    }

    #[test]
    fn test_pinned_page() {
        let plan = FindRequest::new("Shot").page(3).plan(50, &normalizer()).unwrap();
        assert_eq!(plan.first_page(), 3);
        assert!(plan.is_done(50, 50));
        assert_eq!(plan.page_params(3)["paging"]["current_page"], 3);
    }

    #[test]
    fn test_invalid_requests() {
        assert!(FindRequest::new("").plan(500, &normalizer()).is_err());
        assert!(
            FindRequest::new("Shot")
                .filter_operator("any")
                .plan(500, &normalizer())
                .unwrap_err()
                .is_validation()
        );
    }
}
