//! Batch request validation and wire building
//!
//! Every request is checked before anything is sent, so one malformed
//! entry rejects the whole batch. Order is kept from input to results.

use serde_json::Value;

use super::operation::{BatchRequest, Operation, OperationResult};
use crate::api::datetime::DateTimeNormalizer;
use crate::api::entity::{Entity, FieldValue};
use crate::api::error::{Result, ShotgunError};

/// Request types a batch accepts
pub const REQUEST_TYPES: &[&str] = &["create", "update", "delete"];

/// Validate every request, in order, into typed operations
pub fn validate(requests: &[BatchRequest]) -> Result<Vec<Operation>> {
    requests
        .iter()
        .enumerate()
        .map(|(index, request)| validate_one(index, request))
        .collect()
}

fn validate_one(index: usize, request: &BatchRequest) -> Result<Operation> {
    let missing = |key: &str| {
        ShotgunError::validation(format!(
            "batch request {} is missing required key '{}': {:?}",
            index, key, request
        ))
    };

    let request_type = request
        .request_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("request_type"))?;
    let entity_type = request
        .entity_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("entity_type"))?;

    if !REQUEST_TYPES.contains(&request_type) {
        return Err(ShotgunError::validation(format!(
            "batch request {} has invalid request_type '{}', expected one of {:?}",
            index, request_type, REQUEST_TYPES
        )));
    }

    match request_type {
        "create" => {
            let data = request.data.clone().ok_or_else(|| missing("data"))?;
            Ok(Operation::create(entity_type, data))
        }
        "update" => {
            let id = request.entity_id.ok_or_else(|| missing("entity_id"))?;
            let data = request.data.clone().ok_or_else(|| missing("data"))?;
            Ok(Operation::update(entity_type, id, data))
        }
        _ => {
            let id = request.entity_id.ok_or_else(|| missing("entity_id"))?;
            Ok(Operation::delete(entity_type, id))
        }
    }
}

/// Parameters of the `batch` call
pub fn to_wire(operations: &[Operation], normalizer: &DateTimeNormalizer) -> Result<Value> {
    operations
        .iter()
        .map(|operation| operation.to_wire(normalizer))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Pair each returned value with the operation that produced it
pub fn parse_results(operations: &[Operation], results: FieldValue) -> Result<Vec<OperationResult>> {
    let items = match results {
        FieldValue::List(items) => items,
        other => {
            return Err(ShotgunError::response(format!(
                "batch returned {} instead of a list",
                other.kind()
            )));
        }
    };

    if items.len() != operations.len() {
        return Err(ShotgunError::response(format!(
            "batch sent {} requests but got {} results",
            operations.len(),
            items.len()
        )));
    }

    operations
        .iter()
        .zip(items)
        .map(|(operation, item)| match (operation, item) {
            (Operation::Delete { .. }, FieldValue::Bool(deleted)) => Ok(OperationResult::Deleted(deleted)),
            (Operation::Delete { .. }, other) => Err(ShotgunError::response(format!(
                "delete returned {} instead of a boolean",
                other.kind()
            ))),
            (_, FieldValue::Map(fields)) => Ok(OperationResult::Entity(Entity::from(fields))),
            (op, other) => Err(ShotgunError::response(format!(
                "{} returned {} instead of a record",
                op.operation_type(),
                other.kind()
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::datetime::LocalZone;
    use serde_json::json;

    #[test]
    fn test_missing_required_key() {
        let mut req = BatchRequest::new();
        assert!(validate(&[req.clone()]).unwrap_err().is_validation());

        req.entity_type = Some("Entity".to_string());
        assert!(validate(&[req.clone()]).is_err());

        req.request_type = Some("not_real_type".to_string());
        assert!(validate(&[req.clone()]).is_err());

        // create requires data
        req.request_type = Some("create".to_string());
        assert!(validate(&[req.clone()]).is_err());

        // update requires entity_id and data
        req.request_type = Some("update".to_string());
        req.data = Some(Entity::new());
        assert!(validate(&[req.clone()]).is_err());
        req.data = None;
        req.entity_id = Some(2334);
        assert!(validate(&[req.clone()]).is_err());

        // delete requires entity_id
        req.request_type = Some("delete".to_string());
        req.entity_id = None;
        assert!(validate(&[req.clone()]).is_err());
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let req = BatchRequest::new().request_type("").entity_type("Shot");
        assert!(validate(&[req]).is_err());
        let req = BatchRequest::new().request_type("delete").entity_type("").entity_id(1);
        assert!(validate(&[req]).is_err());
    }

    #[test]
    fn test_one_bad_request_rejects_the_batch() {
        let requests = vec![
            BatchRequest::new().request_type("delete").entity_type("Shot").entity_id(1),
            BatchRequest::new().request_type("create").entity_type("Shot"),
        ];
        let err = validate(&requests).unwrap_err();
        assert!(err.to_string().contains("batch request 1"));
    }

    #[test]
    fn test_valid_batch_keeps_order() {
        let requests = vec![
            BatchRequest::new()
                .request_type("create")
                .entity_type("Shot")
                .data(Entity::new().with("code", "a")),
            BatchRequest::new()
                .request_type("update")
                .entity_type("Shot")
                .entity_id(7)
                .data(Entity::new().with("code", "b")),
            BatchRequest::new().request_type("delete").entity_type("Shot").entity_id(8),
        ];
        let operations = validate(&requests).unwrap();
        let types: Vec<_> = operations.iter().map(Operation::operation_type).collect();
        assert_eq!(types, vec!["create", "update", "delete"]);

        let wire = to_wire(&operations, &DateTimeNormalizer::new(true, LocalZone::System)).unwrap();
        assert_eq!(wire[2], json!({"request_type": "delete", "type": "Shot", "id": 8}));
    }

    #[test]
    fn test_parse_results() {
        let operations = vec![
            Operation::create("Shot", Entity::new().with("code", "a")),
            Operation::delete("Shot", 8),
        ];
        let results = parse_results(
            &operations,
            FieldValue::from(json!([{"type": "Shot", "id": 9, "code": "a"}, true])),
        )
        .unwrap();
        assert_eq!(results[0].as_entity().and_then(Entity::id), Some(9));
        assert!(results[1].is_deleted());

        assert!(parse_results(&operations, FieldValue::from(json!([true]))).is_err());
        assert!(parse_results(&operations, FieldValue::from(json!([true, true]))).is_err());
    }
}
