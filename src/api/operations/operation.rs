//! Core operation types for create, update and delete

use serde_json::{Map, Value, json};

use crate::api::datetime::DateTimeNormalizer;
use crate::api::entity::{Entity, FieldValue};
use crate::api::error::{Result, ShotgunError};

/// One batch entry as the caller writes it; nothing is checked yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequest {
    pub request_type: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub data: Option<Entity>,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_type(mut self, request_type: impl Into<String>) -> Self {
        self.request_type = Some(request_type.into());
        self
    }

    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn entity_id(mut self, entity_id: i64) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn data(mut self, data: Entity) -> Self {
        self.data = Some(data);
        self
    }

    /// Read a request from a JSON mapping; keys may be missing, but present
    /// keys must have the right shape
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ShotgunError::validation(format!("batch request must be a mapping, got {}", value)))?;

        let text = |key: &str| -> Result<Option<String>> {
            match map.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(ShotgunError::validation(format!("batch {} must be a string, got {}", key, other))),
            }
        };

        let entity_id = match map.get("entity_id") {
            None | Some(Value::Null) => None,
            Some(id) => Some(
                id.as_i64()
                    .ok_or_else(|| ShotgunError::validation(format!("batch entity_id must be an integer, got {}", id)))?,
            ),
        };

        let data = match map.get("data") {
            None | Some(Value::Null) => None,
            Some(data @ Value::Object(_)) => Entity::try_from(FieldValue::from(data.clone())).ok(),
            Some(other) => {
                return Err(ShotgunError::validation(format!("batch data must be a mapping, got {}", other)));
            }
        };

        Ok(Self {
            request_type: text("request_type")?,
            entity_type: text("entity_type")?,
            entity_id,
            data,
        })
    }

    pub fn list_from_value(value: &Value) -> Result<Vec<BatchRequest>> {
        value
            .as_array()
            .ok_or_else(|| ShotgunError::validation(format!("batch requests must be a list, got {}", value)))?
            .iter()
            .map(BatchRequest::from_value)
            .collect()
    }
}

/// A validated write operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create { entity_type: String, data: Entity },
    Update { entity_type: String, id: i64, data: Entity },
    Delete { entity_type: String, id: i64 },
}

impl Operation {
    pub fn create(entity_type: impl Into<String>, data: Entity) -> Self {
        Self::Create {
            entity_type: entity_type.into(),
            data,
        }
    }

    pub fn update(entity_type: impl Into<String>, id: i64, data: Entity) -> Self {
        Self::Update {
            entity_type: entity_type.into(),
            id,
            data,
        }
    }

    pub fn delete(entity_type: impl Into<String>, id: i64) -> Self {
        Self::Delete {
            entity_type: entity_type.into(),
            id,
        }
    }

    pub fn entity_type(&self) -> &str {
        match self {
            Self::Create { entity_type, .. } | Self::Update { entity_type, .. } | Self::Delete { entity_type, .. } => {
                entity_type
            }
        }
    }

    /// The `request_type` sent for this operation
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Batch entry wire form
    pub fn to_wire(&self, normalizer: &DateTimeNormalizer) -> Result<Value> {
        let mut entry = Map::new();
        entry.insert("request_type".to_string(), json!(self.operation_type()));
        entry.insert("type".to_string(), json!(self.entity_type()));

        match self {
            Self::Create { data, .. } => {
                entry.insert("fields".to_string(), field_list(data, normalizer)?);
            }
            Self::Update { id, data, .. } => {
                entry.insert("id".to_string(), json!(id));
                entry.insert("fields".to_string(), field_list(data, normalizer)?);
            }
            Self::Delete { id, .. } => {
                entry.insert("id".to_string(), json!(id));
            }
        }

        Ok(Value::Object(entry))
    }
}

/// Render record data as `[{field_name, value}]`
pub fn field_list(data: &Entity, normalizer: &DateTimeNormalizer) -> Result<Value> {
    data.fields()
        .iter()
        .map(|(field, value)| {
            Ok(json!({
                "field_name": field,
                "value": normalizer.to_wire_value(value)?,
            }))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Outcome of one operation of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// Created or updated record
    Entity(Entity),
    /// Whether a delete removed the record
    Deleted(bool),
}

impl OperationResult {
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Deleted(_) => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::datetime::LocalZone;
    use crate::api::entity::EntityRef;

    fn normalizer() -> DateTimeNormalizer {
        DateTimeNormalizer::new(true, LocalZone::System)
    }

    #[test]
    fn test_create_wire_form() {
        let op = Operation::create(
            "Shot",
            Entity::new().with("code", "sh010").with("project", EntityRef::new("Project", 4)),
        );
        assert_eq!(op.entity_type(), "Shot");
        assert_eq!(
            op.to_wire(&normalizer()).unwrap(),
            json!({
                "request_type": "create",
                "type": "Shot",
                "fields": [
                    {"field_name": "code", "value": "sh010"},
                    {"field_name": "project", "value": {"type": "Project", "id": 4}}
                ]
            })
        );
    }

    #[test]
    fn test_update_and_delete_wire_form() {
        let update = Operation::update("Shot", 12, Entity::new().with("description", "moved"));
        let wire = update.to_wire(&normalizer()).unwrap();
        assert_eq!(wire["id"], 12);
        assert_eq!(wire["fields"][0]["field_name"], "description");

        let delete = Operation::delete("Shot", 12);
        assert_eq!(
            delete.to_wire(&normalizer()).unwrap(),
            json!({"request_type": "delete", "type": "Shot", "id": 12})
        );
    }

    #[test]
    fn test_batch_request_from_value() {
        let request = BatchRequest::from_value(&json!({
            "request_type": "update",
            "entity_type": "Shot",
            "entity_id": 2334,
            "data": {"code": "sh030"}
        }))
        .unwrap();
        assert_eq!(request.entity_id, Some(2334));
        assert_eq!(request.data.unwrap().get("code"), Some(&FieldValue::from("sh030")));

        assert!(BatchRequest::from_value(&json!({})).unwrap().request_type.is_none());
        assert!(BatchRequest::from_value(&json!({"entity_id": "abc"})).is_err());
        assert!(BatchRequest::from_value(&json!({"data": [1]})).is_err());
        assert!(BatchRequest::list_from_value(&json!("nope")).is_err());
    }
}
