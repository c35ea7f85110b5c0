//! Collections of operations sent together through `batch`

use super::batch;
use super::operation::{BatchRequest, Operation};
use crate::api::entity::Entity;
use crate::api::error::Result;

/// An ordered collection of operations executed as one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operations {
    operations: Vec<Operation>,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Validate raw requests into a collection
    pub fn from_requests(requests: &[BatchRequest]) -> Result<Self> {
        batch::validate(requests).map(Self::from_operations)
    }

    pub fn add(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn create(mut self, entity_type: impl Into<String>, data: Entity) -> Self {
        self.operations.push(Operation::create(entity_type, data));
        self
    }

    pub fn update(mut self, entity_type: impl Into<String>, id: i64, data: Entity) -> Self {
        self.operations.push(Operation::update(entity_type, id, data));
        self
    }

    pub fn delete(mut self, entity_type: impl Into<String>, id: i64) -> Self {
        self.operations.push(Operation::delete(entity_type, id));
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Append another collection, keeping order
    pub fn extend(mut self, other: Operations) -> Self {
        self.operations.extend(other.operations);
        self
    }
}

impl From<Operation> for Operations {
    fn from(operation: Operation) -> Self {
        Self::from_operations(vec![operation])
    }
}

impl From<Vec<Operation>> for Operations {
    fn from(operations: Vec<Operation>) -> Self {
        Self::from_operations(operations)
    }
}

impl IntoIterator for Operations {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Operations {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let ops = Operations::new()
            .create("Shot", Entity::new().with("code", "sh010"))
            .update("Shot", 3, Entity::new().with("code", "sh020"))
            .delete("Asset", 4);

        assert_eq!(ops.len(), 3);
        let types: Vec<_> = ops.operations().iter().map(Operation::operation_type).collect();
        assert_eq!(types, vec!["create", "update", "delete"]);
        assert_eq!(ops.operations()[2].entity_type(), "Asset");
    }

    #[test]
    fn test_extend_and_conversions() {
        let first: Operations = Operation::delete("Shot", 1).into();
        let second: Operations = vec![Operation::delete("Shot", 2), Operation::delete("Shot", 3)].into();
        let all = first.extend(second);
        assert_eq!(all.len(), 3);
        assert_eq!(all.into_iter().count(), 3);
        assert!(Operations::new().is_empty());
    }

    #[test]
    fn test_from_requests_validates() {
        let ok = Operations::from_requests(&[BatchRequest::new().request_type("delete").entity_type("Shot").entity_id(1)]);
        assert_eq!(ok.unwrap().len(), 1);

        let bad = Operations::from_requests(&[BatchRequest::new().entity_type("Shot")]);
        assert!(bad.unwrap_err().is_validation());
    }
}
