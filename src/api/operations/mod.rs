//! Write operations
//!
//! Single operations and ordered collections of them, validated before
//! they are sent as one `batch` call.

pub mod batch;
pub mod operation;
pub mod operations;

pub use operation::{BatchRequest, Operation, OperationResult, field_list};
pub use operations::Operations;
