//! Shotgun JSON API client
//!
//! Requests are built and validated locally, sent as JSON-RPC calls through
//! a [`Transport`], and their results normalized back into client values
//! under the client's datetime policy.

pub mod capabilities;
pub mod client;
pub mod constants;
pub mod datetime;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod logging;
pub mod models;
pub mod operations;
pub mod query;
pub mod transport;

pub use capabilities::{ClientCapabilities, ClientPlatform, Feature, ServerCapabilities, ServerVersion};
pub use client::Shotgun;
pub use datetime::{DateTimeNormalizer, DateTimeValue, LocalZone};
pub use dispatcher::RequestDispatcher;
pub use entity::{Entity, EntityRef, FieldValue};
pub use error::{Result, ShotgunError};
pub use logging::{ApiLogger, LogLevel, MonitoringConfig};
pub use models::Credentials;
pub use operations::{BatchRequest, Operation, OperationResult, Operations};
pub use query::{
    Filter, FilterNode, FilterTree, FindRequest, Grouping, LogicalOperator, OrderBy, SortDirection, SummaryField,
    SummaryRequest, SummaryResult,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport, UploadRequest};
