//! Client library for the Shotgun production-tracking JSON API

pub mod api;
pub mod config;

pub use api::{
    BatchRequest, Entity, EntityRef, FieldValue, Filter, FilterNode, FindRequest, Result, Shotgun, ShotgunError,
    SummaryField, SummaryRequest,
};
pub use config::Config;
