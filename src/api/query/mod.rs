//! Read and aggregate request building
//!
//! Filters compile into the canonical filter tree, [`FindRequest`] drives
//! `read` with paging and [`SummaryRequest`] drives `summarize`.

pub mod builder;
pub mod filters;
pub mod orderby;
pub mod result;
pub mod summary;

pub use builder::{FindRequest, ReadPlan};
pub use filters::{Arity, Filter, FilterNode, FilterTree, LogicalOperator};
pub use orderby::{OrderBy, OrderByClause, SortDirection};
pub use result::{ReadPage, SummaryGroup, SummaryResult};
pub use summary::{Grouping, SummaryField, SummaryRequest};
