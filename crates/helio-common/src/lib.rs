//! Common types and utilities shared across the helio-fetch crates.

pub mod attrs;
pub mod error;
pub mod response;
pub mod time;

pub use attrs::{Attr, AttrKind, Query, QueryOr};
pub use error::{HelioError, HelioResult};
pub use response::{path_format_key, QueryResponse, QueryResponseRow, ResponseTable, Value};
pub use time::{parse_time, TimeRange};
