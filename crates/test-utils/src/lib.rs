//! Shared test utilities for the helio-fetch workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Reference queries with known answers
//! - Deterministic time-range generators for sweep tests
//! - Assertions over query responses
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, RangeGenerator};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

pub use helio_common;

use helio_common::QueryResponse;

/// Panic unless rows are ordered by `Start Time`, ascending.
pub fn assert_sorted_by_start(response: &QueryResponse) {
    let starts: Vec<_> = response
        .iter()
        .map(|row| row.get("Start Time").and_then(|v| v.as_time()))
        .collect();
    for pair in starts.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "rows out of order: {:?} came before {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// Collect the `url` column as owned strings.
pub fn urls(response: &QueryResponse) -> Vec<String> {
    response
        .iter()
        .filter_map(|row| row.get("url").and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}

/// Macro to build a `TimeRange` from two time strings, panicking on bad input.
///
/// # Usage
///
/// ```
/// use test_utils::time_range;
///
/// let tr = time_range!("2012/10/4", "2012/10/5");
/// assert_eq!(tr.days().count(), 2);
/// ```
#[macro_export]
macro_rules! time_range {
    ($start:expr, $end:expr) => {{
        match $crate::helio_common::TimeRange::parse($start, $end) {
            Ok(tr) => tr,
            Err(e) => panic!("bad test time range {} - {}: {}", $start, $end, e),
        }
    }};
}
