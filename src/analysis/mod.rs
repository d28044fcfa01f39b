//! Analysis modules.
//!
//! Aggregations and the linear fit that turn loaded records into the
//! summary tables shown on each page.

pub mod aggregator;
pub mod engagement;
pub mod regression;

pub use aggregator::*;
pub use engagement::*;
pub use regression::*;
