//! Data preparation for distribution comparisons and value summaries

pub mod compare;
pub mod counts;
pub mod stats;

pub use compare::*;
pub use counts::*;
pub use stats::*;
