//! Drill-down aggregate: from an activated data point to its transactions.

pub mod entities;
pub mod modal;

pub use entities::*;
pub use modal::*;
