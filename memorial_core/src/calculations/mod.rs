//! # Electrical Calculations
//!
//! Both calculations are pure functions of their inputs and the read-only
//! catalog:
//!
//! - [`dimensioning`] - components for one motor circuit
//! - [`summary`] - project totals over a list of motors
//!
//! Neither caches anything; callers recompute whenever the motor list
//! changes.

pub mod dimensioning;
pub mod summary;

// Re-export commonly used types
pub use dimensioning::{dimension, CableSizing, DimensioningResult};
pub use summary::{summarize, MotorCount, ProjectSummary};
