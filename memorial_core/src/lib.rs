//! # memorial_core - Motor Circuit Dimensioning Engine
//!
//! `memorial_core` dimensions low-voltage three-phase motor circuits (cable,
//! breaker, contactor, starter) from a catalog of premium-efficiency motors,
//! rolls a motor list up into project totals, and keeps the technical
//! memorial document those results are presented in.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Calculations are pure functions of a motor and a policy
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Configurable**: Every threshold lives in [`policy::DimensioningPolicy`]
//!
//! ## Quick Start
//!
//! ```rust
//! use memorial_core::{catalog, dimension, DimensioningPolicy};
//!
//! let motor = catalog::lookup(10.0).unwrap();
//! let result = dimension(motor, &DimensioningPolicy::default());
//!
//! assert_eq!(result.cable_size(), "6mm²");
//! assert_eq!(result.contactor, "CWM25");
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Read-only motor catalog
//! - [`equipment`] - Cable, breaker, contactor and starter tables
//! - [`policy`] - Dimensioning thresholds and margins
//! - [`calculations`] - Per-motor dimensioning and project summary
//! - [`memorial`] - Document model (pages and blocks)
//! - [`conclusion`] - Technical opinion generation
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`pdf`] - PDF export

pub mod calculations;
pub mod catalog;
pub mod conclusion;
pub mod equipment;
pub mod errors;
pub mod file_io;
pub mod memorial;
pub mod pdf;
pub mod policy;

// Re-export commonly used types at crate root for convenience
pub use calculations::{dimension, summarize, DimensioningResult, ProjectSummary};
pub use catalog::MotorRating;
pub use errors::{CalcError, CalcResult};
pub use file_io::{create_memorial, load_memorial, load_policy, save_memorial, FileLock};
pub use memorial::{Block, BlockKind, ComparisonData, Memorial};
pub use policy::DimensioningPolicy;
