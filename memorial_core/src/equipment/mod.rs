//! # Equipment Tables
//!
//! Component selection tables for motor circuits: conductor ampacity,
//! circuit breakers, contactors and starters.
//!
//! Each table selects the smallest component that covers a required current.
//! None of them fail when the requirement exceeds the table; they degrade to
//! the largest entry (cables), a synthesized code (contactors) or a ceiling
//! rating (main breaker) and flag that they did so.
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::equipment::CableCapacityTable;
//!
//! let table = CableCapacityTable::default();
//! let selection = table.select(30.0);
//! assert_eq!(selection.section.section_mm2, 6.0);
//! assert!(!selection.exhausted);
//! ```

pub mod breakers;
pub mod cables;
pub mod contactors;
pub mod starters;

pub use breakers::{BreakerFamily, BreakerFrame, BreakerSelection, MainBreakerSelection};
pub use cables::{CableCapacityTable, CableSection, CableSelection};
pub use contactors::ContactorStep;
pub use starters::{StarterRecommendation, StartingMethod};

/// Round a current up to the next multiple of ten amperes.
///
/// Exact multiples are kept (50.0 -> 50).
pub fn round_up_to_ten(current_a: f64) -> u32 {
    if current_a <= 0.0 {
        return 0;
    }
    ((current_a / 10.0).ceil() * 10.0) as u32
}
