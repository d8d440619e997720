//! # Project Summary
//!
//! Rolls a list of motors up into project totals: installed power, nominal
//! current, estimated peak current and the recommended main breaker, plus
//! the per-motor dimensioning table.
//!
//! ## Peak current
//!
//! Only the motor with the largest nominal current is assumed to be starting
//! at the instant of peak demand; every other motor runs at nominal current:
//!
//! ```text
//! Ip = (ΣIn - In_max) + In_max × k_start
//! ```
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::calculations::summary::summarize;
//! use memorial_core::catalog;
//! use memorial_core::policy::DimensioningPolicy;
//!
//! let motors = catalog::resolve_all([10.0, 10.0, 5.0]);
//! let summary = summarize(&motors, &DimensioningPolicy::default());
//!
//! assert_eq!(summary.motor_count, 3);
//! assert_eq!(summary.total_cv, 25.0);
//! assert_eq!(summary.motor_list[0].cv, 10.0);
//! assert_eq!(summary.motor_list[0].count, 2);
//! ```

use serde::{Deserialize, Serialize};

use super::dimensioning::{dimension, DimensioningResult};
use crate::catalog::MotorRating;
use crate::equipment::breakers::{self, MainBreakerSelection};
use crate::policy::DimensioningPolicy;

/// Number of motors sharing one power rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorCount {
    pub cv: f64,
    pub count: usize,
}

/// Project-wide electrical summary.
///
/// Values are unrounded; presentation layers round for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub motor_count: usize,
    /// Distinct ratings with occurrence counts, largest rating first
    pub motor_list: Vec<MotorCount>,
    /// Σ cv
    pub total_cv: f64,
    /// Σ kW as catalogued
    pub total_kw: f64,
    /// Σ In (A)
    pub total_in_a: f64,
    /// Estimated peak current with the largest motor starting (A)
    pub total_ip_a: f64,
    pub main_breaker_a: u32,
    /// e.g. "Disjuntor Geral 125A"
    pub recommended_main_breaker: String,
    pub soft_starter_count: usize,
    pub inverter_count: usize,
    /// Per-motor dimensioning, in input order
    pub details: Vec<DimensioningResult>,
}

/// Summarize a list of already-resolved motors.
///
/// # Arguments
///
/// * `motors` - Catalogued motors, one entry per installed unit
/// * `policy` - Starting multiplier, main breaker margin and ratings, plus the
///   rules used for each motor's detail row
///
/// # Returns
///
/// Totals, the estimated peak current, the recommended main breaker and one
/// [`DimensioningResult`] per motor in input order. An empty list yields zero
/// totals and the smallest standard main breaker.
///
/// # Example
///
/// ```rust
/// use memorial_core::calculations::summary::summarize;
/// use memorial_core::catalog;
/// use memorial_core::policy::DimensioningPolicy;
///
/// let summary = summarize(&[], &DimensioningPolicy::default());
/// assert_eq!(summary.recommended_main_breaker, "Disjuntor Geral 40A");
///
/// let motors = catalog::resolve_all([25.0, 25.0, 25.0]);
/// let summary = summarize(&motors, &DimensioningPolicy::default());
/// assert_eq!(summary.main_breaker_a, 160);
/// ```
pub fn summarize(motors: &[MotorRating], policy: &DimensioningPolicy) -> ProjectSummary {
    let total_cv: f64 = motors.iter().map(|m| m.cv).sum();
    let total_kw: f64 = motors.iter().map(|m| m.kw).sum();
    let total_in_a: f64 = motors.iter().map(|m| m.current_in_a).sum();
    let total_ip_a = peak_current(motors, policy.starting_current_multiplier);

    let main = select_main_breaker(total_in_a, policy);
    let details: Vec<DimensioningResult> = motors.iter().map(|m| dimension(m, policy)).collect();

    let soft_starter_count = details.iter().filter(|d| d.has_soft_starter()).count();
    let inverter_count = details.iter().filter(|d| d.has_inverter()).count();

    tracing::debug!(
        motor_count = motors.len(),
        total_cv,
        total_in_a,
        total_ip_a,
        main_breaker_a = main.rated_a,
        "project summarized"
    );

    ProjectSummary {
        motor_count: motors.len(),
        motor_list: count_by_rating(motors),
        total_cv,
        total_kw,
        total_in_a,
        total_ip_a,
        main_breaker_a: main.rated_a,
        recommended_main_breaker: main.label(),
        soft_starter_count,
        inverter_count,
        details,
    }
}

/// Peak current with the largest motor starting and the rest at nominal.
pub fn peak_current(motors: &[MotorRating], starting_multiplier: f64) -> f64 {
    let total: f64 = motors.iter().map(|m| m.current_in_a).sum();
    let largest = motors
        .iter()
        .map(|m| m.current_in_a)
        .fold(0.0_f64, f64::max);
    (total - largest) + largest * starting_multiplier
}

/// Main breaker for a total nominal current, with the policy's margin.
pub fn select_main_breaker(total_in_a: f64, policy: &DimensioningPolicy) -> MainBreakerSelection {
    let required_a = total_in_a * policy.main_breaker_margin;
    let selection = breakers::main_breaker(
        required_a,
        &policy.main_breaker_ratings_a,
        policy.main_breaker_ceiling_a,
    );
    if selection.at_ceiling {
        tracing::warn!(
            required_a,
            ceiling_a = selection.rated_a,
            "load exceeds standard main breaker ratings"
        );
    }
    selection
}

fn count_by_rating(motors: &[MotorRating]) -> Vec<MotorCount> {
    let mut counts: Vec<MotorCount> = Vec::new();
    for motor in motors {
        match counts.iter_mut().find(|c| c.cv == motor.cv) {
            Some(entry) => entry.count += 1,
            None => counts.push(MotorCount { cv: motor.cv, count: 1 }),
        }
    }
    counts.sort_by(|a, b| b.cv.total_cmp(&a.cv));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn with_current(current_in_a: f64) -> MotorRating {
        let mut motor = catalog::lookup(5.0).unwrap().clone();
        motor.current_in_a = current_in_a;
        motor
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], &DimensioningPolicy::default());
        assert_eq!(summary.motor_count, 0);
        assert_eq!(summary.total_cv, 0.0);
        assert_eq!(summary.total_kw, 0.0);
        assert_eq!(summary.total_in_a, 0.0);
        assert_eq!(summary.total_ip_a, 0.0);
        assert!(summary.details.is_empty());
        assert!(summary.motor_list.is_empty());
        assert_eq!(summary.main_breaker_a, 40);
        assert_eq!(summary.recommended_main_breaker, "Disjuntor Geral 40A");
    }

    #[test]
    fn test_single_motor_totals() {
        let motor = catalog::lookup(0.33).unwrap().clone();
        let summary = summarize(std::slice::from_ref(&motor), &DimensioningPolicy::default());
        assert_eq!(summary.motor_count, 1);
        assert_eq!(summary.total_cv, motor.cv);
        assert_eq!(summary.total_kw, motor.kw);
        assert_eq!(summary.total_in_a, motor.current_in_a);
        assert!((summary.total_ip_a - motor.current_in_a * 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_peak_formula() {
        let motors = vec![with_current(5.0), with_current(20.0)];
        let summary = summarize(&motors, &DimensioningPolicy::default());
        assert_eq!(summary.total_ip_a, 155.0);
        assert_eq!(summary.total_in_a, 25.0);
    }

    #[test]
    fn test_peak_with_equal_largest() {
        // Only one of the two largest motors is starting
        let motors = vec![with_current(10.0), with_current(10.0), with_current(4.0)];
        assert_eq!(peak_current(&motors, 7.5), 10.0 + 4.0 + 75.0);
    }

    #[test]
    fn test_main_breaker_with_margin() {
        let policy = DimensioningPolicy::default();
        // 100 A × 1.25 = 125 A
        assert_eq!(select_main_breaker(100.0, &policy).rated_a, 125);
        // 3 × 35 A = 105 A × 1.25 = 131.25 A
        let motors = catalog::resolve_all([25.0, 25.0, 25.0]);
        let summary = summarize(&motors, &policy);
        assert_eq!(summary.main_breaker_a, 160);
        assert_eq!(summary.recommended_main_breaker, "Disjuntor Geral 160A");
    }

    #[test]
    fn test_main_breaker_ceiling() {
        let policy = DimensioningPolicy::default();
        let motors = catalog::resolve_all([250.0, 250.0, 250.0]);
        let summary = summarize(&motors, &policy);
        assert_eq!(summary.main_breaker_a, 1250);
    }

    #[test]
    fn test_details_preserve_input_order() {
        let motors = catalog::resolve_all([1.0, 50.0, 7.5, 1.0]);
        let summary = summarize(&motors, &DimensioningPolicy::default());
        let cvs: Vec<f64> = summary.details.iter().map(|d| d.motor.cv).collect();
        assert_eq!(cvs, vec![1.0, 50.0, 7.5, 1.0]);
    }

    #[test]
    fn test_motor_list_sorted_descending() {
        let motors = catalog::resolve_all([1.0, 50.0, 7.5, 1.0, 50.0, 1.0]);
        let summary = summarize(&motors, &DimensioningPolicy::default());
        assert_eq!(
            summary.motor_list,
            vec![
                MotorCount { cv: 50.0, count: 2 },
                MotorCount { cv: 7.5, count: 1 },
                MotorCount { cv: 1.0, count: 3 },
            ]
        );
    }

    #[test]
    fn test_starter_counts() {
        let motors = catalog::resolve_all([0.5, 1.0, 7.5, 10.0, 30.0]);
        let summary = summarize(&motors, &DimensioningPolicy::default());
        assert_eq!(summary.inverter_count, 2);
        assert_eq!(summary.soft_starter_count, 2);
    }

    #[test]
    fn test_kw_is_summed_not_converted() {
        let motors = catalog::resolve_all([10.0, 20.0]);
        let summary = summarize(&motors, &DimensioningPolicy::default());
        assert_eq!(summary.total_kw, 7.5 + 15.0);
    }

    #[test]
    fn test_idempotent() {
        let policy = DimensioningPolicy::default();
        let motors = catalog::resolve_all([0.75, 12.5, 60.0, 60.0]);
        let first = summarize(&motors, &policy);
        let second = summarize(&motors, &policy);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_unknown_ratings_give_empty_summary() {
        let motors = catalog::resolve_all([9999.0]);
        let summary = summarize(&motors, &DimensioningPolicy::default());
        assert_eq!(summary.motor_count, 0);
        assert_eq!(summary.total_cv, 0.0);
    }
}
