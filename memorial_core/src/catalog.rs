//! # Motor Catalog
//!
//! Reference data for the supported three-phase motors: WEG W22 IE3 Premium,
//! 4 poles, 60 Hz, nominal current at 380 V.
//!
//! The catalog is built once on first access and never mutated afterwards.
//! Entries are keyed by their power rating in cv; lookups are exact (a 7.4 cv
//! request does not match the 7.5 cv motor).
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::catalog;
//!
//! let motor = catalog::lookup(7.5).expect("7.5 cv is catalogued");
//! assert_eq!(motor.frame, "112M");
//!
//! assert!(catalog::lookup(9999.0).is_none());
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Line voltage the catalogued nominal currents refer to.
pub const REFERENCE_VOLTAGE_V: f64 = 380.0;

/// Rated data of one catalogued motor.
///
/// ## JSON Example
///
/// ```json
/// {
///   "cv": 10.0,
///   "kw": 7.5,
///   "model": "W22 IE3 Premium 10cv 4P",
///   "current_in_a": 14.7,
///   "efficiency_pct": 89.5,
///   "power_factor": 0.86,
///   "frame": "132S",
///   "weight_kg": 66.0,
///   "rpm": 1765
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorRating {
    /// Mechanical power in cv (metric horsepower), the catalog key
    pub cv: f64,

    /// Mechanical power in kW as printed on the datasheet
    pub kw: f64,

    /// Model designation
    pub model: String,

    /// Nominal (full-load) current at 380 V, amperes
    pub current_in_a: f64,

    /// Full-load efficiency (%)
    pub efficiency_pct: f64,

    /// Full-load power factor
    pub power_factor: f64,

    /// IEC frame size
    pub frame: String,

    /// Mass in kilograms
    pub weight_kg: f64,

    /// Rated speed (rpm)
    pub rpm: u32,
}

// cv, kW, In (A), efficiency (%), power factor, frame, weight (kg), rpm
const W22_IE3_4P: [(f64, f64, f64, f64, f64, &str, f64, u32); 28] = [
    (0.25, 0.18, 0.61, 69.5, 0.65, "63", 6.5, 1720),
    (0.33, 0.25, 0.78, 72.4, 0.68, "63", 7.0, 1720),
    (0.5, 0.37, 1.05, 78.0, 0.69, "71", 9.0, 1730),
    (0.75, 0.55, 1.42, 80.5, 0.73, "71", 10.5, 1730),
    (1.0, 0.75, 1.82, 82.5, 0.76, "80", 13.5, 1740),
    (1.5, 1.1, 2.51, 84.0, 0.79, "80", 15.0, 1740),
    (2.0, 1.5, 3.29, 85.5, 0.81, "90S", 20.0, 1745),
    (3.0, 2.2, 4.72, 86.5, 0.82, "90L", 24.0, 1750),
    (4.0, 3.0, 6.27, 87.5, 0.83, "100L", 31.0, 1755),
    (5.0, 3.7, 7.66, 87.5, 0.84, "100L", 34.0, 1755),
    (6.0, 4.5, 9.11, 88.5, 0.85, "112M", 42.0, 1760),
    (7.5, 5.5, 11.0, 89.5, 0.85, "112M", 46.0, 1760),
    (10.0, 7.5, 14.7, 89.5, 0.86, "132S", 66.0, 1765),
    (12.5, 9.2, 17.9, 90.2, 0.86, "132M", 75.0, 1765),
    (15.0, 11.0, 21.3, 91.0, 0.86, "132M", 80.0, 1770),
    (20.0, 15.0, 28.6, 91.0, 0.87, "160M", 118.0, 1770),
    (25.0, 18.5, 35.0, 91.7, 0.88, "160L", 132.0, 1770),
    (30.0, 22.0, 41.4, 92.4, 0.87, "180M", 170.0, 1775),
    (40.0, 30.0, 55.5, 93.0, 0.88, "200M", 230.0, 1775),
    (50.0, 37.0, 68.0, 93.0, 0.89, "200L", 255.0, 1780),
    (60.0, 45.0, 82.0, 93.6, 0.89, "225S/M", 355.0, 1780),
    (75.0, 55.0, 99.5, 94.1, 0.89, "225S/M", 380.0, 1780),
    (100.0, 75.0, 134.0, 94.5, 0.90, "250S/M", 490.0, 1785),
    (125.0, 90.0, 161.0, 94.5, 0.90, "280S/M", 650.0, 1785),
    (150.0, 110.0, 195.0, 95.0, 0.90, "280S/M", 700.0, 1785),
    (175.0, 132.0, 233.0, 95.0, 0.91, "315S/M", 950.0, 1785),
    (200.0, 150.0, 264.0, 95.4, 0.91, "315S/M", 1030.0, 1790),
    (250.0, 185.0, 325.0, 95.4, 0.91, "315S/M", 1120.0, 1790),
];

static CATALOG: Lazy<Vec<MotorRating>> = Lazy::new(|| {
    W22_IE3_4P
        .iter()
        .map(|&(cv, kw, current_in_a, efficiency_pct, power_factor, frame, weight_kg, rpm)| MotorRating {
            cv,
            kw,
            model: format!("W22 IE3 Premium {}cv 4P", format_cv(cv)),
            current_in_a,
            efficiency_pct,
            power_factor,
            frame: frame.to_string(),
            weight_kg,
            rpm,
        })
        .collect()
});

/// All catalogued motors, ascending by power rating.
pub fn all() -> &'static [MotorRating] {
    &CATALOG
}

/// Find the motor whose rating equals `cv` exactly.
///
/// Absence is a normal outcome; callers drop unresolved ratings rather than
/// aborting.
pub fn lookup(cv: f64) -> Option<&'static MotorRating> {
    CATALOG.iter().find(|m| m.cv == cv)
}

/// Like [`lookup`], but reports a missing rating as an error.
pub fn require(cv: f64) -> CalcResult<&'static MotorRating> {
    lookup(cv).ok_or_else(|| CalcError::motor_not_found(cv))
}

/// Resolve a sequence of power ratings, dropping the ones not catalogued.
///
/// Input order is preserved. Each dropped rating is logged at `warn`.
///
/// ```rust
/// use memorial_core::catalog;
///
/// let motors = catalog::resolve_all([10.0, 9999.0, 1.0]);
/// assert_eq!(motors.len(), 2);
/// assert_eq!(motors[0].cv, 10.0);
/// ```
pub fn resolve_all(cvs: impl IntoIterator<Item = f64>) -> Vec<MotorRating> {
    cvs.into_iter()
        .filter_map(|cv| {
            let motor = lookup(cv);
            if motor.is_none() {
                tracing::warn!(cv, "rating not in catalog, skipped");
            }
            motor.cloned()
        })
        .collect()
}

/// Format a power rating without trailing zeros ("7.5", "10", "0.33").
pub fn format_cv(cv: f64) -> String {
    if cv.fract() == 0.0 {
        format!("{:.0}", cv)
    } else {
        let s = format!("{:.2}", cv);
        s.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sorted_and_unique() {
        let motors = all();
        assert_eq!(motors.len(), 28);
        for pair in motors.windows(2) {
            assert!(pair[0].cv < pair[1].cv, "{} !< {}", pair[0].cv, pair[1].cv);
            assert!(pair[0].current_in_a < pair[1].current_in_a);
        }
    }

    #[test]
    fn test_lookup_exact() {
        let motor = lookup(10.0).unwrap();
        assert_eq!(motor.kw, 7.5);
        assert_eq!(motor.frame, "132S");
        assert_eq!(motor.model, "W22 IE3 Premium 10cv 4P");
        assert!((motor.current_in_a - 14.7).abs() < 1e-9);
    }

    #[test]
    fn test_lookup_not_found() {
        assert!(lookup(9999.0).is_none());
        // No nearest-match behaviour
        assert!(lookup(7.4).is_none());
    }

    #[test]
    fn test_require_reports_missing() {
        assert!(require(1.0).is_ok());
        let err = require(9999.0).unwrap_err();
        assert_eq!(err, CalcError::motor_not_found(9999.0));
    }

    #[test]
    fn test_resolve_all_preserves_order() {
        let motors = resolve_all(vec![20.0, 3.3, 0.5, 20.0]);
        let cvs: Vec<f64> = motors.iter().map(|m| m.cv).collect();
        assert_eq!(cvs, vec![20.0, 0.5, 20.0]);
    }

    #[test]
    fn test_resolve_all_only_unknown() {
        assert!(resolve_all(vec![9999.0, 42.0]).is_empty());
    }

    #[test]
    fn test_nominal_current_consistent_with_rating() {
        // In = P / (sqrt(3) * V * eff * pf), within datasheet rounding
        for m in all() {
            let computed = m.kw * 1000.0
                / (3f64.sqrt() * REFERENCE_VOLTAGE_V * m.efficiency_pct / 100.0 * m.power_factor);
            let deviation = (computed - m.current_in_a).abs() / m.current_in_a;
            assert!(deviation < 0.05, "{} cv: computed {:.2} A vs {:.2} A", m.cv, computed, m.current_in_a);
        }
    }

    #[test]
    fn test_format_cv() {
        assert_eq!(format_cv(10.0), "10");
        assert_eq!(format_cv(7.5), "7.5");
        assert_eq!(format_cv(0.33), "0.33");
        assert_eq!(format_cv(0.25), "0.25");
    }
}
