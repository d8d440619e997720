//! # Dimensioning Policy
//!
//! Every margin, threshold and table the dimensioning rules depend on lives
//! here as a named, serializable value. A memorial carries its policy in its
//! settings; the CLI can override it from a JSON file. Fields missing from a
//! JSON document take their default value, so partial overrides work:
//!
//! ```rust
//! use memorial_core::policy::DimensioningPolicy;
//!
//! let policy: DimensioningPolicy =
//!     serde_json::from_str(r#"{ "cable_ampacity_margin": 1.25 }"#).unwrap();
//! assert_eq!(policy.cable_ampacity_margin, 1.25);
//! assert_eq!(policy.starting_current_multiplier, 7.5);
//! ```
//!
//! ## Default rules
//!
//! - Cable: nominal current × 1.50 against the ampacity table, raised to the
//!   section that keeps voltage drop under 4 % over 50 m, raised again to
//!   the power-band floor.
//! - Breaker: up to and including 40 cv a motor protective breaker set to
//!   In × 1.15; above 40 cv a molded-case breaker of In × 1.40 rounded up to
//!   ten amperes.
//! - Contactor: In × 1.25 against the CWM steps.
//! - Starter: inverter from 1 cv, soft-starter from 10 cv.
//! - Project: inrush of the largest motor at 7.5 × In; main breaker at
//!   total In × 1.25.

use serde::{Deserialize, Serialize};

use crate::catalog::REFERENCE_VOLTAGE_V;
use crate::equipment::breakers::{
    default_motor_protector_frames, DEFAULT_MAIN_BREAKER_CEILING_A, DEFAULT_MAIN_BREAKER_RATINGS_A,
};
use crate::equipment::contactors::default_contactor_steps;
use crate::equipment::{BreakerFrame, CableCapacityTable, ContactorStep};
use crate::errors::{CalcError, CalcResult};

/// Resistivity of copper at operating temperature (Ω·mm²/m).
pub const COPPER_RESISTIVITY_OHM_MM2_PER_M: f64 = 0.0172;

/// Voltage-drop limit used as a second cable sizing criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropCriterion {
    /// Conductor resistivity (Ω·mm²/m)
    pub resistivity_ohm_mm2_per_m: f64,
    /// One-way circuit length assumed for every motor (m)
    pub distance_m: f64,
    /// Permissible drop, percent of line voltage
    pub max_drop_pct: f64,
    /// Line-to-line voltage (V)
    pub line_voltage_v: f64,
}

impl Default for VoltageDropCriterion {
    fn default() -> Self {
        VoltageDropCriterion {
            resistivity_ohm_mm2_per_m: COPPER_RESISTIVITY_OHM_MM2_PER_M,
            distance_m: 50.0,
            max_drop_pct: 4.0,
            line_voltage_v: REFERENCE_VOLTAGE_V,
        }
    }
}

impl VoltageDropCriterion {
    /// Minimum cross-section for a three-phase circuit:
    /// S = √3 · ρ · L · I · cosφ / ΔU
    pub fn min_section_mm2(&self, current_a: f64, power_factor: f64) -> f64 {
        let allowed_drop_v = self.line_voltage_v * self.max_drop_pct / 100.0;
        3f64.sqrt() * self.resistivity_ohm_mm2_per_m * self.distance_m * current_a * power_factor
            / allowed_drop_v
    }
}

/// Minimum cross-section for a power band `[min_cv, max_cv)`.
///
/// `max_cv: None` leaves the band open above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableFloor {
    /// Inclusive lower bound (cv)
    pub min_cv: f64,
    /// Exclusive upper bound (cv)
    pub max_cv: Option<f64>,
    /// Minimum cross-section inside the band (mm²)
    pub section_mm2: f64,
}

impl CableFloor {
    pub fn new(min_cv: f64, max_cv: Option<f64>, section_mm2: f64) -> Self {
        CableFloor {
            min_cv,
            max_cv,
            section_mm2,
        }
    }

    pub fn applies_to(&self, cv: f64) -> bool {
        cv >= self.min_cv && self.max_cv.map_or(true, |max| cv < max)
    }
}

fn default_cable_floors() -> Vec<CableFloor> {
    vec![
        CableFloor::new(0.0, Some(1.0), 1.5),
        CableFloor::new(1.0, Some(4.0), 2.5),
        CableFloor::new(4.0, Some(6.0), 4.0),
        CableFloor::new(6.0, Some(12.5), 6.0),
        CableFloor::new(12.5, Some(20.0), 10.0),
        CableFloor::new(20.0, Some(30.0), 16.0),
        CableFloor::new(30.0, Some(50.0), 25.0),
        CableFloor::new(50.0, Some(75.0), 35.0),
        CableFloor::new(75.0, None, 50.0),
    ]
}

/// Named constants and tables driving dimensioning and aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensioningPolicy {
    /// Required ampacity = In × this
    pub cable_ampacity_margin: f64,
    /// Optional voltage-drop criterion; the larger section wins
    pub voltage_drop: Option<VoltageDropCriterion>,
    /// Power-band minimum sections, applied after the current-driven choice
    pub cable_floors: Vec<CableFloor>,
    pub cable_table: CableCapacityTable,

    /// Motors strictly above this rating get a molded-case breaker
    pub breaker_family_threshold_cv: f64,
    /// Motor protective breaker setting = In × this
    pub motor_protector_margin: f64,
    pub motor_protector_frames: Vec<BreakerFrame>,
    /// Molded-case rating = In × this, rounded up to ten amperes
    pub molded_case_margin: f64,
    pub molded_case_prefix: String,

    /// Contactor requirement = In × this
    pub contactor_margin: f64,
    pub contactor_steps: Vec<ContactorStep>,
    /// Prefix of codes synthesized above the last step
    pub contactor_prefix: String,

    /// Lower bound of the inverter band
    pub inverter_threshold_cv: f64,
    /// Lower bound of the soft-starter band
    pub soft_starter_threshold_cv: f64,
    pub inverter_model: String,
    pub soft_starter_model: String,

    /// Starting current of the largest motor = In × this
    pub starting_current_multiplier: f64,
    /// Main breaker requirement = total In × this
    pub main_breaker_margin: f64,
    pub main_breaker_ratings_a: Vec<u32>,
    pub main_breaker_ceiling_a: u32,

    /// Classification printed in the protection column
    pub protection_type: String,
}

impl Default for DimensioningPolicy {
    fn default() -> Self {
        DimensioningPolicy {
            cable_ampacity_margin: 1.50,
            voltage_drop: Some(VoltageDropCriterion::default()),
            cable_floors: default_cable_floors(),
            cable_table: CableCapacityTable::default(),
            breaker_family_threshold_cv: 40.0,
            motor_protector_margin: 1.15,
            motor_protector_frames: default_motor_protector_frames(),
            molded_case_margin: 1.40,
            molded_case_prefix: "DWA".to_string(),
            contactor_margin: 1.25,
            contactor_steps: default_contactor_steps(),
            contactor_prefix: "CWM".to_string(),
            inverter_threshold_cv: 1.0,
            soft_starter_threshold_cv: 10.0,
            inverter_model: "CFW500".to_string(),
            soft_starter_model: "SSW07".to_string(),
            starting_current_multiplier: 7.5,
            main_breaker_margin: 1.25,
            main_breaker_ratings_a: DEFAULT_MAIN_BREAKER_RATINGS_A.to_vec(),
            main_breaker_ceiling_a: DEFAULT_MAIN_BREAKER_CEILING_A,
            protection_type: "W22 IE3".to_string(),
        }
    }
}

impl DimensioningPolicy {
    /// Largest floor section among the bands containing `cv`.
    pub fn floor_for(&self, cv: f64) -> Option<f64> {
        self.cable_floors
            .iter()
            .filter(|f| f.applies_to(cv))
            .map(|f| f.section_mm2)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
    }

    /// Validate margins, thresholds and table ordering.
    pub fn validate(&self) -> CalcResult<()> {
        let margins = [
            ("cable_ampacity_margin", self.cable_ampacity_margin),
            ("motor_protector_margin", self.motor_protector_margin),
            ("molded_case_margin", self.molded_case_margin),
            ("contactor_margin", self.contactor_margin),
            ("starting_current_multiplier", self.starting_current_multiplier),
            ("main_breaker_margin", self.main_breaker_margin),
        ];
        for (field, value) in margins {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Margin must be positive"));
            }
        }

        if let Some(vd) = &self.voltage_drop {
            let values = [
                ("voltage_drop.resistivity_ohm_mm2_per_m", vd.resistivity_ohm_mm2_per_m),
                ("voltage_drop.distance_m", vd.distance_m),
                ("voltage_drop.max_drop_pct", vd.max_drop_pct),
                ("voltage_drop.line_voltage_v", vd.line_voltage_v),
            ];
            for (field, value) in values {
                if !(value.is_finite() && value > 0.0) {
                    return Err(CalcError::invalid_input(field, value.to_string(), "Must be positive"));
                }
            }
        }

        let thresholds = [
            ("breaker_family_threshold_cv", self.breaker_family_threshold_cv),
            ("inverter_threshold_cv", self.inverter_threshold_cv),
            ("soft_starter_threshold_cv", self.soft_starter_threshold_cv),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Threshold must be finite",
                ));
            }
        }

        for floor in &self.cable_floors {
            let bounds_finite = floor.min_cv.is_finite() && floor.max_cv.map_or(true, f64::is_finite);
            if !bounds_finite || !floor.section_mm2.is_finite() {
                return Err(CalcError::invalid_input(
                    "cable_floors",
                    format!("[{}, {:?}) -> {}", floor.min_cv, floor.max_cv, floor.section_mm2),
                    "Band bounds and section must be finite",
                ));
            }
            if let Some(max) = floor.max_cv {
                if max <= floor.min_cv {
                    return Err(CalcError::invalid_input(
                        "cable_floors",
                        format!("[{}, {})", floor.min_cv, max),
                        "Band upper bound must exceed its lower bound",
                    ));
                }
            }
            if floor.section_mm2 <= 0.0 {
                return Err(CalcError::invalid_input(
                    "cable_floors",
                    floor.section_mm2.to_string(),
                    "Floor section must be positive",
                ));
            }
        }

        if self.inverter_threshold_cv > self.soft_starter_threshold_cv {
            return Err(CalcError::invalid_input(
                "inverter_threshold_cv",
                self.inverter_threshold_cv.to_string(),
                "Inverter band must start at or below the soft-starter band",
            ));
        }

        if !is_strictly_increasing(self.motor_protector_frames.iter().map(|f| f.max_a)) {
            return Err(CalcError::invalid_input(
                "motor_protector_frames",
                format!("{} frames", self.motor_protector_frames.len()),
                "Frames must be ordered by ascending current",
            ));
        }
        if !is_strictly_increasing(self.contactor_steps.iter().map(|s| s.rated_a)) {
            return Err(CalcError::invalid_input(
                "contactor_steps",
                format!("{} steps", self.contactor_steps.len()),
                "Steps must be ordered by ascending current",
            ));
        }
        if !is_strictly_increasing(self.main_breaker_ratings_a.iter().map(|&r| f64::from(r))) {
            return Err(CalcError::invalid_input(
                "main_breaker_ratings_a",
                format!("{:?}", self.main_breaker_ratings_a),
                "Ratings must be strictly ascending",
            ));
        }
        if let Some(&largest) = self.main_breaker_ratings_a.last() {
            if self.main_breaker_ceiling_a < largest {
                return Err(CalcError::invalid_input(
                    "main_breaker_ceiling_a",
                    self.main_breaker_ceiling_a.to_string(),
                    "Ceiling must not be below the largest standard rating",
                ));
            }
        }

        Ok(())
    }
}

fn is_strictly_increasing(values: impl Iterator<Item = f64>) -> bool {
    let values: Vec<f64> = values.collect();
    values.windows(2).all(|pair| pair[1] > pair[0])
}
