//! # Motor Dimensioning
//!
//! Derives the circuit components for one catalogued motor: conductor
//! cross-section, circuit breaker, contactor and starting method.
//!
//! `dimension` is total. Table overruns degrade to the largest cable or a
//! synthesized code and are reported in the result, never as errors.
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::calculations::dimensioning::dimension;
//! use memorial_core::catalog;
//! use memorial_core::policy::DimensioningPolicy;
//!
//! let policy = DimensioningPolicy::default();
//! let motor = catalog::lookup(10.0).unwrap();
//! let result = dimension(motor, &policy);
//!
//! assert_eq!(result.cable_size(), "6mm²");
//! assert_eq!(result.circuit_breaker(), "MPW18-16.9A");
//! assert_eq!(result.contactor, "CWM25");
//! assert_eq!(result.starter_label().as_deref(), Some("CHAVE: SSW07"));
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::MotorRating;
use crate::equipment::{breakers, contactors, starters};
use crate::equipment::{BreakerFamily, BreakerSelection, StarterRecommendation, StartingMethod};
use crate::policy::DimensioningPolicy;

/// How the conductor was sized.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "6mm²",
///   "section_mm2": 6.0,
///   "ampacity_a": 36.0,
///   "required_ampacity_a": 22.05,
///   "voltage_drop_section_mm2": 1.24,
///   "floor_section_mm2": 6.0,
///   "table_exhausted": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSizing {
    /// Display label of the chosen section
    pub label: String,
    /// Chosen cross-section (mm²)
    pub section_mm2: f64,
    /// Ampacity of the chosen section (A)
    pub ampacity_a: f64,
    /// In × ampacity margin (A)
    pub required_ampacity_a: f64,
    /// Minimum section from the voltage-drop criterion, when enabled (mm²)
    pub voltage_drop_section_mm2: Option<f64>,
    /// Power-band floor applied, if any (mm²)
    pub floor_section_mm2: Option<f64>,
    /// True when a requirement exceeded the table and the largest section was used
    pub table_exhausted: bool,
}

/// Components recommended for one motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensioningResult {
    /// Catalogue data of the motor
    pub motor: MotorRating,
    pub breaker: BreakerSelection,
    pub cable: CableSizing,
    /// Contactor model code
    pub contactor: String,
    /// Protection / efficiency classification label
    pub protection_type: String,
    /// Inverter or soft-starter; `None` for direct-on-line start
    pub starter: Option<StarterRecommendation>,
}

impl DimensioningResult {
    pub fn circuit_breaker(&self) -> &str {
        &self.breaker.label
    }

    pub fn cable_size(&self) -> &str {
        &self.cable.label
    }

    pub fn starter_label(&self) -> Option<String> {
        self.starter.as_ref().map(StarterRecommendation::label)
    }

    pub fn starting_method(&self) -> StartingMethod {
        self.starter
            .as_ref()
            .map_or(StartingMethod::DirectOnLine, StarterRecommendation::method)
    }

    pub fn has_soft_starter(&self) -> bool {
        matches!(self.starter, Some(StarterRecommendation::SoftStarter { .. }))
    }

    pub fn has_inverter(&self) -> bool {
        matches!(self.starter, Some(StarterRecommendation::Inverter { .. }))
    }
}

/// Dimension the circuit of one motor.
///
/// # Arguments
///
/// * `motor` - Catalogue entry of the motor
/// * `policy` - Margins, thresholds and component tables to apply
///
/// # Returns
///
/// The recommended cable, breaker, contactor, protection type and starter.
/// This never fails: a requirement beyond a table degrades to the largest
/// cable (flagged in `cable.table_exhausted`) or a synthesized contactor code.
///
/// # Example
///
/// ```rust
/// use memorial_core::calculations::dimensioning::dimension;
/// use memorial_core::catalog;
/// use memorial_core::equipment::StartingMethod;
/// use memorial_core::policy::DimensioningPolicy;
///
/// let result = dimension(catalog::lookup(1.0).unwrap(), &DimensioningPolicy::default());
/// assert_eq!(result.cable_size(), "2.5mm²");
/// assert_eq!(result.starting_method(), StartingMethod::Inverter);
/// ```
pub fn dimension(motor: &MotorRating, policy: &DimensioningPolicy) -> DimensioningResult {
    let cable = size_cable(motor, policy);
    let breaker = select_breaker(motor, policy);
    let contactor = contactors::select(
        motor.current_in_a * policy.contactor_margin,
        &policy.contactor_steps,
        &policy.contactor_prefix,
    );
    let starter = starters::recommend(
        motor.cv,
        policy.inverter_threshold_cv,
        policy.soft_starter_threshold_cv,
        &policy.inverter_model,
        &policy.soft_starter_model,
    );

    tracing::debug!(
        cv = motor.cv,
        current_in_a = motor.current_in_a,
        cable = %cable.label,
        breaker = %breaker.label,
        contactor = %contactor,
        "motor dimensioned"
    );

    DimensioningResult {
        motor: motor.clone(),
        breaker,
        cable,
        contactor,
        protection_type: policy.protection_type.clone(),
        starter,
    }
}

/// Size the motor's conductor.
///
/// The ampacity-driven section is raised to the voltage-drop section and
/// then to the power-band floor; a criterion can only enlarge the cable.
pub fn size_cable(motor: &MotorRating, policy: &DimensioningPolicy) -> CableSizing {
    let table = &policy.cable_table;
    let required_ampacity_a = motor.current_in_a * policy.cable_ampacity_margin;

    let by_ampacity = table.select(required_ampacity_a);
    let mut chosen = by_ampacity.section;
    let mut exhausted = by_ampacity.exhausted;

    let voltage_drop_section_mm2 = policy
        .voltage_drop
        .as_ref()
        .map(|vd| vd.min_section_mm2(motor.current_in_a, motor.power_factor));
    if let Some(min_section) = voltage_drop_section_mm2 {
        let by_drop = table.smallest_at_least(min_section);
        exhausted |= by_drop.exhausted;
        if by_drop.section.section_mm2 > chosen.section_mm2 {
            chosen = by_drop.section;
        }
    }

    let floor_section_mm2 = policy.floor_for(motor.cv);
    if let Some(floor) = floor_section_mm2 {
        let by_floor = table.smallest_at_least(floor);
        if by_floor.section.section_mm2 > chosen.section_mm2 {
            chosen = by_floor.section;
        }
    }

    if exhausted {
        tracing::warn!(
            cv = motor.cv,
            required_ampacity_a,
            section_mm2 = chosen.section_mm2,
            "cable table exhausted, using largest section"
        );
    }

    CableSizing {
        label: chosen.label(),
        section_mm2: chosen.section_mm2,
        ampacity_a: chosen.ampacity_a,
        required_ampacity_a,
        voltage_drop_section_mm2,
        floor_section_mm2,
        table_exhausted: exhausted,
    }
}

/// Motor protective breaker up to the family threshold, molded-case above it.
pub fn select_breaker(motor: &MotorRating, policy: &DimensioningPolicy) -> BreakerSelection {
    match breaker_family(motor.cv, policy) {
        BreakerFamily::MotorProtective => breakers::motor_protective(
            motor.current_in_a * policy.motor_protector_margin,
            &policy.motor_protector_frames,
        ),
        BreakerFamily::MoldedCase => breakers::molded_case(
            motor.current_in_a * policy.molded_case_margin,
            &policy.molded_case_prefix,
        ),
    }
}

/// Breaker family for a motor rating.
///
/// The threshold itself belongs to the motor protective family; only motors
/// strictly above it get a molded-case breaker.
///
/// # Example
///
/// ```rust
/// use memorial_core::calculations::dimensioning::breaker_family;
/// use memorial_core::equipment::BreakerFamily;
/// use memorial_core::policy::DimensioningPolicy;
///
/// let policy = DimensioningPolicy::default();
/// assert_eq!(breaker_family(40.0, &policy), BreakerFamily::MotorProtective);
/// assert_eq!(breaker_family(50.0, &policy), BreakerFamily::MoldedCase);
/// ```
pub fn breaker_family(cv: f64, policy: &DimensioningPolicy) -> BreakerFamily {
    if cv <= policy.breaker_family_threshold_cv {
        BreakerFamily::MotorProtective
    } else {
        BreakerFamily::MoldedCase
    }
}
