//! Circuit breakers: per-motor protection and the project's main breaker.

use serde::{Deserialize, Serialize};

use super::round_up_to_ten;

/// Breaker family chosen for a motor circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakerFamily {
    /// Motor protective circuit breaker (thermal + magnetic, adjustable)
    MotorProtective,
    /// Molded-case circuit breaker
    MoldedCase,
}

impl BreakerFamily {
    /// Portuguese name printed next to the breaker designation
    pub fn display_name(&self) -> &'static str {
        match self {
            BreakerFamily::MotorProtective => "Disjuntor motor",
            BreakerFamily::MoldedCase => "Disjuntor caixa moldada",
        }
    }
}

/// A motor protective breaker frame and the highest setting it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerFrame {
    pub name: String,
    pub max_a: f64,
}

impl BreakerFrame {
    pub fn new(name: impl Into<String>, max_a: f64) -> Self {
        BreakerFrame {
            name: name.into(),
            max_a,
        }
    }
}

/// WEG MPW frames.
pub fn default_motor_protector_frames() -> Vec<BreakerFrame> {
    vec![
        BreakerFrame::new("MPW12", 12.0),
        BreakerFrame::new("MPW18", 18.0),
        BreakerFrame::new("MPW40", 40.0),
        BreakerFrame::new("MPW65", 65.0),
        BreakerFrame::new("MPW80", 80.0),
        BreakerFrame::new("MPW100", 100.0),
    ]
}

/// Standard main breaker ratings (A).
pub const DEFAULT_MAIN_BREAKER_RATINGS_A: [u32; 10] = [40, 63, 100, 125, 160, 200, 250, 400, 630, 800];

/// Rating used when the load exceeds every standard rating.
pub const DEFAULT_MAIN_BREAKER_CEILING_A: u32 = 1250;

/// Breaker chosen for one motor circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerSelection {
    pub family: BreakerFamily,
    /// Designation, e.g. "MPW18-16.9A" or "DWA-80A"
    pub label: String,
    /// Thermal setting (motor protective) or rated current (molded case)
    pub rated_a: f64,
}

/// Motor protective breaker set to `setting_a`, in the smallest frame that covers it.
///
/// Settings above the largest frame stay in the largest frame.
pub fn motor_protective(setting_a: f64, frames: &[BreakerFrame]) -> BreakerSelection {
    let frame = frames
        .iter()
        .find(|f| f.max_a >= setting_a)
        .or_else(|| frames.last())
        .map(|f| f.name.as_str())
        .unwrap_or("MPW");

    BreakerSelection {
        family: BreakerFamily::MotorProtective,
        label: format!("{}-{:.1}A", frame, setting_a),
        rated_a: setting_a,
    }
}

/// Molded-case breaker rated at `required_a` rounded up to a multiple of ten.
pub fn molded_case(required_a: f64, prefix: &str) -> BreakerSelection {
    let rated = round_up_to_ten(required_a);
    BreakerSelection {
        family: BreakerFamily::MoldedCase,
        label: format!("{}-{}A", prefix, rated),
        rated_a: f64::from(rated),
    }
}

/// Main breaker chosen for the whole project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainBreakerSelection {
    pub rated_a: u32,
    /// True when no standard rating was large enough and the ceiling was used
    pub at_ceiling: bool,
}

impl MainBreakerSelection {
    pub fn label(&self) -> String {
        format!("Disjuntor Geral {}A", self.rated_a)
    }
}

/// Smallest standard rating of at least `required_a`, or `ceiling_a`.
pub fn main_breaker(required_a: f64, ratings_a: &[u32], ceiling_a: u32) -> MainBreakerSelection {
    match ratings_a.iter().find(|&&r| f64::from(r) >= required_a) {
        Some(&rated_a) => MainBreakerSelection {
            rated_a,
            at_ceiling: false,
        },
        None => MainBreakerSelection {
            rated_a: ceiling_a,
            at_ceiling: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_display_names() {
        let frames = default_motor_protector_frames();
        assert_eq!(
            motor_protective(10.0, &frames).family.display_name(),
            "Disjuntor motor"
        );
        assert_eq!(
            molded_case(77.7, "DWA").family.display_name(),
            "Disjuntor caixa moldada"
        );
    }

    #[test]
    fn test_motor_protective_frame_selection() {
        let frames = default_motor_protector_frames();
        assert_eq!(motor_protective(2.093, &frames).label, "MPW12-2.1A");
        assert_eq!(motor_protective(12.0, &frames).label, "MPW12-12.0A");
        assert_eq!(motor_protective(47.61, &frames).label, "MPW65-47.6A");
    }

    #[test]
    fn test_motor_protective_beyond_largest_frame() {
        let frames = default_motor_protector_frames();
        let selection = motor_protective(120.0, &frames);
        assert_eq!(selection.label, "MPW100-120.0A");
        assert_eq!(motor_protective(5.0, &[]).label, "MPW-5.0A");
    }

    #[test]
    fn test_molded_case_rounds_up() {
        let selection = molded_case(77.7, "DWA");
        assert_eq!(selection.label, "DWA-80A");
        assert_eq!(selection.rated_a, 80.0);
        assert_eq!(selection.family, BreakerFamily::MoldedCase);
    }

    #[test]
    fn test_main_breaker_selection() {
        let pick = main_breaker(125.0, &DEFAULT_MAIN_BREAKER_RATINGS_A, DEFAULT_MAIN_BREAKER_CEILING_A);
        assert_eq!(pick.rated_a, 125);
        assert!(!pick.at_ceiling);
        assert_eq!(pick.label(), "Disjuntor Geral 125A");

        let pick = main_breaker(125.5, &DEFAULT_MAIN_BREAKER_RATINGS_A, DEFAULT_MAIN_BREAKER_CEILING_A);
        assert_eq!(pick.rated_a, 160);
    }

    #[test]
    fn test_main_breaker_ceiling() {
        let pick = main_breaker(900.0, &DEFAULT_MAIN_BREAKER_RATINGS_A, DEFAULT_MAIN_BREAKER_CEILING_A);
        assert_eq!(pick.rated_a, 1250);
        assert!(pick.at_ceiling);
    }

    #[test]
    fn test_main_breaker_zero_load() {
        let pick = main_breaker(0.0, &DEFAULT_MAIN_BREAKER_RATINGS_A, DEFAULT_MAIN_BREAKER_CEILING_A);
        assert_eq!(pick.rated_a, 40);
    }
}
