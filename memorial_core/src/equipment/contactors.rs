//! Contactor step table (AC-3 rated current -> model code).

use serde::{Deserialize, Serialize};

use super::round_up_to_ten;

/// One size of the contactor line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactorStep {
    /// AC-3 rated current (A)
    pub rated_a: f64,
    /// Model code, e.g. "CWM25"
    pub code: String,
}

impl ContactorStep {
    pub fn new(rated_a: f64, code: impl Into<String>) -> Self {
        ContactorStep {
            rated_a,
            code: code.into(),
        }
    }
}

/// WEG CWM line.
pub fn default_contactor_steps() -> Vec<ContactorStep> {
    [9.0, 12.0, 18.0, 25.0, 32.0, 40.0, 50.0, 65.0, 80.0, 95.0, 105.0]
        .iter()
        .map(|&rated_a| ContactorStep::new(rated_a, format!("CWM{}", rated_a as u32)))
        .collect()
}

/// Smallest contactor rated for `required_a`.
///
/// Above the last step a code is synthesized from `prefix` and the
/// requirement rounded up to ten amperes ("CWM170").
pub fn select(required_a: f64, steps: &[ContactorStep], prefix: &str) -> String {
    match steps.iter().find(|s| s.rated_a >= required_a) {
        Some(step) => step.code.clone(),
        None => format!("{}{}", prefix, round_up_to_ten(required_a)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_codes() {
        let steps = default_contactor_steps();
        assert_eq!(steps.first().unwrap().code, "CWM9");
        assert_eq!(steps.last().unwrap().code, "CWM105");
    }

    #[test]
    fn test_select_steps() {
        let steps = default_contactor_steps();
        assert_eq!(select(2.275, &steps, "CWM"), "CWM9");
        assert_eq!(select(9.0, &steps, "CWM"), "CWM9");
        assert_eq!(select(18.375, &steps, "CWM"), "CWM25");
        assert_eq!(select(105.0, &steps, "CWM"), "CWM105");
    }

    #[test]
    fn test_select_synthesizes_above_table() {
        let steps = default_contactor_steps();
        assert_eq!(select(167.5, &steps, "CWM"), "CWM170");
        assert_eq!(select(406.25, &steps, "CWM"), "CWM410");
        assert_eq!(select(12.0, &[], "CWM"), "CWM20");
    }
}
