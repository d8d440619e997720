//! Starting method recommendation.

use serde::{Deserialize, Serialize};

/// Reduced-current starter recommended for a motor.
///
/// A motor gets at most one of these; direct-on-line motors get none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StarterRecommendation {
    /// Variable-frequency drive
    Inverter { model: String },
    /// Soft-starter
    SoftStarter { model: String },
}

impl StarterRecommendation {
    pub fn model(&self) -> &str {
        match self {
            StarterRecommendation::Inverter { model } | StarterRecommendation::SoftStarter { model } => model,
        }
    }

    /// Display label, e.g. "INVERSOR: CFW500"
    pub fn label(&self) -> String {
        match self {
            StarterRecommendation::Inverter { model } => format!("INVERSOR: {}", model),
            StarterRecommendation::SoftStarter { model } => format!("CHAVE: {}", model),
        }
    }

    pub fn method(&self) -> StartingMethod {
        match self {
            StarterRecommendation::Inverter { .. } => StartingMethod::Inverter,
            StarterRecommendation::SoftStarter { .. } => StartingMethod::SoftStarter,
        }
    }
}

/// How the motor is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartingMethod {
    DirectOnLine,
    Inverter,
    SoftStarter,
}

impl StartingMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            StartingMethod::DirectOnLine => "DIRETA",
            StartingMethod::Inverter => "INVERSOR",
            StartingMethod::SoftStarter => "SOFT-STARTER",
        }
    }
}

/// Band rule: `[inverter_from_cv, soft_starter_from_cv)` gets an inverter,
/// `soft_starter_from_cv` and above a soft-starter, anything smaller starts
/// direct-on-line.
pub fn recommend(
    cv: f64,
    inverter_from_cv: f64,
    soft_starter_from_cv: f64,
    inverter_model: &str,
    soft_starter_model: &str,
) -> Option<StarterRecommendation> {
    if cv >= soft_starter_from_cv {
        Some(StarterRecommendation::SoftStarter {
            model: soft_starter_model.to_string(),
        })
    } else if cv >= inverter_from_cv {
        Some(StarterRecommendation::Inverter {
            model: inverter_model.to_string(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(cv: f64) -> Option<StarterRecommendation> {
        recommend(cv, 1.0, 10.0, "CFW500", "SSW07")
    }

    #[test]
    fn test_bands() {
        assert_eq!(pick(0.75), None);
        assert_eq!(pick(1.0).unwrap().method(), StartingMethod::Inverter);
        assert_eq!(pick(7.5).unwrap().method(), StartingMethod::Inverter);
        assert_eq!(pick(10.0).unwrap().method(), StartingMethod::SoftStarter);
        assert_eq!(pick(250.0).unwrap().model(), "SSW07");
    }

    #[test]
    fn test_labels() {
        assert_eq!(pick(5.0).unwrap().label(), "INVERSOR: CFW500");
        assert_eq!(pick(15.0).unwrap().label(), "CHAVE: SSW07");
        assert_eq!(StartingMethod::DirectOnLine.display_name(), "DIRETA");
    }

    #[test]
    fn test_serialization_tag() {
        let json = serde_json::to_string(&pick(15.0).unwrap()).unwrap();
        assert_eq!(json, r#"{"kind":"soft_starter","model":"SSW07"}"#);
    }
}
