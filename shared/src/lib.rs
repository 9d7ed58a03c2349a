use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumCount, EnumString};

/// Label reported when the classifier abstains.
pub const NOT_RECOGNIZED: &str = "Not Recognized";

/// Classes the model was trained on. Declaration order is the model's output
/// order: score index 0 is `Fresh`, index 1 is `Rotten`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, AsRefStr, EnumCount)]
pub enum FruitClass {
    Fresh,
    Rotten,
}

impl FruitClass {
    pub const ALL: [FruitClass; 2] = [FruitClass::Fresh, FruitClass::Rotten];

    /// Class names in model output order.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|c| c.to_string()).collect()
    }
}

/// Body of a successful `POST /predict`.
///
/// Serializes as `{"class": "Fresh", "confidence": 97.31}` for an accepted
/// prediction and as `{"class": "Not Recognized"}` on abstention.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl PredictionResponse {
    pub fn recognized(class: impl Into<String>, confidence: f64) -> Self {
        Self {
            class: class.into(),
            confidence: Some(confidence),
        }
    }

    pub fn not_recognized() -> Self {
        Self {
            class: NOT_RECOGNIZED.to_string(),
            confidence: None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.class != NOT_RECOGNIZED
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Classifier settings currently in effect, served by `GET /api/labels`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LabelsResponse {
    pub class_names: Vec<String>,
    pub target_size: [u32; 2],
    pub confidence_threshold: f64,
    pub margin_threshold: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::EnumCount;

    #[test]
    fn label_table_matches_model_output_order() {
        assert_eq!(FruitClass::COUNT, FruitClass::ALL.len());
        for (i, class) in FruitClass::ALL.iter().enumerate() {
            assert_eq!(*class as usize, i);
        }
        assert_eq!(FruitClass::names(), vec!["Fresh", "Rotten"]);
    }

    #[test]
    fn class_names_parse_back() {
        assert_eq!(FruitClass::from_str("Rotten").unwrap(), FruitClass::Rotten);
        assert!(FruitClass::from_str("Banana").is_err());
    }

    #[test]
    fn abstention_omits_confidence() {
        let json = serde_json::to_value(PredictionResponse::not_recognized()).unwrap();
        assert_eq!(json, serde_json::json!({ "class": "Not Recognized" }));
    }

    #[test]
    fn recognized_carries_confidence() {
        let json = serde_json::to_value(PredictionResponse::recognized("Fresh", 97.31)).unwrap();
        assert_eq!(json, serde_json::json!({ "class": "Fresh", "confidence": 97.31 }));

        let back: PredictionResponse = serde_json::from_value(json).unwrap();
        assert!(back.is_recognized());
    }
}
