use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One daily questionnaire submission. Every field is optional: a first
/// check-in, a partial answer set, or an empty form are all valid inputs.
/// Keys the scoring rules do not recognize are accepted and dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInAnswers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headache_severity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
    /// Arrives from intake forms as a string ("12") but tolerates a bare
    /// number too, so this stays a raw JSON value until coercion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kicks: Option<serde_json::Value>,
}

impl CheckInAnswers {
    /// Coerces the kick count to a number. Malformed or missing values
    /// yield None; callers treat that as "no answer".
    pub fn kick_count(&self) -> Option<f64> {
        match self.kicks.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Green => "GREEN",
            RiskLevel::Yellow => "YELLOW",
            RiskLevel::Orange => "ORANGE",
            RiskLevel::Red => "RED",
        }
    }

    /// Unrecognized text maps to RED so a corrupt row surfaces at the top
    /// of the roster instead of hiding in the stable tier.
    pub fn from_str_lossy(value: &str) -> RiskLevel {
        match value.to_ascii_uppercase().as_str() {
            "GREEN" => RiskLevel::Green,
            "YELLOW" => RiskLevel::Yellow,
            "ORANGE" => RiskLevel::Orange,
            _ => RiskLevel::Red,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one evaluation, append-only once persisted. Readers take the
/// most recent record per patient as "current risk".
#[derive(Debug, Clone)]
pub struct RiskRecord {
    pub patient_id: Uuid,
    pub score: i32,
    pub level: RiskLevel,
    pub insight: &'static str,
    pub triggers: Vec<&'static str>,
    pub created_at: DateTime<Utc>,
}

/// A persisted risk row joined to its patient, as read back for the
/// latest/roster/report views.
#[derive(Debug, Clone)]
pub struct RiskLogRow {
    pub patient_name: String,
    pub patient_email: String,
    pub score: i32,
    pub level: RiskLevel,
    pub insight: String,
    pub triggers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LevelSummary {
    pub level: RiskLevel,
    pub count: usize,
    pub avg_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kick_count_coerces_strings_and_numbers() {
        let from_string: CheckInAnswers = serde_json::from_value(json!({ "kicks": " 12 " })).unwrap();
        assert_eq!(from_string.kick_count(), Some(12.0));

        let from_number: CheckInAnswers = serde_json::from_value(json!({ "kicks": 7 })).unwrap();
        assert_eq!(from_number.kick_count(), Some(7.0));

        let garbled: CheckInAnswers =
            serde_json::from_value(json!({ "kicks": "twelve" })).unwrap();
        assert_eq!(garbled.kick_count(), None);

        let blank: CheckInAnswers = serde_json::from_value(json!({ "kicks": "" })).unwrap();
        assert_eq!(blank.kick_count(), None);
    }

    #[test]
    fn level_text_round_trips_case_insensitively() {
        assert_eq!(RiskLevel::from_str_lossy("RED"), RiskLevel::Red);
        assert_eq!(RiskLevel::from_str_lossy("orange"), RiskLevel::Orange);
        assert_eq!(RiskLevel::from_str_lossy("green"), RiskLevel::Green);
        assert_eq!(RiskLevel::Yellow.as_str(), "YELLOW");
    }

    #[test]
    fn unrecognized_level_text_reads_as_red() {
        // A corrupt or future level name must not hide in the stable tier.
        assert_eq!(RiskLevel::from_str_lossy("unknown"), RiskLevel::Red);
        assert_eq!(RiskLevel::from_str_lossy(""), RiskLevel::Red);
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(RiskLevel::Red > RiskLevel::Orange);
        assert!(RiskLevel::Orange > RiskLevel::Yellow);
        assert!(RiskLevel::Yellow > RiskLevel::Green);
    }
}
