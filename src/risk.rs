use chrono::Utc;
use uuid::Uuid;

use crate::models::{CheckInAnswers, RiskLevel, RiskRecord};

const INSIGHT_RED: &str =
    "CRITICAL: Severe risk factors detected. Please contact your doctor immediately.";
const INSIGHT_ORANGE: &str = "WARNING: Elevating risk markers. Schedule a BP checkup soon.";
const INSIGHT_YELLOW: &str = "NOTE: Mild symptoms detected. Monitor closely and rest.";
const INSIGHT_GREEN: &str = "Your metrics look stable. Keep tracking daily!";

/// Scores one check-in and stamps the resulting record. Pure apart from the
/// timestamp; persistence belongs to the caller.
pub fn evaluate(patient_id: Uuid, answers: &CheckInAnswers) -> RiskRecord {
    let (score, triggers) = score_answers(answers);
    let level = level_for(score);

    RiskRecord {
        patient_id,
        score,
        level,
        insight: insight_for(level),
        triggers,
        created_at: Utc::now(),
    }
}

/// Runs the scoring rules in their fixed order. All contributions are
/// additive except the critical-symptom branch, which overwrites the
/// accumulated score with exactly 90 so critical reports dominate whatever
/// ran before them.
pub fn score_answers(answers: &CheckInAnswers) -> (i32, Vec<&'static str>) {
    let mut score = 0;
    let mut triggers = Vec::new();

    if answers.headache == Some(true) {
        // Severity lives on a 1-10 scale; out-of-domain values are clamped
        // so a hostile document cannot overflow the score.
        let severity = answers.headache_severity.unwrap_or(5).clamp(1, 10);
        score += severity * 5;
        triggers.push("Persistent Headache");
    }

    if let Some(symptoms) = answers.symptoms.as_deref() {
        let has = |name: &str| symptoms.iter().any(|s| s == name);

        if !symptoms.is_empty() {
            if has("Vision changes") {
                score += 30;
                triggers.push("Vision Changes");
            }
            if has("Swelling in hands/feet") {
                score += 15;
                triggers.push("Severe Swelling");
            }
            if has("Severe abdominal pain") || has("Vaginal bleeding") {
                score = 90;
                triggers.push("Critical Symptoms Reported");
            }
        }
    }

    if let Some(kicks) = answers.kick_count() {
        if kicks < 10.0 {
            score += 20;
            triggers.push("Low Baby Movement");
        }
    }

    (score, triggers)
}

/// Thresholds are inclusive and checked descending, so 25 is already
/// YELLOW and 80 already RED.
pub fn level_for(score: i32) -> RiskLevel {
    match score {
        s if s >= 80 => RiskLevel::Red,
        s if s >= 50 => RiskLevel::Orange,
        s if s >= 25 => RiskLevel::Yellow,
        _ => RiskLevel::Green,
    }
}

/// One fixed message per level. Triggers never feed into this text; they
/// ride along on the record for operator-facing output only.
pub fn insight_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Red => INSIGHT_RED,
        RiskLevel::Orange => INSIGHT_ORANGE,
        RiskLevel::Yellow => INSIGHT_YELLOW,
        RiskLevel::Green => INSIGHT_GREEN,
    }
}
