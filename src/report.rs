use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{LevelSummary, RiskLevel, RiskLogRow};

pub fn summarize_by_level(logs: &[RiskLogRow]) -> Vec<LevelSummary> {
    let mut map: std::collections::HashMap<RiskLevel, (usize, i64)> =
        std::collections::HashMap::new();

    for log in logs {
        let entry = map.entry(log.level).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += log.score as i64;
    }

    let mut summaries: Vec<LevelSummary> = map
        .into_iter()
        .map(|(level, (count, total_score))| LevelSummary {
            level,
            count,
            avg_score: if count == 0 {
                0.0
            } else {
                total_score as f64 / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.level.cmp(&a.level));
    summaries
}

pub fn build_report(
    scope: Option<&str>,
    since_days: i64,
    cutoff: NaiveDate,
    logs: &[RiskLogRow],
    roster: &[RiskLogRow],
) -> String {
    let summaries = summarize_by_level(logs);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all patients");

    let _ = writeln!(output, "# Maternal Risk Watch Report");
    let _ = writeln!(
        output,
        "Generated for {} (last {} days, evaluations since {})",
        scope_label, since_days, cutoff
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Level Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No evaluations recorded for this window.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} evaluations (avg score {:.1})",
                summary.level, summary.count, summary.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Current Roster by Severity");

    if roster.is_empty() {
        let _ = writeln!(output, "No patients with evaluations yet.");
    } else {
        for entry in roster.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) {} score {} as of {}",
                entry.patient_name,
                entry.patient_email,
                entry.level,
                entry.score,
                entry.created_at.date_naive()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Insights");

    if logs.is_empty() {
        let _ = writeln!(output, "No evaluations recorded for this window.");
    } else {
        for log in logs.iter().take(5) {
            let triggers = if log.triggers.is_empty() {
                String::from("no triggers")
            } else {
                log.triggers.join(", ")
            };
            let _ = writeln!(
                output,
                "- {} [{}] on {}: {} ({})",
                log.patient_name,
                log.level,
                log.created_at.date_naive(),
                log.insight,
                triggers
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_log(level: RiskLevel, score: i32, days_ago: i64) -> RiskLogRow {
        RiskLogRow {
            patient_name: "Meera Sharma".to_string(),
            patient_email: "meera.sharma@example.com".to_string(),
            score,
            level,
            insight: "NOTE: Mild symptoms detected. Monitor closely and rest.".to_string(),
            triggers: vec!["Severe Swelling".to_string()],
            created_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn level_mix_counts_and_averages() {
        let logs = vec![
            sample_log(RiskLevel::Yellow, 30, 1),
            sample_log(RiskLevel::Yellow, 40, 2),
            sample_log(RiskLevel::Red, 90, 0),
        ];

        let summaries = summarize_by_level(&logs);
        assert_eq!(summaries.len(), 2);
        // Ordered most severe first.
        assert_eq!(summaries[0].level, RiskLevel::Red);
        assert_eq!(summaries[0].count, 1);
        assert_eq!(summaries[1].level, RiskLevel::Yellow);
        assert_eq!(summaries[1].count, 2);
        assert!((summaries[1].avg_score - 35.0).abs() < 0.001);
    }

    #[test]
    fn report_mentions_scope_and_sections() {
        let logs = vec![sample_log(RiskLevel::Yellow, 35, 1)];
        let cutoff = Utc::now().date_naive() - Duration::days(30);
        let report = build_report(Some("meera.sharma@example.com"), 30, cutoff, &logs, &logs);

        assert!(report.contains("# Maternal Risk Watch Report"));
        assert!(report.contains("meera.sharma@example.com"));
        assert!(report.contains("## Risk Level Mix"));
        assert!(report.contains("## Current Roster by Severity"));
        assert!(report.contains("## Recent Insights"));
        assert!(report.contains("Severe Swelling"));
    }

    #[test]
    fn empty_window_renders_placeholders() {
        let cutoff = Utc::now().date_naive() - Duration::days(30);
        let report = build_report(None, 30, cutoff, &[], &[]);
        assert!(report.contains("all patients"));
        assert!(report.contains("No evaluations recorded for this window."));
        assert!(report.contains("No patients with evaluations yet."));
    }
}
