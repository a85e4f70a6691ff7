use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{CheckInAnswers, RiskLevel, RiskLogRow, RiskRecord};
use crate::risk;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let patients = vec![
        (
            Uuid::parse_str("7b1e9a44-5c0d-4f8a-9f2e-1d3c55a6e0b1")?,
            "Meera Sharma",
            "meera.sharma@example.com",
            NaiveDate::from_ymd_opt(2026, 11, 14).context("invalid date")?,
        ),
        (
            Uuid::parse_str("4f62c8d0-13b7-4a59-b6f1-77a2d94c3e85")?,
            "Ana Costa",
            "ana.costa@example.com",
            NaiveDate::from_ymd_opt(2026, 12, 2).context("invalid date")?,
        ),
        (
            Uuid::parse_str("c98d2a77-e4f0-42bb-8d64-0b51c2a9f316")?,
            "Fatima Noor",
            "fatima.noor@example.com",
            NaiveDate::from_ymd_opt(2027, 1, 20).context("invalid date")?,
        ),
    ];

    for (id, name, email, due_date) in patients {
        sqlx::query(
            r#"
            INSERT INTO maternal_risk_watch.patients (id, full_name, email, due_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, due_date = EXCLUDED.due_date
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(due_date)
        .fetch_one(pool)
        .await?;
    }

    let check_ins = vec![
        (
            "meera.sharma@example.com",
            serde_json::json!({ "headache": false, "kicks": "14" }),
        ),
        (
            "ana.costa@example.com",
            serde_json::json!({ "headache": true, "headache_severity": 4, "kicks": "11" }),
        ),
        (
            "fatima.noor@example.com",
            serde_json::json!({
                "headache": true,
                "headache_severity": 7,
                "symptoms": ["Swelling in hands/feet"],
                "kicks": "8"
            }),
        ),
    ];

    for (email, raw) in check_ins {
        let patient_id = find_patient(pool, email)
            .await?
            .context("seed patient missing")?;
        let answers: CheckInAnswers = serde_json::from_value(raw)?;
        insert_check_in(pool, patient_id, &answers).await?;
        let record = risk::evaluate(patient_id, &answers);
        insert_risk_log(pool, &record).await?;
    }

    Ok(())
}

pub async fn find_patient(pool: &PgPool, email: &str) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM maternal_risk_watch.patients WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get("id")))
}

pub async fn upsert_patient(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    due_date: Option<NaiveDate>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO maternal_risk_watch.patients (id, full_name, email, due_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            due_date = COALESCE(EXCLUDED.due_date, maternal_risk_watch.patients.due_date)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .bind(due_date)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

pub async fn insert_check_in(
    pool: &PgPool,
    patient_id: Uuid,
    answers: &CheckInAnswers,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO maternal_risk_watch.check_ins (id, patient_id, answers, checked_in_on)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(patient_id)
    .bind(serde_json::to_value(answers)?)
    .bind(chrono::Utc::now().date_naive())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Risk rows are append-only; the insert never updates an earlier record.
pub async fn insert_risk_log(pool: &PgPool, record: &RiskRecord) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO maternal_risk_watch.risk_logs
        (id, patient_id, score, level, insight, triggers, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(record.patient_id)
    .bind(record.score)
    .bind(record.level.as_str())
    .bind(record.insight)
    .bind(&record.triggers)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn latest_risk(pool: &PgPool, patient_id: Uuid) -> anyhow::Result<Option<RiskLogRow>> {
    let row = sqlx::query(
        r#"
        SELECT p.full_name, p.email, r.score, r.level, r.insight, r.triggers, r.created_at
        FROM maternal_risk_watch.risk_logs r
        JOIN maternal_risk_watch.patients p ON p.id = r.patient_id
        WHERE r.patient_id = $1
        ORDER BY r.created_at DESC
        LIMIT 1
        "#,
    )
    .bind(patient_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_log))
}

/// Latest risk row per patient, highest severity first (score breaks ties
/// within a level, then recency). This is the clinician roster view.
pub async fn fetch_roster(pool: &PgPool) -> anyhow::Result<Vec<RiskLogRow>> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT ON (r.patient_id)
            p.full_name, p.email, r.score, r.level, r.insight, r.triggers, r.created_at
        FROM maternal_risk_watch.risk_logs r
        JOIN maternal_risk_watch.patients p ON p.id = r.patient_id
        ORDER BY r.patient_id, r.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut roster: Vec<RiskLogRow> = rows.into_iter().map(row_to_log).collect();
    roster.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then(b.score.cmp(&a.score))
            .then(b.created_at.cmp(&a.created_at))
    });
    Ok(roster)
}

pub async fn fetch_risk_logs(
    pool: &PgPool,
    since_date: NaiveDate,
    email: Option<&str>,
) -> anyhow::Result<Vec<RiskLogRow>> {
    let mut query = String::from(
        "SELECT p.full_name, p.email, r.score, r.level, r.insight, r.triggers, r.created_at \
         FROM maternal_risk_watch.risk_logs r \
         JOIN maternal_risk_watch.patients p ON p.id = r.patient_id \
         WHERE r.created_at >= $1",
    );

    if email.is_some() {
        query.push_str(" AND p.email = $2");
    }
    query.push_str(" ORDER BY r.created_at DESC");

    let since = since_date
        .and_hms_opt(0, 0, 0)
        .context("invalid cutoff date")?
        .and_utc();
    let mut rows = sqlx::query(&query).bind(since);
    if let Some(value) = email {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.into_iter().map(row_to_log).collect())
}

fn row_to_log(row: sqlx::postgres::PgRow) -> RiskLogRow {
    let level: String = row.get("level");
    RiskLogRow {
        patient_name: row.get("full_name"),
        patient_email: row.get("email"),
        score: row.get("score"),
        level: RiskLevel::from_str_lossy(&level),
        insight: row.get("insight"),
        triggers: row.get("triggers"),
        created_at: row.get("created_at"),
    }
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        due_date: Option<NaiveDate>,
        headache: Option<bool>,
        headache_severity: Option<i32>,
        symptoms: Option<String>,
        kicks: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let patient_id = upsert_patient(pool, &row.full_name, &row.email, row.due_date).await?;

        // symptoms arrive semicolon-separated, e.g. "Vision changes;Swelling in hands/feet"
        let symptoms = row.symptoms.map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        let answers = CheckInAnswers {
            headache: row.headache,
            headache_severity: row.headache_severity,
            symptoms,
            kicks: row.kicks.map(serde_json::Value::String),
        };

        insert_check_in(pool, patient_id, &answers).await?;
        let record = risk::evaluate(patient_id, &answers);
        insert_risk_log(pool, &record).await?;
        inserted += 1;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    // The inserts above name columns by hand; keep them in lockstep with
    // the shipped DDL.
    #[test]
    fn migration_declares_every_written_column() {
        let ddl = include_str!("../migrations/0001_init.sql");
        for column in [
            "full_name",
            "email",
            "due_date",
            "answers",
            "checked_in_on",
            "score",
            "level",
            "insight",
            "triggers",
        ] {
            assert!(ddl.contains(column), "missing column {column}");
        }
    }
}
