use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod models;
mod report;
mod risk;

use models::CheckInAnswers;

#[derive(Parser)]
#[command(name = "maternal-risk-watch")]
#[command(about = "Daily check-in risk tracker for maternal care teams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Submit one check-in for a patient and evaluate it
    CheckIn {
        #[arg(long)]
        email: String,
        /// Full answer document as JSON, e.g. '{"headache":true,"kicks":"8"}'
        #[arg(long, conflicts_with_all = ["headache", "headache_severity", "symptoms", "kicks"])]
        answers: Option<String>,
        #[arg(long)]
        headache: Option<bool>,
        #[arg(long)]
        headache_severity: Option<i32>,
        /// Repeatable, one flag per reported symptom
        #[arg(long = "symptom")]
        symptoms: Vec<String>,
        #[arg(long)]
        kicks: Option<String>,
    },
    /// Show a patient's current risk
    Latest {
        #[arg(long)]
        email: String,
    },
    /// List every patient's latest risk, most severe first
    Roster {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Import check-ins from a CSV file, evaluating each row
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::CheckIn {
            email,
            answers,
            headache,
            headache_severity,
            symptoms,
            kicks,
        } => {
            let patient_id = db::find_patient(&pool, &email)
                .await?
                .with_context(|| format!("no patient registered with email {email}"))?;

            let answers: CheckInAnswers = match answers {
                Some(raw) => serde_json::from_str(&raw).context("invalid --answers JSON")?,
                None => CheckInAnswers {
                    headache,
                    headache_severity,
                    symptoms: if symptoms.is_empty() {
                        None
                    } else {
                        Some(symptoms)
                    },
                    kicks: kicks.map(serde_json::Value::String),
                },
            };

            db::insert_check_in(&pool, patient_id, &answers).await?;
            let record = risk::evaluate(patient_id, &answers);

            // The evaluation is reported even if the risk write fails, so
            // the caller can retry persistence on its own.
            if let Err(err) = db::insert_risk_log(&pool, &record).await {
                eprintln!("warning: risk log write failed: {err:#}");
            }

            println!(
                "Check-in recorded for {email}: score {} level {}",
                record.score, record.level
            );
            println!("{}", record.insight);
            if !record.triggers.is_empty() {
                println!("Triggers: {}", record.triggers.join(", "));
            }
        }
        Commands::Latest { email } => {
            let patient_id = db::find_patient(&pool, &email)
                .await?
                .with_context(|| format!("no patient registered with email {email}"))?;

            match db::latest_risk(&pool, patient_id).await? {
                Some(log) => {
                    println!(
                        "{} ({}) {} score {} at {}",
                        log.patient_name, log.patient_email, log.level, log.score, log.created_at
                    );
                    println!("{}", log.insight);
                }
                None => println!("No evaluations yet for {email}."),
            }
        }
        Commands::Roster { limit } => {
            let roster = db::fetch_roster(&pool).await?;

            if roster.is_empty() {
                println!("No patients with evaluations yet.");
                return Ok(());
            }

            println!("Patients by current risk:");
            for entry in roster.iter().take(limit) {
                println!(
                    "- {} ({}) {} score {} as of {}",
                    entry.patient_name,
                    entry.patient_email,
                    entry.level,
                    entry.score,
                    entry.created_at.date_naive()
                );
            }
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Evaluated {inserted} check-ins from {}.", csv.display());
        }
        Commands::Report {
            email,
            since_days,
            out,
        } => {
            let since_date = cutoff_date(since_days);
            let logs = db::fetch_risk_logs(&pool, since_date, email.as_deref()).await?;
            let roster = db::fetch_roster(&pool).await?;
            let report = report::build_report(
                email.as_deref(),
                since_days,
                since_date,
                &logs,
                &roster,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
