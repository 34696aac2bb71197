mod display;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use compliant_core::{CoiRecord, Requirement, date::parse_instant, parse_requirements_json};
use compliant_eval::{Evaluator, EvaluatorOptions};
use compliant_extract::{PlainTextFile, TextSource, extract_coi_fields, extract_requirements};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compliant")]
#[command(about = "Insurance certificate compliance checks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract coverage requirements from program text
    Requirements {
        /// Plain-text insurance program document
        file: PathBuf,
    },

    /// Extract recognisable fields from certificate text
    CoiFields {
        /// Plain-text certificate of insurance
        file: PathBuf,
    },

    /// Evaluate a certificate against program requirements
    Evaluate {
        /// Certificate submission (JSON)
        #[arg(long)]
        coi: PathBuf,

        /// Stored requirements (JSON array or {"requirements": [...]})
        #[arg(long, required_unless_present = "program", conflicts_with = "program")]
        requirements: Option<PathBuf>,

        /// Program text to extract requirements from
        #[arg(long)]
        program: Option<PathBuf>,

        /// Reference instant (ISO-8601); defaults to the system clock
        #[arg(long, env = "COMPLIANT_NOW", value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Flag absent GL/WC expiration dates as issues
        #[arg(long, env = "COMPLIANT_REQUIRE_EXPIRATION_DATES")]
        require_expiration_dates: bool,

        /// Exit non-zero when the certificate is non-compliant
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    info!("compliant v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Requirements { file } => {
            let text = read_document(&file)?;
            let requirements = extract_requirements(&text);
            println!("{}", serde_json::to_string_pretty(&requirements)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::CoiFields { file } => {
            let text = read_document(&file)?;
            let fields = extract_coi_fields(&text);
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Evaluate {
            coi,
            requirements,
            program,
            now,
            require_expiration_dates,
            strict,
        } => {
            let record = load_coi(&coi)?;
            let requirements = match (requirements, program) {
                (Some(path), _) => load_requirements(&path)?,
                (None, Some(path)) => extract_requirements(&read_document(&path)?),
                (None, None) => bail!("one of --requirements or --program is required"),
            };

            let evaluator = Evaluator::new(EvaluatorOptions {
                require_expiration_dates,
            });
            let result = match now {
                Some(now) => evaluator.evaluate(&record, &requirements, now),
                None => evaluator.evaluate_now(&record, &requirements),
            };

            println!("{}", serde_json::to_string_pretty(&result)?);
            display::print_issue_table(&result);

            if strict && !result.compliant {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    parse_instant(s).ok_or_else(|| format!("not an ISO-8601 instant: {s:?}"))
}

/// Read a plain-text document; a missing file is an error, not empty text.
fn read_document(path: &Path) -> anyhow::Result<String> {
    if !path.is_file() {
        bail!("file not found: {}", path.display());
    }
    Ok(PlainTextFile.extract_text(path))
}

fn load_coi(path: &Path) -> anyhow::Result<CoiRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading certificate {}", path.display()))?;
    CoiRecord::from_json(&json).with_context(|| format!("parsing certificate {}", path.display()))
}

fn load_requirements(path: &Path) -> anyhow::Result<Vec<Requirement>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading requirements {}", path.display()))?;
    parse_requirements_json(&json)
        .with_context(|| format!("parsing requirements {}", path.display()))
}
