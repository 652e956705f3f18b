use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use callscore_asr::ProviderKind;
use callscore_pipeline::{process_batch, AnalysisConfig, BatchOutcome, CallPipeline};
use callscore_record::{AnalysisRecord, RecordRepository};
use callscore_report::ReportWriter;
use callscore_storage::Database;

/// Compliance and quality analysis for recorded collection calls.
#[derive(Parser)]
#[command(name = "callscore", version)]
struct Cli {
    /// Audio files or transcript sidecars to analyze.
    audio_refs: Vec<String>,

    /// JSON config file (default: ./callscore.json, then the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transcription provider override: mock, whisper_http, transcript_file.
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Directory report artifacts are written under.
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,

    /// SQLite record store (default: <out-dir>/callscore.db).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Worker threads for batch processing.
    #[arg(long, default_value = "4")]
    jobs: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,callscore=debug")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AnalysisConfig::resolve(cli.config.as_deref())?;
    if let Some(provider) = cli.provider {
        config.use_api = provider;
    }

    // Bad configuration dies here, before any call is touched.
    let pipeline = CallPipeline::new(config)?;

    let mut audio_refs = cli.audio_refs;
    if audio_refs.is_empty() {
        if pipeline.provider_name() == "mock" {
            println!("No audio provided; running the built-in demo call.");
            audio_refs.push("demo_call.wav".to_string());
        } else {
            anyhow::bail!("no audio references given (see --help)");
        }
    }

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("could not create {}", cli.out_dir.display()))?;
    let db_path = cli
        .db
        .unwrap_or_else(|| cli.out_dir.join("callscore.db"));
    let db = Database::open(&db_path)
        .with_context(|| format!("could not open record store {}", db_path.display()))?;
    let writer = ReportWriter::new(&cli.out_dir);

    let outcomes = process_batch(&pipeline, &audio_refs, cli.jobs);

    let mut failures: Vec<(String, String)> = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(record) => match persist(record, &writer, &db) {
                Ok(dir) => print_summary(record, &dir),
                Err(e) => failures.push((outcome.audio_ref.clone(), format!("{e:#}"))),
            },
            Err(e) => failures.push((outcome.audio_ref.clone(), e.to_string())),
        }
    }

    report_batch(&outcomes, &failures)
}

fn persist(
    record: &AnalysisRecord,
    writer: &ReportWriter,
    db: &Database,
) -> anyhow::Result<PathBuf> {
    let dir = writer.write(record).context("writing report")?;
    db.save(record).context("saving record")?;
    Ok(dir)
}

fn print_summary(record: &AnalysisRecord, dir: &std::path::Path) {
    let failed: Vec<String> = record
        .failed_flags()
        .iter()
        .map(|f| f.flag.to_string())
        .collect();
    println!(
        "{}: intent={} composite={:.1} failed_flags=[{}] -> {}",
        record.call_id,
        record.intent,
        record.composite_score,
        failed.join(", "),
        dir.display()
    );
}

fn report_batch(outcomes: &[BatchOutcome], failures: &[(String, String)]) -> anyhow::Result<()> {
    println!(
        "\n{} of {} calls analyzed.",
        outcomes.len() - failures.len(),
        outcomes.len()
    );
    if failures.is_empty() {
        return Ok(());
    }

    eprintln!("Failed calls:");
    for (audio_ref, reason) in failures {
        eprintln!("  {audio_ref}: {reason}");
    }
    if failures.len() == outcomes.len() {
        anyhow::bail!("every call in the batch failed");
    }
    Ok(())
}
