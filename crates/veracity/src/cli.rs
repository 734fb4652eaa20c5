//! Command-line front end for the detector.

use std::{io::Read, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    DEFAULT_DATABASE_URL, DEFAULT_HISTORY_LIMIT, DetectionResult, Detector, DetectorConfig,
    ModelBundle, Resolution, SubmissionRecord,
};

#[derive(Parser)]
#[command(name = "veracity")]
#[command(about = "Detect fake news and keep a per-user history", long_about = None)]
pub struct Cli {
    /// Serialized model bundle (vectorizer + classifier)
    #[arg(short, long, global = true, value_name = "PATH", env = "VERACITY_MODEL", default_value = "model.bin")]
    model: PathBuf,

    /// History database URL
    #[arg(long, global = true, value_name = "URL", env = "VERACITY_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database: String,

    /// Records shown by `history` when no limit is given
    #[arg(long, global = true, env = "VERACITY_HISTORY_LIMIT", default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging and timings)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify text and record the result
    Classify(ClassifyArgs),
    /// Show the most recent submissions of a user
    History(HistoryArgs),
    /// Print model bundle metadata
    Inspect,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Text to analyze (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process texts (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    /// Submitter identity the result is recorded under
    #[arg(short, long, env = "VERACITY_USER")]
    user: String,

    /// Classify without recording
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Args)]
struct HistoryArgs {
    /// Submitter identity
    #[arg(short, long, env = "VERACITY_USER")]
    user: String,

    /// Maximum number of records (defaults to --history-limit)
    #[arg(short = 'n', long, conflicts_with = "all")]
    limit: Option<usize>,

    /// Show the full history
    #[arg(long)]
    all: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    format: HistoryFormat,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    /// Output just the label (Fake or Real)
    Class,
    /// Output the confidence percentage
    Confidence,
    /// Output as JSON
    Json,
    /// Human-readable output with confidence
    Human,
}

#[derive(ValueEnum, Clone, Copy)]
enum HistoryFormat {
    Json,
    Human,
}

enum InputSource {
    Single(String),
    Batch(Vec<String>),
}

/// Classification outcome, recorded or not.
struct Outcome {
    resolution: Resolution,
    record: Option<DetectionResult>,
}

impl Cli {
    fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::default().with_history_limit(self.history_limit)
    }

    fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (_, true) => "debug",
            _ => "info",
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides `-q`/`-v`.
pub fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

pub async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Classify(args) => classify(cli, args).await,
        Command::History(args) => history(cli, args).await,
        Command::Inspect => inspect(cli),
    }
}

async fn classify(cli: &Cli, args: &ClassifyArgs) -> Result<()> {
    let input = determine_input_source(args)?;
    let detector = Detector::open(&cli.model, &cli.database, cli.detector_config())
        .await
        .context("Failed to start detector")?;

    match input {
        InputSource::Single(text) => {
            let outcome = process_single(&detector, args, &text, cli.verbose).await?;
            output_outcome(&outcome, args.format)?;
        }
        InputSource::Batch(texts) => {
            let mut outcomes = Vec::with_capacity(texts.len());
            for text in &texts {
                outcomes.push(process_single(&detector, args, text, cli.verbose).await?);
            }
            output_batch(&outcomes, args.format)?;
        }
    }
    Ok(())
}

/// Priority: text arg > file > batch > stdin
fn determine_input_source(args: &ClassifyArgs) -> Result<InputSource> {
    if let Some(text) = &args.text {
        return Ok(InputSource::Single(text.clone()));
    }

    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(InputSource::Single(text));
    }

    if let Some(path) = &args.batch {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        return Ok(InputSource::Batch(contents.lines().map(String::from).collect()));
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(InputSource::Single(buffer))
}

async fn process_single(
    detector: &Detector,
    args: &ClassifyArgs,
    text: &str,
    verbose: bool,
) -> Result<Outcome> {
    let start = verbose.then(Instant::now);

    let outcome = if args.dry_run {
        Outcome {
            resolution: detector.predict(text),
            record: None,
        }
    } else {
        let result = detector
            .classify(&args.user, text)
            .await
            .context("Failed to record submission, please try again")?;
        Outcome {
            resolution: Resolution {
                label: result.label,
                confidence: result.confidence,
            },
            record: Some(result),
        }
    };

    if let Some(start_time) = start {
        eprintln!("Detection time: {:?}", start_time.elapsed());
    }
    Ok(outcome)
}

fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    json!({
        "label": outcome.resolution.label,
        "confidence": outcome.resolution.confidence,
        "record_id": outcome.record.map(|r| r.record_id),
    })
}

fn output_outcome(outcome: &Outcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Class => println!("{}", outcome.resolution.label),
        OutputFormat::Confidence => println!("{:.2}", outcome.resolution.confidence),
        OutputFormat::Json => println!("{}", serde_json::to_string(&outcome_json(outcome))?),
        OutputFormat::Human => {
            println!("Result: {}", outcome.resolution.label);
            println!("Confidence: {:.2}%", outcome.resolution.confidence);
            if outcome.record.is_none() {
                println!("(not recorded)");
            }
        }
    }
    Ok(())
}

fn output_batch(outcomes: &[Outcome], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        let array = outcomes.iter().map(outcome_json).collect::<Vec<_>>();
        println!("{}", serde_json::to_string(&array)?);
        return Ok(());
    }
    for outcome in outcomes {
        output_outcome(outcome, format)?;
    }
    Ok(())
}

async fn history(cli: &Cli, args: &HistoryArgs) -> Result<()> {
    let detector = Detector::open(&cli.model, &cli.database, cli.detector_config())
        .await
        .context("Failed to start detector")?;

    let records = if args.all {
        detector.history_for(&args.user).await?
    } else {
        let limit = args.limit.unwrap_or(detector.config().history_limit);
        detector.recent_for(&args.user, limit).await?
    };

    match args.format {
        HistoryFormat::Json => println!("{}", serde_json::to_string(&records)?),
        HistoryFormat::Human => print_history(&args.user, &records),
    }
    Ok(())
}

fn print_history(user: &str, records: &[SubmissionRecord]) {
    if records.is_empty() {
        println!("No submissions for {user}");
        return;
    }
    for record in records {
        println!(
            "{}  {:<4}  {:>6.2}%  {}",
            record.created_at.format("%d %b %Y, %H:%M"),
            record.label,
            record.confidence,
            preview(&record.text, 60)
        );
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut = single_line.chars().take(max_chars - 1).collect::<String>();
        format!("{cut}…")
    }
}

fn inspect(cli: &Cli) -> Result<()> {
    let bundle = ModelBundle::load(&cli.model)
        .with_context(|| format!("Failed to load model bundle: {}", cli.model.display()))?;
    let info = json!({
        "model_version": bundle.model_version(),
        "classifier": bundle.classifier().kind(),
        "num_features": bundle.num_features(),
        "num_classes": bundle.classifier().num_classes(),
        "ngram_range": bundle.vectorizer().params().ngram_range(),
        "sublinear_tf": bundle.vectorizer().params().sublinear_tf(),
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_classify_with_globals() {
        let cli = Cli::try_parse_from([
            "veracity",
            "classify",
            "--user",
            "alice",
            "-o",
            "json",
            "--model",
            "bundle.bin",
            "Breaking news",
        ])
        .unwrap();
        assert_eq!(cli.model, PathBuf::from("bundle.bin"));
        let Command::Classify(args) = &cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.user, "alice");
        assert_eq!(args.text.as_deref(), Some("Breaking news"));
        assert!(matches!(args.format, OutputFormat::Json));
        assert!(!args.dry_run);
    }

    #[test]
    fn history_limit_and_all_conflict() {
        let result = Cli::try_parse_from(["veracity", "history", "--user", "bob", "-n", "3", "--all"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_maps_to_log_level() {
        let cli = Cli::try_parse_from(["veracity", "-v", "inspect"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        let cli = Cli::try_parse_from(["veracity", "inspect", "-q"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn preview_collapses_and_truncates() {
        assert_eq!(preview("short\n text", 60), "short text");
        assert_eq!(preview("abcdefghij", 5), "abcd…");
    }
}
