// Diagnostics CLI for recorded evaluation tracks.
//
// Works on track JSON files produced by the engine: inspect their timing
// shape, recompute attempt summaries, and export flat metric rows for
// spreadsheet analysis.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};

use dance_trainer::evaluator::summarize_track;
use dance_trainer::{EvaluationConfig, Track};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dance-diag error: {err:?}");
            ExitCode::from(1)
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dance-diag", about = "Evaluation track diagnostics CLI")]
struct Cli {
    /// Path to an evaluation config JSON file (defaults used if absent).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => EvaluationConfig::load(path),
            None => EvaluationConfig::default(),
        };
        match self.command {
            Command::Info(args) => info_command(args),
            Command::Summarize(args) => summarize_command(args, &config),
            Command::Export(args) => export_command(args, &config),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a track's basic shape: frames, durations, recorded metrics.
    Info(InfoArgs),
    /// Recompute and print the attempt summary for one track.
    Summarize(SummarizeArgs),
    /// Export flat summary rows for one or more tracks as a JSON array.
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
struct InfoArgs {
    /// Track JSON file to inspect.
    track: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct SummarizeArgs {
    /// Track JSON file to summarize.
    track: PathBuf,
    /// Only summarize frames with video time at or after this (seconds).
    #[arg(long)]
    start: Option<f64>,
    /// Only summarize frames with video time before this (seconds).
    #[arg(long)]
    end: Option<f64>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Destination file (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    /// Track JSON files to export.
    #[arg(required = true)]
    tracks: Vec<PathBuf>,
    /// Destination file (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

fn load_track(path: &PathBuf) -> Result<Track> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read track file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse track file {}", path.display()))
}

fn info_command(args: InfoArgs) -> Result<()> {
    let track = load_track(&args.track)?;
    println!("track id:       {}", track.id);
    println!("dance:          {}", track.dance_relative_stem);
    println!("segment:        {}", track.segment_description);
    println!("frames:         {}", track.frame_count());
    if let (Some(first), Some(last)) = (
        track.video_times_secs.first(),
        track.video_times_secs.last(),
    ) {
        println!("video range:    {:.3}s .. {:.3}s", first, last);
    }
    let mut metrics: Vec<&str> = track
        .metric_series
        .keys()
        .map(|kind| kind.name())
        .collect();
    metrics.sort_unstable();
    println!("live metrics:   {}", metrics.join(", "));
    Ok(())
}

fn summarize_command(args: SummarizeArgs, config: &EvaluationConfig) -> Result<()> {
    let track = load_track(&args.track)?;

    let summary = match (args.start, args.end) {
        (None, None) => summarize_track(&track, config)?,
        (start, end) => {
            let start = start.unwrap_or(f64::NEG_INFINITY);
            let end = end.unwrap_or(f64::INFINITY);
            let Some(sub) = track.sub_track(start, end) else {
                bail!(
                    "range {}..{} selects no frames of track {}",
                    start,
                    end,
                    track.id
                );
            };
            summarize_track(&sub, config)?
        }
    };

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
        OutputFormat::Table => {
            let mut lines = vec![format!(
                "attempt {} ({})",
                summary.track_id, summary.segment_description
            )];
            for (column, value) in summary.format_rows() {
                lines.push(format!("  {:<45} {}", column, value));
            }
            lines.join("\n")
        }
    };

    match args.output {
        Some(path) => fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn export_command(args: ExportArgs, config: &EvaluationConfig) -> Result<()> {
    let mut rows = Vec::with_capacity(args.tracks.len());
    for path in &args.tracks {
        let track = load_track(path)?;
        let summary = summarize_track(&track, config)?;
        let mut row = Map::new();
        row.insert("track_id".to_string(), Value::from(summary.track_id.clone()));
        row.insert(
            "segment".to_string(),
            Value::from(summary.segment_description.clone()),
        );
        for (column, value) in summary.format_rows() {
            row.insert(column, value);
        }
        rows.push(Value::Object(row));
    }

    let rendered = serde_json::to_string_pretty(&Value::Array(rows))?;
    match args.output {
        Some(path) => fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}
