//! `score-report`: score answer documents from disk and write JSON reports.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use potential_matrix::{debug, EngineConfig, ScoringEngine};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "score-report",
    about = "Score questionnaire answers into a 3x3 potential matrix",
    version
)]
struct Cli {
    /// Engine config TOML (defaults to $ENGINE_CONFIG_PATH, config/engine.toml, or the built-in registry)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one answer document
    Score(ScoreArgs),
    /// Score every *.json answer document in a directory
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Question bank JSON
    #[arg(long)]
    blocks: PathBuf,
    /// Answer document JSON
    #[arg(long)]
    answers: PathBuf,
    /// Write the report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[arg(long)]
    blocks: PathBuf,
    #[arg(long)]
    responses_dir: PathBuf,
    #[arg(long)]
    reports_dir: PathBuf,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    debug::init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path),
        None => EngineConfig::load(),
    }
    .context("loading engine config")?;
    let engine = ScoringEngine::new(config).context("building scoring engine")?;

    match cli.command {
        Command::Score(args) => run_score(&engine, args),
        Command::Batch(args) => run_batch(&engine, args),
    }
}

fn run_score(engine: &ScoringEngine, args: ScoreArgs) -> Result<()> {
    let blocks = read_json(&args.blocks)?;
    let answers = read_json(&args.answers)?;
    let report = engine.score(&blocks, &answers)?;
    let body = report.to_json_pretty()?;
    match args.out {
        Some(path) => {
            fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn run_batch(engine: &ScoringEngine, args: BatchArgs) -> Result<()> {
    let blocks = read_json(&args.blocks)?;
    fs::create_dir_all(&args.reports_dir)
        .with_context(|| format!("creating {}", args.reports_dir.display()))?;

    let mut inputs: Vec<PathBuf> = fs::read_dir(&args.responses_dir)
        .with_context(|| format!("listing {}", args.responses_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    inputs.sort();

    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut used_names: HashSet<String> = HashSet::new();
    for path in &inputs {
        let answers = match read_json(path) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "answer document skipped");
                skipped += 1;
                continue;
            }
        };
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("respondent");
        // A bad question bank fails every document the same way; stop here.
        let report = engine.score_with_id(&blocks, &answers, Some(stem))?;
        let name = claim_file_name(&mut used_names, report.respondent_id.as_deref(), stem);
        let out = args.reports_dir.join(name);
        fs::write(&out, report.to_json_pretty()?)
            .with_context(|| format!("writing {}", out.display()))?;
        written += 1;
    }

    info!(written, skipped, "batch finished");
    println!("{written} report(s) written, {skipped} skipped");
    Ok(())
}

/// Pick a report file name not yet written in this batch.
///
/// `<id>_report.json` first; on a repeated respondent id the answer file's
/// stem is appended, then a counter.
fn claim_file_name(used: &mut HashSet<String>, respondent_id: Option<&str>, stem: &str) -> String {
    let id = sanitize(respondent_id.unwrap_or(stem));
    let stem = sanitize(stem);

    let mut name = format!("{id}_report.json");
    if used.contains(&name) {
        warn!(respondent = %debug::anon_hash(&id), "respondent id repeated in batch");
        name = format!("{id}_{stem}_report.json");
        let mut n = 2usize;
        while used.contains(&name) {
            name = format!("{id}_{stem}_{n}_report.json");
            n += 1;
        }
    }
    used.insert(name.clone());
    name
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
