mod parser;
mod record;
mod survey;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use record::DegreeRecord;

/// Degree audit HTML to JSON converter.
#[derive(Parser)]
#[command(name = "audit_scraper", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single audit HTML file to JSON
    Convert {
        /// Path to the audit HTML file
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
        /// Wrap the record in a scan envelope with source metadata
        #[arg(long)]
        envelope: bool,
    },
    /// Convert every audit HTML file in a directory
    Batch {
        /// Directory containing audit captures (.html / .htm)
        dir: PathBuf,
        /// Output directory for the JSON records
        #[arg(short, long, default_value = "converted")]
        out_dir: PathBuf,
        /// Stop after this many files
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print a per-requirement overview of an audit
    Overview {
        /// Path to the audit HTML file
        input: PathBuf,
    },
    /// Run the page census over any captured page
    Survey {
        /// Path to the captured HTML file
        input: PathBuf,
    },
}

/// Conversion output plus where it came from, for downstream ingestion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanEnvelope {
    scanned_at: DateTime<Utc>,
    source_title: Option<String>,
    source_path: String,
    record: DegreeRecord,
}

#[derive(Debug, Default)]
struct ConvertCounts {
    records: usize,
    requirements: usize,
    completed: usize,
    in_progress: usize,
    incomplete: usize,
}

impl ConvertCounts {
    fn add(&mut self, record: &DegreeRecord) {
        self.records += 1;
        self.requirements += record.requirements.len();
        self.completed += record.completed_courses.len();
        self.in_progress += record.in_progress_courses.len();
        self.incomplete += record.incomplete_courses.len();
    }

    fn print(&self) {
        println!("Records:      {}", self.records);
        println!("Requirements: {}", self.requirements);
        println!("Completed:    {}", self.completed);
        println!("In progress:  {}", self.in_progress);
        println!("Incomplete:   {}", self.incomplete);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            input,
            output,
            compact,
            envelope,
        } => convert_one(&input, output.as_deref(), compact, envelope),
        Commands::Batch { dir, out_dir, limit } => convert_batch(&dir, &out_dir, limit),
        Commands::Overview { input } => print_overview(&input),
        Commands::Survey { input } => run_survey(&input),
    }
}

fn convert_one(input: &Path, output: Option<&Path>, compact: bool, envelope: bool) -> Result<()> {
    let started = Instant::now();

    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let doc = parser::ReportDoc::parse(&html)
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    let record = parser::convert_parsed(&doc);

    let mut counts = ConvertCounts::default();
    counts.add(&record);

    let json = if envelope {
        let wrapped = ScanEnvelope {
            scanned_at: Utc::now(),
            source_title: doc.title(),
            source_path: input.display().to_string(),
            record,
        };
        render_json(&wrapped, compact)?
    } else {
        render_json(&record, compact)?
    };

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "record written");
            counts.print();
            println!("Done in {}", format_duration(started.elapsed()));
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn convert_batch(dir: &Path, out_dir: &Path, limit: Option<usize>) -> Result<()> {
    let started = Instant::now();

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    if let Some(limit) = limit {
        files.truncate(limit);
    }

    if files.is_empty() {
        info!("no HTML files found in {}", dir.display());
        return Ok(());
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    info!(files = files.len(), "starting batch conversion");

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
        )?
        .progress_chars("#>-"),
    );

    let results: Vec<(&PathBuf, Result<DegreeRecord>)> = files
        .par_iter()
        .map(|path| {
            let outcome = convert_file_to(path, out_dir);
            bar.inc(1);
            (path, outcome)
        })
        .collect();
    bar.finish();

    let mut counts = ConvertCounts::default();
    for (path, result) in results {
        match result {
            Ok(record) => counts.add(&record),
            Err(err) => warn!("{} failed: {:#}", path.display(), err),
        }
    }

    counts.print();
    println!("Done in {}", format_duration(started.elapsed()));
    Ok(())
}

fn convert_file_to(input: &Path, out_dir: &Path) -> Result<DegreeRecord> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let record = parser::convert_document(&html)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("record");
    let out_path = out_dir.join(format!("{}.json", stem));
    let json = serde_json::to_string_pretty(&record)?;
    fs::write(&out_path, json)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    Ok(record)
}

fn print_overview(input: &Path) -> Result<()> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let record = parser::convert_document(&html)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!(
        "{} | {} | {}/{} credits",
        record.student.name,
        record.student.major,
        record.student.credits_applied,
        record.student.credits_required
    );
    println!();
    println!(
        "{:<46} {:<12} {:>4} {:>8}  {}",
        "Requirement", "Status", "Req", "Applied", "Catalog"
    );
    for req in &record.requirements {
        println!(
            "{:<46} {:<12} {:>4} {:>8}  {}",
            truncate(&req.name, 42),
            req.status.as_str(),
            fmt_credits(req.credits_required),
            fmt_credits(req.credits_applied),
            req.catalog_year
        );
    }
    println!();
    println!(
        "Courses: {} completed, {} in progress, {} incomplete",
        record.completed_courses.len(),
        record.in_progress_courses.len(),
        record.incomplete_courses.len()
    );

    Ok(())
}

fn run_survey(input: &Path) -> Result<()> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let survey = survey::survey_document(&html)
        .with_context(|| format!("Failed to survey {}", input.display()))?;

    println!("{}", serde_json::to_string_pretty(&survey)?);
    Ok(())
}

fn render_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

fn fmt_credits(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Char-based prefix with a "..." tail past `max`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let prefix: String = s.chars().take(max).collect();
        format!("{}...", prefix)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

// ── Tests ──
