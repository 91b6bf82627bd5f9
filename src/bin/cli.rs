//! MotoGP pace CLI - lap-time extraction and rider pace comparison

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use motogp_pace::analysis::{compare_riders, PaceComparison};
use motogp_pace::config::AnalysisConfig;
use motogp_pace::core::SimilarityMatrix;
use motogp_pace::data::{
    classification_to_dataframe, records_to_dataframe, similarity_to_dataframe, write_csv,
    ClassificationParser, LapTimeParser, ParseOptions,
};
use motogp_pace::models::{LapTable, SessionTag, RACE_SESSION};

/// Session tag of the pooled practice table
const PRACTICE_SESSION: &str = "FP";

#[derive(Parser)]
#[command(name = "motogp-pace")]
#[command(author, version, about = "MotoGP timing-sheet pace analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log per-rider and per-token skips
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract lap times from text dumps of analysis sheets
    Laps {
        /// Text dumps, named {year}_{event}_{session}.txt
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Treat every file as a race document
        #[arg(long)]
        race: bool,

        /// Keep practice riders with fewer than the minimum laps
        #[arg(long)]
        keep_short: bool,

        /// CSV output (padded table for one file, long format for several)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the race classification (position, points)
    Classification {
        /// Text dump of the race results document
        file: PathBuf,

        /// CSV output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare rider pace with Bhattacharyya similarity
    Similarity {
        /// Practice session text dumps
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Race analysis text dump, compared separately
        #[arg(long)]
        race: Option<PathBuf>,

        /// JSON analysis settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Slowest binned lap, percent above the fastest
        #[arg(long)]
        tolerance: Option<f64>,

        /// Bin width in seconds
        #[arg(long)]
        bin_width: Option<f64>,

        /// Only compare these riders (comma separated, as printed)
        #[arg(long, value_delimiter = ',')]
        riders: Vec<String>,

        /// Number of most similar pairs to list
        #[arg(long, default_value = "5")]
        top: usize,

        /// CSV output for the practice matrix
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV output of the parsed laps in long format, one session tag per lap
        #[arg(long)]
        laps_output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    println!("{}", "MotoGP pace CLI v0.1.0".cyan().bold());
    println!();

    match cli.command {
        Commands::Laps {
            files,
            race,
            keep_short,
            output,
        } => run_laps(&files, race, keep_short, output.as_deref())?,
        Commands::Classification { file, output } => {
            run_classification(&file, output.as_deref())?
        }
        Commands::Similarity {
            files,
            race,
            config,
            tolerance,
            bin_width,
            riders,
            top,
            output,
            laps_output,
        } => {
            let mut settings = match config {
                Some(path) => AnalysisConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config: {:?}", path))?,
                None => AnalysisConfig::default(),
            };
            if let Some(tolerance) = tolerance {
                settings.tolerance_percent = tolerance;
            }
            if let Some(bin_width) = bin_width {
                settings.bin_width = bin_width;
            }
            let outputs = SimilarityOutputs {
                matrix: output,
                laps: laps_output,
            };
            run_similarity(&files, race.as_deref(), &settings, &riders, top, &outputs)?
        }
    }

    Ok(())
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Parse each file, skipping (with a warning) the ones that fail
fn parse_files(
    files: &[PathBuf],
    options_for: impl Fn(SessionTag) -> ParseOptions,
) -> Result<Vec<LapTable>> {
    let parser = LapTimeParser::new();
    let pb = progress_bar(files.len())?;
    let mut tables = Vec::with_capacity(files.len());

    for path in files {
        pb.set_message(file_label(path));
        let options = options_for(SessionTag::from_file_name(path));

        match parser.parse_file(path, &options) {
            Ok(table) => tables.push(table),
            Err(e) => {
                pb.println(format!("{} {}: {}", "Warning".yellow(), file_label(path), e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(tables)
}

fn run_laps(files: &[PathBuf], race: bool, keep_short: bool, output: Option<&Path>) -> Result<()> {
    println!("{}: {} file(s)", "Extracting laps".green(), files.len());
    println!();

    let tables = parse_files(files, |session| {
        let mut options = if race || session.is_race() {
            ParseOptions::race(session)
        } else {
            ParseOptions::practice(session)
        };
        if keep_short {
            options.drop_short_series = false;
        }
        options
    })?;

    for table in &tables {
        print_lap_summary(table);
    }

    if let Some(path) = output {
        let mut df = match tables.as_slice() {
            [table] => table.to_dataframe()?,
            _ => records_to_dataframe(&LapTable::pooled_records(&tables))?,
        };
        write_csv(&mut df, path).with_context(|| format!("Failed to write {:?}", path))?;
        println!("{} {}", "Saved".green(), path.display());
    }

    Ok(())
}

fn print_lap_summary(table: &LapTable) {
    println!(
        "{} {} ({} riders)",
        "Session".bold(),
        table.session.to_string().cyan(),
        table.len()
    );
    println!("{:<28} {:>5} {:>10} {:>10}", "Rider", "Laps", "Best", "Median");
    println!("{}", "-".repeat(56));

    for rider in table.sorted_by_median().riders {
        let best = rider.laps.iter().copied().fold(f64::INFINITY, f64::min);
        let median = motogp_pace::data::table::median(&rider.laps);
        println!(
            "{:<28} {:>5} {:>10} {:>10}",
            rider.rider,
            rider.laps.len(),
            format_lap(best.is_finite().then_some(best)),
            format_lap(median)
        );
    }
    println!();
}

fn format_lap(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) => {
            let minutes = (s / 60.0).floor();
            format!("{}'{:06.3}", minutes as u32, s - minutes * 60.0)
        }
        None => "-".to_string(),
    }
}

fn run_classification(file: &Path, output: Option<&Path>) -> Result<()> {
    println!("{}: {}", "Classification".green(), file.display());
    println!();

    let entries = ClassificationParser::new()
        .parse_file(file)
        .with_context(|| format!("Failed to read {:?}", file))?;

    if entries.is_empty() {
        println!("{}", "No classified riders found".yellow());
        return Ok(());
    }

    println!("{:>4} {:>6} {:<28}", "Pos", "Points", "Rider");
    println!("{}", "-".repeat(40));
    for entry in &entries {
        println!("{:>4} {:>6} {:<28}", entry.position, entry.points, entry.rider);
    }

    if let Some(path) = output {
        let mut df = classification_to_dataframe(&entries)?;
        write_csv(&mut df, path).with_context(|| format!("Failed to write {:?}", path))?;
        println!();
        println!("{} {}", "Saved".green(), path.display());
    }

    Ok(())
}

/// Files written by the `similarity` command
struct SimilarityOutputs {
    matrix: Option<PathBuf>,
    laps: Option<PathBuf>,
}

/// Restrict a table to the requested riders, all riders when none are given
fn select_riders(table: LapTable, riders: &[String]) -> LapTable {
    if riders.is_empty() {
        return table;
    }
    let names: Vec<&str> = riders.iter().map(|r| r.trim()).collect();
    table.select(&names)
}

fn run_similarity(
    files: &[PathBuf],
    race: Option<&Path>,
    config: &AnalysisConfig,
    riders: &[String],
    top: usize,
    outputs: &SimilarityOutputs,
) -> Result<()> {
    config.validate()?;
    println!(
        "{}: {} practice file(s), tolerance {}%, bin width {}s",
        "Comparing pace".green(),
        files.len(),
        config.tolerance_percent,
        config.bin_width
    );
    println!();

    let min_laps = config.min_laps;
    let mut sessions: Vec<LapTable> = parse_files(files, |session| ParseOptions {
        min_laps,
        ..ParseOptions::practice(session)
    })?
    .into_iter()
    .map(|table| select_riders(table, riders))
    .collect();
    let practice = LapTable::pool(&sessions, SessionTag::new(PRACTICE_SESSION));

    let comparison = compare_riders(&practice, config)
        .context("Failed to compare practice pace")?;
    print_comparison("Practice", &comparison, top);

    if let Some(path) = &outputs.matrix {
        write_matrix(&comparison.matrix, path)?;
    }

    if let Some(race_path) = race {
        let options = ParseOptions::race(SessionTag::new(RACE_SESSION));
        let race_table = LapTimeParser::new()
            .parse_file(race_path, &options)
            .with_context(|| format!("Failed to parse race document {:?}", race_path))?;
        let race_table = select_riders(race_table, riders);
        let comparison =
            compare_riders(&race_table, config).context("Failed to compare race pace")?;
        print_comparison("Race", &comparison, top);

        if let Some(path) = &outputs.matrix {
            let race_output = path.with_file_name(format!(
                "{}_race.csv",
                path.file_stem().unwrap_or_default().to_string_lossy()
            ));
            write_matrix(&comparison.matrix, &race_output)?;
        }
        sessions.push(race_table);
    }

    if let Some(path) = &outputs.laps {
        let mut df = records_to_dataframe(&LapTable::pooled_records(&sessions))?;
        write_csv(&mut df, path).with_context(|| format!("Failed to write {:?}", path))?;
        println!("{} {}", "Saved".green(), path.display());
    }

    Ok(())
}

fn write_matrix(matrix: &SimilarityMatrix, path: &Path) -> Result<()> {
    let mut df = similarity_to_dataframe(matrix)?;
    write_csv(&mut df, path).with_context(|| format!("Failed to write {:?}", path))?;
    println!("{} {}", "Saved".green(), path.display());
    Ok(())
}

fn print_comparison(title: &str, comparison: &PaceComparison, top: usize) {
    println!(
        "{} (fastest {} by {}, median {})",
        title.bold(),
        format_lap(Some(comparison.fastest_lap)).cyan(),
        comparison.fastest_rider,
        format_lap(Some(comparison.median))
    );
    println!(
        "Bins: {} x {:.3}s from {} to {}",
        comparison.bins.count(),
        comparison.bins.width(),
        format_lap(Some(comparison.bins.low())),
        format_lap(Some(comparison.bins.high()))
    );
    println!();

    let matrix = &comparison.matrix;
    print!("{:>3} {:<24}", "", "");
    for i in 0..matrix.len() {
        print!(" {:>5}", i + 1);
    }
    println!();
    println!("{}", "-".repeat(28 + 6 * matrix.len()));

    for (i, (rider, row)) in matrix.iter().enumerate() {
        print!("{:>3} {:<24}", i + 1, rider);
        for value in row {
            let cell = format!("{:>5.2}", value);
            if *value >= 0.8 {
                print!(" {}", cell.green());
            } else if *value >= 0.5 {
                print!(" {}", cell.yellow());
            } else {
                print!(" {}", cell.dimmed());
            }
        }
        println!();
    }
    println!();

    let mut pairs = matrix.closest_pairs();
    pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
    if !pairs.is_empty() && top > 0 {
        println!("{}", "Closest pace".bold());
        for (a, b, bc) in pairs.into_iter().take(top) {
            println!("  {:.3}  {} -> {}", bc, a, b);
        }
        println!();
    }
}
