use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use catalog_parser::config::Settings;
use catalog_parser::model::Catalog;
use catalog_parser::parser::stats::render_report;
use catalog_parser::CatalogParser;

#[derive(Parser)]
#[command(name = "catalog-parser", about = "Extract courses and programs from academic catalog text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one catalog text file into JSON
    Parse {
        file: PathBuf,
        /// Filename used for year detection (default: FILE's name)
        #[arg(long)]
        name: Option<String>,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Show which catalog format a file would be parsed with
    Detect { file: PathBuf },
    /// Parse every *.txt in a directory
    Batch {
        dir: PathBuf,
        /// Where the JSON files go (default: next to the inputs)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Parse a file and print a quality report
    Report { file: PathBuf },
}

fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let parser = CatalogParser::new(settings.parser_options());

    let result = match cli.command {
        Commands::Parse {
            file,
            name,
            output,
            pretty,
        } => {
            let text = read_text(&file)?;
            let name = name.unwrap_or_else(|| file_name(&file));
            let catalog = parser.parse(&text, &name);
            let json = to_json(&catalog, pretty)?;
            match output {
                Some(path) => {
                    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
                    println!(
                        "Wrote {} ({} courses, {} degree plans)",
                        path.display(),
                        catalog.metadata.statistics.courses_found,
                        catalog.metadata.statistics.degree_plans_found,
                    );
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        Commands::Detect { file } => {
            let text = read_text(&file)?;
            let format = parser.detect(&text, &file_name(&file));
            println!("Format:   {}", format.version);
            println!("Strategy: {:?}", format.strategy);
            println!("Tables:   {:?}", format.table_format);
            Ok(())
        }
        Commands::Batch { dir, output_dir } => {
            let files = list_text_files(&dir)?;
            if files.is_empty() {
                println!("No .txt files in {}", dir.display());
                return Ok(());
            }
            if let Some(out) = &output_dir {
                fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
            }
            println!("Parsing {} catalogs...", files.len());
            let counts = run_batch(&parser, &files, output_dir.as_deref(), settings.batch_chunk_size)?;
            counts.print();
            Ok(())
        }
        Commands::Report { file } => {
            let text = read_text(&file)?;
            let name = file_name(&file);
            let catalog = parser.parse(&text, &name);
            print!("{}", render_report(&name, &catalog));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

#[derive(Default)]
struct BatchCounts {
    catalogs: usize,
    failed: usize,
    courses: usize,
    degree_plans: usize,
    warnings: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!(
            "Parsed {} catalogs ({} failed): {} courses, {} degree plans, {} warnings.",
            self.catalogs, self.failed, self.courses, self.degree_plans, self.warnings,
        );
    }
}

fn run_batch(
    parser: &CatalogParser,
    files: &[PathBuf],
    output_dir: Option<&Path>,
    chunk_size: usize,
) -> Result<BatchCounts> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .context("progress bar template")?
            .progress_chars("#>-"),
    );

    let mut counts = BatchCounts::default();

    for chunk in files.chunks(chunk_size.max(1)) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|file| parse_to_json(parser, file, output_dir))
            .collect();

        for (file, result) in chunk.iter().zip(results) {
            match result {
                Ok(catalog) => {
                    counts.catalogs += 1;
                    counts.courses += catalog.metadata.statistics.courses_found;
                    counts.degree_plans += catalog.metadata.statistics.degree_plans_found;
                    counts.warnings += catalog.metadata.warnings.len();
                }
                Err(e) => {
                    counts.failed += 1;
                    pb.suspend(|| warn!("{}: {:#}", file.display(), e));
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn parse_to_json(parser: &CatalogParser, file: &Path, output_dir: Option<&Path>) -> Result<Catalog> {
    let text = read_text(file)?;
    let catalog = parser.parse(&text, &file_name(file));
    let out = json_path(file, output_dir);
    fs::write(&out, to_json(&catalog, true)?).with_context(|| format!("writing {}", out.display()))?;
    info!("{} -> {}", file.display(), out.display());
    Ok(catalog)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn to_json(catalog: &Catalog, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(catalog)
    } else {
        serde_json::to_string(catalog)
    };
    json.context("serializing catalog")
}

fn list_text_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `catalog_2021.txt` → `<dir>/catalog_2021.json`
fn json_path(file: &Path, output_dir: Option<&Path>) -> PathBuf {
    let out = file.with_extension("json");
    match (output_dir, out.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => out,
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
