use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::{error, warn};
use walkdir::WalkDir;

use slz_codecs::format::{DEFAULT_CHUNK_SIZE, SUFFIX};
use slz_codecs::{Algorithm, Session, SessionParams};
use slz_core::config::DEFAULT_WINDOW_CEILING;
use slz_core::{Direction, FileReport, Pipeline, PipelineConfig};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "slz",
    about = "Compress or uncompress FILEs in bounded memory slices (by default, compress FILES in-place)",
    version,
    arg_required_else_help = true
)]
struct Cli {
    /// Files or directories to process (directories are walked recursively)
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Decompress
    #[arg(short, long, visible_alias = "uncompress")]
    decompress: bool,
    /// Keep (don't delete) input files. Without it an input is removed once
    /// it has been opened and processed, even if processing failed
    #[arg(short, long)]
    keep: bool,
    /// Algorithm: deflate | lz4 | zstd | store
    #[arg(short = 'A', long, default_value = "deflate")]
    algorithm: String,
    /// Compression level (1–9)
    #[arg(short = 'L', long, default_value_t = 1)]
    level: u32,
    /// Raw bytes per codec chunk
    #[arg(short = 'C', long = "chunksz", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: u32,
    /// Maximum bytes read into memory per slice
    #[arg(short = 'W', long, default_value_t = DEFAULT_WINDOW_CEILING)]
    window: usize,
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// One (source, destination) pair handed to the pipeline.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    source: PathBuf,
    dest: PathBuf,
}

/// Derive the output path: add the suffix when compressing, strip it when
/// decompressing. `None` means the file is skipped.
fn output_name(input: &Path, direction: Direction) -> Option<PathBuf> {
    let Some(name) = input.file_name().and_then(|n| n.to_str()) else {
        warn!("{:?}: not a UTF-8 file name -- skipped", input);
        return None;
    };
    match direction {
        Direction::Compress => {
            if name.ends_with(SUFFIX) {
                warn!("{:?} already has {} suffix -- unchanged", input, SUFFIX);
                return None;
            }
            let mut out = input.as_os_str().to_owned();
            out.push(SUFFIX);
            Some(PathBuf::from(out))
        }
        Direction::Decompress => {
            if name.len() <= SUFFIX.len() || !name.ends_with(SUFFIX) {
                return None;
            }
            Some(input.with_file_name(&name[..name.len() - SUFFIX.len()]))
        }
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Expand the command-line paths into per-file targets. Unreadable
/// directory entries are reported and counted in `failed`.
fn collect_targets(paths: &[PathBuf], direction: Direction, failed: &mut usize) -> Vec<Target> {
    let mut targets = Vec::new();
    for path in paths {
        if !path.is_dir() {
            if let Some(dest) = output_name(path, direction) {
                targets.push(Target {
                    source: path.clone(),
                    dest,
                });
            }
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            match entry {
                Ok(e) if e.file_type().is_file() => {
                    if let Some(dest) = output_name(e.path(), direction) {
                        targets.push(Target {
                            source: e.into_path(),
                            dest,
                        });
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("{}", e);
                    *failed += 1;
                }
            }
        }
    }
    targets
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn print_report(target: &Target, report: &FileReport) {
    println!("{:?} -> {:?}", target.source, target.dest);
    println!("  input         : {}", human_bytes(report.input_bytes));
    println!("  output        : {}", human_bytes(report.output_bytes));
    println!("  slices        : {}", report.slices);
    println!("  chunks        : {}", report.chunks);
    if report.recovered_faults > 0 {
        println!(
            "  skipped       : {} in {} undecodable region(s)",
            human_bytes(report.skipped_bytes),
            report.recovered_faults
        );
    }
    if let Some(stats) = &report.stats {
        println!("{}", stats);
    }
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let direction = if cli.decompress {
        Direction::Decompress
    } else {
        Direction::Compress
    };
    let params = SessionParams {
        algorithm: Algorithm::from_name(&cli.algorithm)?,
        level: cli.level,
        chunk_size: cli.chunk_size,
    };
    let config = PipelineConfig {
        window_ceiling: cli.window,
        keep_source: cli.keep,
        ..Default::default()
    };

    let mut session = Session::setup(params).context("codec session setup failed")?;
    let mut pipeline = Pipeline::new(&mut session, &config)?;

    let mut failed = 0usize;
    for target in collect_targets(&cli.files, direction, &mut failed) {
        match pipeline.transcode_file(&target.source, &target.dest, direction) {
            Ok(report) => print_report(&target, &report),
            Err(e) => {
                error!("{:?}: {}", target.source, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} file(s) failed", failed);
    }
    Ok(())
}
