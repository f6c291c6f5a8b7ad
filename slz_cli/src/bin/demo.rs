//! SLZ walkthrough demo
//!
//! Generates a structured access-log dataset, pushes it through the slice
//! pipeline with every bundled algorithm using a window far smaller than the
//! file, verifies the round trip, and then damages one member in the middle
//! of a compressed file to show decompression resuming past it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;

use slz_codecs::format::{HeaderParse, MemberHeader, DEFAULT_CHUNK_SIZE, HEADER_SIZE};
use slz_codecs::{Algorithm, Session, SessionParams};
use slz_core::{Direction, FileReport, Pipeline, PipelineConfig};

// ── constants ──────────────────────────────────────────────────────────────

const TARGET_RAW_BYTES: u64 = 8 * 1024 * 1024; // 8 MB

// 1 MB windows: the 8 MB corpus never sits in memory at once
const DEMO_WINDOW: usize = 1024 * 1024;

const IPS: &[&str] = &[
    "203.0.113.42", "198.51.100.77", "192.0.2.15", "10.10.10.88",
    "172.16.254.1", "203.0.113.99", "198.51.100.3", "192.0.2.200",
];
const METHODS: &[&str] = &["GET", "GET", "GET", "POST", "PUT", "DELETE"];
const PATHS: &[&str] = &[
    "/api/v1/catalog/items?page={page}",
    "/api/v1/orders/{id}/status",
    "/api/v1/users/{id}/profile",
    "/api/v1/cart/items",
    "/static/assets/bundle.js",
    "/health",
];
const STATUSES: &[(u16, u32)] = &[
    (200, 4821), (200, 1204), (201, 312), (404, 95), (304, 0), (500, 512),
];

// ── data generator ──────────────────────────────────────────────────────────

/// Deterministic access log line for entry `i`.
fn generate_log_line(i: u64) -> Vec<u8> {
    let ip     = IPS[(i as usize * 7 + 3) % IPS.len()];
    let method = METHODS[(i as usize * 3 + 1) % METHODS.len()];
    let path   = PATHS[(i as usize * 11 + 5) % PATHS.len()]
        .replace("{page}", &((i % 200) + 1).to_string())
        .replace("{id}", &(i * 13 % 9_999_999).to_string());
    let (status, size) = STATUSES[(i as usize * 5 + 2) % STATUSES.len()];
    let lat_ms = (((i * 137 + 42) % 900) + 10) as f64 / 100.0;
    let ts_sec = 1_740_268_800u64 + (i * 7) % (86400 * 30);
    let (h, m, s) = ((ts_sec / 3600) % 24, (ts_sec / 60) % 60, ts_sec % 60);
    let day = (ts_sec / 86400) % 28 + 1;

    format!(
        "{ip} - - [{day:02}/Mar/2026:{h:02}:{m:02}:{s:02} +0000] \
         \"{method} {path} HTTP/1.1\" {status} {size} {lat_ms:.3}\n"
    )
    .into_bytes()
}

/// Write ~TARGET_RAW_BYTES of log lines to `path`. Returns (lines, bytes).
fn write_corpus(path: &Path) -> Result<(u64, u64)> {
    let mut w = BufWriter::new(File::create(path)?);
    let (mut i, mut total) = (0u64, 0u64);
    while total < TARGET_RAW_BYTES {
        let line = generate_log_line(i);
        total += line.len() as u64;
        w.write_all(&line)?;
        i += 1;
    }
    w.flush()?;
    Ok((i, total))
}

/// Reference point: the same bytes as one continuous gzip stream.
fn gzip_size(path: &Path) -> Result<u64> {
    let raw = std::fs::read(path)?;
    let mut enc = GzEncoder::new(Vec::new(), GzCompression::default());
    enc.write_all(&raw)?;
    Ok(enc.finish()?.len() as u64)
}

fn session(algorithm: Algorithm) -> Result<Session> {
    Session::setup(SessionParams {
        algorithm,
        level: 3,
        chunk_size: DEFAULT_CHUNK_SIZE,
    })
}

fn transcode(session: &mut Session, src: &Path, dst: &Path, direction: Direction) -> Result<FileReport> {
    let config = PipelineConfig {
        window_ceiling: DEMO_WINDOW,
        keep_source: true,
        ..Default::default()
    };
    Ok(Pipeline::new(session, &config)?.transcode_file(src, dst, direction)?)
}

// ── demo runner ─────────────────────────────────────────────────────────────

fn run() -> Result<()> {
    let out_dir = std::env::temp_dir().join("slz_demo");
    std::fs::create_dir_all(&out_dir)?;

    let corpus_path   = out_dir.join("access.log");
    let packed_path   = out_dir.join("access.log.slz");
    let restored_path = out_dir.join("access.log.out");
    let damaged_path  = out_dir.join("damaged.log.slz");
    let salvaged_path = out_dir.join("damaged.log");

    // ── banner ───────────────────────────────────────────────────────────────
    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║        SLZ  ·  bounded-memory slice transcoding  ·  demo         ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // ── Phase 0: Data Generation ─────────────────────────────────────────────
    section("0 · DATA GENERATION");
    let (lines, raw_bytes) = timed_step("corpus", || write_corpus(&corpus_path))?;
    println!("  log entries   : {}", format_number(lines));
    println!("  raw size      : {}", human_bytes(raw_bytes));
    println!("  window        : {}  ({} slices per pass)",
        human_bytes(DEMO_WINDOW as u64),
        raw_bytes.div_ceil(DEMO_WINDOW as u64));
    println!();

    // ── Phase 1: Compression ─────────────────────────────────────────────────
    section("1 · COMPRESSION");
    println!("  {:<12} {:>12}  {:>12}  {:>8}  {:>10}  {:>12}",
             "Algorithm", "Raw", "Compressed", "Ratio", "Time", "Throughput");
    println!("  {}", "─".repeat(74));

    for &algorithm in Algorithm::ALL {
        let mut s = session(algorithm)?;
        let packed = transcode(&mut s, &corpus_path, &packed_path, Direction::Compress)?;
        let unpacked = transcode(&mut s, &packed_path, &restored_path, Direction::Decompress)?;
        let ok = std::fs::read(&restored_path)? == std::fs::read(&corpus_path)?;
        print_row(&format!("{algorithm:?}"), &packed, if ok { "✓ round trip" } else { "⚠ MISMATCH" });
        if let Some(stats) = &unpacked.stats {
            println!("  {:<12} {:>12}  {:>12}  {:>8}  {:>10}  {:>12}",
                "  decode", "", "", "", fmt_duration(stats.elapsed),
                format!("{:.0} Mbit/s", stats.throughput_mbit));
        }
    }

    let gz = gzip_size(&corpus_path)?;
    println!("  \x1b[2m{:<12} {:>12}  {:>12}  {:>7.2}x  {:>10}  one stream, no slices\x1b[0m",
        "gzip", human_bytes(raw_bytes), human_bytes(gz), raw_bytes as f64 / gz as f64, "—");

    // ── Phase 2: Full stats for the default algorithm ────────────────────────
    section("2 · PIPELINE REPORT  (deflate)");
    let mut s = session(Algorithm::Deflate)?;
    let report = transcode(&mut s, &corpus_path, &packed_path, Direction::Compress)?;
    println!("  slices        : {}", report.slices);
    println!("  codec calls   : {}", report.chunks);
    if let Some(stats) = &report.stats {
        println!("{stats}");
    }

    // ── Phase 3: Resume after damage ─────────────────────────────────────────
    section("3 · DAMAGED INPUT  ·  resume past an undecodable member");
    let mut packed = std::fs::read(&packed_path)?;
    let offsets = member_offsets(&packed)?;
    let victim = offsets.len() / 2;
    let victim_raw = match MemberHeader::parse(&packed[offsets[victim]..]) {
        HeaderParse::Valid(h) => h.raw_len as u64,
        _ => anyhow::bail!("member {victim} did not parse"),
    };
    packed[offsets[victim] + HEADER_SIZE + 7] ^= 0xA5;
    std::fs::write(&damaged_path, &packed)?;
    println!("  flipped one payload byte in member {} of {}", victim, offsets.len());

    let salvaged = transcode(&mut s, &damaged_path, &salvaged_path, Direction::Decompress)?;
    println!("  resumed       : {} time(s), skipping {}",
        salvaged.recovered_faults, human_bytes(salvaged.skipped_bytes));
    println!("  consumed      : {} of {}", human_bytes(salvaged.consumed_bytes), human_bytes(salvaged.input_bytes));
    println!("  recovered     : {} of {}  (lost {}, one chunk)",
        human_bytes(salvaged.output_bytes), human_bytes(raw_bytes),
        human_bytes(raw_bytes - salvaged.output_bytes));
    if raw_bytes - salvaged.output_bytes == victim_raw {
        println!("  ✓ exactly the damaged member was dropped");
    }
    println!();

    for p in [&corpus_path, &packed_path, &restored_path, &damaged_path, &salvaged_path] {
        let _ = std::fs::remove_file(p);
    }
    Ok(())
}

// ── small helpers ──────────────────────────────────────────────────────────

fn member_offsets(packed: &[u8]) -> Result<Vec<usize>> {
    let mut offsets = Vec::new();
    let mut pos = 0;
    while pos < packed.len() {
        offsets.push(pos);
        match MemberHeader::parse(&packed[pos..]) {
            HeaderParse::Valid(h) => pos += h.member_len(),
            other => anyhow::bail!("unexpected member at {pos}: {other:?}"),
        }
    }
    Ok(offsets)
}

fn human_bytes(n: u64) -> String {
    const U: &[&str] = &["B", "KB", "MB", "GB"];
    let mut v = n as f64;
    let mut u = 0;
    while v >= 1024.0 && u < U.len() - 1 { v /= 1024.0; u += 1; }
    if u == 0 { format!("{n} B") } else { format!("{v:.2} {}", U[u]) }
}

fn fmt_duration(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms < 1.0 {
        format!("{:.1} µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{ms:.1} ms")
    } else {
        format!("{:.2} s", d.as_secs_f64())
    }
}

fn section(title: &str) {
    println!("━━━ {title} {}", "━".repeat(70usize.saturating_sub(title.len() + 5)));
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 { out.push(','); }
        out.push(c);
    }
    out.chars().rev().collect()
}

fn print_row(label: &str, report: &FileReport, note: &str) {
    let ratio = report.input_bytes as f64 / report.output_bytes.max(1) as f64;
    let (time, rate) = match &report.stats {
        Some(s) => (fmt_duration(s.elapsed), format!("{:.0} Mbit/s", s.throughput_mbit)),
        None => ("—".to_string(), "—".to_string()),
    };
    println!("  {:<12} {:>12}  {:>12}  {:>7.2}x  {:>10}  {:>12}  {note}",
        label,
        human_bytes(report.input_bytes),
        human_bytes(report.output_bytes),
        ratio,
        time,
        rate,
    );
}

fn timed_step<T, F: FnOnce() -> Result<T>>(label: &str, f: F) -> Result<T> {
    eprint!("  writing {label:<24} ");
    let t0 = Instant::now();
    let r = f().with_context(|| format!("{label} failed"))?;
    eprintln!("done  ({:.2}s)", t0.elapsed().as_secs_f64());
    Ok(r)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
