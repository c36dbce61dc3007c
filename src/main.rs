//! # tootpack CLI
//!
//! Command-line interface for the tootpack library.

use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use tootpack::cli::{Args, Command};
use tootpack::core::{MergePipeline, audit_duplicates, write_outputs};
use tootpack::sources::collect_input_files;
use tootpack::{MergeConfig, TootpackError};

fn main() {
    let args = <Args as ClapParser>::parse();
    init_tracing(args.log_filter());

    let result = match &args.command {
        Some(Command::CheckDups { file, id_field }) => check_dups(file, id_field),
        None => run(&args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(1);
        }
    }
}

/// Logs go to stderr so the summary on stdout stays clean.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<bool, TootpackError> {
    let total_start = Instant::now();
    let config = args.merge_config();

    println!("📦 tootpack v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let files = collect_input_files(&args.inputs, &args.extension)?;
    println!("📂 Inputs:  {} archive(s)", files.len());
    if let Some(path) = args.json_target() {
        println!("💾 JSON:    {}", path.display());
    }
    if let Some(path) = args.csv_target() {
        println!("💾 CSV:     {}", path.display());
    }
    println!();

    let merge_start = Instant::now();
    let mut pipeline = MergePipeline::new(config)?;
    for file in &files {
        let summary = pipeline.ingest_path(file)?;
        println!(
            "⏳ {}: {} records, {} kept",
            summary.name, summary.records_seen, summary.admitted
        );
    }
    let stats = *pipeline.stats();
    let dataset = pipeline.finish();
    let merge_time = merge_start.elapsed();

    println!("💾 Writing outputs...");
    let write_start = Instant::now();
    write_outputs(dataset.records(), args.json_target(), args.csv_target())?;
    let write_time = write_start.elapsed();

    let total_time = total_start.elapsed();

    println!();
    println!("✅ Done! {} records merged", dataset.len());

    println!();
    println!("📊 Summary:");
    println!("   Files:       {}", stats.files);
    println!("   Seen:        {} records", stats.records_seen);
    println!("   Kept:        {} records", stats.admitted);
    println!("   Duplicates:  {}", stats.duplicates);
    println!("   Missing id:  {}", stats.missing_identifier);
    if stats.skipped_non_objects > 0 {
        println!("   Non-objects: {}", stats.skipped_non_objects);
    }
    if stats.sanitize_fallbacks > 0 {
        println!("   Raw HTML:    {} field(s) kept unparsed", stats.sanitize_fallbacks);
    }

    println!();
    println!("⚡ Performance:");
    println!("   Merge time:  {:.2}s", merge_time.as_secs_f64());
    println!("   Write time:  {:.2}s", write_time.as_secs_f64());
    println!("   Total time:  {:.2}s", total_time.as_secs_f64());
    let secs = total_time.as_secs_f64();
    if secs > 0.0 {
        println!("   Throughput:  {:.0} records/sec", stats.records_seen as f64 / secs);
    }

    Ok(true)
}

/// Returns `Ok(false)` when duplicates were found.
fn check_dups(file: &std::path::Path, id_field: &str) -> Result<bool, TootpackError> {
    let config = MergeConfig::new().with_id_field(id_field);
    config.validate()?;

    let report = audit_duplicates(file, &config)?;

    println!("🔍 Checked {} records in {}", report.records, report.path.display());
    if report.is_clean() {
        println!("✅ No duplicate {} values", id_field);
        return Ok(true);
    }

    println!("⚠️  {} duplicate {} value(s):", report.duplicates.len(), id_field);
    for id in &report.duplicates {
        println!("   {}", id);
    }
    Ok(false)
}
