//! Hartape CLI

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use hartape::repository::ArchiveSettings;
use hartape::RecorderConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        usage();
        process::exit(1);
    }

    let command = &args[1];

    let result = match command.as_str() {
        "stats" => {
            if args.len() < 3 {
                eprintln!("Usage: hartape stats <archive>");
                process::exit(1);
            }
            show_stats(&PathBuf::from(&args[2]))
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: hartape check <config.toml>");
                process::exit(1);
            }
            check_config(&PathBuf::from(&args[2]))
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'hartape' for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn usage() {
    eprintln!("Hartape v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: hartape <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  stats <archive>        Summarize a recorded interaction");
    eprintln!("  check <config.toml>    Validate a recorder configuration");
}

fn show_stats(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read archive {}", path.display()))?;
    let name = path.display().to_string();
    let interaction = ArchiveSettings::default()
        .decode(&text, &name)
        .context("Failed to parse archive")?;

    let mut methods: BTreeMap<&str, usize> = BTreeMap::new();
    let mut statuses: BTreeMap<u16, usize> = BTreeMap::new();
    let mut total = Duration::ZERO;

    for message in &interaction.messages {
        *methods.entry(message.request().method.as_str()).or_default() += 1;
        *statuses.entry(message.response.status).or_default() += 1;
        total += message.timings.elapsed;
    }

    println!("Archive: {}", path.display());
    println!("Entries: {}", interaction.len());
    println!("Recorded time: {:.3}s", total.as_secs_f64());
    println!();
    println!("Methods:");
    for (method, count) in &methods {
        println!("  {method:<8} {count}");
    }
    println!();
    println!("Statuses:");
    for (status, count) in &statuses {
        println!("  {status:<8} {count}");
    }

    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = RecorderConfig::from_file(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    println!("Configuration OK: {}", path.display());
    println!("  interaction: {}", config.interaction);
    println!("  mode:        {}", config.mode);
    println!("  archive:     {}", config.archive.path_for(&config.interaction).display());
    println!(
        "  matcher:     {:?}, {} rules",
        config.matcher.cardinality,
        config.matcher.rules.len()
    );

    Ok(())
}
