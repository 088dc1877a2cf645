//! portal-probe CLI entry point.
//!
//! Usage:
//!   portal-probe os [--config PATH]          # Is this host OpenWrt?
//!   portal-probe walk [OPTIONS] PATTERN...   # Walk files looking for a marker line

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use portal_probe::os::OPENWRT_MARKER;
use portal_probe::{ProbeConfig, probe_host};
use portal_walk::{BoxError, DirFs, FileWalker, Inspection, LineScanner};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None | Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("portal-probe {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }

        Some("os") => run_os(&args[2..]),

        Some("walk") => run_walk(&args[2..]),

        Some(unknown) => {
            eprintln!("Unknown command: {unknown}");
            eprintln!("Run 'portal-probe --help' for usage.");
            Ok(ExitCode::from(2))
        }
    }
}

fn print_help() {
    println!(r#"portal-probe v{}

Usage:
  portal-probe os [--config PATH]             Report whether the host is OpenWrt
  portal-probe walk [OPTIONS] PATTERN...      Walk files matching PATTERN

Options:
  -h, --help                   Show this help
  -V, --version                Show version

Walk Options:
  --root <dir>                 Directory the patterns are relative to (default: .)
  --marker <text>              Line that ends the walk with a match (default: "{}")
  --follow                     Treat every other non-empty line as a pattern to visit

The walk exits 0 on a match, 1 without one and 2 on error.
"#, env!("CARGO_PKG_VERSION"), OPENWRT_MARKER);
}

/// Probe the host (or the configured root) for OpenWrt.
fn run_os(args: &[String]) -> Result<ExitCode> {
    let mut config_path: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                config_path = Some(PathBuf::from(path));
            }
            s if s.starts_with("--config=") => {
                config_path = Some(PathBuf::from(&s["--config=".len()..]));
            }
            other => bail!("unknown os option: {other}"),
        }
    }

    let config = match config_path {
        Some(path) => ProbeConfig::load_from(&path)?,
        None => ProbeConfig::load()?,
    };

    println!("openwrt: {}", probe_host(&config)?);
    Ok(ExitCode::SUCCESS)
}

/// Walk files from the given seed patterns.
fn run_walk(args: &[String]) -> Result<ExitCode> {
    let mut root = PathBuf::from(".");
    let mut marker = OPENWRT_MARKER.to_string();
    let mut follow = false;
    let mut seeds: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--root" => {
                root = PathBuf::from(iter.next().context("--root requires a directory")?);
            }
            "--marker" => {
                marker = iter.next().context("--marker requires a value")?.clone();
            }
            "--follow" => follow = true,
            "--" => seeds.extend(iter.by_ref().cloned()),
            s if s.starts_with("--") => bail!("unknown walk option: {s}"),
            s => seeds.push(s.to_string()),
        }
    }

    let fs = DirFs::new(&root);
    let found = FileWalker::from_fn(|r: &mut dyn Read| -> Result<Inspection, BoxError> {
        let mut patterns = Vec::new();
        for line in LineScanner::new(r) {
            let line = line?;
            if line == marker {
                return Ok(Inspection::stop());
            }
            if follow && !line.is_empty() {
                patterns.push(line);
            }
        }
        Ok(Inspection::follow(patterns))
    })
    .walk(&fs, seeds.as_slice())
    .with_context(|| format!("walking {}", root.display()))?;

    if found {
        println!("matched");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("no match");
        Ok(ExitCode::FAILURE)
    }
}
