//! Main entry point for the autozip CLI application.
//!
//! Collects files, folders and HTTP URLs from the command line, builds one
//! archive out of them and saves it into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use autozip::cli::Input;
use autozip::{
    Archiver, ChainSource, Cli, DirectorySink, EntrySource, HttpSource, LocalSource, Phase,
    Progress, SaveReport,
};

/// Application entry point.
///
/// Sets up logging, runs the build and prints a summary line.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = cli.options()?;
    let mut source = build_source(&cli)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let render = spawn_progress(rx, cli.is_quiet());
    let archiver = Archiver::new().with_progress(move |p: Progress| {
        let _ = tx.send(p);
    });

    let primary = DirectorySink::new(&cli.output_dir).overwrite(cli.overwrite);
    let fallback = DirectorySink::temp();
    let result = archiver
        .run(source.as_mut(), options, &primary, Some(&fallback))
        .await;

    // Closing the channel lets the renderer finish its line
    drop(archiver);
    let _ = render.await;

    let report = result.context("failed to create archive")?;
    if !cli.is_quiet() {
        print_report(&report);
    }

    Ok(())
}

/// Turn the command-line inputs into one entry source.
///
/// Consecutive local paths share a [`LocalSource`] and consecutive URLs share
/// an [`HttpSource`], so entries keep the order they were given in.
fn build_source(cli: &Cli) -> Result<Box<dyn EntrySource>> {
    let mut sources: Vec<Box<dyn EntrySource>> = Vec::new();
    let mut locals = Vec::new();
    let mut urls = Vec::new();

    for input in cli.inputs() {
        match input {
            Input::Local(path) => {
                if !urls.is_empty() {
                    sources.push(Box::new(HttpSource::new(std::mem::take(&mut urls))?));
                }
                locals.push(path);
            }
            Input::Url(url) => {
                if !locals.is_empty() {
                    sources.push(Box::new(LocalSource::new(std::mem::take(&mut locals))?));
                }
                urls.push(url);
            }
        }
    }
    if !locals.is_empty() {
        sources.push(Box::new(LocalSource::new(locals)?));
    }
    if !urls.is_empty() {
        sources.push(Box::new(HttpSource::new(urls)?));
    }

    Ok(Box::new(ChainSource::new(sources)))
}

/// Render progress events as a single updating line on stderr.
fn spawn_progress(mut rx: mpsc::UnboundedReceiver<Progress>, quiet: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut drawn = false;
        while let Some(progress) = rx.recv().await {
            if quiet {
                continue;
            }
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r{:>3}% {:<24}", progress.percent, progress.phase);
            let _ = stderr.flush();
            drawn = true;

            if matches!(progress.phase, Phase::Done | Phase::Failed) {
                let _ = writeln!(stderr);
                drawn = false;
            }
        }
        if drawn {
            eprintln!();
        }
    })
}

fn print_report(report: &SaveReport) {
    if let Some(cause) = &report.fallback_cause {
        eprintln!("warning: {cause}");
        eprintln!("warning: saved to the temporary directory instead");
    }
    println!(
        "  created: {} ({})",
        report.location.display(),
        format_size(report.size)
    );
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
