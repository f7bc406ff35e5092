use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};

use sitewatch::config::app_config::{AppConfig, load_config};
use sitewatch::http_probe::prelude::*;
use sitewatch::{logging, watch};
use sitewatch::report::{Report, StatusGroup, Summary};
use sitewatch::store::{AdvisoryCounts, LoadSource, SiteListStore, looks_valid, parse_site_lines};

#[derive(Parser)]
#[command(name = "sitewatch", version, about)]
struct Cli {
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Site list document to use instead of the configured one
    #[arg(long, global = true)]
    sites_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the site list
    List,
    /// Append URLs to the site list
    Add {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Replace the whole list with one URL per line from a file, or stdin
    Set {
        /// Read from this file; stdin when omitted or `-`
        file: Option<PathBuf>,
    },
    /// Remove every occurrence of a URL
    Remove {
        url: String,
        /// Allow saving an empty list
        #[arg(long)]
        force: bool,
    },
    /// Replace the site list with the defaults
    Reset,
    /// Probe every site once
    Check {
        /// Write a JSON report here
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Probe every site repeatedly until interrupted
    Watch,
}

fn to_fixed_width(input: &str, width: usize) -> String {
    use unicode_truncate::UnicodeTruncateStr;

    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

fn marker(category: Category) -> &'static str {
    match StatusGroup::from(category) {
        StatusGroup::Online => "✅",
        StatusGroup::Warning => "⚠️",
        StatusGroup::Offline => "❌",
    }
}

fn print_results(sites: &[String], results: &HashMap<String, ProbeOutcome>) {
    let width = sites.iter().map(|s| s.len()).max().unwrap_or(10).min(60);
    let mut printed = std::collections::HashSet::new();

    for site in sites {
        if !printed.insert(site.as_str()) {
            continue;
        }
        let Some(outcome) = results.get(site) else {
            continue;
        };
        println!(
            "{} {} {:<24} {:>10.2}ms",
            marker(outcome.category),
            to_fixed_width(site, width),
            outcome.display_label(),
            outcome.response_time_ms
        );
    }

    let summary = Summary::from_outcomes(results);
    println!(
        "{} sites: {} online, {} warnings, {} offline",
        summary.total_sites, summary.online, summary.warnings, summary.offline
    );
}

fn load_sites(store: &SiteListStore) -> Vec<String> {
    let (sites, source) = store.load_with_source();
    match source {
        LoadSource::File => {}
        LoadSource::NotFound => println!("No site list found, using defaults."),
        LoadSource::ParseError => {
            println!("Site list {} is corrupt, using defaults.", store.path().display())
        }
    }
    sites
}

async fn run_batch(
    app: &AppConfig,
    store: &SiteListStore,
    report_path: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sites = load_sites(store);
    if sites.is_empty() {
        println!("No websites configured. Add some URLs first.");
        return Ok(());
    }

    let checked_at = Utc::now();
    let results = check_all(
        &sites,
        app.config.timeout_seconds,
        app.config.max_concurrency,
    )
    .await;

    println!("Checked at {}", checked_at.to_rfc3339());
    print_results(&sites, &results);

    if let Some(path) = report_path {
        Report::from_outcomes(&results, checked_at).write_to(path)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let mut app = load_config()?;
    if let Some(timeout) = cli.timeout {
        app.config.timeout_seconds = timeout;
    }
    if let Some(concurrency) = cli.concurrency {
        app.config.max_concurrency = concurrency;
    }
    if let Some(sites_file) = cli.sites_file {
        app.config.sites_file = sites_file;
    }
    app.validate()?;

    let store = app.store();

    match cli.command {
        Command::List => {
            for site in load_sites(&store) {
                println!("{site}");
            }
        }
        Command::Add { urls } => {
            let mut sites = store.load();
            for url in urls {
                let url = url.trim().to_string();
                if url.is_empty() {
                    continue;
                }
                if !looks_valid(&url) {
                    println!("⚠️ {url} may need http:// or https://");
                }
                sites.push(url);
            }
            store.save(&sites)?;
            println!("Saved {} sites.", sites.len());
        }
        Command::Set { file } => {
            let text = match file {
                Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)?,
                _ => std::io::read_to_string(std::io::stdin())?,
            };
            let sites = parse_site_lines(&text);
            if sites.is_empty() {
                return Err("refusing to save an empty site list".into());
            }

            let counts = AdvisoryCounts::of(&sites);
            println!("✅ {} valid URL(s)", counts.valid);
            if counts.invalid > 0 {
                println!("⚠️ {} URL(s) may need http:// or https://", counts.invalid);
            }
            store.save(&sites)?;
            println!("Saved {} sites.", sites.len());
        }
        Command::Remove { url, force } => {
            let mut sites = store.load();
            let before = sites.len();
            sites.retain(|site| site != &url);
            if sites.len() == before {
                println!("{url} is not in the list.");
                return Ok(());
            }
            if sites.is_empty() && !force {
                return Err("refusing to save an empty site list (pass --force)".into());
            }
            store.save(&sites)?;
            println!("Removed {}, {} sites left.", url, sites.len());
        }
        Command::Reset => {
            store.save(store.defaults())?;
            println!("Restored {} default sites.", store.defaults().len());
        }
        Command::Check { report } => {
            let report_path = report.or_else(|| app.config.report_file.clone());
            run_batch(&app, &store, report_path.as_ref()).await?;
        }
        Command::Watch => {
            let interval = Duration::from_secs(app.config.polling_interval_seconds);
            log::info!(
                "Watching {} every {}s",
                store.path().display(),
                interval.as_secs()
            );
            let stop = watch::interrupt_signal();
            let (app, store) = (&app, &store);
            watch::run_until_stopped(interval, stop, move || async move {
                // A failed report write shouldn't stop the loop.
                if let Err(e) = run_batch(app, store, app.config.report_file.as_ref()).await {
                    log::error!("Batch failed: {e}");
                }
            })
            .await;
        }
    }

    Ok(())
}
