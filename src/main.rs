mod cli;
mod config;
mod error;
mod fetcher;
mod markup;
mod probe;
mod reconcile;
mod report;
mod resources;
mod types;

use anyhow::{bail, Context};
use clap::Parser;
use cli::Cli;
use colored::*;
use config::SwitchConfig;
use fetcher::Fetcher;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use types::{GroupStatus, RunResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Starting cdn-switch");

    let cli = Cli::parse();

    let mut config = SwitchConfig::load(&cli.config)
        .await
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    cli.apply(&mut config);
    info!(
        "Config loaded: {} blocks, download_local={}, link_local={}",
        config.blocks.len(),
        config.download_local,
        config.link_local
    );

    let template = read_inputs(&cli.input).await?;

    let run = if config.download_local {
        let fetcher = Fetcher::new(config.timeout())?;
        Some(reconcile::reconcile_all(&fetcher, config.blocks()).await)
    } else {
        info!("download_local disabled, skipping resource reconciliation");
        None
    };

    let mut fragments = BTreeMap::new();
    let mut render_failures = 0;
    for block in config.blocks() {
        match markup::render_block(block, config.link_local) {
            Ok(html) => {
                fragments.insert(block.name.to_string(), html);
            }
            Err(e) => {
                error!("Failed to render block '{}': {}", block.name, e);
                eprintln!("{} {}", "Failed to render block".red(), block.name);
                render_failures += 1;
            }
        }
    }

    let spliced = markup::splice(&template, &fragments);
    for name in fragments.keys() {
        if spliced.replaced.contains(name) {
            info!(
                "Write: '{}' comment block written to: '{}'",
                name,
                cli.output.display()
            );
        } else {
            warn!("No cdn-switch marker found for block '{}'", name);
        }
    }

    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&cli.output, &spliced.html)
        .await
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    println!("File \"{}\" created.", cli.output.display());

    if let Some(run) = &run {
        print_summary(run);
        if let Some(path) = &cli.report {
            report::write_report_csv(run, path)
                .with_context(|| format!("failed to write report {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
    } else if cli.report.is_some() {
        warn!("--report ignored: nothing was reconciled");
    }

    let failed_groups = run.as_ref().map_or(0, |r| r.failed_groups().count());
    if failed_groups > 0 || render_failures > 0 {
        error!(
            "{} blocks failed to reconcile, {} failed to render",
            failed_groups, render_failures
        );
        bail!("CDN-Switch: some blocks did not complete");
    }

    Ok(())
}

async fn read_inputs(inputs: &[PathBuf]) -> anyhow::Result<String> {
    let mut parts = Vec::with_capacity(inputs.len());
    for path in inputs {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("source file \"{}\" not found", path.display()))?;
        parts.push(contents);
    }
    Ok(parts.join("\n"))
}

fn print_summary(run: &RunResult) {
    println!("\n{}", "Resource Summary:".bold());

    for group in &run.groups {
        match &group.status {
            GroupStatus::Ok { message, resolved } => {
                let fetched = resolved.iter().filter(|r| r.fetched).count();
                println!(
                    "✓ {} ({} fetched, {} already present)",
                    message.green(),
                    fetched,
                    resolved.len() - fetched
                );
            }
            GroupStatus::Failed { resolved, failures } => {
                println!(
                    "✗ '{}': {} of {} resources failed",
                    group.name.red(),
                    failures.len(),
                    failures.len() + resolved.len()
                );
                for failure in failures {
                    println!(
                        "  {} - Error: {}",
                        failure.descriptor.filename.red(),
                        failure.error
                    );
                    println!("    URL: {}", failure.descriptor.url);
                }
            }
            GroupStatus::Rejected { error } => {
                let kind = if error.is_configuration() {
                    "configuration error"
                } else {
                    "filesystem error"
                };
                println!("✗ '{}' rejected ({}): {}", group.name.red(), kind, error);
            }
        }
    }

    if run.is_success() {
        println!("\n{}", "All resources are in place".green());
    }
}
