use crate::config::Block;
use crate::error::SwitchError;
use crate::fetcher::Fetcher;
use crate::probe;
use crate::resources;
use crate::types::{
    FetchOutcome, GroupResult, GroupStatus, ResolvedResource, ResourceDescriptor, ResourceFailure,
    RunResult,
};
use futures::future::join_all;
use log::{info, warn};
use std::path::Path;

/// Reconciles every block concurrently and returns once all of them settled.
pub async fn reconcile_all<'a>(
    fetcher: &Fetcher,
    blocks: impl IntoIterator<Item = Block<'a>>,
) -> RunResult {
    let groups = join_all(
        blocks
            .into_iter()
            .map(|block| reconcile_block(fetcher, block)),
    )
    .await;

    info!("Done fetching/checking resources for {} blocks", groups.len());
    RunResult { groups }
}

/// Ensures every resource of `block` has a file under its download path.
///
/// Configuration problems reject the block before any request is made. Once
/// fetching starts, every resource is attempted and awaited regardless of how
/// its siblings fare.
pub async fn reconcile_block(fetcher: &Fetcher, block: Block<'_>) -> GroupResult {
    let download_path = block.config.download_path.clone();

    let status = match prepare(block).await {
        Ok(descriptors) => {
            let outcomes = join_all(
                descriptors
                    .iter()
                    .map(|d| check(fetcher, &download_path, d)),
            )
            .await;
            fold(block, descriptors.into_iter().zip(outcomes))
        }
        Err(error) => {
            warn!("Block '{}' rejected: {}", block.name, error);
            GroupStatus::Rejected { error }
        }
    };

    GroupResult {
        name: block.name.to_string(),
        download_path,
        status,
    }
}

async fn prepare(block: Block<'_>) -> Result<Vec<ResourceDescriptor>, SwitchError> {
    let descriptors = resources::normalize(block.name, block.config.resources.iter().cloned())?;
    tokio::fs::create_dir_all(&block.config.download_path).await?;
    Ok(descriptors)
}

async fn check(fetcher: &Fetcher, dir: &Path, descriptor: &ResourceDescriptor) -> FetchOutcome {
    let path = dir.join(&descriptor.filename);
    match probe::exists(&path).await {
        Ok(exists) => fetcher.fetch(descriptor, path, exists).await,
        Err(e) => FetchOutcome::Failed { error: e.into() },
    }
}

fn fold(
    block: Block<'_>,
    outcomes: impl Iterator<Item = (ResourceDescriptor, FetchOutcome)>,
) -> GroupStatus {
    let mut resolved = Vec::new();
    let mut failures = Vec::new();

    for (descriptor, outcome) in outcomes {
        match outcome {
            FetchOutcome::AlreadyPresent { path } => resolved.push(ResolvedResource {
                descriptor,
                path,
                fetched: false,
            }),
            FetchOutcome::Fetched { path } => resolved.push(ResolvedResource {
                descriptor,
                path,
                fetched: true,
            }),
            FetchOutcome::Failed { error } => {
                warn!(
                    "Fetch error in block '{}' for {}: {}",
                    block.name, descriptor.url, error
                );
                failures.push(ResourceFailure { descriptor, error });
            }
        }
    }

    if failures.is_empty() {
        let message = format!(
            "'{}' files checked-with/fetched-to: '{}'",
            block.name,
            block.config.download_path.display()
        );
        info!("{}", message);
        GroupStatus::Ok { message, resolved }
    } else {
        warn!(
            "Block '{}': {} of {} resources failed",
            block.name,
            failures.len(),
            failures.len() + resolved.len()
        );
        GroupStatus::Failed { resolved, failures }
    }
}
