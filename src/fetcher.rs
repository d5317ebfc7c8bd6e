use crate::error::SwitchError;
use crate::types::{FetchOutcome, ResourceDescriptor};
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const STAGING_SUFFIX: &str = ".part";

pub struct Fetcher {
    client: reqwest::Client,
    progress: MultiProgress,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, SwitchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            progress: MultiProgress::new(),
        })
    }

    /// Resolves one resource to `path`. When `exists` is set nothing is requested;
    /// otherwise the body is downloaded and the file appears at `path` only once
    /// the transfer completed.
    pub async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        path: PathBuf,
        exists: bool,
    ) -> FetchOutcome {
        if exists {
            debug!("Already present, skipping: {}", path.display());
            return FetchOutcome::AlreadyPresent { path };
        }

        info!("Fetching: {} -> {}", descriptor.url, path.display());
        let pb = self.progress.add(self.create_progress_bar(descriptor));

        match self.download(descriptor, &path, &pb).await {
            Ok(bytes) => {
                pb.finish_and_clear();
                debug!("Wrote {} bytes to {}", bytes, path.display());
                FetchOutcome::Fetched { path }
            }
            Err(error) => {
                pb.abandon_with_message(format!("Failed: {}", descriptor.filename));
                error!("Fetch failed for {}: {}", descriptor.url, error);
                FetchOutcome::Failed { error }
            }
        }
    }

    async fn download(
        &self,
        descriptor: &ResourceDescriptor,
        path: &Path,
        pb: &ProgressBar,
    ) -> Result<u64, SwitchError> {
        let resp = self.client.get(&descriptor.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwitchError::HttpStatus {
                status: status.as_u16(),
                url: descriptor.url.clone(),
            });
        }

        pb.set_length(resp.content_length().unwrap_or(0));

        // Staged under a fresh hidden name so no other resource's path is ever
        // opened; dropping `staging` on any error removes it.
        let staging = tempfile::Builder::new()
            .prefix(".")
            .suffix(STAGING_SUFFIX)
            .tempfile_in(staging_dir(path))?;
        let written = write_body(resp, staging.as_file().try_clone()?, pb).await?;
        staging.persist(path).map_err(|e| e.error)?;
        Ok(written)
    }

    fn create_progress_bar(&self, descriptor: &ResourceDescriptor) -> ProgressBar {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(descriptor.filename.clone());
        pb
    }
}

async fn write_body(
    resp: reqwest::Response,
    staging: std::fs::File,
    pb: &ProgressBar,
) -> Result<u64, SwitchError> {
    let mut file = File::from_std(staging);
    let mut stream = resp.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.set_position(written);
    }

    file.flush().await?;
    Ok(written)
}

fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
