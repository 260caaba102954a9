use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::ModelEntry;
use hf_hub::api::sync::ApiBuilder;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Fetches a single file from a remote model repository.
pub trait WeightsFetcher {
    /// Place `filename` from `repo_id` at `destination`. The parent directory
    /// already exists when this is called.
    fn fetch(&self, repo_id: &str, filename: &str, destination: &Path) -> Result<()>;
}

/// Hub cache used while a download is in flight. It lives inside the models
/// directory so the finished blob can be renamed into place.
pub const STAGING_DIR: &str = ".hf-cache";

/// Downloads through a staging Hugging Face Hub cache and moves the result out.
pub struct HubFetcher {
    cache_dir: PathBuf,
    token: Option<String>,
    progress: bool,
}

impl HubFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            cache_dir: config.models_dir.join(STAGING_DIR),
            token: config.hf_token.clone(),
            progress: std::io::stderr().is_terminal(),
        }
    }

    fn download(&self, repo_id: &str, filename: &str) -> Result<PathBuf> {
        let mut builder = ApiBuilder::new()
            .with_progress(self.progress)
            .with_cache_dir(self.cache_dir.clone());
        if self.token.is_some() {
            builder = builder.with_token(self.token.clone());
        }
        let api = builder
            .build()
            .map_err(|e| Error::DownloadFailed(format!("Failed to initialize HuggingFace API: {}", e)))?;

        api.model(repo_id.to_string())
            .get(filename)
            .map_err(|e| Error::DownloadFailed(format!("{}/{}: {}", repo_id, filename, e)))
    }
}

impl WeightsFetcher for HubFetcher {
    fn fetch(&self, repo_id: &str, filename: &str, destination: &Path) -> Result<()> {
        let partial = partial_path(destination);

        let result = self
            .download(repo_id, filename)
            .and_then(|cached| place_file(&cached, destination, &partial));

        remove_staging(&self.cache_dir, &partial);
        result
    }
}

/// Move a cached file to `destination`. The cache entry may be a symlink into
/// the blob store, so the link is resolved first. When a rename is not
/// possible the blob is copied under `partial` and renamed from there, so an
/// interrupted copy never passes the existence check.
fn place_file(cached: &Path, destination: &Path, partial: &Path) -> Result<()> {
    let blob = fs::canonicalize(cached)
        .map_err(|e| Error::DownloadFailed(format!("Could not resolve {:?}: {}", cached, e)))?;

    tracing::debug!("Moving {:?} to {:?}", blob, destination);
    if let Err(e) = fs::rename(&blob, destination) {
        tracing::debug!("Rename failed ({}), copying instead", e);
        fs::copy(&blob, partial).map_err(|e| {
            Error::DownloadFailed(format!("Could not copy {:?} to {:?}: {}", blob, partial, e))
        })?;
        fs::rename(partial, destination).map_err(|e| {
            Error::DownloadFailed(format!("Could not move {:?} into place: {}", partial, e))
        })?;
    }

    Ok(())
}

/// Remove the staging cache and any leftover partial copy.
fn remove_staging(cache_dir: &Path, partial: &Path) {
    if let Err(e) = fs::remove_dir_all(cache_dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not remove download cache {:?}: {}", cache_dir, e);
        }
    }
    if let Err(e) = fs::remove_file(partial) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not remove partial download {:?}: {}", partial, e);
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

pub struct ModelDownloader<F> {
    models_dir: PathBuf,
    fetcher: F,
}

impl<F: WeightsFetcher> ModelDownloader<F> {
    pub fn new(config: &Config, fetcher: F) -> Self {
        Self {
            models_dir: config.models_dir.clone(),
            fetcher,
        }
    }

    pub fn weights_path(&self, entry: &ModelEntry) -> PathBuf {
        self.models_dir.join(&entry.weights_filename)
    }

    /// Presence is all that is checked; the file contents are not verified.
    pub fn is_present(&self, entry: &ModelEntry) -> bool {
        self.weights_path(entry).exists()
    }

    /// Returns the local weights path, downloading the file first if absent.
    pub fn ensure(&self, entry: &ModelEntry) -> Result<PathBuf> {
        let weights_path = self.weights_path(entry);

        if weights_path.exists() {
            tracing::info!("Using existing weights at {:?}", weights_path);
            return Ok(weights_path);
        }

        if let Some(parent) = weights_path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(
            "Downloading {} from {} to {:?}",
            entry.weights_filename,
            entry.name,
            weights_path
        );
        self.fetcher
            .fetch(&entry.name, &entry.weights_filename, &weights_path)?;
        tracing::info!("Downloaded weights for '{}'", entry.short_name);

        Ok(weights_path)
    }
}
