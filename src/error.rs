use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Model not found: {name}, choose from [{}]", .available.join(", "))]
	ModelNotFound { name: String, available: Vec<String> },
	#[error("Failed to read model registry {path:?}")]
	RegistryRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("Failed to parse model registry: {0}")]
	ParseError(String),
	#[error("Download failed: {0}")]
	DownloadFailed(String),
	#[error("Failed to launch server: {0}")]
	LaunchFailed(String),
	#[error("Configuration error: {0}")]
	ConfigError(String),
	#[error(transparent)]
	IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::ParseError(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
