use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REGISTRY_PATH: &str = ".env.local";
pub const DEFAULT_MODELS_DIR: &str = "/models";
pub const DEFAULT_SERVER_BINARY: &str = "./server";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	/// File holding the backtick-delimited model list.
	pub registry_path: PathBuf,
	/// Weights are stored here under their `weightsFilename`.
	pub models_dir: PathBuf,
	pub server_binary: PathBuf,
	pub hf_token: Option<String>,
}

/// On-disk launcher settings. Every field is optional so a partial file
/// only overrides what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
	registry_path: Option<PathBuf>,
	models_dir: Option<PathBuf>,
	server_binary: Option<PathBuf>,
	hf_token: Option<String>,
}

impl Config {
	/// Defaults, then the settings file, then environment variables.
	pub fn from_env() -> Result<Self> {
		let mut config = Self::default();

		match std::env::var("LLAMA_LAUNCH_SETTINGS") {
			Ok(path) => {
				let path = PathBuf::from(path);
				if !path.exists() {
					return Err(Error::ConfigError(format!(
						"Settings file {:?} does not exist",
						path
					)));
				}
				config.merge_settings_file(&path)?;
			}
			Err(_) => {
				if let Some(project_dirs) = ProjectDirs::from("", "", "llama-launch") {
					config.merge_settings_file(&project_dirs.config_dir().join("config.toml"))?;
				}
			}
		}

		config.apply_env_vars(|key| std::env::var(key).ok());
		Ok(config)
	}

	/// Overlay a TOML settings file. A missing file is not an error.
	pub fn merge_settings_file(&mut self, path: &Path) -> Result<()> {
		if !path.exists() {
			return Ok(());
		}

		tracing::debug!("Reading launcher settings from {:?}", path);
		let content = fs::read_to_string(path)?;
		let settings: Settings = toml::from_str(&content)
			.map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;

		if let Some(registry_path) = settings.registry_path {
			self.registry_path = registry_path;
		}
		if let Some(models_dir) = settings.models_dir {
			self.models_dir = models_dir;
		}
		if let Some(server_binary) = settings.server_binary {
			self.server_binary = server_binary;
		}
		if settings.hf_token.is_some() {
			self.hf_token = settings.hf_token;
		}

		Ok(())
	}

	fn apply_env_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
		if let Some(path) = lookup("LLAMA_LAUNCH_CONFIG") {
			self.registry_path = PathBuf::from(path);
		}
		if let Some(dir) = lookup("LLAMA_LAUNCH_MODELS_DIR") {
			self.models_dir = PathBuf::from(dir);
		}
		if let Some(server) = lookup("LLAMA_LAUNCH_SERVER") {
			self.server_binary = PathBuf::from(server);
		}
		if let Some(token) = lookup("HF_TOKEN").filter(|t| !t.is_empty()) {
			self.hf_token = Some(token);
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
			models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
			server_binary: PathBuf::from(DEFAULT_SERVER_BINARY),
			hf_token: None,
		}
	}
}
