use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "llama-launch")]
#[command(
	version,
	about = "Fetch a registered model's weights and start a local inference server",
	long_about = None
)]
pub struct Cli {
	/// File containing the model list between backticks [env: LLAMA_LAUNCH_CONFIG]
	#[arg(long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Directory where weights are stored [env: LLAMA_LAUNCH_MODELS_DIR]
	#[arg(long, value_name = "DIR")]
	pub models_dir: Option<PathBuf>,

	/// Server executable to launch [env: LLAMA_LAUNCH_SERVER]
	#[arg(long, value_name = "PATH")]
	pub server: Option<PathBuf>,

	/// List registered models and exit
	#[arg(long)]
	pub list: bool,

	/// Print the server command instead of downloading and launching
	#[arg(long, conflicts_with = "list")]
	pub dry_run: bool,

	/// Short name of the model to launch
	#[arg(required_unless_present = "list")]
	pub model: Option<String>,

	/// Arguments passed to the server unchanged
	#[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "SERVER_ARGS")]
	pub server_args: Vec<String>,
}

impl Cli {
	/// Command-line flags take precedence over settings and environment.
	pub fn apply_overrides(&self, config: &mut Config) {
		if let Some(path) = &self.config {
			config.registry_path = path.clone();
		}
		if let Some(dir) = &self.models_dir {
			config.models_dir = dir.clone();
		}
		if let Some(server) = &self.server {
			config.server_binary = server.clone();
		}
	}
}
