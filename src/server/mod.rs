use crate::error::{Error, Result};
use crate::model::ModelEntry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully resolved server invocation. Arguments go straight to the process
/// without passing through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
	pub program: PathBuf,
	pub args: Vec<String>,
}

impl ServerCommand {
	pub fn new(program: &Path, weights_path: &Path, entry: &ModelEntry, extra_args: &[String]) -> Self {
		let mut args = vec![
			"-m".to_string(),
			weights_path.display().to_string(),
			"-c".to_string(),
			entry.context_length.to_string(),
			"-ngl".to_string(),
			entry.n_gpu_layers.to_string(),
		];
		args.extend(extra_args.iter().cloned());

		Self {
			program: program.to_path_buf(),
			args,
		}
	}
}

impl fmt::Display for ServerCommand {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.program.display())?;
		for arg in &self.args {
			if arg.is_empty() || arg.chars().any(char::is_whitespace) {
				write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
			} else {
				write!(f, " {}", arg)?;
			}
		}
		Ok(())
	}
}

/// Runs a server command to completion and reports its exit code.
pub trait ProcessRunner {
	fn run(&self, command: &ServerCommand) -> Result<i32>;
}

/// Spawns the server as a child that shares this process's stdio.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
	fn run(&self, command: &ServerCommand) -> Result<i32> {
		tracing::info!("Starting server: {}", command);

		let status = Command::new(&command.program)
			.args(&command.args)
			.status()
			.map_err(|e| Error::LaunchFailed(format!("{}: {}", command.program.display(), e)))?;

		match status.code() {
			Some(code) => {
				tracing::info!("Server exited with status {}", code);
				Ok(code)
			}
			None => {
				tracing::warn!("Server terminated by signal ({})", status);
				Ok(1)
			}
		}
	}
}
