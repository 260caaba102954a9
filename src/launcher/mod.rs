use crate::config::Config;
use crate::error::Result;
use crate::model::{ModelDownloader, ModelEntry, ModelRegistry, WeightsFetcher};
use crate::server::{ProcessRunner, ServerCommand};
use std::path::PathBuf;

/// What a launch would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub command: ServerCommand,
    pub needs_download: bool,
}

#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub entry: ModelEntry,
    pub weights_path: PathBuf,
    pub present: bool,
}

pub struct Launcher<F, R> {
    config: Config,
    downloader: ModelDownloader<F>,
    runner: R,
}

impl<F: WeightsFetcher, R: ProcessRunner> Launcher<F, R> {
    pub fn new(config: Config, fetcher: F, runner: R) -> Self {
        let downloader = ModelDownloader::new(&config, fetcher);
        Self {
            config,
            downloader,
            runner,
        }
    }

    /// Resolve `model_name`, make sure its weights are on disk, then run the
    /// server until it exits. Returns the server's exit code.
    pub fn run(&self, model_name: &str, extra_args: &[String]) -> Result<i32> {
        let registry = ModelRegistry::load(&self.config)?;
        let entry = registry.get_model(model_name)?;
        tracing::info!("Resolved '{}' to {}", model_name, entry.name);

        let weights_path = self.downloader.ensure(entry)?;

        let command = ServerCommand::new(&self.config.server_binary, &weights_path, entry, extra_args);
        self.runner.run(&command)
    }

    pub fn plan(&self, model_name: &str, extra_args: &[String]) -> Result<LaunchPlan> {
        let registry = ModelRegistry::load(&self.config)?;
        let entry = registry.get_model(model_name)?;

        let weights_path = self.downloader.weights_path(entry);
        Ok(LaunchPlan {
            needs_download: !weights_path.exists(),
            command: ServerCommand::new(&self.config.server_binary, &weights_path, entry, extra_args),
        })
    }

    pub fn list(&self) -> Result<Vec<ModelStatus>> {
        let registry = ModelRegistry::load(&self.config)?;

        Ok(registry
            .list_models()
            .into_iter()
            .map(|entry| ModelStatus {
                weights_path: self.downloader.weights_path(entry),
                present: self.downloader.is_present(entry),
                entry: entry.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::downloader::tests::RecordingFetcher;
    use crate::server::tests::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    const REGISTRY: &str = r#"MODELS=`[{"shortName":"tiny","name":"org/tiny-model","weightsFilename":"tiny.gguf","nGpuLayers":0,"contextLength":2048}]`"#;

    fn setup(temp_dir: &TempDir) -> Config {
        let registry_path = temp_dir.path().join(".env.local");
        fs::write(&registry_path, REGISTRY).unwrap();

        Config {
            registry_path,
            models_dir: temp_dir.path().join("models"),
            server_binary: PathBuf::from("./server"),
            hf_token: None,
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_existing_weights_launch_without_download() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(&temp_dir);
        fs::create_dir_all(&config.models_dir).unwrap();
        let weights = config.models_dir.join("tiny.gguf");
        fs::write(&weights, b"anything").unwrap();

        let fetcher = RecordingFetcher::default();
        let runner = RecordingRunner::default();
        let launcher = Launcher::new(config, &fetcher, &runner);

        launcher.run("tiny", &args(&["--verbose"])).unwrap();

        assert!(fetcher.calls.borrow().is_empty());
        let commands = runner.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program, PathBuf::from("./server"));
        assert_eq!(
            commands[0].args,
            args(&[
                "-m",
                &weights.display().to_string(),
                "-c",
                "2048",
                "-ngl",
                "0",
                "--verbose"
            ])
        );
    }

    #[test]
    fn test_unknown_model_has_no_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(&temp_dir);
        let models_dir = config.models_dir.clone();

        let fetcher = RecordingFetcher::default();
        let runner = RecordingRunner::default();
        let launcher = Launcher::new(config, &fetcher, &runner);

        let err = launcher.run("missing", &[]).unwrap_err();

        match &err {
            Error::ModelNotFound { name, available } => {
                assert_eq!(name, "missing");
                assert_eq!(available, &vec!["tiny".to_string()]);
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
        assert!(err.to_string().contains("missing"));
        assert!(err.to_string().contains("tiny"));
        assert!(fetcher.calls.borrow().is_empty());
        assert!(runner.commands.borrow().is_empty());
        assert!(!models_dir.exists());
    }

    #[test]
    fn test_missing_weights_downloaded_then_launched() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(&temp_dir);
        let weights = config.models_dir.join("tiny.gguf");

        let fetcher = RecordingFetcher::default();
        let runner = RecordingRunner {
            exit_code: 7,
            ..Default::default()
        };
        let launcher = Launcher::new(config, &fetcher, &runner);

        let code = launcher.run("tiny", &[]).unwrap();

        assert_eq!(code, 7);
        let calls = fetcher.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "org/tiny-model");
        assert_eq!(calls[0].1, "tiny.gguf");
        assert!(weights.exists());
        assert_eq!(runner.commands.borrow()[0].args[1], weights.display().to_string());
    }

    #[test]
    fn test_download_failure_skips_launch() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(&temp_dir);

        let fetcher = RecordingFetcher {
            fail: true,
            ..Default::default()
        };
        let runner = RecordingRunner::default();
        let launcher = Launcher::new(config, &fetcher, &runner);

        let result = launcher.run("tiny", &[]);

        assert!(matches!(result, Err(Error::DownloadFailed(_))));
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn test_unreadable_registry_has_no_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            registry_path: temp_dir.path().join("absent"),
            ..setup(&temp_dir)
        };

        let fetcher = RecordingFetcher::default();
        let runner = RecordingRunner::default();
        let launcher = Launcher::new(config, &fetcher, &runner);

        assert!(matches!(launcher.run("tiny", &[]), Err(Error::RegistryRead { .. })));
        assert!(fetcher.calls.borrow().is_empty());
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn test_plan_does_not_download() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(&temp_dir);

        let fetcher = RecordingFetcher::default();
        let runner = RecordingRunner::default();
        let launcher = Launcher::new(config, &fetcher, &runner);

        let plan = launcher.plan("tiny", &args(&["--port", "8081"])).unwrap();

        assert!(plan.needs_download);
        assert_eq!(&plan.command.args[6..], args(&["--port", "8081"]).as_slice());
        assert!(fetcher.calls.borrow().is_empty());
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn test_list_reports_presence() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(&temp_dir);
        fs::create_dir_all(&config.models_dir).unwrap();
        fs::write(config.models_dir.join("tiny.gguf"), b"").unwrap();

        let fetcher = RecordingFetcher::default();
        let runner = RecordingRunner::default();
        let launcher = Launcher::new(config, &fetcher, &runner);

        let models = launcher.list().unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].entry.short_name, "tiny");
        assert!(models[0].present);
        assert!(models[0].weights_path.ends_with("models/tiny.gguf"));
    }
}
