mod cli;
mod config;
mod error;
mod launcher;
mod model;
mod server;

use clap::Parser;
use cli::Cli;
use config::Config;
use launcher::Launcher;
use model::HubFetcher;
use server::SystemRunner;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply_overrides(&mut config);

    let fetcher = HubFetcher::new(&config);
    let launcher = Launcher::new(config, fetcher, SystemRunner);

    if cli.list {
        let models = launcher.list()?;

        if models.is_empty() {
            println!("No models registered.");
        } else {
            println!("Registered models:\n");
            for model in models {
                println!("  {}", model.entry.short_name);
                println!("    Repository: {}", model.entry.name);
                println!("    Weights: {:?}", model.weights_path);
                println!("    Downloaded: {}", if model.present { "yes" } else { "no" });
                println!("    Context length: {}", model.entry.context_length);
                println!("    GPU layers: {}", model.entry.n_gpu_layers);
                println!();
            }
        }
        return Ok(());
    }

    let Some(model) = cli.model.as_deref() else {
        anyhow::bail!("No model name given");
    };

    if cli.dry_run {
        let plan = launcher.plan(model, &cli.server_args)?;
        if plan.needs_download {
            tracing::info!("Weights for '{}' are not present and would be downloaded", model);
        }
        println!("{}", plan.command);
        return Ok(());
    }

    let code = launcher.run(model, &cli.server_args)?;
    std::process::exit(code);
}
