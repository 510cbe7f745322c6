mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(version, about = "Relays web form submissions to the case-management API")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the form relay
    Run(ConfigArgs),
    /// Load and validate the configuration, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to the YAML configuration file
    #[arg(long, short, default_value = "form-relay.yaml")]
    config: PathBuf,
}

fn load_config(args: &ConfigArgs) -> Config {
    let config = Config::from_file(&args.config).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", args.config.display());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        CliCommand::CheckConfig(args) => {
            load_config(args);
            println!("{}: ok", args.config.display());
        }
        CliCommand::Run(args) => {
            let config = load_config(args);
            let sentry_guard = observability::init_logging(&config.common.logging);

            if let Some(metrics) = &config.common.metrics
                && let Err(e) =
                    observability::init_metrics(metrics, case_router::metrics_defs::ALL_METRICS)
            {
                tracing::error!(error = %e, "Metrics disabled");
            }

            let rt = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start runtime");
                    drop(sentry_guard);
                    process::exit(1);
                }
            };

            if let Err(e) = rt.block_on(case_router::run(config.relay)) {
                tracing::error!(error = %e, "Form relay stopped");
                drop(sentry_guard);
                process::exit(1);
            }
        }
    }
}
