//! Harvest - declarative data extraction engine
//!
//! Loads a configuration file, runs every extraction item in order, and
//! delivers each result to its notifiers.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use harvest::config::ModelConfig;
use harvest::{Engine, cli::Cli, config::Config, notify, setup_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Load configuration
    let config = match Config::load(Some(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        items = config.items.len(),
        "Starting harvest"
    );

    let engine = Engine::new(&config.limits);
    let mut failed = false;

    for item in &config.items {
        if !cli.item.is_empty() && !cli.item.contains(&item.name) {
            continue;
        }
        info!(item = %item.name, "running extraction");
        let outcome = engine.run_item(item).await;
        let is_array = matches!(item.model, ModelConfig::Array(_));

        let (result, item_error) = match &outcome {
            Ok(value) => (Some(value), None),
            Err(e) => {
                error!(item = %item.name, error = %e, "extraction failed");
                failed = true;
                (None, Some(e))
            }
        };

        for notifier_config in &item.notifiers {
            let notifier = notify::build(
                &item.name,
                notifier_config,
                engine.runtime().client.clone(),
            );
            if let Err(e) = notifier.inform(result, item_error, is_array).await {
                error!(item = %item.name, error = %e, "notifier failed");
                failed = true;
            }
        }
    }

    if failed {
        return ExitCode::FAILURE;
    }
    info!("All items processed");
    ExitCode::SUCCESS
}
