mod checks;
mod cli;
mod client;
mod config;
mod error;
mod idempotency;
mod models;
mod reporter;
mod resilience;
mod runner;
mod signature;
mod stream;
mod types;

use clap::Parser;

use crate::cli::Cli;
use crate::client::Drip;
use crate::reporter::Reporter;
use crate::resilience::ResilienceConfig;
use crate::types::CheckContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            std::process::exit(2);
        }
    };

    let battery = if cli.quick {
        checks::quick_checks()
    } else if let Some(only) = &cli.only {
        let names: Vec<String> = only.split(',').map(str::to_string).collect();
        let selected = checks::checks_by_name(&names);
        if selected.is_empty() {
            let available: Vec<&str> = checks::all_checks().iter().map(|c| c.name).collect();
            eprintln!("No matching checks found. Available: {}", available.join(", "));
            std::process::exit(2);
        }
        selected
    } else {
        checks::all_checks()
    };

    let client = match Drip::builder(config.api_key.clone(), config.api_url.clone())
        .resilience(ResilienceConfig::default())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let mut ctx = CheckContext {
        test_customer_id: config.test_customer_id.clone(),
        skip_cleanup: cli.no_cleanup || config.skip_cleanup,
        ..CheckContext::default()
    };
    let mut reporter = Reporter::new(cli.verbose, cli.json);

    let results =
        runner::run_checks(&battery, &client, &mut ctx, config.timeout_ms, &mut reporter).await;

    let failures = results.iter().filter(|r| !r.success).count();
    std::process::exit(if failures > 0 { 1 } else { 0 });
}
