//! slotbook CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use slotbook_api::HttpBackend;
use slotbook_client::cli::{Cli, Command, ConfigAction};
use slotbook_client::commands::{booking, config as config_cmd};
use slotbook_client::config::ClientConfig;
use slotbook_client::error::ClientResult;
use slotbook_client::output::OutputFormat;
use slotbook_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    }
    .merge_cli(&cli);

    init_tracing(TracingConfig::cli(config.debug))?;

    let format = OutputFormat::from_json_flag(cli.json);
    let output = match cli.command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Dump => config_cmd::dump(&config),
                ConfigAction::Path => config_cmd::path(),
            };
        }
        Command::Page { slug } => {
            let backend = Arc::new(HttpBackend::new(config.backend_config()?)?);
            booking::page(backend, &slug, config.flow_config(None), format).await?
        }
        Command::Availability {
            slug,
            service,
            month,
            timezone,
        } => {
            let backend = Arc::new(HttpBackend::new(config.backend_config()?)?);
            booking::availability(
                backend,
                &slug,
                &service,
                month.as_deref(),
                config.flow_config(timezone.as_deref()),
                format,
            )
            .await?
        }
        Command::Book(args) => {
            let backend = Arc::new(HttpBackend::new(config.backend_config()?)?);
            booking::book(
                backend,
                &args,
                config.flow_config(args.timezone.as_deref()),
                format,
            )
            .await?
        }
    };

    println!("{}", output);
    Ok(())
}
