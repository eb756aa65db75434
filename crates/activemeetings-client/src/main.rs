//! activemeetings CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use activemeetings_client::cli::{Cli, Command, ConfigAction, LogFormat};
use activemeetings_client::commands;
use activemeetings_client::commands::watch::WatchOptions;
use activemeetings_client::config::ClientConfig;
use activemeetings_client::error::{ClientError, ClientResult};
use activemeetings_core::{init_tracing, TracingConfig, TracingOutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let format = match cli.log_format {
        LogFormat::Pretty => TracingOutputFormat::Pretty,
        LogFormat::Compact => TracingOutputFormat::Compact,
        LogFormat::Json => TracingOutputFormat::Json,
    };
    if let Err(e) = init_tracing(TracingConfig::for_cli(cli.debug || config.debug).with_format(format)) {
        eprintln!("warning: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config),
        None => ClientConfig::load().map_err(ClientError::Config),
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    match cli.command {
        Command::Watch {
            page_url,
            user,
            events,
            open,
            status,
        } => {
            let options = WatchOptions {
                page_url: page_url.as_deref(),
                user: user.as_deref(),
                events: events.as_deref(),
                open,
                print_status: status,
            };
            commands::watch::watch(&config, options).await
        }
        Command::Join {
            meeting,
            page_url,
            user,
            open,
        } => {
            commands::join::join(&config, &meeting, page_url.as_deref(), user.as_deref(), open)
                .await
        }
        Command::Remember {
            meeting,
            name,
            user,
        } => commands::remember::remember(
            &config,
            meeting.as_deref(),
            name.as_deref(),
            user.as_deref(),
        ),
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Path => commands::config::path(&config),
        },
    }
}
