//! sheetsproxy CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use sheetsproxy_cli::cli::{Cli, Command, ConfigAction};
use sheetsproxy_cli::commands;
use sheetsproxy_cli::config::CliConfig;
use sheetsproxy_cli::error::ClientResult;
use sheetsproxy_core::{TracingConfig, ValuesRequest, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, Command::Serve { .. }) {
        TracingConfig::server()
    } else {
        TracingConfig::default()
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

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
        Some(ref path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };
    let secret = cli.secret.as_deref();

    match cli.command {
        Command::Serve { bind } => commands::serve::run(&config, secret, bind).await,
        Command::IdToken {
            service_account,
            audience,
        } => commands::id_token::run(&config, secret, &service_account, &audience).await,
        Command::Call {
            url,
            service_account,
            spreadsheet_id,
            range,
            timeout,
        } => {
            let args = commands::call::CallArgs {
                url,
                service_account,
                request: ValuesRequest::new(spreadsheet_id, range),
                timeout: Duration::from_secs(timeout),
            };
            commands::call::run(&config, secret, args).await
        }
        Command::Whoami => commands::whoami::run(&config, secret).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
