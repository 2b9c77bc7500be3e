use clap::{CommandFactory, Parser};
use ebi_webservices::cli::{self, Cli, Command};
use ebi_webservices::{config::ClientConfig, types::AppError, utils::init_logger};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_logger(cli.debug_level);

    // Load configuration
    let config = ClientConfig::from_env()?;
    debug!(?config, "Configuration loaded");

    // Ctrl-C abandons the running command
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            on_signal.cancel();
        }
    });

    let subcommand = match &cli.command {
        Command::Job(_) => "job",
        Command::Dbfetch(_) => "dbfetch",
        Command::Search(_) => "search",
        Command::Tools => "tools",
    };

    if let Err(e) = cli::run(cli, config, cancel).await {
        match e.downcast_ref::<AppError>() {
            Some(err) if err.is_usage() => {
                eprintln!("Error: {}", err);
                let mut command = Cli::command();
                if let Some(sub) = command.find_subcommand_mut(subcommand) {
                    let _ = sub.print_help();
                }
                std::process::exit(2);
            }
            Some(AppError::Cancelled) => {
                eprintln!("Interrupted");
                std::process::exit(130);
            }
            _ => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
