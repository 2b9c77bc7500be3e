//! Command-line interface for `ebiws`.
//!
//! ```text
//! ebiws job <TOOL> [OPTIONS] [SEQUENCE]   submit / poll / fetch a dispatcher job
//! ebiws dbfetch <METHOD> [ARGS]           retrieve database entries
//! ebiws search <METHOD> [ARGS]            query EBI Search
//! ebiws tools                             list known dispatcher tools
//! ```

pub mod dbfetch;
pub mod jobs;
pub mod search;

use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::job::OutputLevel;
use crate::tools::TOOLS;
use crate::types::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ebiws",
    version,
    about = "Clients for the EMBL-EBI job dispatcher, Dbfetch and EBI Search services"
)]
pub struct Cli {
    /// Decrease output level
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Increase output level (repeatable)
    #[arg(long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Debug output level; 0 shows warnings only
    #[arg(long = "debugLevel", global = true, default_value_t = 0)]
    pub debug_level: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run or inspect a job on an EBI analysis tool
    Job(jobs::JobArgs),
    /// Retrieve entries with Dbfetch
    Dbfetch(dbfetch::DbfetchArgs),
    /// Query EBI Search
    Search(search::SearchArgs),
    /// List the tools with a known endpoint
    Tools,
}

impl Cli {
    pub fn output_level(&self) -> OutputLevel {
        OutputLevel::from_flags(self.quiet, self.verbose)
    }
}

/// Run a command until it completes or `cancel` fires. Cancellation drops
/// whatever request or write is in flight and yields `AppError::Cancelled`.
pub async fn run(cli: Cli, config: ClientConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled.into()),
        result = dispatch(cli, config, cancel.clone()) => result,
    }
}

async fn dispatch(cli: Cli, config: ClientConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let output = cli.output_level();
    match cli.command {
        Command::Job(args) => jobs::run(args, &config, output, cancel).await,
        Command::Dbfetch(args) => dbfetch::run(args, &config).await,
        Command::Search(args) => search::run(args, &config).await,
        Command::Tools => {
            for tool in TOOLS {
                println!("{}\t{}", tool.name, tool.description);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["ebiws", "--quiet", "tools"]).unwrap();
        assert!(!cli.output_level().at(1));

        let cli = Cli::try_parse_from(["ebiws", "tools", "--verbose", "--debugLevel", "3"]).unwrap();
        assert!(cli.output_level().at(2));
        assert_eq!(cli.debug_level, 3);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_request() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let cli = Cli::try_parse_from(["ebiws", "dbfetch", "getSupportedDBs", "--baseUrl", &base_url])
            .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run(cli, ClientConfig::default(), cancel),
        )
        .await
        .expect("cancellation should end the command")
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Cancelled)));
        drop(listener);
    }
}
