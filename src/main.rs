//! # titlegen CLI entry point
//!
//! Generates title packages for catalog applications or imports existing
//! packages into the title store.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use titlegen::{
    BatchPolicy, Channel, ChannelSelector, Target, TitleManager, TitlegenConfig,
};

/// Title package generator.
#[derive(Parser, Debug)]
#[command(name = "titlegen", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize packages for one or every application.
    Generate(GenerateArgs),

    /// Import an existing WAD package.
    Import {
        /// Package file to import.
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Channel to generate for.
    #[arg(value_enum)]
    channel: ChannelArg,

    /// Application to generate; every application with an asset when omitted.
    app_id: Option<i32>,

    /// Continue with the remaining applications when one fails.
    #[arg(long)]
    keep_going: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ChannelArg {
    Sd,
    Nand,
    Forwarder,
    All,
}

impl From<ChannelArg> for ChannelSelector {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Sd => ChannelSelector::One(Channel::Sd),
            ChannelArg::Nand => ChannelSelector::One(Channel::Nand),
            ChannelArg::Forwarder => ChannelSelector::One(Channel::Forwarder),
            ChannelArg::All => ChannelSelector::All,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Returns whether every requested target succeeded.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = TitlegenConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::debug!(?config, "loaded configuration");

    let manager = TitleManager::connect(&config)
        .await
        .context("initializing title manager")?;

    match cli.command {
        Commands::Generate(args) => {
            let target = args.app_id.map_or(Target::All, Target::One);
            let policy = if args.keep_going {
                BatchPolicy::KeepGoing
            } else {
                BatchPolicy::FailFast
            };

            let report = manager
                .generate(args.channel.into(), target, policy)
                .await
                .context("generate failed")?;
            for failure in &report.failed {
                tracing::warn!(
                    channel = %failure.channel,
                    application_id = failure.application,
                    error = %failure.error,
                    "target not generated"
                );
            }
            Ok(report.is_success())
        }
        Commands::Import { path } => {
            manager
                .import_file(&path)
                .await
                .with_context(|| format!("importing {}", path.display()))?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_generate_single() {
        let cli = Cli::try_parse_from(["titlegen", "generate", "sd", "7"]).unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.channel, ChannelArg::Sd);
        assert_eq!(args.app_id, Some(7));
        assert!(!args.keep_going);
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }

    #[test]
    fn cli_parse_generate_all_keep_going() {
        let cli = Cli::try_parse_from(["titlegen", "-v", "generate", "all", "--keep-going"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(ChannelSelector::from(args.channel), ChannelSelector::All);
        assert_eq!(args.app_id, None);
        assert!(args.keep_going);
    }

    #[test]
    fn cli_parse_import() {
        let cli = Cli::try_parse_from(["titlegen", "--config", "/etc/t.json", "import", "x.wad"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/t.json"));
        assert!(matches!(cli.command, Commands::Import { path } if path == PathBuf::from("x.wad")));
    }

    #[test]
    fn cli_rejects_unknown_channel() {
        assert!(Cli::try_parse_from(["titlegen", "generate", "wiiware"]).is_err());
    }
}
