//! # docjson CLI
//!
//! Command-line interface for the docjson content pipeline.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use docjson_core::FailurePolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docjson")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "docjson.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Token for the commit history API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every configured site into JSON artifacts
    Build {
        /// Skip commit history lookups
        #[arg(long)]
        no_attribution: bool,

        /// Override the configured failure policy
        #[arg(long, value_enum)]
        failure_policy: Option<PolicyArg>,
    },

    /// List the files each site would produce without writing anything
    Check,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Stop a site at its first failing file
    FailFast,
    /// Convert every file, then report all failures
    Collect,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => FailurePolicy::FailFast,
            PolicyArg::Collect => FailurePolicy::Collect,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build {
            no_attribution,
            failure_policy,
        } => {
            let opts = commands::BuildOptions {
                github_token: cli.github_token,
                no_attribution,
                failure_policy: failure_policy.map(FailurePolicy::from),
            };
            commands::build_sites(&cli.config, opts).await
        }
        Commands::Check => commands::check_sites(&cli.config).await,
    }
}
