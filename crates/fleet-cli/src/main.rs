// Operator CLI for capability resolution

use clap::{Parser, Subcommand};
use fleet_core::OrganizationId;
use std::path::PathBuf;

mod commands;

use commands::workspace::{load_config, Workspace};

#[derive(Parser)]
#[command(name = "fleetcap")]
#[command(about = "Fleet capabilities - inspect limits, features and overrides", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot of the capability tables (JSON)
    #[arg(short, long, global = true, default_value = "fleetcap.json")]
    snapshot: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one capability, or all of them when no code is given
    Resolve {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,

        /// Capability code
        code: Option<String>,
    },

    /// Limits and features summary
    Summary {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,
    },

    /// Check whether a feature is enabled
    Check {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,

        /// Capability code
        code: String,
    },

    /// Check whether one more item fits under a limit
    ValidateLimit {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,

        /// Capability code
        code: String,

        /// Items the organization currently has
        #[arg(long)]
        current_count: i64,
    },

    /// Organization override management
    Overrides {
        #[command(subcommand)]
        command: commands::overrides::OverridesSubcommand,
    },

    /// Show an organization's audit trail
    Audit {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Logs go to stderr; stdout carries the JSON output
    let log_filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let workspace = Workspace::open(&cli.snapshot, config)?;

    match cli.command {
        Commands::Resolve { organization, code } => {
            commands::query::resolve(&workspace, &organization, code.as_deref()).await?;
        }
        Commands::Summary { organization } => {
            commands::query::summary(&workspace, &organization).await?;
        }
        Commands::Check { organization, code } => {
            commands::query::check(&workspace, &organization, &code).await?;
        }
        Commands::ValidateLimit {
            organization,
            code,
            current_count,
        } => {
            commands::query::validate_limit(&workspace, &organization, &code, current_count)
                .await?;
        }
        Commands::Overrides { command } => {
            commands::overrides::handle_overrides_command(&workspace, command).await?;
        }
        Commands::Audit { organization } => {
            commands::audit::show_trail(&workspace, &organization).await?;
        }
    }

    Ok(())
}
