use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use connector_core::options;
use connector_rest::UreqTransport;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::*;
use config::{ConnectionArgs, OutputFormat};

#[derive(Parser)]
#[command(name = "srctl")]
#[command(author, version, about = "Inspect StarRocks tables, scan plans and backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Connector settings file (flat JSON object of strings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: Connection,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Args)]
struct Connection {
    /// Comma-separated FE http addresses
    #[arg(long, global = true)]
    fenodes: Option<String>,

    /// Comma-separated BE http addresses
    #[arg(long, global = true)]
    benodes: Option<String>,

    /// Table as <database>.<table>
    #[arg(short, long, global = true)]
    table: Option<String>,

    #[arg(short, long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    /// Extra setting as key=value, repeatable
    #[arg(long = "set", global = true)]
    settings: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the column layout of a table
    Schema,

    /// Plan a scan and list the resulting partitions
    Plan {
        /// Projection, defaults to every column
        #[arg(long)]
        fields: Option<String>,

        /// Predicate appended as a where clause
        #[arg(long)]
        filter: Option<String>,

        /// Maximum tablets per partition
        #[arg(long)]
        tablet_size: Option<i64>,
    },

    /// Pick a random live backend
    Backend {
        /// Choose from --benodes instead of asking the FE
        #[arg(long)]
        from_config: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let args = ConnectionArgs {
        fenodes: cli.connection.fenodes,
        benodes: cli.connection.benodes,
        table: cli.connection.table,
        user: cli.connection.user,
        password: cli.connection.password,
        settings: cli.connection.settings,
    };
    let mut connector_config = config::load(cli.config.as_deref(), &args)?;
    tracing::debug!("Resolved {} connector settings.", connector_config.len());
    let transport = UreqTransport;

    match cli.command {
        Commands::Schema => {
            describe_schema(&transport, &connector_config, cli.output)?;
        }
        Commands::Plan {
            fields,
            filter,
            tablet_size,
        } => {
            if let Some(fields) = fields {
                connector_config = connector_config.with(options::STARROCKS_READ_FIELD, fields);
            }
            if let Some(filter) = filter {
                connector_config = connector_config.with(options::STARROCKS_FILTER_QUERY, filter);
            }
            if let Some(size) = tablet_size {
                connector_config =
                    connector_config.with(options::STARROCKS_TABLET_SIZE, size.to_string());
            }
            plan_scan(&transport, connector_config, cli.output)?;
        }
        Commands::Backend { from_config } => {
            pick_backend(&transport, &connector_config, from_config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        "connector_cli=debug,connector_core=debug,connector_rest=debug,connector_planner=debug"
    } else {
        "connector_cli=info,connector_rest=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
