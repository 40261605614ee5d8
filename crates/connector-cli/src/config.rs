use anyhow::{Context, Result};
use clap::ValueEnum;
use connector_core::{options, ConnectorConfig};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Connection settings gathered from the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub fenodes: Option<String>,
    pub benodes: Option<String>,
    pub table: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub settings: Vec<String>,
}

/// Resolve the effective connector settings.
///
/// Precedence, lowest first: the config file, `--set key=value` pairs,
/// then the dedicated flags.
pub fn load(file: Option<&Path>, args: &ConnectionArgs) -> Result<ConnectorConfig> {
    let mut config = match file {
        Some(path) => ConnectorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConnectorConfig::new(),
    };

    config = config.merge(&ConnectorConfig::from_assignments(&args.settings)?);

    let flags = [
        (options::STARROCKS_FENODES, &args.fenodes),
        (options::STARROCKS_BENODES, &args.benodes),
        (options::STARROCKS_TABLE_IDENTIFIER, &args.table),
        (options::STARROCKS_REQUEST_AUTH_USER, &args.user),
        (options::STARROCKS_REQUEST_AUTH_PASSWORD, &args.password),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            config = config.with(key, value.as_str());
        }
    }

    Ok(config)
}
