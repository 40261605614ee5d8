//! Table identifiers and node list selection

use connector_core::{ConnectorError, Result};
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;

const TABLE_IDENTIFIER: &str = "table.identifier";

/// `<database>.<table>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentifier {
    pub database: String,
    pub table: String,
}

impl TableIdentifier {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl FromStr for TableIdentifier {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [database, table] if !database.is_empty() && !table.is_empty() => {
                Ok(Self::new(*database, *table))
            }
            _ => {
                tracing::error!("Parse '{}' to database and table failed.", s);
                Err(ConnectorError::illegal_argument(TABLE_IDENTIFIER, s))
            }
        }
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// Split `<database>.<table>`; anything but exactly two non-empty segments
/// is rejected.
pub fn parse_identifier(table_identifier: &str) -> Result<TableIdentifier> {
    tracing::trace!("Parse identifier '{}'.", table_identifier);
    table_identifier.parse()
}

/// Pick one entry of a comma-separated node list uniformly at random.
///
/// Entries are trimmed and empty ones dropped; `field` names the option in
/// the error when nothing remains.
pub fn random_endpoint(nodes: &str, field: &str) -> Result<String> {
    tracing::trace!("Parse {} '{}'.", field, nodes);
    let mut candidates: Vec<&str> = nodes
        .split(',')
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .collect();
    candidates.shuffle(&mut rand::thread_rng());

    match candidates.first() {
        Some(node) => Ok(node.to_string()),
        None => {
            tracing::error!("Parse '{}' failed, {} is empty.", nodes, field);
            Err(ConnectorError::illegal_argument(field, nodes))
        }
    }
}

pub fn random_fe_node(fe_nodes: &str) -> Result<String> {
    random_endpoint(fe_nodes, "fenodes")
}

pub fn random_be_node(be_nodes: &str) -> Result<String> {
    random_endpoint(be_nodes, "benodes")
}
