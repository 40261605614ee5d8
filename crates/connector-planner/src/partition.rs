//! Work units for parallel readers

use crate::assign::TabletAssignment;
use connector_core::{options, ConnectorConfig};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// One size-bounded set of tablets to be read from a single BE
#[derive(Debug, Clone, Serialize)]
pub struct PartitionDefinition {
    database: String,
    table: String,
    #[serde(skip)]
    config: Arc<ConnectorConfig>,
    be_address: String,
    tablet_ids: BTreeSet<i64>,
    /// Opaque plan token shared by every partition of one scan
    query_plan: String,
}

impl PartitionDefinition {
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        config: Arc<ConnectorConfig>,
        be_address: impl Into<String>,
        tablet_ids: BTreeSet<i64>,
        query_plan: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            config,
            be_address: be_address.into(),
            tablet_ids,
            query_plan: query_plan.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn config(&self) -> &Arc<ConnectorConfig> {
        &self.config
    }

    pub fn be_address(&self) -> &str {
        &self.be_address
    }

    pub fn tablet_ids(&self) -> &BTreeSet<i64> {
        &self.tablet_ids
    }

    pub fn query_plan(&self) -> &str {
        &self.query_plan
    }

    fn sort_key(&self) -> (&str, &str, &str, &BTreeSet<i64>, &str) {
        (
            &self.database,
            &self.table,
            &self.be_address,
            &self.tablet_ids,
            &self.query_plan,
        )
    }
}

// The shared config is context, not identity.
impl PartialEq for PartitionDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PartitionDefinition {}

impl PartialOrd for PartitionDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartitionDefinition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for PartitionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PartitionDefinition{{database='{}', table='{}', beAddress='{}', tabletIds={:?}, queryPlan='{}'}}",
            self.database, self.table, self.be_address, self.tablet_ids, self.query_plan
        )
    }
}

/// Maximum tablets per partition, from `starrocks.request.tablet.size`.
///
/// Missing or unparsable values fall back to the default; values below the
/// minimum are raised to it.
pub fn tablet_count_limit(config: &ConnectorConfig) -> usize {
    let mut tablets_size = config.get_int(
        options::STARROCKS_TABLET_SIZE,
        options::STARROCKS_TABLET_SIZE_DEFAULT,
    );
    if tablets_size < options::STARROCKS_TABLET_SIZE_MIN {
        tracing::warn!(
            "{} is less than {}, set to {}.",
            options::STARROCKS_TABLET_SIZE,
            options::STARROCKS_TABLET_SIZE_MIN,
            options::STARROCKS_TABLET_SIZE_MIN
        );
        tablets_size = options::STARROCKS_TABLET_SIZE_MIN;
    }
    tracing::debug!("Tablet size is set to {}.", tablets_size);
    tablets_size as usize
}

/// Cut each BE's tablets into partitions of at most
/// [`tablet_count_limit`] tablets.
///
/// Tablets are deduplicated per BE keeping first-seen order, then chunked by
/// position. Output follows the assignment's BE order.
pub fn tablets_to_partitions(
    config: Arc<ConnectorConfig>,
    assignment: TabletAssignment,
    opaqued_query_plan: &str,
    database: &str,
    table: &str,
) -> Vec<PartitionDefinition> {
    let tablets_size = tablet_count_limit(&config);
    let mut partitions = Vec::new();

    for (be_address, tablets) in assignment.into_entries() {
        tracing::debug!(
            "Generate partition with beInfo: '{}' -> {:?}.",
            be_address,
            tablets
        );
        let mut seen = HashSet::with_capacity(tablets.len());
        let unique: Vec<i64> = tablets.into_iter().filter(|id| seen.insert(*id)).collect();

        for chunk in unique.chunks(tablets_size) {
            let partition = PartitionDefinition::new(
                database,
                table,
                Arc::clone(&config),
                be_address.clone(),
                chunk.iter().copied().collect(),
                opaqued_query_plan,
            );
            tracing::debug!("Generate one PartitionDefinition '{}'.", partition);
            partitions.push(partition);
        }
    }

    partitions
}
