//! Tablet-to-BE assignment

use connector_core::{ConnectorError, QueryPlan, Result};
use std::collections::{HashMap, HashSet};

/// BE address to assigned tablet ids.
///
/// BEs are kept in the order they were first chosen, tablets in the order
/// they were assigned. Duplicates are allowed here and removed when
/// partitions are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabletAssignment {
    backends: Vec<(String, Vec<i64>)>,
    positions: HashMap<String, usize>,
}

impl TabletAssignment {
    /// Empty assignment with no BEs
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit `(be, tablets)` entries; a repeated BE extends
    /// its earlier entry.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<i64>)>,
        S: Into<String>,
    {
        let mut assignment = Self::new();
        for (backend, tablets) in entries {
            let backend = backend.into();
            assignment.open(&backend);
            for tablet_id in tablets {
                assignment.push(&backend, tablet_id);
            }
        }
        assignment
    }

    /// Tablets assigned so far to `backend`, or `None` if it is unused
    pub fn tablet_count(&self, backend: &str) -> Option<usize> {
        self.positions
            .get(backend)
            .map(|&pos| self.backends[pos].1.len())
    }

    fn open(&mut self, backend: &str) {
        if !self.positions.contains_key(backend) {
            self.positions
                .insert(backend.to_string(), self.backends.len());
            self.backends.push((backend.to_string(), Vec::new()));
        }
    }

    fn push(&mut self, backend: &str, tablet_id: i64) {
        self.open(backend);
        let pos = self.positions[backend];
        self.backends[pos].1.push(tablet_id);
    }

    /// Tablets placed on `backend` in placement order
    pub fn tablets(&self, backend: &str) -> Option<&[i64]> {
        self.positions
            .get(backend)
            .map(|&pos| self.backends[pos].1.as_slice())
    }

    /// BE addresses in the order they were first used
    pub fn backends(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|(be, _)| be.as_str())
    }

    /// `(be, tablets)` pairs in first-use order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> {
        self.backends
            .iter()
            .map(|(be, tablets)| (be.as_str(), tablets.as_slice()))
    }

    /// Number of BEs with an entry
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// True when no BE has been used
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Tablets placed across all BEs
    pub fn total_tablets(&self) -> usize {
        self.backends.iter().map(|(_, t)| t.len()).sum()
    }

    /// Consume into `(be, tablets)` entries in first-use order
    pub fn into_entries(self) -> Vec<(String, Vec<i64>)> {
        self.backends
    }
}

/// Pick one BE for every tablet of `plan`.
///
/// Tablets are visited in plan order and routings in coordinator order. The
/// first routing without any assignment wins immediately; if every routing
/// is already in use, the one with the fewest tablets (first on ties) is
/// chosen.
///
/// Ids are compared by numeric value: a later entry whose id parses to an
/// already placed tablet (`"01"` after `"1"`) is skipped.
pub fn select_be_for_tablets(plan: &QueryPlan) -> Result<TabletAssignment> {
    let mut assignment = TabletAssignment::new();
    let mut placed: HashSet<i64> = HashSet::with_capacity(plan.partitions.len());

    for (raw_id, tablet) in &plan.partitions {
        tracing::debug!("Parse tablet info: '{}' -> {:?}.", raw_id, tablet.routings);
        let tablet_id: i64 = raw_id.parse().map_err(|_| {
            tracing::error!("Parse tablet id '{}' to long failed.", raw_id);
            ConnectorError::ParseNumber {
                name: "tablet id".to_string(),
                value: raw_id.clone(),
            }
        })?;

        if !placed.insert(tablet_id) {
            tracing::warn!(
                "Tablet id '{}' repeats tablet {}, keep the first placement.",
                raw_id,
                tablet_id
            );
            continue;
        }

        let mut target: Option<&str> = None;
        let mut tablet_count = usize::MAX;
        for candidate in &tablet.routings {
            tracing::trace!(
                "Evaluate StarRocks BE '{}' to tablet '{}'.",
                candidate,
                tablet_id
            );
            match assignment.tablet_count(candidate) {
                None => {
                    tracing::debug!(
                        "Choose a new StarRocks BE '{}' for tablet '{}'.",
                        candidate,
                        tablet_id
                    );
                    assignment.open(candidate);
                    target = Some(candidate.as_str());
                    break;
                }
                Some(count) if count < tablet_count => {
                    target = Some(candidate.as_str());
                    tablet_count = count;
                    tracing::debug!(
                        "Current candidate StarRocks BE to tablet '{}' is '{}' with tablet count {}.",
                        tablet_id,
                        candidate,
                        count
                    );
                }
                Some(_) => {}
            }
        }

        let target = target.ok_or_else(|| {
            tracing::error!("Cannot choose StarRocks BE for tablet {}", tablet_id);
            ConnectorError::NoBackendForTablet(tablet_id)
        })?;

        tracing::debug!("Choose StarRocks BE '{}' for tablet '{}'.", target, tablet_id);
        assignment.push(target, tablet_id);
    }

    Ok(assignment)
}
