//! Query plan returned by the coordinator's `_query_plan` endpoint

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Replica locations of one tablet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tablet {
    /// Candidate BE addresses, in coordinator order
    #[serde(default)]
    pub routings: Vec<String>,
    #[serde(default)]
    pub version: i64,
    #[serde(default, rename = "versionHash")]
    pub version_hash: i64,
    #[serde(default, rename = "schemaHash")]
    pub schema_hash: i64,
}

impl Tablet {
    pub fn new<S: Into<String>>(routings: impl IntoIterator<Item = S>) -> Self {
        Self {
            routings: routings.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Physical plan for one scan statement.
///
/// `partitions` keeps the order in which the coordinator listed the tablets;
/// tablet assignment is order sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryPlan {
    pub status: i32,
    /// Opaque token handed to BEs verbatim
    #[serde(default)]
    pub opaqued_query_plan: String,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub partitions: Vec<(String, Tablet)>,
}

impl QueryPlan {
    pub fn new(status: i32, opaqued_query_plan: impl Into<String>) -> Self {
        Self {
            status,
            opaqued_query_plan: opaqued_query_plan.into(),
            partitions: Vec::new(),
        }
    }

    /// Append a tablet, replacing an earlier entry with the same id
    pub fn with_tablet(mut self, tablet_id: impl Into<String>, tablet: Tablet) -> Self {
        let tablet_id = tablet_id.into();
        match self.partitions.iter_mut().find(|(id, _)| *id == tablet_id) {
            Some(entry) => entry.1 = tablet,
            None => self.partitions.push((tablet_id, tablet)),
        }
        self
    }

    pub fn tablet_count(&self) -> usize {
        self.partitions.len()
    }
}

/// Reads a JSON object into entries in document order. A repeated key
/// overwrites the earlier value in place, as a map would.
fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<(String, Tablet)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, Tablet)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of tablet id to tablet")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: Vec<(String, Tablet)> =
                Vec::with_capacity(map.size_hint().unwrap_or(0));
            let mut positions: HashMap<String, usize> = HashMap::new();
            while let Some((id, tablet)) = map.next_entry::<String, Tablet>()? {
                match positions.get(&id) {
                    Some(&pos) => entries[pos].1 = tablet,
                    None => {
                        positions.insert(id.clone(), entries.len());
                        entries.push((id, tablet));
                    }
                }
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(EntriesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_document_order() {
        let body = r#"{
            "status": 200,
            "opaqued_query_plan": "DAABDAACDwABDAAAAAEIAAEAAAAKCAACAAAAAAgAAwAAAAoLAAQAAAAAAAAA",
            "partitions": {
                "11019": {"routings": ["be3:9060"], "version": 2, "versionHash": 1, "schemaHash": 10},
                "11017": {"routings": ["be1:9060", "be2:9060"], "version": 2, "versionHash": 1, "schemaHash": 10},
                "11018": {"routings": ["be2:9060"], "version": 2, "versionHash": 1, "schemaHash": 10}
            }
        }"#;

        let plan: QueryPlan = serde_json::from_str(body).unwrap();
        assert_eq!(plan.status, 200);
        let ids: Vec<&str> = plan.partitions.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["11019", "11017", "11018"]);
        assert_eq!(plan.partitions[1].1.routings, vec!["be1:9060", "be2:9060"]);
        assert_eq!(plan.partitions[1].1.schema_hash, 10);
    }

    #[test]
    fn test_repeated_tablet_id_keeps_last_value() {
        let body = r#"{"status": 200, "partitions": {
            "1": {"routings": ["a"]},
            "2": {"routings": ["b"]},
            "1": {"routings": ["c"]}
        }}"#;

        let plan: QueryPlan = serde_json::from_str(body).unwrap();
        assert_eq!(plan.tablet_count(), 2);
        assert_eq!(plan.partitions[0].0, "1");
        assert_eq!(plan.partitions[0].1.routings, vec!["c"]);
    }

    #[test]
    fn test_null_or_missing_partitions() {
        let plan: QueryPlan = serde_json::from_str(r#"{"status": 200, "partitions": null}"#).unwrap();
        assert_eq!(plan.tablet_count(), 0);

        let plan: QueryPlan = serde_json::from_str(r#"{"status": 200}"#).unwrap();
        assert!(plan.opaqued_query_plan.is_empty());
        assert_eq!(plan.tablet_count(), 0);
    }

    #[test]
    fn test_partitions_must_be_an_object() {
        let result = serde_json::from_str::<QueryPlan>(r#"{"status": 200, "partitions": [1, 2]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_replaces_duplicate_ids() {
        let plan = QueryPlan::new(200, "token")
            .with_tablet("1", Tablet::new(["a"]))
            .with_tablet("2", Tablet::new(["b"]))
            .with_tablet("1", Tablet::new(["c"]));

        assert_eq!(plan.tablet_count(), 2);
        assert_eq!(plan.partitions[0].1.routings, vec!["c"]);
    }
}
