//! Read planning for StarRocks scans
//!
//! Turns a coordinator query plan into work units for parallel readers.
//!
//! # Pipeline
//!
//! - **Assignment**: each tablet goes to one BE holding a replica, preferring
//!   BEs with nothing assigned yet, then the least loaded candidate
//! - **Partitioning**: each BE's tablets are deduplicated and cut into chunks
//!   of at most `starrocks.request.tablet.size` tablets
//!
//! # Example
//!
//! ```ignore
//! use connector_planner::{select_be_for_tablets, tablets_to_partitions};
//!
//! let assignment = select_be_for_tablets(&query_plan)?;
//! let partitions = tablets_to_partitions(
//!     config,
//!     assignment,
//!     &query_plan.opaqued_query_plan,
//!     "db",
//!     "tbl",
//! );
//! ```

pub mod assign;
pub mod partition;

pub use assign::{select_be_for_tablets, TabletAssignment};
pub use partition::{tablet_count_limit, tablets_to_partitions, PartitionDefinition};
