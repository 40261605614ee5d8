//! REST client for the StarRocks FE
//!
//! Every operation is a blocking free function over an explicit
//! [`ConnectorConfig`](connector_core::ConnectorConfig) and a [`Transport`];
//! nothing is cached between calls, so concurrent planning needs no locking.
//!
//! # Endpoints
//!
//! - `GET /api/<db>/<table>/_schema` via [`get_schema`]
//! - `POST /api/<db>/<table>/_query_plan` via [`find_partitions`]
//! - `GET /api/backends?is_alive=true` via [`random_backend`]
//!
//! # Example
//!
//! ```ignore
//! use connector_rest::{find_partitions, UreqTransport};
//! use std::sync::Arc;
//!
//! let config = Arc::new(
//!     ConnectorConfig::new()
//!         .with("starrocks.fenodes", "fe1:8030,fe2:8030")
//!         .with("starrocks.table.identifier", "example_db.example_table"),
//! );
//! let partitions = find_partitions(&UreqTransport, &config)?;
//! ```

pub mod executor;
pub mod nodes;
pub mod service;
pub mod transport;

#[cfg(test)]
mod testing;

pub use executor::send;
pub use nodes::{parse_identifier, random_be_node, random_endpoint, random_fe_node, TableIdentifier};
pub use service::{
    build_scan_sql, find_partitions, get_query_plan, get_schema, parse_backends, parse_query_plan,
    parse_schema, random_backend, random_backend_from_config, table_uri,
};
pub use transport::{Method, RequestOptions, RestRequest, RestResponse, Transport, TransportError, UreqTransport};
