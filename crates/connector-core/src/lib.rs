pub mod backend;
pub mod config;
pub mod error;
pub mod plan;
pub mod schema;

pub use backend::{BackendDirectory, BackendRow};
pub use config::{options, ConnectorConfig};
pub use error::{ConnectorError, Result};
pub use plan::{QueryPlan, Tablet};
pub use schema::{Field, Schema};

/// Value of the `status` field on every successful coordinator response.
pub const REST_RESPONSE_STATUS_OK: i32 = 200;
