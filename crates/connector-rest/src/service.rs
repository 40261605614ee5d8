//! Coordinator REST operations
//!
//! Schema discovery, query planning and BE lookup. Every response is decoded
//! with the same policy: malformed JSON and shape mismatches become
//! [`ConnectorError::Decode`], a JSON `null` is a bug on the FE side, and a
//! `status` other than 200 fails the call.

use crate::executor::send;
use crate::nodes::{parse_identifier, random_be_node, random_fe_node, TableIdentifier};
use crate::transport::{RestRequest, Transport};
use connector_core::{
    options, BackendDirectory, BackendRow, ConnectorConfig, ConnectorError, QueryPlan, Result,
    Schema, REST_RESPONSE_STATUS_OK,
};
use connector_planner::{select_be_for_tablets, tablets_to_partitions, PartitionDefinition};
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

const API_PREFIX: &str = "/api";
const SCHEMA: &str = "_schema";
const QUERY_PLAN: &str = "_query_plan";
const BACKENDS: &str = "/api/backends?is_alive=true";

/// `http://<fe>/api/<db>/<table>/` on a randomly chosen FE
pub fn table_uri(config: &ConnectorConfig) -> Result<String> {
    let fe = random_fe_node(config.get_or(options::STARROCKS_FENODES, ""))?;
    let ident = table_identifier(config)?;
    Ok(table_endpoint(&fe, &ident))
}

/// `http://<fe>/api/<db>/<table>/`
fn table_endpoint(fe: &str, ident: &TableIdentifier) -> String {
    format!(
        "http://{}{}/{}/{}/",
        fe, API_PREFIX, ident.database, ident.table
    )
}

fn table_identifier(config: &ConnectorConfig) -> Result<TableIdentifier> {
    parse_identifier(config.get_or(options::STARROCKS_TABLE_IDENTIFIER, ""))
}

/// Decode a coordinator body into `T`, rejecting `null`.
fn decode<T: DeserializeOwned>(response: &str, target: &str) -> Result<T> {
    match serde_json::from_str::<Option<T>>(response) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            tracing::error!("Should not come here.");
            Err(ConnectorError::ShouldNeverHappen)
        }
        Err(e) => {
            let err = ConnectorError::decode(target, response, e);
            tracing::error!("{}", err);
            Err(err)
        }
    }
}

fn check_status(status: i32, response: &str) -> Result<()> {
    if status != REST_RESPONSE_STATUS_OK {
        tracing::error!(
            "StarRocks FE's response is not OK, status is {}. res: {}",
            status,
            response
        );
        return Err(ConnectorError::RemoteStatus(status));
    }
    Ok(())
}

/// Fetch the column layout of the configured table.
pub fn get_schema(transport: &dyn Transport, config: &ConnectorConfig) -> Result<Schema> {
    tracing::trace!("Finding schema.");
    let uri = format!("{}{}", table_uri(config)?, SCHEMA);
    let response = send(transport, config, &RestRequest::get(uri))?;
    tracing::debug!("Find schema response is '{}'.", response);
    parse_schema(&response)
}

pub fn parse_schema(response: &str) -> Result<Schema> {
    tracing::trace!("Parse response '{}' to schema.", response);
    let schema: Schema = decode(response, "schema")?;
    check_status(schema.status(), response)?;
    tracing::debug!("Parsing schema result is '{:?}'.", schema);
    Ok(schema)
}

/// `select <fields> from `db`.`table`` plus the configured filter.
///
/// Projection and predicate are inserted as given.
pub fn build_scan_sql(config: &ConnectorConfig, ident: &TableIdentifier) -> String {
    let fields = config.get_or(
        options::STARROCKS_READ_FIELD,
        options::STARROCKS_READ_FIELD_DEFAULT,
    );
    let mut sql = format!(
        "select {} from `{}`.`{}`",
        fields, ident.database, ident.table
    );
    if let Some(filter) = config
        .get(options::STARROCKS_FILTER_QUERY)
        .filter(|f| !f.is_empty())
    {
        sql.push_str(" where ");
        sql.push_str(filter);
    }
    sql
}

/// Ask a FE for the physical plan of the configured scan.
pub fn get_query_plan(
    transport: &dyn Transport,
    config: &ConnectorConfig,
    ident: &TableIdentifier,
) -> Result<QueryPlan> {
    let sql = build_scan_sql(config, ident);
    tracing::debug!("Query SQL Sending to StarRocks FE is: '{}'.", sql);

    let fe = random_fe_node(config.get_or(options::STARROCKS_FENODES, ""))?;
    let uri = format!("{}{}", table_endpoint(&fe, ident), QUERY_PLAN);
    let body = json!({ "sql": sql }).to_string();

    let response = send(transport, config, &RestRequest::post_json(uri, body))?;
    tracing::debug!("Find partition response is '{}'.", response);
    parse_query_plan(&response)
}

pub fn parse_query_plan(response: &str) -> Result<QueryPlan> {
    tracing::trace!("Parse response '{}' to query plan.", response);
    let plan: QueryPlan = decode(response, "query plan")?;
    check_status(plan.status, response)?;
    tracing::debug!("Parsing partition result is '{:?}'.", plan);
    Ok(plan)
}

/// Plan the configured scan and cut it into per-BE partitions.
pub fn find_partitions(
    transport: &dyn Transport,
    config: &Arc<ConnectorConfig>,
) -> Result<Vec<PartitionDefinition>> {
    let ident = table_identifier(config)?;
    let plan = get_query_plan(transport, config, &ident)?;
    let assignment = select_be_for_tablets(&plan)?;
    Ok(tablets_to_partitions(
        Arc::clone(config),
        assignment,
        &plan.opaqued_query_plan,
        &ident.database,
        &ident.table,
    ))
}

/// Pick a live BE as reported by the FE, as `ip:http_port`.
pub fn random_backend(transport: &dyn Transport, config: &ConnectorConfig) -> Result<String> {
    let fe = random_fe_node(config.get_or(options::STARROCKS_FENODES, ""))?;
    let uri = format!("http://{}{}", fe, BACKENDS);
    let response = send(transport, config, &RestRequest::get(uri))?;
    tracing::debug!("Backend Info:{}", response);

    let mut backends = match parse_backends(&response)? {
        Some(rows) if !rows.is_empty() => rows,
        Some(_) => return Err(no_workers("[]")),
        None => return Err(no_workers("null")),
    };
    backends.shuffle(&mut rand::thread_rng());
    let backend = &backends[0];
    Ok(backend.address())
}

fn no_workers(value: &str) -> ConnectorError {
    tracing::error!("No alive StarRocks BE reported by FE.");
    ConnectorError::illegal_argument("workers", value)
}

/// Decode the backends listing; `None` when the body has no list.
pub fn parse_backends(response: &str) -> Result<Option<Vec<BackendRow>>> {
    tracing::trace!("Parse response '{}' to backend list.", response);
    let directory: BackendDirectory = decode(response, "backend list")?;
    if let Some(status) = directory.status {
        check_status(status, response)?;
    }
    Ok(directory.backends)
}

/// Pick a BE from `starrocks.benodes` without asking the FE.
pub fn random_backend_from_config(config: &ConnectorConfig) -> Result<String> {
    random_be_node(config.get_or(options::STARROCKS_BENODES, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::{Method, RestResponse};
    use std::collections::BTreeSet;

    fn config() -> ConnectorConfig {
        ConnectorConfig::new()
            .with(options::STARROCKS_FENODES, "fe1:8030")
            .with(options::STARROCKS_TABLE_IDENTIFIER, "db.tbl")
    }

    fn ident() -> TableIdentifier {
        TableIdentifier::new("db", "tbl")
    }

    #[test]
    fn test_table_uri() {
        assert_eq!(table_uri(&config()).unwrap(), "http://fe1:8030/api/db/tbl/");
    }

    #[test]
    fn test_table_endpoint_shared_by_schema_and_plan() {
        assert_eq!(
            table_endpoint("fe2:8030", &ident()),
            "http://fe2:8030/api/db/tbl/"
        );

        let transport = ScriptedTransport::new(vec![
            Ok(RestResponse::new(200, r#"{"status":200,"properties":[]}"#)),
            Ok(RestResponse::new(
                200,
                r#"{"status":200,"opaqued_query_plan":"t","partitions":{}}"#,
            )),
        ]);
        get_schema(&transport, &config()).unwrap();
        get_query_plan(&transport, &config(), &ident()).unwrap();

        let uris: Vec<String> = transport.requests().into_iter().map(|r| r.uri).collect();
        assert_eq!(
            uris,
            vec![
                "http://fe1:8030/api/db/tbl/_schema".to_string(),
                "http://fe1:8030/api/db/tbl/_query_plan".to_string(),
            ]
        );
    }

    #[test]
    fn test_table_uri_requires_identifier() {
        let config = ConnectorConfig::new().with(options::STARROCKS_FENODES, "fe1:8030");
        assert!(matches!(
            table_uri(&config),
            Err(ConnectorError::IllegalArgument { ref name, .. }) if name == "table.identifier"
        ));
    }

    #[test]
    fn test_get_schema() {
        let transport = ScriptedTransport::ok(
            r#"{"status":200,"properties":[
                {"name":"k1","type":"INT","comment":"","aggregation_type":""},
                {"name":"v1","type":"DECIMAL","precision":10,"scale":2}
            ]}"#,
        );
        let schema = get_schema(&transport, &config()).unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field(1).unwrap().precision(), 10);

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].uri, "http://fe1:8030/api/db/tbl/_schema");
    }

    #[test]
    fn test_schema_with_bad_status() {
        let err = parse_schema(r#"{"status":1,"properties":[]}"#).unwrap_err();
        assert!(matches!(err, ConnectorError::RemoteStatus(1)));
    }

    #[test]
    fn test_schema_not_json() {
        match parse_schema("<html>oops</html>") {
            Err(ConnectorError::Decode { reason, body, .. }) => {
                assert_eq!(reason, "is not a json");
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_shape_mismatch() {
        match parse_schema(r#"{"status":"ok"}"#) {
            Err(ConnectorError::Decode { reason, .. }) => {
                assert_eq!(reason, "cannot map to schema")
            }
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_null_body() {
        assert!(matches!(
            parse_schema("null"),
            Err(ConnectorError::ShouldNeverHappen)
        ));
        assert!(matches!(
            parse_query_plan("null"),
            Err(ConnectorError::ShouldNeverHappen)
        ));
    }

    #[test]
    fn test_build_scan_sql() {
        assert_eq!(build_scan_sql(&config(), &ident()), "select * from `db`.`tbl`");

        let filtered = config()
            .with(options::STARROCKS_READ_FIELD, "k1, v1")
            .with(options::STARROCKS_FILTER_QUERY, "k1 > 3");
        assert_eq!(
            build_scan_sql(&filtered, &ident()),
            "select k1, v1 from `db`.`tbl` where k1 > 3"
        );

        let empty_filter = config().with(options::STARROCKS_FILTER_QUERY, "");
        assert_eq!(build_scan_sql(&empty_filter, &ident()), "select * from `db`.`tbl`");
    }

    #[test]
    fn test_query_plan_request_body() {
        let transport =
            ScriptedTransport::ok(r#"{"status":200,"opaqued_query_plan":"tok","partitions":{}}"#);
        let config = config().with(options::STARROCKS_FILTER_QUERY, r#"name = "x""#);
        let plan = get_query_plan(&transport, &config, &ident()).unwrap();

        assert_eq!(plan.opaqued_query_plan, "tok");
        assert_eq!(plan.tablet_count(), 0);

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.uri, "http://fe1:8030/api/db/tbl/_query_plan");
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["sql"], r#"select * from `db`.`tbl` where name = "x""#);
    }

    #[test]
    fn test_query_plan_bad_status() {
        let err = parse_query_plan(r#"{"status":500,"opaqued_query_plan":"","partitions":{}}"#)
            .unwrap_err();
        assert!(matches!(err, ConnectorError::RemoteStatus(500)));
    }

    #[test]
    fn test_find_partitions() {
        let transport = ScriptedTransport::ok(
            r#"{"status":200,"opaqued_query_plan":"opaque","partitions":{
                "1":{"routings":["A","B"],"version":1,"versionHash":0,"schemaHash":7},
                "2":{"routings":["B","A"],"version":1,"versionHash":0,"schemaHash":7},
                "3":{"routings":["A"],"version":1,"versionHash":0,"schemaHash":7}
            }}"#,
        );
        let config = Arc::new(config().with(options::STARROCKS_TABLET_SIZE, "2"));
        let partitions = find_partitions(&transport, &config).unwrap();

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].be_address(), "A");
        assert_eq!(partitions[0].tablet_ids(), &BTreeSet::from([1, 3]));
        assert_eq!(partitions[1].be_address(), "B");
        assert_eq!(partitions[1].tablet_ids(), &BTreeSet::from([2]));
        assert!(partitions.iter().all(|p| p.query_plan() == "opaque"));
        assert!(partitions.iter().all(|p| p.database() == "db" && p.table() == "tbl"));
    }

    #[test]
    fn test_find_partitions_propagates_connect_failure() {
        let transport = ScriptedTransport::new(vec![
            Ok(RestResponse::new(500, "")),
            Ok(RestResponse::new(500, "")),
            Ok(RestResponse::new(500, "")),
        ]);
        let err = find_partitions(&transport, &Arc::new(config())).unwrap_err();

        assert_eq!(transport.attempts(), 3);
        assert!(matches!(err, ConnectorError::ConnectFailed { status: Some(500), .. }));
    }

    #[test]
    fn test_random_backend() {
        let transport = ScriptedTransport::ok(
            r#"{"backends":[{"ip":"10.0.0.1","http_port":8040,"is_alive":true},
                            {"ip":"10.0.0.2","http_port":8040,"is_alive":true}]}"#,
        );
        let backend = random_backend(&transport, &config()).unwrap();

        assert!(backend == "10.0.0.1:8040" || backend == "10.0.0.2:8040");
        assert_eq!(
            transport.requests()[0].uri,
            "http://fe1:8030/api/backends?is_alive=true"
        );
    }

    #[test]
    fn test_random_backend_empty_list() {
        for body in [r#"{"backends":[]}"#, r#"{"status":200}"#] {
            let transport = ScriptedTransport::ok(body);
            match random_backend(&transport, &config()) {
                Err(ConnectorError::IllegalArgument { name, .. }) => assert_eq!(name, "workers"),
                other => panic!("Expected IllegalArgument, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_backends_checks_status_when_present() {
        let err = parse_backends(r#"{"status":403,"backends":[]}"#).unwrap_err();
        assert!(matches!(err, ConnectorError::RemoteStatus(403)));
    }

    #[test]
    fn test_random_backend_from_config() {
        let config = config().with(options::STARROCKS_BENODES, "be1:8040, be2:8040");
        let backend = random_backend_from_config(&config).unwrap();
        assert!(backend == "be1:8040" || backend == "be2:8040");

        assert!(matches!(
            random_backend_from_config(&ConnectorConfig::new()),
            Err(ConnectorError::IllegalArgument { ref name, .. }) if name == "benodes"
        ));
    }
}
