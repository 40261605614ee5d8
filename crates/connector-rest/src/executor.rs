//! Retrying request executor

use crate::transport::{RequestOptions, RestRequest, Transport};
use connector_core::{ConnectorConfig, ConnectorError, Result};

const HTTP_OK: u16 = 200;

/// Send `request` to the FE, retrying up to `starrocks.request.retries`
/// times.
///
/// Any status other than 200 and any transport failure count as a failed
/// attempt. Attempts run back to back. Returns the body of the first
/// successful response.
pub fn send(
    transport: &dyn Transport,
    config: &ConnectorConfig,
    request: &RestRequest,
) -> Result<String> {
    let options = RequestOptions::from_config(config);
    tracing::trace!(
        "connect timeout set to '{:?}'. read timeout set to '{:?}'.",
        options.connect_timeout,
        options.read_timeout
    );
    let retries = config.retries();
    tracing::trace!("max retry times set to '{}'.", retries);

    tracing::info!(
        "Send request to StarRocks FE '{}' with user '{}'.",
        request.uri,
        options.user
    );

    let mut status: Option<u16> = None;
    let mut cause: Option<String> = None;

    for attempt in 1..=retries {
        tracing::debug!("Attempt {} to request {}.", attempt, request.uri);
        match transport.execute(request, &options) {
            Ok(response) if response.status == HTTP_OK => return Ok(response.body),
            Ok(response) => {
                tracing::warn!(
                    "Failed to get response from StarRocks FE {}, http code is {}",
                    request.uri,
                    response.status
                );
                status = Some(response.status);
            }
            Err(e) => {
                tracing::warn!("Send request to StarRocks FE {} failed: {}", request.uri, e);
                cause = Some(e.to_string());
            }
        }
    }

    tracing::error!(
        "Connect to {} failed, status code is {:?}.",
        request.uri,
        status
    );
    Err(ConnectorError::ConnectFailed {
        uri: request.uri.clone(),
        status,
        cause,
    })
}
