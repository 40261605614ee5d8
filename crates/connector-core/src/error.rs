use serde_json::error::Category;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Connect to {uri} failed, status code is {}, cause: {}", or_none(.status), or_none(.cause))]
    ConnectFailed {
        uri: String,
        status: Option<u16>,
        cause: Option<String>,
    },

    #[error("argument '{name}' is illegal, value is '{value}'")]
    IllegalArgument { name: String, value: String },

    #[error("StarRocks FE's response {reason}. res: {body}")]
    Decode {
        reason: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("StarRocks FE's response is not OK, status is {0}")]
    RemoteStatus(i32),

    #[error("This should never happen, please report a bug")]
    ShouldNeverHappen,

    #[error("Parse {name} '{value}' to number failed")]
    ParseNumber { name: String, value: String },

    #[error("Cannot choose StarRocks BE for tablet {0}")]
    NoBackendForTablet(i64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConnectorError {
    pub fn illegal_argument(name: impl Into<String>, value: impl Into<String>) -> Self {
        ConnectorError::IllegalArgument {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Classifies a serde failure the way the coordinator client reports it:
    /// syntax problems versus documents that do not fit `target`.
    pub fn decode(target: &str, body: impl Into<String>, source: serde_json::Error) -> Self {
        let reason = match source.classify() {
            Category::Syntax | Category::Eof => "is not a json".to_string(),
            Category::Data => format!("cannot map to {}", target),
            Category::Io => "could not be parsed as json".to_string(),
        };
        ConnectorError::Decode {
            reason,
            body: body.into(),
            source,
        }
    }
}

fn or_none<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
