use serde::{Deserialize, Serialize};

/// One live BE as listed by `/api/backends`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRow {
    pub ip: String,
    pub http_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_alive: Option<bool>,
}

impl BackendRow {
    pub fn new(ip: impl Into<String>, http_port: u16) -> Self {
        Self {
            ip: ip.into(),
            http_port,
            is_alive: None,
        }
    }

    /// `ip:http_port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.http_port)
    }
}

/// Body of the backends endpoint. Older coordinators omit `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDirectory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(default)]
    pub backends: Option<Vec<BackendRow>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_backends() {
        let body = r#"{"backends": [
            {"ip": "192.168.1.10", "http_port": 8040, "is_alive": true},
            {"ip": "192.168.1.11", "http_port": 8040}
        ]}"#;

        let directory: BackendDirectory = serde_json::from_str(body).unwrap();
        assert_eq!(directory.status, None);
        let rows = directory.backends.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].address(), "192.168.1.10:8040");
        assert_eq!(rows[0].is_alive, Some(true));
        assert_eq!(rows[1].is_alive, None);
    }

    #[test]
    fn test_missing_backends_field() {
        let directory: BackendDirectory = serde_json::from_str(r#"{"status": 200}"#).unwrap();
        assert_eq!(directory.status, Some(200));
        assert!(directory.backends.is_none());
    }
}
