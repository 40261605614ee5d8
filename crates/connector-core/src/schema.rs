use serde::{Deserialize, Serialize};

/// One column as reported by the coordinator's `_schema` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    precision: i32,
    #[serde(default)]
    scale: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aggregation_type: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: String::new(),
            precision: 0,
            scale: 0,
            aggregation_type: None,
        }
    }

    pub fn with_size(mut self, precision: i32, scale: i32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_aggregation_type(mut self, aggregation_type: impl Into<String>) -> Self {
        self.aggregation_type = Some(aggregation_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn precision(&self) -> i32 {
        self.precision
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn aggregation_type(&self) -> Option<&str> {
        self.aggregation_type.as_deref()
    }
}

/// Table schema: response status plus columns in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    status: i32,
    #[serde(default)]
    properties: Vec<Field>,
}

impl Schema {
    pub fn new(status: i32, properties: Vec<Field>) -> Self {
        Self { status, properties }
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn fields(&self) -> &[Field] {
        &self.properties
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.properties.get(index)
    }

    pub fn field_with_name(&self, name: &str) -> Option<&Field> {
        self.properties.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_schema() {
        let body = r#"{
            "status": 200,
            "properties": [
                {"name": "k1", "type": "TINYINT", "comment": "", "aggregation_type": ""},
                {"name": "k5", "type": "DECIMALV2", "comment": "", "precision": 9, "scale": 3}
            ]
        }"#;

        let schema: Schema = serde_json::from_str(body).unwrap();
        assert_eq!(schema.status(), 200);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.fields()[0].data_type(), "TINYINT");
        assert_eq!(schema.fields()[0].aggregation_type(), Some(""));

        let k5 = schema.field_with_name("k5").unwrap();
        assert_eq!(k5.precision(), 9);
        assert_eq!(k5.scale(), 3);
        assert_eq!(k5.aggregation_type(), None);
    }

    #[test]
    fn test_missing_properties_decode_as_empty() {
        let schema: Schema = serde_json::from_str(r#"{"status": 1, "keys": []}"#).unwrap();
        assert_eq!(schema.status(), 1);
        assert!(schema.is_empty());
    }
}
