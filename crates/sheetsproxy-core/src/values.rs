//! Request and response documents exchanged with proxy callers.
//!
//! The field names are part of the external contract: callers send
//! `spreadsheet_id`/`range` and receive `Request`/`Values`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cell range lookup requested by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesRequest {
    /// The spreadsheet identifier.
    #[serde(default)]
    pub spreadsheet_id: String,
    /// The A1-notation range expression, e.g. `'Sheet1'!A1:B1`.
    #[serde(default)]
    pub range: String,
}

impl ValuesRequest {
    /// Creates a new request.
    pub fn new(spreadsheet_id: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
        }
    }

    /// Checks that both fields are present.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.spreadsheet_id.is_empty() {
            return Err("spreadsheet_id is required");
        }
        if self.range.is_empty() {
            return Err("range is required");
        }
        Ok(())
    }
}

/// The document returned for a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesResponse {
    /// Echo of the request that produced these values.
    #[serde(rename = "Request")]
    pub request: ValuesRequest,
    /// Cell values in sheet order. Trailing empty cells are not padded.
    #[serde(rename = "Values")]
    pub values: Vec<Vec<String>>,
}

impl ValuesResponse {
    /// Creates a response for the given request.
    pub fn new(request: ValuesRequest, values: Vec<Vec<String>>) -> Self {
        Self { request, values }
    }
}

/// A single loosely-typed cell as returned by the Sheets API.
pub type CellValue = Value;

/// Converts loosely-typed rows into rows of strings.
///
/// Strings pass through unchanged, numbers keep their JSON text, booleans
/// become `true`/`false` and nulls become empty strings. Nested values are
/// kept as their compact JSON encoding.
pub fn normalize_rows(rows: Vec<Vec<CellValue>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect()
}

fn cell_to_string(cell: CellValue) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_parses_wire_names() {
        let req: ValuesRequest =
            serde_json::from_str(r#"{"spreadsheet_id": "S", "range": "'Sheet1'!A1:B1"}"#).unwrap();
        assert_eq!(req, ValuesRequest::new("S", "'Sheet1'!A1:B1"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn request_missing_fields_default_to_empty() {
        let req: ValuesRequest = serde_json::from_str(r#"{"range": "A1"}"#).unwrap();
        assert!(req.spreadsheet_id.is_empty());
        assert_eq!(req.validate(), Err("spreadsheet_id is required"));

        let req = ValuesRequest::new("S", "");
        assert_eq!(req.validate(), Err("range is required"));
    }

    #[test]
    fn response_uses_capitalized_keys() {
        let resp = ValuesResponse::new(
            ValuesRequest::new("S", "'Sheet1'!A1:B1"),
            vec![vec!["x".to_string(), "y".to_string()]],
        );
        let encoded = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            encoded,
            json!({
                "Request": {"spreadsheet_id": "S", "range": "'Sheet1'!A1:B1"},
                "Values": [["x", "y"]]
            })
        );
    }

    #[test]
    fn normalize_mixed_cells() {
        let rows = vec![
            vec![json!("Timestamp"), json!(42), json!(1.5)],
            vec![json!(true), json!(null)],
            vec![],
        ];
        let normalized = normalize_rows(rows);
        assert_eq!(
            normalized,
            vec![
                vec!["Timestamp".to_string(), "42".to_string(), "1.5".to_string()],
                vec!["true".to_string(), String::new()],
                vec![],
            ]
        );
    }
}
