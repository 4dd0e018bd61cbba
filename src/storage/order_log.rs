use crate::errors::Result;
use crate::models::{OrderRequest, OrderResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLogEntry {
    pub timestamp: String,
    pub request: OrderRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<OrderResponse>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only JSONL journal of order submissions
pub struct OrderLogger {
    log_path: PathBuf,
}

impl OrderLogger {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Self {
        Self {
            log_path: log_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Log an order the exchange accepted
    pub fn log_submitted_order(
        &self,
        request: &OrderRequest,
        response: &OrderResponse,
    ) -> Result<()> {
        let entry = OrderLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            request: request.clone(),
            response: Some(response.clone()),
            success: response.embedded_error().is_none(),
            error: response
                .embedded_error()
                .map(|(code, msg)| format!("code {}: {}", code, msg)),
        };

        self.write_entry(&entry)
    }

    /// Log an order that failed to go through
    pub fn log_failed_order(&self, request: &OrderRequest, error: &str) -> Result<()> {
        let entry = OrderLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            request: request.clone(),
            response: None,
            success: false,
            error: Some(error.to_string()),
        };

        self.write_entry(&entry)
    }

    fn write_entry(&self, entry: &OrderLogEntry) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entry)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderSide, OrderType};
    use rust_decimal_macros::dec;
    use std::fs;

    fn sample_request() -> OrderRequest {
        OrderRequest {
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: dec!(0.01),
            price: Some(dec!(25000)),
        }
    }

    fn read_entries(path: &Path) -> Vec<OrderLogEntry> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_order_logger_appends_entries() {
        let dir = tempfile::tempdir().unwrap();
        let logger = OrderLogger::new(dir.path().join("orders.jsonl"));

        let response = OrderResponse {
            order_id: Some(42),
            status: Some("NEW".to_string()),
            ..OrderResponse::default()
        };
        logger.log_submitted_order(&sample_request(), &response).unwrap();
        logger
            .log_failed_order(&sample_request(), "API error (HTTP 400): bad")
            .unwrap();

        let entries = read_entries(logger.path());
        assert_eq!(entries.len(), 2);

        assert!(entries[0].success);
        assert_eq!(entries[0].response.as_ref().unwrap().order_id, Some(42));
        assert_eq!(entries[0].request.price, Some(dec!(25000)));

        assert!(!entries[1].success);
        assert!(entries[1].response.is_none());
        assert_eq!(entries[1].error.as_deref(), Some("API error (HTTP 400): bad"));
    }

    #[test]
    fn test_embedded_error_marks_entry_failed() {
        let dir = tempfile::tempdir().unwrap();
        let logger = OrderLogger::new(dir.path().join("orders.jsonl"));

        let response = OrderResponse {
            code: Some(-2010),
            msg: Some("insufficient balance".to_string()),
            ..OrderResponse::default()
        };
        logger.log_submitted_order(&sample_request(), &response).unwrap();

        let entries = read_entries(logger.path());
        assert!(!entries[0].success);
        assert_eq!(
            entries[0].error.as_deref(),
            Some("code -2010: insufficient balance")
        );
    }
}
