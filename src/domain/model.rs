use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One CSV data row, keyed by header name.
pub type Row = HashMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub data: Vec<Row>,
    pub row_count: usize,
}

impl ParsedTable {
    pub fn new(headers: Vec<String>, data: Vec<Row>) -> Self {
        let row_count = data.len();
        Self {
            headers,
            data,
            row_count,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// 取出某欄位的所有值，缺值以空字串表示
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.data
            .iter()
            .map(move |row| row.get(name).map(String::as_str).unwrap_or(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountStatus {
    Success,
    Error,
}

impl DiscountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountResult {
    pub row: usize,
    pub customer: String,
    pub status: DiscountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub message: String,
}

impl DiscountResult {
    pub fn success(row: usize, customer: impl Into<String>, code: String, amount: f64) -> Self {
        Self {
            row,
            customer: customer.into(),
            status: DiscountStatus::Success,
            discount_code: Some(code),
            amount: Some(amount),
            message: "Discount code created successfully".to_string(),
        }
    }

    pub fn error(row: usize, customer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            customer: customer.into(),
            status: DiscountStatus::Error,
            discount_code: None,
            amount: None,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DiscountStatus::Success
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub total: usize,
    pub successful: usize,
    pub errors: usize,
}

impl GenerationSummary {
    pub fn from_results(results: &[DiscountResult]) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            successful,
            errors: results.len() - successful,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub results: Vec<DiscountResult>,
    pub summary: GenerationSummary,
}

impl GenerationReport {
    pub fn new(results: Vec<DiscountResult>) -> Self {
        let summary = GenerationSummary::from_results(&results);
        Self { results, summary }
    }

    /// Results keyed by their 1-based source row.
    pub fn results_by_row(&self) -> HashMap<usize, &DiscountResult> {
        self.results.iter().map(|r| (r.row, r)).collect()
    }
}

/// One `discountCodeBasicCreate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCodeInput {
    pub title: String,
    pub code: String,
    pub starts_at: DateTime<Utc>,
    pub amount: f64,
}

/// The remote result as it came back from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Structured(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}
