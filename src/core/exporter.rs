use crate::core::{DiscountResult, GenerationReport, ParsedTable, Row};
use crate::utils::error::{DiscountError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};

pub const GENERATED_COLUMNS: [&str; 5] = [
    "discount_code",
    "discount_amount",
    "generation_status",
    "generation_message",
    "generated_at",
];

pub const SUMMARY_COLUMNS: [&str; 7] = [
    "row",
    "customer",
    "discount_code",
    "amount",
    "status",
    "message",
    "generated_at",
];

const NOT_PROCESSED_STATUS: &str = "not_processed";
const NOT_PROCESSED_MESSAGE: &str = "Not processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Full,
    Summary,
    Successful,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [ExportKind::Full, ExportKind::Summary, ExportKind::Successful];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Summary => "summary",
            Self::Successful => "successful",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "full" => Some(Self::Full),
            "summary" => Some(Self::Summary),
            "successful" | "success" => Some(Self::Successful),
            _ => None,
        }
    }

    /// `discount-codes-<kind>-YYYY-MM-DD.csv`
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("discount-codes-{}-{}.csv", self.as_str(), date.format("%Y-%m-%d"))
    }

    pub fn render(
        &self,
        table: &ParsedTable,
        report: &GenerationReport,
        generated_at: DateTime<Utc>,
    ) -> Result<String> {
        match self {
            Self::Full => full_merge(table, report, generated_at),
            Self::Summary => summary(report, generated_at),
            Self::Successful => successful_only(table, report, generated_at),
        }
    }
}

/// Original columns plus the generated ones, one line per source row.
pub fn full_merge(
    table: &ParsedTable,
    report: &GenerationReport,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    if table.data.is_empty() || report.results.is_empty() {
        return Err(DiscountError::empty_export("no rows or results to merge"));
    }

    let by_row = report.results_by_row();
    let rows = table
        .data
        .iter()
        .enumerate()
        .map(|(idx, row)| (row, by_row.get(&(idx + 1)).copied()));
    write_merged(&table.headers, rows, generated_at)
}

pub fn summary(report: &GenerationReport, generated_at: DateTime<Utc>) -> Result<String> {
    if report.results.is_empty() {
        return Err(DiscountError::empty_export("no results to summarize"));
    }

    let timestamp = format_timestamp(generated_at);
    let mut writer = csv_writer();
    writer.write_record(SUMMARY_COLUMNS)?;

    for result in &report.results {
        writer.write_record([
            result.row.to_string(),
            result.customer.clone(),
            result.discount_code.clone().unwrap_or_default(),
            format_amount(result.amount),
            result.status.as_str().to_string(),
            result.message.clone(),
            timestamp.clone(),
        ])?;
    }

    finish(writer)
}

/// Like [`full_merge`], keeping only rows whose code was created.
pub fn successful_only(
    table: &ParsedTable,
    report: &GenerationReport,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let by_row = report.results_by_row();
    let rows: Vec<_> = table
        .data
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            by_row
                .get(&(idx + 1))
                .copied()
                .filter(|result| result.is_success())
                .map(|result| (row, Some(result)))
        })
        .collect();

    if rows.is_empty() {
        return Err(DiscountError::empty_export("no successful discount codes"));
    }

    write_merged(&table.headers, rows.into_iter(), generated_at)
}

fn write_merged<'a>(
    headers: &[String],
    rows: impl Iterator<Item = (&'a Row, Option<&'a DiscountResult>)>,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let timestamp = format_timestamp(generated_at);
    let mut writer = csv_writer();

    let header_line: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .chain(GENERATED_COLUMNS)
        .collect();
    writer.write_record(&header_line)?;

    for (row, result) in rows {
        let mut record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).cloned().unwrap_or_default())
            .collect();

        match result {
            Some(result) => record.extend([
                result.discount_code.clone().unwrap_or_default(),
                format_amount(result.amount),
                result.status.as_str().to_string(),
                result.message.clone(),
                timestamp.clone(),
            ]),
            None => record.extend([
                String::new(),
                String::new(),
                NOT_PROCESSED_STATUS.to_string(),
                NOT_PROCESSED_MESSAGE.to_string(),
                timestamp.clone(),
            ]),
        }
        writer.write_record(&record)?;
    }

    finish(writer)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| DiscountError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| DiscountError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn format_amount(amount: Option<f64>) -> String {
    amount.map(|a| format!("{:.2}", a)).unwrap_or_default()
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
