use crate::core::{ParsedTable, Row};
use crate::utils::error::{DiscountError, Result};
use csv::{ReaderBuilder, Trim};

/// 將上傳的 CSV 位元組解析成表格
///
/// The first record is the header list. Short records are padded with
/// empty strings, fields past the last header are dropped.
pub fn parse(bytes: &[u8]) -> Result<ParsedTable> {
    let decoded = String::from_utf8_lossy(bytes);
    let text: &str = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);

    check_balanced_quotes(text)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DiscountError::parse(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    for (idx, header) in headers.iter().enumerate() {
        if headers[..idx].contains(header) {
            return Err(DiscountError::parse(format!(
                "duplicate column header '{}'",
                header
            )));
        }
    }

    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DiscountError::parse(e.to_string()))?;

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or("").to_string()))
            .collect();
        data.push(row);
    }

    tracing::debug!(
        "Parsed CSV with {} columns and {} rows",
        headers.len(),
        data.len()
    );

    Ok(ParsedTable::new(headers, data))
}

// csv 解碼器遇到未結束的引號會直接讀到檔尾，這裡先行檢查
// 只有欄位開頭的引號才算開始引號欄位，欄位中間的引號是一般字元
fn check_balanced_quotes(text: &str) -> Result<()> {
    let mut chars = text.chars().peekable();
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut line = 1;
    let mut opened_at = 0;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if at_field_start => {
                in_quotes = true;
                opened_at = line;
                at_field_start = false;
            }
            ',' | '\r' => at_field_start = true,
            '\n' => {
                line += 1;
                at_field_start = true;
            }
            _ => at_field_start = false,
        }
    }

    if in_quotes {
        return Err(DiscountError::parse(format!(
            "unterminated quoted field starting on line {}",
            opened_at
        )));
    }
    Ok(())
}
