use crate::core::code::{CodeGenerator, DEFAULT_CODE_PREFIX};
use crate::core::name_transform::NameTransform;
use crate::core::response;
use crate::core::{DiscountApi, DiscountCodeInput, DiscountResult, GenerationReport, Row};
use crate::utils::error::{DiscountError, Result};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(600);
pub const INVALID_ROW_MESSAGE: &str = "Invalid name or price";
pub const TRANSFORM_ERROR_PREFIX: &str = "Transform function error: ";

static PRICE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Sc}\s]").expect("price noise pattern is valid"));

// 逗號只接受千分位格式，例如 1,250.50
static GROUPED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("grouped price pattern is valid")
});

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub code_prefix: String,
    /// Pause after every row that reached the remote API.
    pub request_delay: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

/// What a dry run would submit for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedDiscount {
    pub row: usize,
    pub customer: String,
    pub discount_code: Option<String>,
    pub amount: Option<f64>,
    pub problem: Option<String>,
}

struct PreparedRow {
    customer: String,
    amount: f64,
}

/// Creates one discount code per row, strictly in order, one call at a time.
pub struct DiscountGenerator<A: DiscountApi> {
    api: A,
    settings: GeneratorSettings,
}

impl<A: DiscountApi> DiscountGenerator<A> {
    pub fn new(api: A, settings: GeneratorSettings) -> Self {
        Self { api, settings }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub async fn generate(
        &self,
        rows: &[Row],
        name_column: &str,
        price_column: &str,
        transform_source: Option<&str>,
    ) -> GenerationReport {
        let transform = compile_transform(transform_source);
        let mut codes = CodeGenerator::new(self.settings.code_prefix.as_str());
        let mut results = Vec::with_capacity(rows.len());

        tracing::info!(
            "Generating discount codes for {} rows (name column '{}', price column '{}')",
            rows.len(),
            name_column,
            price_column
        );

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;

            let prepared = match prepare_row(row, name_column, price_column, transform.as_ref()) {
                Ok(prepared) => prepared,
                Err((customer, e)) => {
                    tracing::warn!("Row {} skipped: {}", row_number, e);
                    results.push(DiscountResult::error(row_number, customer, e.to_string()));
                    continue;
                }
            };

            let now = Utc::now();
            let code = codes.next_code(&prepared.customer, now);
            let input = DiscountCodeInput {
                title: format!("Backer reward for {}", prepared.customer),
                code: code.clone(),
                starts_at: now,
                amount: prepared.amount,
            };

            tracing::debug!(
                "Row {}: creating code {} for {} ({})",
                row_number,
                code,
                prepared.customer,
                prepared.amount
            );

            let result = match self.submit(&input).await {
                Ok(()) => DiscountResult::success(row_number, &prepared.customer, code, prepared.amount),
                Err(e) => {
                    tracing::warn!("Row {} failed: {}", row_number, e);
                    DiscountResult::error(row_number, &prepared.customer, e.to_string())
                }
            };
            results.push(result);

            if !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }
        }

        let report = GenerationReport::new(results);
        tracing::info!(
            "Generation finished: {} total, {} successful, {} errors",
            report.summary.total,
            report.summary.successful,
            report.summary.errors
        );
        report
    }

    async fn submit(&self, input: &DiscountCodeInput) -> Result<()> {
        let raw = self.api.create_basic_code(input).await?;
        let normalized = response::normalize(raw)?;
        response::interpret(normalized)?;
        Ok(())
    }

    /// 預覽：只做驗證、轉換與代碼產生，不呼叫遠端
    pub fn plan(
        &self,
        rows: &[Row],
        name_column: &str,
        price_column: &str,
        transform_source: Option<&str>,
    ) -> Vec<PlannedDiscount> {
        let transform = compile_transform(transform_source);
        let mut codes = CodeGenerator::new(self.settings.code_prefix.as_str());

        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                match prepare_row(row, name_column, price_column, transform.as_ref()) {
                    Ok(prepared) => PlannedDiscount {
                        row: idx + 1,
                        discount_code: Some(codes.next_code(&prepared.customer, Utc::now())),
                        customer: prepared.customer,
                        amount: Some(prepared.amount),
                        problem: None,
                    },
                    Err((customer, problem)) => PlannedDiscount {
                        row: idx + 1,
                        customer,
                        discount_code: None,
                        amount: None,
                        problem: Some(problem.to_string()),
                    },
                }
            })
            .collect()
    }
}

fn compile_transform(source: Option<&str>) -> Option<Result<NameTransform>> {
    let source = source.map(str::trim).filter(|s| !s.is_empty())?;
    Some(NameTransform::compile(source))
}

// 失敗時回傳原始顧客名稱與錯誤
fn prepare_row(
    row: &Row,
    name_column: &str,
    price_column: &str,
    transform: Option<&Result<NameTransform>>,
) -> std::result::Result<PreparedRow, (String, DiscountError)> {
    let name = row.get(name_column).map(|n| n.trim()).unwrap_or("");
    let amount = row.get(price_column).and_then(|p| parse_price(p));

    let amount = match amount {
        Some(amount) if !name.is_empty() => amount,
        _ => return Err((name.to_string(), DiscountError::validation(INVALID_ROW_MESSAGE))),
    };

    let customer = match transform {
        None => name.to_string(),
        Some(Ok(compiled)) => compiled
            .apply(name)
            .map_err(|e| transform_failure(name, &e))?,
        Some(Err(e)) => return Err(transform_failure(name, e)),
    };

    Ok(PreparedRow { customer, amount })
}

fn transform_failure(name: &str, error: &DiscountError) -> (String, DiscountError) {
    (
        name.to_string(),
        DiscountError::transform(format!("{}{}", TRANSFORM_ERROR_PREFIX, error)),
    )
}

/// Strips currency symbols and whitespace, then parses what is left.
///
/// A `,` is only read as a thousands separator (`1,250.50`); any other
/// comma, such as a decimal comma in `25,00`, makes the price invalid.
/// Non-finite values are rejected.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = PRICE_NOISE.replace_all(raw, "");
    let cleaned = if cleaned.contains(',') {
        if !GROUPED_PRICE.is_match(&cleaned) {
            return None;
        }
        cleaned.replace(',', "")
    } else {
        cleaned.into_owned()
    };

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingApi {
        calls: Arc<Mutex<Vec<DiscountCodeInput>>>,
        reply: Option<serde_json::Value>,
        fail_transport: bool,
    }

    impl RecordingApi {
        fn succeeding() -> Self {
            Self::default()
        }

        fn replying(body: serde_json::Value) -> Self {
            Self {
                reply: Some(body),
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DiscountApi for RecordingApi {
        async fn create_basic_code(&self, input: &DiscountCodeInput) -> Result<RawResponse> {
            self.calls.lock().unwrap().push(input.clone());
            if self.fail_transport {
                return Err(DiscountError::remote("connection reset"));
            }
            let body = self.reply.clone().unwrap_or_else(|| {
                json!({
                    "data": {
                        "discountCodeBasicCreate": {
                            "codeDiscountNode": {"id": "gid://shopify/DiscountCodeNode/1"},
                            "userErrors": []
                        }
                    }
                })
            });
            Ok(RawResponse::Structured(body))
        }
    }

    fn row(name: &str, price: &str) -> Row {
        let mut row = Row::new();
        row.insert("name".to_string(), name.to_string());
        row.insert("price".to_string(), price.to_string());
        row
    }

    fn generator(api: RecordingApi) -> DiscountGenerator<RecordingApi> {
        DiscountGenerator::new(
            api,
            GeneratorSettings {
                request_delay: Duration::ZERO,
                ..GeneratorSettings::default()
            },
        )
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("£25.00"), Some(25.0));
        assert_eq!(parse_price("$1,250.50"), Some(1250.5));
        assert_eq!(parse_price(" € 12 "), Some(12.0));
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("inf"), None);
        assert_eq!(parse_price("NaN"), None);
    }

    #[test]
    fn test_parse_price_rejects_decimal_comma() {
        assert_eq!(parse_price("€25,00"), None);
        assert_eq!(parse_price("12,5"), None);
        assert_eq!(parse_price("1,25,000"), None);
        assert_eq!(parse_price("$12,345,678.9"), Some(12345678.9));
        assert_eq!(parse_price("1,000"), Some(1000.0));
    }

    #[tokio::test]
    async fn test_alice_and_bob() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());
        let rows = vec![row("Alice", "£25.00"), row("Bob", "oops")];

        let report = generator.generate(&rows, "name", "price", None).await;

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.successful, 1);
        assert_eq!(report.summary.errors, 1);

        let alice = &report.results[0];
        assert_eq!(alice.row, 1);
        assert!(alice.is_success());
        assert!(alice.discount_code.as_deref().unwrap().starts_with("BACKER_ALICE_"));
        assert_eq!(alice.amount, Some(25.0));

        let bob = &report.results[1];
        assert_eq!(bob.row, 2);
        assert!(!bob.is_success());
        assert_eq!(bob.message, INVALID_ROW_MESSAGE);
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_rows_make_no_remote_call() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());
        let rows = vec![row("Carol", "abc"), row("", "10"), Row::new()];

        let report = generator.generate(&rows, "name", "price", None).await;

        assert_eq!(api.call_count(), 0);
        assert_eq!(report.summary.errors, 3);
        assert!(report.results.iter().all(|r| r.message == INVALID_ROW_MESSAGE));
    }

    #[tokio::test]
    async fn test_transform_applies_to_code_and_title() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());
        let rows = vec![row("  alice smith ", "10")];

        let report = generator
            .generate(&rows, "name", "price", Some("first_word | upper"))
            .await;

        assert_eq!(report.results[0].customer, "ALICE");
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0].title, "Backer reward for ALICE");
        assert!(calls[0].code.starts_with("BACKER_ALICE_"));
    }

    #[tokio::test]
    async fn test_failing_transform_keeps_original_name() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());
        let rows = vec![row("Alice", "10"), row("Bob", "12")];

        let report = generator
            .generate(&rows, "name", "price", Some("name.toUpperCase()"))
            .await;

        assert_eq!(api.call_count(), 0);
        assert_eq!(report.summary.errors, 2);
        assert!(report.results[0].message.starts_with(TRANSFORM_ERROR_PREFIX));
        assert_eq!(report.results[0].customer, "Alice");
        assert_eq!(report.results[1].customer, "Bob");
    }

    #[tokio::test]
    async fn test_blank_transform_is_ignored() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());

        let report = generator
            .generate(&[row("Alice", "10")], "name", "price", Some("   "))
            .await;

        assert_eq!(report.summary.successful, 1);
        assert_eq!(report.results[0].customer, "Alice");
    }

    #[tokio::test]
    async fn test_remote_user_errors_are_recorded() {
        let api = RecordingApi::replying(json!({
            "data": {
                "discountCodeBasicCreate": {
                    "codeDiscountNode": null,
                    "userErrors": [{"field": ["basicCodeDiscount", "code"], "message": "Code must be unique"}]
                }
            }
        }));
        let generator = generator(api.clone());

        let report = generator
            .generate(&[row("Alice", "10"), row("Bob", "20")], "name", "price", None)
            .await;

        assert_eq!(api.call_count(), 2);
        assert_eq!(report.summary.errors, 2);
        assert_eq!(
            report.results[0].message,
            "basicCodeDiscount.code: Code must be unique"
        );
        assert!(report.results[0].discount_code.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_abort_batch() {
        let api = RecordingApi {
            fail_transport: true,
            ..RecordingApi::default()
        };
        let generator = generator(api.clone());
        let rows = vec![row("Alice", "10"), row("Bob", "20"), row("Carol", "30")];

        let report = generator.generate(&rows, "name", "price", None).await;

        assert_eq!(api.call_count(), 3);
        assert_eq!(report.results.len(), rows.len());
        assert!(report.results[2].message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_codes_are_unique_within_a_batch() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());
        let rows: Vec<Row> = (0..20).map(|_| row("Same Name", "5")).collect();

        let report = generator.generate(&rows, "name", "price", None).await;

        let mut codes: Vec<_> = report
            .results
            .iter()
            .filter_map(|r| r.discount_code.clone())
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_after_remote_calls() {
        let api = RecordingApi::succeeding();
        let generator = DiscountGenerator::new(
            api.clone(),
            GeneratorSettings {
                request_delay: Duration::from_millis(40),
                ..GeneratorSettings::default()
            },
        );
        // Carol 價格無效，Bad 轉換後為空字串，兩者都不應等待
        let rows = vec![
            row("Alice", "10"),
            row("Carol", "x"),
            row("Bad", "20"),
            row("Bob", "20"),
        ];

        let started = tokio::time::Instant::now();
        let report = generator
            .generate(&rows, "name", "price", Some("remove(\"Bad\")"))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(api.call_count(), 2);
        assert_eq!(report.summary.successful, 2);
        assert_eq!(report.results[1].message, INVALID_ROW_MESSAGE);
        assert!(report.results[2].message.starts_with(TRANSFORM_ERROR_PREFIX));
        assert!(elapsed >= Duration::from_millis(80), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(120), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_plan_makes_no_calls() {
        let api = RecordingApi::succeeding();
        let generator = generator(api.clone());
        let rows = vec![row("Alice", "$5"), row("Bob", "")];

        let plan = generator.plan(&rows, "name", "price", None);

        assert_eq!(api.call_count(), 0);
        assert_eq!(plan.len(), 2);
        assert!(plan[0].discount_code.as_deref().unwrap().starts_with("BACKER_ALICE_"));
        assert_eq!(plan[1].problem.as_deref(), Some(INVALID_ROW_MESSAGE));
    }
}
