use crate::adapters::shopify::{ShopifyClient, DEFAULT_API_VERSION};
use crate::config::toml_config::TomlConfig;
use crate::core::code::{MAX_CODE_LENGTH, DEFAULT_CODE_PREFIX};
use crate::core::exporter::ExportKind;
use crate::core::generator::{GeneratorSettings, DEFAULT_REQUEST_DELAY};
use crate::core::name_transform::NameTransform;
use crate::core::ConfigProvider;
use crate::utils::error::{DiscountError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_range,
    validate_required_field, validate_resolved, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const MAX_DELAY_MS: u64 = 60_000;

/// Settings for one batch after the config file and command line are merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub input_file: String,
    pub output_path: String,
    pub name_column: String,
    pub price_column: String,
    pub transform: Option<String>,
    pub formats: Vec<String>,
    pub archive: bool,
    pub shop_domain: Option<String>,
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub api_version: String,
    pub timeout_seconds: u64,
    pub code_prefix: String,
    pub delay_ms: u64,
    /// Remote settings are not required when nothing is submitted.
    pub dry_run: bool,
}

/// Values given on the command line; `None` falls back to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_file: Option<String>,
    pub output_path: Option<String>,
    pub name_column: Option<String>,
    pub price_column: Option<String>,
    pub transform: Option<String>,
    pub formats: Vec<String>,
    pub archive: bool,
    pub shop_domain: Option<String>,
    pub access_token: Option<String>,
    pub api_version: Option<String>,
    pub code_prefix: Option<String>,
    pub delay_ms: Option<u64>,
    pub dry_run: bool,
}

impl BatchConfig {
    pub fn resolve(file: TomlConfig, overrides: Overrides) -> Result<Self> {
        let input_file = validate_required_field("input", &overrides.input_file)?.clone();
        let name_column = overrides
            .name_column
            .or(file.columns.name)
            .ok_or_else(|| DiscountError::MissingConfigError {
                field: "columns.name".to_string(),
            })?;
        let price_column = overrides
            .price_column
            .or(file.columns.price)
            .ok_or_else(|| DiscountError::MissingConfigError {
                field: "columns.price".to_string(),
            })?;

        let formats = if !overrides.formats.is_empty() {
            overrides.formats
        } else {
            file.export.formats.unwrap_or_else(|| {
                ExportKind::ALL
                    .iter()
                    .map(|kind| kind.as_str().to_string())
                    .collect()
            })
        };

        Ok(Self {
            input_file,
            output_path: overrides
                .output_path
                .or(file.export.output_path)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            name_column,
            price_column,
            transform: overrides
                .transform
                .or(file.generation.transform)
                .filter(|t| !t.trim().is_empty()),
            formats,
            archive: overrides.archive || file.export.archive.unwrap_or(false),
            shop_domain: overrides.shop_domain.or(file.shop.domain),
            endpoint: file.shop.endpoint,
            access_token: overrides.access_token.or(file.shop.access_token),
            api_version: overrides
                .api_version
                .or(file.shop.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout_seconds: file.shop.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            code_prefix: overrides
                .code_prefix
                .or(file.generation.code_prefix)
                .unwrap_or_else(|| DEFAULT_CODE_PREFIX.to_string()),
            delay_ms: overrides
                .delay_ms
                .or(file.generation.delay_ms)
                .unwrap_or(DEFAULT_REQUEST_DELAY.as_millis() as u64),
            dry_run: overrides.dry_run,
        })
    }

    /// GraphQL endpoint: explicit override, or derived from the shop domain.
    pub fn graphql_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        let domain = validate_required_field("shop.domain", &self.shop_domain)?;
        Ok(ShopifyClient::admin_endpoint(domain, &self.api_version))
    }

    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            code_prefix: self.code_prefix.clone(),
            request_delay: Duration::from_millis(self.delay_ms),
        }
    }

    pub fn shopify_client(&self) -> Result<ShopifyClient> {
        let token = validate_required_field("shop.access_token", &self.access_token)?;
        ShopifyClient::with_timeout(
            self.graphql_endpoint()?,
            token.clone(),
            Duration::from_secs(self.timeout_seconds),
        )
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input_file)?;
        validate_file_extension("input", &self.input_file, &["csv", "txt"])?;
        validate_path("export.output_path", &self.output_path)?;
        validate_non_empty_string("columns.name", &self.name_column)?;
        validate_non_empty_string("columns.price", &self.price_column)?;
        validate_non_empty_string("generation.code_prefix", &self.code_prefix)?;
        // 前綴太長會把名稱完全擠掉
        validate_range(
            "generation.code_prefix length",
            self.code_prefix.len(),
            1,
            MAX_CODE_LENGTH / 2,
        )?;
        validate_range("generation.delay_ms", self.delay_ms, 0, MAX_DELAY_MS)?;

        for format in &self.formats {
            if ExportKind::from_name(format).is_none() {
                return Err(DiscountError::InvalidConfigValueError {
                    field: "export.formats".to_string(),
                    value: format.clone(),
                    reason: "Unsupported format. Valid formats: full, summary, successful"
                        .to_string(),
                });
            }
        }

        if let Some(transform) = &self.transform {
            NameTransform::compile(transform).map_err(|e| {
                DiscountError::InvalidConfigValueError {
                    field: "generation.transform".to_string(),
                    value: transform.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if !self.dry_run {
            let token = validate_required_field("shop.access_token", &self.access_token)?;
            validate_non_empty_string("shop.access_token", token)?;
            validate_resolved("shop.access_token", token)?;
            validate_url("shop.endpoint", &self.graphql_endpoint()?)?;
        }

        Ok(())
    }
}

impl ConfigProvider for BatchConfig {
    fn input_file(&self) -> &str {
        &self.input_file
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn name_column(&self) -> &str {
        &self.name_column
    }

    fn price_column(&self) -> &str {
        &self.price_column
    }

    fn transform_source(&self) -> Option<&str> {
        self.transform.as_deref()
    }

    fn export_formats(&self) -> &[String] {
        &self.formats
    }

    fn archive_exports(&self) -> bool {
        self.archive
    }
}
