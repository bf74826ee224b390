use crate::utils::error::{DiscountError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Optional configuration file, every table and key may be omitted.
///
/// ```toml
/// [shop]
/// domain = "my-shop.myshopify.com"
/// access_token = "${SHOPIFY_ACCESS_TOKEN}"
///
/// [columns]
/// name = "Backer Name"
/// price = "Pledge"
///
/// [generation]
/// code_prefix = "KS24"
/// delay_ms = 600
/// transform = "trim | title"
///
/// [export]
/// output_path = "./output"
/// formats = ["full", "summary", "successful"]
/// archive = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    pub domain: Option<String>,
    /// Full GraphQL endpoint, overrides `domain` + `api_version`.
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub api_version: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnsConfig {
    pub name: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub code_prefix: Option<String>,
    pub delay_ms: Option<u64>,
    pub transform: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: Option<String>,
    pub formats: Option<Vec<String>>,
    pub archive: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiscountError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| DiscountError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${SHOPIFY_ACCESS_TOKEN})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}
