use crate::config::batch::{BatchConfig, Overrides};
use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "backer-discounts")]
#[command(about = "Create one discount code per backer from a CSV upload")]
pub struct CliConfig {
    /// CSV file with one backer per row
    #[arg(short, long)]
    pub input: Option<String>,

    /// Column holding the customer name
    #[arg(long)]
    pub name_column: Option<String>,

    /// Column holding the pledge amount
    #[arg(long)]
    pub price_column: Option<String>,

    /// Name transform, e.g. "trim | first_word | upper"
    #[arg(short, long)]
    pub transform: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Shop domain, e.g. my-shop.myshopify.com
    #[arg(long)]
    pub shop: Option<String>,

    #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long)]
    pub api_version: Option<String>,

    #[arg(long)]
    pub code_prefix: Option<String>,

    /// Pause between remote calls in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    #[arg(short, long)]
    pub output: Option<String>,

    /// Exports to write: full, summary, successful
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Bundle all exports into one zip file
    #[arg(long)]
    pub archive: bool,

    /// Validate rows and preview codes without calling the API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 讀取設定檔 (若有指定) 並套用命令列覆蓋
    pub fn into_batch_config(self) -> Result<BatchConfig> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        let overrides = Overrides {
            input_file: self.input,
            output_path: self.output,
            name_column: self.name_column,
            price_column: self.price_column,
            transform: self.transform,
            formats: self.formats,
            archive: self.archive,
            shop_domain: self.shop,
            access_token: self.access_token,
            api_version: self.api_version,
            code_prefix: self.code_prefix,
            delay_ms: self.delay_ms,
            dry_run: self.dry_run,
        };

        BatchConfig::resolve(file, overrides)
    }
}
