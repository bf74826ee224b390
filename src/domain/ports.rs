use crate::domain::model::{DiscountCodeInput, GenerationReport, ParsedTable, RawResponse};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Column mapping and batch settings a pipeline is driven by.
pub trait ConfigProvider: Send + Sync {
    fn input_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn name_column(&self) -> &str;
    fn price_column(&self) -> &str;
    fn transform_source(&self) -> Option<&str>;
    fn export_formats(&self) -> &[String];
    fn archive_exports(&self) -> bool;
}

/// Remote side of code creation. Transport failures are `Err`;
/// everything the platform answered with comes back as a `RawResponse`.
#[async_trait]
pub trait DiscountApi: Send + Sync {
    async fn create_basic_code(&self, input: &DiscountCodeInput) -> Result<RawResponse>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ParsedTable>;
    async fn transform(&self, table: &ParsedTable) -> Result<GenerationReport>;
    async fn load(&self, table: &ParsedTable, report: &GenerationReport) -> Result<Vec<String>>;
}
