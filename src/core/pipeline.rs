use crate::core::csv_parser;
use crate::core::exporter::ExportKind;
use crate::core::generator::DiscountGenerator;
use crate::core::{ConfigProvider, DiscountApi, GenerationReport, ParsedTable, Pipeline, Storage};
use crate::utils::error::{DiscountError, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub struct DiscountPipeline<S: Storage, C: ConfigProvider, A: DiscountApi> {
    storage: S,
    config: C,
    generator: DiscountGenerator<A>,
}

impl<S: Storage, C: ConfigProvider, A: DiscountApi> DiscountPipeline<S, C, A> {
    pub fn new(storage: S, config: C, generator: DiscountGenerator<A>) -> Self {
        Self {
            storage,
            config,
            generator,
        }
    }

    pub fn generator(&self) -> &DiscountGenerator<A> {
        &self.generator
    }

    /// 確認對應的欄位存在於表頭中
    pub fn check_columns(&self, table: &ParsedTable) -> Result<()> {
        for (field, column) in [
            ("name_column", self.config.name_column()),
            ("price_column", self.config.price_column()),
        ] {
            if !table.has_column(column) {
                return Err(DiscountError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: column.to_string(),
                    reason: format!("column not found, available: {}", table.headers.join(", ")),
                });
            }
        }
        Ok(())
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }

    fn render_exports(
        &self,
        table: &ParsedTable,
        report: &GenerationReport,
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        let date = generated_at.date_naive();
        let mut files = Vec::new();

        for format in self.config.export_formats() {
            let kind = ExportKind::from_name(format).ok_or_else(|| {
                DiscountError::InvalidConfigValueError {
                    field: "export.formats".to_string(),
                    value: format.clone(),
                    reason: "expected full, summary or successful".to_string(),
                }
            })?;

            match kind.render(table, report, generated_at) {
                Ok(text) => files.push((kind.file_name(date), text.into_bytes())),
                // 批次已送出，空匯出只略過不中止
                Err(DiscountError::EmptyExportError { message }) => {
                    tracing::warn!("Skipping {} export: {}", kind.as_str(), message);
                }
                Err(e) => return Err(e),
            }
        }

        let report_json = serde_json::to_vec_pretty(report)?;
        files.push((
            format!("discount-report-{}.json", date.format("%Y-%m-%d")),
            report_json,
        ));

        Ok(files)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, A: DiscountApi> Pipeline for DiscountPipeline<S, C, A> {
    async fn extract(&self) -> Result<ParsedTable> {
        tracing::debug!("Reading upload from: {}", self.config.input_file());
        let bytes = self.storage.read_file(self.config.input_file()).await?;
        let table = csv_parser::parse(&bytes)?;
        self.check_columns(&table)?;
        Ok(table)
    }

    async fn transform(&self, table: &ParsedTable) -> Result<GenerationReport> {
        let report = self
            .generator
            .generate(
                &table.data,
                self.config.name_column(),
                self.config.price_column(),
                self.config.transform_source(),
            )
            .await;
        Ok(report)
    }

    async fn load(&self, table: &ParsedTable, report: &GenerationReport) -> Result<Vec<String>> {
        let generated_at = Utc::now();
        let files = self.render_exports(table, report, generated_at)?;
        let mut written = Vec::new();

        if self.config.archive_exports() {
            let archive_name = format!("discount-export-{}.zip", generated_at.format("%Y-%m-%d"));
            tracing::debug!("Creating ZIP archive with {} files", files.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };

            let path = self.output_file(&archive_name);
            self.storage.write_file(&path, &zip_data).await?;
            written.push(path);
        } else {
            for (name, data) in &files {
                let path = self.output_file(name);
                self.storage.write_file(&path, data).await?;
                written.push(path);
            }
        }

        Ok(written)
    }
}
