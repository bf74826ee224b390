use crate::core::{GenerationReport, Pipeline};
use crate::utils::error::Result;
use std::time::Instant;

/// Outcome of one full batch: what was generated and where it was written.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub report: GenerationReport,
    pub written_files: Vec<String>,
}

pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<BatchOutcome> {
        let started = Instant::now();
        tracing::info!("Starting discount batch...");

        // Extract
        let table = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} rows with columns: {}",
            table.row_count,
            table.headers.join(", ")
        );

        // Transform
        let report = self.pipeline.transform(&table).await?;
        tracing::info!(
            "Generated {} codes ({} errors)",
            report.summary.successful,
            report.summary.errors
        );

        // Load
        let written_files = self.pipeline.load(&table, &report).await?;
        for file in &written_files {
            tracing::info!("Export written: {}", file);
        }

        tracing::info!("Batch finished in {:.1?}", started.elapsed());
        Ok(BatchOutcome {
            report,
            written_files,
        })
    }
}
