use backer_discounts::core::{csv_parser, Storage};
use backer_discounts::utils::error::{DiscountError, ErrorSeverity};
use backer_discounts::utils::{logger, validation::Validate};
use backer_discounts::{
    BatchConfig, BatchEngine, CliConfig, DiscountGenerator, DiscountPipeline, LocalStorage,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting backer-discounts");

    let config = match cli.into_batch_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    tracing::debug!("Batch config: {:?}", redacted(&config));

    let result = if config.dry_run {
        dry_run(&config).await
    } else {
        run(config).await
    };

    if let Err(e) = result {
        exit_with(e);
    }
    Ok(())
}

async fn run(config: BatchConfig) -> backer_discounts::Result<()> {
    let client = config.shopify_client()?;
    tracing::info!("🔗 Using GraphQL endpoint {}", client.endpoint());

    let generator = DiscountGenerator::new(client, config.generator_settings());
    let storage = LocalStorage::new(String::new());
    let pipeline = DiscountPipeline::new(storage, config, generator);
    let engine = BatchEngine::new(pipeline);

    let outcome = engine.run().await?;
    let summary = outcome.report.summary;

    println!(
        "✅ {} rows processed: {} codes created, {} errors",
        summary.total, summary.successful, summary.errors
    );
    for result in outcome.report.results.iter().filter(|r| !r.is_success()) {
        println!("   row {} ({}): {}", result.row, result.customer, result.message);
    }
    for file in &outcome.written_files {
        println!("📁 {}", file);
    }
    Ok(())
}

async fn dry_run(config: &BatchConfig) -> backer_discounts::Result<()> {
    tracing::info!("🔍 DRY RUN MODE - no discount codes will be created");

    let storage = LocalStorage::new(String::new());
    let bytes = storage.read_file(&config.input_file).await?;
    let table = csv_parser::parse(&bytes)?;

    let generator = DiscountGenerator::new(NoRemote, config.generator_settings());
    let pipeline = DiscountPipeline::new(storage, config.clone(), generator);
    pipeline.check_columns(&table)?;

    let plan = pipeline.generator().plan(
        &table.data,
        &config.name_column,
        &config.price_column,
        config.transform.as_deref(),
    );

    let ready = plan.iter().filter(|p| p.problem.is_none()).count();
    for planned in &plan {
        match (&planned.discount_code, &planned.problem) {
            (Some(code), _) => println!(
                "row {:>4}  {:<30} {:>10.2}  {}",
                planned.row,
                planned.customer,
                planned.amount.unwrap_or_default(),
                code
            ),
            (None, Some(problem)) => {
                println!("row {:>4}  {:<30} ⚠️  {}", planned.row, planned.customer, problem)
            }
            (None, None) => {}
        }
    }
    println!("{} of {} rows would be submitted", ready, plan.len());
    Ok(())
}

/// Placeholder API for dry runs; never called.
struct NoRemote;

#[async_trait::async_trait]
impl backer_discounts::core::DiscountApi for NoRemote {
    async fn create_basic_code(
        &self,
        _input: &backer_discounts::core::DiscountCodeInput,
    ) -> backer_discounts::Result<backer_discounts::core::RawResponse> {
        Err(DiscountError::remote("dry run does not call the API"))
    }
}

fn redacted(config: &BatchConfig) -> BatchConfig {
    let mut config = config.clone();
    if config.access_token.is_some() {
        config.access_token = Some("***".to_string());
    }
    config
}

fn exit_with(e: DiscountError) -> ! {
    tracing::error!(
        "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
