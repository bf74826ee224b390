pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, ShopifyClient};
pub use config::BatchConfig;
pub use core::{
    engine::{BatchEngine, BatchOutcome},
    generator::{DiscountGenerator, GeneratorSettings},
    pipeline::DiscountPipeline,
};
pub use domain::model::{DiscountResult, GenerationReport, GenerationSummary, ParsedTable};
pub use utils::error::{DiscountError, Result};
