pub mod code;
pub mod csv_parser;
pub mod engine;
pub mod exporter;
pub mod generator;
pub mod name_transform;
pub mod pipeline;
pub mod response;

pub use crate::domain::model::{
    DiscountCodeInput, DiscountResult, DiscountStatus, GenerationReport, GenerationSummary,
    ParsedTable, RawResponse, Row,
};
pub use crate::domain::ports::{ConfigProvider, DiscountApi, Pipeline, Storage};
pub use crate::utils::error::Result;
