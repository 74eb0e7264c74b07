//! Core types: proxy request/response documents, tracing setup

pub mod tracing;
pub mod values;

pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use values::{CellValue, ValuesRequest, ValuesResponse, normalize_rows};
