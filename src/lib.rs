//! tokiscan - registry PDF fact extraction.
//!
//! Reads a scanned land-registry receipt ledger (PDF), recognizes each page
//! with OCR, and asks an LLM for the registry office name and the addresses
//! of ownership transfers by inheritance or corporate merger. The addresses
//! are then cleaned with deterministic rules.

pub mod config;
pub mod extract;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod rate_limit;

pub use config::{Config, ConfigError};
pub use extract::{ExtractionResult, FactExtractor};
pub use pipeline::{PipelineError, RegistryPipeline};
