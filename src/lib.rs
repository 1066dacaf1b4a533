//! Library entrypoint: re‑export modules

pub mod config;
pub mod errors;
pub mod extractor;
pub mod filter;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod template;

pub use config::Settings;
pub use errors::ReportError;
pub use normalizer::SortOrder;
pub use pipeline::{run, Inputs, Report, RunStats};
