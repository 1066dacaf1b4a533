//! Centralised error type for the report pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Malformed timestamp {timestamp:?} on line {line}: {source}")]
    MalformedTimestamp {
        line: usize,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("No referrers found in the supplied log lines")]
    EmptyRecordSet,

    #[error("Malformed template: tag {tag:?} {reason}")]
    MalformedTemplate { tag: String, reason: String },

    #[error("Invalid exclusion pattern #{index} {pattern:?}: {source}")]
    InvalidExclusionPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid date format string {format:?}")]
    InvalidDateFormat { format: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Glob pattern error for {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ReportError {
    pub fn template(tag: &str, reason: &str) -> Self {
        Self::MalformedTemplate {
            tag: tag.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
