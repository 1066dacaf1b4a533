//! Chronological ordering of referrer records.

use crate::errors::ReportError;
use crate::extractor::Record;
use chrono::{DateTime, FixedOffset};

/// Order in which referrers appear in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Earliest and latest timestamps covered by the processed logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Referrer URLs in report order, plus the period they cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub urls: Vec<String>,
    pub span: Span,
}

/// Sort records oldest-first, capture the span, apply `order`, and keep only the URLs.
///
/// The sort always runs because lines from several log files are concatenated
/// without any ordering guarantee. It is stable, so records sharing a timestamp
/// keep their scan order.
pub fn normalize(mut records: Vec<Record>, order: SortOrder) -> Result<Normalized, ReportError> {
    records.sort_by_key(|r| r.timestamp);

    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ReportError::EmptyRecordSet),
    };
    let span = Span {
        start: first.timestamp,
        end: last.timestamp,
    };

    if order == SortOrder::NewestFirst {
        records.reverse();
    }

    let urls = records.into_iter().map(|r| r.referrer_url).collect();
    Ok(Normalized { urls, span })
}
