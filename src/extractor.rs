//! extractor.rs
//!
//! Pull referrer entries out of raw access-log lines.
//!
//! A referrer line looks like the combined log format:
//!
//! ```text
//! 91.6.204.133 - - [21/Jan/2015:08:04:38 +0000] "GET /css/print.css HTTP/1.1" 200 844 "http://mattgemmell.com/a-farewell-to-files/" "Mozilla/5.0"
//! ```
//!
//! Lines without an `http…` referrer field are skipped silently.

use crate::errors::ReportError;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Format of the bracketed access-log timestamp, e.g. `21/Jan/2015:08:04:38 +0000`.
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Leading IP-like token, ident, user, bracketed timestamp, quoted request,
/// status, size, then a quoted field starting with `http` plus at least two more chars.
static REFERRER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^[0-9.]+\s+\S+\s+\S+\s+\[(?P<bracket>[^\]]+)\]\s+"[^"]+"\s+\d+\s+\d+\s+"(?P<referrer>http[^"]{2,})".+$"#,
    )
    .expect("referrer line regex")
});

/// First bracketed `day/month/rest` group on the line.
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(?P<timestamp>\d+/[^/]+/[\d: +-]+)\]").expect("timestamp regex")
});

/// One referrer hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: DateTime<FixedOffset>,
    pub referrer_url: String,
}

/// Raw captures from a referrer line, before the timestamp is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferrerFields<'a> {
    pub timestamp: &'a str,
    pub referrer_url: &'a str,
}

/// Result of a full scan: the records plus how many lines were looked at.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub lines_scanned: usize,
}

/// Match a single line, returning its timestamp and referrer captures,
/// or `None` when it is not a referrer line.
///
/// A referrer line whose bracketed field is not shaped like a timestamp still
/// matches; the raw bracket text is returned so parsing reports it.
pub fn match_referrer_line(line: &str) -> Option<ReferrerFields<'_>> {
    let caps = REFERRER_LINE.captures(line)?;
    let referrer = caps.name("referrer")?.as_str();
    let timestamp = TIMESTAMP
        .captures(line)
        .and_then(|ts| ts.name("timestamp"))
        .or_else(|| caps.name("bracket"))?
        .as_str();
    Some(ReferrerFields {
        timestamp,
        referrer_url: referrer,
    })
}

/// Parse an access-log timestamp such as `21/Jan/2015:08:04:38 +0000`.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
}

/// Scan every line and build a [`Record`] for each referrer line, in scan order.
///
/// An unparseable timestamp on a referrer line aborts the scan; `line` in the
/// error is 1-based across the concatenated input.
pub fn extract_records<I, S>(lines: I) -> Result<Extraction, ReportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut extraction = Extraction::default();

    for (idx, line) in lines.into_iter().enumerate() {
        extraction.lines_scanned += 1;
        let line = line.as_ref();

        let Some(fields) = match_referrer_line(line) else {
            continue;
        };

        let timestamp =
            parse_timestamp(fields.timestamp).map_err(|e| ReportError::MalformedTimestamp {
                line: idx + 1,
                timestamp: fields.timestamp.to_string(),
                source: e,
            })?;

        debug!(line = idx + 1, url = fields.referrer_url, "Found referrer");
        extraction.records.push(Record {
            timestamp,
            referrer_url: fields.referrer_url.to_string(),
        });
    }

    info!(
        referrers = extraction.records.len(),
        lines = extraction.lines_scanned,
        "Found {} referrers in {} lines",
        extraction.records.len(),
        extraction.lines_scanned
    );
    Ok(extraction)
}
