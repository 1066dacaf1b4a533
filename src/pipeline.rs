//! pipeline.rs
//!
//! End-to-end report generation over fully loaded inputs:
//! extract → sort/span → dedupe → exclude → render.

use crate::config::Settings;
use crate::errors::ReportError;
use crate::extractor::extract_records;
use crate::filter::{dedup, ExclusionFilter};
use crate::normalizer::{normalize, SortOrder, Span};
use crate::template::{format_date, TemplateEngine};
use tracing::info;

/// Everything the pipeline needs, already read from disk.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    pub log_lines: &'a [String],
    pub exclusions: &'a [String],
    pub template: &'a str,
    pub settings: &'a Settings,
    pub order: SortOrder,
    /// How many log files `log_lines` came from.
    pub files_loaded: usize,
}

/// Advisory counts for the operator; not part of the rendered output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub files_loaded: usize,
    pub lines_scanned: usize,
    pub referrers_found: usize,
    pub unique_referrers: usize,
    pub duplicates_removed: usize,
    pub exclusion_patterns: usize,
    pub excluded: usize,
    pub qualifying: usize,
}

/// Rendered document plus what it took to produce it.
#[derive(Debug, Clone)]
pub struct Report {
    pub document: String,
    pub span: Span,
    pub stats: RunStats,
}

/// Run every stage in order. Any stage error aborts the run.
///
/// The template and exclusion patterns are compiled before the logs are
/// scanned, so configuration mistakes surface without touching the data.
pub fn run(inputs: Inputs<'_>) -> Result<Report, ReportError> {
    let engine = TemplateEngine::new(inputs.settings)?;
    engine.split(inputs.template)?;
    let filter = ExclusionFilter::new(inputs.exclusions)?;

    let extraction = extract_records(inputs.log_lines)?;
    let mut stats = RunStats {
        files_loaded: inputs.files_loaded,
        lines_scanned: extraction.lines_scanned,
        referrers_found: extraction.records.len(),
        exclusion_patterns: filter.len(),
        ..RunStats::default()
    };

    let normalized = normalize(extraction.records, inputs.order)?;
    let span = normalized.span;
    let from = format_date(&span.start, &inputs.settings.date_format_string)?;
    let to = format_date(&span.end, &inputs.settings.date_format_string)?;
    info!(order = ?inputs.order, "These logs cover the period {from} to {to}");

    let unique = dedup(normalized.urls);
    stats.unique_referrers = unique.len();
    stats.duplicates_removed = stats.referrers_found - unique.len();
    info!(unique = stats.unique_referrers, "There are {} unique referrers", stats.unique_referrers);

    info!(patterns = stats.exclusion_patterns, "Loaded {} exclusion patterns", stats.exclusion_patterns);
    let filtered = filter.apply(unique);
    stats.excluded = filtered.excluded;
    stats.qualifying = filtered.urls.len();
    info!(
        excluded = stats.excluded,
        qualifying = stats.qualifying,
        "Excluded {} referrers; {} qualifying",
        stats.excluded,
        stats.qualifying
    );

    let document = engine.render(inputs.template, &filtered.urls, &span)?;

    Ok(Report {
        document,
        span,
        stats,
    })
}
