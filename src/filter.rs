//! Duplicate removal and exclusion filtering of referrer URLs.

use crate::errors::ReportError;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use tracing::debug;

/// Drop repeated URLs, keeping each one at its first position.
pub fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Compiled set of case-insensitive exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<Regex>,
}

/// URLs that survived filtering, and how many were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub urls: Vec<String>,
    pub excluded: usize,
}

impl ExclusionFilter {
    /// Compile every pattern; the first invalid one aborts.
    ///
    /// Patterns are trimmed before compiling. Matching is unanchored.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ReportError> {
        let patterns = patterns
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let pattern = raw.as_ref().trim();
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ReportError::InvalidExclusionPattern {
                        index: idx + 1,
                        pattern: pattern.to_string(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when any pattern matches somewhere in `url`.
    pub fn is_excluded(&self, url: &str) -> bool {
        match self.patterns.iter().find(|re| re.is_match(url)) {
            Some(re) => {
                debug!(url, pattern = re.as_str(), "Excluding referrer");
                true
            }
            None => false,
        }
    }

    /// Keep the URLs no pattern matches, in their original order.
    pub fn apply(&self, urls: Vec<String>) -> Filtered {
        let total = urls.len();
        let urls: Vec<String> = urls.into_iter().filter(|u| !self.is_excluded(u)).collect();
        Filtered {
            excluded: total - urls.len(),
            urls,
        }
    }
}
