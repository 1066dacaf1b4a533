//! File-system side of the tool: find and read logs, exclusions and the
//! template, and write the finished report.

use crate::errors::ReportError;
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Expand a log-file glob (e.g. `"access.log*"`) into a sorted list of files.
///
/// Unreadable entries and directories are skipped.
pub fn discover_logs(pattern: &str) -> Result<Vec<PathBuf>, ReportError> {
    let mut paths: Vec<PathBuf> = glob(pattern)
        .map_err(|e| ReportError::Glob {
            pattern: pattern.to_string(),
            source: e,
        })?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();

    paths.sort();
    if paths.is_empty() {
        warn!(pattern, "No log files matched");
    }
    Ok(paths)
}

/// Read every file in order and concatenate their lines.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn read_log_lines(paths: &[PathBuf]) -> Result<Vec<String>, ReportError> {
    let mut lines = Vec::new();
    for path in paths {
        let bytes = fs::read(path).map_err(|e| ReportError::io(path, e))?;
        lines.extend(String::from_utf8_lossy(&bytes).lines().map(str::to_owned));
    }

    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    info!(
        files = paths.len(),
        "Loaded {} log file(s) ({})",
        paths.len(),
        names.join(", ")
    );
    Ok(lines)
}

/// One pattern per non-blank line, surrounding whitespace trimmed.
pub fn read_exclusions(path: &Path) -> Result<Vec<String>, ReportError> {
    let text = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

pub fn read_template(path: &Path) -> Result<String, ReportError> {
    fs::read_to_string(path).map_err(|e| ReportError::io(path, e))
}

/// Write the report, making sure it ends with a newline.
pub fn write_report(path: &Path, document: &str) -> Result<(), ReportError> {
    let mut contents = document.to_owned();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents).map_err(|e| ReportError::io(path, e))?;
    info!(path = %path.display(), "Report created");
    Ok(())
}
