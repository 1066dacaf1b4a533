//! Type-safe configuration loader using the `config` crate,
//! with `REFERRERS__…` environment-variable overrides.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Template vocabulary and formatting options.
///
/// Every key is optional in the configuration file; anything missing falls
/// back to the value in [`Settings::default`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Opening delimiter of a template tag (e.g. `{%`)
    pub tag_start_delimiter: String,

    /// Closing delimiter of a template tag (e.g. `%}`)
    pub tag_end_delimiter: String,

    /// Tag marking the start of the repeating row chunk
    pub row_start_tag: String,

    /// Tag marking the end of the repeating row chunk
    pub row_end_tag: String,

    /// Tag replaced by the referrer URL inside each row
    pub result_url_tag: String,

    /// Tag replaced by the first timestamp covered by the logs
    pub start_date_tag: String,

    /// Tag replaced by the last timestamp covered by the logs
    pub end_date_tag: String,

    /// strftime-style format used for both date tags
    pub date_format_string: String,

    /// User-defined static tags: tag name → literal replacement
    pub template_tags: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tag_start_delimiter: "{%".into(),
            tag_end_delimiter: "%}".into(),
            row_start_tag: "row".into(),
            row_end_tag: "endrow".into(),
            result_url_tag: "url".into(),
            start_date_tag: "start_date".into(),
            end_date_tag: "end_date".into(),
            date_format_string: "%d %b, %Y at %H:%M:%S".into(),
            template_tags: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (format picked from its extension),
    /// then apply overrides such as:
    ///
    /// - `REFERRERS__DATE_FORMAT_STRING`
    /// - `REFERRERS__TAG_START_DELIMITER`
    ///
    /// When `required` is false a missing file simply yields the defaults.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::from(path).required(required))
            .add_source(Environment::with_prefix("REFERRERS").separator("__"))
            .build()?;

        cfg.try_deserialize()
    }
}
