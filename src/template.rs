//! template.rs
//!
//! Minimal tag-substitution renderer for the report.
//!
//! A template is split into three zones around the row tags:
//!
//! ```text
//! <pre> {%row%} <row chunk> {%endrow%} <post>
//! ```
//!
//! The row chunk is repeated once per referrer with the URL tag filled in,
//! then date tags and user tags are replaced across the whole document.
//! Tag names match case-insensitively and tolerate whitespace inside the
//! delimiters (`{% Row %}` is a row tag).

use crate::config::Settings;
use crate::errors::ReportError;
use crate::normalizer::Span;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use regex::{Captures, NoExpand, Regex, RegexBuilder};
use std::fmt::Write;

/// The three pieces of a template, borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zones<'t> {
    pub pre: &'t str,
    pub row: &'t str,
    pub post: &'t str,
}

/// Compiled tag vocabulary, built once from [`Settings`].
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    row_start: Regex,
    row_end: Regex,
    url: Regex,
    /// Start date, end date, then every user tag, one capture group each.
    static_tags: Regex,
    user_values: Vec<String>,
    row_start_label: String,
    row_end_label: String,
    date_format: String,
}

impl TemplateEngine {
    pub fn new(settings: &Settings) -> Result<Self, ReportError> {
        check_date_format(&settings.date_format_string)?;

        let mut static_names = vec![
            settings.start_date_tag.as_str(),
            settings.end_date_tag.as_str(),
        ];
        static_names.extend(settings.template_tags.keys().map(String::as_str));

        let alternatives = static_names
            .iter()
            .map(|name| format!("({})", regex::escape(name)))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            row_start: tag_regex(settings, &regex::escape(&settings.row_start_tag))?,
            row_end: tag_regex(settings, &regex::escape(&settings.row_end_tag))?,
            url: tag_regex(settings, &regex::escape(&settings.result_url_tag))?,
            static_tags: tag_regex(settings, &format!("(?:{alternatives})"))?,
            user_values: settings.template_tags.values().cloned().collect(),
            row_start_label: label(settings, &settings.row_start_tag),
            row_end_label: label(settings, &settings.row_end_tag),
            date_format: settings.date_format_string.clone(),
        })
    }

    /// Locate the row tags and cut the template into its zones.
    ///
    /// The row zone must occur exactly once: a missing tag, a second row-start
    /// tag, or a row-end tag outside the pair is an error.
    pub fn split<'t>(&self, template: &'t str) -> Result<Zones<'t>, ReportError> {
        let start = self
            .row_start
            .find(template)
            .ok_or_else(|| ReportError::template(&self.row_start_label, "not found in template"))?;
        let pre = &template[..start.start()];
        let rest = &template[start.end()..];

        let end = self
            .row_end
            .find(rest)
            .ok_or_else(|| ReportError::template(&self.row_end_label, "not found after row start"))?;
        let row = &rest[..end.start()];
        let post = &rest[end.end()..];

        if self.row_start.is_match(row) || self.row_start.is_match(post) {
            return Err(ReportError::template(
                &self.row_start_label,
                "appears more than once",
            ));
        }
        if self.row_end.is_match(pre) || self.row_end.is_match(post) {
            return Err(ReportError::template(
                &self.row_end_label,
                "appears more than once",
            ));
        }

        Ok(Zones { pre, row, post })
    }

    /// One copy of the row chunk with every URL tag replaced by `url`, verbatim.
    pub fn render_row(&self, row: &str, url: &str) -> String {
        self.url.replace_all(row, NoExpand(url)).into_owned()
    }

    /// Replace date tags and user tags in a single pass over `document`.
    ///
    /// Inserted values are never re-scanned, so a value that happens to contain
    /// a tag stays literal.
    pub fn substitute_static(&self, document: &str, span: &Span) -> Result<String, ReportError> {
        let start = format_date(&span.start, &self.date_format)?;
        let end = format_date(&span.end, &self.date_format)?;

        let out = self.static_tags.replace_all(document, |caps: &Captures| {
            // Leftmost alternative wins, so start date beats end date beats user tags.
            match caps.iter().skip(1).position(|m| m.is_some()) {
                Some(0) => start.clone(),
                Some(1) => end.clone(),
                Some(n) => self.user_values[n - 2].clone(),
                None => caps[0].to_string(),
            }
        });
        Ok(out.into_owned())
    }

    /// Render the full report: pre zone, one row per URL, post zone, then static tags.
    pub fn render(
        &self,
        template: &str,
        urls: &[String],
        span: &Span,
    ) -> Result<String, ReportError> {
        let zones = self.split(template)?;

        let mut document = String::with_capacity(
            zones.pre.len() + zones.post.len() + urls.len() * (zones.row.len() + 64),
        );
        document.push_str(zones.pre);
        for url in urls {
            document.push_str(&self.render_row(zones.row, url));
        }
        document.push_str(zones.post);

        self.substitute_static(&document, span)
    }
}

/// `<start>\s*<name>\s*<end>`, case-insensitive. `name` must already be a regex.
fn tag_regex(settings: &Settings, name: &str) -> Result<Regex, ReportError> {
    let pattern = format!(
        r"{}\s*{}\s*{}",
        regex::escape(&settings.tag_start_delimiter),
        name,
        regex::escape(&settings.tag_end_delimiter)
    );
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ReportError::template(&pattern, &format!("cannot be compiled: {e}")))
}

fn label(settings: &Settings, name: &str) -> String {
    format!(
        "{}{}{}",
        settings.tag_start_delimiter, name, settings.tag_end_delimiter
    )
}

fn check_date_format(format: &str) -> Result<(), ReportError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ReportError::InvalidDateFormat {
            format: format.to_string(),
        });
    }
    Ok(())
}

/// Format `ts` with a strftime-style string, e.g. `%d %b, %Y at %H:%M:%S`.
pub fn format_date(ts: &DateTime<FixedOffset>, format: &str) -> Result<String, ReportError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    let invalid = || ReportError::InvalidDateFormat {
        format: format.to_string(),
    };
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    let mut out = String::new();
    write!(out, "{}", ts.format_with_items(items.iter())).map_err(|_| invalid())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::parse_timestamp;

    fn span() -> Span {
        Span {
            start: parse_timestamp("20/Jan/2015:08:04:38 +0000").unwrap(),
            end: parse_timestamp("21/Jan/2015:17:30:00 +0000").unwrap(),
        }
    }

    fn urls(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new(&Settings::default()).unwrap()
    }

    #[test]
    fn rows_repeat_between_pre_and_post() {
        let out = engine()
            .render(
                "pre{%row%}X{%url%}Y{%endrow%}post",
                &urls(&["http://a", "http://b"]),
                &span(),
            )
            .unwrap();
        assert_eq!(out, "preXhttp://aYXhttp://bYpost");
    }

    #[test]
    fn no_urls_leaves_pre_and_post() {
        let out = engine()
            .render("<ul>\n{%row%}<li>{%url%}</li>\n{%endrow%}</ul>\n", &[], &span())
            .unwrap();
        assert_eq!(out, "<ul>\n</ul>\n");
    }

    #[test]
    fn split_handles_multiline_zones() {
        let text = "<html>\n<ul>\n{% row %}\n<li>{% url %}</li>\n{% endrow %}\n</ul>\n";
        let zones = engine().split(text).unwrap();
        assert_eq!(zones.pre, "<html>\n<ul>\n");
        assert_eq!(zones.row, "\n<li>{% url %}</li>\n");
        assert_eq!(zones.post, "\n</ul>\n");
    }

    #[test]
    fn tags_match_case_insensitively() {
        let out = engine()
            .render("a{%ROW%}[{% Url %}]{%EndRow  %}b", &urls(&["http://x"]), &span())
            .unwrap();
        assert_eq!(out, "a[http://x]b");
    }

    #[test]
    fn dates_are_formatted_and_no_tags_remain() {
        let out = engine()
            .render(
                "From {%start_date%} to {% END_DATE %}{%row%}{%endrow%}.",
                &[],
                &span(),
            )
            .unwrap();
        assert_eq!(
            out,
            "From 20 Jan, 2015 at 08:04:38 to 21 Jan, 2015 at 17:30:00."
        );
        assert!(!out.contains("{%"));
    }

    #[test]
    fn user_tags_are_substituted_everywhere() {
        let mut settings = Settings::default();
        settings
            .template_tags
            .insert("title".into(), "Referrers for example.com".into());
        let out = TemplateEngine::new(&settings)
            .unwrap()
            .render(
                "<h1>{%title%}</h1>{%row%}<a title=\"{%TITLE%}\">{%url%}</a>{%endrow%}",
                &urls(&["http://a"]),
                &span(),
            )
            .unwrap();
        assert_eq!(
            out,
            "<h1>Referrers for example.com</h1><a title=\"Referrers for example.com\">http://a</a>"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let mut settings = Settings::default();
        settings.template_tags.insert("a".into(), "{%b%}".into());
        settings.template_tags.insert("b".into(), "{%start_date%}".into());
        let out = TemplateEngine::new(&settings)
            .unwrap()
            .render("{%a%}|{%b%}{%row%}{%endrow%}", &[], &span())
            .unwrap();
        assert_eq!(out, "{%b%}|{%start_date%}");
    }

    #[test]
    fn urls_are_inserted_literally() {
        let out = engine()
            .render(
                "{%row%}{%url%}{%endrow%}",
                &urls(&["http://x/?a=$1&b=${0}"]),
                &span(),
            )
            .unwrap();
        assert_eq!(out, "http://x/?a=$1&b=${0}");
    }

    #[test]
    fn custom_delimiters_are_escaped() {
        let settings = Settings {
            tag_start_delimiter: "[[".into(),
            tag_end_delimiter: "]]".into(),
            row_start_tag: "each".into(),
            row_end_tag: "/each".into(),
            result_url_tag: "link".into(),
            ..Settings::default()
        };
        let out = TemplateEngine::new(&settings)
            .unwrap()
            .render(
                "{%row%}[[each]]<[[ link ]]>[[/each]]",
                &urls(&["http://a", "http://b"]),
                &span(),
            )
            .unwrap();
        assert_eq!(out, "{%row%}<http://a><http://b>");
    }

    #[test]
    fn missing_row_start_is_fatal() {
        match engine().split("no rows {%endrow%}") {
            Err(ReportError::MalformedTemplate { tag, .. }) => assert_eq!(tag, "{%row%}"),
            other => panic!("expected MalformedTemplate, got {other:?}"),
        }
    }

    #[test]
    fn missing_row_end_is_fatal() {
        match engine().split("{%row%} never closed") {
            Err(ReportError::MalformedTemplate { tag, .. }) => assert_eq!(tag, "{%endrow%}"),
            other => panic!("expected MalformedTemplate, got {other:?}"),
        }
    }

    #[test]
    fn second_row_zone_is_rejected() {
        let text = "{%row%}a{%endrow%}{%row%}b{%endrow%}";
        assert!(matches!(
            engine().split(text),
            Err(ReportError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn invalid_date_format_is_rejected_up_front() {
        let settings = Settings {
            date_format_string: "%Q".into(),
            ..Settings::default()
        };
        assert!(matches!(
            TemplateEngine::new(&settings),
            Err(ReportError::InvalidDateFormat { .. })
        ));
    }

    #[test]
    fn format_date_keeps_offset() {
        let ts = parse_timestamp("21/Jan/2015:08:04:38 -0500").unwrap();
        assert_eq!(
            format_date(&ts, "%Y-%m-%d %H:%M:%S %z").unwrap(),
            "2015-01-21 08:04:38 -0500"
        );
    }
}
