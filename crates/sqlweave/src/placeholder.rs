//! Placeholder formats and the single rewrite pass applied at the outermost render.
//!
//! Every fragment renders with the neutral `?` marker. Only the builder the caller
//! actually renders turns those markers into dialect syntax, so numbering stays
//! contiguous across nested subqueries.
//!
//! The rewrite is lexical: a `?` inside a string literal or comment is treated as
//! a marker too. Write `??` for a literal question mark (e.g. the jsonb `?`
//! operator); ordinal formats turn it into a single `?` and do not count it.

use crate::error::{WeaveError, WeaveResult};
use crate::fragment::BuiltQuery;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// How bound-value positions are written in the final SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderFormat {
    /// `?` (MySQL, SQLite). Leaves the text untouched.
    #[default]
    Question,
    /// `$1, $2, ...` (PostgreSQL)
    Dollar,
    /// `:1, :2, ...` (Oracle)
    Colon,
    /// `@p1, @p2, ...` (SQL Server)
    #[serde(rename = "at")]
    AtP,
}

impl PlaceholderFormat {
    /// Whether this format encodes the position of each value.
    pub fn is_ordinal(self) -> bool {
        !matches!(self, PlaceholderFormat::Question)
    }

    fn prefix(self) -> &'static str {
        match self {
            PlaceholderFormat::Question => "?",
            PlaceholderFormat::Dollar => "$",
            PlaceholderFormat::Colon => ":",
            PlaceholderFormat::AtP => "@p",
        }
    }

    /// Rewrite the neutral markers of `sql`.
    ///
    /// Ordinal formats require exactly `params` markers.
    pub fn replace_placeholders(self, sql: &str, params: usize) -> WeaveResult<String> {
        if !self.is_ordinal() {
            return Ok(sql.to_string());
        }

        let markers = count_markers(sql);
        if markers != params {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sqlweave.render",
                format = ?self,
                markers,
                params,
                "placeholder rewrite rejected"
            );
            return Err(WeaveError::PlaceholderMismatch {
                format: self,
                markers,
                params,
            });
        }

        let mut out = String::with_capacity(sql.len() + params * 2);
        let mut n = 0usize;
        let mut chars = sql.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            if chars.peek() == Some(&'?') {
                chars.next();
                out.push('?');
                continue;
            }
            n += 1;
            out.push_str(self.prefix());
            let _ = write!(out, "{n}");
        }
        Ok(out)
    }
}

/// Count the neutral markers in `sql`, skipping `??` escapes.
pub(crate) fn count_markers(sql: &str) -> usize {
    let mut count = 0;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '?' {
            if chars.peek() == Some(&'?') {
                chars.next();
            } else {
                count += 1;
            }
        }
    }
    count
}

/// Collapse every whitespace run into a single space and trim both ends.
pub fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render settings for a top-level builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Placeholder format applied once at the outermost render.
    pub placeholder_format: PlaceholderFormat,
    /// Collapse whitespace runs after rewriting.
    pub compact: bool,
}

impl RenderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder format.
    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.placeholder_format = format;
        self
    }

    /// Enable or disable whitespace compaction.
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Apply the final rewrite to a neutrally rendered query.
    pub fn finish(&self, query: BuiltQuery) -> WeaveResult<BuiltQuery> {
        let BuiltQuery { sql, params } = query;
        let mut sql = self.placeholder_format.replace_placeholders(&sql, params.len())?;
        if self.compact {
            sql = compact_sql(&sql);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "sqlweave.render",
            format = ?self.placeholder_format,
            param_count = params.len(),
            sql = %sql,
        );

        Ok(BuiltQuery { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_is_identity() {
        let sql = "a = ? AND b = ?? AND c = ?";
        assert_eq!(
            PlaceholderFormat::Question.replace_placeholders(sql, 0).unwrap(),
            sql
        );
    }

    #[test]
    fn dollar_numbers_left_to_right() {
        let sql = PlaceholderFormat::Dollar
            .replace_placeholders("x > ? AND y IN (?, ?)", 3)
            .unwrap();
        assert_eq!(sql, "x > $1 AND y IN ($2, $3)");
    }

    #[test]
    fn colon_and_at_formats() {
        assert_eq!(
            PlaceholderFormat::Colon.replace_placeholders("a = ? OR b = ?", 2).unwrap(),
            "a = :1 OR b = :2"
        );
        assert_eq!(
            PlaceholderFormat::AtP.replace_placeholders("a = ? OR b = ?", 2).unwrap(),
            "a = @p1 OR b = @p2"
        );
    }

    #[test]
    fn escaped_marker_is_literal() {
        let sql = PlaceholderFormat::Dollar
            .replace_placeholders("data ?? 'key' AND id = ?", 1)
            .unwrap();
        assert_eq!(sql, "data ? 'key' AND id = $1");
        assert_eq!(count_markers("data ?? 'key' AND id = ?"), 1);
    }

    #[test]
    fn mismatch_is_rejected() {
        let err = PlaceholderFormat::Dollar
            .replace_placeholders("a = ? AND b = ?", 1)
            .unwrap_err();
        assert!(matches!(
            err,
            WeaveError::PlaceholderMismatch { markers: 2, params: 1, .. }
        ));

        let err = PlaceholderFormat::Colon
            .replace_placeholders("a = $1", 1)
            .unwrap_err();
        assert!(err.is_placeholder_mismatch());
    }

    #[test]
    fn mismatch_count_skips_escapes() {
        let err = PlaceholderFormat::AtP
            .replace_placeholders("tags ?? 'a' AND id = ? AND n = ?", 1)
            .unwrap_err();
        assert!(matches!(
            err,
            WeaveError::PlaceholderMismatch { markers: 2, params: 1, .. }
        ));
    }

    #[test]
    fn compact_is_idempotent() {
        let once = compact_sql("  SELECT a,\n\tb  FROM t \n");
        assert_eq!(once, "SELECT a, b FROM t");
        assert_eq!(compact_sql(&once), once);
    }

    #[test]
    fn config_from_json() {
        let cfg: RenderConfig =
            serde_json::from_str(r#"{"placeholder_format": "dollar", "compact": true}"#).unwrap();
        assert_eq!(cfg.placeholder_format, PlaceholderFormat::Dollar);
        assert!(cfg.compact);

        let cfg: RenderConfig = serde_json::from_str(r#"{"placeholder_format": "at"}"#).unwrap();
        assert_eq!(cfg, RenderConfig::new().placeholder_format(PlaceholderFormat::AtP));
    }

    #[test]
    fn finish_rewrites_then_compacts() {
        let cfg = RenderConfig::new()
            .placeholder_format(PlaceholderFormat::Dollar)
            .compact(true);
        let out = cfg
            .finish(BuiltQuery::new("a = ?\n  AND b = ?".to_string(), vec![
                crate::param::Param::new(1i32),
                crate::param::Param::new(2i32),
            ]))
            .unwrap();
        assert_eq!(out.sql, "a = $1 AND b = $2");
        assert_eq!(out.params.len(), 2);
    }
}
