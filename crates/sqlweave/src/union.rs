//! UNION / UNION ALL chains.
//!
//! Every statement in the chain is parenthesized, so ORDER BY / LIMIT / OFFSET
//! apply to the whole union on every dialect.
//!
//! # Example
//! ```ignore
//! use sqlweave::{PlaceholderFormat, select, union};
//!
//! let q = union([
//!     select(["id"]).from("a").gt("x", 10),
//!     select(["id"]).from("b").lt("y", 5),
//! ])
//! .order_by("id")
//! .limit(100)
//! .placeholder_format(PlaceholderFormat::Dollar);
//! // (SELECT id FROM a WHERE x > $1) UNION (SELECT id FROM b WHERE y < $2) ORDER BY id LIMIT 100
//! ```
//!
//! When the union is the body of a CTE or a subquery, set the placeholder format
//! on the outermost builder only; embedding forces the union back to `?`.

use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{BuiltQuery, Fragment, Part, SqlWriter, nested};
use crate::placeholder::{PlaceholderFormat, RenderConfig};
use std::sync::Arc;

/// Combining operator placed in front of a union segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionOp {
    /// `UNION` (distinct rows)
    Distinct,
    /// `UNION ALL`
    All,
}

impl UnionOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            UnionOp::Distinct => "UNION",
            UnionOp::All => "UNION ALL",
        }
    }
}

/// One `[op] (statement)` segment. The first segment has no operator.
#[derive(Clone, Debug)]
struct UnionSegment {
    op: Option<UnionOp>,
    query: Arc<dyn Fragment>,
}

/// Builder for `(SELECT ...) UNION [ALL] (SELECT ...) ...` chains.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct UnionQb {
    segments: Vec<UnionSegment>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    suffixes: Vec<Arc<dyn Fragment>>,
    config: RenderConfig,
}

impl UnionQb {
    /// An empty chain. Rendering fails until a statement is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain whose segments after the first are joined by `op`.
    pub fn from_parts<F, I>(op: UnionOp, parts: I) -> Self
    where
        F: Fragment + 'static,
        I: IntoIterator<Item = F>,
    {
        parts
            .into_iter()
            .fold(Self::new(), |qb, part| qb.push_segment(op, part))
    }

    fn push_segment<F: Fragment + 'static>(mut self, op: UnionOp, query: F) -> Self {
        let op = if self.segments.is_empty() { None } else { Some(op) };
        self.segments.push(UnionSegment {
            op,
            query: nested(query),
        });
        self
    }

    /// Append a statement with UNION (distinct).
    pub fn union<F: Fragment + 'static>(self, query: F) -> Self {
        self.push_segment(UnionOp::Distinct, query)
    }

    /// Append a statement with UNION ALL.
    pub fn union_all<F: Fragment + 'static>(self, query: F) -> Self {
        self.push_segment(UnionOp::All, query)
    }

    /// Number of statements in the chain.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Add ORDER BY expressions for the whole union.
    ///
    /// Example: `.order_by("id DESC").order_by("created_at")`
    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_by.push(clause.to_string());
        self
    }

    /// Add several ORDER BY expressions at once.
    pub fn order_by_all<I, S>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by.extend(clauses.into_iter().map(Into::into));
        self
    }

    /// Set LIMIT on the whole union.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET on the whole union.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Append a trailing fragment (comment, hint, locking clause).
    pub fn suffix<F: Fragment + 'static>(mut self, fragment: F) -> Self {
        self.suffixes.push(nested(fragment));
        self
    }

    /// Set the placeholder format.
    ///
    /// Prefer setting it once on the outermost builder when the union is part of
    /// a larger statement.
    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.config.placeholder_format = format;
        self
    }

    /// Collapse all whitespace runs in the output to single spaces.
    pub fn compact(mut self) -> Self {
        self.config.compact = true;
        self
    }

    fn build_neutral(&self) -> WeaveResult<BuiltQuery> {
        if self.segments.is_empty() {
            return Err(WeaveError::EmptyUnion);
        }

        let mut w = SqlWriter::new();
        for (index, segment) in self.segments.iter().enumerate() {
            if let Some(op) = segment.op {
                w.push_char(' ').push(op.as_sql()).push_char(' ');
            }
            w.push_char('(');
            w.push_fragment(segment.query.as_ref())
                .map_err(|err| WeaveError::union_segment(index, err))?;
            w.push_char(')');
        }

        if !self.order_by.is_empty() {
            w.push(" ORDER BY ").push(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }
        if !self.suffixes.is_empty() {
            w.push_char(' ');
            w.push_joined(&self.suffixes, " ")?;
        }

        Ok(w.finish())
    }
}

impl Fragment for UnionQb {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        self.config.finish(self.build_neutral()?)
    }

    fn neutral(&self) -> Option<Arc<dyn Fragment>> {
        Some(Arc::new(
            self.clone().placeholder_format(PlaceholderFormat::Question),
        ))
    }
}

impl From<UnionQb> for Part {
    fn from(union: UnionQb) -> Self {
        Part::fragment(union)
    }
}

#[cfg(test)]
mod tests;
