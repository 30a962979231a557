//! CTE (WITH clause) wrapper.
//!
//! [`WithQb`] names one or more fragments as common table expressions and
//! puts them in front of a main statement. Bodies and the main statement can
//! be any fragment: a SELECT, a UNION chain, raw SQL.
//!
//! # Example
//! ```ignore
//! use sqlweave::{PlaceholderFormat, select, union_all, with};
//!
//! let q = with(
//!         "recent",
//!         union_all([
//!             select(["id"]).from("orders").gt("created_at", since),
//!             select(["id"]).from("archived_orders").gt("created_at", since),
//!         ]),
//!     )
//!     .query(select(["*"]).from("recent").limit(10))
//!     .placeholder_format(PlaceholderFormat::Dollar);
//! // WITH recent AS ((SELECT id FROM orders WHERE created_at > $1) UNION ALL
//! //   (SELECT id FROM archived_orders WHERE created_at > $2)) SELECT * FROM recent LIMIT 10
//! ```
//!
//! Recursive CTEs use [`WithQb::with_recursive`]; one recursive definition
//! turns the whole clause into `WITH RECURSIVE`.

use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{BuiltQuery, Fragment, Part, SqlWriter, nested};
use crate::ident::Ident;
use crate::placeholder::{PlaceholderFormat, RenderConfig};
use crate::union::UnionOp;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct CteDefinition {
    name: String,
    columns: Option<Vec<String>>,
    query: Arc<dyn Fragment>,
    /// Recursive term and the operator joining it to the base term.
    recursive: Option<(UnionOp, Arc<dyn Fragment>)>,
}

impl CteDefinition {
    fn write_to(&self, w: &mut SqlWriter) -> WeaveResult<()> {
        let mut head = String::new();
        Ident::parse(&self.name)?.write_sql(&mut head);
        if let Some(cols) = &self.columns {
            head.push('(');
            for (i, col) in cols.iter().enumerate() {
                if i > 0 {
                    head.push_str(", ");
                }
                Ident::parse(col)?.write_sql(&mut head);
            }
            head.push(')');
        }

        w.push(&head).push(" AS (");
        w.push_fragment(self.query.as_ref())?;
        if let Some((op, recursive)) = &self.recursive {
            w.push_char(' ').push(op.as_sql()).push_char(' ');
            w.push_fragment(recursive.as_ref())?;
        }
        w.push_char(')');
        Ok(())
    }
}

/// Builder for `WITH ... <main statement>`.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct WithQb {
    ctes: Vec<CteDefinition>,
    main: Option<Arc<dyn Fragment>>,
    config: RenderConfig,
}

impl WithQb {
    /// An empty WITH clause. Rendering fails until a CTE and a main statement are set.
    pub fn new() -> Self {
        Self::default()
    }

    fn push_cte(
        mut self,
        name: &str,
        columns: Option<Vec<String>>,
        query: Arc<dyn Fragment>,
        recursive: Option<(UnionOp, Arc<dyn Fragment>)>,
    ) -> Self {
        self.ctes.push(CteDefinition {
            name: name.to_string(),
            columns,
            query,
            recursive,
        });
        self
    }

    /// Add `<name> AS (<query>)`.
    pub fn with<F: Fragment + 'static>(self, name: &str, query: F) -> Self {
        self.push_cte(name, None, nested(query), None)
    }

    /// Add `<name>(<columns>) AS (<query>)`.
    pub fn with_columns<F, I, S>(self, name: &str, columns: I, query: F) -> Self
    where
        F: Fragment + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_cte(name, Some(columns), nested(query), None)
    }

    /// Add a recursive CTE: `<name> AS (<base> UNION ALL <recursive>)`.
    pub fn with_recursive<B, R>(self, name: &str, base: B, recursive: R) -> Self
    where
        B: Fragment + 'static,
        R: Fragment + 'static,
    {
        self.push_cte(name, None, nested(base), Some((UnionOp::All, nested(recursive))))
    }

    /// Add a recursive CTE using UNION (with deduplication).
    pub fn with_recursive_union<B, R>(self, name: &str, base: B, recursive: R) -> Self
    where
        B: Fragment + 'static,
        R: Fragment + 'static,
    {
        self.push_cte(
            name,
            None,
            nested(base),
            Some((UnionOp::Distinct, nested(recursive))),
        )
    }

    /// Set the statement that follows the WITH clause.
    pub fn query<F: Fragment + 'static>(mut self, main: F) -> Self {
        self.main = Some(nested(main));
        self
    }

    /// Set the placeholder format applied when this statement is rendered.
    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.config.placeholder_format = format;
        self
    }

    /// Collapse whitespace runs in the output.
    pub fn compact(mut self) -> Self {
        self.config.compact = true;
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.ctes.iter().any(|cte| cte.recursive.is_some())
    }

    fn build_neutral(&self) -> WeaveResult<BuiltQuery> {
        if self.ctes.is_empty() {
            return Err(WeaveError::EmptyWith);
        }
        let main = self.main.as_ref().ok_or(WeaveError::MissingStatement)?;

        let mut w = SqlWriter::new();
        w.push(if self.is_recursive() {
            "WITH RECURSIVE "
        } else {
            "WITH "
        });
        for (i, cte) in self.ctes.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            cte.write_to(&mut w)?;
        }
        w.push_char(' ');
        w.push_fragment(main.as_ref())?;
        Ok(w.finish())
    }
}

impl Fragment for WithQb {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        self.config.finish(self.build_neutral()?)
    }

    fn neutral(&self) -> Option<Arc<dyn Fragment>> {
        Some(Arc::new(
            self.clone().placeholder_format(PlaceholderFormat::Question),
        ))
    }
}

impl From<WithQb> for Part {
    fn from(with: WithQb) -> Self {
        Part::fragment(with)
    }
}
