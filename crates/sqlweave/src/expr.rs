//! Elementary predicates for WHERE/HAVING/ON clauses.
//!
//! This module provides the `Expr` enum which supports:
//! - AND/OR/NOT grouping
//! - Comparison operators (eq, ne, gt, lt, like, etc.)
//! - Template expressions with `?` placeholders
//! - Raw SQL fragments
//! - Nested statements (`IN (SELECT ...)`, `EXISTS (...)`)
//!
//! Every value renders as a neutral `?`; numbering happens once, in the
//! statement that is finally rendered.

use crate::error::WeaveResult;
use crate::fragment::{BuiltQuery, Fragment, SqlWriter, nested};
use crate::param::Param;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Expression node for building WHERE/HAVING clauses.
#[derive(Clone, Debug)]
pub enum Expr {
    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// Simple comparison: column op ?
    Compare {
        column: String,
        op: &'static str,
        value: Param,
    },

    /// NULL check: column IS NULL or column IS NOT NULL
    NullCheck { column: String, is_null: bool },

    /// IN list: column IN (?, ?, ...) or column NOT IN (...)
    InList {
        column: String,
        values: Vec<Param>,
        negated: bool,
    },

    /// BETWEEN: column BETWEEN ? AND ?
    Between {
        column: String,
        from: Param,
        to: Param,
        negated: bool,
    },

    /// SQL with `?` markers, one per value.
    /// Example: `Template { sql: "a = ? OR b = ?", params: [1, 2] }`
    Template { sql: String, params: Vec<Param> },

    /// IN subquery: column IN (SELECT ...)
    InSubquery {
        column: String,
        query: Arc<dyn Fragment>,
        negated: bool,
    },

    /// EXISTS (SELECT ...)
    Exists {
        query: Arc<dyn Fragment>,
        negated: bool,
    },

    /// Any other fragment, inlined as is.
    Nested(Arc<dyn Fragment>),

    /// Raw SQL fragment without parameters.
    Raw(String),

    /// Always true (used for empty NOT IN lists).
    True,

    /// Always false (used for empty IN lists).
    False,
}

macro_rules! compare_ctor {
    ($(#[$doc:meta] $name:ident => $op:literal),* $(,)?) => {
        $(
            #[$doc]
            pub fn $name<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
                Expr::Compare {
                    column: column.into(),
                    op: $op,
                    value: Param::new(value),
                }
            }
        )*
    };
}

impl Expr {
    /// Create an AND expression from a list of expressions.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    /// Create an OR expression from a list of expressions.
    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Create a NOT expression.
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    compare_ctor! {
        /// Create an equality condition: column = value
        eq => "=",
        /// Create an inequality condition: column <> value
        ne => "<>",
        /// Create a greater-than condition: column > value
        gt => ">",
        /// Create a greater-than-or-equal condition: column >= value
        gte => ">=",
        /// Create a less-than condition: column < value
        lt => "<",
        /// Create a less-than-or-equal condition: column <= value
        lte => "<=",
        /// Create a LIKE condition: column LIKE pattern
        like => "LIKE",
        /// Create an ILIKE condition: column ILIKE pattern
        ilike => "ILIKE",
    }

    /// Create an IS NULL condition: column IS NULL
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    /// Create an IS NOT NULL condition: column IS NOT NULL
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// Create an IN condition: column IN (values...)
    pub fn in_list<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, values: Vec<T>) -> Self {
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: false,
        }
    }

    /// Create a NOT IN condition: column NOT IN (values...)
    pub fn not_in<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, values: Vec<T>) -> Self {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: true,
        }
    }

    /// Create a BETWEEN condition: column BETWEEN from AND to
    pub fn between<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, from: T, to: T) -> Self {
        Expr::Between {
            column: column.into(),
            from: Param::new(from),
            to: Param::new(to),
            negated: false,
        }
    }

    /// Create a template expression with `?` placeholders.
    ///
    /// # Example
    /// ```ignore
    /// Expr::template("a = ? OR b = ?", vec![Param::new(1), Param::new("x")])
    /// ```
    pub fn template(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Expr::Template {
            sql: sql.into(),
            params,
        }
    }

    /// Create a template expression from values of one type.
    ///
    /// # Example
    /// ```ignore
    /// Expr::template_values("x > ?", vec![10])
    /// ```
    pub fn template_values<T: ToSql + Send + Sync + 'static>(sql: impl Into<String>, values: Vec<T>) -> Self {
        Expr::Template {
            sql: sql.into(),
            params: values.into_iter().map(Param::new).collect(),
        }
    }

    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// column IN (<query>)
    pub fn in_subquery<F: Fragment + 'static>(column: impl Into<String>, query: F) -> Self {
        Expr::InSubquery {
            column: column.into(),
            query: nested(query),
            negated: false,
        }
    }

    /// column NOT IN (<query>)
    pub fn not_in_subquery<F: Fragment + 'static>(column: impl Into<String>, query: F) -> Self {
        Expr::InSubquery {
            column: column.into(),
            query: nested(query),
            negated: true,
        }
    }

    /// EXISTS (<query>)
    pub fn exists<F: Fragment + 'static>(query: F) -> Self {
        Expr::Exists {
            query: nested(query),
            negated: false,
        }
    }

    /// NOT EXISTS (<query>)
    pub fn not_exists<F: Fragment + 'static>(query: F) -> Self {
        Expr::Exists {
            query: nested(query),
            negated: true,
        }
    }

    /// Inline any fragment as a condition.
    pub fn fragment<F: Fragment + 'static>(fragment: F) -> Self {
        Expr::Nested(nested(fragment))
    }

    /// Check if this expression is empty (contains no conditions).
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().all(|e| e.is_empty()),
            Expr::Not(inner) => inner.is_empty(),
            _ => false,
        }
    }

    fn write_group(exprs: &[Expr], sep: &str, w: &mut SqlWriter) -> WeaveResult<()> {
        let mut first = true;
        for e in exprs.iter().filter(|e| !e.is_empty()) {
            if !first {
                w.push(sep);
            }
            first = false;
            // Mixed AND/OR nesting needs parentheses to keep precedence.
            let wrap = matches!(
                (sep, e),
                (" AND ", Expr::Or(_)) | (" OR ", Expr::And(_))
            );
            if wrap {
                w.push_char('(');
                e.write_to(w)?;
                w.push_char(')');
            } else {
                e.write_to(w)?;
            }
        }
        Ok(())
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> WeaveResult<()> {
        match self {
            Expr::And(exprs) => Self::write_group(exprs, " AND ", w)?,
            Expr::Or(exprs) => Self::write_group(exprs, " OR ", w)?,
            Expr::Not(inner) => {
                if !inner.is_empty() {
                    w.push("NOT (");
                    inner.write_to(w)?;
                    w.push_char(')');
                }
            }
            Expr::Compare { column, op, value } => {
                w.push(column).push_char(' ').push(op).push_char(' ');
                w.push_bind(value.clone());
            }
            Expr::NullCheck { column, is_null } => {
                w.push(column);
                w.push(if *is_null { " IS NULL" } else { " IS NOT NULL" });
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    w.push(if *negated { "1=1" } else { "1=0" });
                    return Ok(());
                }
                w.push(column);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    w.push_bind(v.clone());
                }
                w.push_char(')');
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                w.push(column);
                w.push(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                w.push_bind(from.clone()).push(" AND ").push_bind(to.clone());
            }
            Expr::Template { sql, params } => {
                w.push(sql).append_params(params.iter().cloned());
            }
            Expr::InSubquery {
                column,
                query,
                negated,
            } => {
                w.push(column);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                w.push_fragment(query.as_ref())?;
                w.push_char(')');
            }
            Expr::Exists { query, negated } => {
                w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                w.push_fragment(query.as_ref())?;
                w.push_char(')');
            }
            Expr::Nested(fragment) => {
                w.push_fragment(fragment.as_ref())?;
            }
            Expr::Raw(sql) => {
                w.push(sql);
            }
            Expr::True => {
                w.push("1=1");
            }
            Expr::False => {
                w.push("1=0");
            }
        }
        Ok(())
    }
}

impl Fragment for Expr {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        let mut w = SqlWriter::new();
        self.write_to(&mut w)?;
        Ok(w.finish())
    }
}

impl From<Expr> for crate::fragment::Part {
    fn from(expr: Expr) -> Self {
        crate::fragment::Part::fragment(expr)
    }
}

/// A list of conditions ANDed together, built incrementally.
///
/// This is the WHERE/HAVING state of [`SelectQb`](crate::SelectQb).
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    /// Create a new empty expression group.
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    /// Check if the group is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.iter().all(|e| e.is_empty())
    }

    /// Add an expression to be ANDed.
    pub fn and_expr(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// Get all expressions.
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> WeaveResult<()> {
        Expr::write_group(&self.exprs, " AND ", w)
    }
}

impl Fragment for ExprGroup {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        let mut w = SqlWriter::new();
        self.write_to(&mut w)?;
        Ok(w.finish())
    }
}
