//! SELECT statement builder.
//!
//! `SelectQb` is the outer statement most fragments end up in: CASE expressions
//! as columns, LATERAL subqueries in FROM and JOIN position, subqueries inside
//! predicates. It renders every child with `?` and numbers placeholders once.

use crate::error::WeaveResult;
use crate::expr::{Expr, ExprGroup};
use crate::fragment::{Aliased, BuiltQuery, Fragment, Part, SqlWriter, nested};
use crate::lateral::{JoinKind, LateralPart};
use crate::param::Param;
use crate::placeholder::{PlaceholderFormat, RenderConfig};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

#[derive(Clone, Debug)]
enum FromClause {
    Table(String),
    Lateral(LateralPart),
}

/// SELECT query builder.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct SelectQb {
    distinct: bool,
    /// SELECT columns (`*` when empty)
    columns: Vec<Part>,
    from: Option<FromClause>,
    /// JOIN clauses, plain and lateral, in call order
    joins: Vec<Arc<dyn Fragment>>,
    where_group: ExprGroup,
    group_by: Vec<String>,
    having_group: ExprGroup,
    order_clauses: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    suffixes: Vec<Arc<dyn Fragment>>,
    config: RenderConfig,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table (or any FROM expression).
    pub fn new(table: &str) -> Self {
        Self::default().from(table)
    }

    /// Create a SELECT without a FROM clause.
    pub fn empty() -> Self {
        Self::default()
    }

    // ==================== SELECT columns ====================

    /// Append columns given as SQL text.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(cols.into_iter().map(Into::<String>::into).map(Part::from));
        self
    }

    /// Append one column: raw SQL, a nested fragment or a bound value.
    pub fn column(mut self, col: impl Into<Part>) -> Self {
        self.columns.push(col.into());
        self
    }

    /// Append `(<col>) AS <alias>`.
    pub fn column_as(mut self, col: impl Into<Part>, alias: &str) -> Self {
        self.columns.push(Part::fragment(Aliased::new(col, alias)));
        self
    }

    /// SELECT DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== FROM ====================

    /// Set the FROM table or expression.
    pub fn from(mut self, from_expr: &str) -> Self {
        self.from = Some(FromClause::Table(from_expr.to_string()));
        self
    }

    /// `FROM LATERAL (<sub>) AS <alias>`.
    pub fn from_select_lateral<F: Fragment + 'static>(mut self, sub: F, alias: &str) -> Self {
        self.from = Some(FromClause::Lateral(LateralPart::from(sub, alias)));
        self
    }

    // ==================== JOIN ====================

    /// Add a JOIN clause written out in full, e.g. `"JOIN orders o ON o.user_id = u.id"`.
    pub fn join(mut self, clause: &str) -> Self {
        self.joins.push(nested(Expr::raw(clause)));
        self
    }

    /// Add a JOIN clause with `?` placeholders.
    pub fn join_template<T: ToSql + Send + Sync + 'static>(mut self, clause: &str, values: Vec<T>) -> Self {
        self.joins.push(nested(Expr::template_values(clause, values)));
        self
    }

    /// Add INNER JOIN.
    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.join(&format!("INNER JOIN {} ON {}", table, on))
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.join(&format!("LEFT JOIN {} ON {}", table, on))
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, table: &str, on: &str) -> Self {
        self.join(&format!("RIGHT JOIN {} ON {}", table, on))
    }

    /// Add FULL OUTER JOIN.
    pub fn full_join(self, table: &str, on: &str) -> Self {
        self.join(&format!("FULL OUTER JOIN {} ON {}", table, on))
    }

    /// `JOIN LATERAL (<sub>) AS <alias> ON <on>`.
    pub fn join_lateral<F, C>(mut self, sub: F, alias: &str, on: C) -> Self
    where
        F: Fragment + 'static,
        C: Fragment + 'static,
    {
        self.joins
            .push(Arc::new(LateralPart::join(JoinKind::Inner, sub, alias, on)));
        self
    }

    /// `LEFT JOIN LATERAL (<sub>) AS <alias> ON <on>`.
    pub fn left_join_lateral<F, C>(mut self, sub: F, alias: &str, on: C) -> Self
    where
        F: Fragment + 'static,
        C: Fragment + 'static,
    {
        self.joins
            .push(Arc::new(LateralPart::join(JoinKind::Left, sub, alias, on)));
        self
    }

    /// `CROSS JOIN LATERAL (<sub>) AS <alias>`.
    pub fn cross_join_lateral<F: Fragment + 'static>(mut self, sub: F, alias: &str) -> Self {
        self.joins.push(Arc::new(LateralPart::cross_join(sub, alias)));
        self
    }

    // ==================== WHERE conditions ====================

    /// Add a WHERE expression.
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }

    /// Add WHERE: column = value
    pub fn eq<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.and_where(Expr::eq(column, value))
    }

    /// Add WHERE: column <> value
    pub fn ne<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.and_where(Expr::ne(column, value))
    }

    /// Add WHERE: column > value
    pub fn gt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.and_where(Expr::gt(column, value))
    }

    /// Add WHERE: column >= value
    pub fn gte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.and_where(Expr::gte(column, value))
    }

    /// Add WHERE: column < value
    pub fn lt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.and_where(Expr::lt(column, value))
    }

    /// Add WHERE: column <= value
    pub fn lte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.and_where(Expr::lte(column, value))
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.and_where(Expr::is_null(column))
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(self, column: &str) -> Self {
        self.and_where(Expr::is_not_null(column))
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<T: ToSql + Send + Sync + 'static>(self, column: &str, values: Vec<T>) -> Self {
        self.and_where(Expr::in_list(column, values))
    }

    /// Add a raw WHERE condition without params.
    pub fn raw(self, sql: &str) -> Self {
        self.and_where(Expr::raw(sql))
    }

    /// Add a WHERE condition with `?` placeholders.
    pub fn where_template<T: ToSql + Send + Sync + 'static>(self, sql: &str, values: Vec<T>) -> Self {
        self.and_where(Expr::template_values(sql, values))
    }

    /// Add a WHERE condition with `?` placeholders bound to mixed-type values.
    pub fn where_params(self, sql: &str, params: Vec<Param>) -> Self {
        self.and_where(Expr::template(sql, params))
    }

    /// Add WHERE if value is Some: column = value
    pub fn eq_opt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    // ==================== Grouping & Ordering ====================

    /// Add a GROUP BY expression.
    pub fn group_by(mut self, clause: &str) -> Self {
        self.group_by.push(clause.to_string());
        self
    }

    /// Add a HAVING expression.
    pub fn having(mut self, expr: Expr) -> Self {
        self.having_group.and_expr(expr);
        self
    }

    /// Add a HAVING condition with `?` placeholders.
    pub fn having_template<T: ToSql + Send + Sync + 'static>(self, sql: &str, values: Vec<T>) -> Self {
        self.having(Expr::template_values(sql, values))
    }

    /// Add ORDER BY clause.
    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_clauses.push(clause.to_string());
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(&format!("{} ASC", column))
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(&format!("{} DESC", column))
    }

    // ==================== Pagination ====================

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    /// The offset saturates at `u64::MAX`.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1).saturating_mul(size));
        self
    }

    // ==================== Output ====================

    /// Append a trailing fragment, e.g. `FOR UPDATE` or a comment.
    pub fn suffix<F: Fragment + 'static>(mut self, fragment: F) -> Self {
        self.suffixes.push(nested(fragment));
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

    /// Replace the render settings wholesale.
    pub fn render_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    fn build_neutral(&self) -> WeaveResult<BuiltQuery> {
        let mut w = SqlWriter::new();
        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }

        if self.columns.is_empty() {
            w.push_char('*');
        }
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            col.write_to(&mut w)?;
        }

        match &self.from {
            Some(FromClause::Table(table)) => {
                w.push(" FROM ").push(table);
            }
            Some(FromClause::Lateral(part)) => {
                w.push(" FROM ");
                w.push_fragment(part)?;
            }
            None => {}
        }

        if !self.joins.is_empty() {
            w.push_char(' ');
            w.push_joined(&self.joins, " ")?;
        }

        if !self.where_group.is_empty() {
            w.push(" WHERE ");
            self.where_group.write_to(&mut w)?;
        }

        if !self.group_by.is_empty() {
            w.push(" GROUP BY ").push(&self.group_by.join(", "));
        }

        if !self.having_group.is_empty() {
            w.push(" HAVING ");
            self.having_group.write_to(&mut w)?;
        }

        if !self.order_clauses.is_empty() {
            w.push(" ORDER BY ").push(&self.order_clauses.join(", "));
        }
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {}", offset));
        }

        if !self.suffixes.is_empty() {
            w.push_char(' ');
            w.push_joined(&self.suffixes, " ")?;
        }

        Ok(w.finish())
    }
}

impl Fragment for SelectQb {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        self.config.finish(self.build_neutral()?)
    }

    fn neutral(&self) -> Option<Arc<dyn Fragment>> {
        Some(Arc::new(
            self.clone().placeholder_format(PlaceholderFormat::Question),
        ))
    }
}

impl From<SelectQb> for Part {
    fn from(select: SelectQb) -> Self {
        Part::fragment(select)
    }
}
