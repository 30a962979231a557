//! Shared defaults for families of statements.
//!
//! A [`StatementBuilder`] carries render settings, and optionally WHERE
//! conditions, into every builder it creates. Like the builders themselves it
//! is a value: refining it returns a new one and leaves the original alone.
//!
//! ```ignore
//! use sqlweave::{PlaceholderFormat, StatementBuilder};
//!
//! let pg = StatementBuilder::new().placeholder_format(PlaceholderFormat::Dollar);
//! let tenant = pg.clone().where_template("tenant_id = ?", vec![tenant_id]);
//!
//! let q = tenant.select(["id", "name"]).from("users").eq("active", true);
//! // SELECT id, name FROM users WHERE tenant_id = $1 AND active = $2
//! ```

use crate::case::CaseQb;
use crate::cte::WithQb;
use crate::expr::{Expr, ExprGroup};
use crate::fragment::{Fragment, Part};
use crate::placeholder::{PlaceholderFormat, RenderConfig};
use crate::select::SelectQb;
use crate::union::{UnionOp, UnionQb};
use tokio_postgres::types::ToSql;

/// Factory for builders that share render settings and WHERE conditions.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct StatementBuilder {
    config: RenderConfig,
    where_group: ExprGroup,
}

impl StatementBuilder {
    /// Builders rendering with `?` and no shared conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from settings loaded elsewhere, e.g. an application config file.
    pub fn from_config(config: RenderConfig) -> Self {
        Self {
            config,
            where_group: ExprGroup::new(),
        }
    }

    /// Set the placeholder format of every builder created from here on.
    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.config.placeholder_format = format;
        self
    }

    /// Compact the output of every builder created from here on.
    pub fn compact(mut self) -> Self {
        self.config.compact = true;
        self
    }

    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Add a condition to every SELECT created from here on.
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_group.and_expr(expr);
        self
    }

    /// Add a condition with `?` placeholders to every SELECT created from here on.
    pub fn where_template<T: ToSql + Send + Sync + 'static>(self, sql: &str, values: Vec<T>) -> Self {
        self.and_where(Expr::template_values(sql, values))
    }

    /// `SELECT <columns>`, with the shared conditions already in its WHERE clause.
    pub fn select<I, S>(&self, columns: I) -> SelectQb
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_group.exprs().iter().cloned().fold(
            SelectQb::empty().columns(columns).render_config(self.config),
            SelectQb::and_where,
        )
    }

    /// UNION (distinct) of `parts`.
    pub fn union<F, I>(&self, parts: I) -> UnionQb
    where
        F: Fragment + 'static,
        I: IntoIterator<Item = F>,
    {
        self.configure_union(UnionQb::from_parts(UnionOp::Distinct, parts))
    }

    /// UNION ALL of `parts`.
    pub fn union_all<F, I>(&self, parts: I) -> UnionQb
    where
        F: Fragment + 'static,
        I: IntoIterator<Item = F>,
    {
        self.configure_union(UnionQb::from_parts(UnionOp::All, parts))
    }

    fn configure_union(&self, union: UnionQb) -> UnionQb {
        let union = union.placeholder_format(self.config.placeholder_format);
        if self.config.compact {
            union.compact()
        } else {
            union
        }
    }

    /// Searched CASE.
    pub fn case(&self) -> CaseQb {
        CaseQb::new().placeholder_format(self.config.placeholder_format)
    }

    /// Simple CASE over `operand`.
    pub fn case_of(&self, operand: impl Into<Part>) -> CaseQb {
        CaseQb::with_operand(operand).placeholder_format(self.config.placeholder_format)
    }

    /// WITH clause starting with `<name> AS (<query>)`.
    pub fn with<F: Fragment + 'static>(&self, name: &str, query: F) -> WithQb {
        let with = WithQb::new()
            .with(name, query)
            .placeholder_format(self.config.placeholder_format);
        if self.config.compact {
            with.compact()
        } else {
            with
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeaveError;

    #[test]
    fn shared_where_comes_first() {
        let built = StatementBuilder::new()
            .where_template("x = ?", vec![1i32])
            .select(["test"])
            .where_template("y = ?", vec![2i32])
            .must_render();
        assert_eq!(built.sql, "SELECT test WHERE x = ? AND y = ?");
        assert_eq!(format!("{:?}", built.params), "[1, 2]");
    }

    #[test]
    fn format_applies_to_created_builders() {
        let pg = StatementBuilder::new().placeholder_format(PlaceholderFormat::Dollar);

        let sel = pg.select(["id"]).from("t").eq("a", 1i32).eq("b", 2i32);
        assert_eq!(sel.must_render().sql, "SELECT id FROM t WHERE a = $1 AND b = $2");

        let union = pg.union_all([
            pg.select(["id"]).from("a").gt("x", 1i32),
            pg.select(["id"]).from("b").gt("y", 2i32),
        ]);
        assert_eq!(
            union.must_render().sql,
            "(SELECT id FROM a WHERE x > $1) UNION ALL (SELECT id FROM b WHERE y > $2)"
        );

        let case = pg.case_of("status").when(Part::value(1i32), "'on'").else_("'off'");
        assert_eq!(case.must_render().sql, "CASE status WHEN $1 THEN 'on' ELSE 'off' END");
    }

    #[test]
    fn refining_leaves_original_alone() {
        let base = StatementBuilder::new().placeholder_format(PlaceholderFormat::Colon);
        let scoped = base.clone().where_template("tenant_id = ?", vec![7i64]);

        assert_eq!(base.select(["id"]).from("t").must_render().sql, "SELECT id FROM t");
        assert_eq!(
            scoped.select(["id"]).from("t").must_render().sql,
            "SELECT id FROM t WHERE tenant_id = :1"
        );
    }

    #[test]
    fn from_config_reads_serialized_settings() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"placeholder_format":"at","compact":true}"#).unwrap();
        let sb = StatementBuilder::from_config(config);
        assert_eq!(sb.config().placeholder_format, PlaceholderFormat::AtP);

        let built = sb
            .with("w", sb.select(["1 AS n"]))
            .query(sb.select(["n"]).from("w").eq("n", 1i32))
            .must_render();
        assert_eq!(built.sql, "WITH w AS (SELECT 1 AS n) SELECT n FROM w WHERE n = @p1");
    }

    #[test]
    fn empty_union_from_builder_fails() {
        let parts: Vec<SelectQb> = Vec::new();
        let err = StatementBuilder::new().union(parts).render().unwrap_err();
        assert!(matches!(err, WeaveError::EmptyUnion));
    }
}
