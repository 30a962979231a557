//! # sqlweave
//!
//! Composable SQL fragments for Postgres-style drivers.
//!
//! ## Features
//!
//! - **One render contract**: every builder and fragment renders to SQL text plus ordered bound values
//! - **Placeholders numbered once**: children render with `?`; only the outermost render rewrites to `$n`, `:n` or `@pn`
//! - **Value semantics**: builders are cheap to clone, and refining a clone never touches the original
//! - **CASE, UNION and LATERAL**: the pieces plain query builders usually lack, embeddable anywhere
//! - **Errors at render time**: builders never fail while being assembled
//!
//! ## Example
//!
//! ```ignore
//! use sqlweave::{Expr, Part, PlaceholderFormat, case, select, union};
//!
//! let tier = case()
//!     .when(Expr::gt("o.total", 1000), Part::value("gold"))
//!     .else_(Part::value("standard"));
//!
//! let recent = select(["o.total"])
//!     .from("orders o")
//!     .raw("o.customer_id = c.id")
//!     .order_by("o.created_at DESC")
//!     .limit(1);
//!
//! let q = union([
//!         select(["c.id"])
//!             .column_as(tier, "tier")
//!             .from("customers c")
//!             .left_join_lateral(recent, "o", Expr::raw("TRUE"))
//!             .eq("c.region", "eu"),
//!         select(["id", "'archived'"]).from("old_customers"),
//!     ])
//!     .placeholder_format(PlaceholderFormat::Dollar);
//!
//! let built = q.render()?;
//! client.query(&built.sql, &built.params_ref()).await?;
//! ```

pub mod case;
pub mod cte;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod ident;
pub mod lateral;
pub mod param;
pub mod placeholder;
pub mod select;
pub mod statement;
pub mod union;

pub use case::CaseQb;
pub use cte::WithQb;
pub use error::{WeaveError, WeaveResult};
pub use expr::{Expr, ExprGroup};
pub use fragment::{Aliased, BuiltQuery, Fragment, Part, nested};
pub use ident::Ident;
pub use lateral::{JoinKind, LateralPart};
pub use param::Param;
pub use placeholder::{PlaceholderFormat, RenderConfig, compact_sql};
pub use select::SelectQb;
pub use statement::StatementBuilder;
pub use union::{UnionOp, UnionQb};

use tokio_postgres::types::ToSql;

/// Create a SELECT of the given columns. Set the source with `.from(...)`.
///
/// # Example
/// ```ignore
/// let q = sqlweave::select(["id", "name"]).from("users").eq("id", 1);
/// ```
pub fn select<I, S>(columns: I) -> SelectQb
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SelectQb::empty().columns(columns)
}

/// `(<a>) UNION (<b>) ...`
pub fn union<F, I>(parts: I) -> UnionQb
where
    F: Fragment + 'static,
    I: IntoIterator<Item = F>,
{
    UnionQb::from_parts(UnionOp::Distinct, parts)
}

/// `(<a>) UNION ALL (<b>) ...`
pub fn union_all<F, I>(parts: I) -> UnionQb
where
    F: Fragment + 'static,
    I: IntoIterator<Item = F>,
{
    UnionQb::from_parts(UnionOp::All, parts)
}

/// Searched CASE: `CASE WHEN ... END`.
pub fn case() -> CaseQb {
    CaseQb::new()
}

/// Simple CASE: `CASE <operand> WHEN ... END`.
pub fn case_of(operand: impl Into<Part>) -> CaseQb {
    CaseQb::with_operand(operand)
}

/// Start a WITH clause with `<name> AS (<query>)`.
pub fn with<F: Fragment + 'static>(name: &str, query: F) -> WithQb {
    WithQb::new().with(name, query)
}

/// A raw SQL fragment with `?` placeholders.
///
/// # Example
/// ```ignore
/// let cond = sqlweave::expr("created_at > NOW() - ? * INTERVAL '1 day'", vec![7]);
/// ```
pub fn expr<T: ToSql + Send + Sync + 'static>(sql: &str, values: Vec<T>) -> Expr {
    Expr::template_values(sql, values)
}
