//! CASE expression builder.
//!
//! # Example
//! ```ignore
//! use sqlweave::{Part, case, select};
//!
//! let tier = case()
//!     .when("total > 1000", Part::value("gold"))
//!     .when("total > 100", Part::value("silver"))
//!     .else_(Part::null());
//!
//! let q = select(["id"]).column_as(tier, "tier").from("customers");
//! // SELECT id, (CASE WHEN total > 1000 THEN ? WHEN total > 100 THEN ? ELSE ? END) AS tier FROM customers
//! ```

use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{BuiltQuery, Fragment, Part, SqlWriter};
use crate::placeholder::{PlaceholderFormat, RenderConfig};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct WhenPart {
    when: Option<Part>,
    then: Option<Part>,
}

/// CASE expression builder.
///
/// WHEN and THEN can be given together with [`when`](Self::when) or one at a
/// time with [`when_cond`](Self::when_cond) followed by [`then`](Self::then).
/// An ELSE may be a fragment, a bound value or an explicit NULL; each is kept
/// as its own [`Part`] variant.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct CaseQb {
    operand: Option<Part>,
    when_parts: Vec<WhenPart>,
    else_part: Option<Part>,
    config: RenderConfig,
}

impl CaseQb {
    /// Searched CASE: `CASE WHEN <cond> THEN ... END`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simple CASE: `CASE <operand> WHEN <value> THEN ... END`.
    pub fn with_operand(operand: impl Into<Part>) -> Self {
        Self {
            operand: Some(operand.into()),
            ..Self::default()
        }
    }

    /// Add a `WHEN <when> THEN <then>` pair.
    ///
    /// Strings are SQL text; use [`Part::value`] to bind them instead.
    pub fn when(mut self, when: impl Into<Part>, then: impl Into<Part>) -> Self {
        self.when_parts.push(WhenPart {
            when: Some(when.into()),
            then: Some(then.into()),
        });
        self
    }

    /// Start a WHEN clause; its THEN comes from the next [`then`](Self::then).
    pub fn when_cond(mut self, when: impl Into<Part>) -> Self {
        self.when_parts.push(WhenPart {
            when: Some(when.into()),
            then: None,
        });
        self
    }

    /// Complete the pending WHEN clause.
    pub fn then(mut self, then: impl Into<Part>) -> Self {
        match self.when_parts.last_mut() {
            Some(part) if part.then.is_none() => part.then = Some(then.into()),
            _ => self.when_parts.push(WhenPart {
                when: None,
                then: Some(then.into()),
            }),
        }
        self
    }

    /// Set the ELSE branch.
    ///
    /// `.else_("unknown")` emits the SQL `unknown`, while
    /// `.else_(Part::value("unknown"))` binds the string.
    pub fn else_(mut self, part: impl Into<Part>) -> Self {
        self.else_part = Some(part.into());
        self
    }

    /// Set the placeholder format used when this CASE is rendered on its own.
    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.config.placeholder_format = format;
        self
    }

    fn build_neutral(&self) -> WeaveResult<BuiltQuery> {
        if self.when_parts.is_empty() {
            return Err(WeaveError::EmptyCase);
        }

        let mut w = SqlWriter::new();
        w.push("CASE ");
        if let Some(operand) = &self.operand {
            operand.write_to(&mut w)?;
            w.push_char(' ');
        }

        for (index, part) in self.when_parts.iter().enumerate() {
            let when = part
                .when
                .as_ref()
                .ok_or(WeaveError::ThenWithoutWhen { index })?;
            let then = part.then.as_ref().ok_or(WeaveError::MissingThen { index })?;

            w.push("WHEN ");
            when.write_to(&mut w)?;
            w.push(" THEN ");
            then.write_to(&mut w)?;
            w.push_char(' ');
        }

        if let Some(else_part) = &self.else_part {
            w.push("ELSE ");
            else_part.write_to(&mut w)?;
            w.push_char(' ');
        }

        w.push("END");
        Ok(w.finish())
    }
}

impl Fragment for CaseQb {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        self.config.finish(self.build_neutral()?)
    }

    fn neutral(&self) -> Option<Arc<dyn Fragment>> {
        Some(Arc::new(
            self.clone().placeholder_format(PlaceholderFormat::Question),
        ))
    }
}

impl From<CaseQb> for Part {
    fn from(case: CaseQb) -> Self {
        Part::fragment(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn params(built: &BuiltQuery) -> String {
        format!("{:?}", built.params)
    }

    #[test]
    fn searched_case_with_values() {
        let built = CaseQb::new()
            .when("x = 1", Part::value("one"))
            .when("x = 2", Part::value("two"))
            .must_render();
        assert_eq!(built.sql, "CASE WHEN x = 1 THEN ? WHEN x = 2 THEN ? END");
        assert_eq!(params(&built), r#"["one", "two"]"#);
    }

    #[test]
    fn simple_case_with_operand() {
        let built = CaseQb::with_operand("status")
            .when(Part::value(1i32), "'active'")
            .else_("'unknown'")
            .must_render();
        assert_eq!(
            built.sql,
            "CASE status WHEN ? THEN 'active' ELSE 'unknown' END"
        );
        assert_eq!(params(&built), "[1]");
    }

    #[test]
    fn omitted_else_has_no_keyword() {
        let built = CaseQb::new().when("a", "b").must_render();
        assert_eq!(built.sql, "CASE WHEN a THEN b END");
        assert!(built.params.is_empty());
    }

    #[test]
    fn else_value_adds_one_param() {
        let built = CaseQb::new()
            .when("a", "b")
            .else_(Part::value(42i64))
            .must_render();
        assert_eq!(built.sql, "CASE WHEN a THEN b ELSE ? END");
        assert_eq!(params(&built), "[42]");
    }

    #[test]
    fn else_null_binds_null() {
        let built = CaseQb::new()
            .when("a", Part::null())
            .else_(Part::null())
            .must_render();
        assert_eq!(built.sql, "CASE WHEN a THEN ? ELSE ? END");
        assert!(!built.sql.contains("NULL"));
        assert_eq!(params(&built), "[NULL, NULL]");
    }

    #[test]
    fn else_fragment_is_inlined() {
        let built = CaseQb::new()
            .when(Expr::gt("score", 90i32), "'A'")
            .else_(Expr::template_values("grade_for(?)", vec![7i32]))
            .must_render();
        assert_eq!(
            built.sql,
            "CASE WHEN score > ? THEN 'A' ELSE grade_for(?) END"
        );
        assert_eq!(params(&built), "[90, 7]");
    }

    #[test]
    fn strings_are_sql_unless_bound() {
        let inlined = CaseQb::new()
            .when("x > 0", "positive")
            .else_("unknown")
            .must_render();
        assert_eq!(inlined.sql, "CASE WHEN x > 0 THEN positive ELSE unknown END");
        assert!(inlined.params.is_empty());

        let bound = CaseQb::new()
            .when("x > 0", Part::value("positive"))
            .else_(Part::value("unknown"))
            .must_render();
        assert_eq!(bound.sql, "CASE WHEN x > 0 THEN ? ELSE ? END");
        assert_eq!(params(&bound), r#"["positive", "unknown"]"#);
    }

    #[test]
    fn step_api_matches_pair_api() {
        let stepped = CaseQb::new()
            .when_cond("a > 1")
            .then(Part::value(1i32))
            .must_render();
        let paired = CaseQb::new().when("a > 1", Part::value(1i32)).must_render();
        assert_eq!(stepped.sql, paired.sql);
    }

    #[test]
    fn empty_case_fails() {
        let err = CaseQb::new().else_("1").render().unwrap_err();
        assert!(matches!(err, WeaveError::EmptyCase));
    }

    #[test]
    fn when_without_then_fails() {
        let err = CaseQb::new()
            .when("a", "b")
            .when_cond("c")
            .render()
            .unwrap_err();
        assert!(matches!(err, WeaveError::MissingThen { index: 1 }));
    }

    #[test]
    fn then_without_when_fails() {
        let err = CaseQb::new()
            .when("a", "b")
            .then("c")
            .render()
            .unwrap_err();
        assert!(matches!(err, WeaveError::ThenWithoutWhen { index: 1 }));
    }

    #[test]
    fn standalone_dollar_format() {
        let built = CaseQb::new()
            .when(Expr::eq("kind", "a"), Part::value(1i32))
            .else_(Part::value(0i32))
            .placeholder_format(PlaceholderFormat::Dollar)
            .must_render();
        assert_eq!(built.sql, "CASE WHEN kind = $1 THEN $2 ELSE $3 END");
    }

    #[test]
    fn nested_case_in_then() {
        let inner = CaseQb::new()
            .when("b", Part::value(2i32))
            .placeholder_format(PlaceholderFormat::Dollar);
        let built = CaseQb::new()
            .when("a", inner)
            .else_(Part::value(3i32))
            .placeholder_format(PlaceholderFormat::Dollar)
            .must_render();
        assert_eq!(
            built.sql,
            "CASE WHEN a THEN CASE WHEN b THEN $1 END ELSE $2 END"
        );
    }
}
