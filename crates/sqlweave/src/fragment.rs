//! The render contract shared by every builder and fragment.

use crate::error::WeaveResult;
use crate::param::Param;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// The result of rendering a fragment: SQL text plus its bound values.
#[derive(Debug, Clone, Default)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Param>,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: Vec<Param>) -> Self {
        Self { sql, params }
    }

    /// Get parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Anything that renders to SQL text plus ordered bound values.
///
/// `render` is a pure function of the fragment's state. The values it returns
/// line up one-to-one, left to right, with the placeholders in the text.
pub trait Fragment: fmt::Debug + Send + Sync {
    /// Render the fragment.
    fn render(&self) -> WeaveResult<BuiltQuery>;

    /// A copy of this fragment that renders with neutral `?` markers.
    ///
    /// Builders that own a placeholder format return a Question-format copy so
    /// that only the outermost render numbers placeholders. Fragments without a
    /// format return `None` and are embedded as they are.
    fn neutral(&self) -> Option<Arc<dyn Fragment>> {
        None
    }

    /// Render, panicking on failure.
    ///
    /// Meant for statements already known to be valid, such as test fixtures.
    fn must_render(&self) -> BuiltQuery {
        match self.render() {
            Ok(built) => built,
            Err(err) => panic!("failed to render SQL fragment: {err}"),
        }
    }
}

impl<F: Fragment + ?Sized> Fragment for Arc<F> {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        (**self).render()
    }

    fn neutral(&self) -> Option<Arc<dyn Fragment>> {
        (**self).neutral()
    }
}

/// Prepare a fragment for embedding inside another one.
pub fn nested<F: Fragment + 'static>(fragment: F) -> Arc<dyn Fragment> {
    match fragment.neutral() {
        Some(neutral) => neutral,
        None => Arc::new(fragment),
    }
}

/// Accumulates SQL text and bound values while a fragment renders itself.
///
/// Children are rendered depth-first with `?`; the first failure aborts the
/// render and the partial buffer is dropped.
#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    sql: String,
    params: Vec<Param>,
}

impl SqlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub(crate) fn push_char(&mut self, ch: char) -> &mut Self {
        self.sql.push(ch);
        self
    }

    /// Write one placeholder bound to `param`.
    pub(crate) fn push_bind(&mut self, param: Param) -> &mut Self {
        self.sql.push('?');
        self.params.push(param);
        self
    }

    /// Record values whose markers were already written as text.
    pub(crate) fn append_params(&mut self, params: impl IntoIterator<Item = Param>) -> &mut Self {
        self.params.extend(params);
        self
    }

    pub(crate) fn push_fragment(&mut self, fragment: &dyn Fragment) -> WeaveResult<&mut Self> {
        let BuiltQuery { sql, params } = fragment.render()?;
        self.sql.push_str(&sql);
        self.params.extend(params);
        Ok(self)
    }

    /// Write `fragments` separated by `sep`.
    pub(crate) fn push_joined(
        &mut self,
        fragments: &[Arc<dyn Fragment>],
        sep: &str,
    ) -> WeaveResult<&mut Self> {
        for (i, fragment) in fragments.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            self.push_fragment(fragment.as_ref())?;
        }
        Ok(self)
    }

    pub(crate) fn finish(self) -> BuiltQuery {
        BuiltQuery::new(self.sql, self.params)
    }
}

/// A value that is either inlined as SQL or bound as a placeholder.
///
/// The three cases are picked explicitly at the call site:
///
/// ```ignore
/// Part::fragment(Expr::raw("price * 2"));   // inlined SQL
/// Part::value(10);                          // `?` bound to 10
/// Part::null();                             // `?` bound to NULL
/// ```
///
/// `&str` and `String` convert to raw SQL, builders convert to nested
/// fragments, and [`Param`] converts to a bound value.
#[derive(Clone, Debug)]
pub enum Part {
    /// Nested fragment, inlined as SQL text.
    Fragment(Arc<dyn Fragment>),
    /// Bound value.
    Value(Param),
    /// Bound SQL NULL.
    Null,
}

impl Part {
    /// Inline a fragment, forcing it to neutral placeholders first.
    pub fn fragment<F: Fragment + 'static>(fragment: F) -> Self {
        Part::Fragment(nested(fragment))
    }

    /// Bind a value.
    pub fn value<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Part::Value(Param::new(value))
    }

    /// Bind an explicit NULL.
    pub fn null() -> Self {
        Part::Null
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> WeaveResult<()> {
        match self {
            Part::Fragment(f) => {
                w.push_fragment(f.as_ref())?;
            }
            Part::Value(p) => {
                w.push_bind(p.clone());
            }
            Part::Null => {
                w.push_bind(Param::null());
            }
        }
        Ok(())
    }
}

impl Fragment for Part {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        let mut w = SqlWriter::new();
        self.write_to(&mut w)?;
        Ok(w.finish())
    }
}

impl From<Param> for Part {
    fn from(param: Param) -> Self {
        Part::Value(param)
    }
}

impl From<&str> for Part {
    fn from(sql: &str) -> Self {
        Part::fragment(crate::expr::Expr::raw(sql))
    }
}

impl From<String> for Part {
    fn from(sql: String) -> Self {
        Part::fragment(crate::expr::Expr::raw(sql))
    }
}

impl From<Arc<dyn Fragment>> for Part {
    fn from(fragment: Arc<dyn Fragment>) -> Self {
        Part::fragment(fragment)
    }
}

/// `(<inner>) AS <alias>`, e.g. a CASE used as a select column.
#[derive(Clone, Debug)]
pub struct Aliased {
    inner: Part,
    alias: String,
}

impl Aliased {
    pub fn new(inner: impl Into<Part>, alias: impl Into<String>) -> Self {
        Self {
            inner: inner.into(),
            alias: alias.into(),
        }
    }
}

impl Fragment for Aliased {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        let mut w = SqlWriter::new();
        w.push_char('(');
        self.inner.write_to(&mut w)?;
        w.push(") AS ").push(&self.alias);
        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::placeholder::PlaceholderFormat;
    use crate::select::SelectQb;

    #[test]
    fn part_variants_render_distinctly() {
        let raw = Part::fragment(Expr::raw("price * 2")).must_render();
        assert_eq!(raw.sql, "price * 2");
        assert!(raw.params.is_empty());

        let value = Part::value(10i32).must_render();
        assert_eq!(value.sql, "?");
        assert_eq!(format!("{:?}", value.params), "[10]");

        let null = Part::null().must_render();
        assert_eq!(null.sql, "?");
        assert_eq!(format!("{:?}", null.params), "[NULL]");
    }

    #[test]
    fn nested_forces_neutral_placeholders() {
        let sel = SelectQb::new("t")
            .gt("c", 1i32)
            .placeholder_format(PlaceholderFormat::Dollar);
        assert_eq!(sel.must_render().sql, "SELECT * FROM t WHERE c > $1");

        let embedded = nested(sel);
        assert_eq!(embedded.must_render().sql, "SELECT * FROM t WHERE c > ?");
    }

    #[test]
    fn nested_keeps_raw_fragments() {
        let embedded = nested(Expr::raw("generate_series(1,3)"));
        assert_eq!(embedded.must_render().sql, "generate_series(1,3)");
    }

    #[test]
    fn aliased_wraps_in_parens() {
        let built = Aliased::new(Part::value(1i32), "one").must_render();
        assert_eq!(built.sql, "(?) AS one");
        assert_eq!(built.params.len(), 1);
    }

    #[test]
    #[should_panic(expected = "failed to render SQL fragment")]
    fn must_render_panics_on_error() {
        crate::union::UnionQb::new().must_render();
    }
}
