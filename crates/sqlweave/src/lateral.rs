//! LATERAL subqueries in FROM and JOIN position.

use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{BuiltQuery, Fragment, SqlWriter, nested};
use std::sync::Arc;

/// Join keyword in front of a lateral subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// `[<join>] LATERAL (<source>) AS <alias> [ON <cond>]`
///
/// The source is stored in neutral form. Its values come before the ON
/// condition's values, matching their position in the text.
#[derive(Clone, Debug)]
pub struct LateralPart {
    join: Option<JoinKind>,
    source: Arc<dyn Fragment>,
    alias: String,
    on: Option<Arc<dyn Fragment>>,
}

impl LateralPart {
    /// `LATERAL (<source>) AS <alias>` for the FROM clause.
    pub fn from<F: Fragment + 'static>(source: F, alias: impl Into<String>) -> Self {
        Self {
            join: None,
            source: nested(source),
            alias: alias.into(),
            on: None,
        }
    }

    /// `<kind> LATERAL (<source>) AS <alias> ON <on>`.
    ///
    /// A CROSS JOIN never renders its ON condition.
    pub fn join<F, C>(kind: JoinKind, source: F, alias: impl Into<String>, on: C) -> Self
    where
        F: Fragment + 'static,
        C: Fragment + 'static,
    {
        let on = match kind {
            JoinKind::Cross => None,
            JoinKind::Inner | JoinKind::Left => Some(nested(on)),
        };
        Self {
            join: Some(kind),
            source: nested(source),
            alias: alias.into(),
            on,
        }
    }

    /// `CROSS JOIN LATERAL (<source>) AS <alias>`.
    pub fn cross_join<F: Fragment + 'static>(source: F, alias: impl Into<String>) -> Self {
        Self {
            join: Some(JoinKind::Cross),
            source: nested(source),
            alias: alias.into(),
            on: None,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn join_kind(&self) -> Option<JoinKind> {
        self.join
    }
}

impl Fragment for LateralPart {
    fn render(&self) -> WeaveResult<BuiltQuery> {
        let mut w = SqlWriter::new();
        if let Some(kind) = self.join {
            w.push(kind.as_sql()).push_char(' ');
        }
        w.push("LATERAL (");
        w.push_fragment(self.source.as_ref())
            .map_err(|err| WeaveError::lateral(&self.alias, err))?;
        w.push(") AS ").push(&self.alias);

        if let Some(on) = &self.on {
            w.push(" ON ");
            w.push_fragment(on.as_ref())?;
        }
        Ok(w.finish())
    }
}
