//! Checked SQL names for the places where builders write identifiers
//! themselves, such as CTE names and CTE column lists.
//!
//! - Bare names must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted names (`"Monthly Sales"`) allow anything but NUL; `"` is escaped as `""`
//!
//! Names are stored as given and checked when the owning statement renders.

use crate::error::{WeaveError, WeaveResult};

/// A single, validated SQL name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    /// Bare name written as is.
    Bare(String),
    /// Name written inside double quotes.
    Quoted(String),
}

impl Ident {
    /// Parse a bare (`org_tree`) or quoted (`"Org Tree"`) name.
    pub fn parse(s: &str) -> WeaveResult<Self> {
        if s.is_empty() {
            return Err(WeaveError::validation("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(WeaveError::validation(
                "identifier cannot contain NUL character",
            ));
        }

        if let Some(body) = s.strip_prefix('"') {
            return Self::parse_quoted(body);
        }

        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            Some(c) => {
                return Err(WeaveError::validation(format!(
                    "invalid identifier start character '{c}' in '{s}'"
                )));
            }
            None => return Err(WeaveError::validation("identifier cannot be empty")),
        }
        if let Some(c) = chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric())) {
            return Err(WeaveError::validation(format!(
                "invalid character '{c}' in identifier '{s}'"
            )));
        }
        Ok(Ident::Bare(s.to_string()))
    }

    fn parse_quoted(body: &str) -> WeaveResult<Self> {
        let mut name = String::new();
        let mut chars = body.chars().peekable();
        loop {
            match chars.next() {
                Some('"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    name.push('"');
                }
                Some('"') => break,
                Some(c) => name.push(c),
                None => return Err(WeaveError::validation("unclosed quoted identifier")),
            }
        }
        if let Some(c) = chars.next() {
            return Err(WeaveError::validation(format!(
                "unexpected '{c}' after quoted identifier"
            )));
        }
        if name.is_empty() {
            return Err(WeaveError::validation("empty quoted identifier"));
        }
        Ok(Ident::Quoted(name))
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        match self {
            Ident::Bare(s) => out.push_str(s),
            Ident::Quoted(s) => {
                out.push('"');
                for ch in s.chars() {
                    if ch == '"' {
                        out.push('"');
                    }
                    out.push(ch);
                }
                out.push('"');
            }
        }
    }
}
