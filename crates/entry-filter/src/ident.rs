//! SQL identifier validation for configured tables and resolved columns.
//!
//! Filters carry user-supplied *values*, never user-supplied identifiers, but
//! the table and column names that end up in the generated SQL come from
//! configuration and resolvers. Every one of them goes through [`Ident`].
//!
//! - Unquoted parts: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts: any characters except NUL, `"` escaped as `""`

use crate::error::{FilterError, FilterResult};

/// One dot-separated part of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A validated, possibly qualified SQL identifier (`entries.title`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse `table`, `table.column`, `"Quoted"."Name"` and mixtures.
    pub fn parse(s: &str) -> FilterResult<Self> {
        if s.is_empty() {
            return Err(FilterError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(FilterError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut rest = s;
        loop {
            let (part, tail) = if let Some(quoted) = rest.strip_prefix('"') {
                parse_quoted(quoted)?
            } else {
                parse_unquoted(rest)?
            };
            parts.push(part);

            match tail.strip_prefix('.') {
                Some("") => return Err(FilterError::validation("Trailing '.' in identifier")),
                Some(next) => rest = next,
                None if tail.is_empty() => break,
                None => {
                    return Err(FilterError::validation(format!(
                        "Expected '.' between identifier parts in '{s}'"
                    )));
                }
            }
        }

        Ok(Self { parts })
    }

    /// `table.column`, each side validated.
    pub fn qualified(table: &str, column: &str) -> FilterResult<Self> {
        let mut ident = Self::parse(table)?;
        ident.parts.extend(Self::parse(column)?.parts);
        Ok(ident)
    }

    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
        out
    }
}

fn parse_quoted(s: &str) -> FilterResult<(IdentPart, &str)> {
    let mut name = String::new();
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            name.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            name.push('"');
            continue;
        }
        if name.is_empty() {
            return Err(FilterError::validation("Empty quoted identifier"));
        }
        return Ok((IdentPart::Quoted(name), &s[i + 1..]));
    }
    Err(FilterError::validation("Unclosed quoted identifier"))
}

fn parse_unquoted(s: &str) -> FilterResult<(IdentPart, &str)> {
    let end = s.find('.').unwrap_or(s.len());
    let name = &s[..end];
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(FilterError::validation("Empty identifier segment")),
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(FilterError::validation(format!(
                "Invalid identifier start character: '{c}'"
            )));
        }
    }
    if let Some(c) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(FilterError::validation(format!(
            "Invalid character in identifier: '{c}'"
        )));
    }
    Ok((IdentPart::Unquoted(name.to_string()), &s[end..]))
}
