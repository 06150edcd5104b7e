//! Schema-less inference of SQL literals from dump field tokens.

use std::fmt;

/// Token the dump uses for SQL `NULL`.
pub const NULL_SENTINEL: &str = "\\N";

/// Separator between fields in headers and data lines.
pub const FIELD_DELIMITER: char = '|';

/// The SQL form inferred for a single field token.
///
/// Inference is total: every token maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlLiteral<'a> {
    /// The null sentinel or an empty token.
    Null,
    /// Digits optionally interleaved with `.`, `-` or `+`, emitted verbatim.
    Numeric(&'a str),
    /// Anything else, emitted inside single quotes.
    Text(&'a str),
}

/// How quoted text literals treat embedded single quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum QuoteStyle {
    /// Double embedded single quotes so the statement stays well formed.
    #[default]
    Escaped,
    /// Copy the token untouched, reproducing legacy scripts byte for byte.
    ///
    /// Tokens containing `'` yield invalid SQL in this mode.
    Verbatim,
}

/// Infer the SQL literal for one field token.
///
/// Checks run in a fixed order: the null sentinel or an empty token gives
/// [`SqlLiteral::Null`]; a token that is all ASCII digits once every `.`,
/// `-` and `+` is removed gives [`SqlLiteral::Numeric`]; everything else is
/// [`SqlLiteral::Text`]. Numeric tokens are not validated further, so
/// `1.2.3` and `--4` are emitted unquoted as they appear.
///
/// # Examples
/// ```
/// use claimdump_core::{SqlLiteral, infer_literal};
///
/// assert_eq!(infer_literal("\\N"), SqlLiteral::Null);
/// assert_eq!(infer_literal(""), SqlLiteral::Null);
/// assert_eq!(infer_literal("-12.5"), SqlLiteral::Numeric("-12.5"));
/// assert_eq!(infer_literal("Acme"), SqlLiteral::Text("Acme"));
/// ```
#[must_use]
pub fn infer_literal(token: &str) -> SqlLiteral<'_> {
    if token.is_empty() || token == NULL_SENTINEL {
        return SqlLiteral::Null;
    }
    if is_numeric(token) {
        SqlLiteral::Numeric(token)
    } else {
        SqlLiteral::Text(token)
    }
}

fn is_numeric(token: &str) -> bool {
    let mut digits = token
        .chars()
        .filter(|ch| !matches!(ch, '.' | '-' | '+'))
        .peekable();
    digits.peek().is_some() && digits.all(|ch| ch.is_ascii_digit())
}

impl SqlLiteral<'_> {
    /// Append the literal's SQL text to `out`.
    pub fn write_sql(&self, out: &mut String, style: QuoteStyle) {
        match (self, style) {
            (Self::Null, _) => out.push_str("NULL"),
            (Self::Numeric(token), _) => out.push_str(token),
            (Self::Text(token), QuoteStyle::Verbatim) => {
                out.push('\'');
                out.push_str(token);
                out.push('\'');
            }
            (Self::Text(token), QuoteStyle::Escaped) => {
                out.push('\'');
                for ch in token.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
                out.push('\'');
            }
        }
    }

    /// Render the literal as a standalone SQL string.
    #[must_use]
    pub fn to_sql(&self, style: QuoteStyle) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, style);
        out
    }
}

impl fmt::Display for SqlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql(QuoteStyle::default()))
    }
}

/// Append `name` as a double-quoted SQL identifier.
pub(crate) fn write_identifier(out: &mut String, name: &str, style: QuoteStyle) {
    out.push('"');
    match style {
        QuoteStyle::Verbatim => out.push_str(name),
        QuoteStyle::Escaped => {
            for ch in name.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
        }
    }
    out.push('"');
}

/// Format `name` as a double-quoted identifier with escaping.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_identifier(&mut out, name, QuoteStyle::Escaped);
    out
}

/// Split a data line into its field tokens.
pub fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(FIELD_DELIMITER)
}

/// Render the comma-separated literal list for `row`.
pub(crate) fn write_value_list(out: &mut String, row: &[SqlLiteral<'_>], style: QuoteStyle) {
    for (index, literal) in row.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        literal.write_sql(out, style);
    }
}

/// Render a comma-separated identifier list.
pub(crate) fn write_identifier_list<'a, I>(out: &mut String, names: I, style: QuoteStyle)
where
    I: IntoIterator<Item = &'a str>,
{
    for (index, name) in names.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        write_identifier(out, name, style);
    }
}
