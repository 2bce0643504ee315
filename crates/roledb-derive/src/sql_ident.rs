use heck::ToSnakeCase;
use proc_macro2::Span;
use syn::{Error, Result};

/// `[a-z_][a-z0-9_]*`
///
/// Mirrors `roledb::record::is_snake_case_ident`, which re-checks hand-written
/// descriptors at runtime; keep the two in sync.
pub(crate) fn is_snake_case_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Validate a column tag, suggesting the snake_case spelling on failure.
pub(crate) fn parse_column_name(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_snake_case_ident(s) {
        let suggestion = s.to_snake_case();
        let hint = if is_snake_case_ident(&suggestion) {
            format!("; did you mean \"{suggestion}\"?")
        } else {
            String::new()
        };
        return Err(Error::new(
            span,
            format!("{what} \"{s}\" must be a lower_snake_case SQL identifier{hint}"),
        ));
    }
    Ok(s.to_string())
}
