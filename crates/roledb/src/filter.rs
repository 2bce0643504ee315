//! Denylist filter for the raw-SQL read path.
//!
//! This is a heuristic and not a parser. It rejects SQL that *looks* like it
//! modifies data or smuggles a second statement into a read. It will reject some
//! harmless queries (a `;` inside a string literal, a column named `update`) and it
//! cannot prove a query safe. The structured path via
//! [`SelectSpec`](crate::SelectSpec) is the safe one; the raw path exists for
//! queries the builder cannot express.

use crate::error::{DbError, DbResult};
use regex::Regex;
use serde::Deserialize;

/// Character sequences rejected anywhere in the text (case-insensitive).
pub const DEFAULT_SEQUENCES: &[&str] = &[";", "--", "/*", "*/"];

/// Keywords rejected as whole words (case-insensitive).
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "truncate", "create", "grant", "revoke",
    "merge", "copy", "call", "execute", "into", "pg_sleep",
];

/// Denylist configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub sequences: Vec<String>,
    pub keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sequences: DEFAULT_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A compiled denylist.
#[derive(Debug, Clone)]
pub struct SqlFilter {
    sequences: Vec<String>,
    keywords: Vec<(String, Regex)>,
}

impl Default for SqlFilter {
    fn default() -> Self {
        // The default keywords are plain words, so compilation cannot fail.
        Self::from_config(&FilterConfig::default()).unwrap_or_else(|_| Self::allow_all())
    }
}

impl SqlFilter {
    /// Compile a denylist. Blank entries are ignored.
    pub fn from_config(config: &FilterConfig) -> DbResult<Self> {
        let sequences = config
            .sequences
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let mut keywords = Vec::with_capacity(config.keywords.len());
        for kw in &config.keywords {
            let kw = kw.trim().to_lowercase();
            if kw.is_empty() {
                continue;
            }
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&kw))).map_err(|e| {
                DbError::configuration(format!("invalid filter keyword '{kw}': {e}"))
            })?;
            keywords.push((kw, re));
        }

        Ok(Self {
            sequences,
            keywords,
        })
    }

    /// A filter that lets everything through.
    pub fn allow_all() -> Self {
        Self {
            sequences: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Reject `sql` if it matches the denylist.
    ///
    /// Sequences are checked before keywords, each in configured order; the first
    /// hit is reported in [`DbError::UnsafeQuery`].
    pub fn check(&self, sql: &str) -> DbResult<()> {
        match self.first_match(sql) {
            Some(pattern) => Err(DbError::unsafe_query(pattern)),
            None => Ok(()),
        }
    }

    /// The first denylisted pattern found in `sql`, if any.
    pub fn first_match(&self, sql: &str) -> Option<&str> {
        let lowered = sql.to_lowercase();
        if let Some(seq) = self.sequences.iter().find(|s| lowered.contains(s.as_str())) {
            return Some(seq.as_str());
        }
        self.keywords
            .iter()
            .find(|(_, re)| re.is_match(sql))
            .map(|(kw, _)| kw.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty() && self.keywords.is_empty()
    }
}
