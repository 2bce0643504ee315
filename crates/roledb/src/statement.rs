//! Parameterized statement assembly.
//!
//! Callers write `?` placeholders; the builder renders them as Postgres `$1, $2, ...`
//! in text order and refuses to produce a statement whose placeholder count does
//! not match its parameter count.
//!
//! Fragment text (conditions, ORDER BY, GROUP BY, HAVING, explicit columns, the
//! table reference) is inserted verbatim. It must be developer-authored: the builder
//! only keeps *values* out of the SQL text, it does not sanitize fragments.

use crate::error::{DbError, DbResult};
use crate::record::RecordDescriptor;
use crate::row::Flag;
use std::any::Any;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A bound parameter value.
pub type Param = Arc<dyn ToSql + Sync + Send>;

/// Wrap a value as a [`Param`].
///
/// `bool` and `Option<bool>` are bound as [`Flag`], so they match integer flag
/// columns as well as `BOOL` ones.
pub fn param<T>(value: T) -> Param
where
    T: ToSql + Sync + Send + 'static,
{
    let any: &dyn Any = &value;
    if let Some(flag) = any.downcast_ref::<bool>() {
        return Arc::new(Flag(*flag));
    }
    if let Some(flag) = any.downcast_ref::<Option<bool>>() {
        return Arc::new(flag.map(Flag));
    }
    Arc::new(value)
}

/// Build a `Vec<Param>` from a list of values.
///
/// ```ignore
/// let params = roledb::params![false, "2023-01-01 00:00:00"];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::param($value)),+]
    };
}

/// SQL text with `$n` placeholders plus its parameters, ready to execute.
#[derive(Clone)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    /// Render `?` placeholders in `sql` and check them against `params`.
    pub fn new(sql: &str, params: Vec<Param>) -> DbResult<Self> {
        let (rendered, placeholders) = render_placeholders(sql);
        if placeholders != params.len() {
            return Err(DbError::build(format!(
                "placeholders({placeholders}) != params({}) in: {sql}",
                params.len()
            )));
        }
        Ok(Self {
            sql: rendered,
            params,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish()
    }
}

/// Rewrite `?` into `$1..$n`, returning the new text and the placeholder count.
///
/// `?` inside single-quoted literals, double-quoted identifiers, and dollar-quoted
/// bodies is left alone. The jsonb `?`, `?|` and `?&` operators cannot be used.
pub(crate) fn render_placeholders(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0usize;
    let mut rest = sql;

    while let Some(c) = rest.chars().next() {
        match c {
            '?' => {
                count += 1;
                out.push('$');
                out.push_str(&count.to_string());
                rest = &rest[1..];
            }
            '\'' if is_escape_string_prefix(&out) => {
                let end = escape_string_end(rest);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            }
            '\'' | '"' => {
                // `''` / `""` escapes are just two adjacent quoted runs.
                let end = rest[1..].find(c).map(|i| i + 2).unwrap_or(rest.len());
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            }
            '$' => match dollar_tag(rest) {
                Some(tag) => {
                    let body = &rest[tag.len()..];
                    let end = body
                        .find(tag)
                        .map(|i| tag.len() + i + tag.len())
                        .unwrap_or(rest.len());
                    out.push_str(&rest[..end]);
                    rest = &rest[end..];
                }
                None => {
                    out.push('$');
                    rest = &rest[1..];
                }
            },
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    (out, count)
}

/// `out` ends with a standalone `E`/`e`, so the quote that follows opens an
/// escape string constant.
fn is_escape_string_prefix(out: &str) -> bool {
    let mut rev = out.chars().rev();
    matches!(rev.next(), Some('E' | 'e'))
        && !rev.next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Length of the `'...'` run at the start of `s`, honoring `\x` and `''` escapes.
fn escape_string_end(s: &str) -> usize {
    let mut chars = s.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\'' => {
                if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                    chars.next();
                } else {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    s.len()
}

/// `$tag$` or `$$` at the start of `s`.
fn dollar_tag(s: &str) -> Option<&str> {
    let inner = &s[1..];
    let len = inner
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit())))
        .map(|(i, _)| i)?;
    inner[len..].starts_with('$').then(|| &s[..len + 2])
}

/// Which columns a SELECT projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Every column the destination record maps, in declaration order.
    #[default]
    All,
    /// Caller-supplied column expressions, used verbatim.
    Columns(Vec<String>),
}

/// Structured SELECT inputs.
///
/// # Example
///
/// ```ignore
/// let spec = SelectSpec::new("tokens")
///     .condition("token_revoked = ?")
///     .bind(false)
///     .order_by("token_expiry ASC")
///     .limit(10);
/// ```
#[derive(Clone, Default)]
pub struct SelectSpec {
    table: String,
    projection: Projection,
    conditions: Vec<String>,
    params: Vec<Param>,
    order_by: String,
    group_by: String,
    having: String,
    limit: i64,
    offset: i64,
}

impl SelectSpec {
    /// Select from a table reference. Join expressions such as
    /// `"usersPass p, usersInfo i"` are accepted as-is.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Project every mapped column of the destination record (the default).
    pub fn all_columns(mut self) -> Self {
        self.projection = Projection::All;
        self
    }

    /// Project an explicit column list.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Projection::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a condition fragment; fragments are AND-joined in insertion order.
    pub fn condition(mut self, fragment: impl Into<String>) -> Self {
        self.conditions.push(fragment.into());
        self
    }

    /// Add several condition fragments.
    pub fn conditions<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions
            .extend(fragments.into_iter().map(Into::into));
        self
    }

    /// Bind the next placeholder value. Booleans bind as [`Flag`].
    pub fn bind<T>(mut self, value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.params.push(param(value));
        self
    }

    /// Append already-wrapped parameters.
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = clause.into();
        self
    }

    pub fn group_by(mut self, clause: impl Into<String>) -> Self {
        self.group_by = clause.into();
        self
    }

    pub fn having(mut self, clause: impl Into<String>) -> Self {
        self.having = clause.into();
        self
    }

    /// Maximum rows; `0` means no limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Rows to skip; only emitted together with a positive limit.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Assemble the SELECT. `descriptor` supplies the column list for
    /// [`Projection::All`].
    pub fn build(&self, descriptor: &RecordDescriptor) -> DbResult<Statement> {
        let table = self.table.trim();
        if table.is_empty() {
            return Err(DbError::build("table reference must not be empty"));
        }
        if self.limit < 0 || self.offset < 0 {
            return Err(DbError::build(format!(
                "limit({}) and offset({}) must not be negative",
                self.limit, self.offset
            )));
        }

        let columns = match &self.projection {
            Projection::All => descriptor.select_list(),
            Projection::Columns(cols) => {
                if cols.is_empty() {
                    return Err(DbError::build("explicit column list must not be empty"));
                }
                cols.join(", ")
            }
        };

        let mut sql = format!("SELECT {columns} FROM {table}");

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        push_clause(&mut sql, " GROUP BY ", &self.group_by);
        push_clause(&mut sql, " HAVING ", &self.having);
        push_clause(&mut sql, " ORDER BY ", &self.order_by);

        let mut params = self.params.clone();
        if self.limit > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Arc::new(self.limit));
            params.push(Arc::new(self.offset));
        }

        Statement::new(&sql, params)
    }
}

fn push_clause(sql: &mut String, keyword: &str, clause: &str) {
    let clause = clause.trim();
    if !clause.is_empty() {
        sql.push_str(keyword);
        sql.push_str(clause);
    }
}

impl std::fmt::Debug for SelectSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectSpec")
            .field("table", &self.table)
            .field("projection", &self.projection)
            .field("conditions", &self.conditions)
            .field("params", &self.params)
            .field("order_by", &self.order_by)
            .field("group_by", &self.group_by)
            .field("having", &self.having)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

/// Assemble `INSERT INTO table (cols) VALUES (...)`, adding
/// `RETURNING <key>` when the descriptor declares a generated key.
pub fn build_insert(
    table: &str,
    descriptor: &RecordDescriptor,
    values: Vec<Param>,
) -> DbResult<Statement> {
    let table = table.trim();
    if table.is_empty() {
        return Err(DbError::build("table reference must not be empty"));
    }

    let columns: Vec<&str> = descriptor.insert_columns().map(|c| c.name).collect();
    if columns.len() != values.len() {
        return Err(DbError::mapping(format!(
            "{}: {} insert columns but {} values",
            descriptor.type_name,
            columns.len(),
            values.len()
        )));
    }

    let mut sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES")
    } else {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        )
    };

    if let Some(key) = descriptor.generated_key {
        sql.push_str(" RETURNING ");
        sql.push_str(key);
    }

    Statement::new(&sql, values)
}
