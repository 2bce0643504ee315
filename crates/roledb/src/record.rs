//! Record descriptors: the mapping between a Rust struct and table columns.
//!
//! A descriptor is built once per record type. `#[derive(Record)]` emits it as a
//! `static`, so the column map is never rebuilt per call.

use crate::error::{DbError, DbResult};
use crate::statement::Param;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};
use tokio_postgres::Row;

/// One mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name in the table.
    pub name: &'static str,
    /// Rust field name.
    pub field: &'static str,
    /// The store generates this column; it is never written by INSERT.
    pub generated: bool,
}

/// Column map for a record type, in field declaration order.
#[derive(Debug)]
pub struct RecordDescriptor {
    pub type_name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Column returned by `INSERT ... RETURNING`, if the table has one.
    pub generated_key: Option<&'static str>,
}

impl RecordDescriptor {
    /// All column names, declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Columns written by INSERT, declaration order.
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnDef> + '_ {
        self.columns.iter().filter(|c| !c.generated)
    }

    /// Comma-separated list of every mapped column.
    pub fn select_list(&self) -> String {
        self.column_names().collect::<Vec<_>>().join(", ")
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    /// Check the descriptor invariants.
    ///
    /// The derive enforces these at compile time; this covers hand-written impls.
    pub fn validate(&self) -> DbResult<()> {
        if self.columns.is_empty() {
            return Err(DbError::mapping(format!(
                "{}: record maps no columns",
                self.type_name
            )));
        }

        let mut seen = HashSet::new();
        for col in self.columns {
            if !is_snake_case_ident(col.name) {
                return Err(DbError::mapping(format!(
                    "{}.{}: column '{}' is not a lower_snake_case identifier",
                    self.type_name, col.field, col.name
                )));
            }
            if !seen.insert(col.name) {
                return Err(DbError::mapping(format!(
                    "{}.{}: column '{}' is mapped by more than one field",
                    self.type_name, col.field, col.name
                )));
            }
        }

        if let Some(key) = self.generated_key {
            if !is_snake_case_ident(key) {
                return Err(DbError::mapping(format!(
                    "{}: generated key '{key}' is not a lower_snake_case identifier",
                    self.type_name
                )));
            }
        }
        Ok(())
    }
}

/// `[a-z_][a-z0-9_]*`
///
/// Mirrored in `roledb-derive/src/sql_ident.rs`; keep the two in sync.
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

/// A struct that maps to and from table rows.
///
/// Usually derived:
///
/// ```ignore
/// use roledb::Record;
///
/// #[derive(Debug, Default, Record)]
/// #[db(generated_key = "token_id")]
/// struct NewToken {
///     #[db(column = "token_hash")]
///     hash: String,
///     #[db(column = "token_revoked")]
///     revoked: bool,
///     #[db(column = "token_expiry")]
///     expiry: String,
/// }
/// ```
pub trait Record: Sized {
    /// The column map for this type.
    fn descriptor() -> &'static RecordDescriptor;

    /// Build a record from a row.
    ///
    /// Row columns that are not mapped are ignored; mapped columns absent from
    /// the row leave the field at its default value.
    fn from_row(row: &Row) -> DbResult<Self>;

    /// Parameter values for INSERT, aligned with
    /// [`RecordDescriptor::insert_columns`].
    fn values(&self) -> Vec<Param>;
}

/// The column map of `R`.
pub fn describe<R: Record>() -> &'static RecordDescriptor {
    R::descriptor()
}

/// Validate `R`'s descriptor once per process.
pub(crate) fn ensure_valid<R: Record>() -> DbResult<&'static RecordDescriptor> {
    static VALIDATED: OnceLock<Mutex<HashSet<usize>>> = OnceLock::new();

    let descriptor = R::descriptor();
    let key = descriptor as *const RecordDescriptor as usize;
    let cache = VALIDATED.get_or_init(|| Mutex::new(HashSet::new()));

    if cache.lock().map(|set| set.contains(&key)).unwrap_or(false) {
        return Ok(descriptor);
    }

    descriptor.validate()?;
    if let Ok(mut set) = cache.lock() {
        set.insert(key);
    }
    Ok(descriptor)
}
