//! The four data-access operations: insert, structured select, raw select, execute.
//!
//! Every operation is a single statement on a single checked-out connection. Build
//! and filter failures are reported before a connection is touched. Nothing is
//! retried.

use crate::client::Client;
use crate::config::RegistryConfig;
use crate::error::DbResult;
use crate::filter::SqlFilter;
use crate::record::{Record, ensure_valid};
use crate::registry::{RoleRegistry, RoleSource};
use crate::role::Role;
use crate::row::decode_generated_key;
use crate::statement::{Param, SelectSpec, Statement, build_insert};
use tokio_postgres::Row;

/// Role-scoped database access.
///
/// Holds no per-call state; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Db<S = RoleRegistry> {
    source: S,
    filter: SqlFilter,
}

impl Db<RoleRegistry> {
    /// Build the registry and the raw-path filter from one configuration.
    pub fn from_config(config: &RegistryConfig) -> DbResult<Self> {
        let registry = RoleRegistry::from_config(config)?;
        let filter = SqlFilter::from_config(&config.filter)?;
        Ok(Self::new(registry).with_filter(filter))
    }
}

impl<S: RoleSource> Db<S> {
    /// Wrap a role source; the raw path uses [`SqlFilter::default`].
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter: SqlFilter::default(),
        }
    }

    /// Replace the raw-path denylist.
    pub fn with_filter(mut self, filter: SqlFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn filter(&self) -> &SqlFilter {
        &self.filter
    }

    /// Insert `record` into `table` and return the generated key.
    ///
    /// Returns `0` when the record declares no generated key.
    pub async fn insert<R: Record>(&self, role: &Role, table: &str, record: &R) -> DbResult<i64> {
        let descriptor = ensure_valid::<R>()?;
        let stmt = build_insert(table, descriptor, record.values())?;

        let client = self.source.checkout(role).await?;
        log_statement(role, &stmt);

        if descriptor.generated_key.is_none() {
            client.execute(stmt.sql(), &stmt.params_ref()).await?;
            return Ok(0);
        }

        let rows = client.query(stmt.sql(), &stmt.params_ref()).await?;
        match rows.first() {
            Some(row) => decode_generated_key(row),
            None => Ok(0),
        }
    }

    /// Run a structured SELECT, replacing the contents of `dest` with the result.
    ///
    /// On error `dest` is left untouched.
    pub async fn select<R: Record>(
        &self,
        role: &Role,
        spec: &SelectSpec,
        dest: &mut Vec<R>,
    ) -> DbResult<()> {
        let descriptor = ensure_valid::<R>()?;
        let stmt = spec.build(descriptor)?;
        *dest = self.fetch(role, &stmt).await?;
        Ok(())
    }

    /// Structured SELECT returning the first row, if any.
    pub async fn select_one<R: Record>(&self, role: &Role, spec: &SelectSpec) -> DbResult<Option<R>> {
        let mut rows = Vec::new();
        self.select(role, &spec.clone().limit(1), &mut rows).await?;
        Ok(rows.into_iter().next())
    }

    /// Run caller-written SQL with `?` placeholders after the denylist check,
    /// replacing the contents of `dest` with the result.
    ///
    /// The denylist is a heuristic (see [`SqlFilter`]); prefer [`Db::select`].
    pub async fn select_raw<R: Record>(
        &self,
        role: &Role,
        sql: &str,
        params: &[Param],
        dest: &mut Vec<R>,
    ) -> DbResult<()> {
        if let Err(err) = self.filter.check(sql) {
            tracing::warn!(
                target: "roledb.sql",
                role = %role,
                error = %err,
                "raw query rejected"
            );
            return Err(err);
        }
        ensure_valid::<R>()?;
        let stmt = Statement::new(sql, params.to_vec())?;
        *dest = self.fetch(role, &stmt).await?;
        Ok(())
    }

    /// Run a mutating statement with `?` placeholders and return rows affected.
    ///
    /// No denylist is applied: this path is for trusted internal statements such
    /// as status updates.
    pub async fn execute(&self, role: &Role, sql: &str, params: &[Param]) -> DbResult<u64> {
        let stmt = Statement::new(sql, params.to_vec())?;
        let client = self.source.checkout(role).await?;
        log_statement(role, &stmt);
        client.execute(stmt.sql(), &stmt.params_ref()).await
    }

    async fn fetch<R: Record>(&self, role: &Role, stmt: &Statement) -> DbResult<Vec<R>> {
        let client = self.source.checkout(role).await?;
        log_statement(role, stmt);
        let rows = client.query(stmt.sql(), &stmt.params_ref()).await?;
        decode_rows(&rows)
    }
}

fn decode_rows<R: Record>(rows: &[Row]) -> DbResult<Vec<R>> {
    rows.iter().map(R::from_row).collect()
}

fn log_statement(role: &Role, stmt: &Statement) {
    tracing::debug!(
        target: "roledb.sql",
        role = %role,
        param_count = stmt.params().len(),
        sql = %stmt.sql(),
        "executing statement"
    );
}

#[cfg(test)]
mod tests;
