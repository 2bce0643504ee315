//! The seam between the executor and a live connection.

use crate::error::DbResult;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Something that can run one parameterized statement.
///
/// Implemented for pooled connections; tests implement it with recording fakes.
pub trait Client: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;
}

// Statements go through the connection's prepared statement cache, so repeated
// call sites prepare once per connection.
impl Client for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        let stmt = self.prepare_cached(sql).await?;
        Ok(tokio_postgres::Client::query(&**self, &stmt, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        let stmt = self.prepare_cached(sql).await?;
        Ok(tokio_postgres::Client::execute(&**self, &stmt, params).await?)
    }
}
