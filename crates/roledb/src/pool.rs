//! Connection pool construction for a role.

use crate::config::RoleConfig;
use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

/// Create the pool backing one role.
///
/// Uses `NoTls`. A role with a `schema` gets it as the session `search_path`.
pub fn create_role_pool(config: &RoleConfig) -> DbResult<Pool> {
    if config.max_size == 0 {
        return Err(DbError::configuration("max_size must be at least 1"));
    }

    let mut pg_config: tokio_postgres::Config = config
        .url
        .parse()
        .map_err(|e: tokio_postgres::Error| DbError::configuration(e.to_string()))?;

    if let Some(schema) = config.schema.as_deref() {
        if !crate::record::is_snake_case_ident(schema) {
            return Err(DbError::configuration(format!(
                "schema '{schema}' is not a lower_snake_case identifier"
            )));
        }
        pg_config.options(&format!("-c search_path={schema}"));
    }

    let mgr = Manager::from_config(pg_config, NoTls, default_manager_config());
    let mut builder = Pool::builder(mgr).max_size(config.max_size);
    if let Some(timeout) = config.wait_timeout_duration() {
        builder = builder.wait_timeout(Some(timeout)).runtime(Runtime::Tokio1);
    }
    Ok(builder.build()?)
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
