//! Role -> connection pool registry.
//!
//! Built once at startup and immutable afterwards. Lookups of unregistered roles
//! fail with [`DbError::Configuration`]; there is no default role to fall back to.

use crate::client::Client;
use crate::config::RegistryConfig;
use crate::error::{DbError, DbResult};
use crate::pool::create_role_pool;
use crate::role::Role;
use deadpool_postgres::Pool;
use std::collections::HashMap;

/// Hands out a connection for a role.
pub trait RoleSource: Send + Sync {
    type Client: Client;

    /// Check out a connection for `role`.
    fn checkout(
        &self,
        role: &Role,
    ) -> impl std::future::Future<Output = DbResult<Self::Client>> + Send;
}

/// Maps each registered role to its pool.
#[derive(Clone)]
pub struct RoleRegistry {
    pools: HashMap<Role, Pool>,
}

impl RoleRegistry {
    pub fn builder() -> RoleRegistryBuilder {
        RoleRegistryBuilder::default()
    }

    /// Create one pool per configured role.
    pub fn from_config(config: &RegistryConfig) -> DbResult<Self> {
        let mut builder = Self::builder();
        for (name, role_config) in &config.roles {
            let pool = create_role_pool(role_config)
                .map_err(|e| DbError::configuration(format!("role '{name}': {e}")))?;
            builder = builder.register(Role::new(name.clone()), pool);
        }
        builder.build()
    }

    /// The pool for `role`.
    pub fn resolve(&self, role: &Role) -> DbResult<&Pool> {
        self.pools
            .get(role)
            .ok_or_else(|| DbError::configuration(format!("role '{role}' is not registered")))
    }

    /// Fail unless every role in `roles` is registered.
    ///
    /// Call at startup with the roles the process uses.
    pub fn require(&self, roles: &[Role]) -> DbResult<()> {
        let missing: Vec<&str> = roles
            .iter()
            .filter(|r| !self.pools.contains_key(*r))
            .map(Role::as_str)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DbError::configuration(format!(
                "roles not registered: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.pools.contains_key(role)
    }

    /// Registered roles, sorted.
    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.pools.keys().collect();
        roles.sort();
        roles
    }
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("roles", &self.roles())
            .finish()
    }
}

impl RoleSource for RoleRegistry {
    type Client = deadpool_postgres::Client;

    async fn checkout(&self, role: &Role) -> DbResult<Self::Client> {
        let pool = self.resolve(role)?;
        pool.get()
            .await
            .map_err(|e| DbError::connection(format!("role '{role}': {e}")))
    }
}

/// Collects role registrations. Registering a role twice is an error at
/// [`build`](RoleRegistryBuilder::build).
#[derive(Default)]
pub struct RoleRegistryBuilder {
    pools: HashMap<Role, Pool>,
    duplicates: Vec<Role>,
}

impl RoleRegistryBuilder {
    pub fn register(mut self, role: impl Into<Role>, pool: Pool) -> Self {
        let role = role.into();
        if self.pools.contains_key(&role) {
            self.duplicates.push(role);
        } else {
            self.pools.insert(role, pool);
        }
        self
    }

    pub fn build(self) -> DbResult<RoleRegistry> {
        if let Some(role) = self.duplicates.first() {
            return Err(DbError::configuration(format!(
                "role '{role}' registered more than once"
            )));
        }
        Ok(RoleRegistry { pools: self.pools })
    }
}
