//! # roledb
//!
//! Role-scoped SQL access for PostgreSQL.
//!
//! ## Features
//!
//! - **Roles**: every call names a [`Role`]; the [`RoleRegistry`] maps it to a pool
//!   with that role's credentials. Unregistered roles are configuration errors.
//! - **Record mapping**: `#[derive(Record)]` maps struct fields to columns via
//!   `#[db(column = "...")]` tags, checked at compile time.
//! - **Structured path**: [`SelectSpec`] builds a parameterized SELECT from
//!   conditions, sort, grouping and pagination. Values never enter the SQL text.
//! - **Raw path**: [`Db::select_raw`] runs caller-written SQL after a denylist
//!   check ([`SqlFilter`]). The denylist is a heuristic, not a parser.
//!
//! ```ignore
//! use roledb::{Db, Record, Role, SelectSpec};
//!
//! #[derive(Debug, Default, Record)]
//! struct Token {
//!     #[db(column = "token_id", generated)]
//!     id: i64,
//!     #[db(column = "token_hash")]
//!     hash: String,
//!     #[db(column = "token_revoked")]
//!     revoked: bool,
//!     #[db(column = "token_expiry")]
//!     expiry: String,
//! }
//!
//! let mut tokens: Vec<Token> = Vec::new();
//! db.select(
//!     &Role::ADMIN,
//!     &SelectSpec::new("tokens")
//!         .condition("token_revoked = ?")
//!         .bind(false)
//!         .order_by("token_expiry ASC")
//!         .limit(10),
//!     &mut tokens,
//! )
//! .await?;
//! ```

// Lets `#[derive(Record)]` expand to `::roledb::...` inside this crate too.
extern crate self as roledb;

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod pool;
pub mod record;
pub mod registry;
pub mod role;
pub mod row;
pub mod statement;

pub use client::Client;
pub use config::{RegistryConfig, RoleConfig};
pub use error::{DbError, DbResult};
pub use executor::Db;
pub use filter::{FilterConfig, SqlFilter};
pub use pool::create_role_pool;
pub use record::{ColumnDef, Record, RecordDescriptor, describe};
pub use registry::{RoleRegistry, RoleRegistryBuilder, RoleSource};
pub use role::Role;
pub use row::Flag;
pub use statement::{Param, Projection, SelectSpec, Statement, build_insert, param};

pub use tokio_postgres::Row;
pub use tokio_postgres::types::ToSql;

#[cfg(feature = "derive")]
pub use roledb_derive::Record;
