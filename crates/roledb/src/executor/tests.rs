use super::*;
use crate::error::{DbError, DbResult};
use crate::record::{ColumnDef, RecordDescriptor};
use crate::row::{Flag, decode_column, decode_flag};
use crate::statement::param;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio_postgres::types::ToSql;

// ── Fakes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Query { sql: String, params: Vec<String> },
    Execute { sql: String, params: Vec<String> },
}

#[derive(Default)]
struct Log {
    checkouts: Vec<String>,
    calls: Vec<Call>,
}

#[derive(Clone)]
struct FakeSource {
    roles: HashSet<Role>,
    reachable: bool,
    affected: u64,
    log: Arc<Mutex<Log>>,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            roles: [Role::ADMIN, Role::DRIVER].into_iter().collect(),
            reachable: true,
            affected: 1,
            log: Arc::default(),
        }
    }

    fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    fn checkouts(&self) -> usize {
        self.log.lock().unwrap().checkouts.len()
    }

    fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().calls.clone()
    }
}

struct FakeClient {
    affected: u64,
    log: Arc<Mutex<Log>>,
}

fn describe_params(params: &[&(dyn ToSql + Sync)]) -> Vec<String> {
    params.iter().map(|p| format!("{p:?}")).collect()
}

impl Client for FakeClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        self.log.lock().unwrap().calls.push(Call::Query {
            sql: sql.to_string(),
            params: describe_params(params),
        });
        Ok(Vec::new())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        self.log.lock().unwrap().calls.push(Call::Execute {
            sql: sql.to_string(),
            params: describe_params(params),
        });
        Ok(self.affected)
    }
}

impl RoleSource for FakeSource {
    type Client = FakeClient;

    async fn checkout(&self, role: &Role) -> DbResult<FakeClient> {
        if !self.roles.contains(role) {
            return Err(DbError::configuration(format!("role '{role}' is not registered")));
        }
        if !self.reachable {
            return Err(DbError::connection("pool timed out"));
        }
        self.log.lock().unwrap().checkouts.push(role.to_string());
        Ok(FakeClient {
            affected: self.affected,
            log: self.log.clone(),
        })
    }
}

// ── Records (hand-written descriptors) ───────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
struct Token {
    token_id: i64,
    token_hash: String,
    token_revoked: bool,
    token_expiry: String,
}

impl Record for Token {
    fn descriptor() -> &'static RecordDescriptor {
        static DESCRIPTOR: RecordDescriptor = RecordDescriptor {
            type_name: "Token",
            columns: &[
                ColumnDef {
                    name: "token_id",
                    field: "token_id",
                    generated: true,
                },
                ColumnDef {
                    name: "token_hash",
                    field: "token_hash",
                    generated: false,
                },
                ColumnDef {
                    name: "token_revoked",
                    field: "token_revoked",
                    generated: false,
                },
                ColumnDef {
                    name: "token_expiry",
                    field: "token_expiry",
                    generated: false,
                },
            ],
            generated_key: Some("token_id"),
        };
        &DESCRIPTOR
    }

    fn from_row(row: &Row) -> DbResult<Self> {
        let mut token = Self::default();
        for (idx, column) in row.columns().iter().enumerate() {
            match column.name() {
                "token_id" => token.token_id = decode_column(row, idx)?,
                "token_hash" => token.token_hash = decode_column(row, idx)?,
                "token_revoked" => token.token_revoked = decode_flag(row, idx)?,
                "token_expiry" => token.token_expiry = decode_column(row, idx)?,
                _ => {}
            }
        }
        Ok(token)
    }

    fn values(&self) -> Vec<Param> {
        vec![
            param(self.token_hash.clone()),
            param(Flag(self.token_revoked)),
            param(self.token_expiry.clone()),
        ]
    }
}

#[derive(Debug, Default)]
struct StatusRow {
    car_id: String,
}

impl Record for StatusRow {
    fn descriptor() -> &'static RecordDescriptor {
        static DESCRIPTOR: RecordDescriptor = RecordDescriptor {
            type_name: "StatusRow",
            columns: &[ColumnDef {
                name: "car_id",
                field: "car_id",
                generated: false,
            }],
            generated_key: None,
        };
        &DESCRIPTOR
    }

    fn from_row(row: &Row) -> DbResult<Self> {
        let mut out = Self::default();
        if let Some(idx) = row.columns().iter().position(|c| c.name() == "car_id") {
            out.car_id = decode_column(row, idx)?;
        }
        Ok(out)
    }

    fn values(&self) -> Vec<Param> {
        vec![param(self.car_id.clone())]
    }
}

#[derive(Debug, Default)]
struct BadlyTagged;

impl Record for BadlyTagged {
    fn descriptor() -> &'static RecordDescriptor {
        static DESCRIPTOR: RecordDescriptor = RecordDescriptor {
            type_name: "BadlyTagged",
            columns: &[ColumnDef {
                name: "TokenHash",
                field: "hash",
                generated: false,
            }],
            generated_key: None,
        };
        &DESCRIPTOR
    }

    fn from_row(_: &Row) -> DbResult<Self> {
        Ok(Self)
    }

    fn values(&self) -> Vec<Param> {
        Vec::new()
    }
}

fn sample_token() -> Token {
    Token {
        token_id: 0,
        token_hash: "abc".into(),
        token_revoked: false,
        token_expiry: "2020-01-01".into(),
    }
}

// ── Structured select ────────────────────────────────────────────────────────

#[tokio::test]
async fn select_sends_rendered_sql_and_ordered_params() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());

    let spec = SelectSpec::new("tokens")
        .conditions(["token_revoked = ?", "token_expiry < ?"])
        .params(crate::params![false, "2023-01-01"])
        .limit(10);
    let mut tokens: Vec<Token> = Vec::new();
    db.select(&Role::ADMIN, &spec, &mut tokens).await.unwrap();

    assert_eq!(source.checkouts(), 1);
    assert_eq!(
        source.calls(),
        [Call::Query {
            sql: "SELECT token_id, token_hash, token_revoked, token_expiry FROM tokens \
                  WHERE token_revoked = $1 AND token_expiry < $2 LIMIT $3 OFFSET $4"
                .to_string(),
            params: vec![
                "Flag(false)".to_string(),
                "\"2023-01-01\"".to_string(),
                "10".to_string(),
                "0".to_string(),
            ],
        }]
    );
}

#[tokio::test]
async fn select_replaces_previous_contents() {
    let db = Db::new(FakeSource::new());
    let mut tokens = vec![sample_token(), sample_token()];

    db.select(&Role::ADMIN, &SelectSpec::new("tokens"), &mut tokens)
        .await
        .unwrap();

    assert!(tokens.is_empty());
}

#[tokio::test]
async fn build_error_happens_before_checkout() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());
    let spec = SelectSpec::new("tokens").condition("token_expiry BETWEEN ? AND ?");

    let mut tokens = vec![sample_token()];
    let err = db.select(&Role::ADMIN, &spec, &mut tokens).await.unwrap_err();

    assert!(err.is_build());
    assert_eq!(source.checkouts(), 0);
    assert_eq!(tokens.len(), 1);
}

#[tokio::test]
async fn connection_failure_leaves_destination_untouched() {
    let db = Db::new(FakeSource::unreachable());
    let mut tokens = vec![sample_token()];

    let err = db
        .select(&Role::ADMIN, &SelectSpec::new("tokens"), &mut tokens)
        .await
        .unwrap_err();

    assert!(err.is_connection());
    assert_eq!(tokens, [sample_token()]);
}

#[tokio::test]
async fn unregistered_role_is_configuration_error() {
    let db = Db::new(FakeSource::new());
    let mut rows: Vec<StatusRow> = Vec::new();

    let err = db
        .select(&Role::new("auditor"), &SelectSpec::new("car_isusing"), &mut rows)
        .await
        .unwrap_err();

    assert!(err.is_configuration());
}

#[tokio::test]
async fn mis_tagged_record_is_mapping_error() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());
    let mut rows: Vec<BadlyTagged> = Vec::new();

    let err = db
        .select(&Role::ADMIN, &SelectSpec::new("tokens"), &mut rows)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Mapping(_)));
    assert_eq!(source.checkouts(), 0);
}

#[tokio::test]
async fn select_one_forces_single_row_limit() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());

    let found: Option<Token> = db
        .select_one(
            &Role::ADMIN,
            &SelectSpec::new("tokens").condition("token_id = ?").bind(7_i64).limit(50),
        )
        .await
        .unwrap();

    assert!(found.is_none());
    let calls = source.calls();
    let Call::Query { sql, params } = &calls[0] else {
        panic!("expected a query");
    };
    assert!(sql.ends_with("WHERE token_id = $1 LIMIT $2 OFFSET $3"));
    assert_eq!(params[1], "1");
}

// ── Raw select ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn raw_select_with_denylisted_sql_never_reaches_connection() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());
    let mut tokens = vec![sample_token()];

    let err = db
        .select_raw(
            &Role::ADMIN,
            "SELECT * FROM tokens WHERE token_id = ?; DROP TABLE tokens",
            &crate::params!["1"],
            &mut tokens,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::UnsafeQuery { ref pattern } if pattern == ";"));
    assert_eq!(source.checkouts(), 0);
    assert!(source.calls().is_empty());
    assert_eq!(tokens.len(), 1);
}

#[tokio::test]
async fn raw_select_renders_placeholders() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());
    let mut tokens: Vec<Token> = Vec::new();

    db.select_raw(
        &Role::ADMIN,
        "SELECT token_id, token_hash, token_revoked, token_expiry FROM tokens \
         WHERE token_id = (?) AND token_expiry < (?)",
        &crate::params!["12345", "2023-01-01 00:00:00"],
        &mut tokens,
    )
    .await
    .unwrap();

    let calls = source.calls();
    let Call::Query { sql, params } = &calls[0] else {
        panic!("expected a query");
    };
    assert!(sql.ends_with("WHERE token_id = ($1) AND token_expiry < ($2)"));
    assert_eq!(params.len(), 2);
}

#[tokio::test]
async fn raw_select_uses_configured_filter() {
    let source = FakeSource::new();
    let db = Db::new(source.clone()).with_filter(SqlFilter::allow_all());
    let mut rows: Vec<StatusRow> = Vec::new();

    db.select_raw(&Role::DRIVER, "SELECT car_id FROM car_isusing;", &[], &mut rows)
        .await
        .unwrap();

    assert_eq!(source.checkouts(), 1);
}

#[tokio::test]
async fn raw_select_checks_param_count() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());
    let mut rows: Vec<StatusRow> = Vec::new();

    let err = db
        .select_raw(&Role::DRIVER, "SELECT car_id FROM car_isusing WHERE car_id = ?", &[], &mut rows)
        .await
        .unwrap_err();

    assert!(err.is_build());
    assert_eq!(source.checkouts(), 0);
}

// ── Execute ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn execute_skips_filter_and_returns_rows_affected() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());

    let affected = db
        .execute(
            &Role::DRIVER,
            "UPDATE car_isusing SET car_isusing = ? WHERE car_id = ?",
            &crate::params!["In Use", "ABC-123"],
        )
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        source.calls(),
        [Call::Execute {
            sql: "UPDATE car_isusing SET car_isusing = $1 WHERE car_id = $2".to_string(),
            params: vec!["\"In Use\"".to_string(), "\"ABC-123\"".to_string()],
        }]
    );
}

// ── Insert ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_returns_generated_key_column() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());

    // The fake returns no rows, so the key decodes as 0.
    let id = db.insert(&Role::ADMIN, "tokens", &sample_token()).await.unwrap();
    assert_eq!(id, 0);

    assert_eq!(
        source.calls(),
        [Call::Query {
            sql: "INSERT INTO tokens (token_hash, token_revoked, token_expiry) \
                  VALUES ($1, $2, $3) RETURNING token_id"
                .to_string(),
            params: vec![
                "\"abc\"".to_string(),
                "Flag(false)".to_string(),
                "\"2020-01-01\"".to_string(),
            ],
        }]
    );
}

#[tokio::test]
async fn insert_without_generated_key_executes() {
    let source = FakeSource::new();
    let db = Db::new(source.clone());

    let id = db
        .insert(
            &Role::DRIVER,
            "car_isusing",
            &StatusRow {
                car_id: "ABC-123".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(id, 0);
    assert!(matches!(&source.calls()[0], Call::Execute { sql, .. }
        if sql == "INSERT INTO car_isusing (car_id) VALUES ($1)"));
}

#[tokio::test]
async fn db_is_shareable_across_tasks() {
    let source = FakeSource::new();
    let db = Arc::new(Db::new(source.clone()));

    let mut handles = Vec::new();
    for i in 0..4_i64 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.execute(&Role::DRIVER, "DELETE FROM car_isusing WHERE car_id = ?", &[param(i)])
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 1);
    }
    assert_eq!(source.checkouts(), 4);
}
