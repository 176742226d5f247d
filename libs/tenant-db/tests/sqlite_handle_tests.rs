#![cfg(feature = "sqlite")]

use figment::{Figment, providers::Serialized};
use sea_orm::{ConnectionTrait, Statement};
use tempfile::TempDir;
use tenant_db::{DbConnConfig, DbEngine, PoolCfg, build_db_handle};

#[tokio::test]
async fn memory_handle_executes_statements() {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".to_owned()),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();
    assert_eq!(db.engine(), DbEngine::Sqlite);
    assert_eq!(db.dsn(), "sqlite::memory:");

    db.sea()
        .execute_unprepared("CREATE TABLE gadgets (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    db.sea()
        .execute_unprepared("INSERT INTO gadgets (name) VALUES ('a')")
        .await
        .unwrap();

    let backend = db.sea().get_database_backend();
    let row = db
        .sea()
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM gadgets",
        ))
        .await
        .unwrap()
        .unwrap();
    let n: i64 = row.try_get("", "n").unwrap();
    assert_eq!(n, 1);

    db.close().await;
}

#[tokio::test]
async fn file_handle_creates_parent_dirs_and_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("tenant.sqlite");

    let cfg = DbConnConfig {
        engine: Some(DbEngine::Sqlite),
        path: Some(path.clone()),
        params: Some([("journal_mode".to_owned(), "wal".to_owned())].into()),
        pool: Some(PoolCfg {
            max_conns: Some(2),
            ..Default::default()
        }),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();
    db.sea()
        .execute_unprepared("CREATE TABLE t (id INTEGER)")
        .await
        .unwrap();
    db.close().await;

    assert!(path.is_file());
}

#[tokio::test]
async fn config_loads_through_figment() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("app.db");

    let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
        "engine": "sqlite",
        "path": path,
        "pool": { "max_conns": 3, "acquire_timeout": "2s" }
    })));
    let cfg: DbConnConfig = figment.extract().unwrap();
    assert_eq!(cfg.pool.as_ref().and_then(|p| p.max_conns), Some(3));

    let db = build_db_handle(cfg).await.unwrap();
    assert_eq!(db.engine(), DbEngine::Sqlite);
    assert!(db.dsn().ends_with("app.db"));
    db.close().await;
}

#[tokio::test]
async fn invalid_pragma_value_fails_before_connecting() {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".to_owned()),
        params: Some([("synchronous".to_owned(), "SOMETIMES".to_owned())].into()),
        ..Default::default()
    };
    let err = build_db_handle(cfg).await.unwrap_err();
    assert!(err.to_string().contains("synchronous"), "{err}");
}
