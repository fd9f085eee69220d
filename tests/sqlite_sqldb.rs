#![cfg(feature = "sqlite")]

use db_engine::prelude::*;
use tempfile::TempDir;

#[derive(Debug, Default, PartialEq)]
struct Test {
    id: i64,
    value: String,
}
db_engine::impl_from_row!(Test { id: "id", value: "value" });

#[derive(Debug, Default)]
struct IdOnly {
    id: i64,
}
db_engine::impl_from_row!(IdOnly { id: "id" });

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn open(dir: &TempDir, tweak: impl FnOnce(&mut SqlDbConfig)) -> Result<SqlDb, DbEngineError> {
    init_tracing();
    let path = dir.path().join("test.db");
    let mut cfg = SqlDbConfig::new(path.to_string_lossy());
    tweak(&mut cfg);
    let mut db = SqlDb::new(DatabaseType::Sqlite, cfg)?;
    db.connect().await?;
    db.execute_batch(
        "DROP TABLE IF EXISTS test;
         CREATE TABLE test (id INTEGER PRIMARY KEY, value TEXT NOT NULL);",
    )
    .await?;
    Ok(db)
}

async fn seed(db: &SqlDb, n: i64) -> Result<(), DbEngineError> {
    for id in 1..=n {
        db.insert(
            "test",
            &["id", "value"],
            vec![id.into(), format!("name{id}").into()],
            None,
        )
        .await?;
    }
    Ok(())
}

#[tokio::test]
async fn insert_select_update_delete() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |_| {}).await?;

    let outcome = db
        .insert("test", &["id", "value"], vec![1.into(), "name".into()], None)
        .await?;
    assert_eq!(outcome.rows_affected, 1);
    assert_eq!(outcome.last_insert_id, Some(1));

    let rows: Vec<Test> = db
        .select(
            "test",
            &["id", "value"],
            Some(Decorator::new().where_clause("id = ?", [1]).limit(10, 0)),
        )
        .await?;
    assert_eq!(
        rows,
        vec![Test {
            id: 1,
            value: "name".into()
        }]
    );

    let outcome = db
        .update(
            "test",
            &["value"],
            vec!["renamed".into()],
            Some(Decorator::new().where_clause("id = ?", [1])),
        )
        .await?;
    assert_eq!(outcome.rows_affected, 1);
    let rows: Vec<Test> = db.select("test", &["id", "value"], None).await?;
    assert_eq!(rows[0].value, "renamed");

    let outcome = db
        .delete("test", Some(Decorator::new().where_clause("id = ?", [1])))
        .await?;
    assert_eq!(outcome.rows_affected, 1);
    assert_eq!(db.count("test", None).await?, 0);
    Ok(())
}

#[tokio::test]
async fn select_appends_one_value_per_row() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |_| {}).await?;

    let mut dest: Vec<Test> = Vec::new();
    assert_eq!(db.select_into(&mut dest, "test", &["id", "value"], None).await?, 0);
    assert!(dest.is_empty());

    seed(&db, 1).await?;
    assert_eq!(db.select_into(&mut dest, "test", &["id", "value"], None).await?, 1);
    assert_eq!(dest.len(), 1);

    seed_from(&db, 2, 5).await?;
    let mut all: Vec<Test> = Vec::new();
    assert_eq!(db.select_into(&mut all, "test", &["id", "value"], None).await?, 5);
    assert_eq!(all.len(), 5);
    Ok(())
}

async fn seed_from(db: &SqlDb, first: i64, last: i64) -> Result<(), DbEngineError> {
    for id in first..=last {
        db.insert(
            "test",
            &["id", "value"],
            vec![id.into(), format!("name{id}").into()],
            None,
        )
        .await?;
    }
    Ok(())
}

#[tokio::test]
async fn unselected_fields_default_and_unbound_columns_fail() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |_| {}).await?;
    seed(&db, 2).await?;

    let rows: Vec<Test> = db.select("test", &["id"], None).await?;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.value.is_empty()));

    let err = db
        .select::<IdOnly>("test", &["id", "value"], None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbEngineError::MappingError(ref m) if m.contains("value")));
    Ok(())
}

#[tokio::test]
async fn insert_length_mismatch_is_a_parameter_error() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |_| {}).await?;
    let err = db
        .insert("test", &["id", "value"], vec![1.into()], None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbEngineError::ParameterError(_)));
    let err = db
        .update("test", &["value"], vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbEngineError::ParameterError(_)));
    assert_eq!(db.count("test", None).await?, 0);
    Ok(())
}

#[tokio::test]
async fn check_args_screens_text_arguments() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |cfg| cfg.check_args = true).await?;

    let err = db
        .insert("test", &["id", "value"], vec![1.into(), "id=1".into()], None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbEngineError::RejectedArgument(ref v) if v == "id=1"));
    assert_eq!(db.count("test", None).await?, 0);

    db.insert(
        "test",
        &["id", "value"],
        vec![1.into(), "hello world".into()],
        None,
    )
    .await?;

    let err = db
        .exec_sql("DELETE FROM test WHERE value = ?", vec!["x' OR 1".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, DbEngineError::RejectedArgument(_)));
    assert_eq!(db.count("test", None).await?, 1);
    Ok(())
}

#[tokio::test]
async fn count_order_and_limit() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |_| {}).await?;
    seed(&db, 5).await?;

    assert_eq!(db.count("test", None).await?, 5);
    assert_eq!(
        db.count("test", Some(Decorator::new().where_clause("id > ?", [2])))
            .await?,
        3
    );

    let rows: Vec<Test> = db
        .select(
            "test",
            &["id", "value"],
            Some(Decorator::new().order_by("id", false).limit(2, 0)),
        )
        .await?;
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![5, 4]);

    // two-argument form: skip 1, return 2
    let rows: Vec<Test> = db
        .select(
            "test",
            &["id", "value"],
            Some(Decorator::new().order_by("id", true).limit(1, 2)),
        )
        .await?;
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    Ok(())
}

#[tokio::test]
async fn raw_escape_hatches() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |_| {}).await?;

    let outcome = db
        .exec_sql(
            "INSERT INTO test (id, value) VALUES (?, ?), (?, ?)",
            vec![1.into(), "a".into(), 2.into(), "b".into()],
        )
        .await?;
    assert_eq!(outcome.rows_affected, 2);

    let rs = db
        .query_sql("SELECT value FROM test WHERE id = ?", vec![2.into()])
        .await?;
    assert_eq!(rs.len(), 1);
    assert_eq!(rs.results[0].get("value").and_then(RowValues::as_text), Some("b"));
    Ok(())
}

#[tokio::test]
async fn saturated_pool_times_out() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |cfg| {
        cfg.max_open_conns = 1;
        cfg.acquire_timeout_seconds = 1;
    })
    .await?;

    let tx = db.begin().await?;
    let err = db.count("test", None).await.unwrap_err();
    assert!(matches!(err, DbEngineError::Timeout(_)));
    drop(tx);
    Ok(())
}

#[tokio::test]
async fn zero_idle_timeout_and_large_idle_floor_connect() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |cfg| {
        cfg.idle_timeout_seconds = 0;
        cfg.max_idle_conns = 20;
        cfg.max_open_conns = 0;
    })
    .await?;
    seed(&db, 3).await?;
    assert_eq!(db.count("test", None).await?, 3);
    let (connections, _) = db.pool().expect("connected").state();
    assert!(connections <= db_engine::pool::DEFAULT_MAX_SIZE);
    Ok(())
}

#[tokio::test]
async fn idle_floor_above_open_cap_connects() -> Result<(), DbEngineError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = open(&dir, |cfg| {
        cfg.max_idle_conns = 8;
        cfg.max_open_conns = 2;
    })
    .await?;
    seed(&db, 1).await?;
    let (connections, _) = db.pool().expect("connected").state();
    assert!(connections <= 2);
    Ok(())
}
