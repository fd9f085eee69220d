#![cfg(feature = "postgres")]

//! Runs only when `DB_ENGINE_PG_CONFIG` holds a JSON `SqlDbConfig`.

use db_engine::prelude::*;

#[derive(Debug, Default)]
struct Test {
    id: i64,
    value: String,
}
db_engine::impl_from_row!(Test { id: "id", value: "value" });

async fn connect() -> Result<Option<SqlDb>, DbEngineError> {
    let Ok(json) = std::env::var("DB_ENGINE_PG_CONFIG") else {
        eprintln!("DB_ENGINE_PG_CONFIG not set; skipping postgres test");
        return Ok(None);
    };
    let mut db = SqlDb::new(DatabaseType::Postgres, SqlDbConfig::from_json(&json)?)?;
    db.connect().await?;
    db.execute_batch(
        "DROP TABLE IF EXISTS db_engine_test;
         CREATE TABLE db_engine_test (id BIGINT PRIMARY KEY, value TEXT NOT NULL);",
    )
    .await?;
    Ok(Some(db))
}

#[tokio::test]
async fn postgres_round_trip() -> Result<(), DbEngineError> {
    let Some(db) = connect().await? else {
        return Ok(());
    };
    for id in 1..=4_i64 {
        db.insert(
            "db_engine_test",
            &["id", "value"],
            vec![id.into(), format!("v{id}").into()],
            None,
        )
        .await?;
    }
    assert_eq!(db.count("db_engine_test", None).await?, 4);

    // skip 1, return 2
    let rows: Vec<Test> = db
        .select(
            "db_engine_test",
            &["id", "value"],
            Some(
                Decorator::new()
                    .where_clause("id > ?", [0_i64])
                    .order_by("id", true)
                    .limit(1, 2),
            ),
        )
        .await?;
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(rows[0].value, "v2");

    let mut tx = db.begin().await?;
    tx.delete("db_engine_test", None).await?;
    tx.rollback().await?;
    assert_eq!(db.count("db_engine_test", None).await?, 4);

    db.execute_batch("DROP TABLE db_engine_test").await?;
    Ok(())
}
