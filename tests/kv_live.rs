#![cfg(feature = "kv")]

//! Runs only when `DB_ENGINE_REDIS_HOST` names a reachable server.

use db_engine::prelude::*;

fn client() -> Result<Option<KvDb>, DbEngineError> {
    let Ok(host) = std::env::var("DB_ENGINE_REDIS_HOST") else {
        eprintln!("DB_ENGINE_REDIS_HOST not set; skipping kv test");
        return Ok(None);
    };
    let mut cfg = KvConfig::new(host, 6379);
    cfg.max_active = 4;
    cfg.max_idle = 1;
    KvDb::new(cfg).map(Some)
}

#[tokio::test]
async fn kv_commands() -> Result<(), DbEngineError> {
    let Some(kv) = client()? else {
        return Ok(());
    };
    kv.ping().await?;

    kv.set("db_engine:str", "hello", 0).await?;
    assert_eq!(kv.get::<Option<String>>("db_engine:str").await?.as_deref(), Some("hello"));
    assert_eq!(kv.del("db_engine:str").await?, 1);
    assert_eq!(kv.get::<Option<String>>("db_engine:str").await?, None);

    kv.set("db_engine:n", 10, 60).await?;
    assert_eq!(kv.incr("db_engine:n").await?, 11);
    assert_eq!(kv.decr("db_engine:n").await?, 10);
    kv.del("db_engine:n").await?;

    kv.del("db_engine:h").await?;
    assert_eq!(kv.hset("db_engine:h", "a", "1").await?, 1);
    kv.hmset("db_engine:h", &[("b", "2"), ("c", "3")]).await?;
    assert_eq!(kv.hget::<Option<String>>("db_engine:h", "b").await?.as_deref(), Some("2"));
    let values: Vec<Option<String>> = kv.hmget("db_engine:h", &["a", "missing", "c"]).await?;
    assert_eq!(values, vec![Some("1".into()), None, Some("3".into())]);
    assert_eq!(kv.hdel("db_engine:h", "a").await?, 1);
    kv.del("db_engine:h").await?;
    Ok(())
}
