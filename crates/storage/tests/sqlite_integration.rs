use storage::repository::{KeyValueRepository, Storage, keys};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrip_put_get_remove() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get(keys::LEADERBOARD).await.unwrap(), None);

    repo.put(keys::LEADERBOARD, r#"[{"name":"Ada"}]"#)
        .await
        .unwrap();
    repo.put(keys::LAST_PLAYER, "Ada").await.unwrap();
    assert_eq!(
        repo.get(keys::LEADERBOARD).await.unwrap().as_deref(),
        Some(r#"[{"name":"Ada"}]"#)
    );

    repo.put(keys::LEADERBOARD, "[]").await.unwrap();
    assert_eq!(
        repo.get(keys::LEADERBOARD).await.unwrap().as_deref(),
        Some("[]")
    );

    repo.remove(keys::LEADERBOARD).await.unwrap();
    assert_eq!(repo.get(keys::LEADERBOARD).await.unwrap(), None);
    assert_eq!(
        repo.get(keys::LAST_PLAYER).await.unwrap().as_deref(),
        Some("Ada")
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.put("k", "v").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn file_backed_store_survives_reconnect() {
    let path = std::env::temp_dir().join(format!(
        "quiz-storage-test-{}.sqlite3",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());

    {
        let storage = Storage::sqlite(&url).await.expect("open");
        storage.entries.put(keys::LAST_PLAYER, "Grace").await.unwrap();
    }

    let repo = SqliteRepository::connect(&url).await.expect("reopen");
    repo.migrate().await.expect("migrate");
    assert_eq!(
        repo.get(keys::LAST_PLAYER).await.unwrap().as_deref(),
        Some("Grace")
    );
    repo.close().await;

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("sqlite3-wal"));
    let _ = std::fs::remove_file(path.with_extension("sqlite3-shm"));
}

#[tokio::test]
async fn connect_creates_missing_database_file() {
    let path = std::env::temp_dir().join(format!("quiz_kv_create_{}.sqlite3", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let storage = Storage::sqlite(&format!("sqlite://{}", path.display()))
        .await
        .expect("open new file");
    storage.entries.put(keys::LAST_PLAYER, "Ada").await.unwrap();
    assert!(path.exists());

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("sqlite3-wal"));
    let _ = std::fs::remove_file(path.with_extension("sqlite3-shm"));
}
