use memoer_core::db::open_db;
use memoer_core::{MemoryService, SqliteMemoryStore};
use std::thread;

#[test]
fn concurrent_creates_for_same_new_app_share_one_app_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memoer.db");
    // provision the schema before spawning writers
    drop(open_db(&path).unwrap());

    let mut handles = Vec::new();
    for index in 0..2 {
        let db_path = path.clone();
        handles.push(thread::spawn(move || {
            let mut conn = open_db(&db_path).unwrap();
            let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
            let mut service = MemoryService::new(store);
            service
                .create_memory(format!("note {index}"), "Shared App")
                .unwrap()
        }));
    }

    let records: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.app_name, "shared_app");
    }

    let conn = open_db(&path).unwrap();
    let apps: i64 = conn
        .query_row("SELECT COUNT(*) FROM apps;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(apps, 1);
    let users: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 1);
    let memories: i64 = conn
        .query_row("SELECT COUNT(*) FROM memories;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(memories, 2);
}
