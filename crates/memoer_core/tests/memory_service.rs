use memoer_core::db::open_db_in_memory;
use memoer_core::{
    MemoryService, MemoryStore, MemoryValidationError, ServiceError, SqliteMemoryStore,
    DEFAULT_USER_NAME,
};

#[test]
fn create_memory_collapses_app_spellings_to_one_app() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
        let mut service = MemoryService::new(store);
        for spelling in ["My App", "my_app", "MY   APP"] {
            let record = service.create_memory("spelling probe", spelling).unwrap();
            assert_eq!(record.app_name, "my_app");
            assert_eq!(record.user_name, DEFAULT_USER_NAME);
        }
    }

    let apps: i64 = conn
        .query_row("SELECT COUNT(*) FROM apps;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(apps, 1);
    let memories: i64 = conn
        .query_row("SELECT COUNT(*) FROM memories;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(memories, 3);
}

#[test]
fn create_memory_rejects_blank_content() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let mut service = MemoryService::new(store);

    let err = service.create_memory("   ", "notes").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(MemoryValidationError::EmptyContent)
    ));
}

#[test]
fn create_memory_rejects_blank_app_name() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let mut service = MemoryService::new(store);

    let err = service.create_memory("content", "   ").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(MemoryValidationError::EmptyAppName)
    ));
}

#[test]
fn list_memories_filter_runs_through_write_normalization() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let mut service = MemoryService::new(store);
    service.create_memory("normalized", "My App").unwrap();

    let listed = service
        .list_memories(Some("MY   APP".to_string()), None, None)
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].app_name, "my_app");

    let missed = service
        .list_memories(Some("other app".to_string()), None, None)
        .unwrap();
    assert!(missed.items.is_empty());
}

#[test]
fn list_memories_treats_blank_filters_as_absent() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let mut service = MemoryService::new(store);
    service.create_memory("kept", "filters").unwrap();

    let listed = service
        .list_memories(Some("   ".to_string()), Some(String::new()), None)
        .unwrap();
    assert_eq!(listed.items.len(), 1);
}

#[test]
fn list_memories_reports_applied_limit() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let mut service = MemoryService::new(store);
    for index in 0..12 {
        service
            .create_memory(format!("note {index}"), "bulk")
            .unwrap();
    }

    let defaulted = service.list_memories(None, None, None).unwrap();
    assert_eq!(defaulted.applied_limit, 10);
    assert_eq!(defaulted.items.len(), 10);

    let zeroed = service.list_memories(None, None, Some(0)).unwrap();
    assert_eq!(zeroed.applied_limit, 10);

    let explicit = service.list_memories(None, None, Some(25)).unwrap();
    assert_eq!(explicit.applied_limit, 25);
    assert_eq!(explicit.items.len(), 12);
}

#[test]
fn list_memories_filters_by_category_through_normalization() {
    let mut conn = open_db_in_memory().unwrap();
    let (tagged_id, plain_id) = {
        let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
        let mut service = MemoryService::new(store);
        let tagged = service.create_memory("buy detergent", "chorebot").unwrap();
        let plain = service.create_memory("water plants", "chorebot").unwrap();
        (tagged.id, plain.id)
    };

    {
        let mut store = SqliteMemoryStore::try_new(&mut conn).unwrap();
        store
            .set_memory_categories(tagged_id, &["Shopping".to_string()])
            .unwrap();
    }

    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let service = MemoryService::new(store);
    let listed = service
        .list_memories(None, Some("  SHOPPING ".to_string()), None)
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, tagged_id);
    assert_eq!(listed.items[0].categories, vec!["shopping".to_string()]);
    assert_ne!(listed.items[0].id, plain_id);
}

#[test]
fn ensure_default_user_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let store = SqliteMemoryStore::try_new(&mut conn).unwrap();
    let service = MemoryService::new(store);

    let first = service.ensure_default_user().unwrap();
    let second = service.ensure_default_user().unwrap();
    assert_eq!(first.name, DEFAULT_USER_NAME);
    assert_eq!(first, second);
}
