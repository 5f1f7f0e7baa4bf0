use stash_core::{
    Column, ColumnType, Condition, Config, CoreError, CredentialKey, DataStorage, LogicalDatabase,
    LogicalTable, MemoryBackend, OrderBy, QueryOptions, Record, RecordRow, ResultColumn,
    SampleTable, StorageResult, StoredValue, Value, ValueEncoding,
};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
struct Lesson {
    id: i64,
    title: String,
    done: bool,
}

impl Lesson {
    fn new(id: i64, title: &str, done: bool) -> Self {
        Self {
            id,
            title: title.to_string(),
            done,
        }
    }
}

impl Record for Lesson {
    fn table_name() -> &'static str {
        "Lesson"
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("id", ColumnType::Integer).primary_key(),
            Column::new("title", ColumnType::Text).not_null(),
            Column::new("done", ColumnType::Integer),
        ];
        COLUMNS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.title.clone()),
            Value::Integer(i64::from(self.done)),
        ]
    }

    fn from_row(row: &RecordRow) -> StorageResult<Self> {
        Ok(Self {
            id: row.get_or_default("id")?,
            title: row.get_or_default("title")?,
            done: row.get_or_default("done")?,
        })
    }
}

enum Secret {
    ApiToken,
    Remember,
    Avatar,
}

impl CredentialKey for Secret {
    fn raw_key(&self) -> &str {
        match self {
            Secret::ApiToken => "api_token",
            Secret::Remember => "remember",
            Secret::Avatar => "avatar",
        }
    }
}

fn storage(encoding: ValueEncoding) -> (TempDir, Arc<MemoryBackend>, DataStorage) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::new(dir.path().to_path_buf(), "LessonApp");
    config.credential_encoding = encoding;

    let backend = Arc::new(MemoryBackend::new());
    let storage = DataStorage::new(config, backend.clone()).unwrap();
    (dir, backend, storage)
}

#[test]
fn test_crud_through_logical_table() {
    let (dir, _backend, storage) = storage(ValueEncoding::Tagged);
    let db = storage.db();
    let table = SampleTable::Study;
    let database = table.database().name();

    let lessons = vec![
        Lesson::new(1, "Ownership", false),
        Lesson::new(2, "Borrowing", false),
        Lesson::new(3, "Lifetimes", true),
    ];
    assert!(db.insert(&lessons, None, database));
    assert!(dir.path().join("LessonApp/Study.db").exists());

    let loaded: Vec<Lesson> = db.get(database, "Lesson", &[], &table.query()).unwrap();
    assert_eq!(loaded.len(), 3);
    for lesson in &lessons {
        assert!(loaded.contains(lesson));
    }

    let pending = QueryOptions::new().filter(Condition::eq("done", 0i64));
    assert!(db.update(database, "Lesson", &["done"], &Lesson::new(0, "", true), &pending));
    assert_eq!(
        db.get_value(database, "Lesson", ResultColumn::Count, &pending),
        Some(Value::Integer(0))
    );

    assert!(db.delete(
        database,
        "Lesson",
        &QueryOptions::new().order_by(OrderBy::asc("id")).limit(1)
    ));
    let titles: Vec<Lesson> = db
        .get(database, "Lesson", &["title"], &QueryOptions::new().order_by(OrderBy::asc("id")))
        .unwrap();
    assert_eq!(
        titles.iter().map(|l| l.title.as_str()).collect::<Vec<_>>(),
        vec!["Borrowing", "Lifetimes"]
    );
}

#[test]
fn test_transaction_body_sees_its_own_writes() {
    let (_dir, _backend, storage) = storage(ValueEncoding::Tagged);
    let db = storage.db();
    assert!(db.insert(&[Lesson::new(1, "Ownership", false)], None, "Study"));

    let count = db
        .try_run("Study", |tx| {
            tx.insert_or_replace(&[Lesson::new(1, "Ownership", true)], None, "Lesson")?;
            tx.insert(&[Lesson::new(2, "Traits", false)], None, "Lesson")?;
            tx.get_value(&ResultColumn::Count, "Lesson", &QueryOptions::new())
        })
        .unwrap();
    assert_eq!(count, Some(Value::Integer(2)));

    let done: Vec<Lesson> = db
        .get("Study", "Lesson", &[], &QueryOptions::new().filter(Condition::eq("id", 1i64)))
        .unwrap();
    assert_eq!(done, vec![Lesson::new(1, "Ownership", true)]);
}

#[test]
fn test_databases_are_isolated_by_name() {
    let (_dir, _backend, storage) = storage(ValueEncoding::Tagged);
    let db = storage.db();

    assert!(db.insert(&[Lesson::new(1, "Ownership", false)], None, "Study"));
    assert!(db.insert(&[Lesson::new(1, "Other", false)], None, "CourseList"));

    let study: Vec<Lesson> = db.get("Study", "Lesson", &[], &QueryOptions::new()).unwrap();
    assert_eq!(study, vec![Lesson::new(1, "Ownership", false)]);

    assert!(db.delete_database("CourseList"));
    let study_again: Vec<Lesson> = db.get("Study", "Lesson", &[], &QueryOptions::new()).unwrap();
    assert_eq!(study_again, study);
    assert_eq!(db.get::<Lesson>("CourseList", "Lesson", &[], &QueryOptions::new()), None);
}

#[test]
fn test_credentials_keep_their_kind() {
    for encoding in [ValueEncoding::Tagged, ValueEncoding::Probe] {
        let (_dir, backend, storage) = storage(encoding);
        let credentials = storage.credentials();

        credentials.set(&Secret::ApiToken, "hello").unwrap();
        credentials.set(&Secret::Remember, true).unwrap();
        credentials.set(&Secret::Avatar, vec![0xFFu8, 0x00, 0x10]).unwrap();

        assert_eq!(
            credentials.get(&Secret::ApiToken).unwrap(),
            Some(StoredValue::Text("hello".to_string()))
        );
        assert_eq!(credentials.get(&Secret::Remember).unwrap(), Some(StoredValue::Bool(true)));
        assert!(backend.raw("LessonApp.api_token").is_some());
        assert_eq!(backend.len(), 3);
    }
}

#[test]
fn test_tagged_blob_survives_but_probe_misreads_it() {
    let (_dir, _backend, tagged) = storage(ValueEncoding::Tagged);
    tagged.credentials().set(&Secret::Avatar, vec![0xFFu8, 0x10]).unwrap();
    assert_eq!(
        tagged.credentials().get(&Secret::Avatar).unwrap(),
        Some(StoredValue::Blob(vec![0xFF, 0x10]))
    );

    let (_dir, _backend, probing) = storage(ValueEncoding::Probe);
    probing.credentials().set(&Secret::Avatar, vec![0xFFu8, 0x10]).unwrap();
    assert_eq!(
        probing.credentials().get(&Secret::Avatar).unwrap(),
        Some(StoredValue::Bool(false))
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path().to_path_buf(), "");
    let result = DataStorage::new(config, Arc::new(MemoryBackend::new()));
    assert!(matches!(result, Err(CoreError::Config(_))));
}

#[test]
fn test_keyring_storage_uses_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path().to_path_buf(), "LessonApp");
    let storage = DataStorage::with_keyring(config).unwrap();

    assert_eq!(storage.credentials().namespace().as_str(), "LessonApp");
    assert_eq!(storage.config().namespace, "LessonApp");
    assert_eq!(
        storage.db().database_path("Study"),
        dir.path().join("LessonApp").join("Study.db")
    );
}
