//! Integration tests for record persistence against SQLite.
//!
//! Each test gets its own database file, its own pool and its own tables.

use tempfile::NamedTempFile;
use webcode_orm::blog::User;
use webcode_orm::models::Value;
use webcode_orm::{
    ConnectionPool, DbError, FindOptions, Limit, Model, PoolConfig, QueryExecutor, model,
};

model! {
    #[table = "items"]
    pub struct Item {
        pub id: i64 = integer.primary_key(),
        pub label: String = string.ddl("varchar(50)"),
        pub rank: i64 = integer,
        pub note: Option<String> = text.default_value("none"),
    }
}

model! {
    #[table = "keys_only"]
    pub struct KeyOnly {
        pub id: i64 = integer.primary_key(),
    }
}

/// Helper to create a pool and executor on a fresh database file
async fn setup() -> (QueryExecutor, NamedTempFile) {
    let file = NamedTempFile::new().unwrap();
    let config = PoolConfig::sqlite(file.path().to_string_lossy());
    let pool = ConnectionPool::connect(config).await.unwrap();
    let db = QueryExecutor::new(pool);

    db.execute(
        "create table users (id varchar(50) not null primary key, email varchar(50) not null, \
         passwd varchar(50) not null, admin bool not null, name varchar(50) not null, \
         image varchar(500) not null, created_at real not null)",
        &[],
        true,
    )
    .await
    .expect("Failed to create users table");
    db.execute(
        "create table items (id bigint not null primary key, label varchar(50) not null, \
         rank bigint not null, note text)",
        &[],
        true,
    )
    .await
    .expect("Failed to create items table");
    db.execute(
        "create table keys_only (id bigint not null primary key)",
        &[],
        true,
    )
    .await
    .expect("Failed to create keys_only table");

    (db, file)
}

async fn insert_items(db: &QueryExecutor, count: i64) {
    for i in 1..=count {
        let mut item = Item {
            id: i,
            label: format!("item-{}", i),
            rank: i % 4,
            note: None,
        };
        assert_eq!(item.save(db).await.unwrap(), 1);
    }
}

// =========================================================================
// Round trip
// =========================================================================

#[tokio::test]
async fn test_user_save_find_remove() {
    let (db, _file) = setup().await;

    let mut user = User {
        id: Some("u1".to_string()),
        email: "a@b".to_string(),
        passwd: "x".to_string(),
        ..Default::default()
    };
    assert_eq!(user.save(&db).await.unwrap(), 1);
    assert!(user.created_at.is_some(), "default timestamp written back");

    let found = User::find(&db, "u1").await.unwrap().expect("user stored");
    assert_eq!(found, user);
    assert_eq!(found.email, "a@b");

    assert_eq!(user.remove(&db).await.unwrap(), 1);
    assert!(User::find(&db, "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_generates_primary_key() {
    let (db, _file) = setup().await;

    let mut user = User {
        email: "payne@example.com".to_string(),
        passwd: "password".to_string(),
        admin: true,
        name: "Payne".to_string(),
        image: "about:blank".to_string(),
        ..Default::default()
    };
    user.save(&db).await.unwrap();

    let id = user.id.clone().expect("id generated on save");
    assert_eq!(id.len(), 50);

    let found = User::find(&db, id.as_str()).await.unwrap().unwrap();
    assert!(found.admin);
    assert_eq!(found.name, "Payne");
}

#[tokio::test]
async fn test_update_by_primary_key() {
    let (db, _file) = setup().await;
    insert_items(&db, 3).await;

    let mut item = Item::find(&db, 2).await.unwrap().unwrap();
    assert_eq!(item.note.as_deref(), Some("none"));
    item.label = "renamed".to_string();
    assert_eq!(item.update(&db).await.unwrap(), 1);

    let reloaded = Item::find(&db, 2).await.unwrap().unwrap();
    assert_eq!(reloaded.label, "renamed");
    assert_eq!(Item::find(&db, 1).await.unwrap().unwrap().label, "item-1");
}

#[tokio::test]
async fn test_mismatched_writes_return_count() {
    let (db, _file) = setup().await;

    // Nothing stored under this key: reported, not raised
    let ghost = Item {
        id: 99,
        label: "ghost".to_string(),
        ..Default::default()
    };
    assert_eq!(ghost.update(&db).await.unwrap(), 0);
    assert_eq!(ghost.remove(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_without_fields_is_rejected() {
    let (db, _file) = setup().await;
    let record = KeyOnly { id: 1 };
    assert!(matches!(
        record.update(&db).await,
        Err(DbError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_insert_fails() {
    let (db, _file) = setup().await;
    insert_items(&db, 1).await;

    let mut duplicate = Item {
        id: 1,
        label: "again".to_string(),
        ..Default::default()
    };
    let err = duplicate.save(&db).await.unwrap_err();
    assert!(matches!(err, DbError::QueryExecution { .. }));
}

// =========================================================================
// Queries
// =========================================================================

#[tokio::test]
async fn test_find_all_limits() {
    let (db, _file) = setup().await;
    insert_items(&db, 20).await;

    let all = Item::find_all(&db, FindOptions::new()).await.unwrap();
    assert_eq!(all.len(), 20);

    let first = Item::find_all(&db, FindOptions::new().order_by("`id`").limit(5u64))
        .await
        .unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(first[0].id, 1);

    let page = Item::find_all(
        &db,
        FindOptions::new().order_by("`id`").limit(Limit::Range {
            offset: 10,
            count: 5,
        }),
    )
    .await
    .unwrap();
    assert_eq!(
        page.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![11, 12, 13, 14, 15]
    );

    let tail = Item::find_all(
        &db,
        FindOptions::new().limit(Limit::try_from("18,5").unwrap()),
    )
    .await
    .unwrap();
    assert_eq!(tail.len(), 2);
}

#[tokio::test]
async fn test_find_all_with_filter() {
    let (db, _file) = setup().await;
    insert_items(&db, 12).await;

    let ranked = Item::find_all(
        &db,
        FindOptions::new()
            .filter("`rank` = ?", vec![Value::Int(3)])
            .order_by("`id` desc"),
    )
    .await
    .unwrap();
    assert_eq!(
        ranked.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![11, 7, 3]
    );
}

#[test]
fn test_malformed_limit_rejected() {
    assert!(matches!(
        Limit::try_from("x"),
        Err(DbError::InvalidArgument { .. })
    ));
    assert!(matches!(
        Limit::try_from(Value::Bool(true)),
        Err(DbError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_find_number() {
    let (db, _file) = setup().await;

    let empty = Item::find_number(&db, "count(`id`)", None, vec![])
        .await
        .unwrap();
    assert_eq!(empty, Some(Value::Int(0)));

    let missing = Item::find_number(&db, "max(`rank`)", None, vec![])
        .await
        .unwrap();
    assert_eq!(missing, None);

    insert_items(&db, 10).await;
    let count = Item::find_number(&db, "count(`id`)", Some("`rank` > ?"), vec![Value::Int(1)])
        .await
        .unwrap();
    assert_eq!(count, Some(Value::Int(5)));
}

#[tokio::test]
async fn test_unmapped_columns_ignored() {
    let (db, _file) = setup().await;
    insert_items(&db, 1).await;

    let rows = db
        .select("select *, 42 as extra from `items`", &[], None)
        .await
        .unwrap();
    let item = Item::from_row(rows.into_iter().next().unwrap()).unwrap();
    assert_eq!(item.id, 1);
    assert_eq!(item.label, "item-1");
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn test_registration_properties() {
    let schema = Item::register().unwrap();
    let mut names = schema.all_fields().to_vec();
    assert_eq!(names.len(), Item::declared_fields().len());
    names.sort();
    names.dedup();
    assert_eq!(names.len(), schema.all_fields().len());
    assert_eq!(schema.all_fields().last().map(String::as_str), Some("id"));

    let again = webcode_orm::register::<Item>().unwrap();
    assert!(std::ptr::eq(schema, again));
    assert_eq!(schema.insert_sql(), again.insert_sql());
}

#[test]
fn test_concurrent_registration_stores_one_schema() {
    model! {
        struct Racer {
            id: i64 = integer.primary_key(),
            value: String = string,
        }
    }

    const THREADS: usize = 16;
    let barrier = std::sync::Barrier::new(THREADS);

    let addresses: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    Racer::register().map(|s| s as *const _ as usize).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(addresses.len(), THREADS);
    assert!(addresses.iter().all(|&a| a == addresses[0]));
    assert_eq!(Racer::register().unwrap() as *const _ as usize, addresses[0]);
}
