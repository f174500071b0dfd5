use catalog_core::{evaluate, Product, PRODUCT_FIELDS};
use catalog_storage::{load_products, PersistentStore, ProductStore};
use chrono::{TimeZone, Utc};

fn product(id: i64, title: &str, price: f64) -> Product {
    Product {
        id,
        title: title.into(),
        price,
        regular_price: price,
        sale_price: 0.0,
        stock_status: "instock".into(),
        stock_quantity: None,
        category: Some("Electronics".into()),
        tags: vec!["wireless".into(), "bluetooth".into()],
        on_sale: false,
        created_at: Utc.with_ymd_and_hms(2023, 1, 15, 10, 30, 0).unwrap(),
        average_rating: 4.5,
        updated_at: None,
    }
}

#[tokio::test]
async fn upserts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
        store.upsert(product(1, "Headphones", 199.99)).await.unwrap();
        store.upsert(product(2, "Speaker", 89.0)).await.unwrap();
        store.upsert(product(1, "Headphones v2", 179.99)).await.unwrap();
    }
    let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    let p = store.get(1).await.unwrap();
    assert_eq!(p.title, "Headphones v2");
    assert_eq!(p.tags, vec!["wireless", "bluetooth"]);

    let pred = evaluate(&["price < 100"], &PRODUCT_FIELDS).unwrap();
    let hits = store.find(&pred).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 2);
}

#[tokio::test]
async fn snapshot_compacts_and_later_writes_win() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
        store.upsert(product(1, "Old", 10.0)).await.unwrap();
        store.upsert(product(2, "Other", 20.0)).await.unwrap();
        let (name, count) = store.admin_snapshot().await.unwrap();
        assert!(name.starts_with("snap-"));
        assert_eq!(count, 2);
        store.upsert(product(1, "New", 11.0)).await.unwrap();
        let manifest = store.admin_manifest().await.unwrap();
        assert_eq!(manifest["current_snapshot"], serde_json::json!(name));
    }
    let loaded = load_products(dir.path()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "New");

    let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
    assert_eq!(store.get(1).await.unwrap().price, 11.0);
    assert_eq!(store.get(2).await.unwrap().title, "Other");
}

#[tokio::test]
async fn empty_dir_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistentStore::open(dir.path().join("nested")).unwrap();
    assert_eq!(store.all().await.unwrap(), Vec::<Product>::new());
}

fn wal_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir.join("wal"))
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("log"))
        .count()
}

#[tokio::test]
async fn reopen_appends_to_newest_segment() {
    let dir = tempfile::tempdir().unwrap();
    for round in 0..3 {
        let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
        store
            .upsert(product(round, "Lamp", 30.0 + round as f64))
            .await
            .unwrap();
    }
    assert_eq!(wal_files(dir.path()), 1);
    assert_eq!(load_products(dir.path()).unwrap().len(), 3);
}

#[tokio::test]
async fn failed_manifest_write_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
        store.upsert(product(1, "Desk", 250.0)).await.unwrap();
        // the manifest is written via a temp file; a directory in its place makes that fail
        std::fs::create_dir(dir.path().join("manifest.json.tmp")).unwrap();
        assert!(store.admin_snapshot().await.is_err());

        let manifest = store.admin_manifest().await.unwrap();
        assert_eq!(manifest["current_snapshot"], serde_json::Value::Null);
        store.upsert(product(2, "Chair", 90.0)).await.unwrap();
    }
    std::fs::remove_dir(dir.path().join("manifest.json.tmp")).unwrap();
    let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(store.get(2).await.unwrap().title, "Chair");
}
