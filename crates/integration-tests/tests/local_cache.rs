//! Product store over a file cache.

use std::sync::Arc;

use rust_decimal_macros::dec;
use tally_core::{Price, Product, ProductId};
use tally_sync::{DEFAULT_CACHE_KEY, FileCache, ProductSource, ProductStore, seed_products};

fn store_in(dir: &std::path::Path) -> ProductStore {
    ProductStore::local(Arc::new(FileCache::new(dir)))
}

fn snapshot_path(dir: &std::path::Path) -> std::path::PathBuf {
    dir.join(format!("{DEFAULT_CACHE_KEY}.json"))
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_first_start_writes_seed_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());

    store.load().await;

    assert_eq!(store.snapshot(), seed_products());
    let on_disk = std::fs::read_to_string(snapshot_path(dir.path())).unwrap();
    assert_eq!(on_disk, serde_json::to_string(&seed_products()).unwrap());
    assert!(store.last_error().is_none());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_changes_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = store_in(dir.path());
    first.load().await;
    assert!(first.update_stock(&ProductId::from(1), 75).await);
    assert!(first.update_price(&ProductId::from(2), Price::new(dec!(44.50))).await);
    first
        .upsert_product(Product::new("tea-1", "Green Tea", Price::from_units(8), 12).with_category("Beverages"))
        .await;

    let second = store_in(dir.path());
    second.load().await;

    assert_eq!(second.snapshot(), first.snapshot());
    assert_eq!(second.product(&ProductId::from(1)).unwrap().quantity, 75);
    assert_eq!(
        second.product(&ProductId::from(2)).unwrap().price.amount(),
        dec!(44.5)
    );
    assert_eq!(second.search("beverage").len(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_corrupt_snapshot_self_heals() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(snapshot_path(dir.path()), "[{\"id\": 1, \"name\":").unwrap();
    let store = store_in(dir.path());

    store.load().await;

    assert_eq!(store.snapshot(), seed_products());
    let healed: Vec<Product> =
        serde_json::from_str(&std::fs::read_to_string(snapshot_path(dir.path())).unwrap()).unwrap();
    assert_eq!(healed, seed_products());
    assert!(store.last_error().is_none());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_custom_key_keeps_default_snapshot_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProductStore::builder(ProductSource::Local(Arc::new(FileCache::new(dir.path()))))
        .cache_key("branch-2")
        .seed(vec![Product::new(9, "Salt", Price::from_units(2), 5)])
        .build();

    store.load().await;

    assert!(dir.path().join("branch-2.json").exists());
    assert!(!snapshot_path(dir.path()).exists());
    assert_eq!(store.low_stock().len(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_unwritable_cache_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();
    let store = store_in(&blocker);

    store.load().await;

    assert_eq!(store.snapshot(), seed_products());
    assert!(store.last_error().is_some());
    assert!(!store.is_loading());
}
