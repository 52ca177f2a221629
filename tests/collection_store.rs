mod common;

use common::{ids, setup_test_env};
use mod_collector_lib::core::collection_store::{CollectionStore, JsonCollectionStore};
use mod_collector_lib::models::error::SError;
use mod_collector_lib::models::mod_dto::ModRecord;
use mod_collector_lib::models::paths::DataPathRules;

#[tokio::test]
async fn create_save_and_reload() {
    let (_tmp, _, data) = setup_test_env();
    let path = DataPathRules::new(&data).collections;
    let store = JsonCollectionStore::new(&path);

    let created = store.create_collection("  ").await.unwrap();
    assert_eq!(created.name, "My Collection");
    assert!(store.load_collection(&created.id).await.unwrap().is_empty());

    let items = vec![ModRecord::new("A").with_category("Maps"), ModRecord::new("B").with_version("1.0")];
    store.save_collection(&created.id, &items).await.unwrap();

    let reopened = JsonCollectionStore::new(&path);
    let loaded = reopened.load_collection(&created.id).await.unwrap();
    assert_eq!(loaded, items);

    let listed = reopened.list_collections().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].revision, 2);
    assert!(listed[0].updated_at >= listed[0].created_at);
}

#[tokio::test]
async fn stale_writer_gets_a_conflict() {
    let (_tmp, _, data) = setup_test_env();
    let path = data.join("collections.json");
    let first = JsonCollectionStore::new(&path);
    let second = JsonCollectionStore::new(&path);

    let id = first.create_collection("Server").await.unwrap().id;
    second.load_collection(&id).await.unwrap();

    first.save_collection(&id, &[ModRecord::new("A")]).await.unwrap();
    let err = second.save_collection(&id, &[ModRecord::new("B")]).await.unwrap_err();
    assert_eq!(err, SError::PersistenceConflict(id.clone()));

    // Reloading picks up the newer revision and the save goes through.
    let current = second.load_collection(&id).await.unwrap();
    assert_eq!(ids(&current), ["A"]);
    second.save_collection(&id, &[ModRecord::new("A"), ModRecord::new("B")]).await.unwrap();
    assert_eq!(first.load_collection(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (_tmp, _, data) = setup_test_env();
    let store = JsonCollectionStore::new(&data.join("collections.json"));

    assert_eq!(
        store.load_collection("nope").await.unwrap_err(),
        SError::NotFound("nope".into())
    );
    assert!(store.delete_collection("nope").await.is_err());

    let id = store.create_collection("Temp").await.unwrap().id;
    store.delete_collection(&id).await.unwrap();
    assert!(store.list_collections().await.unwrap().is_empty());
}
