//! End-to-end scenarios across the engine and the HTTP surface.

use moonlight_core::{Permission, Registry, Store, StoreConfig};
use moonlight_server::{MoonlightServer, Request};
use moonlight_testkit::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn users_walkthrough() {
    let test_store = TestStore::new("users");

    let id = test_store.push(json!({"name": "Ann", "age": 30})).unwrap();
    let found = test_store.get(&json!({"name": "Ann"})).unwrap();
    assert_eq!(found, vec![record(json!({"id": id, "name": "Ann", "age": 30}))]);

    assert_eq!(test_store.update(json!({"id": id, "age": 31})).unwrap(), id);
    let removed = test_store.delete(id).unwrap();
    assert_eq!(removed, record(json!({"id": id, "name": "Ann", "age": 31})));
    assert!(test_store.all().unwrap().is_empty());

    let text = String::from_utf8(test_store.file_bytes()).unwrap();
    assert_eq!(text, "{\n    \"data\": []\n}\n");
}

#[test]
fn activity_log_records_operations() {
    let test_store = TestStore::new("audited");
    test_store.push(json!({"a": 1})).unwrap();
    let _ = test_store.push(json!({}));
    let _ = test_store.get(&json!({"a": 2}));

    let log = std::fs::read_to_string(&test_store.paths().log).unwrap();
    assert!(log.contains("<INFO> -> connected to database"));
    assert!(log.contains("<SUCCESS>"));
    assert!(log.contains("<ERROR>"));
    assert!(log.contains("<WARNING>"));
}

#[test]
fn registry_tracks_collections_across_drop() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::new(temp.path());
    let registry = Arc::new(Registry::open(&config.registry_path()).unwrap());

    let store = Store::open_with_catalog("orders", &config, registry.clone(), "ann").unwrap();
    assert_eq!(registry.collections().unwrap().len(), 1);

    store.drop_collection().unwrap();
    assert!(registry.collections().unwrap().is_empty());

    store.push(json!({"sku": "X1"})).unwrap();
    let info = registry.collection_by_name("orders").unwrap().unwrap();
    assert_eq!(info.author, "ann");
}

#[tokio::test]
async fn http_walkthrough() {
    let temp = TempDir::new().unwrap();
    let server = MoonlightServer::open(StoreConfig::new(temp.path())).unwrap();
    server
        .registry()
        .create_user("root", "secret", Permission::Administrator)
        .unwrap();

    let res = server
        .handle(Request::post(
            "/auth",
            json!({"username": "root", "password": "secret"}),
        ))
        .await;
    let token = res.body["data"]["token"].as_str().unwrap().to_string();

    let res = server
        .handle(Request::post("/create", json!({"name": "users"})).with_token(&token))
        .await;
    assert_eq!(res.status, 201);
    let db = res.body["data"]["id"].as_i64().unwrap();

    let res = server
        .handle(Request::post(format!("/{db}/push"), json!({"name": "Ann", "age": 30})).with_token(&token))
        .await;
    let id = res.body["data"]["id"].as_i64().unwrap();

    // The HTTP surface and a direct handle see the same file.
    let direct = Store::open("users", &StoreConfig::new(temp.path())).unwrap();
    assert_eq!(direct.count("name", json!("Ann")).unwrap(), 1);

    let res = server
        .handle(
            Request::get(format!("/{db}/delete"))
                .with_query("id", id.to_string())
                .with_token(&token),
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["data"]["name"], "Ann");

    let res = server
        .handle(Request::get(format!("/{db}/drop")).with_token(&token))
        .await;
    assert_eq!(res.status, 200);
    assert!(!temp.path().join("databases").join("users.json").exists());
}
