// =========================
// tests/unit/store_tests.rs
// =========================
//! Behaviour every `UserStore` backend must share
use luxe_backend::store::{FlatFileUserStore, MemoryUserStore, NewUser, StoreError, UserStore};
use luxe_common::UserRole;
use std::sync::Arc;
use tempfile::TempDir;

fn new_user(email: &str, role: UserRole) -> NewUser {
    NewUser {
        name: "Concierge".into(),
        email: email.into(),
        password_hash: Some("$scrypt$placeholder".into()),
        role,
        google_id: None,
    }
}

async fn check_contract(store: Arc<dyn UserStore>) {
    assert_eq!(store.count().await.unwrap(), 0);

    let admin = store
        .insert(new_user(" Boss@Example.com", UserRole::Admin))
        .await
        .unwrap();
    assert_eq!(admin.email, "boss@example.com");
    assert_eq!(admin.role, UserRole::Admin);

    let found = store.find_by_email("boss@EXAMPLE.com").await.unwrap().unwrap();
    assert_eq!(found.id, admin.id);
    assert_eq!(store.find_by_id(admin.id).await.unwrap().unwrap().email, admin.email);

    let dup = store.insert(new_user("boss@example.com", UserRole::User)).await;
    assert!(matches!(dup, Err(StoreError::Duplicate(_))));

    store.insert(new_user("crew@example.com", UserRole::User)).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_memory_store_contract() {
    check_contract(Arc::new(MemoryUserStore::new())).await;
}

#[tokio::test]
async fn test_flat_file_store_contract() {
    let dir = TempDir::new().unwrap();
    check_contract(Arc::new(FlatFileUserStore::new(dir.path()).unwrap())).await;
}

#[tokio::test]
async fn test_flat_file_layout() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileUserStore::new(dir.path()).unwrap();
    let user = store.insert(new_user("crew@example.com", UserRole::User)).await.unwrap();

    let record_path = dir.path().join("users").join(format!("{}.json", user.id));
    let raw = std::fs::read_to_string(record_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["email"], "crew@example.com");
    assert_eq!(json["passwordHash"], "$scrypt$placeholder");

    let index_entries = std::fs::read_dir(dir.path().join("users").join("by-email"))
        .unwrap()
        .count();
    assert_eq!(index_entries, 1);
}
