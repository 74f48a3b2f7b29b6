//! Integration tests for the encrypted config store.
//!
//! Each test uses its own TempDir so tests can run in parallel.

use push_tester::store::kv::KvStore;
use push_tester::store::STORE_FILE_NAME;
use push_tester::{PersistedConfig, PushSubscriptionTarget, SecureConfigStore, VapidIdentity};
use serde_json::json;
use tempfile::TempDir;

fn full_config() -> PersistedConfig {
    PersistedConfig {
        vapid: Some(VapidIdentity::new(
            "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U",
            "UUxI4O8-FbRouAevSmBQ6o18hgE4nSG3qwvJTfKc-ls",
            "mailto:tester@example.com",
        )),
        last_subscription: Some(PushSubscriptionTarget::new(
            "https://fcm.googleapis.com/fcm/send/abc123",
            "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM",
            "tBHItJI5svbpez7KI4CCXg",
        )),
    }
}

/// Rewrite the stored private key, leaving the rest of the record intact.
fn tamper_private_key(dir: &TempDir, value: &str) {
    let kv = KvStore::new(dir.path().join(STORE_FILE_NAME));
    let mut record = kv.get("config").unwrap().unwrap();
    record["vapid"]["privateKey"] = json!(value);
    kv.set("config", record).unwrap();
}

#[test]
fn test_save_then_load_in_a_new_store_instance() {
    let dir = TempDir::new().unwrap();
    SecureConfigStore::open(dir.path()).save(&full_config()).unwrap();

    let loaded = SecureConfigStore::open(dir.path()).load();
    assert_eq!(loaded, full_config());
}

#[test]
fn test_file_layout_matches_browser_storage_shape() {
    let dir = TempDir::new().unwrap();
    SecureConfigStore::open(dir.path()).save(&full_config()).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(STORE_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value["config"];

    assert_eq!(record["vapid"]["subject"], "mailto:tester@example.com");
    assert_eq!(record["lastSubscription"]["keys"]["auth"], "tBHItJI5svbpez7KI4CCXg");
    let stored_key = record["vapid"]["privateKey"].as_str().unwrap();
    assert!(stored_key.contains(':'));
    assert!(!raw.contains("UUxI4O8-FbRouAevSmBQ6o18hgE4nSG3qwvJTfKc-ls"));
}

#[test]
fn test_save_replaces_record_wholesale() {
    let dir = TempDir::new().unwrap();
    let store = SecureConfigStore::open(dir.path());
    store.save(&full_config()).unwrap();

    let only_subscription = PersistedConfig {
        vapid: None,
        last_subscription: full_config().last_subscription,
    };
    store.save(&only_subscription).unwrap();

    let loaded = store.load();
    assert!(loaded.vapid.is_none());
    assert_eq!(loaded.last_subscription, full_config().last_subscription);
}

#[test]
fn test_truncated_ciphertext_resets_store() {
    let dir = TempDir::new().unwrap();
    let store = SecureConfigStore::open(dir.path());
    store.save(&full_config()).unwrap();

    let kv = KvStore::new(dir.path().join(STORE_FILE_NAME));
    let stored = kv.get("config").unwrap().unwrap()["vapid"]["privateKey"]
        .as_str()
        .unwrap()
        .to_string();
    tamper_private_key(&dir, &stored[..stored.len() - 4]);

    assert_eq!(store.load(), PersistedConfig::default());
    // The bad record is gone, so the next load is a clean first run.
    assert!(kv.get("config").unwrap().is_none());
    assert_eq!(store.load(), PersistedConfig::default());
}

#[test]
fn test_private_key_without_separator_resets_store() {
    let dir = TempDir::new().unwrap();
    let store = SecureConfigStore::open(dir.path());
    store.save(&full_config()).unwrap();

    tamper_private_key(&dir, "deadbeefdeadbeef");

    let loaded = store.load();
    assert!(loaded.is_empty());
}

#[test]
fn test_plaintext_private_key_is_not_returned() {
    let dir = TempDir::new().unwrap();
    let store = SecureConfigStore::open(dir.path());
    store.save(&full_config()).unwrap();

    tamper_private_key(&dir, "UUxI4O8-FbRouAevSmBQ6o18hgE4nSG3qwvJTfKc-ls");

    assert!(store.load().vapid.is_none());
}

#[test]
fn test_wrong_shape_record_resets_store() {
    let dir = TempDir::new().unwrap();
    let kv = KvStore::new(dir.path().join(STORE_FILE_NAME));
    kv.set("config", json!({ "vapid": "not-an-object" })).unwrap();

    let store = SecureConfigStore::open(dir.path());
    assert_eq!(store.load(), PersistedConfig::default());
    assert!(kv.get("config").unwrap().is_none());
}

#[test]
fn test_corrupt_file_loads_empty_and_store_recovers() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(STORE_FILE_NAME), "{ not json").unwrap();

    let store = SecureConfigStore::open(dir.path());
    assert!(store.load().is_empty());

    store.save(&full_config()).unwrap();
    assert_eq!(store.load(), full_config());
}

#[test]
fn test_clear_removes_saved_config() {
    let dir = TempDir::new().unwrap();
    let store = SecureConfigStore::open(dir.path());
    store.save(&full_config()).unwrap();

    store.clear().unwrap();
    assert!(store.load().is_empty());
}

#[cfg(unix)]
#[test]
fn test_store_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    SecureConfigStore::open(dir.path()).save(&full_config()).unwrap();

    let mode = std::fs::metadata(dir.path().join(STORE_FILE_NAME))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_concurrent_saves_leave_one_whole_record() {
    const WRITERS: usize = 8;

    let dir = TempDir::new().unwrap();
    let records: Vec<PersistedConfig> = (0..WRITERS)
        .map(|i| PersistedConfig {
            vapid: Some(VapidIdentity::new(
                format!("public-{i}"),
                format!("private-{i}"),
                format!("mailto:writer{i}@example.com"),
            )),
            last_subscription: Some(PushSubscriptionTarget::new(
                format!("https://push.example.com/{i}"),
                format!("p256dh-{i}"),
                format!("auth-{i}"),
            )),
        })
        .collect();

    std::thread::scope(|scope| {
        for record in &records {
            let path = dir.path();
            scope.spawn(move || {
                for _ in 0..5 {
                    SecureConfigStore::open(path).save(record).unwrap();
                }
            });
        }
    });

    let loaded = SecureConfigStore::open(dir.path()).load();
    assert!(!loaded.is_empty(), "record was reset instead of loaded");
    assert!(records.contains(&loaded), "loaded a mix of writers: {loaded:?}");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}
