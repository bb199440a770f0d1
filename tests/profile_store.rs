//! Profile persistence tests.
//!
//! Run with `cargo test --test profile_store`.

use std::fs;
use tempfile::tempdir;
use tokio_test::{assert_err, assert_ok};

use tower_clash_server::game::scoring::Verdict;
use tower_clash_server::store::{ProfileStore, StoreError};

#[test]
fn missing_file_starts_empty() {
    let dir = tempdir().unwrap();
    let store = assert_ok!(ProfileStore::load(&dir.path().join("players.json")));
    assert!(store.profiles().is_empty());
}

#[test]
fn outcomes_accumulate_and_survive_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("players.json");

    let mut store = ProfileStore::load(&path).unwrap();
    let [win, loss] = Verdict::Winner(0).outcomes();
    store.record_outcome("alice", &win);
    store.record_outcome("bob", &loss);
    let [draw, _] = Verdict::Draw.outcomes();
    store.record_outcome("alice", &draw);
    assert_ok!(store.save());

    let reloaded = ProfileStore::load(&path).unwrap();
    let alice = reloaded.get("alice").unwrap();
    assert_eq!(alice.exp, 40);
    assert_eq!(alice.matches_played, 2);
    assert!(alice.last_played.is_some());
    assert_eq!(reloaded.get("bob").unwrap().exp, 5);
    assert!(reloaded.get("carol").is_none());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("players.json");
    fs::write(&path, "{ not json").unwrap();

    let err = assert_err!(ProfileStore::load(&path));
    assert!(matches!(err, StoreError::Decode { .. }));
}

#[test]
fn profiles_without_history_fields_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("players.json");
    fs::write(&path, r#"[{ "username": "dave" }]"#).unwrap();

    let store = ProfileStore::load(&path).unwrap();
    let dave = store.get("dave").unwrap();
    assert_eq!(dave.exp, 0);
    assert!(dave.last_played.is_none());
}
