#![forbid(unsafe_code)]

//! Bindings configured from files on disk.

use std::rc::Rc;

use newton::{
    ConfigError, ConnectConfig, ConnectError, ResubscribePolicy, Store, connect, raw_dispatch,
    whole_state,
};
use newton_harness::{MemoryStore, RecordingModule};

fn counter() -> Rc<MemoryStore<i64, i64>> {
    MemoryStore::new(0, |count: &i64, delta: i64| count + delta)
}

#[test]
fn toml_file_drives_binding_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.toml");
    std::fs::write(&path, "name = \"counter\"\nresubscribe = \"reject\"\n").unwrap();

    let config = ConnectConfig::load(&path).unwrap();
    let store = counter();
    let binding = connect(whole_state::<i64>, raw_dispatch::<i64>)
        .with_config(config)
        .bind::<RecordingModule<i64, i64>, _>(&store);

    assert_eq!(binding.label(), "counter");
    assert_eq!(binding.config().resubscribe, ResubscribePolicy::Reject);
    assert_eq!(
        binding.subscribe().unwrap_err(),
        ConnectError::AlreadySubscribed {
            binding: "counter".into()
        }
    );

    store.dispatch(3).unwrap();
    binding.with_instance(|m| assert_eq!(m.change_calls(), 1));
}

#[test]
fn json_file_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binding.json");
    std::fs::write(&path, "{}").unwrap();

    let config = ConnectConfig::load(&path).unwrap();
    assert_eq!(config, ConnectConfig::default());
}

#[test]
fn malformed_toml_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "resubscribe = \"sometimes\"\n").unwrap();

    let err = ConnectConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "got: {err}");
}
