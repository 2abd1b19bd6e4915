use southseas::{Snapshot, SnapshotError};

#[tokio::test]
async fn write_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("southseasprices.json");

    let snapshot = Snapshot::new([(13510, 48500), (2091, 0), (84041, 1_250_000)], 1763380800.5);
    snapshot.write(&path).await.unwrap();

    let loaded = Snapshot::read(&path).await.unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.price(84041), Some(1_250_000));
}

#[tokio::test]
async fn only_data_and_last_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("southseasprices.json");

    Snapshot::new([(1703, 7)], 1763380800.0)
        .write(&path)
        .await
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let object = raw.as_object().unwrap();

    assert_eq!(object.len(), 2);
    assert_eq!(raw["data"], serde_json::json!({"1703": 7}));
    assert!(raw["last_update"].is_f64());
}

#[tokio::test]
async fn overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("southseasprices.json");

    Snapshot::new([(1703, 7), (2091, 8)], 1.0)
        .write(&path)
        .await
        .unwrap();
    let newer = Snapshot::new([(2456, 9)], 2.0);
    newer.write(&path).await.unwrap();

    assert_eq!(Snapshot::read(&path).await.unwrap(), newer);

    // Nothing but the snapshot itself is left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("southseasprices.json")]);
}

#[tokio::test]
async fn write_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("southseasprices.json");

    let result = Snapshot::new([(1703, 7)], 1.0).write(&path).await;

    assert!(matches!(result, Err(SnapshotError::Io(_))));
}

#[tokio::test]
async fn read_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("southseasprices.json");
    std::fs::write(&path, "{\"data\": 5}").unwrap();

    let result = Snapshot::read(&path).await;

    assert!(matches!(result, Err(SnapshotError::Json(_))));
}
