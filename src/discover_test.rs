use super::*;
use object_store::PutPayload;
use object_store::memory::InMemory;
use tempfile::TempDir;

#[test]
fn test_scan_local_one_level_only() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::create_dir(root.join("A")).unwrap();
    std::fs::write(root.join("A").join(AUDIO_FILENAME), b"wav").unwrap();
    std::fs::create_dir(root.join("B")).unwrap();
    std::fs::write(root.join("B").join("other.wav"), b"wav").unwrap();
    // Too deep: two levels below the root
    std::fs::create_dir_all(root.join("C").join("D")).unwrap();
    std::fs::write(root.join("C").join("D").join(AUDIO_FILENAME), b"wav").unwrap();
    // At the root itself, not one level down
    std::fs::write(root.join(AUDIO_FILENAME), b"wav").unwrap();

    let found = scan_local(root).unwrap();
    assert_eq!(found, vec![root.join("A").join(AUDIO_FILENAME)]);
}

#[test]
fn test_scan_local_empty_is_ok() {
    let temp = TempDir::new().unwrap();
    assert!(scan_local(temp.path()).unwrap().is_empty());
}

#[test]
fn test_scan_local_missing_root_is_error() {
    let temp = TempDir::new().unwrap();
    assert!(scan_local(&temp.path().join("nope")).is_err());
}

#[tokio::test]
async fn test_search_store_matches_filename_at_any_depth() {
    let store = InMemory::new();
    for key in [
        "corpus/s1/waveform.wav",
        "corpus/s2/nested/waveform.wav",
        "corpus/s3/other.wav",
        "elsewhere/waveform.wav",
    ] {
        store
            .put(&ObjectPath::from(key), PutPayload::from(b"wav".to_vec()))
            .await
            .unwrap();
    }

    let mut found = search_store(&store, "corpus").await.unwrap();
    found.sort();
    assert_eq!(
        found,
        vec![
            "corpus/s1/waveform.wav".to_string(),
            "corpus/s2/nested/waveform.wav".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_search_store_empty_prefix_is_ok() {
    let store = InMemory::new();
    assert!(search_store(&store, "corpus").await.unwrap().is_empty());
}
