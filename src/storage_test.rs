use super::*;
use object_store::memory::InMemory;
use tempfile::TempDir;

#[tokio::test]
async fn test_upload_then_download_roundtrip() {
    let store = InMemory::new();
    let temp = TempDir::new().unwrap();

    let source = temp.path().join("results.json");
    std::fs::write(&source, br#"{"ok":true}"#).unwrap();
    upload_file(&store, &source, "out/results.json").await.unwrap();

    let dest = temp.path().join("copy.json");
    download_object(&store, &ObjectPath::from("out/results.json"), &dest)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), br#"{"ok":true}"#);
}

#[tokio::test]
async fn test_upload_missing_file_is_error() {
    let store = InMemory::new();
    let temp = TempDir::new().unwrap();
    let result = upload_file(&store, &temp.path().join("nope"), "out/nope").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_download_missing_object_is_error() {
    let store = InMemory::new();
    let temp = TempDir::new().unwrap();
    let result =
        download_object(&store, &ObjectPath::from("missing"), &temp.path().join("f")).await;
    assert!(result.is_err());
}
