use super::*;
use crate::transcribe::{Pause, Segment};
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use tempfile::TempDir;

fn sample_results() -> BTreeMap<String, Transcript> {
    let mut results = BTreeMap::new();
    results.insert(
        "/data/A/waveform.wav".to_string(),
        Transcript {
            text: "hello world".to_string(),
            segments: Some(vec![Segment {
                text: "hello world".to_string(),
                start_s: 0.0,
                end_s: 1.2,
            }]),
            pauses: Some(vec![Pause {
                start_s: 0.4,
                end_s: 0.6,
            }]),
        },
    );
    results
}

#[tokio::test]
async fn test_save_local_writes_single_encoded_json() {
    let temp = TempDir::new().unwrap();
    let output = Location::Local(temp.path().to_path_buf());

    save_results(&sample_results(), &output, None).await.unwrap();

    let raw = std::fs::read_to_string(temp.path().join(RESULTS_FILENAME)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    // A JSON object keyed by input path, not a doubly-encoded string
    assert!(parsed.is_object());
    assert_eq!(
        parsed["/data/A/waveform.wav"]["text"],
        serde_json::json!("hello world")
    );
}

#[tokio::test]
async fn test_save_empty_results_is_valid() {
    let temp = TempDir::new().unwrap();
    let output = Location::Local(temp.path().to_path_buf());

    save_results(&BTreeMap::new(), &output, None).await.unwrap();

    let raw = std::fs::read_to_string(temp.path().join(RESULTS_FILENAME)).unwrap();
    assert_eq!(raw, "{}");
}

#[tokio::test]
async fn test_save_remote_uploads_under_prefix() {
    let store = InMemory::new();
    let output = Location::Remote("corpus/results".to_string());

    save_results(&sample_results(), &output, Some(&store))
        .await
        .unwrap();

    let bytes = store
        .get(&ObjectPath::from("corpus/results/ASR_results.json"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(parsed.is_object());
    assert!(parsed.get("/data/A/waveform.wav").is_some());
}

#[tokio::test]
async fn test_save_remote_without_store_is_error() {
    let output = Location::Remote("corpus/results".to_string());
    let result = save_results(&sample_results(), &output, None).await;
    assert!(result.is_err());
}
