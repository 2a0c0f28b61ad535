/// Tests for the local storage backend: round trips, sharded paths,
/// range reads, and idempotent deletion.
use futures::TryStreamExt;
use wellspring::storage::{local::LocalStorage, StorageBackend, StorageError};

async fn read_body(object: wellspring::storage::StorageObject) -> Vec<u8> {
    let mut body = object.body;
    let mut out = Vec::new();
    while let Some(chunk) = body.try_next().await.expect("stream read failed") {
        out.extend_from_slice(&chunk);
    }
    out
}

#[actix_rt::test]
async fn test_put_then_get_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let storage = LocalStorage::new(dir.path().to_path_buf()).expect("init failed");

    let data = b"not actually a jpeg".to_vec();
    storage
        .put_object(data.clone(), "abcdef123456.jpg")
        .await
        .expect("put failed");

    assert!(storage.exists("abcdef123456.jpg").await.expect("exists failed"));

    let object = storage
        .get_object("abcdef123456.jpg", None)
        .await
        .expect("get failed");
    assert_eq!(object.content_length, Some(data.len() as i64));
    assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(read_body(object).await, data);

    // Files are sharded into two levels of prefix directories.
    assert!(dir.path().join("ab").join("cd").join("abcdef123456.jpg").exists());
}

#[actix_rt::test]
async fn test_missing_file_reports_not_found() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let storage = LocalStorage::new(dir.path().to_path_buf()).expect("init failed");

    assert!(!storage.exists("nothere.png").await.expect("exists failed"));

    let result = storage.get_object("nothere.png", None).await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[actix_rt::test]
async fn test_range_request_returns_partial_content() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let storage = LocalStorage::new(dir.path().to_path_buf()).expect("init failed");

    storage
        .put_object(b"0123456789".to_vec(), "ranged-file.png")
        .await
        .expect("put failed");

    let object = storage
        .get_object("ranged-file.png", Some("bytes=2-5".to_string()))
        .await
        .expect("get failed");
    assert_eq!(object.content_range.as_deref(), Some("bytes 2-5/10"));
    assert_eq!(read_body(object).await, b"2345".to_vec());

    // Open-ended suffix range.
    let object = storage
        .get_object("ranged-file.png", Some("bytes=7-".to_string()))
        .await
        .expect("get failed");
    assert_eq!(read_body(object).await, b"789".to_vec());

    // Out of bounds is an invalid range, not an empty body.
    let result = storage
        .get_object("ranged-file.png", Some("bytes=42-50".to_string()))
        .await;
    assert!(matches!(result, Err(StorageError::InvalidRange(_))));
}

#[actix_rt::test]
async fn test_delete_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let storage = LocalStorage::new(dir.path().to_path_buf()).expect("init failed");

    storage
        .put_object(b"bytes".to_vec(), "deleteme0123.gif")
        .await
        .expect("put failed");
    assert!(storage.exists("deleteme0123.gif").await.expect("exists failed"));

    storage
        .delete_object("deleteme0123.gif")
        .await
        .expect("delete failed");
    assert!(!storage.exists("deleteme0123.gif").await.expect("exists failed"));

    // Deleting a missing file is not an error.
    storage
        .delete_object("deleteme0123.gif")
        .await
        .expect("second delete failed");
}
