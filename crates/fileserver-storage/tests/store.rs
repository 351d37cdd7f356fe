use fileserver_storage::{Error, FileStore};
use tokio::io::AsyncReadExt;

fn store() -> (tempfile::TempDir, FileStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("files"), dir.path().join("tmp"));
    (dir, store)
}

#[tokio::test]
async fn test_init_creates_dirs() {
    let (dir, store) = store();
    store.init().await.unwrap();
    assert!(dir.path().join("files").is_dir());
    assert!(dir.path().join("tmp").is_dir());
}

#[tokio::test]
async fn test_chunked_assembly() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    store.write_chunk("up1", 0, b"hello ").await.unwrap();
    store.write_chunk("up1", 1, b"world").await.unwrap();

    let blob = store.assemble("up1", 2, 11, "abcd1234").await.unwrap();
    assert_eq!(blob.size, 11);
    assert_eq!(blob.rel_path, "ab/cd/abcd1234");
    // sha256("hello world")
    assert_eq!(
        blob.sha256,
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );

    let mut file = store.open(&blob.rel_path).await.unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).await.unwrap();
    assert_eq!(content, "hello world");
}

#[tokio::test]
async fn test_chunks_assemble_in_index_order() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    // Written out of order
    store.write_chunk("up2", 1, b"B").await.unwrap();
    store.write_chunk("up2", 0, b"A").await.unwrap();
    store.write_chunk("up2", 2, b"C").await.unwrap();

    let blob = store.assemble("up2", 3, 3, "feed0000").await.unwrap();
    let mut file = store.open(&blob.rel_path).await.unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).await.unwrap();
    assert_eq!(content, "ABC");
}

#[tokio::test]
async fn test_assemble_missing_chunk() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    store.write_chunk("up3", 0, b"only").await.unwrap();

    let err = store.assemble("up3", 2, 8, "dead0000").await.unwrap_err();
    assert!(matches!(err, Error::ChunkMissing { index: 1 }));
    // Nothing landed under the root
    assert!(store.open("de/ad/dead0000").await.is_err());
}

#[tokio::test]
async fn test_assemble_size_mismatch() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    store.write_chunk("up4", 0, b"short").await.unwrap();

    let err = store.assemble("up4", 1, 100, "beef0000").await.unwrap_err();
    assert!(matches!(
        err,
        Error::SizeMismatch {
            expected: 100,
            actual: 5
        }
    ));
}

#[tokio::test]
async fn test_chunk_rewrite_is_atomic_overwrite() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    store.write_chunk("up5", 0, b"first").await.unwrap();
    store.write_chunk("up5", 0, b"retry").await.unwrap();

    assert_eq!(store.chunk_len("up5", 0).await.unwrap(), Some(5));
    let blob = store.assemble("up5", 1, 5, "0011aabb").await.unwrap();
    let mut content = String::new();
    store
        .open(&blob.rel_path)
        .await
        .unwrap()
        .read_to_string(&mut content)
        .await
        .unwrap();
    assert_eq!(content, "retry");
}

#[tokio::test]
async fn test_whole_file_writer() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    let mut writer = store.begin_whole("cafe0000").await.unwrap();
    writer.write(b"hello ").await.unwrap();
    writer.write(b"world").await.unwrap();
    assert_eq!(writer.written(), 11);

    let blob = writer.finish().await.unwrap();
    assert_eq!(blob.size, 11);
    assert_eq!(
        blob.sha256,
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    assert!(store.open(&blob.rel_path).await.is_ok());
}

#[tokio::test]
async fn test_whole_file_abort_leaves_nothing() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    let mut writer = store.begin_whole("f00d0000").await.unwrap();
    writer.write(b"partial").await.unwrap();
    writer.abort().await.unwrap();

    assert!(store.open("f0/0d/f00d0000").await.is_err());
}

#[tokio::test]
async fn test_remove_and_session_dirs() {
    let (_dir, store) = store();
    store.init().await.unwrap();

    store.write_chunk("sess-a", 0, b"x").await.unwrap();
    store.write_chunk("sess-b", 0, b"y").await.unwrap();

    let mut dirs = store.list_session_dirs().await.unwrap();
    dirs.sort();
    assert_eq!(dirs, vec!["sess-a".to_string(), "sess-b".to_string()]);

    store.remove_session_dir("sess-a").await.unwrap();
    assert_eq!(store.list_session_dirs().await.unwrap(), vec!["sess-b"]);

    // Removing again is fine
    store.remove_session_dir("sess-a").await.unwrap();

    let blob = store.assemble("sess-b", 1, 1, "11223344").await.unwrap();
    store.remove(&blob.rel_path).await.unwrap();
    assert!(store.open(&blob.rel_path).await.is_err());
    store.remove(&blob.rel_path).await.unwrap();
}
