use markup_history::{HistoryConfig, HistoryManager, KeyValueStore, MarkupBuffer, TextWidget};
use markup_history_store::{JsonFileStore, StoreError};
use pretty_assertions::assert_eq;

#[test]
fn test_missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("history.json")).unwrap();
    assert!(store.entries().is_empty());
    assert!(!store.is_dirty());
}

#[test]
fn test_flush_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let mut store = JsonFileStore::open(&path).unwrap();
    store.put_int("doc.size", 2);
    store.put_string("doc.0.after", "<p>é</p>");
    assert!(store.is_dirty());
    store.flush().unwrap();
    assert!(!store.is_dirty());

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get_int("doc.size"), Some(2));
    assert_eq!(
        reopened.get_string("doc.0.after").as_deref(),
        Some("<p>é</p>")
    );
    assert!(!dir.path().join("history.json.tmp").exists());
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
}

#[test]
fn test_history_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let text = {
        let mut manager =
            HistoryManager::with_config(MarkupBuffer::new("<p></p>"), HistoryConfig::unbatched());
        manager.edit(3, 3, "hello").unwrap();
        manager.edit(8, 8, " world").unwrap();

        let mut store = JsonFileStore::open(&path).unwrap();
        manager.store(&mut store, "doc");
        store.flush().unwrap();
        manager.widget().text()
    };

    let store = JsonFileStore::open(&path).unwrap();
    let mut manager =
        HistoryManager::with_config(MarkupBuffer::new(&text), HistoryConfig::unbatched());
    assert!(manager.restore(&store, "doc"));
    assert_eq!(manager.history().len(), 2);

    assert!(manager.undo());
    assert_eq!(manager.widget().text(), "<p>hello</p>");
    assert!(manager.undo());
    assert_eq!(manager.widget().text(), "<p></p>");
    assert!(!manager.undo());

    // Restoring onto different content is refused.
    let mut other = HistoryManager::new(MarkupBuffer::new("<p>changed</p>"));
    assert!(!other.restore(&store, "doc"));
    assert!(!other.can_undo());
}
