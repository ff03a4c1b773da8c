//! End-to-end tests for collections over a directory of files

mod common;

use common::json_document;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use virtualcorpus::{
    CollectionConfig, CorpusError, DirectoryConfig, Document, Encoding, VirtualCollection,
};

fn seed(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(
            dir.join(format!("{}.json", name)),
            json_document(name, &format!("content of {}", name)),
        )
        .unwrap();
    }
}

fn open(config: DirectoryConfig) -> VirtualCollection {
    VirtualCollection::open(config.into()).unwrap()
}

#[test]
fn test_open_enumerates_files() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), &["c", "a", "b"]);
    let mut corpus = open(DirectoryConfig::new(dir.path()));

    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.index_of_name("b"), Some(1));
    let doc = corpus.get(0).unwrap();
    assert_eq!(doc.read().unwrap().name(), "a");
    assert_eq!(doc.read().unwrap().content(), "content of a");
}

#[test]
fn test_save_survives_reopen() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), &["a", "b"]);
    let config = DirectoryConfig::new(dir.path());

    let mut corpus = open(config.clone());
    let doc = corpus.get(1).unwrap();
    {
        let mut doc = doc.write().unwrap();
        doc.set_content("edited");
        doc.features_mut().insert("reviewed".into(), "yes".into());
    }
    corpus.save(&doc.read().unwrap()).unwrap();
    corpus.close();

    let mut reopened = open(config);
    let doc = reopened.get(1).unwrap();
    let doc = doc.read().unwrap();
    assert_eq!(doc.content(), "edited");
    assert_eq!(doc.feature("reviewed"), Some("yes"));
}

#[test]
fn test_add_and_remove_files() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), &["a"]);
    let mut corpus = open(DirectoryConfig::new(dir.path()));

    assert!(corpus.add(Document::new("b", "brand new").into_handle()).unwrap());
    assert!(dir.path().join("b.json").exists());
    assert_eq!(corpus.len(), 2);

    corpus.remove(0).unwrap();
    assert!(!dir.path().join("a.json").exists());
    assert_eq!(corpus.index_of_name("b"), Some(0));

    let mut reopened = open(DirectoryConfig::new(dir.path()));
    assert_eq!(reopened.names().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(reopened.get(0).unwrap().read().unwrap().content(), "brand new");
}

#[test]
fn test_add_outside_scan_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "plain a").unwrap();
    let filtered = DirectoryConfig::new(dir.path()).filter("*.txt");
    let mut corpus = open(filtered.clone());

    assert!(matches!(
        corpus.add(Document::new("b", "json file").into_handle()),
        Err(CorpusError::Configuration(_))
    ));
    assert!(matches!(
        corpus.add(Document::new("sub/c", "nested").into_handle()),
        Err(CorpusError::Configuration(_))
    ));
    assert_eq!(corpus.len(), 1);
    assert!(!dir.path().join("b.json").exists());
    assert!(!dir.path().join("sub").exists());

    let mut text = open(filtered.mime_type("text/plain"));
    assert!(text.add(Document::new("d", "plain d").into_handle()).unwrap());
    assert_eq!(text.len(), 2);

    let reopened = open(DirectoryConfig::new(dir.path()).filter("*.txt"));
    assert_eq!(reopened.names().collect::<Vec<_>>(), vec!["a", "d"]);
}

#[test]
fn test_read_only_directory() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), &["a", "b"]);
    let mut corpus = open(DirectoryConfig::new(dir.path()).read_only(true));
    assert!(corpus.is_read_only());

    let doc = corpus.get(0).unwrap();
    doc.write().unwrap().set_content("not persisted");
    corpus.save(&doc.read().unwrap()).unwrap();

    assert!(matches!(
        corpus.add(Document::new("c", "").into_handle()),
        Err(CorpusError::UnsupportedMutation(_))
    ));
    assert!(matches!(corpus.remove(1), Err(CorpusError::UnsupportedMutation(_))));
    assert_eq!(corpus.len(), 2);

    let mut fresh = open(DirectoryConfig::new(dir.path()));
    assert_eq!(fresh.get(0).unwrap().read().unwrap().content(), "content of a");
}

#[test]
fn test_plain_text_latin1_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("note.txt"), [b'n', 0xE9, b'e']).unwrap();
    let config = DirectoryConfig::new(dir.path())
        .mime_type("text/plain")
        .encoding(Encoding::Latin1)
        .filter("*.txt");
    let mut corpus = open(config);

    let doc = corpus.get(0).unwrap();
    assert_eq!(doc.read().unwrap().content(), "née");

    doc.write().unwrap().set_content("café");
    corpus.save(&doc.read().unwrap()).unwrap();
    assert_eq!(
        fs::read(dir.path().join("note.txt")).unwrap(),
        vec![b'c', b'a', b'f', 0xE9]
    );
}

#[test]
fn test_deleted_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), &["a", "b"]);
    let mut corpus = open(DirectoryConfig::new(dir.path()));

    fs::remove_file(dir.path().join("a.json")).unwrap();
    assert!(matches!(corpus.get(0), Err(CorpusError::NotFound(_))));
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.name_at(0).unwrap(), "a");
}

#[test]
fn test_iteration_and_identity() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), &["x", "y"]);
    let mut corpus = open(DirectoryConfig::new(dir.path()));

    let handles: Vec<_> = corpus.iter().map(|doc| doc.unwrap()).collect();
    assert_eq!(handles.len(), 2);
    for (i, handle) in handles.iter().enumerate() {
        assert!(Arc::ptr_eq(handle, &corpus.get(i).unwrap()));
    }
}

#[test]
fn test_reopen_from_saved_config() {
    let dir = TempDir::new().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    seed(&docs, &["a"]);

    let corpus = open(DirectoryConfig::new(&docs).recursive(true));
    let config_path = dir.path().join("corpus.json");
    corpus.config().unwrap().save_to(&config_path).unwrap();
    corpus.close();

    let config = CollectionConfig::load_from(&config_path).unwrap();
    let mut reopened = VirtualCollection::open(config).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.loaded_count(), 0);
    assert_eq!(reopened.get(0).unwrap().read().unwrap().content(), "content of a");
}

#[test]
fn test_open_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        VirtualCollection::open(DirectoryConfig::new(dir.path().join("missing")).into()),
        Err(CorpusError::Configuration(_))
    ));
    assert!(matches!(
        VirtualCollection::open(DirectoryConfig::new(dir.path()).mime_type("image/gif").into()),
        Err(CorpusError::Configuration(_))
    ));
}
