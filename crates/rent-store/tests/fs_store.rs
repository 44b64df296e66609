use std::fs;
use std::path::Path;

use rent_core::{ArtifactRef, ArtifactStore, PublishRequest, StoreError};
use rent_store::FsArtifactStore;
use serde_json::json;

fn publish(store: &mut FsArtifactStore, scratch: &Path, name: &str, ty: &str, body: &str, lineage: Vec<ArtifactRef>)
           -> rent_core::ArtifactHandle {
    let file = scratch.join(name);
    fs::write(&file, body).unwrap();
    store.publish(PublishRequest { project: "nyc_airbnb".into(),
                                   name: name.into(),
                                   artifact_type: ty.into(),
                                   description: "fixture".into(),
                                   file,
                                   lineage,
                                   metadata: json!({"rows": 1}) })
         .expect("publish")
}

#[test]
fn every_publish_creates_a_new_immutable_version() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut store = FsArtifactStore::new(root.path());

    let v0 = publish(&mut store, scratch.path(), "sample.csv", "raw_data", "price\n50\n", vec![]);
    let v1 = publish(&mut store, scratch.path(), "sample.csv", "raw_data", "price\n60\n", vec![]);
    assert_eq!((v0.version, v1.version), (0, 1));
    assert_ne!(v0.digest, v1.digest);
    assert_eq!(v0.digest.len(), 64);

    let latest = store.fetch(&"nyc_airbnb/sample.csv:latest".parse().unwrap()).unwrap();
    assert_eq!(latest.handle.version, 1);
    assert_eq!(fs::read_to_string(&latest.path).unwrap(), "price\n60\n");

    let first = store.fetch(&"nyc_airbnb/sample.csv:v0".parse().unwrap()).unwrap();
    assert_eq!(fs::read_to_string(&first.path).unwrap(), "price\n50\n");
    assert_eq!(store.versions("nyc_airbnb", "sample.csv").unwrap().len(), 2);
}

#[test]
fn fetch_reports_missing_artifacts_and_versions() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut store = FsArtifactStore::new(root.path());
    let missing: ArtifactRef = "nyc_airbnb/clean_data.csv:latest".parse().unwrap();
    assert!(matches!(store.fetch(&missing), Err(StoreError::NotFound(_))));

    publish(&mut store, scratch.path(), "clean_data.csv", "clean_data", "price\n50\n", vec![]);
    let no_ref: ArtifactRef = "nyc_airbnb/clean_data.csv:reference".parse().unwrap();
    assert!(matches!(store.fetch(&no_ref), Err(StoreError::NotFound(_))));
    let no_version: ArtifactRef = "nyc_airbnb/clean_data.csv:v9".parse().unwrap();
    assert!(matches!(store.fetch(&no_version), Err(StoreError::NotFound(_))));
    assert!(store.versions("nyc_airbnb", "nothing").unwrap().is_empty());
}

#[test]
fn publishing_under_another_type_is_a_conflict() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut store = FsArtifactStore::new(root.path());
    publish(&mut store, scratch.path(), "clean_data.csv", "clean_data", "price\n", vec![]);

    let file = scratch.path().join("clean_data.csv");
    let err = store.publish(PublishRequest { project: "nyc_airbnb".into(),
                                             name: "clean_data.csv".into(),
                                             artifact_type: "raw_data".into(),
                                             description: String::new(),
                                             file,
                                             lineage: vec![],
                                             metadata: json!(null) })
                   .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.versions("nyc_airbnb", "clean_data.csv").unwrap().len(), 1);
}

#[test]
fn lineage_and_aliases_survive_reopening_the_store() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    {
        let mut store = FsArtifactStore::new(root.path());
        let raw = publish(&mut store, scratch.path(), "sample.csv", "raw_data", "price\n50\n", vec![]);
        publish(&mut store, scratch.path(), "clean_data.csv", "clean_data", "price\n50\n", vec![raw.pinned()]);
        publish(&mut store, scratch.path(), "clean_data.csv", "clean_data", "price\n51\n", vec![raw.pinned()]);
        let promoted = store.promote(&"nyc_airbnb/clean_data.csv:v0".parse().unwrap(), "reference").unwrap();
        assert_eq!(promoted.aliases, vec!["reference".to_string()]);
    }

    let mut store = FsArtifactStore::new(root.path());
    let reference = store.fetch(&"nyc_airbnb/clean_data.csv:reference".parse().unwrap()).unwrap();
    assert_eq!(reference.handle.version, 0);
    let lineage = store.lineage(&"nyc_airbnb/clean_data.csv:latest".parse().unwrap()).unwrap();
    assert_eq!(lineage, vec!["nyc_airbnb/sample.csv:v0".parse::<ArtifactRef>().unwrap()]);

    // mover el alias lo quita de la versión anterior
    store.promote(&"nyc_airbnb/clean_data.csv:latest".parse().unwrap(), "reference").unwrap();
    let reference = store.fetch(&"nyc_airbnb/clean_data.csv:reference".parse().unwrap()).unwrap();
    assert_eq!(reference.handle.version, 1);
}

#[test]
fn failed_publish_does_not_block_the_next_one() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut store = FsArtifactStore::new(root.path());

    let err = store.publish(PublishRequest { project: "nyc_airbnb".into(),
                                             name: "clean_data.csv".into(),
                                             artifact_type: "clean_data".into(),
                                             description: String::new(),
                                             file: scratch.path().join("missing.csv"),
                                             lineage: vec![],
                                             metadata: json!(null) })
                   .unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    let artifact_dir = root.path().join("nyc_airbnb/clean_data.csv");
    assert!(!artifact_dir.join("v0").exists());
    assert!(!artifact_dir.join(".v0.partial").exists());

    let v0 = publish(&mut store, scratch.path(), "clean_data.csv", "clean_data", "price\n50\n", vec![]);
    assert_eq!(v0.version, 0);
    let fetched = store.fetch(&"nyc_airbnb/clean_data.csv:v0".parse().unwrap()).unwrap();
    assert_eq!(fs::read_to_string(&fetched.path).unwrap(), "price\n50\n");
}

#[test]
fn orphan_version_dir_without_manifest_entry_is_replaced() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut store = FsArtifactStore::new(root.path());
    publish(&mut store, scratch.path(), "sample.csv", "raw_data", "price\n50\n", vec![]);

    // restos de un publish interrumpido antes de escribir el manifest
    let orphan = root.path().join("nyc_airbnb/sample.csv/v1");
    fs::create_dir_all(&orphan).unwrap();
    fs::write(orphan.join("stale.csv"), "junk\n").unwrap();

    let v1 = publish(&mut store, scratch.path(), "sample.csv", "raw_data", "price\n60\n", vec![]);
    assert_eq!(v1.version, 1);
    assert!(!orphan.join("stale.csv").exists());
    let latest = store.fetch(&"nyc_airbnb/sample.csv:latest".parse().unwrap()).unwrap();
    assert_eq!(fs::read_to_string(&latest.path).unwrap(), "price\n60\n");
}
