use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kimquery::dataset::Dataset;
use kimquery::error::KimQueryError;
use kimquery::store::{CacheStatus, CacheStore};

fn temp_cache(temp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("cache.json")).unwrap()
}

#[test]
fn save_then_load_reproduces_dataset() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_cache(&temp);
    let dataset: Dataset = serde_json::from_str(
        r#"{
            "vfe": {"fcc": {"Al": {"MO_X": {"value": 0.6718443027, "uncert": 1e-7}}}},
            "c11": {"bcc": {"Fe": {"MO_Y": {"value": 243.0, "uncert": null}}},
                    "fcc": {}}
        }"#,
    )
    .unwrap();

    CacheStore::save(&path, &dataset).unwrap();
    let outcome = CacheStore::load(&path);
    assert_eq!(outcome.status, CacheStatus::Loaded);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.dataset, dataset);
}

#[test]
fn cache_file_is_pretty_printed() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_cache(&temp);
    let dataset: Dataset =
        serde_json::from_str(r#"{"vfe":{"fcc":{"Al":{"MO_X":{"value":1.0,"uncert":0.1}}}}}"#)
            .unwrap();
    CacheStore::save(&path, &dataset).unwrap();

    let content = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert!(content.starts_with("{\n  \"vfe\": {\n    \"fcc\": {"));
    assert!(content.contains("\"uncert\": 0.1"));
}

#[test]
fn missing_cache_is_empty_and_forces_refresh() {
    let temp = tempfile::tempdir().unwrap();
    let outcome = CacheStore::load(&temp_cache(&temp));
    assert_eq!(outcome.status, CacheStatus::Missing);
    assert!(outcome.needs_refresh());
    assert!(outcome.dataset.is_empty());
}

#[test]
fn corrupt_cache_is_empty_and_forces_refresh() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_cache(&temp);
    std::fs::write(path.as_std_path(), "{\"vfe\": {\"fcc\": ").unwrap();

    let outcome = CacheStore::load(&path);
    assert_eq!(outcome.status, CacheStatus::Corrupt);
    assert!(outcome.needs_refresh());
    assert!(outcome.dataset.is_empty());
    assert_matches!(outcome.error, Some(KimQueryError::CacheLoad { .. }));
}

#[test]
fn save_replaces_existing_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_cache(&temp);
    std::fs::write(path.as_std_path(), "stale").unwrap();

    CacheStore::save(&path, &Dataset::new()).unwrap();
    assert_eq!(CacheStore::load(&path).status, CacheStatus::Loaded);
    let leftovers = std::fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}
