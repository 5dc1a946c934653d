//! File-backed store tests.

use std::fs;
use std::path::Path;

use ntest::timeout;
use tempfile::tempdir;

use mock_store::codec::{decode_draft, decode_patch};
use mock_store::config::StoreConfig;
use mock_store::persistence::PersistenceManager;
use mock_store::{Course, Store, StoreError};

fn course_draft(title: &str) -> <Course as mock_store::Record>::Draft {
    let body = format!(
        r#"{{"title":"{}","description":"d","teacher":"t"}}"#,
        title
    );
    decode_draft::<Course>(body.as_bytes()).unwrap()
}

#[timeout(5000)]
#[test]
fn test_every_mutation_is_written_before_returning() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("db.json");
    let store = Store::open(&StoreConfig::with_file(&path))?;

    let course = store.create::<Course>(course_draft("Rust"))?;
    let on_disk = PersistenceManager::new(path.clone(), &StoreConfig::default()).load()?;
    assert_eq!(on_disk.courses, vec![course.clone()]);

    store.delete::<Course>(&course.id)?;
    let on_disk = PersistenceManager::new(path.clone(), &StoreConfig::default()).load()?;
    assert!(on_disk.courses.is_empty());
    Ok(())
}

#[timeout(5000)]
#[test]
fn test_reopen_restores_records_and_counters() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let config = StoreConfig::with_file(temp_dir.path().join("db.json"));

    {
        let store = Store::open(&config)?;
        store.create::<Course>(course_draft("A"))?;
        let b = store.create::<Course>(course_draft("B"))?;
        store.delete::<Course>(&b.id)?;
    }

    let store = Store::open(&config)?;
    assert_eq!(store.list::<Course>()?.len(), 1);
    let c = store.create::<Course>(course_draft("C"))?;
    assert_eq!(c.id, "3");
    Ok(())
}

#[timeout(5000)]
#[test]
fn test_read_only_store_never_writes() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("db.json");
    fs::write(&path, r#"{"courses":[],"students":[],"enrollments":[]}"#)?;
    let before = fs::read_to_string(&path)?;

    let config = StoreConfig {
        read_only: true,
        ..StoreConfig::with_file(&path)
    };
    let store = Store::open(&config)?;
    store.create::<Course>(course_draft("Rust"))?;

    assert_eq!(fs::read_to_string(&path)?, before);
    assert_eq!(store.list::<Course>()?.len(), 1);
    Ok(())
}

#[timeout(5000)]
#[test]
fn test_failed_write_rolls_back_memory() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    // Parent of the backing file is a regular file, so every write fails
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "not a directory")?;
    let config = StoreConfig {
        persistence_retry_delay_ms: 0,
        ..StoreConfig::with_file(blocker.join("db.json"))
    };

    let store = Store::open(&config)?;
    let err = store.create::<Course>(course_draft("Rust")).unwrap_err();
    assert!(matches!(err, StoreError::IoError(_)));
    assert!(store.list::<Course>()?.is_empty());
    Ok(())
}

/// Opens a file-backed store under `dir/data/db.json` seeded with one
/// course, then turns `dir/data` into a regular file so later writes fail.
fn seeded_store_with_broken_file(dir: &Path) -> anyhow::Result<(Store, Course)> {
    let data_dir = dir.join("data");
    let config = StoreConfig {
        persistence_retry_delay_ms: 0,
        ..StoreConfig::with_file(data_dir.join("db.json"))
    };
    let store = Store::open(&config)?;
    let course = store.create::<Course>(course_draft("Rust"))?;

    fs::remove_dir_all(&data_dir)?;
    fs::write(&data_dir, "not a directory")?;
    Ok((store, course))
}

#[timeout(5000)]
#[test]
fn test_failed_delete_rolls_back_memory() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let (store, course) = seeded_store_with_broken_file(temp_dir.path())?;

    let err = store.delete::<Course>(&course.id).unwrap_err();
    assert!(matches!(err, StoreError::IoError(_)));
    assert_eq!(store.get::<Course>(&course.id)?, course);
    Ok(())
}

#[timeout(5000)]
#[test]
fn test_failed_merge_and_replace_roll_back_memory() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let (store, course) = seeded_store_with_broken_file(temp_dir.path())?;

    let patch = decode_patch::<Course>(br#"{"title":"Changed"}"#)?;
    let err = store.merge::<Course>(&course.id, patch).unwrap_err();
    assert!(matches!(err, StoreError::IoError(_)));
    assert_eq!(store.get::<Course>(&course.id)?, course);

    let err = store
        .replace::<Course>(&course.id, course_draft("Replaced"))
        .unwrap_err();
    assert!(matches!(err, StoreError::IoError(_)));
    assert_eq!(store.get::<Course>(&course.id)?, course);
    Ok(())
}

#[timeout(5000)]
#[test]
fn test_duplicate_ids_in_fixture_are_rejected() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("db.json");
    fs::write(
        &path,
        r#"{"students":[{"id":"1","name":"a","email":"a"},{"id":1,"name":"b","email":"b"}]}"#,
    )?;

    let err = Store::open(&StoreConfig::with_file(&path)).unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
    Ok(())
}
