//! Tests for persistence module.

use std::fs;

use ntest::timeout;
use tempfile::tempdir;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::persistence::PersistenceManager;
use crate::record::{Course, Student};
use crate::store::{NextIds, Snapshot};

fn manager(path: std::path::PathBuf) -> PersistenceManager {
    PersistenceManager::new(path, &StoreConfig::default())
}

#[timeout(1000)]
#[test]
fn test_missing_file_loads_empty() {
    let temp_dir = tempdir().unwrap();
    let persistence = manager(temp_dir.path().join("db.json"));
    assert_eq!(persistence.load().unwrap(), Snapshot::default());
}

#[timeout(1000)]
#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = tempdir().unwrap();
    let persistence = manager(temp_dir.path().join("nested").join("db.json"));

    let snapshot = Snapshot {
        courses: vec![Course {
            id: "1".to_string(),
            title: "Rust".to_string(),
            description: "Ownership".to_string(),
            teacher: "Grace".to_string(),
        }],
        students: vec![Student {
            id: "3".to_string(),
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
        }],
        enrollments: Vec::new(),
        next_ids: Some(NextIds {
            courses: 2,
            students: 7,
            enrollments: 1,
        }),
    };

    persistence.save(&snapshot).unwrap();
    assert_eq!(persistence.load().unwrap(), snapshot);

    // Temp file is renamed away
    assert!(!temp_dir.path().join("nested").join("db.json.tmp").exists());
}

#[timeout(1000)]
#[test]
fn test_loads_json_server_style_fixture() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("db.json");
    fs::write(
        &path,
        r#"{
            "courses": [{"id": 1, "title": "Rust", "description": "d", "teacher": "t"}],
            "students": [],
            "profile": {"name": "ignored"}
        }"#,
    )
    .unwrap();

    let snapshot = manager(path).load().unwrap();
    assert_eq!(snapshot.courses.len(), 1);
    assert_eq!(snapshot.courses[0].id, "1");
    assert!(snapshot.enrollments.is_empty());
    assert!(snapshot.next_ids.is_none());
}

#[timeout(1000)]
#[test]
fn test_invalid_file_is_data_corruption() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("db.json");
    fs::write(&path, r#"{"courses": [{"id": "1"}]}"#).unwrap();

    let err = manager(path).load().unwrap_err();
    assert!(matches!(err, StoreError::DataCorruption(_)));
}

#[timeout(1000)]
#[test]
fn test_blank_file_loads_empty() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("db.json");
    fs::write(&path, "\n").unwrap();
    assert_eq!(manager(path).load().unwrap(), Snapshot::default());
}
