//! Store behaviour through the public API, including concurrent writers.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use ntest::timeout;

use mock_store::codec::{decode_draft, decode_patch};
use mock_store::{Course, Enrollment, Store, StoreError, Student};

fn seed_course(store: &Store) -> Course {
    let draft = decode_draft::<Course>(
        br#"{"title":"Rust","description":"Ownership and borrowing","teacher":"Grace"}"#,
    )
    .unwrap();
    store.create::<Course>(draft).unwrap()
}

#[test]
fn test_student_create_then_get() {
    let store = Store::new();
    let draft = decode_draft::<Student>(br#"{"name":"Ana","email":"ana@x.com"}"#).unwrap();
    let created = store.create::<Student>(draft).unwrap();

    assert_eq!(created.name, "Ana");
    assert_eq!(created.email, "ana@x.com");
    assert_eq!(store.get::<Student>(&created.id).unwrap(), created);
}

#[test]
fn test_patch_course_teacher_keeps_other_fields() {
    let store = Store::new();
    let course = seed_course(&store);

    let patch = decode_patch::<Course>(br#"{"teacher":"New Teacher"}"#).unwrap();
    let updated = store.merge::<Course>(&course.id, patch).unwrap();

    assert_eq!(updated.teacher, "New Teacher");
    assert_eq!(updated.title, course.title);
    assert_eq!(updated.description, course.description);
}

#[test]
fn test_enrollment_with_unknown_student_leaves_list_unchanged() {
    let store = Store::new();
    let course = seed_course(&store);
    let before = store.list::<Enrollment>().unwrap().len();

    let body = format!(
        r#"{{"studentId":"999","courseId":"{}","date":"2025-01-01"}}"#,
        course.id
    );
    let draft = decode_draft::<Enrollment>(body.as_bytes()).unwrap();
    let err = store.create::<Enrollment>(draft).unwrap_err();

    assert!(matches!(err, StoreError::Validation { .. }));
    assert_eq!(store.list::<Enrollment>().unwrap().len(), before);
}

#[test]
fn test_delete_then_get_is_not_found() {
    let store = Store::new();
    let course = seed_course(&store);
    store.delete::<Course>(&course.id).unwrap();
    assert!(matches!(
        store.get::<Course>(&course.id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_list_preserves_insertion_order() {
    let store = Store::new();
    for name in ["c", "a", "b"] {
        let body = format!(r#"{{"name":"{}","email":"{}@x.com"}}"#, name, name);
        store
            .create::<Student>(decode_draft::<Student>(body.as_bytes()).unwrap())
            .unwrap();
    }
    let names: Vec<String> = store
        .list::<Student>()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[timeout(5000)]
#[test]
fn test_concurrent_creates_assign_unique_ids() {
    let store = Arc::new(Store::new());
    let mut handles = Vec::new();

    for t in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let mut ids = Vec::new();
            for i in 0..50 {
                let body = format!(r#"{{"name":"s{}-{}","email":"x@x.com"}}"#, t, i);
                let draft = decode_draft::<Student>(body.as_bytes()).unwrap();
                ids.push(store.create::<Student>(draft).unwrap().id);
            }
            ids
        }));
    }

    let mut all = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(all.insert(id), "duplicate id assigned");
        }
    }
    assert_eq!(all.len(), 400);
    assert_eq!(store.list::<Student>().unwrap().len(), 400);
}
