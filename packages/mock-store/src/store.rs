//! Store owning all three collections.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::check_references;
use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::persistence::PersistenceManager;
use crate::record::{Course, Enrollment, Record, ResourceKind, Student};

/// The three collections guarded by the store's lock.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub courses: Collection<Course>,
    pub students: Collection<Student>,
    pub enrollments: Collection<Enrollment>,
}

impl Tables {
    /// Returns true if `id` exists in the collection named by `kind`.
    pub fn contains(&self, kind: ResourceKind, id: &str) -> bool {
        match kind {
            ResourceKind::Courses => self.courses.contains(id),
            ResourceKind::Students => self.students.contains(id),
            ResourceKind::Enrollments => self.enrollments.contains(id),
        }
    }

    /// Builds tables from a snapshot, rejecting duplicate ids.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut tables = Self {
            courses: Collection::from_records(snapshot.courses)?,
            students: Collection::from_records(snapshot.students)?,
            enrollments: Collection::from_records(snapshot.enrollments)?,
        };
        if let Some(next) = snapshot.next_ids {
            tables.courses.reserve_ids_below(next.courses);
            tables.students.reserve_ids_below(next.students);
            tables.enrollments.reserve_ids_below(next.enrollments);
        }
        Ok(tables)
    }

    /// Copies the tables into their wire form.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            courses: self.courses.records().to_vec(),
            students: self.students.records().to_vec(),
            enrollments: self.enrollments.records().to_vec(),
            next_ids: Some(NextIds {
                courses: self.courses.next_id(),
                students: self.students.next_id(),
                enrollments: self.enrollments.next_id(),
            }),
        }
    }
}

/// Id counters persisted next to the data so ids stay unique across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIds {
    #[serde(default)]
    pub courses: u64,
    #[serde(default)]
    pub students: u64,
    #[serde(default)]
    pub enrollments: u64,
}

/// Whole-database wire form, also the backing file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(rename = "_nextIds", default, skip_serializing_if = "Option::is_none")]
    pub next_ids: Option<NextIds>,
}

/// In-memory store, optionally mirrored to a JSON file.
///
/// Reads share the lock; every mutation holds it exclusively for the whole
/// validate, mutate, persist cycle.
#[derive(Debug)]
pub struct Store {
    tables: RwLock<Tables>,
    persistence: Option<PersistenceManager>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            persistence: None,
        }
    }

    /// Creates an in-memory store seeded from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        Ok(Self {
            tables: RwLock::new(Tables::from_snapshot(snapshot)?),
            persistence: None,
        })
    }

    /// Opens a store according to `config`.
    ///
    /// With a `db_path`, the file is loaded if present (a missing file starts
    /// empty) and, unless `read_only` is set, rewritten after every mutation.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let Some(path) = &config.db_path else {
            return Ok(Self::new());
        };

        let persistence = PersistenceManager::new(path.clone(), config);
        let snapshot = persistence.load()?;
        let tables = Tables::from_snapshot(snapshot)?;
        tracing::info!(
            path = %path.display(),
            courses = tables.courses.len(),
            students = tables.students.len(),
            enrollments = tables.enrollments.len(),
            "Loaded store"
        );

        Ok(Self {
            tables: RwLock::new(tables),
            persistence: (!config.read_only).then_some(persistence),
        })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    /// Runs a mutation of `R`'s collection under the write lock.
    ///
    /// The collection is restored if the mutation or the file rewrite fails.
    fn mutate<R, T, F>(&self, op: F) -> Result<T, StoreError>
    where
        R: Record,
        F: FnOnce(&mut Tables) -> Result<T, StoreError>,
    {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        let before = R::collection(&*tables).clone();

        let result = op(&mut *tables).and_then(|out| {
            if let Some(persistence) = &self.persistence {
                persistence.save(&tables.to_snapshot())?;
            }
            Ok(out)
        });

        if result.is_err() {
            *R::collection_mut(&mut *tables) = before;
        }
        result
    }

    fn not_found<R: Record>(id: &str) -> StoreError {
        StoreError::NotFound {
            resource: R::KIND.singular(),
            id: id.to_string(),
        }
    }

    /// Returns all records of `R` in insertion order.
    pub fn list<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let tables = self.read()?;
        Ok(R::collection(&*tables).records().to_vec())
    }

    /// Returns the records whose wire fields equal every filter value.
    ///
    /// Values are compared on their string rendering; a filter on a field
    /// the record does not have matches nothing.
    pub fn list_matching<R: Record>(
        &self,
        filters: &[(String, String)],
    ) -> Result<Vec<R>, StoreError> {
        if filters.is_empty() {
            return self.list();
        }
        let tables = self.read()?;
        let mut matched = Vec::new();
        for record in R::collection(&*tables).iter() {
            let value =
                serde_json::to_value(record).map_err(|e| StoreError::SerializationError(e.to_string()))?;
            let is_match = filters.iter().all(|(field, expected)| match value.get(field) {
                Some(Value::String(s)) => s == expected,
                Some(other) => other.to_string() == *expected,
                None => false,
            });
            if is_match {
                matched.push(record.clone());
            }
        }
        Ok(matched)
    }

    /// Point lookup.
    pub fn get<R: Record>(&self, id: &str) -> Result<R, StoreError> {
        let tables = self.read()?;
        R::collection(&*tables)
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found::<R>(id))
    }

    /// Returns true if `id` exists in the collection named by `kind`.
    pub fn contains(&self, kind: ResourceKind, id: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.contains(kind, id))
    }

    /// Inserts a new record under a freshly assigned id.
    pub fn create<R: Record>(&self, draft: R::Draft) -> Result<R, StoreError> {
        let record = self.mutate::<R, _, _>(|tables| {
            let id = R::collection_mut(tables).assign_id()?;
            let record = R::from_draft(id, draft);
            check_references(tables, &record)?;
            R::collection_mut(tables).push(record.clone());
            Ok(record)
        })?;
        tracing::debug!(resource = %R::KIND, id = record.id(), "Created record");
        Ok(record)
    }

    /// Overwrites every field of `id` except the id itself.
    pub fn replace<R: Record>(&self, id: &str, draft: R::Draft) -> Result<R, StoreError> {
        let record = self.mutate::<R, _, _>(|tables| {
            if !R::collection(tables).contains(id) {
                return Err(Self::not_found::<R>(id));
            }
            let record = R::from_draft(id.to_string(), draft);
            check_references(tables, &record)?;
            let slot = R::collection_mut(tables)
                .get_mut(id)
                .ok_or_else(|| Self::not_found::<R>(id))?;
            *slot = record.clone();
            Ok(record)
        })?;
        tracing::debug!(resource = %R::KIND, id, "Replaced record");
        Ok(record)
    }

    /// Overwrites only the fields present in `patch`.
    pub fn merge<R: Record>(&self, id: &str, patch: R::Patch) -> Result<R, StoreError> {
        let record = self.mutate::<R, _, _>(|tables| {
            let mut record = R::collection(tables)
                .get(id)
                .cloned()
                .ok_or_else(|| Self::not_found::<R>(id))?;
            record.apply_patch(patch);
            check_references(tables, &record)?;
            let slot = R::collection_mut(tables)
                .get_mut(id)
                .ok_or_else(|| Self::not_found::<R>(id))?;
            *slot = record.clone();
            Ok(record)
        })?;
        tracing::debug!(resource = %R::KIND, id, "Merged record");
        Ok(record)
    }

    /// Removes `id`. A second delete of the same id is `NotFound`.
    pub fn delete<R: Record>(&self, id: &str) -> Result<(), StoreError> {
        self.mutate::<R, _, _>(|tables| {
            R::collection_mut(tables)
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| Self::not_found::<R>(id))
        })?;
        tracing::debug!(resource = %R::KIND, id, "Deleted record");
        Ok(())
    }

    /// Copies the whole database.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.read()?.to_snapshot())
    }
}
