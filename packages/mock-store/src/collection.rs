//! Insertion-ordered record collection with monotonic id assignment.

use std::collections::HashSet;

use crate::error::StoreError;
use crate::record::Record;

/// Records of one resource, in insertion order.
#[derive(Debug, Clone)]
pub struct Collection<R> {
    records: Vec<R>,
    /// Next numeric id to hand out; never decreases
    next_id: u64,
}

impl<R: Record> Default for Collection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Collection<R> {
    /// Creates an empty collection whose first id is "1".
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Builds a collection from loaded records.
    ///
    /// The id counter starts after the largest numeric id present. A
    /// record holding the largest `u64` leaves the id space exhausted.
    ///
    /// # Returns
    /// `Result<Self, StoreError>`, `Conflict` if two records share an id.
    pub fn from_records(records: Vec<R>) -> Result<Self, StoreError> {
        let mut max_numeric = 0u64;
        {
            let mut seen = HashSet::with_capacity(records.len());
            for record in &records {
                if !seen.insert(record.id()) {
                    return Err(StoreError::Conflict {
                        resource: R::KIND.singular(),
                        id: record.id().to_string(),
                    });
                }
                if let Ok(n) = record.id().parse::<u64>() {
                    max_numeric = max_numeric.max(n);
                }
            }
        }
        Ok(Self {
            next_id: max_numeric.saturating_add(1),
            records,
        })
    }

    /// Raises the id counter to at least `next_id`.
    ///
    /// `u64::MAX` is never handed out; a counter at that value is exhausted.
    pub fn reserve_ids_below(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    /// Next id the counter would hand out.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.position(id).map(|idx| &self.records[idx])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut R> {
        self.position(id).map(move |idx| &mut self.records[idx])
    }

    /// Hands out a fresh id, skipping any id already taken.
    ///
    /// # Returns
    /// `IdSpaceExhausted` once the counter reaches `u64::MAX`; the counter
    /// never wraps.
    pub fn assign_id(&mut self) -> Result<String, StoreError> {
        loop {
            if self.next_id == u64::MAX {
                return Err(StoreError::IdSpaceExhausted {
                    resource: R::KIND.singular(),
                });
            }
            let candidate = self.next_id.to_string();
            self.next_id += 1;
            if !self.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Appends a record; the caller guarantees the id is fresh.
    pub fn push(&mut self, record: R) {
        self.records.push(record);
    }

    /// Removes a record, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<R> {
        self.position(id).map(|idx| self.records.remove(idx))
    }
}
