use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::error::{RecordKind, StoreError};
use crate::models::{Feature, FeatureCandidate, NewTranscript, Transcript};

/// An entity kind that lives in its own [`Table`].
pub trait Record: Clone + Send + Sync + 'static {
    /// What callers hand to [`Table::put`]: the record minus its id.
    type Draft;

    const KIND: RecordKind;

    fn id(&self) -> Uuid;

    fn from_draft(id: Uuid, draft: Self::Draft) -> Self;
}

/// A shallow change applied to one record while the table is write-locked.
///
/// Patches never see or touch the record id.
pub trait Patch<R> {
    fn apply(self, record: &mut R);
}

impl Record for Feature {
    type Draft = FeatureCandidate;

    const KIND: RecordKind = RecordKind::Feature;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(id: Uuid, draft: FeatureCandidate) -> Self {
        Feature::from_candidate(id, draft)
    }
}

impl Record for Transcript {
    type Draft = NewTranscript;

    const KIND: RecordKind = RecordKind::Transcript;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(id: Uuid, draft: NewTranscript) -> Self {
        Transcript {
            id,
            content: draft.content,
            timestamp: draft.timestamp,
        }
    }
}

pub(crate) struct Rows<R> {
    records: Vec<R>,
    positions: HashMap<Uuid, usize>,
}

impl<R: Record> Rows<R> {
    pub(crate) fn contains(&self, id: Uuid) -> bool {
        self.positions.contains_key(&id)
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<&R> {
        self.positions.get(&id).map(|&pos| &self.records[pos])
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut R> {
        self.positions.get(&id).map(|&pos| &mut self.records[pos])
    }

    pub(crate) fn insert(&mut self, draft: R::Draft) -> &R {
        let mut id = Uuid::new_v4();
        while self.positions.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let pos = self.records.len();
        self.records.push(R::from_draft(id, draft));
        self.positions.insert(id, pos);
        &self.records[pos]
    }
}

impl<R> Default for Rows<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

/// One keyed table of records behind a single lock.
///
/// Clones share the same table. `list` returns records in insertion order.
pub struct Table<R> {
    rows: Arc<RwLock<Rows<R>>>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Rows::default())),
        }
    }
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new record under a freshly assigned id.
    pub fn put(&self, draft: R::Draft) -> R {
        self.write().insert(draft).clone()
    }

    pub fn get(&self, id: Uuid) -> Option<R> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.read().contains(id)
    }

    pub fn list(&self) -> Vec<R> {
        self.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `patch` to the record with `id` and return the updated record.
    ///
    /// The read-modify-write happens under the table's write lock, so concurrent
    /// patches to the same record are never lost.
    pub fn update<P: Patch<R>>(&self, id: Uuid, patch: P) -> Result<R, StoreError> {
        let mut rows = self.write();
        let record = rows.get_mut(id).ok_or(StoreError::NotFound { kind: R::KIND, id })?;
        patch.apply(record);
        Ok(record.clone())
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Rows<R>> {
        self.rows.read().expect("record table lock poisoned")
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Rows<R>> {
        self.rows.write().expect("record table lock poisoned")
    }
}
