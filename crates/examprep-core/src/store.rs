// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The persistence port and the typed records kept behind it.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::EngineError;
use crate::error::EngineResult;
use crate::record::CompletedExam;
use crate::record::InProgressSnapshot;
use crate::study::StudyBook;

pub const COMPLETED_EXAMS_KEY: &str = "completedExams";
pub const IN_PROGRESS_KEY: &str = "inProgressExams";
pub const STUDY_ITEMS_KEY: &str = "studyItems";

/// A durable key-value store. A `save` must replace the whole value
/// atomically: readers see either the old bytes or the new ones.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;
    fn save(&self, key: &str, bytes: &[u8]) -> EngineResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn load(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, bytes: &[u8]) -> EngineResult<()> {
        (**self).save(key, bytes)
    }
}

/// In-memory store. Writes can be switched off to exercise failure paths.
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Vec<u8>>>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> EngineResult<()> {
        if self.read_only.get() {
            return Err(EngineError::persistence(key, "store is read-only"));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Typed access to the three persisted record arrays.
pub struct ProgressStore<S> {
    store: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> EngineResult<Vec<T>> {
        match self.store.load(key)? {
            None => Ok(Vec::new()),
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| EngineError::persistence(key, e))
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, records: &[T]) -> EngineResult<()> {
        let bytes = serde_json::to_vec(records).map_err(|e| EngineError::persistence(key, e))?;
        self.store.save(key, &bytes)
    }

    pub fn completed_exams(&self) -> EngineResult<Vec<CompletedExam>> {
        self.read(COMPLETED_EXAMS_KEY)
    }

    pub fn append_completed(&self, completed: &CompletedExam) -> EngineResult<()> {
        let mut log: Vec<CompletedExam> = self.completed_exams()?;
        log.push(completed.clone());
        self.write(COMPLETED_EXAMS_KEY, &log)
    }

    pub fn snapshots(&self) -> EngineResult<Vec<InProgressSnapshot>> {
        self.read(IN_PROGRESS_KEY)
    }

    pub fn snapshot(&self, exam_id: &str) -> EngineResult<Option<InProgressSnapshot>> {
        Ok(self
            .snapshots()?
            .into_iter()
            .find(|s| s.exam_id == exam_id))
    }

    /// Store a snapshot, replacing any earlier one for the same exam.
    pub fn put_snapshot(&self, snapshot: &InProgressSnapshot) -> EngineResult<()> {
        let mut snapshots: Vec<InProgressSnapshot> = self.snapshots()?;
        snapshots.retain(|s| s.exam_id != snapshot.exam_id);
        snapshots.push(snapshot.clone());
        self.write(IN_PROGRESS_KEY, &snapshots)
    }

    /// Returns whether a snapshot existed.
    pub fn delete_snapshot(&self, exam_id: &str) -> EngineResult<bool> {
        let mut snapshots: Vec<InProgressSnapshot> = self.snapshots()?;
        let before = snapshots.len();
        snapshots.retain(|s| s.exam_id != exam_id);
        if snapshots.len() == before {
            return Ok(false);
        }
        self.write(IN_PROGRESS_KEY, &snapshots)?;
        Ok(true)
    }

    pub fn study_book(&self) -> EngineResult<StudyBook> {
        Ok(StudyBook::from_items(self.read(STUDY_ITEMS_KEY)?))
    }

    pub fn save_study_book(&self, book: &StudyBook) -> EngineResult<()> {
        let items: Vec<_> = book.items().collect();
        self.write(STUDY_ITEMS_KEY, &items)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use uuid::Uuid;

    use super::*;
    use crate::sm2::Quality;
    use crate::types::timestamp::Timestamp;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn snapshot(exam_id: &str, index: usize) -> InProgressSnapshot {
        InProgressSnapshot {
            id: Uuid::new_v4(),
            exam_id: exam_id.to_string(),
            start_time: ts("2024-05-01T09:00:00.000"),
            elapsed_time: 10,
            current_question_index: index,
            user_answers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_empty_store_reads_empty() -> EngineResult<()> {
        let store = ProgressStore::new(MemoryStore::new());
        assert!(store.completed_exams()?.is_empty());
        assert!(store.snapshots()?.is_empty());
        assert!(store.study_book()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_one_snapshot_per_exam() -> EngineResult<()> {
        let store = ProgressStore::new(MemoryStore::new());
        store.put_snapshot(&snapshot("a", 0))?;
        store.put_snapshot(&snapshot("b", 0))?;
        store.put_snapshot(&snapshot("a", 2))?;
        let snapshots = store.snapshots()?;
        assert_eq!(snapshots.len(), 2);
        assert_eq!(store.snapshot("a")?.map(|s| s.current_question_index), Some(2));
        assert!(store.delete_snapshot("a")?);
        assert!(!store.delete_snapshot("a")?);
        assert!(store.snapshot("a")?.is_none());
        assert!(store.snapshot("b")?.is_some());
        Ok(())
    }

    #[test]
    fn test_failed_write_keeps_previous_value() -> EngineResult<()> {
        let store = ProgressStore::new(MemoryStore::new());
        store.put_snapshot(&snapshot("a", 1))?;
        store.inner().set_read_only(true);
        let result = store.put_snapshot(&snapshot("a", 2));
        assert!(matches!(result, Err(EngineError::Persistence { .. })));
        assert_eq!(store.snapshot("a")?.map(|s| s.current_question_index), Some(1));
        Ok(())
    }

    #[test]
    fn test_corrupt_record_is_a_persistence_error() {
        let memory = MemoryStore::new();
        memory.save(COMPLETED_EXAMS_KEY, b"{ nope").unwrap();
        let store = ProgressStore::new(memory);
        let err = store.completed_exams().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Persistence { ref key, .. } if key == COMPLETED_EXAMS_KEY
        ));
    }

    #[test]
    fn test_study_book_roundtrip() -> EngineResult<()> {
        let store = ProgressStore::new(MemoryStore::new());
        let mut book = StudyBook::new();
        book.review("a", 1, Quality::GOOD, ts("2024-05-01T09:00:00.000"));
        book.get_or_create("a", 2);
        store.save_study_book(&book)?;
        let loaded = store.study_book()?;
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.items().map(|i| i.review_count()).sum::<usize>(),
            1
        );
        Ok(())
    }

    #[test]
    fn test_store_through_reference() -> EngineResult<()> {
        let memory = MemoryStore::new();
        let store = ProgressStore::new(&memory);
        store.put_snapshot(&snapshot("a", 0))?;
        assert!(memory.load(IN_PROGRESS_KEY)?.is_some());
        Ok(())
    }
}
