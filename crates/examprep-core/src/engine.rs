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

//! Binds sessions to the persistence port, the event sink and the clock.
//!
//! Persisted transitions run on a copy of the session; the copy replaces
//! the caller's session only after the write succeeded, so a failed write
//! never leaves a half-applied state behind.

use std::sync::Arc;

use crate::catalog::Exam;
use crate::clock::Clock;
use crate::error::EngineResult;
use crate::events::EventSink;
use crate::record::CompletedExam;
use crate::record::InProgressSnapshot;
use crate::session::Session;
use crate::sm2::Quality;
use crate::store::KeyValueStore;
use crate::store::ProgressStore;
use crate::study::StudyItem;
use crate::study::StudyPolicy;
use crate::types::aliases::QuestionId;

pub struct Engine<S, E, C> {
    store: ProgressStore<S>,
    events: E,
    clock: C,
    policy: StudyPolicy,
}

impl<S: KeyValueStore, E: EventSink, C: Clock> Engine<S, E, C> {
    pub fn new(store: S, events: E, clock: C) -> Self {
        Self {
            store: ProgressStore::new(store),
            events,
            clock,
            policy: StudyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StudyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start a fresh attempt, discarding any saved progress for the exam.
    pub fn start(&self, exam: Arc<Exam>) -> EngineResult<Session> {
        if self.store.delete_snapshot(exam.id())? {
            log::info!("Discarded saved progress for exam '{}'", exam.id());
        }
        let mut session = Session::new();
        session.start(exam, self.clock.now())?;
        Ok(session)
    }

    /// Rebuild the saved attempt for this exam, if there is one.
    pub fn resume(&self, exam: Arc<Exam>) -> EngineResult<Option<Session>> {
        match self.store.snapshot(exam.id())? {
            Some(snapshot) => Ok(Some(Session::resume(&snapshot, exam, self.clock.now())?)),
            None => Ok(None),
        }
    }

    /// Persist the attempt and suspend the session. If the write fails the
    /// session keeps running.
    pub fn save_and_exit(&self, session: &mut Session) -> EngineResult<InProgressSnapshot> {
        let mut next = session.clone();
        let snapshot = next.save_and_exit(self.clock.now())?;
        self.store.put_snapshot(&snapshot)?;
        *session = next;
        log::info!(
            "Saved progress for exam '{}' ({} answers)",
            snapshot.exam_id,
            snapshot.user_answers.len()
        );
        Ok(snapshot)
    }

    /// Score the attempt, append it to the log, drop its saved progress and
    /// notify the event sink.
    pub fn finish(&self, session: &mut Session) -> EngineResult<CompletedExam> {
        let mut next = session.clone();
        let completed = next.finish(self.clock.now())?;
        self.store.append_completed(&completed)?;
        *session = next;
        if let Err(e) = self.store.delete_snapshot(&completed.exam_id) {
            // The attempt is already recorded; a stale snapshot is cleared by
            // the next start of this exam.
            log::warn!("Failed to clear saved progress: {e}");
        }
        log::info!(
            "Recorded exam '{}' with score {:.1}",
            completed.exam_id,
            completed.score
        );
        self.events.exam_completed(&completed);
        Ok(completed)
    }

    /// Drop the saved attempt for an exam. Returns whether one existed.
    pub fn discard(&self, exam_id: &str) -> EngineResult<bool> {
        self.store.delete_snapshot(exam_id)
    }

    pub fn in_progress(&self) -> EngineResult<Vec<InProgressSnapshot>> {
        self.store.snapshots()
    }

    /// Completed attempts, oldest first, optionally for one exam.
    pub fn history(&self, exam_id: Option<&str>) -> EngineResult<Vec<CompletedExam>> {
        let log = self.store.completed_exams()?;
        Ok(match exam_id {
            Some(id) => log.into_iter().filter(|c| c.exam_id == id).collect(),
            None => log,
        })
    }

    /// Update study items from a finished attempt. Returns how many items
    /// were reviewed.
    pub fn schedule_from(&self, completed: &CompletedExam, exam: &Exam) -> EngineResult<usize> {
        let mut book = self.store.study_book()?;
        let reviewed = book.absorb(completed, exam, &self.policy, self.clock.now());
        if reviewed > 0 {
            self.store.save_study_book(&book)?;
        }
        log::debug!("Scheduled {reviewed} study items from exam '{}'", exam.id());
        Ok(reviewed)
    }

    /// Review one question outside an exam.
    pub fn review(
        &self,
        exam_id: &str,
        question_id: QuestionId,
        quality: Quality,
    ) -> EngineResult<StudyItem> {
        let mut book = self.store.study_book()?;
        let item = book
            .review(exam_id, question_id, quality, self.clock.now())
            .clone();
        self.store.save_study_book(&book)?;
        Ok(item)
    }

    /// Study items due today.
    pub fn due_items(&self) -> EngineResult<Vec<StudyItem>> {
        let book = self.store.study_book()?;
        let today = self.clock.now().date();
        Ok(book.due(today).into_iter().cloned().collect())
    }

    pub fn policy(&self) -> &StudyPolicy {
        &self.policy
    }
}
