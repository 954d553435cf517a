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

//! The exam session state machine.
//!
//! A session moves `NotStarted -> Active -> Finished`. Pausing turns the
//! active session into an [`InProgressSnapshot`] and marks it `Suspended`;
//! resuming builds a fresh active session from the snapshot. Every
//! operation either succeeds or leaves the session exactly as it was.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::catalog::Exam;
use crate::catalog::Question;
use crate::error::EngineError;
use crate::error::EngineResult;
use crate::record::CompletedExam;
use crate::record::InProgressSnapshot;
use crate::scoring::score;
use crate::types::aliases::OptionIndex;
use crate::types::aliases::QuestionId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Active,
    /// Saved to a snapshot; this value is dead and a resume builds a new one.
    Suspended,
    Finished,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::Active => write!(f, "active"),
            SessionState::Suspended => write!(f, "suspended"),
            SessionState::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    exam: Option<Arc<Exam>>,
    state: SessionState,
    /// Always `< questions.len()`, or `0` for an empty exam.
    current_index: usize,
    answers: BTreeMap<QuestionId, OptionIndex>,
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    /// Last value computed by `tick` or frozen on suspend. Display only.
    displayed_elapsed: Duration,
    resumed: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            exam: None,
            state: SessionState::NotStarted,
            current_index: 0,
            answers: BTreeMap::new(),
            started_at: None,
            ended_at: None,
            displayed_elapsed: Duration::zero(),
            resumed: false,
        }
    }

    /// Begin an attempt. An exam without questions is allowed; it can be
    /// finished straight away.
    pub fn start(&mut self, exam: Arc<Exam>, now: Timestamp) -> EngineResult<()> {
        self.require_not(SessionState::Active, "start")?;
        log::debug!("Starting exam '{}' at {now}", exam.id());
        *self = Self {
            exam: Some(exam),
            state: SessionState::Active,
            started_at: Some(now),
            ..Self::new()
        };
        Ok(())
    }

    /// Rebuild an active session from a snapshot. The start time is shifted
    /// back by the stored elapsed time so the clock continues from there.
    pub fn resume(
        snapshot: &InProgressSnapshot,
        exam: Arc<Exam>,
        now: Timestamp,
    ) -> EngineResult<Self> {
        if snapshot.exam_id != *exam.id() {
            return Err(EngineError::SnapshotMismatch {
                expected: exam.id().clone(),
                found: snapshot.exam_id.clone(),
            });
        }
        let len = exam.questions().len();
        if snapshot.current_question_index >= len.max(1) {
            return Err(EngineError::OutOfRangeIndex {
                index: snapshot.current_question_index,
                bound: len,
            });
        }
        for (&question_id, &option) in snapshot.user_answers.iter() {
            check_option(&exam, question_id, option)?;
        }
        log::debug!(
            "Resuming exam '{}' with {} answers after {}s",
            exam.id(),
            snapshot.user_answers.len(),
            snapshot.elapsed_time
        );
        let elapsed = snapshot.elapsed();
        Ok(Self {
            exam: Some(exam),
            state: SessionState::Active,
            current_index: snapshot.current_question_index,
            answers: snapshot.user_answers.clone(),
            started_at: Some(now.minus(elapsed)),
            ended_at: None,
            displayed_elapsed: elapsed,
            resumed: true,
        })
    }

    /// Record an answer, replacing any earlier one for the same question.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        option: OptionIndex,
    ) -> EngineResult<()> {
        let exam = self.active_exam("select an answer")?;
        check_option(exam, question_id, option)?;
        self.answers.insert(question_id, option);
        Ok(())
    }

    /// Answer the question under the cursor.
    pub fn select_current(&mut self, option: OptionIndex) -> EngineResult<()> {
        let exam = self.active_exam("select an answer")?;
        let question_id = match exam.questions().get(self.current_index) {
            Some(question) => question.id(),
            None => {
                return Err(EngineError::OutOfRangeIndex {
                    index: self.current_index,
                    bound: 0,
                });
            }
        };
        self.select_answer(question_id, option)
    }

    /// Advance one question; stays put on the last one.
    pub fn move_next(&mut self) -> EngineResult<()> {
        let len = self.active_exam("move to the next question")?.questions().len();
        if self.current_index + 1 < len {
            self.current_index += 1;
        }
        Ok(())
    }

    /// Step back one question; stays put on the first one.
    pub fn move_previous(&mut self) -> EngineResult<()> {
        self.active_exam("move to the previous question")?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(())
    }

    /// Jump to a question by position.
    pub fn go_to(&mut self, index: usize) -> EngineResult<()> {
        let len = self.active_exam("jump to a question")?.questions().len();
        if index >= len {
            return Err(EngineError::OutOfRangeIndex { index, bound: len });
        }
        self.current_index = index;
        Ok(())
    }

    /// Score the attempt and close the session.
    pub fn finish(&mut self, now: Timestamp) -> EngineResult<CompletedExam> {
        let exam = self.active_exam("finish")?;
        let started_at = self.started_at.unwrap_or(now);
        let scorecard = score(exam, &self.answers);
        let completed = CompletedExam::new(exam.id(), started_at, now, scorecard);
        log::debug!(
            "Finished exam '{}' with score {:.1}",
            completed.exam_id,
            completed.score
        );
        self.state = SessionState::Finished;
        self.ended_at = Some(now);
        self.displayed_elapsed = now.since(started_at);
        Ok(completed)
    }

    /// Capture the attempt without changing it.
    pub fn snapshot(&self, now: Timestamp) -> EngineResult<InProgressSnapshot> {
        let exam = self.active_exam("save")?;
        let started_at = self.started_at.unwrap_or(now);
        Ok(InProgressSnapshot {
            id: Uuid::new_v4(),
            exam_id: exam.id().clone(),
            start_time: started_at,
            elapsed_time: now.since(started_at).num_seconds().max(0) as u64,
            current_question_index: self.current_index,
            user_answers: self.answers.clone(),
        })
    }

    /// Capture the attempt and stop the clock. Nothing is scored.
    pub fn save_and_exit(&mut self, now: Timestamp) -> EngineResult<InProgressSnapshot> {
        let snapshot = self.snapshot(now)?;
        log::debug!(
            "Suspending exam '{}' at question {}",
            snapshot.exam_id,
            snapshot.current_question_index
        );
        self.state = SessionState::Suspended;
        self.displayed_elapsed = snapshot.elapsed();
        Ok(snapshot)
    }

    /// Time spent on the attempt. While active this is always recomputed
    /// from the start time, so missed ticks never drift the clock.
    pub fn elapsed(&self, now: Timestamp) -> Duration {
        match (self.state, self.started_at, self.ended_at) {
            (SessionState::Active, Some(start), _) => now.since(start),
            (SessionState::Finished, Some(start), Some(end)) => end.since(start),
            _ => self.displayed_elapsed,
        }
    }

    /// Refresh the display clock. Advisory: dropping ticks is harmless.
    pub fn tick(&mut self, now: Timestamp) -> Duration {
        if self.state == SessionState::Active {
            self.displayed_elapsed = self.elapsed(now);
        }
        self.displayed_elapsed
    }

    pub fn displayed_elapsed(&self) -> Duration {
        self.displayed_elapsed
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    pub fn exam(&self) -> Option<&Arc<Exam>> {
        self.exam.as_ref()
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.exam
            .as_ref()
            .and_then(|exam| exam.questions().get(self.current_index))
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionIndex> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: QuestionId) -> Option<OptionIndex> {
        self.answers.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Every question has an answer. Trivially true for an empty exam.
    pub fn is_complete(&self) -> bool {
        match &self.exam {
            Some(exam) => exam
                .questions()
                .iter()
                .all(|q| self.answers.contains_key(&q.id())),
            None => false,
        }
    }

    /// Fraction of questions answered, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        match &self.exam {
            Some(exam) if !exam.questions().is_empty() => {
                let answered = exam
                    .questions()
                    .iter()
                    .filter(|q| self.answers.contains_key(&q.id()))
                    .count();
                answered as f64 / exam.questions().len() as f64
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    fn active_exam(&self, operation: &'static str) -> EngineResult<&Exam> {
        match (&self.exam, self.state) {
            (Some(exam), SessionState::Active) => Ok(exam),
            _ => Err(EngineError::InvalidState {
                operation,
                state: self.state,
            }),
        }
    }

    fn require_not(&self, state: SessionState, operation: &'static str) -> EngineResult<()> {
        if self.state == state {
            Err(EngineError::InvalidState {
                operation,
                state: self.state,
            })
        } else {
            Ok(())
        }
    }
}

fn check_option(exam: &Exam, question_id: QuestionId, option: OptionIndex) -> EngineResult<()> {
    let question = exam
        .question(question_id)
        .ok_or(EngineError::UnknownQuestion(question_id))?;
    let bound = question.options().len();
    if option >= bound {
        return Err(EngineError::OutOfRangeIndex {
            index: option,
            bound,
        });
    }
    Ok(())
}
