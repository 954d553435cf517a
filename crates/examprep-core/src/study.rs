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

//! Per-question review state driven by the SM-2 scheduler.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

use crate::catalog::Exam;
use crate::record::CompletedExam;
use crate::sm2::DEFAULT_EASE;
use crate::sm2::Ease;
use crate::sm2::Interval;
use crate::sm2::Quality;
use crate::sm2::schedule;
use crate::types::aliases::ExamId;
use crate::types::aliases::QuestionId;
use crate::types::date::Date;
use crate::types::item_hash::ItemHash;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub date: Timestamp,
    pub quality: Quality,
}

/// Review state of one question of one exam.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    pub id: ItemHash,
    pub question_id: QuestionId,
    pub exam_id: ExamId,
    /// Current interval in days.
    pub interval: Interval,
    pub ease_factor: Ease,
    /// `None` means the item is due now.
    pub next_review_date: Option<Timestamp>,
    /// Append-only.
    pub review_history: Vec<ReviewRecord>,
}

impl StudyItem {
    pub fn new(exam_id: &str, question_id: QuestionId) -> Self {
        Self {
            id: ItemHash::of(exam_id, question_id),
            question_id,
            exam_id: exam_id.to_string(),
            interval: 0,
            ease_factor: DEFAULT_EASE,
            next_review_date: None,
            review_history: Vec::new(),
        }
    }

    /// Due when never scheduled, or scheduled for any time today or earlier.
    pub fn is_due(&self, today: Date) -> bool {
        match self.next_review_date {
            None => true,
            Some(next) => next.date() <= today,
        }
    }

    /// Apply one review and record it in the history.
    pub fn review(&mut self, quality: Quality, now: Timestamp) {
        let (interval, ease) = schedule(self.interval, self.ease_factor, quality);
        self.interval = interval;
        self.ease_factor = ease;
        self.next_review_date = Some(now.plus(Duration::days(i64::from(interval))));
        self.review_history.push(ReviewRecord {
            date: now,
            quality,
        });
    }

    pub fn review_count(&self) -> usize {
        self.review_history.len()
    }

    pub fn last_reviewed_at(&self) -> Option<Timestamp> {
        self.review_history.last().map(|r| r.date)
    }
}

/// All items due on `today`. Order is unspecified.
pub fn due_items<'a>(
    items: impl IntoIterator<Item = &'a StudyItem>,
    today: Date,
) -> Vec<&'a StudyItem> {
    items.into_iter().filter(|item| item.is_due(today)).collect()
}

/// How exam outcomes translate into review qualities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StudyPolicy {
    pub correct: Quality,
    pub incorrect: Quality,
}

impl Default for StudyPolicy {
    fn default() -> Self {
        Self {
            correct: Quality::GOOD,
            incorrect: Quality::HARD,
        }
    }
}

impl StudyPolicy {
    pub fn quality_for(&self, is_correct: bool) -> Quality {
        if is_correct {
            self.correct
        } else {
            self.incorrect
        }
    }
}

/// The collection of study items, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct StudyBook {
    items: BTreeMap<ItemHash, StudyItem>,
}

impl StudyBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<StudyItem>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &StudyItem> {
        self.items.values()
    }

    pub fn into_items(self) -> Vec<StudyItem> {
        self.items.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemHash) -> Option<&StudyItem> {
        self.items.get(&id)
    }

    /// Fetch the item for a question, creating it on first use.
    pub fn get_or_create(&mut self, exam_id: &str, question_id: QuestionId) -> &mut StudyItem {
        self.items
            .entry(ItemHash::of(exam_id, question_id))
            .or_insert_with(|| StudyItem::new(exam_id, question_id))
    }

    pub fn review(
        &mut self,
        exam_id: &str,
        question_id: QuestionId,
        quality: Quality,
        now: Timestamp,
    ) -> &StudyItem {
        let item = self.get_or_create(exam_id, question_id);
        item.review(quality, now);
        item
    }

    /// Feed a finished attempt into the scheduler: every answered question is
    /// reviewed with the quality the policy assigns to its outcome.
    /// Nullified questions carry no signal and are skipped. Returns the
    /// number of items reviewed.
    pub fn absorb(
        &mut self,
        completed: &CompletedExam,
        exam: &Exam,
        policy: &StudyPolicy,
        now: Timestamp,
    ) -> usize {
        let mut reviewed = 0;
        for answer in completed.answers.iter() {
            match exam.question(answer.question_id) {
                Some(question) if !question.is_nullified() => {
                    let quality = policy.quality_for(answer.is_correct);
                    self.review(&answer.exam_id, answer.question_id, quality, now);
                    reviewed += 1;
                }
                _ => {}
            }
        }
        reviewed
    }

    pub fn due(&self, today: Date) -> Vec<&StudyItem> {
        due_items(self.items.values(), today)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::ExamType;
    use crate::catalog::Question;
    use crate::session::Session;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn test_new_item_is_due() {
        let item = StudyItem::new("exam-1", 3);
        assert_eq!(item.interval, 0);
        assert_eq!(item.ease_factor, 2.5);
        assert!(item.is_due(ts("2020-01-01T00:00:00.000").date()));
    }

    #[test]
    fn test_due_by_calendar_day() {
        let today = ts("2024-05-10T08:00:00.000").date();
        let mut item = StudyItem::new("exam-1", 3);

        item.next_review_date = Some(ts("2024-05-09T23:00:00.000"));
        assert!(item.is_due(today));

        // Later today still counts as due today.
        item.next_review_date = Some(ts("2024-05-10T23:59:00.000"));
        assert!(item.is_due(today));

        item.next_review_date = Some(ts("2024-05-11T00:00:00.000"));
        assert!(!item.is_due(today));
    }

    #[test]
    fn test_review_schedules_and_records() {
        let mut item = StudyItem::new("exam-1", 3);
        let now = ts("2024-05-10T08:00:00.000");
        item.review(q(5), now);
        assert_eq!(item.interval, 1);
        assert_eq!(item.next_review_date, Some(ts("2024-05-11T08:00:00.000")));
        item.review(q(5), ts("2024-05-11T08:00:00.000"));
        assert_eq!(item.interval, 6);
        item.review(q(1), ts("2024-05-17T08:00:00.000"));
        assert_eq!(item.interval, 1);
        assert_eq!(item.review_count(), 3);
        let qualities: Vec<u8> = item.review_history.iter().map(|r| r.quality.value()).collect();
        assert_eq!(qualities, vec![5, 5, 1]);
        assert_eq!(item.last_reviewed_at(), Some(ts("2024-05-17T08:00:00.000")));
    }

    #[test]
    fn test_book_creates_lazily() {
        let mut book = StudyBook::new();
        assert!(book.is_empty());
        book.get_or_create("exam-1", 1);
        book.get_or_create("exam-1", 1);
        book.get_or_create("exam-2", 1);
        assert_eq!(book.len(), 2);
        assert!(book.get(ItemHash::of("exam-2", 1)).is_some());
    }

    #[test]
    fn test_book_due() {
        let now = ts("2024-05-10T08:00:00.000");
        let mut book = StudyBook::new();
        book.get_or_create("exam-1", 1);
        book.review("exam-1", 2, q(5), now);
        let due: Vec<QuestionId> = book.due(now.date()).iter().map(|i| i.question_id).collect();
        assert_eq!(due, vec![1]);
        let tomorrow = now.date().add_days(1);
        assert_eq!(book.due(tomorrow).len(), 2);
    }

    #[test]
    fn test_absorb_completed_exam() {
        let options = || vec!["a".to_string(), "b".to_string()];
        let questions = vec![
            Question::new(1, "one", options(), Some(0)).unwrap(),
            Question::new(2, "two", options(), Some(0)).unwrap(),
            Question::new(3, "void", options(), None).unwrap(),
            Question::new(4, "skipped", options(), Some(1)).unwrap(),
        ];
        let exam = Arc::new(
            Exam::new("exam-1", "Exam", ExamType::Theoretical, None, questions).unwrap(),
        );
        let now = ts("2024-05-10T08:00:00.000");
        let mut session = Session::new();
        session.start(exam.clone(), now).unwrap();
        session.select_answer(1, 0).unwrap();
        session.select_answer(2, 1).unwrap();
        session.select_answer(3, 1).unwrap();
        let completed = session.finish(now).unwrap();

        let mut book = StudyBook::new();
        let reviewed = book.absorb(&completed, &exam, &StudyPolicy::default(), now);
        assert_eq!(reviewed, 2);
        let right = book.get(ItemHash::of("exam-1", 1)).unwrap();
        assert_eq!(right.review_history[0].quality, q(4));
        let wrong = book.get(ItemHash::of("exam-1", 2)).unwrap();
        assert_eq!(wrong.review_history[0].quality, q(1));
        assert!(book.get(ItemHash::of("exam-1", 3)).is_none());
        assert!(book.get(ItemHash::of("exam-1", 4)).is_none());
    }

    #[test]
    fn test_item_json_layout() -> crate::error::Fallible<()> {
        let mut item = StudyItem::new("exam-1", 3);
        item.review(q(4), ts("2024-05-10T08:00:00.000"));
        let json = serde_json::to_value(&item)?;
        assert_eq!(json["questionId"], 3);
        assert_eq!(json["examId"], "exam-1");
        assert_eq!(json["interval"], 1);
        assert_eq!(json["nextReviewDate"], "2024-05-11T08:00:00.000");
        assert_eq!(json["reviewHistory"][0]["quality"], 4);
        let back: StudyItem = serde_json::from_value(json)?;
        assert_eq!(back, item);
        Ok(())
    }
}
