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

//! Records written to the persistence port.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::scoring::Scorecard;
use crate::types::aliases::ExamId;
use crate::types::aliases::OptionIndex;
use crate::types::aliases::QuestionId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub id: Uuid,
    pub question_id: QuestionId,
    pub selected_option: OptionIndex,
    pub is_correct: bool,
    pub exam_id: ExamId,
    pub timestamp: Timestamp,
}

/// A finished attempt. Entries of the completed-exam log are never edited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedExam {
    pub id: Uuid,
    pub exam_id: ExamId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub answers: Vec<UserAnswer>,
    /// Percentage in `[0, 100]`.
    pub score: f64,
    /// How many questions were answered.
    pub actual_question_count: usize,
}

impl CompletedExam {
    pub fn new(
        exam_id: &str,
        start_time: Timestamp,
        end_time: Timestamp,
        scorecard: Scorecard,
    ) -> Self {
        let answers: Vec<UserAnswer> = scorecard
            .answers
            .into_iter()
            .map(|a| UserAnswer {
                id: Uuid::new_v4(),
                question_id: a.question_id,
                selected_option: a.selected_option,
                is_correct: a.is_correct,
                exam_id: exam_id.to_string(),
                timestamp: end_time,
            })
            .collect();
        CompletedExam {
            id: Uuid::new_v4(),
            exam_id: exam_id.to_string(),
            start_time,
            end_time,
            actual_question_count: answers.len(),
            answers,
            score: scorecard.score,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_time.since(self.start_time)
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    /// Answers that were marked wrong, for reviewing mistakes.
    pub fn incorrect_answers(&self) -> impl Iterator<Item = &UserAnswer> {
        self.answers.iter().filter(|a| !a.is_correct)
    }
}

/// A paused attempt. There is at most one per exam id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InProgressSnapshot {
    pub id: Uuid,
    pub exam_id: ExamId,
    pub start_time: Timestamp,
    /// Whole seconds elapsed when the attempt was paused.
    pub elapsed_time: u64,
    pub current_question_index: usize,
    pub user_answers: BTreeMap<QuestionId, OptionIndex>,
}

impl InProgressSnapshot {
    pub fn elapsed(&self) -> Duration {
        Duration::seconds(self.elapsed_time as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::scoring::ScoredAnswer;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_completed_exam_from_scorecard() {
        let card = Scorecard {
            answers: vec![
                ScoredAnswer {
                    question_id: 1,
                    selected_option: 0,
                    is_correct: true,
                },
                ScoredAnswer {
                    question_id: 2,
                    selected_option: 3,
                    is_correct: false,
                },
            ],
            correct_count: 1,
            score: 25.0,
        };
        let start = ts("2024-05-01T09:00:00.000");
        let end = ts("2024-05-01T09:30:00.000");
        let completed = CompletedExam::new("exam-1", start, end, card);
        assert_eq!(completed.actual_question_count, 2);
        assert_eq!(completed.correct_count(), 1);
        assert_eq!(completed.duration().num_minutes(), 30);
        assert!(completed.answers.iter().all(|a| a.exam_id == "exam-1"));
        assert!(completed.answers.iter().all(|a| a.timestamp == end));
        let wrong: Vec<QuestionId> = completed.incorrect_answers().map(|a| a.question_id).collect();
        assert_eq!(wrong, vec![2]);
    }

    #[test]
    fn test_snapshot_json_layout() -> Fallible<()> {
        let snapshot = InProgressSnapshot {
            id: Uuid::nil(),
            exam_id: "exam-1".to_string(),
            start_time: ts("2024-05-01T09:00:00.000"),
            elapsed_time: 42,
            current_question_index: 1,
            user_answers: BTreeMap::from([(1, 2)]),
        };
        let json = serde_json::to_value(&snapshot)?;
        assert_eq!(json["examId"], "exam-1");
        assert_eq!(json["elapsedTime"], 42);
        assert_eq!(json["currentQuestionIndex"], 1);
        assert_eq!(json["userAnswers"]["1"], 2);
        assert_eq!(json["startTime"], "2024-05-01T09:00:00.000");
        let back: InProgressSnapshot = serde_json::from_value(json)?;
        assert_eq!(back, snapshot);
        Ok(())
    }
}
