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

use std::collections::BTreeMap;

use crate::catalog::Exam;
use crate::types::aliases::OptionIndex;
use crate::types::aliases::QuestionId;

/// The verdict for one answered question.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredAnswer {
    pub question_id: QuestionId,
    pub selected_option: OptionIndex,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scorecard {
    /// One entry per answered question, in exam order.
    pub answers: Vec<ScoredAnswer>,
    pub correct_count: usize,
    /// Percentage in `[0, 100]`.
    pub score: f64,
}

/// Score an answer map against the exam's key.
///
/// The denominator is the exam's declared total, so unanswered questions
/// lower the score without appearing in the answer list. Answers for ids the
/// exam does not contain are ignored.
pub fn score(exam: &Exam, answers: &BTreeMap<QuestionId, OptionIndex>) -> Scorecard {
    let scored: Vec<ScoredAnswer> = exam
        .questions()
        .iter()
        .filter_map(|question| {
            answers.get(&question.id()).map(|&selected| ScoredAnswer {
                question_id: question.id(),
                selected_option: selected,
                is_correct: question.accepts(selected),
            })
        })
        .collect();
    let correct_count = scored.iter().filter(|a| a.is_correct).count();
    let score = percentage(correct_count, exam.total_questions());
    Scorecard {
        answers: scored,
        correct_count,
        score,
    }
}

fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ExamType;
    use crate::catalog::Question;

    fn question(id: QuestionId, correct: Option<usize>) -> Question {
        let options = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        Question::new(id, format!("Q{id}"), options, correct).unwrap()
    }

    fn exam(total: Option<usize>, questions: Vec<Question>) -> Exam {
        Exam::new("exam", "Exam", ExamType::Theoretical, total, questions).unwrap()
    }

    #[test]
    fn test_all_correct() {
        let exam = exam(Some(2), vec![question(1, Some(0)), question(2, Some(2))]);
        let answers = BTreeMap::from([(1, 0), (2, 2)]);
        let card = score(&exam, &answers);
        assert_eq!(card.score, 100.0);
        assert_eq!(card.answers.len(), 2);
        assert_eq!(card.correct_count, 2);
    }

    #[test]
    fn test_unanswered_count_against_score() {
        let exam = exam(
            Some(4),
            vec![
                question(1, Some(0)),
                question(2, Some(1)),
                question(3, Some(2)),
                question(4, Some(0)),
            ],
        );
        let answers = BTreeMap::from([(1, 0), (2, 0)]);
        let card = score(&exam, &answers);
        assert_eq!(card.score, 25.0);
        assert_eq!(card.answers.len(), 2);
        assert!(card.answers[0].is_correct);
        assert!(!card.answers[1].is_correct);
    }

    #[test]
    fn test_nullified_always_correct() {
        let exam = exam(None, vec![question(1, None)]);
        for k in 0..3 {
            let card = score(&exam, &BTreeMap::from([(1, k)]));
            assert!(card.answers[0].is_correct);
            assert_eq!(card.score, 100.0);
        }
    }

    #[test]
    fn test_zero_total_scores_zero() {
        let exam = exam(Some(0), vec![question(1, Some(0))]);
        let card = score(&exam, &BTreeMap::from([(1, 0)]));
        assert_eq!(card.score, 0.0);
        assert_eq!(card.correct_count, 1);
    }

    #[test]
    fn test_empty_exam() {
        let exam = exam(None, vec![]);
        let card = score(&exam, &BTreeMap::new());
        assert_eq!(card.score, 0.0);
        assert!(card.answers.is_empty());
    }

    #[test]
    fn test_declared_total_is_denominator() {
        let exam = exam(Some(10), vec![question(1, Some(0)), question(2, None)]);
        let card = score(&exam, &BTreeMap::from([(1, 0), (2, 1)]));
        assert!((card.score - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_answers_follow_exam_order() {
        let exam = exam(None, vec![question(9, Some(0)), question(3, Some(0))]);
        let card = score(&exam, &BTreeMap::from([(3, 0), (9, 1), (42, 0)]));
        let ids: Vec<QuestionId> = card.answers.iter().map(|a| a.question_id).collect();
        assert_eq!(ids, vec![9, 3]);
    }
}
