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

//! Tag-filtered study quizzes.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::Exam;
use crate::catalog::ExamType;
use crate::catalog::Question;
use crate::rng::TinyRng;
use crate::rng::shuffle;
use crate::types::aliases::ExamId;
use crate::types::aliases::QuestionId;
use crate::types::aliases::Tag;

/// Exam id given to generated study quizzes.
pub const QUIZ_EXAM_ID: &str = "study-quiz";

/// Pick up to `size` questions whose tags intersect `tags`.
///
/// Questions are not deduplicated: one that appears in two exams can be
/// drawn twice. With no seed a fresh one is taken from the clock, so the
/// order differs between runs.
pub fn select_questions(
    exams: &[Arc<Exam>],
    tags: &BTreeSet<Tag>,
    size: usize,
    seed: Option<u64>,
) -> Vec<Question> {
    select_with_sources(exams, tags, size, seed)
        .into_iter()
        .map(|(_, question)| question)
        .collect()
}

fn select_with_sources(
    exams: &[Arc<Exam>],
    tags: &BTreeSet<Tag>,
    size: usize,
    seed: Option<u64>,
) -> Vec<(ExamId, Question)> {
    if tags.is_empty() {
        return Vec::new();
    }
    let pool: Vec<(ExamId, Question)> = exams
        .iter()
        .flat_map(|exam| exam.questions().iter().map(move |q| (exam.id(), q)))
        .filter(|(_, question)| question.has_any_tag(tags))
        .map(|(exam_id, question)| (exam_id.clone(), question.clone()))
        .collect();
    let mut rng = match seed {
        Some(seed) => TinyRng::from_seed(seed),
        None => TinyRng::from_time(),
    };
    let mut pool = shuffle(pool, &mut rng);
    pool.truncate(size);
    log::debug!("Selected {} questions for tags {:?}", pool.len(), tags);
    pool
}

/// A study quiz. Questions are renumbered `1..=n` in quiz order, since ids
/// are only unique within their own exam; `source` maps them back.
#[derive(Clone, Debug)]
pub struct Quiz {
    exam: Arc<Exam>,
    sources: Vec<(ExamId, QuestionId)>,
}

impl Quiz {
    /// The quiz as an exam, ready for a regular session.
    pub fn exam(&self) -> &Arc<Exam> {
        &self.exam
    }

    /// Exam id and original question id behind a quiz question.
    pub fn source(&self, quiz_question_id: QuestionId) -> Option<(&str, QuestionId)> {
        let idx = (quiz_question_id as usize).checked_sub(1)?;
        self.sources
            .get(idx)
            .map(|(exam_id, question_id)| (exam_id.as_str(), *question_id))
    }
}

/// Wrap a quiz selection in an exam so it runs through a regular session.
pub fn quiz_exam(
    exams: &[Arc<Exam>],
    tags: &BTreeSet<Tag>,
    size: usize,
    seed: Option<u64>,
) -> Quiz {
    let selected = select_with_sources(exams, tags, size, seed);
    let mut sources = Vec::with_capacity(selected.len());
    let mut questions = Vec::with_capacity(selected.len());
    for (position, (exam_id, question)) in (1..).zip(selected) {
        sources.push((exam_id, question.id()));
        questions.push(question.renumbered(position));
    }
    let name = tags.iter().cloned().collect::<Vec<_>>().join(", ");
    let exam = Exam::new_unchecked(
        QUIZ_EXAM_ID.to_string(),
        format!("Study quiz: {name}"),
        ExamType::Theoretical,
        questions.len(),
        questions,
    );
    Quiz {
        exam: Arc::new(exam),
        sources,
    }
}
