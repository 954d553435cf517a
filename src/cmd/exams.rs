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

use examprep_core::CompletedExam;
use examprep_core::Exam;
use examprep_core::InProgressSnapshot;
use examprep_core::clock::SystemClock;
use examprep_core::error::Fallible;

use crate::cmd::format_duration;
use crate::collection::Collection;

/// List the exams in the collection with their best score and whether an
/// attempt is saved.
pub fn list_exams(directory: Option<String>) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let engine = collection.engine(SystemClock)?;
    let history = engine.history(None)?;
    let snapshots = engine.in_progress()?;
    for exam in collection.catalog.exams() {
        println!("{}", exam_line(exam, &history, &snapshots));
    }
    Ok(())
}

pub fn discard_progress(directory: Option<String>, exam_id: String) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let engine = collection.engine(SystemClock)?;
    if engine.discard(&exam_id)? {
        println!("Discarded saved progress for '{exam_id}'.");
    } else {
        println!("No saved progress for '{exam_id}'.");
    }
    Ok(())
}

fn exam_line(exam: &Exam, history: &[CompletedExam], snapshots: &[InProgressSnapshot]) -> String {
    let best = history
        .iter()
        .filter(|c| &c.exam_id == exam.id())
        .map(|c| c.score)
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))));
    let mut line = format!(
        "{}\t{} [{}] {} questions",
        exam.id(),
        exam.name(),
        exam.exam_type().as_str(),
        exam.questions().len()
    );
    if let Some(best) = best {
        line.push_str(&format!(", best {best:.1}%"));
    }
    if let Some(saved) = snapshots.iter().find(|s| &s.exam_id == exam.id()) {
        line.push_str(&format!(
            ", saved at question {} ({} answered, {})",
            saved.current_question_index + 1,
            saved.user_answers.len(),
            format_duration(saved.elapsed())
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;
    use examprep_core::Session;
    use examprep_core::Timestamp;
    use examprep_core::scoring::score;

    use super::*;
    use crate::collection::load_catalog;
    use crate::helper::create_tmp_collection;

    fn at(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_exam_line() -> Fallible<()> {
        let dir = create_tmp_collection()?;
        let (catalog, _) = load_catalog(&dir)?;
        let exam = catalog.exam("road-2024").unwrap();
        assert_eq!(
            exam_line(&exam, &[], &[]),
            "road-2024\tRoad Code 2024 [Teórico-Prática] 2 questions"
        );

        let end = at("2024-05-01T10:00:00.000");
        let answers: BTreeMap<u32, usize> = [(1, 1)].into_iter().collect();
        let completed = CompletedExam::new(
            "road-2024",
            end.minus(Duration::minutes(5)),
            end,
            score(&exam, &answers),
        );

        let mut session = Session::new();
        session.start(exam.clone(), end)?;
        session.select_answer(10, 0)?;
        session.move_next()?;
        let snapshot = session.snapshot(end.plus(Duration::seconds(90)))?;

        assert_eq!(
            exam_line(&exam, &[completed], &[snapshot]),
            "road-2024\tRoad Code 2024 [Teórico-Prática] 2 questions, best 25.0%, \
             saved at question 2 (1 answered, 01:30)"
        );
        Ok(())
    }

    #[test]
    fn test_discard_without_progress() -> Fallible<()> {
        let dir = create_tmp_collection()?;
        discard_progress(Some(dir.display().to_string()), "road-2023".to_string())
    }
}
