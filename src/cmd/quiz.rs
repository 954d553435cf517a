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

use std::collections::BTreeSet;
use std::io::Write;
use std::io::stdout;

use examprep_core::Catalog;
use examprep_core::Clock;
use examprep_core::CompletedExam;
use examprep_core::Session;
use examprep_core::clock::SystemClock;
use examprep_core::error::Fallible;
use examprep_core::error::fail;
use examprep_core::quiz::Quiz;
use examprep_core::quiz::quiz_exam;
use examprep_core::types::aliases::Tag;
use tokio::io::BufReader;
use tokio::io::stdin;

use crate::cmd::take::Mode;
use crate::cmd::take::Outcome;
use crate::cmd::take::run_session;
use crate::cmd::write_summary;
use crate::collection::Collection;

/// Build a quiz from the catalog. Unknown tags are reported but do not stop
/// the quiz as long as some tag matches.
pub fn build_quiz(
    catalog: &Catalog,
    tags: &BTreeSet<Tag>,
    size: usize,
    seed: Option<u64>,
) -> Fallible<Quiz> {
    if tags.is_empty() {
        return fail("At least one tag is required.");
    }
    let known = catalog.tags();
    for tag in tags.iter() {
        if !known.contains(tag.as_str()) {
            log::warn!("No question is tagged '{tag}'");
        }
    }
    let quiz = quiz_exam(catalog.exams(), tags, size, seed);
    if quiz.exam().is_empty() {
        let known: Vec<&str> = known.into_iter().collect();
        return fail(format!(
            "No questions match the given tags. Known tags: {}",
            known.join(", ")
        ));
    }
    Ok(quiz)
}

pub async fn take_quiz(
    directory: Option<String>,
    tags: Vec<String>,
    size: Option<usize>,
    seed: Option<u64>,
) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let tags: BTreeSet<Tag> = tags.into_iter().collect();
    let size = size.unwrap_or(collection.config.quiz_size);
    let quiz = build_quiz(&collection.catalog, &tags, size, seed)?;
    let exam = quiz.exam().clone();
    let engine = collection.engine(SystemClock)?;
    let mut session = Session::new();
    session.start(exam.clone(), engine.clock().now())?;
    let mut out = stdout();
    writeln!(out, "{} ({} questions)", exam.name(), exam.questions().len())?;
    let input = BufReader::new(stdin());
    match run_session(&engine, &mut session, Mode::Quiz, input, &mut out).await? {
        Outcome::Finished(completed) => {
            write_summary(&mut out, &exam, &completed)?;
            write_sources(&mut out, &quiz, &completed)?;
        }
        Outcome::Saved(_) | Outcome::Abandoned => writeln!(out, "Quiz abandoned.")?,
    }
    Ok(())
}

/// Point each missed quiz question back at the exam it was drawn from.
fn write_sources<W: Write>(out: &mut W, quiz: &Quiz, completed: &CompletedExam) -> Fallible<()> {
    for answer in completed.incorrect_answers() {
        if let Some((exam_id, question_id)) = quiz.source(answer.question_id) {
            writeln!(
                out,
                "Q{} is question {question_id} of '{exam_id}'.",
                answer.question_id
            )?;
        }
    }
    Ok(())
}
