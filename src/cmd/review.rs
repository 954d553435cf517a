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

use std::io::Write;
use std::io::stdout;

use examprep_core::Catalog;
use examprep_core::Clock;
use examprep_core::Engine;
use examprep_core::EventSink;
use examprep_core::KeyValueStore;
use examprep_core::StudyItem;
use examprep_core::clock::SystemClock;
use examprep_core::error::Fallible;
use examprep_core::rng::TinyRng;
use examprep_core::rng::shuffle;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::stdin;

use crate::cmd::write_question;
use crate::collection::Collection;

/// Tally of one review session.
#[derive(Debug, Default, PartialEq)]
pub struct ReviewSummary {
    pub reviewed: usize,
    pub correct: usize,
    /// Due items whose question is no longer in the catalog.
    pub skipped: usize,
}

pub async fn review_due(directory: Option<String>, limit: Option<usize>) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let engine = collection.engine(SystemClock)?;
    let limit = limit.or(collection.config.review_limit);
    let mut rng = TinyRng::from_time();
    let mut out = stdout();
    let input = BufReader::new(stdin());
    let summary = run_review(
        &engine,
        &collection.catalog,
        limit,
        &mut rng,
        input,
        &mut out,
    )
    .await?;
    writeln!(
        out,
        "\nReviewed {} items, {} correct.",
        summary.reviewed, summary.correct
    )?;
    if summary.skipped > 0 {
        writeln!(
            out,
            "{} items refer to questions no longer in the catalog.",
            summary.skipped
        )?;
    }
    Ok(())
}

/// Ask every due item once, in random order, and reschedule it from the
/// answer. Typing `q` stops early; items not reached stay due.
pub async fn run_review<S, E, C, R, W>(
    engine: &Engine<S, E, C>,
    catalog: &Catalog,
    limit: Option<usize>,
    rng: &mut TinyRng,
    input: R,
    out: &mut W,
) -> Fallible<ReviewSummary>
where
    S: KeyValueStore,
    E: EventSink,
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary = ReviewSummary::default();
    let mut due: Vec<StudyItem> = shuffle(engine.due_items()?, rng);
    if let Some(limit) = limit {
        due.truncate(limit);
    }
    if due.is_empty() {
        writeln!(out, "Nothing is due for review.")?;
        return Ok(summary);
    }
    writeln!(out, "{} items due. Answer with a number, q to stop.", due.len())?;
    let mut lines = input.lines();
    'items: for item in due.iter() {
        let Some(question) = catalog.question(&item.exam_id, item.question_id) else {
            log::warn!(
                "Study item for question {} of '{}' has no question in the catalog",
                item.question_id,
                item.exam_id
            );
            summary.skipped += 1;
            continue;
        };
        writeln!(out)?;
        write_question(out, question, None)?;
        let option = loop {
            let Some(line) = lines.next_line().await? else {
                break 'items;
            };
            let line = line.trim();
            if line == "q" {
                break 'items;
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=question.options().len()).contains(&n) => break n - 1,
                _ => writeln!(
                    out,
                    "Enter a number from 1 to {}.",
                    question.options().len()
                )?,
            }
        };
        let is_correct = question.accepts(option);
        let quality = engine.policy().quality_for(is_correct);
        let updated = engine.review(&item.exam_id, item.question_id, quality)?;
        summary.reviewed += 1;
        if is_correct {
            summary.correct += 1;
            writeln!(out, "Correct.")?;
        } else {
            let answer = question
                .correct_option()
                .and_then(|idx| question.options().get(idx))
                .map(String::as_str)
                .unwrap_or("?");
            writeln!(out, "Wrong. The answer is: {answer}")?;
        }
        if !question.explanation().is_empty() {
            writeln!(out, "{}", question.explanation())?;
        }
        if let Some(next) = updated.next_review_date {
            writeln!(out, "Next review on {}.", next.date())?;
        }
    }
    Ok(summary)
}
