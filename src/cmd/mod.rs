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

pub mod check;
pub mod exams;
pub mod quiz;
pub mod review;
pub mod stats;
pub mod take;

use std::io::Write;

use chrono::Duration;
use examprep_core::CompletedExam;
use examprep_core::EventSink;
use examprep_core::Exam;
use examprep_core::Question;
use examprep_core::error::Fallible;

/// Writes completed attempts to the log. The CLI has no analytics backend.
pub struct LogSink;

impl EventSink for LogSink {
    fn exam_completed(&self, completed: &CompletedExam) {
        log::info!(
            "exam_completed: exam={} score={:.1} answered={}",
            completed.exam_id,
            completed.score,
            completed.actual_question_count
        );
    }
}

/// Format a duration as `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Print a question with numbered options, marking the selected one.
pub fn write_question<W: Write>(
    out: &mut W,
    question: &Question,
    selected: Option<usize>,
) -> Fallible<()> {
    writeln!(out, "{}", question.statement())?;
    if let Some(media) = question.media() {
        writeln!(out, "  (media: {media})")?;
    }
    for (idx, option) in question.options().iter().enumerate() {
        let marker = if selected == Some(idx) { '*' } else { ' ' };
        writeln!(out, " {marker}{}) {option}", idx + 1)?;
    }
    Ok(())
}

/// Print the score of an attempt followed by every question answered
/// wrongly, with the right answer and the explanation.
pub fn write_summary<W: Write>(
    out: &mut W,
    exam: &Exam,
    completed: &CompletedExam,
) -> Fallible<()> {
    writeln!(out)?;
    writeln!(out, "{}", exam.name())?;
    writeln!(
        out,
        "Score: {:.1}% ({} of {} correct, {} answered) in {}",
        completed.score,
        completed.correct_count(),
        exam.total_questions(),
        completed.actual_question_count,
        format_duration(completed.duration())
    )?;
    let mistakes: Vec<_> = completed.incorrect_answers().collect();
    if mistakes.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "Mistakes:")?;
    for answer in mistakes {
        let Some(question) = exam.question(answer.question_id) else {
            continue;
        };
        writeln!(out, "Q{}. {}", question.number(), question.statement())?;
        let option_text = |idx: usize| {
            question
                .options()
                .get(idx)
                .map(String::as_str)
                .unwrap_or("?")
        };
        writeln!(out, "  Your answer: {}", option_text(answer.selected_option))?;
        if let Some(correct) = question.correct_option() {
            writeln!(out, "  Correct answer: {}", option_text(correct))?;
        }
        if !question.explanation().is_empty() {
            writeln!(out, "  {}", question.explanation())?;
        }
    }
    Ok(())
}
