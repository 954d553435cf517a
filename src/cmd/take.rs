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
use std::time::Duration;

use examprep_core::Clock;
use examprep_core::CompletedExam;
use examprep_core::Engine;
use examprep_core::EventSink;
use examprep_core::InProgressSnapshot;
use examprep_core::KeyValueStore;
use examprep_core::Session;
use examprep_core::clock::SystemClock;
use examprep_core::error::Fallible;
use examprep_core::error::fail;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::stdin;
use tokio::select;
use tokio::time::MissedTickBehavior;
use tokio::time::interval;

use crate::cmd::format_duration;
use crate::cmd::write_question;
use crate::cmd::write_summary;
use crate::collection::Collection;

/// What the session is attached to. Quizzes are throwaway: they are never
/// saved and never reach the completed log.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    Exam,
    Quiz,
}

#[derive(Debug, PartialEq)]
pub enum Action {
    /// Zero-based option index.
    Answer(usize),
    Next,
    Previous,
    /// Zero-based question index.
    GoTo(usize),
    Show,
    Save,
    Finish,
    Time,
    Help,
    Quit,
}

impl Action {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            return match n {
                0 => Err("Options are numbered from 1.".to_string()),
                n => Ok(Action::Answer(n - 1)),
            };
        }
        if let Some(rest) = line.strip_prefix("g ") {
            return match rest.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(Action::GoTo(n - 1)),
                _ => Err(format!("Invalid question number '{}'.", rest.trim())),
            };
        }
        match line {
            "" => Ok(Action::Show),
            "n" | "next" => Ok(Action::Next),
            "p" | "prev" => Ok(Action::Previous),
            "s" | "save" => Ok(Action::Save),
            "f" | "finish" => Ok(Action::Finish),
            "t" | "time" => Ok(Action::Time),
            "h" | "help" | "?" => Ok(Action::Help),
            "q" | "quit" => Ok(Action::Quit),
            other => Err(format!("Unknown command '{other}'. Type h for help.")),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Finished(CompletedExam),
    Saved(InProgressSnapshot),
    Abandoned,
}

const HELP: &str = "\
Commands:
  <number>   select that option for the current question
  n / p      next / previous question
  g <number> go to a question
  t          show elapsed time
  s          save and exit
  f          finish and score
  q          quit without saving
  h          show this help";

/// Start or resume an exam from the collection and drive it from stdin.
pub async fn take_exam(directory: Option<String>, exam_id: String, resume: bool) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let Some(exam) = collection.catalog.exam(&exam_id) else {
        return fail(format!("No exam with id '{exam_id}'."));
    };
    let engine = collection.engine(SystemClock)?;
    let mut session = if resume {
        match engine.resume(exam.clone())? {
            Some(session) => session,
            None => {
                println!("No saved progress for '{exam_id}', starting a new attempt.");
                engine.start(exam.clone())?
            }
        }
    } else {
        engine.start(exam.clone())?
    };
    let mut out = stdout();
    let input = BufReader::new(stdin());
    let outcome = run_session(&engine, &mut session, Mode::Exam, input, &mut out).await?;
    match outcome {
        Outcome::Finished(completed) => {
            write_summary(&mut out, &exam, &completed)?;
            let reviewed = engine.schedule_from(&completed, &exam)?;
            writeln!(out, "\n{reviewed} study items updated.")?;
        }
        Outcome::Saved(snapshot) => {
            writeln!(
                out,
                "Progress saved ({} answered). Resume with: examprep take {} --resume",
                snapshot.user_answers.len(),
                snapshot.exam_id
            )?;
        }
        Outcome::Abandoned => writeln!(out, "Attempt abandoned.")?,
    }
    Ok(())
}

/// Run the interactive loop until the attempt is finished, saved or
/// abandoned. Input lines and a one-second display tick are multiplexed on
/// the current task.
pub async fn run_session<S, E, C, R, W>(
    engine: &Engine<S, E, C>,
    session: &mut Session,
    mode: Mode,
    input: R,
    out: &mut W,
) -> Fallible<Outcome>
where
    S: KeyValueStore,
    E: EventSink,
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    if session.is_resumed() {
        writeln!(
            out,
            "Resuming with {} answers after {}.",
            session.answered_count(),
            format_duration(session.elapsed(engine.clock().now()))
        )?;
    }
    writeln!(out, "{HELP}")?;
    write_current(out, session)?;
    loop {
        select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return interrupted(engine, session, mode);
                };
                let action = match Action::parse(&line) {
                    Ok(action) => action,
                    Err(message) => {
                        writeln!(out, "{message}")?;
                        continue;
                    }
                };
                if let Some(outcome) = apply(engine, session, mode, action, out)? {
                    return Ok(outcome);
                }
            }
            _ = ticker.tick() => {
                session.tick(engine.clock().now());
            }
        }
    }
}

fn apply<S, E, C, W>(
    engine: &Engine<S, E, C>,
    session: &mut Session,
    mode: Mode,
    action: Action,
    out: &mut W,
) -> Fallible<Option<Outcome>>
where
    S: KeyValueStore,
    E: EventSink,
    C: Clock,
    W: Write,
{
    let moved = match action {
        Action::Answer(option) => session.select_current(option),
        Action::Next => session.move_next(),
        Action::Previous => session.move_previous(),
        Action::GoTo(index) => session.go_to(index),
        Action::Show => Ok(()),
        Action::Time => {
            let elapsed = session.tick(engine.clock().now());
            writeln!(out, "Elapsed: {}", format_duration(elapsed))?;
            return Ok(None);
        }
        Action::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(None);
        }
        Action::Quit => return Ok(Some(Outcome::Abandoned)),
        Action::Save => {
            if mode == Mode::Quiz {
                writeln!(out, "Quizzes cannot be saved. Finish or quit instead.")?;
                return Ok(None);
            }
            return match engine.save_and_exit(session) {
                Ok(snapshot) => Ok(Some(Outcome::Saved(snapshot))),
                Err(e) => {
                    writeln!(out, "Could not save progress: {e}")?;
                    Ok(None)
                }
            };
        }
        Action::Finish => {
            let result = match mode {
                Mode::Exam => engine.finish(session),
                Mode::Quiz => session.finish(engine.clock().now()),
            };
            return match result {
                Ok(completed) => Ok(Some(Outcome::Finished(completed))),
                Err(e) => {
                    writeln!(out, "Could not finish: {e}")?;
                    Ok(None)
                }
            };
        }
    };
    match moved {
        Ok(()) => write_current(out, session)?,
        Err(e) => writeln!(out, "{e}")?,
    }
    Ok(None)
}

/// Input closed mid-attempt. Exams are saved so the attempt can be resumed.
fn interrupted<S, E, C>(
    engine: &Engine<S, E, C>,
    session: &mut Session,
    mode: Mode,
) -> Fallible<Outcome>
where
    S: KeyValueStore,
    E: EventSink,
    C: Clock,
{
    match mode {
        Mode::Exam => {
            log::warn!("Input closed, saving progress");
            Ok(Outcome::Saved(engine.save_and_exit(session)?))
        }
        Mode::Quiz => fail("Session interrupted before completion."),
    }
}

fn write_current<W: Write>(out: &mut W, session: &Session) -> Fallible<()> {
    let Some(exam) = session.exam() else {
        return Ok(());
    };
    let Some(question) = session.current_question() else {
        writeln!(out, "This exam has no questions. Type f to finish.")?;
        return Ok(());
    };
    writeln!(out)?;
    writeln!(
        out,
        "[{}/{}] Question {} ({} answered)",
        session.current_index() + 1,
        exam.questions().len(),
        question.number(),
        session.answered_count()
    )?;
    write_question(out, question, session.answer_for(question.id()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;
    use examprep_core::Exam;
    use examprep_core::MemoryStore;
    use examprep_core::SessionState;
    use examprep_core::Timestamp;
    use examprep_core::catalog::decode_exam;
    use examprep_core::clock::ManualClock;
    use examprep_core::events::RecordingSink;

    use super::*;
    use crate::helper::ROAD_2023;

    fn start() -> Timestamp {
        Timestamp::try_from("2024-05-01T09:00:00.000".to_string()).unwrap()
    }

    fn road() -> Arc<Exam> {
        Arc::new(decode_exam("road-2023.json", ROAD_2023).unwrap())
    }

    struct Fixture {
        store: MemoryStore,
        sink: RecordingSink,
        clock: ManualClock,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                sink: RecordingSink::new(),
                clock: ManualClock::new(start()),
            }
        }

        fn engine(&self) -> Engine<&MemoryStore, &RecordingSink, &ManualClock> {
            Engine::new(&self.store, &self.sink, &self.clock)
        }
    }

    async fn drive(
        engine: &Engine<&MemoryStore, &RecordingSink, &ManualClock>,
        session: &mut Session,
        mode: Mode,
        input: &str,
    ) -> (Fallible<Outcome>, String) {
        let mut out = Vec::new();
        let outcome = run_session(engine, session, mode, input.as_bytes(), &mut out).await;
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(Action::parse("2"), Ok(Action::Answer(1)));
        assert_eq!(Action::parse(" n "), Ok(Action::Next));
        assert_eq!(Action::parse("g 3"), Ok(Action::GoTo(2)));
        assert_eq!(Action::parse(""), Ok(Action::Show));
        assert_eq!(Action::parse("finish"), Ok(Action::Finish));
        assert!(Action::parse("0").is_err());
        assert!(Action::parse("g 0").is_err());
        assert!(Action::parse("g x").is_err());
        assert!(Action::parse("jump").is_err());
    }

    #[tokio::test]
    async fn test_answer_and_finish() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut session = engine.start(road()).unwrap();
        let (outcome, text) = drive(&engine, &mut session, Mode::Exam, "2\nn\n1\nf\n").await;
        let Ok(Outcome::Finished(completed)) = outcome else {
            panic!("expected a finished attempt");
        };
        assert_eq!(completed.actual_question_count, 2);
        assert_eq!(completed.correct_count(), 1);
        assert!((completed.score - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(fx.sink.events().len(), 1);
        assert_eq!(engine.history(None).unwrap().len(), 1);
        assert!(text.contains("[2/3] Question 2"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_reported() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut session = engine.start(road()).unwrap();
        let (outcome, text) = drive(&engine, &mut session, Mode::Exam, "9\nxyz\ng 7\nq\n").await;
        assert!(matches!(outcome, Ok(Outcome::Abandoned)));
        assert!(text.contains("out of range"));
        assert!(text.contains("Unknown command 'xyz'"));
        assert!(session.answers().is_empty());
        assert_eq!(session.current_index(), 0);
    }

    #[tokio::test]
    async fn test_save_then_resume() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let exam = road();
        let mut session = engine.start(exam.clone()).unwrap();
        let (outcome, _) = drive(&engine, &mut session, Mode::Exam, "2\nn\ns\n").await;
        assert!(matches!(outcome, Ok(Outcome::Saved(_))));
        assert_eq!(session.state(), SessionState::Suspended);

        fx.clock.advance(ChronoDuration::minutes(10));
        let mut resumed = engine.resume(exam).unwrap().unwrap();
        assert_eq!(resumed.current_index(), 1);
        let (outcome, text) = drive(&engine, &mut resumed, Mode::Exam, "f\n").await;
        assert!(matches!(outcome, Ok(Outcome::Finished(_))));
        assert!(text.contains("Resuming with 1 answers"));
        assert!(engine.in_progress().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_running() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut session = engine.start(road()).unwrap();
        fx.store.set_read_only(true);
        let (outcome, text) = drive(&engine, &mut session, Mode::Exam, "1\ns\nq\n").await;
        assert!(matches!(outcome, Ok(Outcome::Abandoned)));
        assert!(text.contains("Could not save progress"));
        assert_eq!(session.answer_for(1), Some(0));
    }

    #[tokio::test]
    async fn test_end_of_input_saves_exam() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut session = engine.start(road()).unwrap();
        let (outcome, _) = drive(&engine, &mut session, Mode::Exam, "3\n").await;
        assert!(matches!(outcome, Ok(Outcome::Saved(_))));
        assert_eq!(engine.in_progress().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quiz_is_not_persisted() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut session = Session::new();
        session.start(road(), fx.clock.now()).unwrap();
        let (outcome, text) = drive(&engine, &mut session, Mode::Quiz, "2\ns\nf\n").await;
        assert!(matches!(outcome, Ok(Outcome::Finished(_))));
        assert!(text.contains("Quizzes cannot be saved"));
        assert!(engine.history(None).unwrap().is_empty());
        assert!(fx.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_end_of_input_fails() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut session = Session::new();
        session.start(road(), fx.clock.now()).unwrap();
        let (outcome, _) = drive(&engine, &mut session, Mode::Quiz, "").await;
        assert!(outcome.is_err());
    }
}
