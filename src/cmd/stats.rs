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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use examprep_core::Catalog;
use examprep_core::CompletedExam;
use examprep_core::Date;
use examprep_core::InProgressSnapshot;
use examprep_core::StudyItem;
use examprep_core::Timestamp;
use examprep_core::clock::SystemClock;
use examprep_core::error::Fallible;
use examprep_core::study::due_items;
use serde::Serialize;

use crate::collection::Collection;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum StatsFormat {
    Text,
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Stats {
    pub exams: usize,
    pub questions: usize,
    pub attempts: usize,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
    pub in_progress: usize,
    pub study_items: usize,
    pub due_today: usize,
    pub per_exam: Vec<ExamStats>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ExamStats {
    pub exam_id: String,
    pub name: String,
    pub attempts: usize,
    pub best_score: Option<f64>,
    pub last_score: Option<f64>,
    pub last_taken: Option<Timestamp>,
}

pub fn print_stats(
    directory: Option<String>,
    format: StatsFormat,
    exam_id: Option<String>,
) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let engine = collection.engine(SystemClock)?;
    let history = engine.history(exam_id.as_deref())?;
    let snapshots = engine.in_progress()?;
    let items = engine.store().study_book()?.into_items();
    let stats = compute_stats(
        &collection.catalog,
        &history,
        &snapshots,
        &items,
        Date::today(),
    );
    match format {
        StatsFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        StatsFormat::Text => print!("{}", render_text(&stats)),
    }
    Ok(())
}

pub fn compute_stats(
    catalog: &Catalog,
    history: &[CompletedExam],
    snapshots: &[InProgressSnapshot],
    items: &[StudyItem],
    today: Date,
) -> Stats {
    let scores: Vec<f64> = history.iter().map(|c| c.score).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };
    let per_exam = catalog
        .exams()
        .iter()
        .map(|exam| {
            let attempts: Vec<&CompletedExam> =
                history.iter().filter(|c| &c.exam_id == exam.id()).collect();
            let last = attempts.iter().max_by_key(|c| c.end_time);
            ExamStats {
                exam_id: exam.id().clone(),
                name: exam.name().to_string(),
                attempts: attempts.len(),
                best_score: max_score(attempts.iter().map(|c| c.score)),
                last_score: last.map(|c| c.score),
                last_taken: last.map(|c| c.end_time),
            }
        })
        .collect();
    Stats {
        exams: catalog.exams().len(),
        questions: catalog.exams().iter().map(|e| e.questions().len()).sum(),
        attempts: history.len(),
        average_score,
        best_score: max_score(scores.into_iter()),
        in_progress: snapshots.len(),
        study_items: items.len(),
        due_today: due_items(items, today).len(),
        per_exam,
    }
}

fn max_score(scores: impl Iterator<Item = f64>) -> Option<f64> {
    scores.fold(None, |best, s| match best {
        Some(b) if b >= s => Some(b),
        _ => Some(s),
    })
}

fn render_text(stats: &Stats) -> String {
    let pct = |score: Option<f64>| match score {
        Some(s) => format!("{s:.1}%"),
        None => "-".to_string(),
    };
    let mut text = String::new();
    text.push_str(&format!("Exams: {}\n", stats.exams));
    text.push_str(&format!("Questions: {}\n", stats.questions));
    text.push_str(&format!("Attempts: {}\n", stats.attempts));
    text.push_str(&format!("Average score: {}\n", pct(stats.average_score)));
    text.push_str(&format!("Best score: {}\n", pct(stats.best_score)));
    text.push_str(&format!("In progress: {}\n", stats.in_progress));
    text.push_str(&format!(
        "Study items: {} ({} due today)\n",
        stats.study_items, stats.due_today
    ));
    for exam in stats.per_exam.iter().filter(|e| e.attempts > 0) {
        text.push_str(&format!(
            "  {}: {} attempts, best {}, last {}\n",
            exam.exam_id,
            exam.attempts,
            pct(exam.best_score),
            pct(exam.last_score)
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;
    use examprep_core::Quality;
    use examprep_core::scoring::score;

    use super::*;
    use crate::collection::load_catalog;
    use crate::helper::create_tmp_collection;

    fn at(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn attempt(
        catalog: &Catalog,
        exam_id: &str,
        picks: &[(u32, usize)],
        end: Timestamp,
    ) -> CompletedExam {
        let exam = catalog.exam(exam_id).unwrap();
        let answers: BTreeMap<u32, usize> = picks.iter().copied().collect();
        let card = score(&exam, &answers);
        CompletedExam::new(exam_id, end.minus(Duration::minutes(20)), end, card)
    }

    #[test]
    fn test_empty_history() -> Fallible<()> {
        let dir = create_tmp_collection()?;
        let (catalog, _) = load_catalog(&dir)?;
        let today = at("2024-05-01T09:00:00.000").date();
        let stats = compute_stats(&catalog, &[], &[], &[], today);
        assert_eq!(stats.exams, 2);
        assert_eq!(stats.questions, 5);
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.average_score, None);
        assert!(stats.per_exam.iter().all(|e| e.last_score.is_none()));
        assert!(render_text(&stats).contains("Average score: -"));
        Ok(())
    }

    #[test]
    fn test_scores_and_due_items() -> Fallible<()> {
        let dir = create_tmp_collection()?;
        let (catalog, _) = load_catalog(&dir)?;
        let first = attempt(
            &catalog,
            "road-2023",
            &[(1, 1), (2, 1), (3, 0)],
            at("2024-05-01T10:00:00.000"),
        );
        let second = attempt(
            &catalog,
            "road-2023",
            &[(1, 0)],
            at("2024-05-02T10:00:00.000"),
        );
        let third = attempt(
            &catalog,
            "road-2024",
            &[(1, 1), (10, 1)],
            at("2024-05-02T11:00:00.000"),
        );

        let mut reviewed = StudyItem::new("road-2023", 2);
        reviewed.review(Quality::GOOD, at("2024-05-02T10:00:00.000"));
        let items = vec![StudyItem::new("road-2023", 1), reviewed];

        let today = at("2024-05-02T12:00:00.000").date();
        let stats = compute_stats(&catalog, &[first, second, third], &[], &items, today);
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.best_score, Some(100.0));
        assert_eq!(stats.study_items, 2);
        assert_eq!(stats.due_today, 1);

        let road_2023 = &stats.per_exam[0];
        assert_eq!(road_2023.exam_id, "road-2023");
        assert_eq!(road_2023.attempts, 2);
        assert_eq!(road_2023.best_score, Some(100.0));
        assert_eq!(road_2023.last_score, Some(0.0));

        let road_2024 = &stats.per_exam[1];
        assert_eq!(road_2024.best_score, Some(50.0));

        let json = serde_json::to_value(&stats)?;
        assert_eq!(json["per_exam"][1]["attempts"], 1);
        Ok(())
    }
}
