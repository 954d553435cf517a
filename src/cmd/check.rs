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

use examprep_core::Catalog;
use examprep_core::clock::SystemClock;
use examprep_core::error::Fallible;
use examprep_core::error::fail;

use crate::collection::Collection;

/// Load the catalog and every persisted record, and report what does not
/// line up.
pub fn check_collection(directory: Option<String>) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let engine = collection.engine(SystemClock)?;
    let history = engine.history(None)?;
    let snapshots = engine.in_progress()?;
    let items = engine.store().study_book()?.into_items();
    log::debug!("Stored records: {}", collection.store.keys()?.join(", "));

    let mut problems: Vec<String> = collection
        .errors
        .iter()
        .map(|e| e.to_string())
        .collect();
    let referenced = history
        .iter()
        .map(|c| c.exam_id.as_str())
        .chain(snapshots.iter().map(|s| s.exam_id.as_str()));
    problems.extend(unknown_exams(&collection.catalog, referenced));
    for item in items.iter() {
        if collection.catalog.question(&item.exam_id, item.question_id).is_none() {
            problems.push(format!(
                "study item refers to missing question {} of '{}'",
                item.question_id, item.exam_id
            ));
        }
    }

    for problem in problems.iter() {
        println!("{problem}");
    }
    if !problems.is_empty() {
        return fail(format!("{} problems found.", problems.len()));
    }
    println!(
        "{}: {} exams, {} attempts, {} saved, {} study items.",
        collection.directory.display(),
        collection.catalog.exams().len(),
        history.len(),
        snapshots.len(),
        items.len()
    );
    Ok(())
}

/// Records that name an exam the catalog does not have, reported once per
/// exam id.
fn unknown_exams<'a>(catalog: &Catalog, exam_ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<&str> = Vec::new();
    for exam_id in exam_ids {
        if catalog.exam(exam_id).is_none() && !seen.contains(&exam_id) {
            seen.push(exam_id);
        }
    }
    seen.into_iter()
        .map(|id| format!("records refer to unknown exam '{id}'"))
        .collect()
}
