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

use std::fs::write;
use std::path::PathBuf;

use examprep_core::error::Fallible;
use tempfile::tempdir;

/// A fresh, empty temporary directory. It is not deleted on drop so that
/// SQLite handles opened by the test can outlive the guard.
pub fn create_tmp_directory() -> Fallible<PathBuf> {
    let dir = tempdir()?.keep();
    Ok(dir.canonicalize()?)
}

pub const ROAD_2023: &str = r#"{
    "id": "road-2023",
    "name": "Road Code 2023",
    "type": "Teórica",
    "questions": [
        {
            "id": 1,
            "number": 1,
            "statement": "What does a red light mean?",
            "options": ["Go", "Stop", "Speed up"],
            "correctOption": 1,
            "explanation": "Red means stop.",
            "tags": ["signals"]
        },
        {
            "id": 2,
            "number": 2,
            "statement": "Maximum speed in town?",
            "options": ["30", "50", "90"],
            "correctOption": 1,
            "explanation": "50 km/h unless signposted.",
            "tags": ["speed"]
        },
        {
            "id": 3,
            "number": 3,
            "statement": "Annulled question",
            "options": ["Yes", "No"],
            "explanation": "Annulled by the board."
        }
    ]
}"#;

pub const ROAD_2024: &str = r#"[{
    "id": "road-2024",
    "name": "Road Code 2024",
    "type": "Teórico-Prática",
    "totalQuestions": 4,
    "questions": [
        {
            "id": 1,
            "number": 1,
            "statement": "What does a red light mean?",
            "options": ["Go", "Stop", "Speed up"],
            "correctOption": 1,
            "explanation": "Red means stop.",
            "tags": ["signals"]
        },
        {
            "id": 10,
            "number": 2,
            "statement": "Who has priority at a roundabout?",
            "options": ["Entering traffic", "Traffic inside"],
            "correctOption": 1,
            "explanation": "Traffic already inside.",
            "tags": ["priority", "signals"],
            "videoUrl": "media/roundabout.mp4"
        }
    ]
}]"#;

/// A temporary collection holding two sample exams.
pub fn create_tmp_collection() -> Fallible<PathBuf> {
    let dir = create_tmp_directory()?;
    write(dir.join("road-2023.json"), ROAD_2023)?;
    write(dir.join("road-2024.json"), ROAD_2024)?;
    Ok(dir)
}
