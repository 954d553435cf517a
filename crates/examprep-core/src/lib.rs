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

//! examprep-core: the exam session engine.
//!
//! This library provides:
//! - Catalog decoding and validation
//! - Scoring of answered exams
//! - The exam session state machine, with snapshot and resume
//! - SM-2 spaced repetition scheduling of study items
//! - Tag-filtered study quizzes
//! - Ports for persistence, completion events and time

pub mod catalog;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod quiz;
pub mod record;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod sm2;
pub mod store;
pub mod study;
pub mod types;

// Re-exports for convenience
pub use catalog::{Catalog, DecodeError, Exam, ExamType, Question};
pub use clock::Clock;
pub use engine::Engine;
pub use error::{EngineError, EngineResult, ErrorReport, Fallible, fail};
pub use events::EventSink;
pub use record::{CompletedExam, InProgressSnapshot, UserAnswer};
pub use session::{Session, SessionState};
pub use sm2::{Quality, schedule};
pub use store::{KeyValueStore, MemoryStore, ProgressStore};
pub use study::{StudyBook, StudyItem, StudyPolicy};
pub use types::date::Date;
pub use types::timestamp::Timestamp;
