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

//! Read-only exam catalog, decoded from JSON documents.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::types::aliases::ExamId;
use crate::types::aliases::OptionIndex;
use crate::types::aliases::QuestionId;
use crate::types::aliases::Tag;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "Teórica")]
    Theoretical,
    #[serde(rename = "Teórico-Prática")]
    TheoreticalPractical,
}

impl ExamType {
    pub fn as_str(&self) -> &str {
        match self {
            ExamType::Theoretical => "Teórica",
            ExamType::TheoreticalPractical => "Teórico-Prática",
        }
    }
}

/// A single catalog question. Options are never empty, and the correct
/// option, when recorded, always indexes into them.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    id: QuestionId,
    number: u32,
    statement: String,
    options: Vec<String>,
    correct_option: Option<OptionIndex>,
    explanation: String,
    tags: Vec<Tag>,
    media: Option<String>,
}

impl Question {
    /// Build a question, checking the option invariants.
    pub fn new(
        id: QuestionId,
        statement: impl Into<String>,
        options: Vec<String>,
        correct_option: Option<OptionIndex>,
    ) -> Result<Self, String> {
        if options.is_empty() {
            return Err(format!("question {id} has no options"));
        }
        if let Some(correct) = correct_option {
            if correct >= options.len() {
                return Err(format!(
                    "question {id} marks option {correct} as correct but has {} options",
                    options.len()
                ));
            }
        }
        Ok(Self {
            id,
            number: id,
            statement: statement.into(),
            options,
            correct_option,
            explanation: String::new(),
            tags: Vec::new(),
            media: None,
        })
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_tags<T: Into<Tag>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The same question under a new id and number.
    pub(crate) fn renumbered(mut self, id: QuestionId) -> Self {
        self.id = id;
        self.number = id;
        self
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_option(&self) -> Option<OptionIndex> {
        self.correct_option
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn media(&self) -> Option<&str> {
        self.media.as_deref()
    }

    /// A nullified question has no recorded answer; every option counts.
    pub fn is_nullified(&self) -> bool {
        self.correct_option.is_none()
    }

    pub fn accepts(&self, option: OptionIndex) -> bool {
        match self.correct_option {
            None => true,
            Some(correct) => correct == option,
        }
    }

    pub fn has_any_tag(&self, tags: &BTreeSet<Tag>) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}

/// An exam: an ordered list of questions plus the declared question count
/// used as the scoring denominator.
#[derive(Clone, Debug, PartialEq)]
pub struct Exam {
    id: ExamId,
    name: String,
    exam_type: ExamType,
    total_questions: usize,
    questions: Vec<Question>,
}

impl Exam {
    /// Build an exam. A missing total defaults to the number of questions.
    pub fn new(
        id: impl Into<ExamId>,
        name: impl Into<String>,
        exam_type: ExamType,
        total_questions: Option<usize>,
        questions: Vec<Question>,
    ) -> Result<Self, String> {
        let id = id.into();
        let mut seen: HashSet<QuestionId> = HashSet::new();
        for question in questions.iter() {
            if !seen.insert(question.id) {
                return Err(format!(
                    "exam '{id}' contains question {} more than once",
                    question.id
                ));
            }
        }
        Ok(Self::new_unchecked(
            id,
            name.into(),
            exam_type,
            total_questions.unwrap_or(questions.len()),
            questions,
        ))
    }

    /// Build an exam whose question ids are already known to be unique.
    pub(crate) fn new_unchecked(
        id: ExamId,
        name: String,
        exam_type: ExamType,
        total_questions: usize,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id,
            name,
            exam_type,
            total_questions,
            questions,
        }
    }

    pub fn id(&self) -> &ExamId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exam_type(&self) -> ExamType {
        self.exam_type
    }

    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: QuestionId,
    number: u32,
    statement: String,
    options: Vec<String>,
    correct_option: Option<OptionIndex>,
    explanation: String,
    #[serde(default)]
    tags: Vec<Tag>,
    video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExam {
    id: ExamId,
    name: String,
    #[serde(rename = "type")]
    exam_type: ExamType,
    total_questions: Option<usize>,
    questions: Vec<RawQuestion>,
}

impl TryFrom<RawExam> for Exam {
    type Error = String;

    fn try_from(raw: RawExam) -> Result<Self, Self::Error> {
        let mut questions = Vec::with_capacity(raw.questions.len());
        for q in raw.questions {
            let mut question = Question::new(q.id, q.statement, q.options, q.correct_option)?
                .with_number(q.number)
                .with_explanation(q.explanation)
                .with_tags(q.tags);
            question.media = q.video_url;
            questions.push(question);
        }
        Exam::new(
            raw.id,
            raw.name,
            raw.exam_type,
            raw.total_questions,
            questions,
        )
    }
}

/// A catalog document, or one exam inside it, failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub message: String,
    pub source_path: String,
    /// Position of the exam within an array document.
    pub entry: Option<usize>,
}

impl DecodeError {
    pub fn new(message: impl Into<String>, source_path: &str, entry: Option<usize>) -> Self {
        DecodeError {
            message: message.into(),
            source_path: source_path.to_string(),
            entry,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.entry {
            Some(entry) => write!(
                f,
                "{} Location: {}[{}]",
                self.message, self.source_path, entry
            ),
            None => write!(f, "{} Location: {}", self.message, self.source_path),
        }
    }
}

impl Error for DecodeError {}

fn decode_value(
    value: Value,
    source_path: &str,
    entry: Option<usize>,
) -> Result<Exam, DecodeError> {
    let raw: RawExam = serde_json::from_value(value)
        .map_err(|e| DecodeError::new(e.to_string(), source_path, entry))?;
    Exam::try_from(raw).map_err(|e| DecodeError::new(e, source_path, entry))
}

/// Decode one document holding a single exam object.
pub fn decode_exam(source_path: &str, text: &str) -> Result<Exam, DecodeError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| DecodeError::new(e.to_string(), source_path, None))?;
    decode_value(value, source_path, None)
}

/// Decode one document holding either an exam object or an array of them.
/// Each exam is decoded on its own: a bad entry is reported and skipped.
pub fn decode_document(source_path: &str, text: &str) -> (Vec<Exam>, Vec<DecodeError>) {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return (Vec::new(), vec![DecodeError::new(e.to_string(), source_path, None)]),
    };
    let mut exams = Vec::new();
    let mut errors = Vec::new();
    match value {
        Value::Array(entries) => {
            for (idx, entry) in entries.into_iter().enumerate() {
                match decode_value(entry, source_path, Some(idx)) {
                    Ok(exam) => exams.push(exam),
                    Err(e) => errors.push(e),
                }
            }
        }
        value => match decode_value(value, source_path, None) {
            Ok(exam) => exams.push(exam),
            Err(e) => errors.push(e),
        },
    }
    (exams, errors)
}

/// The set of exams available to the engine.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    exams: Vec<Arc<Exam>>,
}

impl Catalog {
    /// Decode several `(source path, content)` documents. Exams that fail to
    /// decode, or whose id was already loaded, are reported and skipped.
    pub fn from_documents<'a>(
        documents: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> (Self, Vec<DecodeError>) {
        let mut catalog = Catalog::default();
        let mut errors = Vec::new();
        for (source_path, text) in documents {
            let (exams, errs) = decode_document(source_path, text);
            errors.extend(errs);
            for exam in exams {
                if catalog.exam(exam.id()).is_some() {
                    errors.push(DecodeError::new(
                        format!("duplicate exam id '{}'", exam.id()),
                        source_path,
                        None,
                    ));
                    continue;
                }
                catalog.exams.push(Arc::new(exam));
            }
        }
        (catalog, errors)
    }

    pub fn exams(&self) -> &[Arc<Exam>] {
        &self.exams
    }

    pub fn exam(&self, id: &str) -> Option<Arc<Exam>> {
        self.exams.iter().find(|e| e.id() == id).cloned()
    }

    pub fn question(&self, exam_id: &str, question_id: QuestionId) -> Option<&Question> {
        self.exams
            .iter()
            .find(|e| e.id() == exam_id)
            .and_then(|e| e.question(question_id))
    }

    /// Every tag used by at least one question.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.exams
            .iter()
            .flat_map(|e| e.questions())
            .flat_map(|q| q.tags())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }
}
