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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::catalog::DecodeError;
use crate::session::SessionState;
use crate::types::aliases::ExamId;
use crate::types::aliases::QuestionId;

/// A stringly-typed error used at the application boundary.
#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        ErrorReport {
            message: msg.into(),
        }
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport {
            message: format!("I/O error: {value:#?}"),
        }
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport {
            message: format!("JSON error: {value:#?}"),
        }
    }
}

impl From<DecodeError> for ErrorReport {
    fn from(value: DecodeError) -> Self {
        ErrorReport {
            message: format!("Decode error: {value}"),
        }
    }
}

impl From<EngineError> for ErrorReport {
    fn from(value: EngineError) -> Self {
        ErrorReport {
            message: value.to_string(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport {
        message: msg.into(),
    })
}

/// Errors raised by the engine. Every variant is recoverable: the operation
/// that produced it left the session and the persisted records untouched.
#[derive(Debug, PartialEq)]
pub enum EngineError {
    /// A catalog document failed validation.
    Decode(DecodeError),
    /// The session is not in a state that allows the operation.
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    /// Reading or writing a persisted record failed.
    Persistence { key: String, message: String },
    /// An option or question index outside `[0, bound)`.
    OutOfRangeIndex { index: usize, bound: usize },
    /// The question id does not belong to the exam in progress.
    UnknownQuestion(QuestionId),
    /// A saved attempt was offered to a different exam.
    SnapshotMismatch { expected: ExamId, found: ExamId },
}

impl EngineError {
    pub fn persistence(key: impl Into<String>, message: impl Display) -> Self {
        EngineError::Persistence {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Decode(e) => write!(f, "invalid catalog: {e}"),
            EngineError::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while the session is {state}")
            }
            EngineError::Persistence { key, message } => {
                write!(f, "failed to access '{key}': {message}")
            }
            EngineError::OutOfRangeIndex { index, bound } => {
                write!(f, "index {index} is out of range (expected < {bound})")
            }
            EngineError::UnknownQuestion(id) => write!(f, "unknown question id {id}"),
            EngineError::SnapshotMismatch { expected, found } => {
                write!(f, "saved attempt belongs to exam '{found}', not '{expected}'")
            }
        }
    }
}

impl Error for EngineError {}

impl From<DecodeError> for EngineError {
    fn from(value: DecodeError) -> Self {
        EngineError::Decode(value)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
