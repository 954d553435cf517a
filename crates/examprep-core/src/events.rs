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

//! Outbound notifications for collaborators such as achievement tracking.

use std::cell::RefCell;
use std::sync::mpsc::Sender;

use crate::record::CompletedExam;

/// Receives completed attempts. Fire-and-forget: the engine ignores
/// whatever the sink does with the event.
pub trait EventSink {
    fn exam_completed(&self, completed: &CompletedExam);
}

/// Drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn exam_completed(&self, _completed: &CompletedExam) {}
}

/// Forwards events over a channel. A hung-up receiver is ignored.
impl EventSink for Sender<CompletedExam> {
    fn exam_completed(&self, completed: &CompletedExam) {
        if self.send(completed.clone()).is_err() {
            log::debug!("Event receiver is gone, dropping exam_completed");
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<CompletedExam>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CompletedExam> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn exam_completed(&self, completed: &CompletedExam) {
        self.events.borrow_mut().push(completed.clone());
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn exam_completed(&self, completed: &CompletedExam) {
        (**self).exam_completed(completed)
    }
}
