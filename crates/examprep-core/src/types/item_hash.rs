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

use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::aliases::QuestionId;

/// Stable identifier of a study item, derived from the (exam, question) pair
/// it tracks. Wraps blake3 because its hash type has no ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemHash {
    #[serde(skip)]
    inner: blake3::Hash,
}

impl ItemHash {
    pub fn of(exam_id: &str, question_id: QuestionId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(exam_id.as_bytes());
        // Separator so that ("a1", 2) and ("a", 12) differ.
        hasher.update(&[0]);
        hasher.update(&question_id.to_le_bytes());
        Self {
            inner: hasher.finalize(),
        }
    }

    pub fn to_hex(self) -> String {
        self.inner.to_hex().to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        let inner = blake3::Hash::from_hex(s)
            .map_err(|_| ErrorReport::new(format!("invalid study item id: '{s}'")))?;
        Ok(Self { inner })
    }
}

impl PartialOrd for ItemHash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemHash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.as_bytes().cmp(other.inner.as_bytes())
    }
}

impl Display for ItemHash {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for ItemHash {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ItemHash::from_hex(&value)
    }
}

impl From<ItemHash> for String {
    fn from(hash: ItemHash) -> String {
        hash.to_hex()
    }
}
