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

use std::env::current_dir;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use examprep_core::Catalog;
use examprep_core::Clock;
use examprep_core::DecodeError;
use examprep_core::Engine;
use examprep_core::error::ErrorReport;
use examprep_core::error::Fallible;
use examprep_core::error::fail;
use walkdir::WalkDir;

use crate::cmd::LogSink;
use crate::config::Config;
use crate::db::SqliteStore;

/// A directory of catalog files plus the database and configuration that
/// live next to them.
pub struct Collection {
    pub directory: PathBuf,
    pub config: Config,
    pub store: SqliteStore,
    pub catalog: Catalog,
    /// Exams that failed to decode and were left out of the catalog.
    pub errors: Vec<DecodeError>,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        if !directory.exists() {
            return fail("directory does not exist.");
        }
        let directory = directory.canonicalize()?;
        let config = Config::load(&directory)?;
        let store = SqliteStore::open(&directory.join(&config.database))?;
        let (catalog, errors) = load_catalog(&directory)?;
        for error in errors.iter() {
            log::warn!("Skipping exam: {error}");
        }
        log::debug!(
            "Loaded {} exams from {}",
            catalog.exams().len(),
            directory.display()
        );
        Ok(Self {
            directory,
            config,
            store,
            catalog,
            errors,
        })
    }

    /// An engine over this collection's database, using the configured
    /// study policy.
    pub fn engine<C: Clock>(&self, clock: C) -> Fallible<Engine<&SqliteStore, LogSink, C>> {
        let policy = self.config.study_policy()?;
        Ok(Engine::new(&self.store, LogSink, clock).with_policy(policy))
    }
}

/// Decode every `*.json` file under the directory, in path order.
pub fn load_catalog(directory: &Path) -> Fallible<(Catalog, Vec<DecodeError>)> {
    let mut documents: Vec<(String, String)> = Vec::new();
    let mut unreadable: Vec<DecodeError> = Vec::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry =
            entry.map_err(|e| ErrorReport::new(format!("Failed to walk directory: {e}")))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            let name = path
                .strip_prefix(directory)
                .unwrap_or(path)
                .display()
                .to_string();
            match read_to_string(path) {
                Ok(text) => documents.push((name, text)),
                Err(e) => {
                    let message = format!("Failed to read file: {e}.");
                    unreadable.push(DecodeError::new(message, &name, None));
                }
            }
        }
    }
    let (catalog, mut errors) = Catalog::from_documents(
        documents
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str())),
    );
    errors.extend(unreadable);
    Ok((catalog, errors))
}
