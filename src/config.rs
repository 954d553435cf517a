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

use std::fs::read_to_string;
use std::path::Path;

use examprep_core::Quality;
use examprep_core::StudyPolicy;
use examprep_core::error::ErrorReport;
use examprep_core::error::Fallible;
use serde::Deserialize;

/// Name of the optional configuration file in the collection directory.
pub const CONFIG_FILE: &str = "examprep.toml";

/// Startup configuration. Every field has a default, so the file itself is
/// optional.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database file name, relative to the collection directory.
    pub database: String,
    /// Number of questions in a study quiz when none is given.
    pub quiz_size: usize,
    /// SM-2 quality recorded for a correct answer.
    pub correct_quality: u8,
    /// SM-2 quality recorded for a wrong answer.
    pub incorrect_quality: u8,
    /// Cap on the number of items in one review session.
    pub review_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "examprep.db".to_string(),
            quiz_size: 20,
            correct_quality: 4,
            incorrect_quality: 1,
            review_limit: None,
        }
    }
}

impl Config {
    /// Read `examprep.toml` from the directory, falling back to defaults
    /// when it is absent.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} found, using defaults");
            return Ok(Config::default());
        }
        let text = read_to_string(&path)?;
        Config::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)
            .map_err(|e| ErrorReport::new(format!("Failed to parse {CONFIG_FILE}: {e}")))?;
        config.study_policy()?;
        Ok(config)
    }

    pub fn study_policy(&self) -> Fallible<StudyPolicy> {
        Ok(StudyPolicy {
            correct: Quality::new(self.correct_quality)?,
            incorrect: Quality::new(self.incorrect_quality)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_defaults_when_missing() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert_eq!(Config::load(&dir)?, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let config = Config::parse("quiz_size = 5\ncorrect_quality = 5\n")?;
        assert_eq!(config.quiz_size, 5);
        assert_eq!(config.database, "examprep.db");
        assert_eq!(config.study_policy()?.correct, Quality::PERFECT);
        Ok(())
    }

    #[test]
    fn test_load_from_directory() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        std::fs::write(dir.join(CONFIG_FILE), "review_limit = 30\n")?;
        let config = Config::load(&dir)?;
        assert_eq!(config.review_limit, Some(30));
        Ok(())
    }

    #[test]
    fn test_invalid_quality_rejected() {
        assert!(Config::parse("incorrect_quality = 9\n").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("shuffle = true\n").is_err());
    }
}
