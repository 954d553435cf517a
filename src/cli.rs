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

use clap::Parser;
use examprep_core::error::Fallible;

use crate::cmd::check::check_collection;
use crate::cmd::exams::discard_progress;
use crate::cmd::exams::list_exams;
use crate::cmd::quiz::take_quiz;
use crate::cmd::review::review_due;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::cmd::take::take_exam;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Check the catalog and the saved records of a collection.
    Check {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// List the exams in a collection.
    Exams {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Take an exam interactively.
    Take {
        /// Id of the exam to take.
        exam: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Continue the saved attempt instead of starting over.
        #[arg(long)]
        resume: bool,
    },
    /// Discard the saved attempt of an exam.
    Discard {
        /// Id of the exam.
        exam: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Take a study quiz built from questions with the given tags.
    Quiz {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Topic tag to draw questions from. Repeat for several tags.
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
        /// Number of questions. Defaults to `quiz_size` from the configuration.
        #[arg(long)]
        size: Option<usize>,
        /// Seed for the question order.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Review the study items due today.
    Review {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Maximum number of items to review. Defaults to `review_limit` from the configuration.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print collection statistics.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
        /// Only count attempts at this exam.
        #[arg(long)]
        exam: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Check { directory } => check_collection(directory),
        Command::Exams { directory } => list_exams(directory),
        Command::Take {
            exam,
            directory,
            resume,
        } => take_exam(directory, exam, resume).await,
        Command::Discard { exam, directory } => discard_progress(directory, exam),
        Command::Quiz {
            directory,
            tags,
            size,
            seed,
        } => take_quiz(directory, tags, size, seed).await,
        Command::Review { directory, limit } => review_due(directory, limit).await,
        Command::Stats {
            directory,
            format,
            exam,
        } => print_stats(directory, format, exam),
    }
}
