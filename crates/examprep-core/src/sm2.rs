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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;

/// The ease factor never drops below this.
pub const MIN_EASE: f64 = 1.3;

/// Ease factor of an item that was never reviewed.
pub const DEFAULT_EASE: f64 = 2.5;

pub type Interval = u32;
pub type Ease = f64;

/// Recall quality on the SM-2 scale: 0 (blackout) to 5 (perfect). Anything
/// below 3 is a failed recall.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const BLACKOUT: Quality = Quality(0);
    pub const HARD: Quality = Quality(1);
    pub const GOOD: Quality = Quality(4);
    pub const PERFECT: Quality = Quality(5);

    pub fn new(value: u8) -> Result<Self, ErrorReport> {
        if value > 5 {
            Err(ErrorReport::new(format!(
                "quality must be between 0 and 5, got {value}"
            )))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_failure(self) -> bool {
        self.0 < 3
    }
}

impl TryFrom<u8> for Quality {
    type Error = ErrorReport;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ease factor after a review of the given quality.
pub fn new_ease(ease: Ease, quality: Quality) -> Ease {
    let d = 5.0 - f64::from(quality.0);
    f64::max(MIN_EASE, ease + (0.1 - d * (0.08 + d * 0.02)))
}

/// One SM-2 step. Returns the next interval in days and the updated ease.
///
/// The interval for mature items is multiplied by the *updated* ease.
pub fn schedule(previous_interval: Interval, ease: Ease, quality: Quality) -> (Interval, Ease) {
    let ease = new_ease(ease, quality);
    let interval = if quality.is_failure() {
        1
    } else {
        match previous_interval {
            0 => 1,
            1 => 6,
            n => (f64::from(n) * ease).floor() as Interval,
        }
    };
    (interval, ease)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    fn feq(a: f64, b: f64) -> bool {
        f64::abs(a - b) < 1e-9
    }

    #[test]
    fn test_first_review_perfect() {
        let (interval, ease) = schedule(0, 2.5, q(5));
        assert_eq!(interval, 1);
        assert!(feq(ease, 2.6));
    }

    #[test]
    fn test_second_review() {
        let (interval, _) = schedule(1, 2.5, q(4));
        assert_eq!(interval, 6);
    }

    #[test]
    fn test_mature_review_uses_updated_ease() {
        let (interval, ease) = schedule(6, 2.5, q(5));
        assert!(feq(ease, 2.6));
        assert_eq!(interval, 15);
    }

    #[test]
    fn test_failure_resets_interval() {
        for previous in [0, 1, 6, 15, 400] {
            for value in 0..3 {
                let (interval, _) = schedule(previous, 2.5, q(value));
                assert_eq!(interval, 1);
            }
        }
    }

    #[test]
    fn test_ease_monotonic_in_quality() {
        for previous in [0, 1, 6, 30] {
            let eases: Vec<Ease> = (3..=5).map(|v| schedule(previous, 2.5, q(v)).1).collect();
            assert!(eases.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_ease_floor() {
        for value in 0..=5 {
            for ease in [1.3, 1.35, 1.5, 2.5] {
                assert!(new_ease(ease, q(value)) >= MIN_EASE);
            }
        }
        assert!(feq(new_ease(1.3, q(0)), MIN_EASE));
    }

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(5).is_ok());
        assert!(Quality::new(6).is_err());
        assert!(q(2).is_failure());
        assert!(!q(3).is_failure());
    }

    #[test]
    fn test_quality_serializes_as_number() -> Fallible<()> {
        assert_eq!(serde_json::to_string(&q(4))?, "4");
        let parsed: Quality = serde_json::from_str("3")?;
        assert_eq!(parsed, q(3));
        assert!(serde_json::from_str::<Quality>("9").is_err());
        Ok(())
    }
}
