//! # Level Assessment Engine
//!
//! Maps facts about a child to a developmental [`Level`] in {0,1,2,3}.
//!
//! Two independent policies exist:
//! - Age bucketing ([`level_from_age`]): seeds the level when a profile is
//!   created.
//! - Vocabulary-size bucketing ([`level_from_known_word_count`]): recomputes
//!   the level after every known-word mutation.
//!
//! A third writer, the manual override, bypasses both. The writer that last
//! set a child's level is recorded as a [`LevelSource`].
//!
//! Every function here is pure and total over its documented domain. No
//! floats, no I/O; the only clock access is [`level_from_age_now`].

use crate::error::{CoreError, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Age in months at which a child moves from level 0 to 1.
pub const AGE_LEVEL_1_MONTHS: i64 = 18;
/// Age in months at which a child moves from level 1 to 2.
pub const AGE_LEVEL_2_MONTHS: i64 = 24;
/// Age in months at which a child moves from level 2 to 3.
pub const AGE_LEVEL_3_MONTHS: i64 = 36;

/// Known words needed for level 1.
pub const WORDS_LEVEL_1: usize = 10;
/// Known words needed for level 2.
pub const WORDS_LEVEL_2: usize = 50;
/// Known words needed for level 3.
pub const WORDS_LEVEL_3: usize = 200;

// =============================================================================
// LEVEL
// =============================================================================

/// Developmental speech level.
///
/// Serialized as its integer value. Out-of-range integers are rejected on
/// conversion, so a stored level is always in {0,1,2,3}.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    #[default]
    EarlySounds = 0,
    FirstWords = 1,
    WordCombinations = 2,
    ComplexSpeech = 3,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 4] = [
        Level::EarlySounds,
        Level::FirstWords,
        Level::WordCombinations,
        Level::ComplexSpeech,
    ];

    /// Integer value of the level.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Index into per-level arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short stage name, e.g. "Word Combinations".
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Level::EarlySounds => "Early Sounds",
            Level::FirstWords => "First Words",
            Level::WordCombinations => "Word Combinations",
            Level::ComplexSpeech => "Complex Speech",
        }
    }

    /// One-line description of the stage.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Level::EarlySounds => "Early sounds and first words",
            Level::FirstWords => "Single words and simple phrases",
            Level::WordCombinations => "Word combinations and short sentences",
            Level::ComplexSpeech => "Complex speech and conversations",
        }
    }

    /// Typical vocabulary size at this stage.
    #[must_use]
    pub fn word_range(self) -> &'static str {
        match self {
            Level::EarlySounds => "0-10 words",
            Level::FirstWords => "10-50 words",
            Level::WordCombinations => "50-200 words",
            Level::ComplexSpeech => "200+ words",
        }
    }

    /// Badge label, e.g. "Level 2 — Word Combinations".
    #[must_use]
    pub fn label(self) -> String {
        format!("Level {} — {}", self.as_u8(), self.name())
    }

    /// The next level up, if any.
    #[must_use]
    pub fn next(self) -> Option<Level> {
        match self {
            Level::EarlySounds => Some(Level::FirstWords),
            Level::FirstWords => Some(Level::WordCombinations),
            Level::WordCombinations => Some(Level::ComplexSpeech),
            Level::ComplexSpeech => None,
        }
    }

    /// Minimum known-word count for this level under count bucketing.
    #[must_use]
    pub fn word_threshold(self) -> usize {
        match self {
            Level::EarlySounds => 0,
            Level::FirstWords => WORDS_LEVEL_1,
            Level::WordCombinations => WORDS_LEVEL_2,
            Level::ComplexSpeech => WORDS_LEVEL_3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for Level {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self> {
        Level::try_from(i64::from(value))
    }
}

impl TryFrom<i64> for Level {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Level::EarlySounds),
            1 => Ok(Level::FirstWords),
            2 => Ok(Level::WordCombinations),
            3 => Ok(Level::ComplexSpeech),
            other => Err(CoreError::invalid(format!(
                "level {} out of range 0..=3",
                other
            ))),
        }
    }
}

// =============================================================================
// LEVEL SOURCE
// =============================================================================

/// Which writer produced a stored level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// Seeded from age at profile creation.
    #[default]
    Age,
    /// Recomputed from the number of known words.
    VocabularySize,
    /// Set directly by a parent through the guided assessment.
    ManualOverride,
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LevelSource::Age => "age",
            LevelSource::VocabularySize => "vocabulary_size",
            LevelSource::ManualOverride => "manual_override",
        };
        f.write_str(s)
    }
}

/// A level together with the policy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessedLevel {
    pub level: Level,
    pub source: LevelSource,
}

impl AssessedLevel {
    /// Assess from age.
    #[must_use]
    pub fn from_age(birth_date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            level: level_from_age(birth_date, today),
            source: LevelSource::Age,
        }
    }

    /// Assess from vocabulary size.
    #[must_use]
    pub fn from_vocabulary(known_words: usize) -> Self {
        Self {
            level: level_for_vocabulary_size(known_words),
            source: LevelSource::VocabularySize,
        }
    }

    /// Wrap an explicit parent choice.
    #[must_use]
    pub fn manual(level: Level) -> Self {
        Self {
            level,
            source: LevelSource::ManualOverride,
        }
    }
}

// =============================================================================
// OPERATION A: AGE BUCKETING
// =============================================================================

/// Whole months between two calendar dates, ignoring the day of month.
///
/// Negative when `birth_date` is in a later month than `today`.
#[must_use]
pub fn age_in_months(birth_date: NaiveDate, today: NaiveDate) -> i64 {
    let years = i64::from(today.year()) - i64::from(birth_date.year());
    let months = i64::from(today.month()) - i64::from(birth_date.month());
    years * 12 + months
}

/// Level from age in months: `<18 → 0`, `[18,24) → 1`, `[24,36) → 2`,
/// `≥36 → 3`.
///
/// Total over all dates; a future birth date yields level 0.
#[must_use]
pub fn level_from_age(birth_date: NaiveDate, today: NaiveDate) -> Level {
    level_for_age_months(age_in_months(birth_date, today))
}

/// [`level_from_age`] against the local wall clock.
#[must_use]
pub fn level_from_age_now(birth_date: NaiveDate) -> Level {
    level_from_age(birth_date, Local::now().date_naive())
}

fn level_for_age_months(months: i64) -> Level {
    if months < AGE_LEVEL_1_MONTHS {
        Level::EarlySounds
    } else if months < AGE_LEVEL_2_MONTHS {
        Level::FirstWords
    } else if months < AGE_LEVEL_3_MONTHS {
        Level::WordCombinations
    } else {
        Level::ComplexSpeech
    }
}

// =============================================================================
// OPERATION B: VOCABULARY-SIZE BUCKETING
// =============================================================================

/// Level from total known words: `<10 → 0`, `[10,50) → 1`, `[50,200) → 2`,
/// `≥200 → 3`.
///
/// Words of every level count equally. Negative counts are rejected.
pub fn level_from_known_word_count(total_known_words: i64) -> Result<Level> {
    let count = usize::try_from(total_known_words).map_err(|_| {
        CoreError::invalid(format!(
            "known word count must be non-negative, got {}",
            total_known_words
        ))
    })?;
    Ok(level_for_vocabulary_size(count))
}

/// Infallible form of [`level_from_known_word_count`] for counts that are
/// non-negative by type.
#[must_use]
pub fn level_for_vocabulary_size(known_words: usize) -> Level {
    if known_words < WORDS_LEVEL_1 {
        Level::EarlySounds
    } else if known_words < WORDS_LEVEL_2 {
        Level::FirstWords
    } else if known_words < WORDS_LEVEL_3 {
        Level::WordCombinations
    } else {
        Level::ComplexSpeech
    }
}

/// Words still needed to reach the next level, `None` at the top level.
#[must_use]
pub fn words_to_next_level(known_words: usize) -> Option<usize> {
    level_for_vocabulary_size(known_words)
        .next()
        .map(|next| next.word_threshold().saturating_sub(known_words))
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse an ISO `YYYY-MM-DD` date, or the date part of an RFC 3339 timestamp.
pub fn parse_birth_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid("birth date is required"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| CoreError::invalid(format!("'{}' is not a valid date", trimmed)))
}

// =============================================================================
// GUIDED ASSESSMENT
// =============================================================================

/// A group of sample words shown during the guided assessment.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleGroup {
    pub name: &'static str,
    pub icon: &'static str,
    pub words: &'static [&'static str],
}

/// What a parent reviews for one level before picking it manually.
#[derive(Debug, Clone, Serialize)]
pub struct LevelGuide {
    pub level: Level,
    pub label: String,
    pub description: &'static str,
    pub word_range: &'static str,
    pub groups: &'static [SampleGroup],
}

const LEVEL_0_GROUPS: &[SampleGroup] = &[
    SampleGroup {
        name: "First Sounds",
        icon: "🔊",
        words: &["mama", "dada", "baba", "hi", "bye"],
    },
    SampleGroup {
        name: "Basic Needs",
        icon: "🍼",
        words: &["milk", "more", "up", "no", "yes"],
    },
];

const LEVEL_1_GROUPS: &[SampleGroup] = &[
    SampleGroup {
        name: "Family",
        icon: "👪",
        words: &["mom", "dad", "baby", "sister", "brother", "grandma", "grandpa"],
    },
    SampleGroup {
        name: "Food",
        icon: "🍎",
        words: &["apple", "banana", "cookie", "water", "juice", "bread", "cheese"],
    },
    SampleGroup {
        name: "Toys",
        icon: "🧸",
        words: &["ball", "car", "doll", "book", "blocks", "puzzle"],
    },
    SampleGroup {
        name: "Actions",
        icon: "🏃",
        words: &["go", "stop", "come", "sit", "eat", "sleep", "play"],
    },
];

const LEVEL_2_GROUPS: &[SampleGroup] = &[
    SampleGroup {
        name: "Animals",
        icon: "🐶",
        words: &[
            "dog", "cat", "bird", "fish", "cow", "horse", "pig", "chicken", "duck", "sheep",
        ],
    },
    SampleGroup {
        name: "Colors",
        icon: "🌈",
        words: &[
            "red", "blue", "green", "yellow", "pink", "purple", "orange", "black", "white",
        ],
    },
    SampleGroup {
        name: "Body Parts",
        icon: "👤",
        words: &[
            "head", "eyes", "nose", "mouth", "ears", "hands", "feet", "arms", "legs",
        ],
    },
    SampleGroup {
        name: "Clothing",
        icon: "👕",
        words: &["shirt", "pants", "shoes", "socks", "hat", "coat", "dress"],
    },
    SampleGroup {
        name: "Phrases",
        icon: "💬",
        words: &["want more", "all done", "go outside", "my turn", "help me", "I see"],
    },
];

const LEVEL_3_GROUPS: &[SampleGroup] = &[
    SampleGroup {
        name: "Emotions",
        icon: "😊",
        words: &[
            "happy", "sad", "angry", "excited", "scared", "surprised", "tired", "hungry",
        ],
    },
    SampleGroup {
        name: "Places",
        icon: "🏠",
        words: &["home", "school", "park", "store", "hospital", "library", "playground"],
    },
    SampleGroup {
        name: "Time",
        icon: "⏰",
        words: &[
            "today", "tomorrow", "yesterday", "morning", "afternoon", "night", "now", "later",
        ],
    },
    SampleGroup {
        name: "Questions",
        icon: "❓",
        words: &["what", "where", "when", "who", "why", "how", "which"],
    },
    SampleGroup {
        name: "Sentences",
        icon: "📝",
        words: &[
            "I want to go",
            "Can I have",
            "Where is my",
            "I don't like",
            "Let's play together",
        ],
    },
];

/// Per-level sample vocabulary for the guided assessment flow.
#[must_use]
pub fn assessment_guide() -> Vec<LevelGuide> {
    Level::ALL
        .iter()
        .map(|&level| LevelGuide {
            level,
            label: level.label(),
            description: level.description(),
            word_range: level.word_range(),
            groups: match level {
                Level::EarlySounds => LEVEL_0_GROUPS,
                Level::FirstWords => LEVEL_1_GROUPS,
                Level::WordCombinations => LEVEL_2_GROUPS,
                Level::ComplexSpeech => LEVEL_3_GROUPS,
            },
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Months;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn born_months_ago(months: u32) -> NaiveDate {
        today().checked_sub_months(Months::new(months)).unwrap()
    }

    #[test]
    fn age_boundaries() {
        let cases = [
            (0, Level::EarlySounds),
            (17, Level::EarlySounds),
            (18, Level::FirstWords),
            (23, Level::FirstWords),
            (24, Level::WordCombinations),
            (35, Level::WordCombinations),
            (36, Level::ComplexSpeech),
            (200, Level::ComplexSpeech),
        ];
        for (months, expected) in cases {
            assert_eq!(
                level_from_age(born_months_ago(months), today()),
                expected,
                "age {} months",
                months
            );
        }
    }

    #[test]
    fn age_now_uses_wall_clock() {
        let now = Local::now().date_naive();
        let adult = now.checked_sub_months(Months::new(40 * 12)).unwrap();
        assert_eq!(level_from_age_now(adult), Level::ComplexSpeech);
        assert_eq!(level_from_age_now(now), Level::EarlySounds);
        let unborn = now.checked_add_months(Months::new(3)).unwrap();
        assert_eq!(level_from_age_now(unborn), Level::EarlySounds);
    }

    #[test]
    fn age_ignores_day_of_month() {
        // 17 full months by days, but 18 by calendar month.
        let birth = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(age_in_months(birth, now), 18);
        assert_eq!(level_from_age(birth, now), Level::FirstWords);
    }

    #[test]
    fn future_birth_date_is_level_zero() {
        let birth = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(age_in_months(birth, today()) < 0);
        assert_eq!(level_from_age(birth, today()), Level::EarlySounds);
    }

    #[test]
    fn scenario_ten_and_twenty_months() {
        assert_eq!(level_from_age(born_months_ago(10), today()), Level::EarlySounds);
        assert_eq!(level_from_age(born_months_ago(20), today()), Level::FirstWords);
    }

    #[test]
    fn count_boundaries() {
        let cases = [
            (0, Level::EarlySounds),
            (9, Level::EarlySounds),
            (10, Level::FirstWords),
            (49, Level::FirstWords),
            (50, Level::WordCombinations),
            (199, Level::WordCombinations),
            (200, Level::ComplexSpeech),
        ];
        for (count, expected) in cases {
            assert_eq!(level_from_known_word_count(count).unwrap(), expected);
        }
    }

    #[test]
    fn scenario_fifty_five_words() {
        assert_eq!(
            level_from_known_word_count(55).unwrap(),
            Level::WordCombinations
        );
    }

    #[test]
    fn negative_count_is_invalid_input() {
        let err = level_from_known_word_count(-1);
        assert!(matches!(err, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn level_conversion_rejects_out_of_range() {
        assert_eq!(Level::try_from(2i64).unwrap(), Level::WordCombinations);
        assert!(Level::try_from(4i64).is_err());
        assert!(Level::try_from(-1i64).is_err());
        assert!(Level::try_from(9u8).is_err());
    }

    #[test]
    fn level_encodes_as_its_integer() {
        let bytes = postcard::to_allocvec(&Level::ComplexSpeech).unwrap();
        assert_eq!(postcard::from_bytes::<u8>(&bytes).unwrap(), 3);

        let bad = postcard::to_allocvec(&7u8).unwrap();
        assert!(postcard::from_bytes::<Level>(&bad).is_err());
    }

    #[test]
    fn label_format() {
        assert_eq!(
            Level::WordCombinations.label(),
            "Level 2 — Word Combinations"
        );
    }

    #[test]
    fn parse_accepts_iso_and_rfc3339() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(parse_birth_date("2024-02-29").unwrap(), expected);
        assert_eq!(
            parse_birth_date("2024-02-29T10:00:00Z").unwrap(),
            expected
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_birth_date("yesterday"),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(parse_birth_date("2023-02-30").is_err());
        assert!(parse_birth_date("   ").is_err());
    }

    #[test]
    fn next_milestone() {
        assert_eq!(words_to_next_level(0), Some(10));
        assert_eq!(words_to_next_level(12), Some(38));
        assert_eq!(words_to_next_level(199), Some(1));
        assert_eq!(words_to_next_level(200), None);
    }

    #[test]
    fn guide_covers_every_level() {
        let guide = assessment_guide();
        assert_eq!(guide.len(), 4);
        for (i, entry) in guide.iter().enumerate() {
            assert_eq!(entry.level.index(), i);
            assert!(!entry.groups.is_empty());
        }
    }

    proptest! {
        #[test]
        fn age_policy_matches_table(months in 0u32..400) {
            let level = level_from_age(born_months_ago(months), today());
            let expected = match months {
                0..=17 => Level::EarlySounds,
                18..=23 => Level::FirstWords,
                24..=35 => Level::WordCombinations,
                _ => Level::ComplexSpeech,
            };
            prop_assert_eq!(level, expected);
        }

        #[test]
        fn count_policy_is_idempotent(count in 0i64..10_000) {
            let first = level_from_known_word_count(count).unwrap();
            let second = level_from_known_word_count(count).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn adding_a_word_never_lowers_level(count in 0usize..10_000) {
            prop_assert!(
                level_for_vocabulary_size(count + 1) >= level_for_vocabulary_size(count)
            );
        }

        #[test]
        fn removing_a_word_never_raises_level(count in 1usize..10_000) {
            prop_assert!(
                level_for_vocabulary_size(count - 1) <= level_for_vocabulary_size(count)
            );
        }
    }
}
