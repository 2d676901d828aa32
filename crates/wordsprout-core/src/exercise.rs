//! # Exercises
//!
//! Exercise kinds, their content payloads, and attempt scoring.
//!
//! Scoring is integer-only. An attempt counts as completed at
//! [`COMPLETION_THRESHOLD`] or above.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum score for an attempt to count as completed.
pub const COMPLETION_THRESHOLD: u8 = 70;

/// Score awarded for any non-empty matching answer.
const MATCHING_SCORE: u8 = 80;

/// Score awarded for any non-empty answer on kinds without a checker.
const DEFAULT_SCORE: u8 = 75;

/// Kind of exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseKind {
    WordRecognition,
    Pronunciation,
    Matching,
    Categorization,
    FillInBlank,
    SoundRecognition,
    StoryTelling,
}

/// One picture choice in a word-recognition exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageChoice {
    pub url: String,
    pub is_correct: bool,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub word: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortItem {
    pub word: String,
    pub image_url: String,
    pub correct_category: String,
}

/// A spoken word in a sound-recognition exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundWord {
    pub word: String,
    pub has_target_sound: bool,
    pub audio_url: String,
}

/// Kind-specific exercise payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseContent {
    WordRecognition {
        target_word: String,
        images: Vec<ImageChoice>,
        instruction: String,
    },
    Pronunciation {
        target_word: String,
        audio_url: String,
        phonetics: Option<String>,
        instruction: String,
        tips: Vec<String>,
    },
    Matching {
        pairs: Vec<MatchPair>,
        instruction: String,
    },
    Categorization {
        categories: Vec<Bucket>,
        items: Vec<SortItem>,
        instruction: String,
    },
    FillInBlank {
        /// Uses `{blank}` as the placeholder.
        sentence: String,
        options: Vec<String>,
        correct_answer: String,
        image_url: Option<String>,
        instruction: String,
    },
    SoundRecognition {
        target_sound: String,
        words: Vec<SoundWord>,
        instruction: String,
    },
    StoryTelling {
        story_prompt: String,
        target_words: Vec<String>,
        image_prompts: Vec<String>,
        instruction: String,
    },
}

impl ExerciseContent {
    /// The kind this payload belongs to.
    #[must_use]
    pub fn kind(&self) -> ExerciseKind {
        match self {
            ExerciseContent::WordRecognition { .. } => ExerciseKind::WordRecognition,
            ExerciseContent::Pronunciation { .. } => ExerciseKind::Pronunciation,
            ExerciseContent::Matching { .. } => ExerciseKind::Matching,
            ExerciseContent::Categorization { .. } => ExerciseKind::Categorization,
            ExerciseContent::FillInBlank { .. } => ExerciseKind::FillInBlank,
            ExerciseContent::SoundRecognition { .. } => ExerciseKind::SoundRecognition,
            ExerciseContent::StoryTelling { .. } => ExerciseKind::StoryTelling,
        }
    }
}

/// Outcome classification of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Completed,
    Attempted,
}

/// Score and status for one submitted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredAttempt {
    pub score: u8,
    pub status: AttemptStatus,
}

impl ScoredAttempt {
    fn from_score(score: u8) -> Self {
        let status = if score >= COMPLETION_THRESHOLD {
            AttemptStatus::Completed
        } else {
            AttemptStatus::Attempted
        };
        Self { score, status }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }
}

/// Score a submitted set of answers against an exercise payload.
///
/// - Word recognition: percentage of correct images selected, rounded half
///   up. Selecting a wrong image does not subtract.
/// - Matching: 80 for any answer.
/// - Other kinds: 75 for any answer.
///
/// An empty answer always scores 0.
#[must_use]
pub fn score_attempt(content: &ExerciseContent, selected: &[String]) -> ScoredAttempt {
    let selected: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    if selected.is_empty() {
        return ScoredAttempt::from_score(0);
    }

    let score = match content {
        ExerciseContent::WordRecognition { images, .. } => {
            let correct: BTreeSet<&str> = images
                .iter()
                .filter(|img| img.is_correct)
                .map(|img| img.url.as_str())
                .collect();
            let total = correct.len();
            if total == 0 {
                0
            } else {
                let hits = selected.intersection(&correct).count();
                ((hits * 200 + total) / (total * 2)).min(100) as u8
            }
        }
        ExerciseContent::Matching { .. } => MATCHING_SCORE,
        _ => DEFAULT_SCORE,
    };
    ScoredAttempt::from_score(score)
}
