//! # Wordsprout Core
//!
//! The deterministic core of Wordsprout, a speech-therapy companion for
//! parents.
//!
//! This crate contains:
//! - The Level Assessment Engine ([`level`]): pure age and vocabulary-size
//!   bucketing into a developmental [`Level`].
//! - The [`Companion`] service: child profiles, vocabulary marking,
//!   exercises and progress, written against the [`Store`] trait.
//! - Two stores: [`MemoryStore`] and the redb-backed [`RedbStore`].
//! - The static seed catalogue ([`seed`]).
//!
//! The crate performs no network I/O and spawns no threads. Store handles are
//! constructed explicitly by the caller and passed in.

pub mod auth;
pub mod error;
pub mod exercise;
pub mod level;
pub mod progress;
pub mod seed;
pub mod service;
pub mod store;
pub mod vocabulary;

pub use error::{CoreError, StoreError};
pub use exercise::{
    AttemptStatus, ExerciseContent, ExerciseKind, ScoredAttempt, score_attempt,
};
pub use level::{
    AssessedLevel, Level, LevelSource, age_in_months, level_from_age, level_from_age_now,
    level_from_known_word_count, level_for_vocabulary_size, parse_birth_date,
};
pub use progress::{ProgressSummary, WeeklyProgress};
pub use service::{Companion, LevelChange, NewAttempt};
pub use store::{MemoryStore, RedbStore, Store};
pub use vocabulary::{CategoryWithWords, ChildVocabulary, WordStatus};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a registered parent account.
    UserId
);
id_type!(
    /// Identifier of a child profile.
    ChildId
);
id_type!(
    /// Identifier of a vocabulary word.
    WordId
);
id_type!(
    /// Identifier of a word category.
    CategoryId
);
id_type!(
    /// Identifier of an exercise template.
    ExerciseId
);

// =============================================================================
// ENTITIES
// =============================================================================

/// A registered parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session. The token is an opaque bearer string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A child profile owned by a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    pub owner: UserId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub level: Level,
    /// Which writer produced `level`.
    pub level_source: LevelSource,
    pub created_at: DateTime<Utc>,
}

/// Grouping metadata for vocabulary words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub icon: String,
}

/// Immutable reference vocabulary. `(text, level)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub text: String,
    /// The level at which this word is introduced.
    pub level: Level,
    pub category: CategoryId,
    /// 1 (easiest) to 5 within the level.
    pub difficulty: u8,
}

/// Association between a child and a word the child already says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownWord {
    pub child: ChildId,
    pub word: WordId,
    pub date_learned: NaiveDate,
}

/// An exercise template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub title: String,
    pub description: String,
    pub kind: ExerciseKind,
    pub level: Level,
    pub category: Option<CategoryId>,
    pub content: ExerciseContent,
}

/// A stored, scored exercise attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub child: ChildId,
    pub exercise: ExerciseId,
    pub score: u8,
    pub status: AttemptStatus,
    pub time_spent_secs: u32,
    pub attempts: u32,
    pub completed_at: DateTime<Utc>,
}
