//! # Store Module
//!
//! Persistence boundary of the core.
//!
//! The [`Store`] trait is the only way the service touches data. It is
//! synchronous and takes `&self`; implementations provide their own interior
//! synchronization. Each mutating call is atomic: it either applies fully or
//! leaves state unchanged.
//!
//! Implementations:
//! - [`MemoryStore`]: `BTreeMap` tables behind an `RwLock`.
//! - [`RedbStore`]: redb embedded database (ACID, copy-on-write B-trees),
//!   records encoded with postcard.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::error::StoreError;
use crate::level::{AssessedLevel, Level};
use crate::{
    Category, CategoryId, Child, ChildId, Exercise, ExerciseContent, ExerciseId, ExerciseResult,
    KnownWord, Session, User, UserId, Word, WordId,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// INSERT PAYLOADS
// =============================================================================

/// A user before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub(crate) fn with_id(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}

/// A child profile before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewChild {
    pub owner: UserId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub assessed: AssessedLevel,
    pub created_at: DateTime<Utc>,
}

impl NewChild {
    pub(crate) fn with_id(self, id: ChildId) -> Child {
        Child {
            id,
            owner: self.owner,
            name: self.name,
            birth_date: self.birth_date,
            level: self.assessed.level,
            level_source: self.assessed.source,
            created_at: self.created_at,
        }
    }
}

/// A category keyed by its unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl NewCategory {
    pub(crate) fn with_id(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            description: self.description,
            icon: self.icon,
        }
    }
}

/// A word keyed by `(text, level)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWord {
    pub text: String,
    pub level: Level,
    pub category: CategoryId,
    pub difficulty: u8,
}

impl NewWord {
    /// Natural key used for upserts.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.level.as_u8(), self.text)
    }

    pub(crate) fn with_id(self, id: WordId) -> Word {
        Word {
            id,
            text: self.text,
            level: self.level,
            category: self.category,
            difficulty: self.difficulty,
        }
    }
}

/// An exercise template keyed by `(title, level)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub title: String,
    pub description: String,
    pub level: Level,
    pub category: Option<CategoryId>,
    pub content: ExerciseContent,
}

impl NewExercise {
    /// Natural key used for upserts.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.level.as_u8(), self.title)
    }

    pub(crate) fn with_id(self, id: ExerciseId) -> Exercise {
        Exercise {
            id,
            title: self.title,
            description: self.description,
            kind: self.content.kind(),
            level: self.level,
            category: self.category,
            content: self.content,
        }
    }
}

/// A change to one known-word association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownWordEdit {
    Mark { word: WordId, date_learned: NaiveDate },
    Unmark(WordId),
    Unchanged,
}

/// Outcome of [`Store::apply_known_word_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recount {
    /// Level stored before the edit.
    pub previous: Level,
    /// Known words after the edit.
    pub known_words: usize,
    /// The level written, present only when it differed from `previous`.
    pub written: Option<AssessedLevel>,
}

/// Record counts, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub users: usize,
    pub children: usize,
    pub categories: usize,
    pub words: usize,
    pub exercises: usize,
    pub known_words: usize,
    pub results: usize,
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Persistence operations used by the companion service.
pub trait Store {
    // --- accounts ---------------------------------------------------------

    /// Insert a user. Returns `None` if the email is already registered.
    fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>>;

    fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    fn insert_session(&self, session: Session) -> StoreResult<()>;

    fn session(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Returns whether a session was removed.
    fn delete_session(&self, token: &str) -> StoreResult<bool>;

    /// Drop every session expired at `now`. Returns how many were removed.
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<usize>;

    // --- children ---------------------------------------------------------

    fn insert_child(&self, child: NewChild) -> StoreResult<Child>;

    fn child(&self, id: ChildId) -> StoreResult<Option<Child>>;

    /// All children of an owner, in id order.
    fn children_of(&self, owner: UserId) -> StoreResult<Vec<Child>>;

    /// Overwrite a child's level. Returns `false` if the child is gone.
    fn set_child_level(&self, id: ChildId, assessed: AssessedLevel) -> StoreResult<bool>;

    /// Delete a child with its known words and exercise results.
    fn delete_child(&self, id: ChildId) -> StoreResult<bool>;

    // --- catalogue --------------------------------------------------------

    /// Insert or update a category by name.
    fn upsert_category(&self, category: NewCategory) -> StoreResult<Category>;

    fn categories(&self) -> StoreResult<Vec<Category>>;

    /// Insert or update a word by `(text, level)`.
    fn upsert_word(&self, word: NewWord) -> StoreResult<Word>;

    fn word(&self, id: WordId) -> StoreResult<Option<Word>>;

    fn words(&self) -> StoreResult<Vec<Word>>;

    /// Insert or update an exercise by `(title, level)`.
    fn upsert_exercise(&self, exercise: NewExercise) -> StoreResult<Exercise>;

    fn exercise(&self, id: ExerciseId) -> StoreResult<Option<Exercise>>;

    fn exercises(&self) -> StoreResult<Vec<Exercise>>;

    // --- vocabulary -------------------------------------------------------

    /// Apply `edit` to a child's vocabulary and recompute its level from the
    /// resulting known-word count, as one atomic write. The level is written
    /// only when it differs from the stored one.
    ///
    /// Returns `None`, with nothing written, if the child does not exist.
    fn apply_known_word_edit(
        &self,
        child: ChildId,
        edit: KnownWordEdit,
    ) -> StoreResult<Option<Recount>>;

    fn known_words(&self, child: ChildId) -> StoreResult<Vec<KnownWord>>;

    fn known_word_count(&self, child: ChildId) -> StoreResult<usize> {
        Ok(self.known_words(child)?.len())
    }

    // --- exercise results -------------------------------------------------

    fn insert_result(&self, result: ExerciseResult) -> StoreResult<()>;

    /// Results of a child in insertion order.
    fn results_for(&self, child: ChildId) -> StoreResult<Vec<ExerciseResult>>;

    // --- stats ------------------------------------------------------------

    fn counts(&self) -> StoreResult<StoreCounts>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        (**self).insert_user(user)
    }
    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        (**self).user(id)
    }
    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).user_by_email(email)
    }
    fn insert_session(&self, session: Session) -> StoreResult<()> {
        (**self).insert_session(session)
    }
    fn session(&self, token: &str) -> StoreResult<Option<Session>> {
        (**self).session(token)
    }
    fn delete_session(&self, token: &str) -> StoreResult<bool> {
        (**self).delete_session(token)
    }
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        (**self).purge_expired_sessions(now)
    }
    fn insert_child(&self, child: NewChild) -> StoreResult<Child> {
        (**self).insert_child(child)
    }
    fn child(&self, id: ChildId) -> StoreResult<Option<Child>> {
        (**self).child(id)
    }
    fn children_of(&self, owner: UserId) -> StoreResult<Vec<Child>> {
        (**self).children_of(owner)
    }
    fn set_child_level(&self, id: ChildId, assessed: AssessedLevel) -> StoreResult<bool> {
        (**self).set_child_level(id, assessed)
    }
    fn delete_child(&self, id: ChildId) -> StoreResult<bool> {
        (**self).delete_child(id)
    }
    fn upsert_category(&self, category: NewCategory) -> StoreResult<Category> {
        (**self).upsert_category(category)
    }
    fn categories(&self) -> StoreResult<Vec<Category>> {
        (**self).categories()
    }
    fn upsert_word(&self, word: NewWord) -> StoreResult<Word> {
        (**self).upsert_word(word)
    }
    fn word(&self, id: WordId) -> StoreResult<Option<Word>> {
        (**self).word(id)
    }
    fn words(&self) -> StoreResult<Vec<Word>> {
        (**self).words()
    }
    fn upsert_exercise(&self, exercise: NewExercise) -> StoreResult<Exercise> {
        (**self).upsert_exercise(exercise)
    }
    fn exercise(&self, id: ExerciseId) -> StoreResult<Option<Exercise>> {
        (**self).exercise(id)
    }
    fn exercises(&self) -> StoreResult<Vec<Exercise>> {
        (**self).exercises()
    }
    fn apply_known_word_edit(
        &self,
        child: ChildId,
        edit: KnownWordEdit,
    ) -> StoreResult<Option<Recount>> {
        (**self).apply_known_word_edit(child, edit)
    }
    fn known_words(&self, child: ChildId) -> StoreResult<Vec<KnownWord>> {
        (**self).known_words(child)
    }
    fn known_word_count(&self, child: ChildId) -> StoreResult<usize> {
        (**self).known_word_count(child)
    }
    fn insert_result(&self, result: ExerciseResult) -> StoreResult<()> {
        (**self).insert_result(result)
    }
    fn results_for(&self, child: ChildId) -> StoreResult<Vec<ExerciseResult>> {
        (**self).results_for(child)
    }
    fn counts(&self) -> StoreResult<StoreCounts> {
        (**self).counts()
    }
}
