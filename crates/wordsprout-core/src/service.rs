//! # Companion Service
//!
//! The CRUD layer over a [`Store`]: accounts, child profiles, vocabulary
//! marking, exercises and progress.
//!
//! Every child-scoped call first checks that the child belongs to the caller.
//! A child owned by someone else is reported as not found.
//!
//! Level writers:
//! - [`Companion::add_child`] seeds the level from age.
//! - [`Companion::update_word_status`] recomputes from vocabulary size and
//!   writes only when the value changes.
//! - [`Companion::set_child_level`] writes the parent's choice as-is.
//!
//! A word change and the level recompute it triggers are committed by the
//! store as one write. Callers that mutate the same child concurrently should
//! still serialize per child so that reported transitions stay in order (the
//! HTTP layer does).
//!
//! Sessions expire after [`SESSION_TTL_DAYS`] by default.

use crate::auth::{self, SESSION_TTL_DAYS, SignUp};
use crate::error::{CoreError, Result};
use crate::exercise::score_attempt;
use crate::level::{AssessedLevel, Level, parse_birth_date};
use crate::progress::ProgressSummary;
use crate::store::{KnownWordEdit, NewChild, NewUser, Store, StoreCounts};
use crate::vocabulary::{CategoryWithWords, ChildVocabulary, WordStatus, group_by_category};
use crate::{
    Child, ChildId, Exercise, ExerciseId, ExerciseResult, Session, User, UserId, WordId,
};
use chrono::{NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum child name length, in characters.
pub const MAX_CHILD_NAME_LEN: usize = 50;

/// Outcome of a level recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub previous: Level,
    pub current: Level,
    /// Whether the stored level was written.
    pub changed: bool,
    pub known_words: usize,
}

/// An exercise attempt as submitted by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub selected: Vec<String>,
    #[serde(default)]
    pub time_spent_secs: u32,
    #[serde(default = "one")]
    pub attempts: u32,
}

fn one() -> u32 {
    1
}

/// Companion service over an injected store.
#[derive(Debug)]
pub struct Companion<S> {
    store: S,
    session_ttl: TimeDelta,
}

impl<S: Store> Companion<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session_ttl: TimeDelta::days(SESSION_TTL_DAYS),
        }
    }

    /// Replace the session lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: TimeDelta) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Register a parent and open a session.
    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<(User, Session)> {
        let taken = || CoreError::Conflict("An account with this email already exists".into());
        let input = SignUp::parse(name, email, password)?;
        if self.store.user_by_email(&input.email)?.is_some() {
            return Err(taken());
        }
        let user = self
            .store
            .insert_user(NewUser {
                name: input.name,
                password_hash: auth::hash_password(&input.password)?,
                email: input.email,
                created_at: Utc::now(),
            })?
            .ok_or_else(taken)?;
        let session = self.open_session(user.id)?;
        Ok((user, session))
    }

    /// Check credentials and open a session.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<(User, Session)> {
        let rejected = || CoreError::Unauthorized("Invalid email or password".into());
        if password.is_empty() {
            return Err(CoreError::invalid("Password is required"));
        }
        let email = auth::normalize_email(email)?;
        let user = self.store.user_by_email(&email)?.ok_or_else(rejected)?;
        if !auth::verify_password(password, &user.password_hash) {
            return Err(rejected());
        }
        let session = self.open_session(user.id)?;
        Ok((user, session))
    }

    /// Close a session. Unknown tokens are ignored.
    pub fn sign_out(&self, token: &str) -> Result<()> {
        self.store.delete_session(token)?;
        Ok(())
    }

    /// Resolve a bearer token to its user. An expired session is deleted.
    pub fn authenticate(&self, token: &str) -> Result<User> {
        let unauthorized = || CoreError::Unauthorized("You must be signed in".into());
        let session = self.store.session(token)?.ok_or_else(unauthorized)?;
        if session.is_expired(Utc::now()) {
            self.store.delete_session(token)?;
            return Err(CoreError::Unauthorized(
                "Session expired, please sign in again".into(),
            ));
        }
        self.store.user(session.user_id)?.ok_or_else(unauthorized)
    }

    /// Start a session, dropping any that have expired.
    fn open_session(&self, user_id: UserId) -> Result<Session> {
        let now = Utc::now();
        self.store.purge_expired_sessions(now)?;
        let session = Session {
            token: auth::new_session_token(),
            user_id,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.store.insert_session(session.clone())?;
        Ok(session)
    }

    // =========================================================================
    // CHILD PROFILES
    // =========================================================================

    /// Create a child profile with a level seeded from age.
    pub fn add_child(
        &self,
        owner: UserId,
        name: &str,
        birth_date: &str,
        today: NaiveDate,
    ) -> Result<Child> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::invalid("Name is required"));
        }
        if name.chars().count() > MAX_CHILD_NAME_LEN {
            return Err(CoreError::invalid(format!(
                "Name must be at most {} characters",
                MAX_CHILD_NAME_LEN
            )));
        }
        let birth_date = parse_birth_date(birth_date)?;
        if birth_date > today {
            return Err(CoreError::invalid("Birth date cannot be in the future"));
        }

        let child = self.store.insert_child(NewChild {
            owner,
            name: name.to_string(),
            birth_date,
            assessed: AssessedLevel::from_age(birth_date, today),
            created_at: Utc::now(),
        })?;
        Ok(child)
    }

    /// Children of `owner`, newest first.
    pub fn list_children(&self, owner: UserId) -> Result<Vec<Child>> {
        let mut children = self.store.children_of(owner)?;
        children.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(children)
    }

    /// A child visible to `owner`.
    pub fn get_child(&self, owner: UserId, id: ChildId) -> Result<Child> {
        match self.store.child(id)? {
            Some(child) if child.owner == owner => Ok(child),
            _ => Err(CoreError::not_found(format!(
                "Child {} not found or access denied",
                id
            ))),
        }
    }

    /// Delete a child and everything recorded for it.
    pub fn delete_child(&self, owner: UserId, id: ChildId) -> Result<()> {
        self.get_child(owner, id)?;
        if !self.store.delete_child(id)? {
            return Err(CoreError::not_found(format!("Child {} not found", id)));
        }
        Ok(())
    }

    /// Manual override: store exactly `level`, whatever age or vocabulary
    /// say.
    pub fn set_child_level(&self, owner: UserId, id: ChildId, level: Level) -> Result<Child> {
        let mut child = self.get_child(owner, id)?;
        let assessed = AssessedLevel::manual(level);
        if !self.store.set_child_level(id, assessed)? {
            return Err(CoreError::not_found(format!("Child {} not found", id)));
        }
        child.level = assessed.level;
        child.level_source = assessed.source;
        Ok(child)
    }

    // =========================================================================
    // VOCABULARY
    // =========================================================================

    /// The whole catalogue grouped by category.
    pub fn categories_with_words(&self) -> Result<Vec<CategoryWithWords>> {
        Ok(group_by_category(
            self.store.categories()?,
            self.store.words()?,
        ))
    }

    /// Words recorded as known for a child.
    pub fn child_vocabulary(&self, owner: UserId, id: ChildId) -> Result<ChildVocabulary> {
        self.get_child(owner, id)?;
        let known = self.store.known_words(id)?;
        let words = self
            .store
            .words()?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();
        let categories = self
            .store
            .categories()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        Ok(ChildVocabulary::assemble(id, known, &words, &categories))
    }

    /// Apply a word status change and recompute the level from vocabulary
    /// size. Both are stored together; the level is written only when it
    /// differs from the stored one.
    pub fn update_word_status(
        &self,
        owner: UserId,
        child: ChildId,
        word: WordId,
        status: WordStatus,
        today: NaiveDate,
    ) -> Result<LevelChange> {
        self.get_child(owner, child)?;
        if self.store.word(word)?.is_none() {
            return Err(CoreError::not_found(format!("Word {} not found", word)));
        }

        let edit = match status {
            WordStatus::Known => KnownWordEdit::Mark {
                word,
                date_learned: today,
            },
            WordStatus::Remove => KnownWordEdit::Unmark(word),
            WordStatus::Learning => KnownWordEdit::Unchanged,
        };
        let recount = self
            .store
            .apply_known_word_edit(child, edit)?
            .ok_or_else(|| CoreError::not_found(format!("Child {} not found", child)))?;

        Ok(LevelChange {
            previous: recount.previous,
            current: recount.written.map_or(recount.previous, |a| a.level),
            changed: recount.written.is_some(),
            known_words: recount.known_words,
        })
    }

    // =========================================================================
    // EXERCISES & PROGRESS
    // =========================================================================

    /// Exercise templates at `level`, in id order.
    pub fn exercises_for_level(&self, level: Level) -> Result<Vec<Exercise>> {
        Ok(self
            .store
            .exercises()?
            .into_iter()
            .filter(|e| e.level == level)
            .collect())
    }

    /// Score and store an exercise attempt.
    pub fn record_exercise(
        &self,
        owner: UserId,
        child: ChildId,
        exercise: ExerciseId,
        attempt: NewAttempt,
    ) -> Result<ExerciseResult> {
        self.get_child(owner, child)?;
        let template = self
            .store
            .exercise(exercise)?
            .ok_or_else(|| CoreError::not_found(format!("Exercise {} not found", exercise)))?;

        let scored = score_attempt(&template.content, &attempt.selected);
        let result = ExerciseResult {
            child,
            exercise,
            score: scored.score,
            status: scored.status,
            time_spent_secs: attempt.time_spent_secs,
            attempts: attempt.attempts.max(1),
            completed_at: Utc::now(),
        };
        self.store.insert_result(result.clone())?;
        Ok(result)
    }

    /// Dashboard summary for a child.
    pub fn progress(&self, owner: UserId, id: ChildId, today: NaiveDate) -> Result<ProgressSummary> {
        let child = self.get_child(owner, id)?;
        let known = self.store.known_words(id)?;
        let words: BTreeMap<_, _> = self
            .store
            .words()?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();
        let results = self.store.results_for(id)?;
        Ok(ProgressSummary::compute(&child, &known, &words, &results, today))
    }

    /// Record counts.
    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(self.store.counts()?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
