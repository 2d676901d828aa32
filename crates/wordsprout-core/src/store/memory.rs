//! In-memory store.
//!
//! All tables are `BTreeMap`s behind one `RwLock`, so iteration order is
//! deterministic and each call is atomic.

use super::{
    KnownWordEdit, NewCategory, NewChild, NewExercise, NewUser, NewWord, Recount, Store,
    StoreCounts, StoreResult,
};
use crate::error::StoreError;
use crate::level::AssessedLevel;
use crate::{
    Category, CategoryId, Child, ChildId, Exercise, ExerciseId, ExerciseResult, KnownWord,
    Session, User, UserId, Word, WordId,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    user_emails: BTreeMap<String, UserId>,
    sessions: BTreeMap<String, Session>,
    children: BTreeMap<ChildId, Child>,
    categories: BTreeMap<CategoryId, Category>,
    category_names: BTreeMap<String, CategoryId>,
    words: BTreeMap<WordId, Word>,
    word_keys: BTreeMap<String, WordId>,
    exercises: BTreeMap<ExerciseId, Exercise>,
    exercise_keys: BTreeMap<String, ExerciseId>,
    known: BTreeMap<(ChildId, WordId), KnownWord>,
    results: BTreeMap<(ChildId, u64), ExerciseResult>,
    next_id: u64,
}

impl Tables {
    fn allocate(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }

    fn known_count(&self, child: ChildId) -> usize {
        self.known
            .range((child, WordId(0))..=(child, WordId(u64::MAX)))
            .count()
    }
}

/// Volatile store for tests and `--memory` servers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Poisoned("memory store"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Poisoned("memory store"))
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        let mut t = self.write()?;
        if t.user_emails.contains_key(&user.email) {
            return Ok(None);
        }
        let id = UserId(t.allocate());
        let user = user.with_id(id);
        t.user_emails.insert(user.email.clone(), id);
        t.users.insert(id, user.clone());
        Ok(Some(user))
    }

    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.read()?;
        Ok(t.user_emails
            .get(email)
            .and_then(|id| t.users.get(id))
            .cloned())
    }

    fn insert_session(&self, session: Session) -> StoreResult<()> {
        self.write()?.sessions.insert(session.token.clone(), session);
        Ok(())
    }

    fn session(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(self.read()?.sessions.get(token).cloned())
    }

    fn delete_session(&self, token: &str) -> StoreResult<bool> {
        Ok(self.write()?.sessions.remove(token).is_some())
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut t = self.write()?;
        let before = t.sessions.len();
        t.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before - t.sessions.len())
    }

    fn insert_child(&self, child: NewChild) -> StoreResult<Child> {
        let mut t = self.write()?;
        let id = ChildId(t.allocate());
        let child = child.with_id(id);
        t.children.insert(id, child.clone());
        Ok(child)
    }

    fn child(&self, id: ChildId) -> StoreResult<Option<Child>> {
        Ok(self.read()?.children.get(&id).cloned())
    }

    fn children_of(&self, owner: UserId) -> StoreResult<Vec<Child>> {
        Ok(self
            .read()?
            .children
            .values()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect())
    }

    fn set_child_level(&self, id: ChildId, assessed: AssessedLevel) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.children.get_mut(&id) {
            Some(child) => {
                child.level = assessed.level;
                child.level_source = assessed.source;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_child(&self, id: ChildId) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.children.remove(&id).is_none() {
            return Ok(false);
        }
        t.known.retain(|(child, _), _| *child != id);
        t.results.retain(|(child, _), _| *child != id);
        Ok(true)
    }

    fn upsert_category(&self, category: NewCategory) -> StoreResult<Category> {
        let mut t = self.write()?;
        let existing = t.category_names.get(&category.name).copied();
        let id = existing.unwrap_or_else(|| CategoryId(t.allocate()));
        let category = category.with_id(id);
        t.category_names.insert(category.name.clone(), id);
        t.categories.insert(id, category.clone());
        Ok(category)
    }

    fn categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    fn upsert_word(&self, word: NewWord) -> StoreResult<Word> {
        let mut t = self.write()?;
        let key = word.key();
        let existing = t.word_keys.get(&key).copied();
        let id = existing.unwrap_or_else(|| WordId(t.allocate()));
        let word = word.with_id(id);
        t.word_keys.insert(key, id);
        t.words.insert(id, word.clone());
        Ok(word)
    }

    fn word(&self, id: WordId) -> StoreResult<Option<Word>> {
        Ok(self.read()?.words.get(&id).cloned())
    }

    fn words(&self) -> StoreResult<Vec<Word>> {
        Ok(self.read()?.words.values().cloned().collect())
    }

    fn upsert_exercise(&self, exercise: NewExercise) -> StoreResult<Exercise> {
        let mut t = self.write()?;
        let key = exercise.key();
        let existing = t.exercise_keys.get(&key).copied();
        let id = existing.unwrap_or_else(|| ExerciseId(t.allocate()));
        let exercise = exercise.with_id(id);
        t.exercise_keys.insert(key, id);
        t.exercises.insert(id, exercise.clone());
        Ok(exercise)
    }

    fn exercise(&self, id: ExerciseId) -> StoreResult<Option<Exercise>> {
        Ok(self.read()?.exercises.get(&id).cloned())
    }

    fn exercises(&self) -> StoreResult<Vec<Exercise>> {
        Ok(self.read()?.exercises.values().cloned().collect())
    }

    fn apply_known_word_edit(
        &self,
        child: ChildId,
        edit: KnownWordEdit,
    ) -> StoreResult<Option<Recount>> {
        let mut t = self.write()?;
        let Some(previous) = t.children.get(&child).map(|c| c.level) else {
            return Ok(None);
        };

        match edit {
            KnownWordEdit::Mark { word, date_learned } => {
                t.known.insert(
                    (child, word),
                    KnownWord {
                        child,
                        word,
                        date_learned,
                    },
                );
            }
            KnownWordEdit::Unmark(word) => {
                t.known.remove(&(child, word));
            }
            KnownWordEdit::Unchanged => {}
        }

        let known_words = t.known_count(child);
        let assessed = AssessedLevel::from_vocabulary(known_words);
        let written = (assessed.level != previous).then_some(assessed);
        if let (Some(assessed), Some(record)) = (written, t.children.get_mut(&child)) {
            record.level = assessed.level;
            record.level_source = assessed.source;
        }
        Ok(Some(Recount {
            previous,
            known_words,
            written,
        }))
    }

    fn known_words(&self, child: ChildId) -> StoreResult<Vec<KnownWord>> {
        Ok(self
            .read()?
            .known
            .range((child, WordId(0))..=(child, WordId(u64::MAX)))
            .map(|(_, k)| k.clone())
            .collect())
    }

    fn known_word_count(&self, child: ChildId) -> StoreResult<usize> {
        Ok(self.read()?.known_count(child))
    }

    fn insert_result(&self, result: ExerciseResult) -> StoreResult<()> {
        let mut t = self.write()?;
        let seq = t.allocate();
        t.results.insert((result.child, seq), result);
        Ok(())
    }

    fn results_for(&self, child: ChildId) -> StoreResult<Vec<ExerciseResult>> {
        Ok(self
            .read()?
            .results
            .range((child, 0)..=(child, u64::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn counts(&self) -> StoreResult<StoreCounts> {
        let t = self.read()?;
        Ok(StoreCounts {
            users: t.users.len(),
            children: t.children.len(),
            categories: t.categories.len(),
            words: t.words.len(),
            exercises: t.exercises.len(),
            known_words: t.known.len(),
            results: t.results.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::level::{Level, LevelSource};
    use chrono::{NaiveDate, TimeDelta};

    fn new_child(store: &MemoryStore, owner: UserId) -> Child {
        store
            .insert_child(NewChild {
                owner,
                name: "Mia".into(),
                birth_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                assessed: AssessedLevel::manual(Level::FirstWords),
                created_at: Utc::now(),
            })
            .unwrap()
    }

    fn mark(word: u64) -> KnownWordEdit {
        KnownWordEdit::Mark {
            word: WordId(word),
            date_learned: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let user = NewUser {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            created_at: Utc::now(),
        };
        assert!(store.insert_user(user.clone()).unwrap().is_some());
        assert!(store.insert_user(user).unwrap().is_none());
    }

    #[test]
    fn known_words_are_scoped_per_child() {
        let store = MemoryStore::new();
        let a = new_child(&store, UserId(1));
        let b = new_child(&store, UserId(1));

        store.apply_known_word_edit(a.id, mark(1)).unwrap();
        store.apply_known_word_edit(a.id, mark(2)).unwrap();
        store.apply_known_word_edit(a.id, mark(2)).unwrap();
        store.apply_known_word_edit(b.id, mark(1)).unwrap();

        assert_eq!(store.known_word_count(a.id).unwrap(), 2);
        assert_eq!(store.known_word_count(b.id).unwrap(), 1);
        let removed = store
            .apply_known_word_edit(a.id, KnownWordEdit::Unmark(WordId(2)))
            .unwrap()
            .unwrap();
        assert_eq!(removed.known_words, 1);
        assert_eq!(store.known_word_count(b.id).unwrap(), 1);
    }

    #[test]
    fn edit_recomputes_level_in_the_same_step() {
        let store = MemoryStore::new();
        let child = new_child(&store, UserId(1));

        let first = store.apply_known_word_edit(child.id, mark(1)).unwrap().unwrap();
        assert_eq!(first.previous, Level::FirstWords);
        assert_eq!(
            first.written,
            Some(AssessedLevel::from_vocabulary(1))
        );
        let stored = store.child(child.id).unwrap().unwrap();
        assert_eq!(stored.level, Level::EarlySounds);
        assert_eq!(stored.level_source, LevelSource::VocabularySize);

        let second = store.apply_known_word_edit(child.id, mark(2)).unwrap().unwrap();
        assert_eq!(second.known_words, 2);
        assert_eq!(second.written, None);
    }

    #[test]
    fn edit_for_missing_child_writes_nothing() {
        let store = MemoryStore::new();
        assert!(store
            .apply_known_word_edit(ChildId(404), mark(1))
            .unwrap()
            .is_none());
        assert_eq!(store.counts().unwrap().known_words, 0);
    }

    #[test]
    fn delete_child_cascades() {
        let store = MemoryStore::new();
        let a = new_child(&store, UserId(1));
        let b = new_child(&store, UserId(1));
        store.apply_known_word_edit(a.id, mark(1)).unwrap();
        store.apply_known_word_edit(b.id, mark(1)).unwrap();

        assert!(store.delete_child(a.id).unwrap());
        assert!(store.child(a.id).unwrap().is_none());
        assert_eq!(store.known_word_count(a.id).unwrap(), 0);
        assert_eq!(store.known_word_count(b.id).unwrap(), 1);
        assert!(!store.delete_child(a.id).unwrap());
    }

    #[test]
    fn purge_drops_only_expired_sessions() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (token, offset) in [("old", -1), ("fresh", 1)] {
            store
                .insert_session(Session {
                    token: token.into(),
                    user_id: UserId(1),
                    created_at: now,
                    expires_at: now + TimeDelta::hours(offset),
                })
                .unwrap();
        }
        assert_eq!(store.purge_expired_sessions(now).unwrap(), 1);
        assert!(store.session("old").unwrap().is_none());
        assert!(store.session("fresh").unwrap().is_some());
    }

    #[test]
    fn word_upsert_keeps_id() {
        let store = MemoryStore::new();
        let word = NewWord {
            text: "ball".into(),
            level: Level::EarlySounds,
            category: CategoryId(1),
            difficulty: 1,
        };
        let first = store.upsert_word(word.clone()).unwrap();
        let second = store
            .upsert_word(NewWord {
                difficulty: 2,
                ..word
            })
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.words().unwrap().len(), 1);
        assert_eq!(store.word(first.id).unwrap().unwrap().difficulty, 2);
    }
}
