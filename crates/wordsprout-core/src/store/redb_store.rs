//! redb-backed persistent store.
//!
//! One table per entity, values encoded with postcard. Natural-key indexes
//! (email, category name, word and exercise keys) live in their own tables
//! and are maintained in the same write transaction as the record, so an
//! upsert or cascade either commits fully or not at all.
//!
//! The handle is opened explicitly with [`RedbStore::open`] and the file is
//! released when the store is dropped.

use super::{
    KnownWordEdit, NewCategory, NewChild, NewExercise, NewUser, NewWord, Recount, Store,
    StoreCounts, StoreResult,
};
use crate::level::AssessedLevel;
use crate::{
    Category, CategoryId, Child, ChildId, Exercise, ExerciseId, ExerciseResult, KnownWord,
    Session, User, UserId, Word, WordId,
};
use redb::{
    Database, ReadableDatabase, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

// =============================================================================
// TABLE DEFINITIONS
// =============================================================================

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const USER_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails");
const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
const CHILDREN: TableDefinition<u64, &[u8]> = TableDefinition::new("children");
const CATEGORIES: TableDefinition<u64, &[u8]> = TableDefinition::new("categories");
const CATEGORY_NAMES: TableDefinition<&str, u64> = TableDefinition::new("category_names");
const WORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("words");
const WORD_KEYS: TableDefinition<&str, u64> = TableDefinition::new("word_keys");
const EXERCISES: TableDefinition<u64, &[u8]> = TableDefinition::new("exercises");
const EXERCISE_KEYS: TableDefinition<&str, u64> = TableDefinition::new("exercise_keys");
const KNOWN_WORDS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("known_words");
const RESULTS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("exercise_results");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

// =============================================================================
// CODEC
// =============================================================================

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(postcard::to_allocvec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    Ok(postcard::from_bytes(bytes)?)
}

/// Allocate the next id inside an open write transaction.
fn allocate(txn: &WriteTransaction) -> StoreResult<u64> {
    let mut meta = txn.open_table(META)?;
    let current = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(0);
    let next = current.saturating_add(1);
    meta.insert(NEXT_ID_KEY, next)?;
    Ok(next)
}

/// Look up `key` in an index table, allocating a new id if absent.
fn id_for_key(
    txn: &WriteTransaction,
    index: TableDefinition<'static, &'static str, u64>,
    key: &str,
) -> StoreResult<u64> {
    let existing = {
        let table = txn.open_table(index)?;
        let found = table.get(key)?.map(|v| v.value());
        found
    };
    match existing {
        Some(id) => Ok(id),
        None => {
            let id = allocate(txn)?;
            txn.open_table(index)?.insert(key, id)?;
            Ok(id)
        }
    }
}

/// Read a child record inside an open write transaction.
fn read_child(txn: &WriteTransaction, id: ChildId) -> StoreResult<Option<Child>> {
    let table = txn.open_table(CHILDREN)?;
    let found = match table.get(id.0)? {
        Some(guard) => Some(decode(guard.value())?),
        None => None,
    };
    Ok(found)
}

fn put<T: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    value: &T,
) -> StoreResult<()> {
    let bytes = encode(value)?;
    table.insert(id, bytes.as_slice())?;
    Ok(())
}

// =============================================================================
// REDB STORE
// =============================================================================

/// Persistent store backed by a single redb file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at `path` and ensure every table exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path.as_ref())?;
        let txn = db.begin_write()?;
        {
            txn.open_table(USERS)?;
            txn.open_table(USER_EMAILS)?;
            txn.open_table(SESSIONS)?;
            txn.open_table(CHILDREN)?;
            txn.open_table(CATEGORIES)?;
            txn.open_table(CATEGORY_NAMES)?;
            txn.open_table(WORDS)?;
            txn.open_table(WORD_KEYS)?;
            txn.open_table(EXERCISES)?;
            txn.open_table(EXERCISE_KEYS)?;
            txn.open_table(KNOWN_WORDS)?;
            txn.open_table(RESULTS)?;
            txn.open_table(META)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    fn get_by_id<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, u64, &'static [u8]>,
        id: u64,
    ) -> StoreResult<Option<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        let found = match table.get(id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(found)
    }

    fn all<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, u64, &'static [u8]>,
    ) -> StoreResult<Vec<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn pair_range<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, (u64, u64), &'static [u8]>,
        child: ChildId,
    ) -> StoreResult<Vec<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        let mut out = Vec::new();
        for entry in table.range((child.0, 0u64)..=(child.0, u64::MAX))? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn count<K: redb::Key + 'static, V: redb::Value + 'static>(
        &self,
        def: TableDefinition<'static, K, V>,
    ) -> StoreResult<usize> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(def)?;
        let mut n = 0usize;
        for entry in table.iter()? {
            entry?;
            n += 1;
        }
        Ok(n)
    }
}

impl Store for RedbStore {
    fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        let txn = self.db.begin_write()?;
        let taken = txn.open_table(USER_EMAILS)?.get(user.email.as_str())?.is_some();
        if taken {
            txn.abort()?;
            return Ok(None);
        }
        let id = allocate(&txn)?;
        let user = user.with_id(UserId(id));
        txn.open_table(USER_EMAILS)?.insert(user.email.as_str(), id)?;
        put(&mut txn.open_table(USERS)?, id, &user)?;
        txn.commit()?;
        Ok(Some(user))
    }

    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.get_by_id(USERS, id.0)
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = {
            let txn = self.db.begin_read()?;
            let table = txn.open_table(USER_EMAILS)?;
            let found = table.get(email)?.map(|v| v.value());
            found
        };
        match id {
            Some(id) => self.user(UserId(id)),
            None => Ok(None),
        }
    }

    fn insert_session(&self, session: Session) -> StoreResult<()> {
        let bytes = encode(&session)?;
        let txn = self.db.begin_write()?;
        txn.open_table(SESSIONS)?
            .insert(session.token.as_str(), bytes.as_slice())?;
        txn.commit()?;
        Ok(())
    }

    fn session(&self, token: &str) -> StoreResult<Option<Session>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SESSIONS)?;
        let found = match table.get(token)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(found)
    }

    fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = txn.open_table(SESSIONS)?.remove(token)?.is_some();
        txn.commit()?;
        Ok(removed)
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut removed = 0usize;
        txn.open_table(SESSIONS)?.retain(|_, bytes| {
            // Undecodable rows are kept for inspection.
            let keep = decode::<Session>(bytes)
                .map(|session| !session.is_expired(now))
                .unwrap_or(true);
            if !keep {
                removed += 1;
            }
            keep
        })?;
        txn.commit()?;
        Ok(removed)
    }

    fn insert_child(&self, child: NewChild) -> StoreResult<Child> {
        let txn = self.db.begin_write()?;
        let id = allocate(&txn)?;
        let child = child.with_id(ChildId(id));
        put(&mut txn.open_table(CHILDREN)?, id, &child)?;
        txn.commit()?;
        Ok(child)
    }

    fn child(&self, id: ChildId) -> StoreResult<Option<Child>> {
        self.get_by_id(CHILDREN, id.0)
    }

    fn children_of(&self, owner: UserId) -> StoreResult<Vec<Child>> {
        let all: Vec<Child> = self.all(CHILDREN)?;
        Ok(all.into_iter().filter(|c| c.owner == owner).collect())
    }

    fn set_child_level(&self, id: ChildId, assessed: AssessedLevel) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(CHILDREN)?;
            let current: Option<Child> = match table.get(id.0)? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            match current {
                Some(mut child) => {
                    child.level = assessed.level;
                    child.level_source = assessed.source;
                    put(&mut table, id.0, &child)?;
                    true
                }
                None => false,
            }
        };
        txn.commit()?;
        Ok(updated)
    }

    fn delete_child(&self, id: ChildId) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = txn.open_table(CHILDREN)?.remove(id.0)?.is_some();
        if removed {
            let range = (id.0, 0u64)..=(id.0, u64::MAX);
            txn.open_table(KNOWN_WORDS)?.retain_in(range.clone(), |_, _| false)?;
            txn.open_table(RESULTS)?.retain_in(range, |_, _| false)?;
        }
        txn.commit()?;
        Ok(removed)
    }

    fn upsert_category(&self, category: NewCategory) -> StoreResult<Category> {
        let txn = self.db.begin_write()?;
        let id = id_for_key(&txn, CATEGORY_NAMES, &category.name)?;
        let category = category.with_id(CategoryId(id));
        put(&mut txn.open_table(CATEGORIES)?, id, &category)?;
        txn.commit()?;
        Ok(category)
    }

    fn categories(&self) -> StoreResult<Vec<Category>> {
        self.all(CATEGORIES)
    }

    fn upsert_word(&self, word: NewWord) -> StoreResult<Word> {
        let txn = self.db.begin_write()?;
        let id = id_for_key(&txn, WORD_KEYS, &word.key())?;
        let word = word.with_id(WordId(id));
        put(&mut txn.open_table(WORDS)?, id, &word)?;
        txn.commit()?;
        Ok(word)
    }

    fn word(&self, id: WordId) -> StoreResult<Option<Word>> {
        self.get_by_id(WORDS, id.0)
    }

    fn words(&self) -> StoreResult<Vec<Word>> {
        self.all(WORDS)
    }

    fn upsert_exercise(&self, exercise: NewExercise) -> StoreResult<Exercise> {
        let txn = self.db.begin_write()?;
        let id = id_for_key(&txn, EXERCISE_KEYS, &exercise.key())?;
        let exercise = exercise.with_id(ExerciseId(id));
        put(&mut txn.open_table(EXERCISES)?, id, &exercise)?;
        txn.commit()?;
        Ok(exercise)
    }

    fn exercise(&self, id: ExerciseId) -> StoreResult<Option<Exercise>> {
        self.get_by_id(EXERCISES, id.0)
    }

    fn exercises(&self) -> StoreResult<Vec<Exercise>> {
        self.all(EXERCISES)
    }

    fn apply_known_word_edit(
        &self,
        child: ChildId,
        edit: KnownWordEdit,
    ) -> StoreResult<Option<Recount>> {
        let txn = self.db.begin_write()?;
        let Some(mut record) = read_child(&txn, child)? else {
            txn.abort()?;
            return Ok(None);
        };

        let known_words = {
            let mut table = txn.open_table(KNOWN_WORDS)?;
            match edit {
                KnownWordEdit::Mark { word, date_learned } => {
                    let bytes = encode(&KnownWord {
                        child,
                        word,
                        date_learned,
                    })?;
                    table.insert((child.0, word.0), bytes.as_slice())?;
                }
                KnownWordEdit::Unmark(word) => {
                    table.remove((child.0, word.0))?;
                }
                KnownWordEdit::Unchanged => {}
            }
            let mut n = 0usize;
            for entry in table.range((child.0, 0u64)..=(child.0, u64::MAX))? {
                entry?;
                n += 1;
            }
            n
        };

        let previous = record.level;
        let assessed = AssessedLevel::from_vocabulary(known_words);
        let written = (assessed.level != previous).then_some(assessed);
        if written.is_some() {
            record.level = assessed.level;
            record.level_source = assessed.source;
            put(&mut txn.open_table(CHILDREN)?, child.0, &record)?;
        }
        txn.commit()?;
        Ok(Some(Recount {
            previous,
            known_words,
            written,
        }))
    }

    fn known_words(&self, child: ChildId) -> StoreResult<Vec<KnownWord>> {
        self.pair_range(KNOWN_WORDS, child)
    }

    fn known_word_count(&self, child: ChildId) -> StoreResult<usize> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KNOWN_WORDS)?;
        let mut n = 0usize;
        for entry in table.range((child.0, 0u64)..=(child.0, u64::MAX))? {
            entry?;
            n += 1;
        }
        Ok(n)
    }

    fn insert_result(&self, result: ExerciseResult) -> StoreResult<()> {
        let bytes = encode(&result)?;
        let txn = self.db.begin_write()?;
        let seq = allocate(&txn)?;
        txn.open_table(RESULTS)?
            .insert((result.child.0, seq), bytes.as_slice())?;
        txn.commit()?;
        Ok(())
    }

    fn results_for(&self, child: ChildId) -> StoreResult<Vec<ExerciseResult>> {
        self.pair_range(RESULTS, child)
    }

    fn counts(&self) -> StoreResult<StoreCounts> {
        Ok(StoreCounts {
            users: self.count(USERS)?,
            children: self.count(CHILDREN)?,
            categories: self.count(CATEGORIES)?,
            words: self.count(WORDS)?,
            exercises: self.count(EXERCISES)?,
            known_words: self.count(KNOWN_WORDS)?,
            results: self.count(RESULTS)?,
        })
    }
}
