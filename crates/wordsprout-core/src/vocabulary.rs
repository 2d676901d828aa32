//! # Vocabulary
//!
//! Catalogue views and the word-status vocabulary used when a parent marks
//! words for a child.

use crate::level::Level;
use crate::{Category, CategoryId, ChildId, KnownWord, Word, WordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a parent wants recorded for one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    /// The child says the word.
    Known,
    /// The child is working on the word. Not persisted.
    Learning,
    /// Clear any recorded status.
    Remove,
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WordStatus::Known => "known",
            WordStatus::Learning => "learning",
            WordStatus::Remove => "remove",
        })
    }
}

/// A category with its words, for the catalogue screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithWords {
    #[serde(flatten)]
    pub category: Category,
    pub words: Vec<Word>,
}

/// Group words under their categories.
///
/// Categories are ordered by name; words within a category by
/// `(level, difficulty, text)`. Words whose category is missing are dropped.
#[must_use]
pub fn group_by_category(categories: Vec<Category>, words: Vec<Word>) -> Vec<CategoryWithWords> {
    let mut buckets: BTreeMap<CategoryId, Vec<Word>> = BTreeMap::new();
    for word in words {
        buckets.entry(word.category).or_default().push(word);
    }

    let mut grouped: Vec<CategoryWithWords> = categories
        .into_iter()
        .map(|category| {
            let mut words = buckets.remove(&category.id).unwrap_or_default();
            words.sort_by(|a, b| {
                (a.level, a.difficulty, &a.text).cmp(&(b.level, b.difficulty, &b.text))
            });
            CategoryWithWords { category, words }
        })
        .collect();
    grouped.sort_by(|a, b| a.category.name.cmp(&b.category.name));
    grouped
}

/// A known word joined with its catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownWordEntry {
    pub word: Word,
    pub category: Option<Category>,
    pub date_learned: NaiveDate,
}

/// Everything a child is recorded as knowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildVocabulary {
    pub child: ChildId,
    pub known: Vec<KnownWordEntry>,
    /// Known words per word level, indexed by `Level::index()`.
    pub by_level: [usize; 4],
    pub total: usize,
}

impl ChildVocabulary {
    /// Join known-word rows against the catalogue. Rows pointing at words
    /// that no longer exist still count toward `total`.
    #[must_use]
    pub fn assemble(
        child: ChildId,
        known: Vec<KnownWord>,
        words: &BTreeMap<WordId, Word>,
        categories: &BTreeMap<CategoryId, Category>,
    ) -> Self {
        let total = known.len();
        let mut by_level = [0usize; 4];
        let mut entries = Vec::with_capacity(known.len());
        for row in known {
            if let Some(word) = words.get(&row.word) {
                by_level[word.level.index()] += 1;
                entries.push(KnownWordEntry {
                    word: word.clone(),
                    category: categories.get(&word.category).cloned(),
                    date_learned: row.date_learned,
                });
            }
        }
        entries.sort_by(|a, b| (a.word.level, &a.word.text).cmp(&(b.word.level, &b.word.text)));
        Self {
            child,
            known: entries,
            by_level,
            total,
        }
    }

    /// Known words introduced at `level`.
    #[must_use]
    pub fn count_at(&self, level: Level) -> usize {
        self.by_level[level.index()]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: u64, name: &str) -> Category {
        Category {
            id: CategoryId(id),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
        }
    }

    fn word(id: u64, text: &str, level: Level, difficulty: u8, cat: u64) -> Word {
        Word {
            id: WordId(id),
            text: text.into(),
            level,
            category: CategoryId(cat),
            difficulty,
        }
    }

    #[test]
    fn grouping_orders_categories_and_words() {
        let categories = vec![category(1, "Toys"), category(2, "Animals")];
        let words = vec![
            word(10, "car", Level::FirstWords, 1, 1),
            word(11, "ball", Level::EarlySounds, 2, 1),
            word(12, "block", Level::EarlySounds, 2, 1),
            word(13, "dog", Level::EarlySounds, 1, 2),
            word(14, "orphan", Level::EarlySounds, 1, 99),
        ];
        let grouped = group_by_category(categories, words);

        assert_eq!(grouped[0].category.name, "Animals");
        assert_eq!(grouped[1].category.name, "Toys");
        let toys: Vec<&str> = grouped[1].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(toys, vec!["ball", "block", "car"]);
    }

    #[test]
    fn vocabulary_counts_by_level() {
        let mut words = BTreeMap::new();
        words.insert(WordId(1), word(1, "mama", Level::EarlySounds, 1, 1));
        words.insert(WordId(2), word(2, "happy", Level::ComplexSpeech, 3, 1));
        let mut categories = BTreeMap::new();
        categories.insert(CategoryId(1), category(1, "Family"));

        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let known = vec![
            KnownWord { child: ChildId(5), word: WordId(2), date_learned: date },
            KnownWord { child: ChildId(5), word: WordId(1), date_learned: date },
        ];
        let vocab = ChildVocabulary::assemble(ChildId(5), known, &words, &categories);

        assert_eq!(vocab.total, 2);
        assert_eq!(vocab.count_at(Level::EarlySounds), 1);
        assert_eq!(vocab.count_at(Level::ComplexSpeech), 1);
        assert_eq!(vocab.known[0].word.text, "mama");
        assert!(vocab.known[0].category.is_some());
    }
}
