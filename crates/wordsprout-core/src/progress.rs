//! # Progress
//!
//! Read-only summaries over a child's known words and exercise results.

use crate::exercise::AttemptStatus;
use crate::level::{Level, LevelSource, words_to_next_level};
use crate::{Child, ExerciseResult, KnownWord, Word, WordId};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of weeks reported in a summary.
pub const WEEKS_REPORTED: usize = 4;

/// Activity within one Monday-to-Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub week_start: NaiveDate,
    pub words_learned: usize,
    pub exercises_done: usize,
    pub total_score: u32,
}

/// Dashboard view of a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub level: Level,
    pub level_source: LevelSource,
    pub level_label: String,
    pub known_words: usize,
    pub known_by_level: [usize; 4],
    /// Words still needed for the next vocabulary-size level.
    pub next_milestone: Option<usize>,
    pub exercises_completed: usize,
    pub exercises_attempted: usize,
    /// Mean score over all results, rounded down.
    pub average_score: Option<u8>,
    /// Newest week first.
    pub weeks: Vec<WeeklyProgress>,
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

impl ProgressSummary {
    #[must_use]
    pub fn compute(
        child: &Child,
        known: &[KnownWord],
        words: &BTreeMap<WordId, Word>,
        results: &[ExerciseResult],
        today: NaiveDate,
    ) -> Self {
        let mut known_by_level = [0usize; 4];
        for row in known {
            if let Some(word) = words.get(&row.word) {
                known_by_level[word.level.index()] += 1;
            }
        }

        let exercises_completed = results
            .iter()
            .filter(|r| r.status == AttemptStatus::Completed)
            .count();
        let average_score = if results.is_empty() {
            None
        } else {
            let sum: usize = results.iter().map(|r| usize::from(r.score)).sum();
            Some((sum / results.len()) as u8)
        };

        let current_week = week_start(today);
        let weeks = (0..WEEKS_REPORTED)
            .map(|i| {
                let start = current_week - Duration::weeks(i as i64);
                let end = start + Duration::weeks(1);
                let in_week = |d: NaiveDate| d >= start && d < end;
                let done: Vec<&ExerciseResult> = results
                    .iter()
                    .filter(|r| in_week(r.completed_at.date_naive()))
                    .collect();
                WeeklyProgress {
                    week_start: start,
                    words_learned: known.iter().filter(|k| in_week(k.date_learned)).count(),
                    exercises_done: done.len(),
                    total_score: done.iter().map(|r| u32::from(r.score)).sum(),
                }
            })
            .collect();

        Self {
            level: child.level,
            level_source: child.level_source,
            level_label: child.level.label(),
            known_words: known.len(),
            known_by_level,
            next_milestone: words_to_next_level(known.len()),
            exercises_completed,
            exercises_attempted: results.len() - exercises_completed,
            average_score,
            weeks,
        }
    }
}
