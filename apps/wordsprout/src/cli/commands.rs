//! Command implementations.

use crate::api::{self, AppState, SharedStore};
use crate::config::ServerConfig;
use chrono::Local;
use serde_json::json;
use std::error::Error;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{info, warn};
use wordsprout_core::level::{self, LevelSource};
use wordsprout_core::seed::seed;
use wordsprout_core::{MemoryStore, RedbStore, Store};

type CmdResult = Result<(), Box<dyn Error>>;

/// Open an existing database file.
pub fn open_store(db_path: &Path) -> Result<RedbStore, Box<dyn Error>> {
    if !db_path.exists() {
        return Err(format!(
            "Database not found at {} (run `wordsprout init` first)",
            db_path.display()
        )
        .into());
    }
    Ok(RedbStore::open(db_path)?)
}

pub fn cmd_init(db_path: &Path, force: bool) -> CmdResult {
    if db_path.exists() {
        if !force {
            return Err(format!(
                "Database already exists at {} (use --force to replace it)",
                db_path.display()
            )
            .into());
        }
        std::fs::remove_file(db_path)?;
    }
    RedbStore::open(db_path)?;
    println!("Initialized database at {}", db_path.display());
    Ok(())
}

pub fn cmd_seed(db_path: &Path) -> CmdResult {
    let store = open_store(db_path)?;
    let report = seed(&store)?;
    println!(
        "Seeded {} categories, {} words, {} exercises",
        report.categories, report.words, report.exercises
    );
    Ok(())
}

pub fn cmd_assess(birth_date: Option<&str>, known_words: Option<i64>, json: bool) -> CmdResult {
    if birth_date.is_none() && known_words.is_none() {
        return Err("Provide --birth-date, --known-words, or both".into());
    }

    let today = Local::now().date_naive();
    let mut rows = Vec::new();
    if let Some(raw) = birth_date {
        let birth = level::parse_birth_date(raw)?;
        let months = level::age_in_months(birth, today);
        rows.push((LevelSource::Age, level::level_from_age_now(birth), Some(months)));
    }
    if let Some(count) = known_words {
        rows.push((
            LevelSource::VocabularySize,
            level::level_from_known_word_count(count)?,
            None,
        ));
    }

    if json {
        let out: Vec<_> = rows
            .iter()
            .map(|(source, level, months)| {
                json!({
                    "source": source,
                    "level": level,
                    "label": level.label(),
                    "age_months": months,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (source, level, months) in &rows {
            let source = source.to_string();
            match months {
                Some(m) => println!("{:<16} {} ({} months)", source, level.label(), m),
                None => println!("{:<16} {}", source, level.label()),
            }
            println!("{:<16} {}", "", level.description());
        }
    }
    Ok(())
}

pub fn cmd_status(db_path: &Path, json: bool) -> CmdResult {
    let store = open_store(db_path)?;
    let counts = store.counts()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("Database:    {}", db_path.display());
        println!("Users:       {}", counts.users);
        println!("Children:    {}", counts.children);
        println!("Categories:  {}", counts.categories);
        println!("Words:       {}", counts.words);
        println!("Exercises:   {}", counts.exercises);
        println!("Known words: {}", counts.known_words);
        println!("Results:     {}", counts.results);
    }
    Ok(())
}

/// Construct the store and state a server would use.
pub fn build_state(config: &ServerConfig) -> Result<AppState, Box<dyn Error>> {
    let store: SharedStore = match &config.db {
        Some(path) if !config.memory => {
            info!(db = %path.display(), "opening database");
            Box::new(RedbStore::open(path)?)
        }
        _ => {
            if !config.memory {
                warn!("no --db given, data will be kept in memory only");
            }
            Box::new(MemoryStore::new())
        }
    };
    if config.seed {
        let report = seed(&store)?;
        info!(
            categories = report.categories,
            words = report.words,
            exercises = report.exercises,
            "catalogue seeded"
        );
    }
    Ok(AppState::new(store, config))
}

pub async fn cmd_serve(config: ServerConfig) -> CmdResult {
    let state = build_state(&config)?;
    let app = api::build_router(state, &config)?;

    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, rate_limit = config.rate_limit, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
