//! Integration tests for Wordsprout CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use wordsprout::cli::{build_state, cmd_assess, cmd_init, cmd_seed, cmd_status, open_store};
use wordsprout::config::ServerConfig;
use wordsprout_core::seed::{CATEGORIES, WORDS};
use wordsprout_core::Store;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    assert!(cmd_init(&db_path, false).is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();
    assert!(cmd_init(&db_path, false).is_err());
}

#[test]
fn test_init_with_force_replaces_data() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();
    cmd_seed(&db_path).unwrap();
    cmd_init(&db_path, true).unwrap();

    let store = open_store(&db_path).unwrap();
    assert_eq!(store.counts().unwrap().words, 0);
}

// =============================================================================
// SEED & STATUS TESTS
// =============================================================================

#[test]
fn test_seed_requires_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("missing.redb");

    assert!(cmd_seed(&db_path).is_err());
    assert!(!db_path.exists());
}

#[test]
fn test_seed_is_idempotent() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();
    cmd_seed(&db_path).unwrap();
    cmd_seed(&db_path).unwrap();

    let store = open_store(&db_path).unwrap();
    let counts = store.counts().unwrap();
    assert_eq!(counts.categories, CATEGORIES.len());
    assert_eq!(counts.words, WORDS.len());
}

#[test]
fn test_status_modes() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();
    assert!(cmd_status(&db_path, false).is_ok());
    assert!(cmd_status(&db_path, true).is_ok());
}

#[test]
fn test_status_missing_database() {
    let temp = create_temp_dir();
    assert!(cmd_status(&temp.path().join("nope.redb"), false).is_err());
}

// =============================================================================
// ASSESS COMMAND TESTS
// =============================================================================

#[test]
fn test_assess_inputs() {
    assert!(cmd_assess(Some("2023-01-15"), None, false).is_ok());
    assert!(cmd_assess(None, Some(55), true).is_ok());
    assert!(cmd_assess(Some("2023-01-15"), Some(12), true).is_ok());
}

#[test]
fn test_assess_rejects_bad_input() {
    assert!(cmd_assess(None, None, false).is_err());
    assert!(cmd_assess(Some("15/01/2023"), None, false).is_err());
    assert!(cmd_assess(None, Some(-1), false).is_err());
}

// =============================================================================
// SERVER STATE TESTS
// =============================================================================

#[test]
fn test_build_state_with_seeded_database() {
    let temp = create_temp_dir();
    let config = ServerConfig {
        db: Some(temp.path().join("server.redb")),
        memory: false,
        seed: true,
        ..ServerConfig::default()
    };

    let state = build_state(&config).unwrap();
    let counts = state.companion().counts().unwrap();
    assert_eq!(counts.categories, CATEGORIES.len());
    assert!(counts.exercises > 0);
}

#[test]
fn test_build_state_in_memory() {
    let state = build_state(&ServerConfig::default()).unwrap();
    assert_eq!(state.companion().counts().unwrap().words, 0);
}
