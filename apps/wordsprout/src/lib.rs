//! # Wordsprout Library
//!
//! This library exposes the Wordsprout modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export wordsprout_core for convenience
pub use wordsprout_core;
