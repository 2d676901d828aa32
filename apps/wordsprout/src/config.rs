//! Server configuration.
//!
//! Every setting can come from a flag or from a `WORDSPROUT_*` environment
//! variable. Flags win.

use chrono::TimeDelta;
use clap::Args;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Default bind address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default global request budget, per second.
pub const DEFAULT_RATE_LIMIT: u32 = 50;

/// Default sign-in lifetime, in hours.
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 7 * 24;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Path to the redb database file
    #[arg(long, env = "WORDSPROUT_DB")]
    pub db: Option<PathBuf>,

    /// Keep all data in memory (lost on exit). Ignores --db.
    #[arg(long)]
    pub memory: bool,

    /// Address to bind
    #[arg(long, env = "WORDSPROUT_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Requests per second allowed across all clients
    #[arg(long, env = "WORDSPROUT_RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,

    /// Allowed CORS origin. Any origin when unset.
    #[arg(long, env = "WORDSPROUT_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Hours a sign-in stays valid
    #[arg(long, env = "WORDSPROUT_SESSION_TTL_HOURS", default_value_t = DEFAULT_SESSION_TTL_HOURS)]
    pub session_ttl_hours: u32,

    /// Load the built-in catalogue before serving
    #[arg(long)]
    pub seed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: None,
            memory: true,
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origin: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            seed: false,
        }
    }
}

impl ServerConfig {
    /// Rate limit as a governor quota value. Zero falls back to the default.
    pub fn rate_limit_per_second(&self) -> NonZeroU32 {
        NonZeroU32::new(self.rate_limit)
            .or_else(|| NonZeroU32::new(DEFAULT_RATE_LIMIT))
            .unwrap_or(NonZeroU32::MIN)
    }

    /// Session lifetime. Zero is treated as one hour.
    pub fn session_ttl(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.session_ttl_hours.max(1)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_limit_uses_default() {
        let config = ServerConfig {
            rate_limit: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.rate_limit_per_second().get(), DEFAULT_RATE_LIMIT);
    }

    #[test]
    fn session_ttl_from_hours() {
        assert_eq!(ServerConfig::default().session_ttl(), TimeDelta::days(7));
        let config = ServerConfig {
            session_ttl_hours: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.session_ttl(), TimeDelta::hours(1));
    }

    #[test]
    fn default_addr_matches_constant() {
        let parsed: SocketAddr = DEFAULT_ADDR.parse().unwrap();
        assert_eq!(ServerConfig::default().addr, parsed);
    }
}
