//! Runtime configuration for the Commander tracker server.

use once_cell::sync::Lazy;
use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug)]
pub struct Settings {
    /// Bind address for the HTTP server.
    pub server_addr: String,
    /// Upper bound of the Postgres pool.
    pub db_max_connections: u32,
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,
    /// Token lifetime in days.
    pub jwt_expire_days: i64,
    pub bcrypt_cost: u32,
    /// Exact origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Wildcard origins such as `https://*.vercel.app` (preview deployments).
    pub cors_origin_patterns: Vec<String>,
    /// Requests allowed per client within one rate-limit window.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Most clients the limiter tracks at once.
    pub rate_limit_max_clients: usize,
    /// Reverse proxies whose `X-Forwarded-For` names the real client.
    pub trusted_proxies: Vec<IpAddr>,
    /// Pseudo-game count of the prior in the Bayesian win rate.
    pub bayes_prior_weight: f64,
    /// Games required before a player or deck shows up on a leaderboard.
    pub leaderboard_min_games: u32,
}

impl Settings {
    fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, generating a per-process secret");
            format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
        });

        Settings {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5),
            jwt_secret,
            jwt_expire_days: parse_or("JWT_EXPIRE_DAYS", 30),
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
            cors_origins: list("CORS_ORIGINS", "http://localhost:3000"),
            cors_origin_patterns: list("CORS_ORIGIN_PATTERNS", ""),
            rate_limit_max: parse_or("RATE_LIMIT_MAX", 300),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 900),
            rate_limit_max_clients: parse_or("RATE_LIMIT_MAX_CLIENTS", 10_000),
            trusted_proxies: list("TRUSTED_PROXIES", "")
                .into_iter()
                .filter_map(|ip| match ip.parse() {
                    Ok(addr) => Some(addr),
                    Err(_) => {
                        log::warn!("ignoring invalid TRUSTED_PROXIES entry {ip:?}");
                        None
                    }
                })
                .collect(),
            bayes_prior_weight: parse_or("BAYES_PRIOR_WEIGHT", 5.0),
            leaderboard_min_games: parse_or("LEADERBOARD_MIN_GAMES", 3),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v.parse::<T>().unwrap_or_else(|_| {
            log::warn!("invalid {key}={v:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Comma-separated list; blank entries are dropped.
fn list(key: &str, default: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
