//! Fixed-window request limit per client IP.

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::config::settings;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

pub struct RateLimiter {
    max: u32,
    window: Duration,
    max_clients: usize,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        RateLimiter {
            max,
            window,
            max_clients: 10_000,
            clients: DashMap::new(),
        }
    }

    /// Caps how many clients are tracked at once.
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Counts one request from `client` at `now`. `Ok` carries the requests
    /// left in the current window, `Err` the time until the window resets.
    ///
    /// A client not seen before is refused while the table is full of live
    /// windows.
    pub fn check(&self, client: &str, now: Instant) -> Result<u32, Duration> {
        if !self.clients.contains_key(client) && self.clients.len() >= self.max_clients {
            self.sweep(now);
            if self.clients.len() >= self.max_clients {
                return Err(self.window);
            }
        }

        let mut entry = self.clients.entry(client.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });
        let w = entry.value_mut();
        if now.duration_since(w.started) >= self.window {
            *w = Window {
                started: now,
                hits: 0,
            };
        }
        if w.hits >= self.max {
            return Err(self.window.saturating_sub(now.duration_since(w.started)));
        }
        w.hits += 1;
        Ok(self.max - w.hits)
    }

    /// Drops windows that have expired.
    pub fn sweep(&self, now: Instant) {
        self.clients
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// The address a request is counted against. `X-Forwarded-For` is only read
/// when the socket peer is one of `trusted` proxies; its last entry is the
/// hop that proxy saw.
pub fn client_key(peer: Option<IpAddr>, forwarded: Option<&str>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }
    forwarded
        .and_then(|list| list.rsplit(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
        .to_string()
}

static LIMITER: Lazy<RateLimiter> = Lazy::new(|| {
    let s = settings();
    RateLimiter::new(s.rate_limit_max, Duration::from_secs(s.rate_limit_window_secs))
        .with_max_clients(s.rate_limit_max_clients)
});

/// `middleware::from_fn` body applied to the `/api` scope.
pub async fn limit(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok());
    let client = client_key(
        req.peer_addr().map(|a| a.ip()),
        forwarded,
        &settings().trusted_proxies,
    );

    if let Err(retry_in) = LIMITER.check(&client, Instant::now()) {
        log::warn!(
            "rate limit hit by {client}, window resets in {}s",
            retry_in.as_secs()
        );
        return Err(ApiError::TooManyRequests.into());
    }
    next.call(req).await
}
