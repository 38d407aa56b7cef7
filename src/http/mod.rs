pub mod auth;
pub mod cors;
pub mod decks;
pub mod envelope;
pub mod games;
pub mod health;
pub mod players;
pub mod rate_limit;
pub mod routes;
pub mod security;
pub mod stats;
