//! Commander playgroup tracker: players, decks, games and the statistics
//! derived from them, served as a JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod game;
pub mod http;
pub mod metrics;
pub mod stats;
pub mod tracker;
