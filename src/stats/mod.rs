//! Statistics derived from recorded games.
//!
//! Every function here takes already-loaded games and makes a single pass
//! over them; nothing is persisted.

pub mod advanced;
pub mod eliminations;
pub mod leaderboard;
pub mod matchups;
pub mod overview;
pub mod profile;
pub mod summary;

use uuid::Uuid;

use crate::game::types::{GameRecord, Participant};

/// Whose statistics are being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Player(Uuid),
    Deck(Uuid),
}

impl Subject {
    pub fn seat(self, game: &GameRecord) -> Option<&Participant> {
        match self {
            Subject::Player(id) => game.seat_of_player(id),
            Subject::Deck(id) => game.seat_of_deck(id),
        }
    }

    /// The id of the same kind of entity for another participant.
    pub fn key_of(self, p: &Participant) -> Uuid {
        match self {
            Subject::Player(_) => p.player_id,
            Subject::Deck(_) => p.deck_id,
        }
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `part / whole` as a percentage with two decimals; 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(f64::from(part) / f64::from(whole) * 100.0)
    }
}
