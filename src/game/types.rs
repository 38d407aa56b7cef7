use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One colour of a commander's color identity. `C` is colorless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    W,
    U,
    B,
    R,
    G,
    C,
}

impl Color {
    pub const ALL: [Color; 6] = [Color::W, Color::U, Color::B, Color::R, Color::G, Color::C];

    pub fn code(self) -> &'static str {
        match self {
            Color::W => "W",
            Color::U => "U",
            Color::B => "B",
            Color::R => "R",
            Color::G => "G",
            Color::C => "C",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Color::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parses a color identity into canonical WUBRG(C) order without duplicates.
/// Colorless cannot be combined with a color.
pub fn parse_colors<S: AsRef<str>>(codes: &[S]) -> Result<Vec<Color>, String> {
    let mut colors = Vec::with_capacity(codes.len());
    for code in codes {
        let code = code.as_ref();
        let color =
            Color::from_code(code).ok_or_else(|| format!("unknown color {code:?}, expected W/U/B/R/G/C"))?;
        colors.push(color);
    }
    colors.sort();
    colors.dedup();
    if colors.len() > 1 && colors.contains(&Color::C) {
        return Err("colorless (C) cannot be combined with other colors".into());
    }
    Ok(colors)
}

/// A player's seat in a recorded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub player_id: Uuid,
    pub deck_id: Uuid,
    pub placement: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eliminated_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_from: Option<Uuid>,
}

impl Participant {
    pub fn won(&self) -> bool {
        self.placement == 1
    }
}

/// A stored game with its participants ordered by placement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: Uuid,
    pub created_by: Uuid,
    pub played_at: DateTime<Utc>,
    /// Minutes.
    #[serde(rename = "duration")]
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn pod_size(&self) -> usize {
        self.participants.len()
    }

    pub fn seat_of_player(&self, player_id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.player_id == player_id)
    }

    pub fn seat_of_deck(&self, deck_id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.deck_id == deck_id)
    }
}

/// A validated game ready to be written.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub played_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub participants: Vec<Participant>,
}
