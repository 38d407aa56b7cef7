use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::game::types::{Color, GameRecord, Participant};

#[derive(Debug, Clone, FromRow)]
pub struct PlayerRow {
    pub id: Uuid,
    pub name: String,
    pub nickname: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub is_guest: bool,
    pub created_at: DateTime<Utc>,
    /// Owned decks, oldest first.
    pub deck_ids: Vec<Uuid>,
}

/// Public view of a player. The password hash never leaves the server and
/// the email is only shown to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: Uuid,
    pub name: String,
    pub nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub is_guest: bool,
    pub decks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PlayerRow {
    pub fn profile(&self, include_email: bool) -> PlayerProfile {
        PlayerProfile {
            id: self.id,
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            email: if include_email { self.email.clone() } else { None },
            profile_image: self.profile_image.clone(),
            is_admin: self.is_admin,
            is_guest: self.is_guest,
            decks: self.deck_ids.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRow {
    pub id: Uuid,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub name: String,
    pub commander: String,
    pub decklist_url: Option<String>,
    pub image_url: Option<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl DeckRow {
    /// Stored colors are canonical already; anything unknown is skipped.
    pub fn color_identity(&self) -> Vec<Color> {
        self.colors.iter().filter_map(|c| Color::from_code(c)).collect()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GameRow {
    pub id: Uuid,
    pub created_by: Uuid,
    pub played_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub deck_id: Uuid,
    pub placement: i16,
    pub eliminated_by: Option<Uuid>,
    pub borrowed_from: Option<Uuid>,
}

impl ParticipantRow {
    pub fn into_participant(self) -> Result<Participant> {
        Ok(Participant {
            player_id: self.player_id,
            deck_id: self.deck_id,
            placement: u8::try_from(self.placement)
                .with_context(|| format!("placement {} out of range", self.placement))?,
            eliminated_by: self.eliminated_by,
            borrowed_from: self.borrowed_from,
        })
    }
}

impl GameRow {
    pub fn with_participants(self, participants: Vec<Participant>) -> GameRecord {
        GameRecord {
            id: self.id,
            created_by: self.created_by,
            played_at: self.played_at,
            duration_minutes: self.duration_minutes,
            notes: self.notes,
            participants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
