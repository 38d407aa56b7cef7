//! In-person "current game" life counter.
//!
//! Pure state: seats, life totals, poison and commander damage with an undo
//! history. Nothing is persisted until [`LifeCounter::finish`] turns the table
//! into the participant list that `POST /api/games` accepts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::game::types::Participant;
use crate::game::validation::{MAX_PARTICIPANTS, MIN_PARTICIPANTS};

pub const STARTING_LIFE: i32 = 40;
pub const POISON_LIMIT: u32 = 10;
pub const COMMANDER_DAMAGE_LIMIT: u32 = 21;
pub const MAX_HISTORY: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("a game needs between {MIN_PARTICIPANTS} and {MAX_PARTICIPANTS} seats")]
    SeatCount,
    #[error("player {0} is seated twice")]
    DuplicateSeat(Uuid),
    #[error("player {0} is not at this table")]
    UnknownSeat(Uuid),
    #[error("player {0} is already out")]
    AlreadyOut(Uuid),
    #[error("the game is already over")]
    GameOver,
    #[error("the game is still in progress")]
    InProgress,
    #[error("nothing to undo")]
    NothingToUndo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KnockoutReason {
    Life,
    Poison,
    CommanderDamage,
    Conceded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Knockout {
    /// 0 for the first seat knocked out, 1 for the second …
    pub order: usize,
    pub by: Option<Uuid>,
    pub reason: KnockoutReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub player_id: Uuid,
    pub deck_id: Uuid,
    pub borrowed_from: Option<Uuid>,
    pub life: i32,
    pub poison: u32,
    /// source player → commander damage taken from them
    pub commander_damage: HashMap<Uuid, u32>,
    pub out: Option<Knockout>,
}

impl Seat {
    pub fn new(player_id: Uuid, deck_id: Uuid) -> Self {
        Seat {
            player_id,
            deck_id,
            borrowed_from: None,
            life: STARTING_LIFE,
            poison: 0,
            commander_damage: HashMap::new(),
            out: None,
        }
    }

    pub fn borrowing_from(mut self, owner: Uuid) -> Self {
        self.borrowed_from = Some(owner);
        self
    }

    pub fn alive(&self) -> bool {
        self.out.is_none()
    }

    fn lethal(&self) -> Option<KnockoutReason> {
        if self.life <= 0 {
            Some(KnockoutReason::Life)
        } else if self.poison >= POISON_LIMIT {
            Some(KnockoutReason::Poison)
        } else if self
            .commander_damage
            .values()
            .any(|d| *d >= COMMANDER_DAMAGE_LIMIT)
        {
            Some(KnockoutReason::CommanderDamage)
        } else {
            None
        }
    }
}

/// One tap on the life-counter screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Gain (positive) or lose (negative) life, optionally caused by `source`.
    Life {
        player: Uuid,
        delta: i32,
        source: Option<Uuid>,
    },
    Poison {
        player: Uuid,
        delta: i32,
        source: Option<Uuid>,
    },
    /// Combat damage from `source`'s commander; also costs life.
    CommanderDamage {
        player: Uuid,
        source: Uuid,
        amount: u32,
    },
    Concede {
        player: Uuid,
    },
}

impl Action {
    fn target(&self) -> Uuid {
        match self {
            Action::Life { player, .. }
            | Action::Poison { player, .. }
            | Action::CommanderDamage { player, .. }
            | Action::Concede { player } => *player,
        }
    }

    fn source(&self) -> Option<Uuid> {
        match self {
            Action::Life { source, .. } | Action::Poison { source, .. } => *source,
            Action::CommanderDamage { source, .. } => Some(*source),
            Action::Concede { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    seats: Vec<Seat>,
    knocked_out: usize,
}

#[derive(Debug, Clone)]
pub struct LifeCounter {
    seats: Vec<Seat>,
    knocked_out: usize,
    history: Vec<Snapshot>,
}

impl LifeCounter {
    pub fn new(seats: Vec<Seat>) -> Result<Self, TrackerError> {
        if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&seats.len()) {
            return Err(TrackerError::SeatCount);
        }
        for (i, s) in seats.iter().enumerate() {
            if seats[..i].iter().any(|o| o.player_id == s.player_id) {
                return Err(TrackerError::DuplicateSeat(s.player_id));
            }
        }
        Ok(LifeCounter {
            seats,
            knocked_out: 0,
            history: Vec::new(),
        })
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, player: Uuid) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player)
    }

    pub fn remaining(&self) -> usize {
        self.seats.iter().filter(|s| s.alive()).count()
    }

    pub fn is_over(&self) -> bool {
        self.remaining() <= 1
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Applies `action`, recording the previous state for [`undo`](Self::undo).
    /// Returns the players knocked out by this action.
    pub fn apply(&mut self, action: Action) -> Result<Vec<Uuid>, TrackerError> {
        if self.is_over() {
            return Err(TrackerError::GameOver);
        }
        let target = action.target();
        let idx = self
            .seats
            .iter()
            .position(|s| s.player_id == target)
            .ok_or(TrackerError::UnknownSeat(target))?;
        if !self.seats[idx].alive() {
            return Err(TrackerError::AlreadyOut(target));
        }
        if let Some(src) = action.source() {
            if self.seat(src).is_none() {
                return Err(TrackerError::UnknownSeat(src));
            }
        }

        self.history.push(Snapshot {
            seats: self.seats.clone(),
            knocked_out: self.knocked_out,
        });
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }

        let source = action.source().filter(|s| *s != target);
        let seat = &mut self.seats[idx];
        let reason = match action {
            Action::Life { delta, .. } => {
                seat.life = seat.life.saturating_add(delta);
                seat.lethal()
            }
            Action::Poison { delta, .. } => {
                seat.poison = seat.poison.saturating_add_signed(delta);
                seat.lethal()
            }
            Action::CommanderDamage { source, amount, .. } => {
                let taken = seat.commander_damage.entry(source).or_insert(0);
                *taken = taken.saturating_add(amount);
                seat.life = seat.life.saturating_sub(amount.min(i32::MAX as u32) as i32);
                seat.lethal()
            }
            Action::Concede { .. } => Some(KnockoutReason::Conceded),
        };

        let mut out = Vec::new();
        if let Some(reason) = reason {
            seat.out = Some(Knockout {
                order: self.knocked_out,
                by: source,
                reason,
            });
            self.knocked_out += 1;
            out.push(target);
        }
        Ok(out)
    }

    pub fn undo(&mut self) -> Result<(), TrackerError> {
        let snap = self.history.pop().ok_or(TrackerError::NothingToUndo)?;
        self.seats = snap.seats;
        self.knocked_out = snap.knocked_out;
        Ok(())
    }

    /// Final standings: the last seat standing wins, everyone else is ranked
    /// by how late they were knocked out.
    pub fn finish(&self) -> Result<Vec<Participant>, TrackerError> {
        if !self.is_over() {
            return Err(TrackerError::InProgress);
        }
        let mut ranked: Vec<&Seat> = self.seats.iter().collect();
        ranked.sort_by_key(|s| match &s.out {
            None => (0, 0),
            Some(k) => (1, usize::MAX - k.order),
        });

        Ok(ranked
            .into_iter()
            .enumerate()
            .map(|(i, s)| Participant {
                player_id: s.player_id,
                deck_id: s.deck_id,
                placement: (i + 1) as u8,
                eliminated_by: s.out.as_ref().and_then(|k| k.by),
                borrowed_from: s.borrowed_from,
            })
            .collect())
    }
}
