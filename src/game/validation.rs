//! Write-time rules for recorded games.
//!
//! Everything here is pure: callers collect the full list of issues and
//! reject the request before anything touches the database.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::FieldError;
use crate::game::types::Participant;

pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 6;
pub const MAX_DURATION_MINUTES: i32 = 24 * 60;
pub const MAX_NOTES_LEN: usize = 2000;

fn at(i: usize, field: &str) -> String {
    format!("participants[{i}].{field}")
}

/// Checks the participant list of a game.
///
/// Placements must be a permutation of `1..=N`, every player and deck appears
/// once, `eliminatedBy` points at another participant and the winner was never
/// eliminated.
pub fn validate_participants(participants: &[Participant]) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let n = participants.len();

    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&n) {
        errors.push(FieldError::new(
            "participants",
            format!("a game needs between {MIN_PARTICIPANTS} and {MAX_PARTICIPANTS} participants, got {n}"),
        ));
    }

    let players: HashSet<Uuid> = participants.iter().map(|p| p.player_id).collect();
    let mut seen_players = HashSet::new();
    let mut seen_decks = HashSet::new();
    let mut seen_placements = HashSet::new();

    for (i, p) in participants.iter().enumerate() {
        if !seen_players.insert(p.player_id) {
            errors.push(FieldError::new(at(i, "playerId"), "player appears more than once"));
        }
        if !seen_decks.insert(p.deck_id) {
            errors.push(FieldError::new(at(i, "deckId"), "deck is used by more than one participant"));
        }

        let placement = usize::from(p.placement);
        if placement < 1 || placement > n {
            errors.push(FieldError::new(
                at(i, "placement"),
                format!("placement must be between 1 and {n}"),
            ));
        } else if !seen_placements.insert(placement) {
            errors.push(FieldError::new(
                at(i, "placement"),
                format!("placement {placement} is used more than once"),
            ));
        }

        if let Some(by) = p.eliminated_by {
            if p.won() {
                errors.push(FieldError::new(
                    at(i, "eliminatedBy"),
                    "the winner cannot have been eliminated",
                ));
            }
            if by == p.player_id {
                errors.push(FieldError::new(
                    at(i, "eliminatedBy"),
                    "a player cannot eliminate themselves",
                ));
            } else if !players.contains(&by) {
                errors.push(FieldError::new(
                    at(i, "eliminatedBy"),
                    "must reference another participant of this game",
                ));
            }
        }

        if p.borrowed_from == Some(p.player_id) {
            errors.push(FieldError::new(
                at(i, "borrowedFrom"),
                "a player cannot borrow their own deck",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks game metadata and participants together.
pub fn validate_game(
    duration_minutes: Option<i32>,
    notes: Option<&str>,
    participants: &[Participant],
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if let Some(d) = duration_minutes {
        if !(0..=MAX_DURATION_MINUTES).contains(&d) {
            errors.push(FieldError::new(
                "duration",
                format!("duration must be between 0 and {MAX_DURATION_MINUTES} minutes"),
            ));
        }
    }
    if let Some(notes) = notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.push(FieldError::new(
                "notes",
                format!("notes cannot exceed {MAX_NOTES_LEN} characters"),
            ));
        }
    }
    if let Err(mut e) = validate_participants(participants) {
        errors.append(&mut e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that every participant references a known player and deck, and
/// fills in `borrowedFrom` when a player pilots somebody else's deck.
///
/// `deck_owners` maps deck id → owner id for the decks that exist. Seats in
/// `stored` (the game's current participants when it is being edited) stay
/// valid after their player or deck has been deleted, provided the player and
/// deck pair is unchanged.
pub fn resolve_references(
    participants: &mut [Participant],
    known_players: &HashSet<Uuid>,
    deck_owners: &HashMap<Uuid, Uuid>,
    stored: &[Participant],
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    for (i, p) in participants.iter_mut().enumerate() {
        let kept = stored
            .iter()
            .find(|s| s.player_id == p.player_id && s.deck_id == p.deck_id);

        if kept.is_none() && !known_players.contains(&p.player_id) {
            errors.push(FieldError::new(at(i, "playerId"), "player not found"));
        }

        let Some(&owner) = deck_owners.get(&p.deck_id) else {
            match kept {
                None => errors.push(FieldError::new(at(i, "deckId"), "deck not found")),
                // the owner is gone with the deck, so only the stored lender fits
                Some(seat) => match p.borrowed_from {
                    None => p.borrowed_from = seat.borrowed_from,
                    Some(lender) if Some(lender) != seat.borrowed_from => {
                        errors.push(FieldError::new(
                            at(i, "borrowedFrom"),
                            "must be the owner of the deck",
                        ))
                    }
                    Some(_) => {}
                },
            }
            continue;
        };

        match p.borrowed_from {
            Some(lender) if lender != owner => errors.push(FieldError::new(
                at(i, "borrowedFrom"),
                "must be the owner of the deck",
            )),
            Some(_) => {}
            None if owner != p.player_id => p.borrowed_from = Some(owner),
            None => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
