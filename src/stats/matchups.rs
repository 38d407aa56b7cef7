use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::{percentage, round2, Subject};
use crate::game::types::GameRecord;

/// Head-to-head record against one opponent (player or deck).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub opponent_id: Uuid,
    pub games: u32,
    /// Games where the subject finished ahead of the opponent.
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    /// Mean of `opponent placement - subject placement`.
    pub average_placement_diff: f64,
}

#[derive(Default)]
struct Acc {
    games: u32,
    wins: u32,
    losses: u32,
    diff: i64,
}

/// Pairs the subject with every co-occurring opponent, most frequent first.
pub fn matchups(games: &[GameRecord], subject: Subject) -> Vec<Matchup> {
    let mut acc: HashMap<Uuid, Acc> = HashMap::new();

    for game in games {
        let Some(me) = subject.seat(game) else {
            continue;
        };
        for other in game.participants.iter().filter(|p| !std::ptr::eq(*p, me)) {
            let entry = acc.entry(subject.key_of(other)).or_default();
            let diff = i64::from(other.placement) - i64::from(me.placement);
            entry.games += 1;
            entry.diff += diff;
            if diff > 0 {
                entry.wins += 1;
            } else if diff < 0 {
                entry.losses += 1;
            }
        }
    }

    let mut out: Vec<Matchup> = acc
        .into_iter()
        .map(|(opponent_id, a)| Matchup {
            opponent_id,
            games: a.games,
            wins: a.wins,
            losses: a.losses,
            win_rate: percentage(a.wins, a.games),
            average_placement_diff: round2(a.diff as f64 / f64::from(a.games)),
        })
        .collect();
    out.sort_by(|a, b| {
        b.games
            .cmp(&a.games)
            .then_with(|| b.win_rate.total_cmp(&a.win_rate))
            .then_with(|| a.opponent_id.cmp(&b.opponent_id))
    });
    out
}
