use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::game::types::GameRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub player_id: Uuid,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationRecord {
    pub player_id: Uuid,
    pub eliminations: u32,
    pub times_eliminated: u32,
    /// Who this player knocked out, most often first.
    pub victims: Vec<Tally>,
    /// Who knocked this player out, most often first.
    pub eliminated_by: Vec<Tally>,
}

#[derive(Default)]
struct Acc {
    victims: HashMap<Uuid, u32>,
    eliminated_by: HashMap<Uuid, u32>,
}

fn tallies(map: HashMap<Uuid, u32>) -> Vec<Tally> {
    let mut out: Vec<Tally> = map
        .into_iter()
        .map(|(player_id, count)| Tally { player_id, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.player_id.cmp(&b.player_id)));
    out
}

fn record(player_id: Uuid, acc: Acc) -> EliminationRecord {
    EliminationRecord {
        player_id,
        eliminations: acc.victims.values().sum(),
        times_eliminated: acc.eliminated_by.values().sum(),
        victims: tallies(acc.victims),
        eliminated_by: tallies(acc.eliminated_by),
    }
}

/// Elimination records for every player seen in `games`, top eliminators
/// first. Players who never eliminated anyone still get a row.
pub fn elimination_table(games: &[GameRecord]) -> Vec<EliminationRecord> {
    let mut acc: HashMap<Uuid, Acc> = HashMap::new();

    for game in games {
        for p in &game.participants {
            acc.entry(p.player_id).or_default();
            if let Some(killer) = p.eliminated_by {
                *acc.entry(killer)
                    .or_default()
                    .victims
                    .entry(p.player_id)
                    .or_insert(0) += 1;
                *acc.entry(p.player_id)
                    .or_default()
                    .eliminated_by
                    .entry(killer)
                    .or_insert(0) += 1;
            }
        }
    }

    let mut out: Vec<EliminationRecord> =
        acc.into_iter().map(|(id, a)| record(id, a)).collect();
    out.sort_by(|a, b| {
        b.eliminations
            .cmp(&a.eliminations)
            .then_with(|| a.times_eliminated.cmp(&b.times_eliminated))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    out
}

pub fn eliminations_for(games: &[GameRecord], player_id: Uuid) -> EliminationRecord {
    let mut acc = Acc::default();
    for game in games {
        for p in &game.participants {
            match p.eliminated_by {
                Some(killer) if killer == player_id => {
                    *acc.victims.entry(p.player_id).or_insert(0) += 1;
                }
                Some(killer) if p.player_id == player_id => {
                    *acc.eliminated_by.entry(killer).or_insert(0) += 1;
                }
                _ => {}
            }
        }
    }
    record(player_id, acc)
}
