use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::advanced::{advanced_metrics, global_win_probability, AdvancedMetrics};
use super::summary::{summarize, Finish, PlacementSummary};
use crate::game::types::{GameRecord, Participant};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub player_id: Uuid,
    #[serde(flatten)]
    pub summary: PlacementSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStanding {
    pub deck_id: Uuid,
    #[serde(flatten)]
    pub summary: PlacementSummary,
    #[serde(flatten)]
    pub advanced: AdvancedMetrics,
}

fn group_finishes(
    games: &[GameRecord],
    key: impl Fn(&Participant) -> Uuid,
) -> HashMap<Uuid, Vec<Finish>> {
    let mut acc: HashMap<Uuid, Vec<Finish>> = HashMap::new();
    for g in games {
        for p in &g.participants {
            acc.entry(key(p)).or_default().push(Finish {
                placement: p.placement,
                pod_size: g.pod_size(),
            });
        }
    }
    acc
}

/// Players with at least `min_games`, best win rate first; ties go to the
/// player with more games, then the better average placement.
pub fn player_leaderboard(games: &[GameRecord], min_games: u32) -> Vec<PlayerStanding> {
    let mut out: Vec<PlayerStanding> = group_finishes(games, |p| p.player_id)
        .into_iter()
        .map(|(player_id, f)| PlayerStanding {
            player_id,
            summary: summarize(&f),
        })
        .filter(|s| s.summary.games >= min_games)
        .collect();
    out.sort_by(|a, b| {
        b.summary
            .win_rate
            .total_cmp(&a.summary.win_rate)
            .then_with(|| b.summary.games.cmp(&a.summary.games))
            .then_with(|| a.summary.average_placement.total_cmp(&b.summary.average_placement))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    out
}

/// Decks with at least `min_games`, ranked by Bayesian win rate so that a
/// single lucky win does not top the board.
pub fn deck_leaderboard(games: &[GameRecord], min_games: u32, weight: f64) -> Vec<DeckStanding> {
    let prior = global_win_probability(games);
    let mut out: Vec<DeckStanding> = group_finishes(games, |p| p.deck_id)
        .into_iter()
        .map(|(deck_id, f)| DeckStanding {
            deck_id,
            summary: summarize(&f),
            advanced: advanced_metrics(&f, prior, weight),
        })
        .filter(|s| s.summary.games >= min_games)
        .collect();
    out.sort_by(|a, b| {
        b.advanced
            .bayesian_win_rate
            .total_cmp(&a.advanced.bayesian_win_rate)
            .then_with(|| b.summary.games.cmp(&a.summary.games))
            .then_with(|| a.deck_id.cmp(&b.deck_id))
    });
    out
}
