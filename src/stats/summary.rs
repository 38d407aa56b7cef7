use serde::Serialize;
use std::collections::BTreeMap;

use super::{percentage, round2, Subject};
use crate::game::types::GameRecord;

/// One finishing position together with the size of the pod it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finish {
    pub placement: u8,
    pub pod_size: usize,
}

impl Finish {
    pub fn won(self) -> bool {
        self.placement == 1
    }

    /// Placement scaled to `[0, 1]`: 0 for a win, 1 for last place.
    pub fn normalized(self) -> f64 {
        if self.pod_size <= 1 {
            return 0.0;
        }
        f64::from(self.placement.saturating_sub(1)) / (self.pod_size - 1) as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSummary {
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub average_placement: f64,
    /// placement → number of games finished there
    pub placements: BTreeMap<u8, u32>,
}

/// Every finish of `subject`, in the order of `games`.
pub fn finishes(games: &[GameRecord], subject: Subject) -> Vec<Finish> {
    games
        .iter()
        .filter_map(|g| {
            subject.seat(g).map(|p| Finish {
                placement: p.placement,
                pod_size: g.pod_size(),
            })
        })
        .collect()
}

pub fn summarize(finishes: &[Finish]) -> PlacementSummary {
    let mut placements = BTreeMap::new();
    let mut wins = 0u32;
    let mut total = 0u64;

    for f in finishes {
        *placements.entry(f.placement).or_insert(0) += 1;
        total += u64::from(f.placement);
        if f.won() {
            wins += 1;
        }
    }

    let games = finishes.len() as u32;
    let average_placement = if games == 0 {
        0.0
    } else {
        round2(total as f64 / f64::from(games))
    };

    PlacementSummary {
        games,
        wins,
        win_rate: percentage(wins, games),
        average_placement,
        placements,
    }
}

pub fn summary_for(games: &[GameRecord], subject: Subject) -> PlacementSummary {
    summarize(&finishes(games, subject))
}
