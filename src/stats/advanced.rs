//! Closed-form deck metrics on top of the plain win rate.

use serde::Serialize;

use super::round2;
use super::summary::Finish;
use crate::game::types::GameRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedMetrics {
    /// Mean of `(N - placement) / (N - 1)` as a percentage: 100 for always
    /// winning, 0 for always finishing last.
    pub weighted_score: f64,
    /// Win rate shrunk towards the playgroup average.
    pub bayesian_win_rate: f64,
    /// High when a deck places well *and* consistently.
    pub dominance_index: f64,
}

/// Probability that a random seat wins a game: total wins over total seats.
pub fn global_win_probability(games: &[GameRecord]) -> f64 {
    win_probability(games.len() as u64, games.iter().map(|g| g.pod_size() as u64).sum())
}

pub fn win_probability(wins: u64, seats: u64) -> f64 {
    if seats == 0 {
        0.0
    } else {
        wins as f64 / seats as f64
    }
}

pub fn weighted_score(finishes: &[Finish]) -> f64 {
    if finishes.is_empty() {
        return 0.0;
    }
    let total: f64 = finishes.iter().map(|f| 1.0 - f.normalized()).sum();
    round2(total / finishes.len() as f64 * 100.0)
}

/// `(wins + k·p) / (games + k)` as a percentage, where `p` is the prior win
/// probability and `k` its weight in pseudo-games.
pub fn bayesian_win_rate(wins: u32, games: u32, prior: f64, weight: f64) -> f64 {
    let denom = f64::from(games) + weight;
    if denom <= 0.0 {
        return 0.0;
    }
    round2((f64::from(wins) + weight * prior) / denom * 100.0)
}

/// `(1 - mean q) · (1 - 2σ(q)) · 100` over normalized placements `q`.
///
/// σ of values in `[0, 1]` is at most 0.5, so the consistency factor stays
/// in `[0, 1]`.
pub fn dominance_index(finishes: &[Finish]) -> f64 {
    if finishes.is_empty() {
        return 0.0;
    }
    let n = finishes.len() as f64;
    let qs: Vec<f64> = finishes.iter().map(|f| f.normalized()).collect();
    let mean = qs.iter().sum::<f64>() / n;
    let variance = qs.iter().map(|q| (q - mean).powi(2)).sum::<f64>() / n;
    let consistency = (1.0 - 2.0 * variance.sqrt()).clamp(0.0, 1.0);
    round2(((1.0 - mean) * consistency * 100.0).clamp(0.0, 100.0))
}

pub fn advanced_metrics(finishes: &[Finish], prior: f64, weight: f64) -> AdvancedMetrics {
    let wins = finishes.iter().filter(|f| f.won()).count() as u32;
    AdvancedMetrics {
        weighted_score: weighted_score(finishes),
        bayesian_win_rate: bayesian_win_rate(wins, finishes.len() as u32, prior, weight),
        dominance_index: dominance_index(finishes),
    }
}
