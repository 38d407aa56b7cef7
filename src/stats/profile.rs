//! Full stat sheets for a single player or deck.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::advanced::{advanced_metrics, AdvancedMetrics};
use super::summary::{finishes, summarize, Finish, PlacementSummary};
use super::{percentage, Subject};
use crate::game::types::{GameRecord, Participant};

pub const RECENT_GAMES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRecord {
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
}

/// How a player did with one deck, or how one pilot did with a deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub id: Uuid,
    #[serde(flatten)]
    pub summary: PlacementSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResult {
    pub game_id: Uuid,
    pub played_at: DateTime<Utc>,
    pub player_id: Uuid,
    pub deck_id: Uuid,
    pub placement: u8,
    pub pod_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    #[serde(flatten)]
    pub summary: PlacementSummary,
    pub by_pod_size: BTreeMap<usize, PodRecord>,
    pub decks: Vec<Usage>,
    pub recent: Vec<RecentResult>,
    pub eliminations: u32,
    pub times_eliminated: u32,
    pub borrowed_games: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    #[serde(flatten)]
    pub summary: PlacementSummary,
    pub advanced: AdvancedMetrics,
    pub by_pod_size: BTreeMap<usize, PodRecord>,
    pub pilots: Vec<Usage>,
    pub recent: Vec<RecentResult>,
}

fn by_pod_size(finishes: &[Finish]) -> BTreeMap<usize, PodRecord> {
    let mut acc: BTreeMap<usize, (u32, u32)> = BTreeMap::new();
    for f in finishes {
        let e = acc.entry(f.pod_size).or_insert((0, 0));
        e.0 += 1;
        if f.won() {
            e.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(size, (games, wins))| {
            (
                size,
                PodRecord {
                    games,
                    wins,
                    win_rate: percentage(wins, games),
                },
            )
        })
        .collect()
}

/// Groups the subject's seats by `key` (deck for a player, pilot for a deck).
fn usage_by(
    games: &[GameRecord],
    subject: Subject,
    key: impl Fn(&Participant) -> Uuid,
) -> Vec<Usage> {
    let mut acc: HashMap<Uuid, Vec<Finish>> = HashMap::new();
    for g in games {
        if let Some(p) = subject.seat(g) {
            acc.entry(key(p)).or_default().push(Finish {
                placement: p.placement,
                pod_size: g.pod_size(),
            });
        }
    }
    let mut out: Vec<Usage> = acc
        .into_iter()
        .map(|(id, f)| Usage {
            id,
            summary: summarize(&f),
        })
        .collect();
    out.sort_by(|a, b| {
        b.summary
            .games
            .cmp(&a.summary.games)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

fn recent(games: &[GameRecord], subject: Subject) -> Vec<RecentResult> {
    let mut seats: Vec<(&GameRecord, &Participant)> = games
        .iter()
        .filter_map(|g| subject.seat(g).map(|p| (g, p)))
        .collect();
    seats.sort_by(|a, b| b.0.played_at.cmp(&a.0.played_at));
    seats
        .into_iter()
        .take(RECENT_GAMES)
        .map(|(g, p)| RecentResult {
            game_id: g.id,
            played_at: g.played_at,
            player_id: p.player_id,
            deck_id: p.deck_id,
            placement: p.placement,
            pod_size: g.pod_size(),
        })
        .collect()
}

pub fn player_stats(games: &[GameRecord], player_id: Uuid) -> PlayerStats {
    let subject = Subject::Player(player_id);
    let finishes = finishes(games, subject);

    let mut eliminations = 0;
    let mut times_eliminated = 0;
    let mut borrowed_games = 0;
    for g in games {
        let Some(me) = g.seat_of_player(player_id) else {
            continue;
        };
        if me.eliminated_by.is_some() {
            times_eliminated += 1;
        }
        if me.borrowed_from.is_some() {
            borrowed_games += 1;
        }
        eliminations += g
            .participants
            .iter()
            .filter(|p| p.eliminated_by == Some(player_id))
            .count() as u32;
    }

    PlayerStats {
        summary: summarize(&finishes),
        by_pod_size: by_pod_size(&finishes),
        decks: usage_by(games, subject, |p| p.deck_id),
        recent: recent(games, subject),
        eliminations,
        times_eliminated,
        borrowed_games,
    }
}

/// `prior` is the playgroup-wide win probability, `weight` its strength.
pub fn deck_stats(games: &[GameRecord], deck_id: Uuid, prior: f64, weight: f64) -> DeckStats {
    let subject = Subject::Deck(deck_id);
    let finishes = finishes(games, subject);

    DeckStats {
        summary: summarize(&finishes),
        advanced: advanced_metrics(&finishes, prior, weight),
        by_pod_size: by_pod_size(&finishes),
        pilots: usage_by(games, subject, |p| p.player_id),
        recent: recent(games, subject),
    }
}
