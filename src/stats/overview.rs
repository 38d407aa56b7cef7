//! Playgroup-wide numbers for the dashboard.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::{percentage, round2};
use crate::game::types::{Color, GameRecord};

pub const TOP_COMMANDERS: usize = 10;

/// What the overview needs to know about a deck.
#[derive(Debug, Clone)]
pub struct DeckRef {
    pub commander: String,
    pub colors: Vec<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommanderCount {
    pub commander: String,
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorCount {
    pub seats: u32,
    pub wins: u32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_games: u32,
    pub total_seats: u32,
    pub average_pod_size: f64,
    pub average_duration_minutes: Option<f64>,
    /// `YYYY-MM` → games played that month
    pub games_by_month: BTreeMap<String, u32>,
    pub commanders: Vec<CommanderCount>,
    pub colors: BTreeMap<Color, ColorCount>,
}

pub fn overview(games: &[GameRecord], decks: &HashMap<Uuid, DeckRef>) -> Overview {
    let mut total_seats = 0u32;
    let mut durations = Vec::new();
    let mut games_by_month: BTreeMap<String, u32> = BTreeMap::new();
    let mut commanders: HashMap<&str, (u32, u32)> = HashMap::new();
    let mut colors: BTreeMap<Color, (u32, u32)> = BTreeMap::new();

    for g in games {
        total_seats += g.pod_size() as u32;
        if let Some(d) = g.duration_minutes {
            durations.push(f64::from(d));
        }
        *games_by_month
            .entry(g.played_at.format("%Y-%m").to_string())
            .or_insert(0) += 1;

        for p in &g.participants {
            let Some(deck) = decks.get(&p.deck_id) else {
                continue;
            };
            let won = u32::from(p.won());
            let c = commanders.entry(deck.commander.as_str()).or_insert((0, 0));
            c.0 += 1;
            c.1 += won;
            for color in &deck.colors {
                let c = colors.entry(*color).or_insert((0, 0));
                c.0 += 1;
                c.1 += won;
            }
        }
    }

    let total_games = games.len() as u32;
    let mut commanders: Vec<CommanderCount> = commanders
        .into_iter()
        .map(|(name, (games, wins))| CommanderCount {
            commander: name.to_string(),
            games,
            wins,
            win_rate: percentage(wins, games),
        })
        .collect();
    commanders.sort_by(|a, b| {
        b.games
            .cmp(&a.games)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.commander.cmp(&b.commander))
    });
    commanders.truncate(TOP_COMMANDERS);

    Overview {
        total_games,
        total_seats,
        average_pod_size: if total_games == 0 {
            0.0
        } else {
            round2(f64::from(total_seats) / f64::from(total_games))
        },
        average_duration_minutes: if durations.is_empty() {
            None
        } else {
            Some(round2(durations.iter().sum::<f64>() / durations.len() as f64))
        },
        games_by_month,
        commanders,
        colors: colors
            .into_iter()
            .map(|(color, (seats, wins))| {
                (
                    color,
                    ColorCount {
                        seats,
                        wins,
                        win_rate: percentage(wins, seats),
                    },
                )
            })
            .collect(),
    }
}
