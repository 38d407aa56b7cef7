//! Dashboard overview across the whole playgroup.

use chrono::{TimeZone, Utc};
use commander_tracker_server::game::types::{Color, GameRecord, Participant};
use commander_tracker_server::stats::overview::{overview, DeckRef};
use std::collections::HashMap;
use uuid::Uuid;

fn game(month: u32, duration: Option<i32>, decks: &[Uuid]) -> GameRecord {
    let played = Utc.with_ymd_and_hms(2025, month, 10, 19, 30, 0).unwrap();
    let participants: Vec<Participant> = decks
        .iter()
        .enumerate()
        .map(|(i, deck)| Participant {
            player_id: Uuid::new_v4(),
            deck_id: *deck,
            placement: (i + 1) as u8,
            eliminated_by: None,
            borrowed_from: None,
        })
        .collect();
    GameRecord {
        id: Uuid::new_v4(),
        created_by: participants[0].player_id,
        played_at: played,
        duration_minutes: duration,
        notes: None,
        participants,
        created_at: played,
        updated_at: played,
    }
}

fn deck(commander: &str, colors: &[Color]) -> DeckRef {
    DeckRef {
        commander: commander.to_string(),
        colors: colors.to_vec(),
    }
}

#[test]
fn overview_counts_games_commanders_and_colors() {
    let (atraxa, krenko, gone) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let (urza, other) = (Uuid::new_v4(), Uuid::new_v4());
    let decks = HashMap::from([
        (atraxa, deck("Atraxa", &[Color::W, Color::U, Color::B, Color::G])),
        (krenko, deck("Krenko", &[Color::R])),
        (urza, deck("Urza", &[Color::U])),
        (other, deck("Krenko", &[Color::R])),
    ]);
    let games = vec![
        game(5, Some(30), &[atraxa, krenko]),
        game(6, Some(90), &[krenko, urza, other, gone]),
        game(6, None, &[atraxa, urza]),
    ];

    let o = overview(&games, &decks);
    assert_eq!(o.total_games, 3);
    assert_eq!(o.total_seats, 8);
    assert_eq!(o.average_pod_size, 2.67);
    assert_eq!(o.average_duration_minutes, Some(60.0));
    assert_eq!(o.games_by_month.get("2025-05"), Some(&1));
    assert_eq!(o.games_by_month.get("2025-06"), Some(&2));

    // Krenko: three seats over two decks, one win; the deleted deck is skipped
    assert_eq!(o.commanders[0].commander, "Krenko");
    assert_eq!((o.commanders[0].games, o.commanders[0].wins), (3, 1));
    assert_eq!(o.commanders.iter().map(|c| c.games).sum::<u32>(), 7);

    let blue = &o.colors[&Color::U];
    assert_eq!((blue.seats, blue.wins), (4, 2));
    assert_eq!(blue.win_rate, 50.0);
    assert!(!o.colors.contains_key(&Color::C));
}

#[test]
fn empty_overview() {
    let o = overview(&[], &HashMap::new());
    assert_eq!(o.total_games, 0);
    assert_eq!(o.average_pod_size, 0.0);
    assert_eq!(o.average_duration_minutes, None);
    assert!(o.commanders.is_empty());
}
