//! Who knocks out whom.

use chrono::Utc;
use commander_tracker_server::game::types::{GameRecord, Participant};
use commander_tracker_server::stats::eliminations::{elimination_table, eliminations_for, Tally};
use uuid::Uuid;

fn seat(player: Uuid, placement: u8, eliminated_by: Option<Uuid>) -> Participant {
    Participant {
        player_id: player,
        deck_id: Uuid::new_v4(),
        placement,
        eliminated_by,
        borrowed_from: None,
    }
}

fn game(participants: Vec<Participant>) -> GameRecord {
    GameRecord {
        id: Uuid::new_v4(),
        created_by: participants[0].player_id,
        played_at: Utc::now(),
        duration_minutes: None,
        notes: None,
        participants,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample() -> ([Uuid; 3], Vec<GameRecord>) {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let games = vec![
        game(vec![seat(a, 1, None), seat(b, 2, Some(a)), seat(c, 3, Some(b))]),
        game(vec![seat(a, 1, None), seat(b, 2, Some(a))]),
    ];
    ([a, b, c], games)
}

#[test]
fn table_puts_top_eliminators_first() {
    let ([a, b, c], games) = sample();
    let table = elimination_table(&games);

    let order: Vec<Uuid> = table.iter().map(|r| r.player_id).collect();
    assert_eq!(order, vec![a, b, c]);
    assert_eq!((table[0].eliminations, table[0].times_eliminated), (2, 0));
    assert_eq!((table[1].eliminations, table[1].times_eliminated), (1, 2));
    assert_eq!((table[2].eliminations, table[2].times_eliminated), (0, 1));
}

#[test]
fn single_player_breakdown() {
    let ([a, b, c], games) = sample();
    let rec = eliminations_for(&games, b);

    assert_eq!(rec.victims, vec![Tally { player_id: c, count: 1 }]);
    assert_eq!(rec.eliminated_by, vec![Tally { player_id: a, count: 2 }]);
    assert_eq!(rec.eliminations, 1);
    assert_eq!(rec.times_eliminated, 2);
}

#[test]
fn stranger_has_an_empty_record() {
    let (_, games) = sample();
    let rec = eliminations_for(&games, Uuid::new_v4());
    assert!(rec.victims.is_empty());
    assert!(rec.eliminated_by.is_empty());
    assert_eq!(rec.eliminations, 0);
}
