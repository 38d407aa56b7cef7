//! Player and deck leaderboards.

use chrono::Utc;
use commander_tracker_server::game::types::{GameRecord, Participant};
use commander_tracker_server::stats::leaderboard::{deck_leaderboard, player_leaderboard};
use uuid::Uuid;

#[derive(Clone, Copy)]
struct Entrant {
    player: Uuid,
    deck: Uuid,
}

impl Entrant {
    fn new() -> Self {
        Entrant {
            player: Uuid::new_v4(),
            deck: Uuid::new_v4(),
        }
    }
}

/// Two-player game, `winner` first.
fn duel(winner: Entrant, loser: Entrant) -> GameRecord {
    let seat = |e: Entrant, placement| Participant {
        player_id: e.player,
        deck_id: e.deck,
        placement,
        eliminated_by: None,
        borrowed_from: None,
    };
    GameRecord {
        id: Uuid::new_v4(),
        created_by: winner.player,
        played_at: Utc::now(),
        duration_minutes: None,
        notes: None,
        participants: vec![seat(winner, 1), seat(loser, 2)],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// `y` goes 6-2 against `o`; `x` wins its only game against `z`.
fn sample() -> ([Entrant; 4], Vec<GameRecord>) {
    let (y, o, x, z) = (Entrant::new(), Entrant::new(), Entrant::new(), Entrant::new());
    let mut games: Vec<GameRecord> = (0..6).map(|_| duel(y, o)).collect();
    games.push(duel(o, y));
    games.push(duel(o, y));
    games.push(duel(x, z));
    ([y, o, x, z], games)
}

#[test]
fn players_below_min_games_are_left_out() {
    let ([y, o, ..], games) = sample();
    let board = player_leaderboard(&games, 3);
    let ids: Vec<Uuid> = board.iter().map(|s| s.player_id).collect();
    assert_eq!(ids, vec![y.player, o.player]);
    assert_eq!(board[0].summary.win_rate, 75.0);
}

#[test]
fn raw_win_rate_orders_players() {
    let ([y, o, x, z], games) = sample();
    let board = player_leaderboard(&games, 1);
    let ids: Vec<Uuid> = board.iter().map(|s| s.player_id).collect();
    assert_eq!(ids, vec![x.player, y.player, o.player, z.player]);
}

#[test]
fn decks_are_ranked_by_bayesian_rate() {
    let ([y, o, x, z], games) = sample();
    // prior: 9 wins over 18 seats = 0.5
    let board = deck_leaderboard(&games, 1, 5.0);
    let ids: Vec<Uuid> = board.iter().map(|s| s.deck_id).collect();
    assert_eq!(ids, vec![y.deck, x.deck, z.deck, o.deck]);

    // (6 + 2.5) / 13
    assert_eq!(board[0].advanced.bayesian_win_rate, 65.38);
    // (1 + 2.5) / 6
    assert_eq!(board[1].advanced.bayesian_win_rate, 58.33);
    assert_eq!(board[1].summary.win_rate, 100.0);
}

#[test]
fn empty_history_gives_empty_boards() {
    assert!(player_leaderboard(&[], 0).is_empty());
    assert!(deck_leaderboard(&[], 0, 5.0).is_empty());
}
