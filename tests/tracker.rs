//! Live life counter and its hand-off into a recorded game.

use commander_tracker_server::game::validation::validate_participants;
use commander_tracker_server::tracker::{
    Action, KnockoutReason, LifeCounter, Seat, TrackerError, STARTING_LIFE,
};
use uuid::Uuid;

fn table(n: usize) -> (Vec<Uuid>, LifeCounter) {
    let players: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
    let seats = players.iter().map(|p| Seat::new(*p, Uuid::new_v4())).collect();
    (players, LifeCounter::new(seats).unwrap())
}

fn hit(player: Uuid, delta: i32, source: Option<Uuid>) -> Action {
    Action::Life {
        player,
        delta,
        source,
    }
}

#[test]
fn table_size_and_duplicates() {
    let p = Uuid::new_v4();
    assert_eq!(
        LifeCounter::new(vec![Seat::new(p, Uuid::new_v4())]).unwrap_err(),
        TrackerError::SeatCount
    );
    assert_eq!(
        LifeCounter::new(vec![Seat::new(p, Uuid::new_v4()), Seat::new(p, Uuid::new_v4())])
            .unwrap_err(),
        TrackerError::DuplicateSeat(p)
    );

    let (players, counter) = table(4);
    assert!(counter.seats().iter().all(|s| s.life == STARTING_LIFE));
    assert_eq!(counter.remaining(), 4);
    assert!(counter.seat(players[0]).is_some());
}

#[test]
fn life_loss_knocks_out_at_zero() {
    let (p, mut counter) = table(3);
    assert!(counter.apply(hit(p[1], -39, Some(p[0]))).unwrap().is_empty());
    assert_eq!(counter.seat(p[1]).unwrap().life, 1);

    assert_eq!(counter.apply(hit(p[1], -1, Some(p[0]))).unwrap(), vec![p[1]]);
    let out = counter.seat(p[1]).unwrap().out.clone().unwrap();
    assert_eq!(out.by, Some(p[0]));
    assert_eq!(out.reason, KnockoutReason::Life);
    assert_eq!(out.order, 0);
}

#[test]
fn poison_knocks_out_at_ten() {
    let (p, mut counter) = table(2);
    let poison = |delta| Action::Poison {
        player: p[0],
        delta,
        source: Some(p[1]),
    };
    counter.apply(poison(9)).unwrap();
    counter.apply(poison(-2)).unwrap();
    assert_eq!(counter.seat(p[0]).unwrap().poison, 7);
    assert_eq!(counter.apply(poison(3)).unwrap(), vec![p[0]]);
    assert_eq!(
        counter.seat(p[0]).unwrap().out.as_ref().map(|k| k.reason),
        Some(KnockoutReason::Poison)
    );
}

#[test]
fn commander_damage_is_tracked_per_source() {
    let (p, mut counter) = table(3);
    let cmdr = |source, amount| Action::CommanderDamage {
        player: p[0],
        source,
        amount,
    };

    counter.apply(cmdr(p[1], 15)).unwrap();
    counter.apply(cmdr(p[2], 15)).unwrap();
    let seat = counter.seat(p[0]).unwrap();
    assert!(seat.alive());
    assert_eq!(seat.life, 10);

    counter.apply(hit(p[0], 20, None)).unwrap();
    assert_eq!(counter.apply(cmdr(p[1], 6)).unwrap(), vec![p[0]]);
    let out = counter.seat(p[0]).unwrap().out.clone().unwrap();
    assert_eq!(out.reason, KnockoutReason::CommanderDamage);
    assert_eq!(out.by, Some(p[1]));
}

#[test]
fn huge_commander_damage_saturates() {
    let (p, mut counter) = table(2);
    let cmdr = |amount| Action::CommanderDamage {
        player: p[0],
        source: p[1],
        amount,
    };

    counter.apply(cmdr(5)).unwrap();
    assert_eq!(counter.apply(cmdr(u32::MAX)).unwrap(), vec![p[0]]);
    let seat = counter.seat(p[0]).unwrap();
    assert_eq!(seat.commander_damage[&p[1]], u32::MAX);
    assert!(seat.life <= 0);
    assert_eq!(seat.out.as_ref().map(|k| k.by), Some(Some(p[1])));
}

#[test]
fn self_inflicted_loss_has_no_eliminator() {
    let (p, mut counter) = table(2);
    counter.apply(hit(p[0], -40, Some(p[0]))).unwrap();
    assert_eq!(counter.seat(p[0]).unwrap().out.as_ref().unwrap().by, None);
}

#[test]
fn concede_and_game_over() {
    let (p, mut counter) = table(3);
    counter.apply(Action::Concede { player: p[2] }).unwrap();
    assert_eq!(
        counter.apply(hit(p[2], -1, None)).unwrap_err(),
        TrackerError::AlreadyOut(p[2])
    );
    assert_eq!(counter.finish().unwrap_err(), TrackerError::InProgress);

    counter.apply(Action::Concede { player: p[1] }).unwrap();
    assert!(counter.is_over());
    assert_eq!(
        counter.apply(hit(p[0], 5, None)).unwrap_err(),
        TrackerError::GameOver
    );
}

#[test]
fn unknown_players_are_rejected() {
    let (p, mut counter) = table(2);
    let stranger = Uuid::new_v4();
    assert_eq!(
        counter.apply(hit(stranger, -1, None)).unwrap_err(),
        TrackerError::UnknownSeat(stranger)
    );
    assert_eq!(
        counter.apply(hit(p[0], -1, Some(stranger))).unwrap_err(),
        TrackerError::UnknownSeat(stranger)
    );
    assert!(!counter.can_undo());
}

#[test]
fn undo_restores_the_previous_state() {
    let (p, mut counter) = table(2);
    assert_eq!(counter.undo().unwrap_err(), TrackerError::NothingToUndo);

    counter.apply(hit(p[0], -10, None)).unwrap();
    counter.apply(hit(p[0], -30, Some(p[1]))).unwrap();
    assert!(counter.is_over());

    counter.undo().unwrap();
    assert!(!counter.is_over());
    assert_eq!(counter.seat(p[0]).unwrap().life, 30);
    counter.undo().unwrap();
    assert_eq!(counter.seat(p[0]).unwrap().life, STARTING_LIFE);
    assert!(!counter.can_undo());
}

#[test]
fn finish_ranks_by_knockout_order() {
    let (p, mut counter) = table(4);
    counter.apply(hit(p[3], -40, Some(p[2]))).unwrap();
    counter.apply(Action::Concede { player: p[0] }).unwrap();
    counter.apply(hit(p[2], -40, Some(p[1]))).unwrap();

    let result = counter.finish().unwrap();
    let order: Vec<Uuid> = result.iter().map(|r| r.player_id).collect();
    assert_eq!(order, vec![p[1], p[2], p[0], p[3]]);
    assert_eq!(result[0].placement, 1);
    assert_eq!(result[0].eliminated_by, None);
    assert_eq!(result[1].eliminated_by, Some(p[1]));
    assert_eq!(result[2].eliminated_by, None);
    assert_eq!(result[3].eliminated_by, Some(p[2]));

    assert_eq!(validate_participants(&result), Ok(()));
}

#[test]
fn borrowed_decks_carry_into_the_result() {
    let (a, b, lender) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mut counter = LifeCounter::new(vec![
        Seat::new(a, Uuid::new_v4()),
        Seat::new(b, Uuid::new_v4()).borrowing_from(lender),
    ])
    .unwrap();
    counter.apply(Action::Concede { player: a }).unwrap();

    let result = counter.finish().unwrap();
    assert_eq!(result[0].player_id, b);
    assert_eq!(result[0].borrowed_from, Some(lender));
}
