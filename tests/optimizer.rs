mod common;

use fpl_insight::FplError;
use fpl_insight::models::{ClubId, LivePoints, Position, Price};
use fpl_insight::optimizer::{
    PoolEntry, choose_captains, is_legal_squad, is_legal_xi, optimize, pool_from_live,
    select_best_xi, select_squad,
};

fn entry(id: u32, position: Position, club: ClubId, points: i32) -> PoolEntry {
    PoolEntry {
        player_id: id,
        name: format!("P{id}"),
        position,
        club,
        club_short: format!("C{club}"),
        price: Price(50),
        points,
    }
}

/// Twelve clubs with two of each position, points descending by id.
fn wide_pool() -> Vec<PoolEntry> {
    let mut pool = Vec::new();
    let mut id = 0;
    for club in 1..=12 {
        for pos in Position::ALL {
            for _ in 0..2 {
                id += 1;
                pool.push(entry(id, pos, club, 200 - id as i32));
            }
        }
    }
    pool
}

#[test]
fn squad_and_xi_are_always_legal() {
    let team = optimize(&wide_pool()).expect("pool is large enough");
    let squad: Vec<PoolEntry> = team
        .starters
        .iter()
        .chain(team.bench.iter())
        .map(|s| s.entry.clone())
        .collect();
    let xi: Vec<PoolEntry> = team.starters.iter().map(|s| s.entry.clone()).collect();
    assert!(is_legal_squad(&squad));
    assert!(is_legal_xi(&xi));
    assert_eq!(team.bench.len(), 4);
}

#[test]
fn club_cap_skips_fourth_player() {
    // four strong forwards from one club; the fourth must be skipped
    let mut pool = wide_pool();
    for i in 0..4 {
        pool.push(entry(900 + i, Position::Forward, 99, 500 - i as i32));
    }
    let squad = select_squad(&pool).expect("squad");
    assert!(is_legal_squad(&squad));
    let from_99 = squad.iter().filter(|p| p.club == 99).count();
    assert_eq!(from_99, 3);
    assert!(!squad.iter().any(|p| p.player_id == 903));
}

#[test]
fn equal_points_keep_pool_order() {
    let mut pool = wide_pool();
    for p in &mut pool {
        p.points = 10;
    }
    let squad = select_squad(&pool).expect("squad");
    let gk: Vec<u32> = squad
        .iter()
        .filter(|p| p.position == Position::Goalkeeper)
        .map(|p| p.player_id)
        .collect();
    // first two goalkeepers encountered: club 1's pair
    assert_eq!(gk, vec![1, 2]);
}

#[test]
fn small_pool_is_insufficient() {
    let positions = [
        Position::Goalkeeper,
        Position::Goalkeeper,
        Position::Defender,
        Position::Defender,
        Position::Defender,
        Position::Defender,
        Position::Defender,
        Position::Midfielder,
        Position::Midfielder,
        Position::Forward,
    ];
    let pool: Vec<PoolEntry> = positions
        .into_iter()
        .enumerate()
        .map(|(i, pos)| entry(i as u32 + 1, pos, i as u32 + 1, 10))
        .collect();
    assert_eq!(
        select_squad(&pool),
        Err(FplError::InsufficientPlayerPool {
            admitted: 10,
            required: 15
        })
    );
}

#[test]
fn best_xi_fills_minimums_then_best_remaining() {
    let mut squad = Vec::new();
    squad.push(entry(1, Position::Goalkeeper, 1, 6));
    squad.push(entry(2, Position::Goalkeeper, 2, 9));
    for (i, pts) in [2, 3, 4, 5, 6].into_iter().enumerate() {
        squad.push(entry(10 + i as u32, Position::Defender, 3 + i as u32, pts));
    }
    for (i, pts) in [10, 11, 12, 13, 14].into_iter().enumerate() {
        squad.push(entry(20 + i as u32, Position::Midfielder, 8 + i as u32, pts));
    }
    for (i, pts) in [1, 15, 16].into_iter().enumerate() {
        squad.push(entry(30 + i as u32, Position::Forward, 13 + i as u32, pts));
    }
    assert!(is_legal_squad(&squad));

    let xi = select_best_xi(&squad);
    assert!(is_legal_xi(&xi));
    let ids: Vec<u32> = xi.iter().map(|p| p.player_id).collect();
    // GK 2, DEF 14/13/12 minimum, MID 24/23, FWD 32, then 31, 22, 21, 20
    assert_eq!(ids, vec![2, 14, 13, 12, 24, 23, 32, 31, 22, 21, 20]);
}

#[test]
fn captain_ties_go_to_first_encountered() {
    let xi = vec![
        entry(1, Position::Goalkeeper, 1, 5),
        entry(2, Position::Midfielder, 2, 12),
        entry(3, Position::Forward, 3, 12),
        entry(4, Position::Defender, 4, 8),
    ];
    assert_eq!(choose_captains(&xi), Some((1, 2)));
    assert_eq!(choose_captains(&[]), None);
}

#[test]
fn total_counts_captain_twice_and_bench_ends_with_keeper() {
    let team = optimize(&wide_pool()).expect("team");
    let xi_sum: i32 = team.starters.iter().map(|s| s.entry.points).sum();
    let captain = team
        .starters
        .iter()
        .find(|s| s.is_captain)
        .expect("captain flagged");
    assert_eq!(team.total_points, xi_sum + captain.entry.points);
    assert_eq!(team.captain, captain.entry.name);
    assert_eq!(team.starters.iter().filter(|s| s.is_vice_captain).count(), 1);
    assert_eq!(
        team.bench.last().map(|s| s.entry.position),
        Some(Position::Goalkeeper)
    );
    let bench_sum: i32 = team.bench.iter().map(|s| s.entry.points).sum();
    assert_eq!(team.bench_points, bench_sum);
}

#[test]
fn live_pool_skips_players_who_did_nothing() {
    let boot = common::league();
    let live = vec![
        LivePoints {
            player_id: 101,
            points: 6,
            minutes: 90,
        },
        LivePoints {
            player_id: 102,
            points: 0,
            minutes: 0,
        },
        LivePoints {
            player_id: 9999,
            points: 3,
            minutes: 90,
        },
    ];
    let pool = pool_from_live(&boot, &live);
    let ids: Vec<u32> = pool.iter().map(|p| p.player_id).collect();
    assert_eq!(ids, vec![101]);
    assert_eq!(pool[0].club_short, "C1");
}
