use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FplError, Result};
use crate::models::{
    Bootstrap, ClubId, LivePoints, MAX_PER_CLUB, PlayerId, Position, Price, SQUAD_SIZE, XI_SIZE,
};

/// One eligible player with a realized point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub club: ClubId,
    pub club_short: String,
    pub price: Price,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPlayer {
    #[serde(flatten)]
    pub entry: PoolEntry,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamTeam {
    pub gameweek: Option<u32>,
    pub starters: Vec<SelectedPlayer>,
    pub bench: Vec<SelectedPlayer>,
    pub captain: String,
    pub vice_captain: String,
    /// XI points with the captain counted twice.
    pub total_points: i32,
    pub bench_points: i32,
}

/// Greedy 15: highest points first, skipping anyone who would break a
/// position quota or the per-club cap. Equal points keep pool order.
pub fn select_squad(pool: &[PoolEntry]) -> Result<Vec<PoolEntry>> {
    let mut sorted: Vec<&PoolEntry> = pool.iter().collect();
    sorted.sort_by(|a, b| b.points.cmp(&a.points));

    let mut by_position: HashMap<Position, usize> = HashMap::new();
    let mut by_club: HashMap<ClubId, usize> = HashMap::new();
    let mut squad: Vec<PoolEntry> = Vec::with_capacity(SQUAD_SIZE);

    for p in sorted {
        let pos_count = by_position.entry(p.position).or_insert(0);
        if *pos_count >= p.position.squad_quota() {
            continue;
        }
        let club_count = by_club.entry(p.club).or_insert(0);
        if *club_count >= MAX_PER_CLUB {
            continue;
        }
        *pos_count += 1;
        *club_count += 1;
        squad.push(p.clone());
        if squad.len() == SQUAD_SIZE {
            break;
        }
    }

    if squad.len() < SQUAD_SIZE {
        return Err(FplError::InsufficientPlayerPool {
            admitted: squad.len(),
            required: SQUAD_SIZE,
        });
    }
    Ok(squad)
}

/// Best goalkeeper, then 3 DEF / 2 MID / 1 FWD minimums, then the four best
/// remaining outfielders within the per-position maximums.
pub fn select_best_xi(squad: &[PoolEntry]) -> Vec<PoolEntry> {
    let mut by_pos: HashMap<Position, Vec<&PoolEntry>> = HashMap::new();
    for p in squad {
        by_pos.entry(p.position).or_default().push(p);
    }
    for group in by_pos.values_mut() {
        group.sort_by(|a, b| b.points.cmp(&a.points));
    }

    let mut xi: Vec<&PoolEntry> = Vec::with_capacity(XI_SIZE);
    if let Some(gk) = by_pos
        .get(&Position::Goalkeeper)
        .and_then(|g| g.first().copied())
    {
        xi.push(gk);
    }

    let mut remaining: Vec<&PoolEntry> = Vec::new();
    for pos in [Position::Defender, Position::Midfielder, Position::Forward] {
        let available = by_pos.get(&pos).map(Vec::as_slice).unwrap_or(&[]);
        let (min, _) = pos.xi_bounds();
        let take = min.min(available.len());
        xi.extend_from_slice(&available[..take]);
        remaining.extend_from_slice(&available[take..]);
    }

    let mut counts: HashMap<Position, usize> = HashMap::new();
    for p in &xi {
        *counts.entry(p.position).or_insert(0) += 1;
    }

    remaining.sort_by(|a, b| b.points.cmp(&a.points));
    for p in remaining {
        if xi.len() >= XI_SIZE {
            break;
        }
        let count = counts.entry(p.position).or_insert(0);
        if *count < p.position.xi_bounds().1 {
            xi.push(p);
            *count += 1;
        }
    }

    xi.into_iter().cloned().collect()
}

/// Indices of (captain, vice-captain) in `xi`: highest and second-highest
/// scorers, ties resolved by position in `xi`.
pub fn choose_captains(xi: &[PoolEntry]) -> Option<(usize, usize)> {
    let mut order: Vec<usize> = (0..xi.len()).collect();
    order.sort_by(|&a, &b| xi[b].points.cmp(&xi[a].points));
    let captain = *order.first()?;
    let vice = order.get(1).copied().unwrap_or(captain);
    Some((captain, vice))
}

pub fn optimize(pool: &[PoolEntry]) -> Result<DreamTeam> {
    let squad = select_squad(pool)?;
    let xi = select_best_xi(&squad);
    let (captain_idx, vice_idx) = choose_captains(&xi).ok_or(FplError::InsufficientPlayerPool {
        admitted: 0,
        required: SQUAD_SIZE,
    })?;

    let mut bench: Vec<PoolEntry> = squad
        .iter()
        .filter(|p| !xi.iter().any(|s| s.player_id == p.player_id))
        .cloned()
        .collect();
    bench.sort_by_key(|p| (p.position == Position::Goalkeeper, -p.points));

    let captain = xi[captain_idx].clone();
    let vice = xi[vice_idx].clone();
    let total_points = xi.iter().map(|p| p.points).sum::<i32>() + captain.points;
    let bench_points = bench.iter().map(|p| p.points).sum();

    let starters = xi
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| SelectedPlayer {
            entry,
            is_captain: idx == captain_idx,
            is_vice_captain: idx == vice_idx,
        })
        .collect();
    let bench = bench
        .into_iter()
        .map(|entry| SelectedPlayer {
            entry,
            is_captain: false,
            is_vice_captain: false,
        })
        .collect();

    Ok(DreamTeam {
        gameweek: None,
        starters,
        bench,
        captain: captain.name,
        vice_captain: vice.name,
        total_points,
        bench_points,
    })
}

/// Pool for a gameweek: everyone who featured or scored, in live-data order.
pub fn pool_from_live(bootstrap: &Bootstrap, live: &[LivePoints]) -> Vec<PoolEntry> {
    let players: HashMap<PlayerId, _> = bootstrap.players.iter().map(|p| (p.id, p)).collect();
    live.iter()
        .filter_map(|row| {
            let player = players.get(&row.player_id)?;
            if row.minutes == 0 && row.points == 0 {
                return None;
            }
            Some(PoolEntry {
                player_id: player.id,
                name: player.display_name.clone(),
                position: player.position,
                club: player.club,
                club_short: bootstrap.club_short_name(player.club).to_string(),
                price: player.price,
                points: row.points,
            })
        })
        .collect()
}

pub fn is_legal_squad(squad: &[PoolEntry]) -> bool {
    if squad.len() != SQUAD_SIZE {
        return false;
    }
    let mut clubs: HashMap<ClubId, usize> = HashMap::new();
    for p in squad {
        *clubs.entry(p.club).or_insert(0) += 1;
    }
    clubs.values().all(|&c| c <= MAX_PER_CLUB)
        && Position::ALL
            .iter()
            .all(|&pos| squad.iter().filter(|p| p.position == pos).count() == pos.squad_quota())
}

pub fn is_legal_xi(xi: &[PoolEntry]) -> bool {
    xi.len() == XI_SIZE
        && Position::ALL.iter().all(|&pos| {
            let n = xi.iter().filter(|p| p.position == pos).count();
            let (min, max) = pos.xi_bounds();
            n >= min && n <= max
        })
}
