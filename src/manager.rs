use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::fixtures::FixtureDifficultyMap;
use crate::models::{
    Bootstrap, ManagerEntry, ManagerPicks, PlayerId, Position, Price, TransferRecord,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSlot {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub price: Price,
    pub form: f64,
    pub total_points: i32,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub multiplier: u8,
    pub slot: u8,
    pub next_fixture: String,
}

/// A manager's 15 for one gameweek, split into XI and bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSquad {
    pub gameweek: u32,
    pub manager: String,
    pub team_name: String,
    pub overall_points: Option<i32>,
    pub overall_rank: Option<u32>,
    pub gameweek_points: i32,
    pub bank: Price,
    pub squad_value: Price,
    pub transfers_made: u32,
    pub transfer_cost: i32,
    pub active_chip: Option<String>,
    pub starters: Vec<SquadSlot>,
    pub bench: Vec<SquadSlot>,
}

/// `fixtures` should start at the next gameweek; each slot shows its club's
/// earliest fixture in it.
pub fn manager_squad(
    gameweek: u32,
    entry: &ManagerEntry,
    picks: &ManagerPicks,
    bootstrap: &Bootstrap,
    fixtures: &FixtureDifficultyMap,
) -> ManagerSquad {
    let mut starters = Vec::new();
    let mut bench = Vec::new();
    let mut ordered = picks.picks.clone();
    ordered.sort_by_key(|p| p.slot);

    for pick in &ordered {
        let Some(player) = bootstrap.player(pick.player_id) else {
            warn!("pick {} not in bootstrap, skipped", pick.player_id);
            continue;
        };
        let row = SquadSlot {
            id: player.id,
            name: player.display_name.clone(),
            position: player.position,
            team: bootstrap.club_short_name(player.club).to_string(),
            price: player.price,
            form: player.form,
            total_points: player.total_points,
            is_captain: pick.is_captain,
            is_vice_captain: pick.is_vice_captain,
            multiplier: pick.multiplier,
            slot: pick.slot,
            next_fixture: fixtures.next_fixture(player.club),
        };
        if pick.on_bench() {
            bench.push(row);
        } else {
            starters.push(row);
        }
    }

    let history = &picks.entry_history;
    ManagerSquad {
        gameweek,
        manager: entry.manager_name(),
        team_name: entry.team_name.clone(),
        overall_points: entry.summary_overall_points,
        overall_rank: entry.summary_overall_rank,
        gameweek_points: history.points,
        bank: history.bank,
        squad_value: history.value,
        transfers_made: history.event_transfers,
        transfer_cost: history.event_transfers_cost,
        active_chip: picks.active_chip.clone(),
        starters,
        bench,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferLogEntry {
    pub gameweek: Option<u32>,
    pub time: Option<DateTime<Utc>>,
    pub player_in: String,
    pub price_in: Price,
    pub player_out: String,
    pub price_out: Price,
}

/// Players no longer in the bootstrap show as `id:N`.
pub fn transfer_log(records: &[TransferRecord], bootstrap: &Bootstrap) -> Vec<TransferLogEntry> {
    let name = |id: PlayerId| {
        bootstrap
            .player(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| format!("id:{id}"))
    };
    records
        .iter()
        .map(|t| TransferLogEntry {
            gameweek: t.event,
            time: t.time,
            player_in: name(t.element_in),
            price_in: t.element_in_cost,
            player_out: name(t.element_out),
            price_out: t.element_out_cost,
        })
        .collect()
}
