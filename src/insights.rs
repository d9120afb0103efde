//! League-wide scans over the bootstrap player list.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{club_totals, round_to, talisman};
use crate::models::{Bootstrap, PlayerId, Position, Price};

pub const DEFAULT_TALISMAN_MINUTES: u32 = 900;
const SHARE_GAP: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormEntry {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub form: f64,
    pub price: Price,
    pub total_points: i32,
    pub minutes: u32,
    pub selected_by_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub price: Price,
    pub total_points: i32,
    /// Season points per £1m.
    pub value: f64,
    pub form: f64,
    pub selected_by_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalismanEntry {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub talisman_index: f64,
    pub attacking_share: f64,
    pub xgi_share: f64,
    pub goals: u32,
    pub assists: u32,
    pub minutes: u32,
    pub notes: String,
}

pub fn top_by_form(bootstrap: &Bootstrap, limit: usize) -> Vec<FormEntry> {
    let mut players: Vec<_> = bootstrap.players.iter().collect();
    players.sort_by(|a, b| b.form.total_cmp(&a.form));
    players
        .into_iter()
        .take(limit)
        .map(|p| FormEntry {
            id: p.id,
            name: p.display_name.clone(),
            team: bootstrap.club_short_name(p.club).to_string(),
            position: p.position,
            form: p.form,
            price: p.price,
            total_points: p.total_points,
            minutes: p.minutes,
            selected_by_percent: p.selected_by_percent,
        })
        .collect()
}

/// `position` takes the short codes (GKP/DEF/MID/FWD).
pub fn best_value(bootstrap: &Bootstrap, position: &str, limit: usize) -> Result<Vec<ValueEntry>> {
    let position = Position::parse(position)?;
    let mut rows: Vec<ValueEntry> = bootstrap
        .players
        .iter()
        .filter(|p| p.position == position && p.minutes > 0)
        .map(|p| ValueEntry {
            id: p.id,
            name: p.display_name.clone(),
            team: bootstrap.club_short_name(p.club).to_string(),
            price: p.price,
            total_points: p.total_points,
            value: p.points_per_cost(),
            form: p.form,
            selected_by_percent: p.selected_by_percent,
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows.truncate(limit);
    for row in &mut rows {
        row.value = round_to(row.value, 2);
    }
    Ok(rows)
}

fn share_note(goals_share: f64, xgi_share: f64) -> String {
    if goals_share > xgi_share + SHARE_GAP {
        "outperforming xGI share, slight regression risk".to_string()
    } else if xgi_share > goals_share + SHARE_GAP {
        "underlying xGI share higher, upside potential".to_string()
    } else {
        String::new()
    }
}

/// Players with at least `min_minutes`, ranked by talisman index.
pub fn talisman_leaderboard(
    bootstrap: &Bootstrap,
    min_minutes: u32,
    limit: usize,
) -> Vec<TalismanEntry> {
    let totals = club_totals(&bootstrap.players);
    let mut rows: Vec<TalismanEntry> = bootstrap
        .players
        .iter()
        .filter(|p| p.minutes >= min_minutes)
        .map(|p| {
            let t = talisman(p, totals.get(&p.club).copied().unwrap_or_default());
            TalismanEntry {
                id: p.id,
                name: p.display_name.clone(),
                team: bootstrap.club_short_name(p.club).to_string(),
                position: p.position,
                talisman_index: t.talisman_index,
                attacking_share: t.player_goals_share,
                xgi_share: t.player_xgi_share,
                goals: p.goals,
                assists: p.assists,
                minutes: p.minutes,
                notes: share_note(t.player_goals_share, t.player_xgi_share),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.talisman_index.total_cmp(&a.talisman_index));
    rows.truncate(limit);
    rows
}
