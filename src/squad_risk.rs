use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, Tag, classify};
use crate::error::Result;
use crate::metrics::{MetricBundle, RegressionFlag, RiskLevel, club_totals, compute_bundle};
use crate::models::{Bootstrap, Player, PlayerId, Position, SquadPick};
use crate::snapshot::Snapshot;

const PORTFOLIO_TILT: usize = 8;
const HEAVY_EXPOSURE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRiskRow {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub archetype: Archetype,
    pub tags: Vec<Tag>,
    pub reliability_score: u8,
    pub talisman_index: f64,
    pub avg_points: f64,
    pub regression_flag: RegressionFlag,
    pub on_bench: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubExposure {
    pub team: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRiskSummary {
    pub explosive_count: usize,
    pub consistent_count: usize,
    pub high_risk_players: Vec<String>,
    pub club_concentration: Vec<ClubExposure>,
    pub portfolio_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRiskProfile {
    pub gameweek: u32,
    pub per_player: Vec<SquadRiskRow>,
    pub summary: SquadRiskSummary,
}

/// One squad member with its metrics already computed.
#[derive(Debug, Clone)]
pub struct AssessedPick<'a> {
    pub player: &'a Player,
    pub on_bench: bool,
    pub metrics: MetricBundle,
}

/// Fetches every pick's history in parallel and computes its metric bundle.
/// Picks missing from the bootstrap are skipped.
pub fn assess_picks<'a>(
    snapshot: &Snapshot,
    bootstrap: &'a Bootstrap,
    picks: &[SquadPick],
    window: usize,
) -> Result<Vec<AssessedPick<'a>>> {
    let totals = club_totals(&bootstrap.players);
    picks
        .par_iter()
        .filter_map(|pick| match bootstrap.player(pick.player_id) {
            Some(player) => Some((pick, player)),
            None => {
                warn!("pick {} not in bootstrap, skipped", pick.player_id);
                None
            }
        })
        .map(|(pick, player)| {
            let history = snapshot.gameweek_history(player.id)?;
            let club = totals.get(&player.club).copied().unwrap_or_default();
            Ok(AssessedPick {
                player,
                on_bench: pick.on_bench(),
                metrics: compute_bundle(player, &history, club, window),
            })
        })
        .collect()
}

pub fn profile_squad(
    gameweek: u32,
    assessed: &[AssessedPick<'_>],
    bootstrap: &Bootstrap,
) -> SquadRiskProfile {
    let mut per_player = Vec::with_capacity(assessed.len());
    let mut clubs: Vec<ClubExposure> = Vec::new();
    let mut explosive_count = 0;
    let mut consistent_count = 0;
    let mut high_risk_players = Vec::new();

    for a in assessed {
        let team = bootstrap.club_short_name(a.player.club).to_string();
        match clubs.iter_mut().find(|c| c.team == team) {
            Some(c) => c.count += 1,
            None => clubs.push(ClubExposure {
                team: team.clone(),
                count: 1,
            }),
        }

        let profile = classify(&a.metrics);
        if profile.has(Tag::Explosive) || profile.has(Tag::SemiExplosive) {
            explosive_count += 1;
        }
        if profile.has(Tag::Consistent) || profile.has(Tag::Steady) {
            consistent_count += 1;
        }
        let rel = &a.metrics.reliability;
        if rel.reliability_score < 50 || rel.injury_risk == RiskLevel::High {
            high_risk_players.push(a.player.display_name.clone());
        }

        per_player.push(SquadRiskRow {
            id: a.player.id,
            name: a.player.display_name.clone(),
            position: a.player.position,
            team,
            archetype: profile.archetype,
            tags: profile.tags,
            reliability_score: rel.reliability_score,
            talisman_index: a.metrics.talisman.talisman_index,
            avg_points: a.metrics.explosiveness.avg_points,
            regression_flag: a.metrics.regression.regression_flag,
            on_bench: a.on_bench,
        });
    }

    clubs.sort_by(|a, b| b.count.cmp(&a.count));
    let portfolio_notes = portfolio_notes(
        explosive_count,
        consistent_count,
        &clubs,
        &high_risk_players,
        &per_player,
    );

    SquadRiskProfile {
        gameweek,
        per_player,
        summary: SquadRiskSummary {
            explosive_count,
            consistent_count,
            high_risk_players,
            club_concentration: clubs,
            portfolio_notes,
        },
    }
}

fn portfolio_notes(
    explosive: usize,
    consistent: usize,
    clubs: &[ClubExposure],
    high_risk: &[String],
    rows: &[SquadRiskRow],
) -> String {
    let mut notes = Vec::new();
    if explosive >= PORTFOLIO_TILT {
        notes.push("Very aggressive squad: high ceiling but volatile week-to-week.".to_string());
    } else if consistent >= PORTFOLIO_TILT {
        notes.push("Very conservative squad: steady floor but limited ceiling.".to_string());
    } else {
        notes.push(format!(
            "Balanced mix: {explosive} explosive, {consistent} consistent picks."
        ));
    }

    let heavy: Vec<String> = clubs
        .iter()
        .filter(|c| c.count >= HEAVY_EXPOSURE)
        .map(|c| format!("{}({})", c.team, c.count))
        .collect();
    if !heavy.is_empty() {
        notes.push(format!(
            "Heavy exposure to: {}. A bad GW for those clubs hurts.",
            heavy.join(", ")
        ));
    }

    if !high_risk.is_empty() {
        notes.push(format!(
            "High-risk players: {}. Consider bench cover or replacements.",
            high_risk.join(", ")
        ));
    }

    let over: Vec<&str> = rows
        .iter()
        .filter(|r| r.regression_flag == RegressionFlag::Overperforming)
        .map(|r| r.name.as_str())
        .collect();
    if !over.is_empty() {
        notes.push(format!(
            "Regression watch: {} overperforming vs xG/xA.",
            over.join(", ")
        ));
    }
    notes.join(" ")
}
