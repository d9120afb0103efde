//! Per-player behavioural metrics derived from gameweek history and season totals.
//!
//! Every function here is pure and degrades to zero / neutral values on empty
//! input: a player without history yet is an expected case, not an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{ClubId, GameweekRecord, Player};

pub const DEFAULT_WINDOW: usize = 10;
pub const DEFAULT_VOLATILITY_WINDOW: usize = 8;

const HAUL_POINTS: i32 = 10;
const BLANK_POINTS: i32 = 2;
const GOAL_DELTA_THRESHOLD: f64 = 1.5;
const ASSIST_DELTA_THRESHOLD: f64 = 1.0;
const START_MINUTES: u32 = 60;
const INJURY_KEYWORDS: [&str; 5] = ["injury", "knock", "hamstring", "groin", "muscle"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Explosiveness {
    pub avg_points: f64,
    pub std_points: f64,
    pub max_points: i32,
    pub haul_rate: f64,
    pub blank_rate: f64,
    pub gws_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionFlag {
    Overperforming,
    Underperforming,
    InLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub season_goals: u32,
    pub season_xg: f64,
    pub season_assists: u32,
    pub season_xa: f64,
    pub delta_goals_vs_xg: f64,
    pub delta_assists_vs_xa: f64,
    pub regression_flag: RegressionFlag,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClubTotals {
    pub goal_involvements: u32,
    pub xgi: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Talisman {
    pub team_goal_involvements: u32,
    pub player_goal_involvements: u32,
    pub player_goals_share: f64,
    pub team_xgi: f64,
    pub player_xgi: f64,
    pub player_xgi_share: f64,
    pub talisman_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reliability {
    pub nailedness_score: f64,
    pub appearance_rate: f64,
    pub starts: usize,
    pub appearances: usize,
    pub total_gws_elapsed: usize,
    pub injury_risk: RiskLevel,
    pub rotation_risk: RiskLevel,
    pub reliability_score: u8,
}

/// All four metric groups for one player at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub explosiveness: Explosiveness,
    pub regression: Regression,
    pub talisman: Talisman,
    pub reliability: Reliability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityProfile {
    pub window_gws: usize,
    pub points_per_gw: Vec<i32>,
    pub stats: Explosiveness,
    pub volatility_score: u8,
}

/// The last `window` gameweeks the player actually featured in, oldest first.
pub fn played_window(history: &[GameweekRecord], window: usize) -> Vec<&GameweekRecord> {
    let played: Vec<&GameweekRecord> = history.iter().filter(|h| h.minutes > 0).collect();
    let skip = played.len().saturating_sub(window);
    played.into_iter().skip(skip).collect()
}

pub fn explosiveness(history: &[GameweekRecord], window: usize) -> Explosiveness {
    let recent = played_window(history, window);
    if recent.is_empty() {
        return Explosiveness::default();
    }

    let pts: Vec<i32> = recent.iter().map(|h| h.points).collect();
    let n = pts.len() as f64;
    let avg = pts.iter().map(|&p| p as f64).sum::<f64>() / n;
    let variance = pts.iter().map(|&p| (p as f64 - avg).powi(2)).sum::<f64>() / n;
    let hauls = pts.iter().filter(|&&p| p >= HAUL_POINTS).count() as f64;
    let blanks = pts.iter().filter(|&&p| p <= BLANK_POINTS).count() as f64;

    Explosiveness {
        avg_points: round_to(avg, 2),
        std_points: round_to(variance.sqrt(), 2),
        max_points: pts.iter().copied().max().unwrap_or(0),
        haul_rate: round_to(hauls / n, 2),
        blank_rate: round_to(blanks / n, 2),
        gws_used: pts.len(),
    }
}

pub fn regression(player: &Player) -> Regression {
    let delta_g = round_to(player.goals as f64 - player.expected_goals, 2);
    let delta_a = round_to(player.assists as f64 - player.expected_assists, 2);

    let flag = if delta_g > GOAL_DELTA_THRESHOLD || delta_a > ASSIST_DELTA_THRESHOLD {
        RegressionFlag::Overperforming
    } else if delta_g < -GOAL_DELTA_THRESHOLD || delta_a < -ASSIST_DELTA_THRESHOLD {
        RegressionFlag::Underperforming
    } else {
        RegressionFlag::InLine
    };

    Regression {
        season_goals: player.goals,
        season_xg: round_to(player.expected_goals, 2),
        season_assists: player.assists,
        season_xa: round_to(player.expected_assists, 2),
        delta_goals_vs_xg: delta_g,
        delta_assists_vs_xa: delta_a,
        regression_flag: flag,
    }
}

/// Goal involvements and xGI summed per club across every listed player.
pub fn club_totals(players: &[Player]) -> HashMap<ClubId, ClubTotals> {
    let mut out: HashMap<ClubId, ClubTotals> = HashMap::new();
    for p in players {
        let entry = out.entry(p.club).or_default();
        entry.goal_involvements += p.goal_involvements();
        entry.xgi += p.expected_goal_involvements;
    }
    out
}

pub fn talisman(player: &Player, club: ClubTotals) -> Talisman {
    let player_gi = player.goal_involvements();
    let player_xgi = player.expected_goal_involvements;
    let goals_share = if club.goal_involvements > 0 {
        player_gi as f64 / club.goal_involvements as f64
    } else {
        0.0
    };
    let xgi_share = if club.xgi > 0.0 {
        player_xgi / club.xgi
    } else {
        0.0
    };

    Talisman {
        team_goal_involvements: club.goal_involvements,
        player_goal_involvements: player_gi,
        player_goals_share: round_to(goals_share, 3),
        team_xgi: round_to(club.xgi, 2),
        player_xgi: round_to(player_xgi, 2),
        player_xgi_share: round_to(xgi_share, 3),
        talisman_index: round_to((goals_share + xgi_share) / 2.0, 3),
    }
}

pub fn injury_risk(player: &Player) -> RiskLevel {
    if player.availability_below(50) {
        return RiskLevel::High;
    }
    if player.availability_below(75) {
        return RiskLevel::Medium;
    }
    let note = player.injury_note.to_lowercase();
    if INJURY_KEYWORDS.iter().any(|kw| note.contains(kw)) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn reliability(player: &Player, history: &[GameweekRecord]) -> Reliability {
    let total = history.len();
    let injury = injury_risk(player);
    if total == 0 {
        return Reliability {
            nailedness_score: 0.0,
            appearance_rate: 0.0,
            starts: 0,
            appearances: 0,
            total_gws_elapsed: 0,
            injury_risk: RiskLevel::High,
            rotation_risk: RiskLevel::High,
            reliability_score: 0,
        };
    }

    let starts = history.iter().filter(|h| h.minutes >= START_MINUTES).count();
    let appearances = history.iter().filter(|h| h.minutes > 0).count();
    let nailedness = round_to(starts as f64 / total as f64, 2);
    let appearance_rate = appearances as f64 / total as f64;

    let rotation = if nailedness >= 0.8 && appearance_rate >= 0.85 {
        RiskLevel::Low
    } else if nailedness >= 0.55 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };

    let injury_bonus = match injury {
        RiskLevel::Low => 20.0,
        RiskLevel::Medium => 10.0,
        RiskLevel::High => 0.0,
    };
    let base = nailedness * 60.0 + appearance_rate * 20.0 + injury_bonus;
    let score = base.round_ties_even().clamp(0.0, 100.0) as u8;

    Reliability {
        nailedness_score: nailedness,
        appearance_rate: round_to(appearance_rate, 2),
        starts,
        appearances,
        total_gws_elapsed: total,
        injury_risk: injury,
        rotation_risk: rotation,
        reliability_score: score,
    }
}

pub fn compute_bundle(
    player: &Player,
    history: &[GameweekRecord],
    club: ClubTotals,
    window: usize,
) -> MetricBundle {
    MetricBundle {
        explosiveness: explosiveness(history, window),
        regression: regression(player),
        talisman: talisman(player, club),
        reliability: reliability(player, history),
    }
}

pub fn volatility_profile(history: &[GameweekRecord], window: usize) -> VolatilityProfile {
    let points_per_gw: Vec<i32> = played_window(history, window)
        .iter()
        .map(|h| h.points)
        .collect();
    let stats = explosiveness(history, window);
    let avg = if stats.avg_points > 0.0 {
        stats.avg_points
    } else {
        1.0
    };
    let cv = stats.std_points / avg;
    let raw = (cv * 50.0 + stats.haul_rate * 30.0 + stats.blank_rate * 20.0).round_ties_even();
    VolatilityProfile {
        window_gws: window,
        points_per_gw,
        stats,
        volatility_score: raw.clamp(0.0, 100.0) as u8,
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
