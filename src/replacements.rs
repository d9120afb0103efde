use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, Tag};
use crate::error::{FplError, Result};
use crate::fixtures::{FixtureDifficultyMap, FixtureOutlook};
use crate::metrics::{MetricBundle, RegressionFlag, round_to};
use crate::models::{Bootstrap, Player, PlayerId, Position, Price};

const MIN_CANDIDATE_MINUTES: u32 = 90;
const PPC_CAP: f64 = 10.0;
const AVAILABILITY_PENALTY: f64 = 2.0;

/// Case-insensitive substring match on first, last or display name. The first
/// player in iteration order wins.
pub fn resolve_player<'a>(query: &str, players: &'a [Player]) -> Result<&'a Player> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(FplError::PlayerNotFound(query.to_string()));
    }
    players
        .iter()
        .find(|p| {
            [&p.first_name, &p.last_name, &p.display_name]
                .iter()
                .any(|name| name.to_lowercase().contains(&needle))
        })
        .ok_or_else(|| FplError::PlayerNotFound(query.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub form: f64,
    pub fixture: f64,
    pub reliability: f64,
    pub upside: f64,
}

impl RiskTier {
    /// Unrecognised input falls back to `Medium`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => RiskTier::Low,
            "high" => RiskTier::High,
            _ => RiskTier::Medium,
        }
    }

    pub fn weights(self) -> TierWeights {
        match self {
            RiskTier::Low => TierWeights {
                form: 1.5,
                fixture: 2.0,
                reliability: 3.0,
                upside: 0.5,
            },
            RiskTier::Medium => TierWeights {
                form: 2.0,
                fixture: 1.5,
                reliability: 1.5,
                upside: 1.5,
            },
            RiskTier::High => TierWeights {
                form: 2.5,
                fixture: 1.0,
                reliability: 0.5,
                upside: 3.0,
            },
        }
    }
}

/// Compact behaviour attached to top-ranked candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourSummary {
    pub archetype: Archetype,
    pub tags: Vec<Tag>,
    pub volatility_std: f64,
    pub haul_rate: f64,
    pub blank_rate: f64,
    pub regression_flag: RegressionFlag,
    pub reliability_score: u8,
    pub talisman_index: f64,
}

impl BehaviourSummary {
    pub fn new(metrics: &MetricBundle, archetype: Archetype, tags: Vec<Tag>) -> Self {
        Self {
            archetype,
            tags,
            volatility_std: metrics.explosiveness.std_points,
            haul_rate: metrics.explosiveness.haul_rate,
            blank_rate: metrics.explosiveness.blank_rate,
            regression_flag: metrics.regression.regression_flag,
            reliability_score: metrics.reliability.reliability_score,
            talisman_index: metrics.talisman.talisman_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingPlayer {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub price: Price,
    pub form: f64,
    pub total_points: i32,
    pub minutes: u32,
    pub fixtures: Vec<FixtureOutlook>,
    pub fixture_avg_difficulty: f64,
    pub behaviour: Option<BehaviourSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementCandidate {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub price: Price,
    pub form: f64,
    pub total_points: i32,
    pub minutes: u32,
    pub selected_by_percent: f64,
    pub fixtures: Vec<FixtureOutlook>,
    pub fixture_avg_difficulty: f64,
    pub overall_score: f64,
    pub upside_score: f64,
    pub safety_score: f64,
    pub form_delta: f64,
    /// Positive when the candidate's fixtures are easier than the outgoing player's.
    pub fixture_difficulty_delta: f64,
    pub price_delta: Price,
    pub behaviour: Option<BehaviourSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementReport {
    pub out_player: OutgoingPlayer,
    pub risk_tier: RiskTier,
    pub horizon_gws: u32,
    pub fixture_window: String,
    pub candidates: Vec<ReplacementCandidate>,
}

#[derive(Debug, Clone)]
pub struct ReplacementQuery {
    pub max_price: Price,
    pub horizon_gws: u32,
    pub risk: RiskTier,
    pub limit: usize,
    /// Current squad; empty when no team is linked.
    pub squad: HashSet<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scores {
    overall: f64,
    upside: f64,
    safety: f64,
}

fn score(player: &Player, ease: f64, w: TierWeights) -> Scores {
    let ppc = player.points_per_cost();
    let available = !player.availability_below(75);
    let penalty = if available { 0.0 } else { AVAILABILITY_PENALTY };
    let reliability = if available { w.reliability } else { 0.0 };
    Scores {
        overall: player.form * w.form
            + ease * w.fixture
            + ppc.min(PPC_CAP) * 0.5
            + reliability
            + player.form * w.upside * 0.3,
        upside: player.form * w.form + ease * w.fixture * 0.5 + ppc * 0.5,
        safety: ease * w.fixture + ppc.min(PPC_CAP) * 0.3 - penalty,
    }
}

fn fixture_summary(
    fixtures: &FixtureDifficultyMap,
    player: &Player,
    n: u32,
) -> Vec<FixtureOutlook> {
    fixtures
        .fixtures_for(player.club)
        .iter()
        .take(n as usize)
        .cloned()
        .collect()
}

/// Ranks same-position candidates for `out` and attaches behaviour to the
/// outgoing player and the returned top `limit` only. `enrich` is never
/// called for anyone else.
pub fn find_replacements<F>(
    out: &Player,
    bootstrap: &Bootstrap,
    fixtures: &FixtureDifficultyMap,
    query: &ReplacementQuery,
    mut enrich: F,
) -> ReplacementReport
where
    F: FnMut(&Player) -> Result<BehaviourSummary>,
{
    let weights = query.risk.weights();
    let mut behaviour_for = |p: &Player| match enrich(p) {
        Ok(summary) => Some(summary),
        Err(err) => {
            warn!("behaviour unavailable for {}: {err}", p.display_name);
            None
        }
    };
    let out_behaviour = behaviour_for(out);
    let out_avg = fixtures.average_difficulty(out.club);

    let mut ranked: Vec<(&Player, Scores)> = bootstrap
        .players
        .iter()
        .filter(|p| p.position == out.position)
        .filter(|p| p.id != out.id && !query.squad.contains(&p.id))
        .filter(|p| p.price <= query.max_price && p.minutes >= MIN_CANDIDATE_MINUTES)
        .map(|p| (p, score(p, fixtures.ease(p.club), weights)))
        .collect();
    debug!(
        "{} replacement candidates for {} under {}",
        ranked.len(),
        out.display_name,
        query.max_price
    );
    ranked.sort_by(|a, b| b.1.overall.total_cmp(&a.1.overall));
    ranked.truncate(query.limit);

    let candidates = ranked
        .into_iter()
        .map(|(p, s)| {
            let c_avg = fixtures.average_difficulty(p.club);
            ReplacementCandidate {
                id: p.id,
                name: p.display_name.clone(),
                team: bootstrap.club_short_name(p.club).to_string(),
                position: p.position,
                price: p.price,
                form: p.form,
                total_points: p.total_points,
                minutes: p.minutes,
                selected_by_percent: p.selected_by_percent,
                fixtures: fixture_summary(fixtures, p, query.horizon_gws),
                fixture_avg_difficulty: round_to(c_avg, 2),
                overall_score: round_to(s.overall, 2),
                upside_score: round_to(s.upside, 2),
                safety_score: round_to(s.safety, 2),
                form_delta: round_to(p.form - out.form, 2),
                fixture_difficulty_delta: round_to(out_avg - c_avg, 2),
                price_delta: p.price - out.price,
                behaviour: behaviour_for(p),
            }
        })
        .collect();

    let out_player = OutgoingPlayer {
        id: out.id,
        name: out.display_name.clone(),
        team: bootstrap.club_short_name(out.club).to_string(),
        position: out.position,
        price: out.price,
        form: out.form,
        total_points: out.total_points,
        minutes: out.minutes,
        fixtures: fixture_summary(fixtures, out, query.horizon_gws),
        fixture_avg_difficulty: round_to(out_avg, 2),
        behaviour: out_behaviour,
    };

    ReplacementReport {
        out_player,
        risk_tier: query.risk,
        horizon_gws: query.horizon_gws,
        fixture_window: fixtures.data_used_label(),
        candidates,
    }
}
