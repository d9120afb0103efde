use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::FplError;
use crate::fixtures::{FixtureDifficultyMap, Horizon};
use crate::metrics::round_to;
use crate::models::{Bootstrap, ClubId, MAX_PER_CLUB, Player, PlayerId, Position, Price};

const HIT_COST: i32 = 4;
const LOW_MINUTES: u32 = 200;
const MIN_CANDIDATE_MINUTES: u32 = 90;

/// How much churn a risk value 0-100 permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub max_transfers: usize,
    pub allow_hits: bool,
}

impl RiskPolicy {
    /// `hits_override` replaces the risk-derived hit permission when set.
    pub fn from_risk(risk: u8, hits_override: Option<bool>) -> Self {
        let risk = risk.min(100);
        let max_transfers = if risk < 30 {
            1
        } else if risk < 70 {
            2
        } else {
            3
        };
        Self {
            max_transfers,
            allow_hits: hits_override.unwrap_or(risk >= 50),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SquadMember {
    pub player: Player,
    pub selling_price: Price,
}

impl SquadMember {
    pub fn at_market(player: Player) -> Self {
        let selling_price = player.price;
        Self {
            player,
            selling_price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub squad: Vec<SquadMember>,
    pub bank: Price,
    pub horizon: Horizon,
    pub risk: u8,
    pub allow_hits: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub out_id: PlayerId,
    pub out: String,
    pub out_team: String,
    pub out_price: Price,
    pub out_form: f64,
    pub in_id: PlayerId,
    #[serde(rename = "in")]
    pub in_name: String,
    pub in_team: String,
    pub in_price: Price,
    pub in_form: f64,
    pub in_fixtures: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub plan_name: String,
    pub transfers: Vec<Transfer>,
    pub hit_cost: i32,
    pub expected_upside_score: f64,
    pub net_cost: Price,
    pub remaining_bank: Price,
    pub rationale: String,
    pub data_used: String,
    pub confidence: String,
    pub risk_warning: String,
    /// Outgoing players skipped because no legal replacement existed.
    pub dropped: Vec<PlayerId>,
}

impl TransferPlan {
    pub fn is_noop(&self) -> bool {
        self.transfers.is_empty()
    }

    fn roll(bank: Price, fixtures: &FixtureDifficultyMap) -> Self {
        Self {
            plan_name: "No transfers recommended".to_string(),
            transfers: Vec::new(),
            hit_cost: 0,
            expected_upside_score: 0.0,
            net_cost: Price(0),
            remaining_bank: bank,
            rationale: "Your squad looks strong for the selected horizon. Roll the transfer."
                .to_string(),
            data_used: format!("Form, fixture difficulty ({})", fixtures.data_used_label()),
            confidence: "High".to_string(),
            risk_warning: "None".to_string(),
            dropped: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct SellCandidate<'a> {
    member: &'a SquadMember,
    keep_score: f64,
}

#[derive(Debug, Clone)]
struct BuyCandidate<'a> {
    player: &'a Player,
    in_score: f64,
}

/// Lower keep-score means more sell-worthy.
pub fn keep_score(player: &Player, fixtures: &FixtureDifficultyMap) -> f64 {
    let mut score = player.form * 2.0;
    score += (5.0 - fixtures.average_difficulty(player.club)) * 1.5;
    if player.minutes < LOW_MINUTES {
        score -= 2.0;
    }
    if player.availability_below(75) {
        score -= 3.0;
    }
    if player.has_injury_note() {
        score -= 1.0;
    }
    round_to(score, 2)
}

pub fn in_score(player: &Player, fixtures: &FixtureDifficultyMap) -> f64 {
    let fixture_ease = 5.0 - fixtures.average_difficulty(player.club);
    round_to(
        player.form * 2.0 + fixture_ease * 1.5 + player.points_per_cost() * 0.5,
        2,
    )
}

/// Squad members ordered most sell-worthy first; ties keep squad order.
pub fn sell_order<'a>(
    squad: &'a [SquadMember],
    fixtures: &FixtureDifficultyMap,
) -> Vec<&'a SquadMember> {
    let mut scored: Vec<SellCandidate<'a>> = squad
        .iter()
        .map(|member| SellCandidate {
            member,
            keep_score: keep_score(&member.player, fixtures),
        })
        .collect();
    scored.sort_by(|a, b| a.keep_score.total_cmp(&b.keep_score));
    scored.into_iter().map(|c| c.member).collect()
}

fn buy_candidates<'a>(
    players: &'a [Player],
    squad_ids: &HashSet<PlayerId>,
    fixtures: &FixtureDifficultyMap,
) -> HashMap<Position, Vec<BuyCandidate<'a>>> {
    let mut by_pos: HashMap<Position, Vec<BuyCandidate<'a>>> = HashMap::new();
    for p in players {
        if squad_ids.contains(&p.id) || p.minutes < MIN_CANDIDATE_MINUTES {
            continue;
        }
        by_pos.entry(p.position).or_default().push(BuyCandidate {
            player: p,
            in_score: in_score(p, fixtures),
        });
    }
    for group in by_pos.values_mut() {
        group.sort_by(|a, b| b.in_score.total_cmp(&a.in_score));
    }
    by_pos
}

/// Best unused candidate that fits `budget` and keeps every club at or under the cap.
fn pick_replacement<'a>(
    out: &Player,
    candidates: &[BuyCandidate<'a>],
    used: &HashSet<PlayerId>,
    budget: Price,
    club_counts: &HashMap<ClubId, i32>,
) -> Result<&'a Player, FplError> {
    candidates
        .iter()
        .filter(|c| !used.contains(&c.player.id))
        .filter(|c| c.player.price <= budget)
        .find(|c| {
            c.player.club == out.club
                || club_counts.get(&c.player.club).copied().unwrap_or(0) < MAX_PER_CLUB as i32
        })
        .map(|c| c.player)
        .ok_or(FplError::NoLegalReplacement { player_id: out.id })
}

/// Plans for 1..=max transfers, in that order. Never empty: a roll plan is
/// returned when nothing survives.
pub fn plan_transfers(
    request: &TransferRequest,
    bootstrap: &Bootstrap,
    fixtures: &FixtureDifficultyMap,
) -> Vec<TransferPlan> {
    let policy = RiskPolicy::from_risk(request.risk, request.allow_hits);
    let sells = sell_order(&request.squad, fixtures);
    let squad_ids: HashSet<PlayerId> = request.squad.iter().map(|m| m.player.id).collect();
    let buys = buy_candidates(&bootstrap.players, &squad_ids, fixtures);

    let mut squad_club_counts: HashMap<ClubId, i32> = HashMap::new();
    for m in &request.squad {
        *squad_club_counts.entry(m.player.club).or_insert(0) += 1;
    }

    let mut plans: Vec<TransferPlan> = Vec::new();
    for k in 1..=policy.max_transfers {
        let hit_cost = ((k as i32) - 1).max(0) * HIT_COST;
        if hit_cost > 0 && !policy.allow_hits {
            continue;
        }

        let mut transfers: Vec<Transfer> = Vec::new();
        let mut dropped: Vec<PlayerId> = Vec::new();
        let mut freed = Price(0);
        let mut used: HashSet<PlayerId> = HashSet::new();
        let mut club_counts = squad_club_counts.clone();

        for out in sells.iter().take(k) {
            let out_player = &out.player;
            let budget = request.bank + out.selling_price + freed;
            let pool = buys
                .get(&out_player.position)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let incoming = match pick_replacement(out_player, pool, &used, budget, &club_counts) {
                Ok(p) => p,
                Err(err) => {
                    warn!("plan {k}: dropping {}: {err}", out_player.display_name);
                    dropped.push(out_player.id);
                    continue;
                }
            };

            used.insert(incoming.id);
            freed += out.selling_price - incoming.price;
            *club_counts.entry(out_player.club).or_insert(0) -= 1;
            *club_counts.entry(incoming.club).or_insert(0) += 1;
            transfers.push(Transfer {
                out_id: out_player.id,
                out: out_player.display_name.clone(),
                out_team: bootstrap.club_short_name(out_player.club).to_string(),
                out_price: out.selling_price,
                out_form: out_player.form,
                in_id: incoming.id,
                in_name: incoming.display_name.clone(),
                in_team: bootstrap.club_short_name(incoming.club).to_string(),
                in_price: incoming.price,
                in_form: incoming.form,
                in_fixtures: fixtures.describe(incoming.club),
            });
        }

        if transfers.is_empty() {
            debug!("plan {k}: no realized transfers, discarded");
            continue;
        }

        let form_gain: f64 = transfers.iter().map(|t| t.in_form - t.out_form).sum();
        let upside = round_to((form_gain * 3.0 - hit_cost as f64).max(0.0), 1);
        let net_cost = transfers
            .iter()
            .fold(Price(0), |acc, t| acc + t.in_price - t.out_price);

        let mut confidence = if k > 1 && hit_cost > 0 {
            "Low-Medium".to_string()
        } else {
            "Medium".to_string()
        };
        if request.horizon == Horizon::Medium {
            confidence.push_str(" (fixtures-weighted)");
        }
        let risk_warning = if hit_cost > 0 {
            "Hits can backfire if new players blank."
        } else {
            "Single free transfer, low risk."
        };

        plans.push(TransferPlan {
            plan_name: format!(
                "Plan {}: {} transfer{}",
                plans.len() + 1,
                k,
                if k > 1 { "s" } else { "" }
            ),
            transfers,
            hit_cost,
            expected_upside_score: upside,
            net_cost,
            remaining_bank: request.bank + freed,
            rationale: format!(
                "{} move targeting form + fixture advantage. Total form gain: {form_gain:+.1}.",
                request.horizon.label()
            ),
            data_used: format!(
                "Form, fixture difficulty ({}), price, minutes",
                fixtures.data_used_label()
            ),
            confidence,
            risk_warning: risk_warning.to_string(),
            dropped,
        });
    }

    if plans.is_empty() {
        plans.push(TransferPlan::roll(request.bank, fixtures));
    }
    plans
}
