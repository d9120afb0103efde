use serde::{Deserialize, Serialize};

use crate::metrics::{MetricBundle, RegressionFlag, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "explosive")]
    Explosive,
    #[serde(rename = "consistent")]
    Consistent,
    #[serde(rename = "semi-explosive")]
    SemiExplosive,
    #[serde(rename = "steady")]
    Steady,
    #[serde(rename = "talisman")]
    Talisman,
    #[serde(rename = "key_player")]
    KeyPlayer,
    #[serde(rename = "overperforming")]
    Overperforming,
    #[serde(rename = "underperforming")]
    Underperforming,
    #[serde(rename = "nailed")]
    Nailed,
    #[serde(rename = "rotation_risk")]
    RotationRisk,
    #[serde(rename = "injury_concern")]
    InjuryConcern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Archetype {
    ExplosiveTalisman,
    ExplosiveDifferential,
    ConsistentGrinder,
    SafePick,
    OverperformingFinisher,
    UnderperformingTalisman,
    UnderperformingAsset,
    TeamTalisman,
    RotationRisk,
    BoomOrBust,
    FunctionalAsset,
}

impl Archetype {
    pub const ALL: [Archetype; 11] = [
        Archetype::ExplosiveTalisman,
        Archetype::ExplosiveDifferential,
        Archetype::ConsistentGrinder,
        Archetype::SafePick,
        Archetype::OverperformingFinisher,
        Archetype::UnderperformingTalisman,
        Archetype::UnderperformingAsset,
        Archetype::TeamTalisman,
        Archetype::RotationRisk,
        Archetype::BoomOrBust,
        Archetype::FunctionalAsset,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Archetype::ExplosiveTalisman => "explosive talisman",
            Archetype::ExplosiveDifferential => "explosive differential",
            Archetype::ConsistentGrinder => "consistent grinder",
            Archetype::SafePick => "safe pick",
            Archetype::OverperformingFinisher => "overperforming finisher",
            Archetype::UnderperformingTalisman => "underperforming talisman (buy-low)",
            Archetype::UnderperformingAsset => "underperforming asset (buy-low candidate)",
            Archetype::TeamTalisman => "team talisman",
            Archetype::RotationRisk => "rotation risk",
            Archetype::BoomOrBust => "boom-or-bust",
            Archetype::FunctionalAsset => "functional asset",
        }
    }
}

impl From<Archetype> for &'static str {
    fn from(archetype: Archetype) -> Self {
        archetype.label()
    }
}

impl TryFrom<String> for Archetype {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Archetype::ALL
            .into_iter()
            .find(|a| a.label() == label)
            .ok_or_else(|| format!("unknown archetype {label:?}"))
    }
}

/// A label applies when every tag in `requires` is present.
#[derive(Debug, Clone, Copy)]
pub struct ArchetypeRule {
    pub requires: &'static [Tag],
    pub archetype: Archetype,
}

/// Evaluated top to bottom; the first satisfied rule wins. Order is load-bearing.
pub const ARCHETYPE_RULES: &[ArchetypeRule] = &[
    ArchetypeRule {
        requires: &[Tag::Explosive, Tag::Talisman],
        archetype: Archetype::ExplosiveTalisman,
    },
    ArchetypeRule {
        requires: &[Tag::Explosive],
        archetype: Archetype::ExplosiveDifferential,
    },
    ArchetypeRule {
        requires: &[Tag::Consistent, Tag::Nailed],
        archetype: Archetype::ConsistentGrinder,
    },
    ArchetypeRule {
        requires: &[Tag::Consistent],
        archetype: Archetype::SafePick,
    },
    ArchetypeRule {
        requires: &[Tag::Overperforming],
        archetype: Archetype::OverperformingFinisher,
    },
    ArchetypeRule {
        requires: &[Tag::Underperforming, Tag::Talisman],
        archetype: Archetype::UnderperformingTalisman,
    },
    ArchetypeRule {
        requires: &[Tag::Underperforming],
        archetype: Archetype::UnderperformingAsset,
    },
    ArchetypeRule {
        requires: &[Tag::Talisman],
        archetype: Archetype::TeamTalisman,
    },
    ArchetypeRule {
        requires: &[Tag::RotationRisk],
        archetype: Archetype::RotationRisk,
    },
    ArchetypeRule {
        requires: &[Tag::SemiExplosive],
        archetype: Archetype::BoomOrBust,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    pub archetype: Archetype,
    pub tags: Vec<Tag>,
}

impl ArchetypeProfile {
    pub fn has(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Tags in derivation order: volatility, talisman, regression, reliability, injury.
pub fn derive_tags(metrics: &MetricBundle) -> Vec<Tag> {
    let mut tags = Vec::with_capacity(5);

    let e = &metrics.explosiveness;
    if e.haul_rate >= 0.25 && e.std_points >= 3.5 {
        tags.push(Tag::Explosive);
    } else if e.blank_rate <= 0.2 && e.std_points <= 2.5 {
        tags.push(Tag::Consistent);
    } else if e.haul_rate >= 0.15 {
        tags.push(Tag::SemiExplosive);
    } else {
        tags.push(Tag::Steady);
    }

    let ti = metrics.talisman.talisman_index;
    if ti >= 0.25 {
        tags.push(Tag::Talisman);
    } else if ti >= 0.15 {
        tags.push(Tag::KeyPlayer);
    }

    match metrics.regression.regression_flag {
        RegressionFlag::Overperforming => tags.push(Tag::Overperforming),
        RegressionFlag::Underperforming => tags.push(Tag::Underperforming),
        RegressionFlag::InLine => {}
    }

    let rel = metrics.reliability.reliability_score;
    if rel >= 80 {
        tags.push(Tag::Nailed);
    } else if rel < 50 {
        tags.push(Tag::RotationRisk);
    }

    if matches!(
        metrics.reliability.injury_risk,
        RiskLevel::Medium | RiskLevel::High
    ) {
        tags.push(Tag::InjuryConcern);
    }

    tags
}

pub fn select_archetype(tags: &[Tag]) -> Archetype {
    ARCHETYPE_RULES
        .iter()
        .find(|rule| rule.requires.iter().all(|t| tags.contains(t)))
        .map(|rule| rule.archetype)
        .unwrap_or(Archetype::FunctionalAsset)
}

pub fn classify(metrics: &MetricBundle) -> ArchetypeProfile {
    let tags = derive_tags(metrics);
    ArchetypeProfile {
        archetype: select_archetype(&tags),
        tags,
    }
}

/// One-paragraph explanation of a classification.
pub fn summarize(name: &str, profile: &ArchetypeProfile, metrics: &MetricBundle) -> String {
    let e = &metrics.explosiveness;
    let mut parts = vec![format!(
        "{name} is classified as **{}**.",
        profile.archetype.label()
    )];
    if profile.has(Tag::Explosive) {
        parts.push(format!(
            "Haul rate {:.0}% with high variance (σ={:.1}).",
            e.haul_rate * 100.0,
            e.std_points
        ));
    }
    if profile.has(Tag::Consistent) {
        parts.push(format!(
            "Averages {:.1} pts/GW with low variance (σ={:.1}).",
            e.avg_points, e.std_points
        ));
    }
    if profile.has(Tag::Talisman) {
        parts.push(format!(
            "Talisman index {:.2}, central to the team's attack.",
            metrics.talisman.talisman_index
        ));
    }
    let r = &metrics.regression;
    if r.regression_flag != RegressionFlag::InLine {
        let flag = match r.regression_flag {
            RegressionFlag::Overperforming => "overperforming",
            _ => "underperforming",
        };
        parts.push(format!(
            "Currently {flag} vs xG/xA (ΔG={:+.1}, ΔA={:+.1}).",
            r.delta_goals_vs_xg, r.delta_assists_vs_xa
        ));
    }
    parts.push(format!(
        "Reliability score: {}/100.",
        metrics.reliability.reliability_score
    ));
    parts.join(" ")
}
