use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Bootstrap, ClubId, Fixture, SEASON_GAMEWEEKS};

const NEUTRAL_DIFFICULTY: f64 = 3.0;

/// Inclusive gameweek range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekWindow {
    pub start: u32,
    pub end: u32,
}

impl GameweekWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// `len` gameweeks starting the gameweek after `current`, capped at the season end.
    pub fn after(current: Option<u32>, len: u32) -> Self {
        let start = current.map_or(1, |gw| gw.saturating_add(1));
        let end = start
            .saturating_add(len.max(1) - 1)
            .min(SEASON_GAMEWEEKS);
        Self::new(start, end)
    }

    pub fn contains(&self, gameweek: u32) -> bool {
        gameweek >= self.start && gameweek <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1gw")]
    Next,
    #[serde(rename = "5gw")]
    Medium,
}

impl Horizon {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "5gw" | "5" | "medium" => Horizon::Medium,
            _ => Horizon::Next,
        }
    }

    pub fn window(self, current: Option<u32>) -> GameweekWindow {
        match self {
            Horizon::Next => GameweekWindow::after(current, 1),
            Horizon::Medium => GameweekWindow::after(current, 5),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Horizon::Next => "Short-term",
            Horizon::Medium => "Medium-term",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureOutlook {
    pub gameweek: u32,
    pub opponent: String,
    pub difficulty: u8,
    pub is_home: bool,
}

/// Upcoming fixtures per club within a window.
#[derive(Debug, Clone, Default)]
pub struct FixtureDifficultyMap {
    pub window: Option<GameweekWindow>,
    by_club: HashMap<ClubId, Vec<FixtureOutlook>>,
}

impl FixtureDifficultyMap {
    pub fn build(window: GameweekWindow, fixtures: &[Fixture], bootstrap: &Bootstrap) -> Self {
        let mut by_club: HashMap<ClubId, Vec<FixtureOutlook>> = HashMap::new();
        for f in fixtures {
            let Some(gw) = f.gameweek else { continue };
            if !window.contains(gw) {
                continue;
            }
            by_club.entry(f.home_club).or_default().push(FixtureOutlook {
                gameweek: gw,
                opponent: bootstrap.club_short_name(f.away_club).to_string(),
                difficulty: f.home_difficulty,
                is_home: true,
            });
            by_club.entry(f.away_club).or_default().push(FixtureOutlook {
                gameweek: gw,
                opponent: bootstrap.club_short_name(f.home_club).to_string(),
                difficulty: f.away_difficulty,
                is_home: false,
            });
        }
        Self {
            window: Some(window),
            by_club,
        }
    }

    pub fn fixtures_for(&self, club: ClubId) -> &[FixtureOutlook] {
        self.by_club.get(&club).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Neutral 3.0 when the club has no fixture in the window.
    pub fn average_difficulty(&self, club: ClubId) -> f64 {
        let fixtures = self.fixtures_for(club);
        if fixtures.is_empty() {
            return NEUTRAL_DIFFICULTY;
        }
        fixtures.iter().map(|f| f.difficulty as f64).sum::<f64>() / fixtures.len() as f64
    }

    /// `5 - average difficulty`, floored at zero.
    pub fn ease(&self, club: ClubId) -> f64 {
        (5.0 - self.average_difficulty(club)).max(0.0)
    }

    /// e.g. `"BOU(H), LIV(A)"`, or `"-"` with nothing scheduled.
    pub fn describe(&self, club: ClubId) -> String {
        let fixtures = self.fixtures_for(club);
        if fixtures.is_empty() {
            return "-".to_string();
        }
        fixtures
            .iter()
            .take(5)
            .map(|f| format!("{}({})", f.opponent, if f.is_home { "H" } else { "A" }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Earliest fixture in the window as `"OPP(H)"`, or `"-"`.
    pub fn next_fixture(&self, club: ClubId) -> String {
        self.fixtures_for(club)
            .iter()
            .min_by_key(|f| f.gameweek)
            .map(|f| format!("{}({})", f.opponent, if f.is_home { "H" } else { "A" }))
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn data_used_label(&self) -> String {
        match self.window {
            Some(w) => format!("GW{}-{}", w.start, w.end),
            None => "no fixture window".to_string(),
        }
    }
}
