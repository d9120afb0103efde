use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FplError;

pub type PlayerId = u32;
pub type ClubId = u32;

/// Squad composition caps: 2 GKP, 5 DEF, 5 MID, 3 FWD, at most 3 per club.
pub const SQUAD_SIZE: usize = 15;
pub const XI_SIZE: usize = 11;
pub const MAX_PER_CLUB: usize = 3;
pub const SEASON_GAMEWEEKS: u32 = 38;

/// Reads the FPL `element_type` code or a short code; writes the short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PositionCode", into = "&'static str")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn squad_quota(self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// (min, max) starters for a legal XI.
    pub fn xi_bounds(self) -> (usize, usize) {
        match self {
            Position::Goalkeeper => (1, 1),
            Position::Defender => (3, 5),
            Position::Midfielder => (2, 5),
            Position::Forward => (1, 3),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FplError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GKP" | "GK" => Ok(Position::Goalkeeper),
            "DEF" => Ok(Position::Defender),
            "MID" => Ok(Position::Midfielder),
            "FWD" => Ok(Position::Forward),
            _ => Err(FplError::UnknownPosition(raw.to_string())),
        }
    }
}

impl TryFrom<u8> for Position {
    type Error = String;

    fn try_from(element_type: u8) -> Result<Self, Self::Error> {
        match element_type {
            1 => Ok(Position::Goalkeeper),
            2 => Ok(Position::Defender),
            3 => Ok(Position::Midfielder),
            4 => Ok(Position::Forward),
            other => Err(format!("unknown element_type {other}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionCode {
    ElementType(u8),
    Short(String),
}

impl TryFrom<PositionCode> for Position {
    type Error = String;

    fn try_from(code: PositionCode) -> Result<Self, Self::Error> {
        match code {
            PositionCode::ElementType(n) => Position::try_from(n),
            PositionCode::Short(s) => Position::parse(&s).map_err(|e| e.to_string()),
        }
    }
}

impl From<Position> for &'static str {
    fn from(pos: Position) -> Self {
        pos.short()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// Fixed-point price in tenths of a million (`now_cost` units).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub i32);

impl Price {
    pub fn tenths(self) -> i32 {
        self.0
    }

    pub fn millions(self) -> f64 {
        self.0 as f64 / 10.0
    }

    pub fn from_millions(value: f64) -> Self {
        Price((value * 10.0).round() as i32)
    }
}

impl Add for Price {
    type Output = Price;
    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Price;
    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Price) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Price {
    fn sub_assign(&mut self, rhs: Price) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "£{:.1}m", self.millions())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, rename = "second_name")]
    pub last_name: String,
    #[serde(rename = "web_name")]
    pub display_name: String,
    #[serde(rename = "team")]
    pub club: ClubId,
    #[serde(rename = "element_type")]
    pub position: Position,
    #[serde(rename = "now_cost")]
    pub price: Price,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub form: f64,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default, rename = "goals_scored")]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub clean_sheets: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goals: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_assists: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goal_involvements: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub selected_by_percent: f64,
    /// Free-text injury / suspension note; empty when none.
    #[serde(default, rename = "news", deserialize_with = "lenient_string")]
    pub injury_note: String,
    /// 0-100 chance of playing next round; `None` means no doubt flagged.
    #[serde(default, rename = "chance_of_playing_next_round")]
    pub availability: Option<u8>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn goal_involvements(&self) -> u32 {
        self.goals + self.assists
    }

    /// True when an availability signal exists and sits below `threshold`.
    pub fn availability_below(&self, threshold: u8) -> bool {
        self.availability.is_some_and(|chance| chance < threshold)
    }

    pub fn has_injury_note(&self) -> bool {
        !self.injury_note.trim().is_empty()
    }

    /// Season points per million; 0 when the price is not positive.
    pub fn points_per_cost(&self) -> f64 {
        let price = self.price.millions();
        if price > 0.0 {
            self.total_points as f64 / price
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    #[serde(default)]
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gameweek {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub finished: bool,
}

/// One row per (player, gameweek).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameweekRecord {
    #[serde(rename = "round")]
    pub gameweek: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default, rename = "total_points")]
    pub points: i32,
    #[serde(default, rename = "goals_scored")]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goals: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_assists: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goal_involvements: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    /// `None` for fixtures not yet scheduled into a gameweek.
    #[serde(default, rename = "event")]
    pub gameweek: Option<u32>,
    #[serde(rename = "team_h")]
    pub home_club: ClubId,
    #[serde(rename = "team_a")]
    pub away_club: ClubId,
    #[serde(default = "neutral_difficulty", rename = "team_h_difficulty")]
    pub home_difficulty: u8,
    #[serde(default = "neutral_difficulty", rename = "team_a_difficulty")]
    pub away_difficulty: u8,
    #[serde(default, rename = "team_h_score")]
    pub home_score: Option<u8>,
    #[serde(default, rename = "team_a_score")]
    pub away_score: Option<u8>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
}

fn neutral_difficulty() -> u8 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadPick {
    #[serde(rename = "element")]
    pub player_id: PlayerId,
    /// 1-11 starting XI, 12-15 bench.
    #[serde(rename = "position")]
    pub slot: u8,
    #[serde(default = "one")]
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

fn one() -> u8 {
    1
}

impl SquadPick {
    pub fn on_bench(&self) -> bool {
        self.slot as usize > XI_SIZE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub bank: Price,
    #[serde(default)]
    pub value: Price,
    #[serde(default)]
    pub event_transfers: u32,
    #[serde(default)]
    pub event_transfers_cost: i32,
}

/// A manager's 15 picks for one gameweek.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerPicks {
    #[serde(default)]
    pub picks: Vec<SquadPick>,
    #[serde(default)]
    pub entry_history: EntryHistory,
    #[serde(default)]
    pub active_chip: Option<String>,
}

/// `/entry/{id}/`: who the manager is and where they stand overall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerEntry {
    pub id: u32,
    #[serde(default, rename = "name")]
    pub team_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub player_first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub player_last_name: String,
    #[serde(default)]
    pub summary_overall_points: Option<i32>,
    #[serde(default)]
    pub summary_overall_rank: Option<u32>,
}

impl ManagerEntry {
    pub fn manager_name(&self) -> String {
        format!("{} {}", self.player_first_name, self.player_last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerGameweek {
    #[serde(rename = "event")]
    pub gameweek: u32,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub overall_rank: Option<u32>,
    #[serde(default)]
    pub bank: Price,
    #[serde(default)]
    pub value: Price,
    #[serde(default)]
    pub event_transfers: u32,
    #[serde(default)]
    pub event_transfers_cost: i32,
    #[serde(default)]
    pub points_on_bench: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastSeason {
    pub season_name: String,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub rank: Option<u32>,
}

/// `/entry/{id}/history/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerHistory {
    #[serde(default)]
    pub current: Vec<ManagerGameweek>,
    #[serde(default)]
    pub past: Vec<PastSeason>,
}

/// One row of `/entry/{id}/transfers/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub element_in: PlayerId,
    #[serde(default)]
    pub element_in_cost: Price,
    pub element_out: PlayerId,
    #[serde(default)]
    pub element_out_cost: Price,
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Realized points for one player in one gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LivePoints {
    pub player_id: PlayerId,
    pub points: i32,
    pub minutes: u32,
}

/// The "everything" payload: players, clubs, gameweek metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bootstrap {
    #[serde(rename = "elements")]
    pub players: Vec<Player>,
    #[serde(rename = "teams")]
    pub clubs: Vec<Club>,
    #[serde(default, rename = "events")]
    pub gameweeks: Vec<Gameweek>,
}

impl Bootstrap {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn club_short_name(&self, id: ClubId) -> &str {
        self.clubs
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.short_name.as_str())
            .unwrap_or("?")
    }

    /// The `is_current` gameweek, else the last finished one.
    pub fn current_gameweek(&self) -> Option<u32> {
        if let Some(gw) = self.gameweeks.iter().find(|g| g.is_current) {
            return Some(gw.id);
        }
        self.gameweeks
            .iter()
            .filter(|g| g.finished)
            .map(|g| g.id)
            .next_back()
    }

    pub fn next_gameweek(&self) -> Option<u32> {
        self.gameweeks.iter().find(|g| g.is_next).map(|g| g.id)
    }

    pub fn gameweek(&self, id: u32) -> Option<&Gameweek> {
        self.gameweeks.iter().find(|g| g.id == id)
    }
}

/// FPL ships most decimals as strings ("5.2"); accept strings, numbers, or null.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(v)) => v,
        Some(Raw::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
