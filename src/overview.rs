//! Plain lookups: one player's card, the gameweek calendar, one round of fixtures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fixtures::{FixtureDifficultyMap, FixtureOutlook};
use crate::models::{
    Bootstrap, Fixture, Gameweek, GameweekRecord, Player, PlayerId, Position, Price,
};

const UPCOMING_SHOWN: usize = 5;
const RECENT_SHOWN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetails {
    pub id: PlayerId,
    pub name: String,
    pub web_name: String,
    pub team: String,
    pub position: Position,
    pub price: Price,
    pub total_points: i32,
    pub form: f64,
    pub goals: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub minutes: u32,
    pub expected_goals: f64,
    pub expected_assists: f64,
    pub selected_by_percent: f64,
    pub news: String,
    pub chance_of_playing: Option<u8>,
    pub upcoming_fixtures: Vec<FixtureOutlook>,
    pub recent_history: Vec<GameweekRecord>,
}

pub fn player_details(
    player: &Player,
    bootstrap: &Bootstrap,
    fixtures: &FixtureDifficultyMap,
    history: &[GameweekRecord],
) -> PlayerDetails {
    let mut upcoming = fixtures.fixtures_for(player.club).to_vec();
    upcoming.sort_by_key(|f| f.gameweek);
    upcoming.truncate(UPCOMING_SHOWN);
    let recent = history[history.len().saturating_sub(RECENT_SHOWN)..].to_vec();

    PlayerDetails {
        id: player.id,
        name: player.full_name(),
        web_name: player.display_name.clone(),
        team: bootstrap.club_short_name(player.club).to_string(),
        position: player.position,
        price: player.price,
        total_points: player.total_points,
        form: player.form,
        goals: player.goals,
        assists: player.assists,
        clean_sheets: player.clean_sheets,
        minutes: player.minutes,
        expected_goals: player.expected_goals,
        expected_assists: player.expected_assists,
        selected_by_percent: player.selected_by_percent,
        news: player.injury_note.clone(),
        chance_of_playing: player.availability,
        upcoming_fixtures: upcoming,
        recent_history: recent,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekInfo {
    pub current_gameweek: Option<Gameweek>,
    pub next_gameweek: Option<Gameweek>,
}

/// Uses the same "current" rule as the rest of the crate: the flagged
/// gameweek, else the last finished one.
pub fn gameweek_info(bootstrap: &Bootstrap) -> GameweekInfo {
    let pick = |id: Option<u32>| id.and_then(|id| bootstrap.gameweek(id)).cloned();
    GameweekInfo {
        current_gameweek: pick(bootstrap.current_gameweek()),
        next_gameweek: pick(bootstrap.next_gameweek()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRow {
    pub id: u32,
    pub home: String,
    pub away: String,
    pub home_difficulty: u8,
    pub away_difficulty: u8,
    pub kickoff_time: Option<DateTime<Utc>>,
    pub finished: bool,
    /// `"2-1"` once both scores are known.
    pub score: Option<String>,
}

pub fn fixture_rows(fixtures: &[Fixture], bootstrap: &Bootstrap) -> Vec<FixtureRow> {
    let mut rows: Vec<FixtureRow> = fixtures
        .iter()
        .map(|f| FixtureRow {
            id: f.id,
            home: bootstrap.club_short_name(f.home_club).to_string(),
            away: bootstrap.club_short_name(f.away_club).to_string(),
            home_difficulty: f.home_difficulty,
            away_difficulty: f.away_difficulty,
            kickoff_time: f.kickoff_time,
            finished: f.finished,
            score: f.home_score.zip(f.away_score).map(|(h, a)| format!("{h}-{a}")),
        })
        .collect();
    rows.sort_by_key(|r| (r.kickoff_time, r.id));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Club;

    fn gw(id: u32, is_current: bool, is_next: bool, finished: bool) -> Gameweek {
        Gameweek {
            id,
            name: format!("Gameweek {id}"),
            deadline_time: None,
            is_current,
            is_next,
            finished,
        }
    }

    #[test]
    fn calendar_reports_current_and_next() {
        let boot = Bootstrap {
            gameweeks: vec![
                gw(1, false, false, true),
                gw(2, true, false, false),
                gw(3, false, true, false),
            ],
            ..Default::default()
        };
        let info = gameweek_info(&boot);
        assert_eq!(info.current_gameweek.map(|g| g.id), Some(2));
        assert_eq!(info.next_gameweek.map(|g| g.id), Some(3));

        let off_season = gameweek_info(&Bootstrap::default());
        assert!(off_season.current_gameweek.is_none());
        assert!(off_season.next_gameweek.is_none());
    }

    #[test]
    fn score_only_once_both_sides_are_known() {
        let boot = Bootstrap {
            clubs: vec![
                Club {
                    id: 1,
                    name: "Arsenal".into(),
                    short_name: "ARS".into(),
                },
                Club {
                    id: 2,
                    name: "Chelsea".into(),
                    short_name: "CHE".into(),
                },
            ],
            ..Default::default()
        };
        let played = Fixture {
            id: 9,
            gameweek: Some(2),
            home_club: 1,
            away_club: 2,
            home_difficulty: 4,
            away_difficulty: 3,
            home_score: Some(2),
            away_score: Some(1),
            finished: true,
            kickoff_time: None,
        };
        let pending = Fixture {
            id: 10,
            home_score: None,
            away_score: None,
            finished: false,
            ..played.clone()
        };
        let rows = fixture_rows(&[pending, played], &boot);
        assert_eq!(rows[0].id, 9);
        assert_eq!(rows[0].score.as_deref(), Some("2-1"));
        assert_eq!((rows[0].home.as_str(), rows[0].away.as_str()), ("ARS", "CHE"));
        assert_eq!(rows[1].score, None);
    }
}
