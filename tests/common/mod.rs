#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};

use fpl_insight::models::{
    Bootstrap, Club, ClubId, EntryHistory, Fixture, Gameweek, GameweekRecord, LivePoints,
    ManagerEntry, ManagerHistory, ManagerPicks, Player, PlayerId, Position, Price, SquadPick,
    TransferRecord,
};
use fpl_insight::source::DataSource;

pub const CLUBS: u32 = 6;

pub fn player(id: PlayerId, club: ClubId, position: Position, price: i32, form: f64) -> Player {
    Player {
        id,
        first_name: format!("First{id}"),
        last_name: format!("Last{id}"),
        display_name: format!("P{id}"),
        club,
        position,
        price: Price(price),
        total_points: (form * 10.0) as i32,
        form,
        minutes: 900,
        goals: 0,
        assists: 0,
        clean_sheets: 0,
        expected_goals: 0.0,
        expected_assists: 0.0,
        expected_goal_involvements: 0.0,
        selected_by_percent: 5.0,
        injury_note: String::new(),
        availability: None,
    }
}

/// Six clubs, each carrying a full 2/5/5/3 squad. Ids are `club * 100 + n`.
pub fn league() -> Bootstrap {
    let mut players = Vec::new();
    for club in 1..=CLUBS {
        let mut n = 0;
        for pos in Position::ALL {
            for _ in 0..pos.squad_quota() {
                n += 1;
                let id = club * 100 + n;
                let form = ((id * 7) % 23) as f64 / 2.0;
                let price = 40 + ((id * 13) % 90) as i32;
                players.push(player(id, club, pos, price, form));
            }
        }
    }
    let clubs = (1..=CLUBS)
        .map(|id| Club {
            id,
            name: format!("Club {id}"),
            short_name: format!("C{id}"),
        })
        .collect();
    let gameweeks = (1..=4)
        .map(|id| Gameweek {
            id,
            name: format!("Gameweek {id}"),
            deadline_time: None,
            is_current: id == 3,
            is_next: id == 4,
            finished: id < 3,
        })
        .collect();
    Bootstrap {
        players,
        clubs,
        gameweeks,
    }
}

pub fn history(points: &[i32]) -> Vec<GameweekRecord> {
    points
        .iter()
        .enumerate()
        .map(|(i, &p)| GameweekRecord {
            gameweek: i as u32 + 1,
            minutes: 90,
            points: p,
            ..Default::default()
        })
        .collect()
}

pub fn fixture(id: u32, gw: u32, home: ClubId, away: ClubId, hd: u8, ad: u8) -> Fixture {
    Fixture {
        id,
        gameweek: Some(gw),
        home_club: home,
        away_club: away,
        home_difficulty: hd,
        away_difficulty: ad,
        home_score: None,
        away_score: None,
        finished: false,
        kickoff_time: None,
    }
}

pub fn picks_for(ids: &[PlayerId], bank: i32) -> ManagerPicks {
    ManagerPicks {
        picks: ids
            .iter()
            .enumerate()
            .map(|(i, &id)| SquadPick {
                player_id: id,
                slot: i as u8 + 1,
                multiplier: 1,
                is_captain: i == 0,
                is_vice_captain: i == 1,
            })
            .collect(),
        entry_history: EntryHistory {
            bank: Price(bank),
            ..Default::default()
        },
        active_chip: None,
    }
}

/// In-memory source that counts upstream reads.
#[derive(Default)]
pub struct StubSource {
    pub bootstrap: Bootstrap,
    pub histories: HashMap<PlayerId, Vec<GameweekRecord>>,
    pub fixtures: Vec<Fixture>,
    pub picks: Option<ManagerPicks>,
    pub live: Vec<LivePoints>,
    pub entry: Option<ManagerEntry>,
    pub season: ManagerHistory,
    pub transfers: Vec<TransferRecord>,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
    pub bootstrap_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub fixture_calls: AtomicUsize,
    pub history_log: Mutex<Vec<PlayerId>>,
}

impl StubSource {
    pub fn new(bootstrap: Bootstrap) -> Self {
        Self {
            bootstrap,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if let Some(d) = self.delay {
            thread::sleep(d);
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("upstream timed out");
        }
        Ok(())
    }
}

impl DataSource for StubSource {
    fn bootstrap(&self) -> Result<Bootstrap> {
        self.bootstrap_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.bootstrap.clone())
    }

    fn player_history(&self, player_id: PlayerId) -> Result<Vec<GameweekRecord>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history_log
            .lock()
            .expect("history log lock")
            .push(player_id);
        self.check()?;
        Ok(self.histories.get(&player_id).cloned().unwrap_or_default())
    }

    fn fixtures(&self) -> Result<Vec<Fixture>> {
        self.fixture_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.fixtures.clone())
    }

    fn manager_picks(&self, entry_id: u32, gameweek: u32) -> Result<ManagerPicks> {
        self.check()?;
        match &self.picks {
            Some(p) => Ok(p.clone()),
            None => bail!("entry {entry_id} has no picks for GW{gameweek}"),
        }
    }

    fn live_points(&self, _gameweek: u32) -> Result<Vec<LivePoints>> {
        self.check()?;
        Ok(self.live.clone())
    }

    fn manager_entry(&self, entry_id: u32) -> Result<ManagerEntry> {
        self.check()?;
        match &self.entry {
            Some(e) => Ok(e.clone()),
            None => bail!("entry {entry_id} not found"),
        }
    }

    fn manager_history(&self, _entry_id: u32) -> Result<ManagerHistory> {
        self.check()?;
        Ok(self.season.clone())
    }

    fn manager_transfers(&self, _entry_id: u32) -> Result<Vec<TransferRecord>> {
        self.check()?;
        Ok(self.transfers.clone())
    }
}
