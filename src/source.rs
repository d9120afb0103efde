use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::http_cache::ConditionalCache;
use crate::http_client::build_http_client;
use crate::models::{
    Bootstrap, Club, Fixture, Gameweek, GameweekRecord, LivePoints, ManagerEntry, ManagerHistory,
    ManagerPicks, Player, PlayerId, TransferRecord,
};

/// Read-only league data. Every call is a fresh upstream read; caching lives in
/// [`crate::snapshot::Snapshot`].
pub trait DataSource: Send + Sync {
    fn bootstrap(&self) -> Result<Bootstrap>;
    fn player_history(&self, player_id: PlayerId) -> Result<Vec<GameweekRecord>>;
    fn fixtures(&self) -> Result<Vec<Fixture>>;
    fn manager_picks(&self, entry_id: u32, gameweek: u32) -> Result<ManagerPicks>;
    fn live_points(&self, gameweek: u32) -> Result<Vec<LivePoints>>;
    fn manager_entry(&self, entry_id: u32) -> Result<ManagerEntry>;
    fn manager_history(&self, entry_id: u32) -> Result<ManagerHistory>;
    fn manager_transfers(&self, entry_id: u32) -> Result<Vec<TransferRecord>>;
}

/// The public Fantasy Premier League API.
pub struct FplHttpSource {
    client: Client,
    base: String,
    cache: ConditionalCache,
}

impl FplHttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.http_timeout)?,
            base: config.api_base.trim_end_matches('/').to_string(),
            cache: ConditionalCache::new(),
        })
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base, path);
        debug!("GET {url}");
        self.cache.fetch(&self.client, &url)
    }
}

impl DataSource for FplHttpSource {
    fn bootstrap(&self) -> Result<Bootstrap> {
        let body = self
            .get("/bootstrap-static/")
            .context("bootstrap request failed")?;
        parse_bootstrap_json(&body)
    }

    fn player_history(&self, player_id: PlayerId) -> Result<Vec<GameweekRecord>> {
        let body = self
            .get(&format!("/element-summary/{player_id}/"))
            .with_context(|| format!("element summary {player_id} request failed"))?;
        parse_element_summary_json(&body)
    }

    fn fixtures(&self) -> Result<Vec<Fixture>> {
        let body = self.get("/fixtures/").context("fixtures request failed")?;
        parse_fixtures_json(&body)
    }

    fn manager_picks(&self, entry_id: u32, gameweek: u32) -> Result<ManagerPicks> {
        let body = self
            .get(&format!("/entry/{entry_id}/event/{gameweek}/picks/"))
            .with_context(|| format!("picks for entry {entry_id} GW{gameweek} request failed"))?;
        parse_picks_json(&body)
    }

    fn live_points(&self, gameweek: u32) -> Result<Vec<LivePoints>> {
        let body = self
            .get(&format!("/event/{gameweek}/live/"))
            .with_context(|| format!("live GW{gameweek} request failed"))?;
        parse_live_json(&body)
    }

    fn manager_entry(&self, entry_id: u32) -> Result<ManagerEntry> {
        let body = self
            .get(&format!("/entry/{entry_id}/"))
            .with_context(|| format!("entry {entry_id} request failed"))?;
        parse_entry_json(&body)
    }

    fn manager_history(&self, entry_id: u32) -> Result<ManagerHistory> {
        let body = self
            .get(&format!("/entry/{entry_id}/history/"))
            .with_context(|| format!("history for entry {entry_id} request failed"))?;
        parse_manager_history_json(&body)
    }

    fn manager_transfers(&self, entry_id: u32) -> Result<Vec<TransferRecord>> {
        let body = self
            .get(&format!("/entry/{entry_id}/transfers/"))
            .with_context(|| format!("transfers for entry {entry_id} request failed"))?;
        parse_transfers_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RawBootstrap {
    #[serde(default)]
    elements: Vec<Value>,
    #[serde(default)]
    teams: Vec<Club>,
    #[serde(default)]
    events: Vec<Gameweek>,
}

/// Elements that do not decode (e.g. non-player element types) are skipped.
pub fn parse_bootstrap_json(raw: &str) -> Result<Bootstrap> {
    let parsed: RawBootstrap = serde_json::from_str(raw.trim()).context("invalid bootstrap json")?;
    let total = parsed.elements.len();
    let players: Vec<Player> = parsed
        .elements
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Player>(v).ok())
        .collect();
    if players.len() < total {
        debug!("bootstrap: skipped {} undecodable elements", total - players.len());
    }
    Ok(Bootstrap {
        players,
        clubs: parsed.teams,
        gameweeks: parsed.events,
    })
}

/// History rows from `/element-summary/{id}/`, ordered by gameweek.
pub fn parse_element_summary_json(raw: &str) -> Result<Vec<GameweekRecord>> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid element summary json")?;
    let arr = v
        .get("history")
        .and_then(|h| h.as_array())
        .context("element summary has no history array")?;
    let mut rows: Vec<GameweekRecord> = arr
        .iter()
        .filter_map(|item| serde_json::from_value::<GameweekRecord>(item.clone()).ok())
        .collect();
    rows.sort_by_key(|r| r.gameweek);
    Ok(rows)
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let arr: Vec<Value> = serde_json::from_str(raw.trim()).context("invalid fixtures json")?;
    Ok(arr
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Fixture>(v).ok())
        .collect())
}

pub fn parse_picks_json(raw: &str) -> Result<ManagerPicks> {
    serde_json::from_str(raw.trim()).context("invalid picks json")
}

pub fn parse_live_json(raw: &str) -> Result<Vec<LivePoints>> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid live gameweek json")?;
    let arr = v
        .get("elements")
        .and_then(|e| e.as_array())
        .context("live gameweek has no elements array")?;
    Ok(arr.iter().filter_map(parse_live_element).collect())
}

fn parse_live_element(v: &Value) -> Option<LivePoints> {
    let player_id = v.get("id")?.as_u64()? as PlayerId;
    let stats = v.get("stats");
    let points = stats
        .and_then(|s| s.get("total_points"))
        .and_then(|x| x.as_i64())
        .unwrap_or(0) as i32;
    let minutes = stats
        .and_then(|s| s.get("minutes"))
        .and_then(|x| x.as_u64())
        .unwrap_or(0) as u32;
    Some(LivePoints {
        player_id,
        points,
        minutes,
    })
}

pub fn parse_entry_json(raw: &str) -> Result<ManagerEntry> {
    serde_json::from_str(raw.trim()).context("invalid entry json")
}

pub fn parse_manager_history_json(raw: &str) -> Result<ManagerHistory> {
    serde_json::from_str(raw.trim()).context("invalid entry history json")
}

/// Oldest first, as the endpoint returns newest first.
pub fn parse_transfers_json(raw: &str) -> Result<Vec<TransferRecord>> {
    let mut rows: Vec<TransferRecord> =
        serde_json::from_str(raw.trim()).context("invalid transfers json")?;
    rows.sort_by_key(|t| (t.event, t.time));
    Ok(rows)
}
