use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, Tag, classify, summarize};
use crate::config::Config;
use crate::error::{FplError, Result};
use crate::fixtures::{FixtureDifficultyMap, GameweekWindow, Horizon};
use crate::insights::{self, FormEntry, TalismanEntry, ValueEntry};
use crate::manager::{ManagerSquad, TransferLogEntry, manager_squad, transfer_log};
use crate::metrics::{
    MetricBundle, VolatilityProfile, club_totals, compute_bundle, volatility_profile,
};
use crate::models::{
    Bootstrap, ManagerHistory, ManagerPicks, Player, PlayerId, Position, Price, SEASON_GAMEWEEKS,
};
use crate::optimizer::{DreamTeam, optimize, pool_from_live};
use crate::overview::{
    FixtureRow, GameweekInfo, PlayerDetails, fixture_rows, gameweek_info, player_details,
};
use crate::replacements::{
    BehaviourSummary, ReplacementQuery, ReplacementReport, RiskTier, find_replacements,
    resolve_player,
};
use crate::snapshot::Snapshot;
use crate::source::FplHttpSource;
use crate::squad_risk::{SquadRiskProfile, assess_picks, profile_squad};
use crate::transfers::{SquadMember, TransferPlan, TransferRequest, plan_transfers};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
}

impl PlayerRef {
    fn new(player: &Player, bootstrap: &Bootstrap) -> Self {
        Self {
            id: player.id,
            name: player.display_name.clone(),
            team: bootstrap.club_short_name(player.club).to_string(),
            position: player.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeReport {
    pub player: PlayerRef,
    pub archetype: Archetype,
    pub tags: Vec<Tag>,
    pub metrics: MetricBundle,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReport {
    pub player: PlayerRef,
    #[serde(flatten)]
    pub profile: VolatilityProfile,
}

/// Every analysis operation, composed over one shared [`Snapshot`].
#[derive(Clone)]
pub struct FplEngine {
    snapshot: Arc<Snapshot>,
    config: Config,
}

impl FplEngine {
    pub fn new(snapshot: Arc<Snapshot>, config: Config) -> Self {
        Self { snapshot, config }
    }

    /// Engine backed by the public FPL API.
    pub fn from_config(config: Config) -> Result<Self> {
        let source = FplHttpSource::new(&config).map_err(FplError::unavailable)?;
        let snapshot = Snapshot::new(Arc::new(source), config.cache_ttl);
        Ok(Self::new(Arc::new(snapshot), config))
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolve(&self, name: &str) -> Result<Player> {
        let bootstrap = self.snapshot.bootstrap()?;
        resolve_player(name, &bootstrap.players).cloned()
    }

    /// Full metric bundle for one player.
    pub fn metrics(&self, player: &Player) -> Result<MetricBundle> {
        let bootstrap = self.snapshot.bootstrap()?;
        self.metrics_with(player, &bootstrap)
    }

    fn metrics_with(&self, player: &Player, bootstrap: &Bootstrap) -> Result<MetricBundle> {
        let history = self.snapshot.gameweek_history(player.id)?;
        let club = club_totals(&bootstrap.players)
            .get(&player.club)
            .copied()
            .unwrap_or_default();
        Ok(compute_bundle(
            player,
            &history,
            club,
            self.config.behaviour_window,
        ))
    }

    pub fn behaviour(&self, player: &Player) -> Result<BehaviourSummary> {
        let bootstrap = self.snapshot.bootstrap()?;
        self.behaviour_with(player, &bootstrap)
    }

    fn behaviour_with(&self, player: &Player, bootstrap: &Bootstrap) -> Result<BehaviourSummary> {
        let metrics = self.metrics_with(player, bootstrap)?;
        let profile = classify(&metrics);
        Ok(BehaviourSummary::new(
            &metrics,
            profile.archetype,
            profile.tags,
        ))
    }

    pub fn classify_player_archetype(&self, name: &str) -> Result<ArchetypeReport> {
        info!("classify_player_archetype(name={name:?})");
        let bootstrap = self.snapshot.bootstrap()?;
        let player = resolve_player(name, &bootstrap.players)?;
        let metrics = self.metrics_with(player, &bootstrap)?;
        let profile = classify(&metrics);
        let summary = summarize(&player.display_name, &profile, &metrics);
        Ok(ArchetypeReport {
            player: PlayerRef::new(player, &bootstrap),
            archetype: profile.archetype,
            tags: profile.tags,
            metrics,
            summary,
        })
    }

    pub fn volatility_profile(&self, name: &str, window: usize) -> Result<VolatilityReport> {
        info!("volatility_profile(name={name:?}, window={window})");
        let bootstrap = self.snapshot.bootstrap()?;
        let player = resolve_player(name, &bootstrap.players)?;
        let history = self.snapshot.gameweek_history(player.id)?;
        Ok(VolatilityReport {
            player: PlayerRef::new(player, &bootstrap),
            profile: volatility_profile(&history, window.max(1)),
        })
    }

    pub fn find_talismans(&self, limit: usize, min_minutes: u32) -> Result<Vec<TalismanEntry>> {
        info!("find_talismans(limit={limit}, min_minutes={min_minutes})");
        let bootstrap = self.snapshot.bootstrap()?;
        Ok(insights::talisman_leaderboard(&bootstrap, min_minutes, limit))
    }

    pub fn top_by_form(&self, limit: usize) -> Result<Vec<FormEntry>> {
        info!("top_by_form(limit={limit})");
        let bootstrap = self.snapshot.bootstrap()?;
        Ok(insights::top_by_form(&bootstrap, limit))
    }

    pub fn best_value(&self, position: &str, limit: usize) -> Result<Vec<ValueEntry>> {
        info!("best_value(position={position:?}, limit={limit})");
        let bootstrap = self.snapshot.bootstrap()?;
        insights::best_value(&bootstrap, position, limit)
    }

    pub fn dream_team(&self, gameweek: u32) -> Result<DreamTeam> {
        info!("dream_team(gameweek={gameweek})");
        let bootstrap = self.snapshot.bootstrap()?;
        let live = self.snapshot.live_points(gameweek)?;
        let pool = pool_from_live(&bootstrap, &live);
        debug!("dream team pool for GW{gameweek}: {} players", pool.len());
        let mut team = optimize(&pool)?;
        team.gameweek = Some(gameweek);
        Ok(team)
    }

    pub fn player_details(&self, name: &str) -> Result<PlayerDetails> {
        info!("player_details(name={name:?})");
        let bootstrap = self.snapshot.bootstrap()?;
        let player = resolve_player(name, &bootstrap.players)?;
        let history = self.snapshot.gameweek_history(player.id)?;
        let fixtures = self.upcoming_fixtures(&bootstrap)?;
        Ok(player_details(player, &bootstrap, &fixtures, &history))
    }

    pub fn gameweek_info(&self) -> Result<GameweekInfo> {
        info!("gameweek_info()");
        let bootstrap = self.snapshot.bootstrap()?;
        Ok(gameweek_info(&bootstrap))
    }

    pub fn fixtures_for_gameweek(&self, gameweek: u32) -> Result<Vec<FixtureRow>> {
        info!("fixtures_for_gameweek(gameweek={gameweek})");
        let bootstrap = self.snapshot.bootstrap()?;
        let fixtures = self
            .snapshot
            .fixtures(Some(GameweekWindow::new(gameweek, gameweek)))?;
        Ok(fixture_rows(&fixtures, &bootstrap))
    }

    /// The linked team's picks with captaincy, bench split and next fixtures.
    pub fn my_team(&self, gameweek: Option<u32>) -> Result<ManagerSquad> {
        info!("my_team(gameweek={gameweek:?})");
        let (gameweek, picks) = self.linked_picks(gameweek)?;
        let entry = self.snapshot.manager_entry(self.linked_team()?)?;
        let bootstrap = self.snapshot.bootstrap()?;
        let fixtures = self.upcoming_fixtures(&bootstrap)?;
        Ok(manager_squad(gameweek, &entry, &picks, &bootstrap, &fixtures))
    }

    pub fn season_history(&self) -> Result<ManagerHistory> {
        info!("season_history()");
        let history = self.snapshot.manager_history(self.linked_team()?)?;
        Ok(history.as_ref().clone())
    }

    pub fn transfer_history(&self) -> Result<Vec<TransferLogEntry>> {
        info!("transfer_history()");
        let records = self.snapshot.manager_transfers(self.linked_team()?)?;
        let bootstrap = self.snapshot.bootstrap()?;
        Ok(transfer_log(&records, &bootstrap))
    }

    fn linked_team(&self) -> Result<u32> {
        self.config.team_id.ok_or(FplError::TeamNotLinked)
    }

    fn linked_picks(&self, gameweek: Option<u32>) -> Result<(u32, Arc<ManagerPicks>)> {
        let team_id = self.linked_team()?;
        let gameweek = match gameweek {
            Some(gw) => gw,
            None => self
                .snapshot
                .current_gameweek()?
                .ok_or(FplError::NoCurrentGameweek)?,
        };
        let picks = self.snapshot.manager_picks(team_id, gameweek)?;
        Ok((gameweek, picks))
    }

    pub fn squad_risk_profile(&self, gameweek: Option<u32>) -> Result<SquadRiskProfile> {
        info!("squad_risk_profile(gameweek={gameweek:?})");
        let (gameweek, picks) = self.linked_picks(gameweek)?;
        let bootstrap = self.snapshot.bootstrap()?;
        let assessed = assess_picks(
            &self.snapshot,
            &bootstrap,
            &picks.picks,
            self.config.behaviour_window,
        )?;
        Ok(profile_squad(gameweek, &assessed, &bootstrap))
    }

    /// Plans for the linked team's current squad.
    pub fn recommend_transfers(
        &self,
        horizon: Horizon,
        risk: u8,
        allow_hits: Option<bool>,
    ) -> Result<Vec<TransferPlan>> {
        info!("recommend_transfers(horizon={horizon:?}, risk={risk}, allow_hits={allow_hits:?})");
        let (gameweek, picks) = self.linked_picks(None)?;
        let bootstrap = self.snapshot.bootstrap()?;
        let squad: Vec<SquadMember> = picks
            .picks
            .iter()
            .filter_map(|pick| bootstrap.player(pick.player_id))
            .cloned()
            .map(SquadMember::at_market)
            .collect();
        let request = TransferRequest {
            squad,
            bank: picks.entry_history.bank,
            horizon,
            risk,
            allow_hits,
        };
        let fixtures = self.fixture_map(horizon.window(Some(gameweek)), &bootstrap)?;
        Ok(plan_transfers(&request, &bootstrap, &fixtures))
    }

    pub fn suggest_replacements(
        &self,
        name: &str,
        max_price: Price,
        horizon_gws: u32,
        risk: RiskTier,
        limit: usize,
    ) -> Result<ReplacementReport> {
        info!(
            "suggest_replacements(name={name:?}, max_price={max_price}, \
             horizon={horizon_gws}, risk={risk:?}, limit={limit})"
        );
        let bootstrap = self.snapshot.bootstrap()?;
        let out = resolve_player(name, &bootstrap.players)?;
        let current = self.snapshot.current_gameweek()?;

        let squad: HashSet<PlayerId> = match self.linked_picks(current) {
            Ok((_, picks)) => picks.picks.iter().map(|p| p.player_id).collect(),
            Err(err @ (FplError::TeamNotLinked | FplError::NoCurrentGameweek)) => {
                debug!("no squad exclusion: {err}");
                HashSet::new()
            }
            Err(err) => return Err(err),
        };
        let window = GameweekWindow::after(current, horizon_gws.max(1));
        let fixtures = self.fixture_map(window, &bootstrap)?;
        let query = ReplacementQuery {
            max_price,
            horizon_gws: horizon_gws.max(1),
            risk,
            limit,
            squad,
        };
        Ok(find_replacements(out, &bootstrap, &fixtures, &query, |p| {
            self.behaviour_with(p, &bootstrap)
        }))
    }

    /// Every remaining fixture from the gameweek after the current one.
    fn upcoming_fixtures(&self, bootstrap: &Bootstrap) -> Result<FixtureDifficultyMap> {
        let window = GameweekWindow::after(bootstrap.current_gameweek(), SEASON_GAMEWEEKS);
        self.fixture_map(window, bootstrap)
    }

    fn fixture_map(
        &self,
        window: GameweekWindow,
        bootstrap: &Bootstrap,
    ) -> Result<FixtureDifficultyMap> {
        let fixtures = self.snapshot.fixtures(Some(window))?;
        Ok(FixtureDifficultyMap::build(window, &fixtures, bootstrap))
    }
}
