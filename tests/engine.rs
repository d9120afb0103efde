mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use fpl_insight::archetype::{Archetype, Tag};
use fpl_insight::fixtures::Horizon;
use fpl_insight::models::{
    LivePoints, ManagerEntry, ManagerGameweek, ManagerHistory, PastSeason, PlayerId, Price,
    TransferRecord,
};
use fpl_insight::optimizer::{PoolEntry, is_legal_squad, is_legal_xi};
use fpl_insight::replacements::RiskTier;
use fpl_insight::snapshot::Snapshot;
use fpl_insight::{Config, FplEngine, FplError};

use common::{StubSource, fixture, history, league, picks_for};

const SQUAD: [PlayerId; 15] = [
    101, 201, 103, 203, 303, 403, 503, 108, 208, 308, 408, 508, 313, 413, 513,
];

fn stub() -> StubSource {
    let boot = league();
    let live = boot
        .players
        .iter()
        .map(|p| LivePoints {
            player_id: p.id,
            points: ((p.id * 11) % 17) as i32,
            minutes: 90,
        })
        .collect();
    let mut source = StubSource::new(boot);
    source
        .histories
        .insert(108, history(&[2, 1, 12, 0, 3, 15, 1, 2, 4, 0]));
    source.fixtures = vec![
        fixture(1, 4, 1, 2, 2, 4),
        fixture(2, 4, 3, 4, 3, 3),
        fixture(3, 4, 5, 6, 5, 2),
        fixture(4, 5, 6, 1, 4, 3),
    ];
    source.picks = Some(picks_for(&SQUAD, 25));
    source.live = live;
    source.entry = Some(ManagerEntry {
        id: 42,
        team_name: "Route One".into(),
        player_first_name: "Sam".into(),
        player_last_name: "Lee".into(),
        summary_overall_points: Some(180),
        summary_overall_rank: Some(120_000),
    });
    source.season = ManagerHistory {
        current: vec![ManagerGameweek {
            gameweek: 1,
            points: 64,
            total_points: 64,
            rank: Some(900_000),
            overall_rank: Some(900_000),
            bank: Price(5),
            value: Price(1000),
            event_transfers: 0,
            event_transfers_cost: 0,
            points_on_bench: 7,
        }],
        past: vec![PastSeason {
            season_name: "2024/25".into(),
            total_points: 2210,
            rank: Some(350_000),
        }],
    };
    source.transfers = vec![TransferRecord {
        element_in: 208,
        element_in_cost: Price(65),
        element_out: 999,
        element_out_cost: Price(60),
        event: Some(2),
        time: None,
    }];
    source
}

fn engine_with(source: Arc<StubSource>, team_id: Option<u32>) -> FplEngine {
    let config = Config {
        team_id,
        ..Config::default()
    };
    let snapshot = Snapshot::new(source, Duration::from_secs(300));
    FplEngine::new(Arc::new(snapshot), config)
}

#[test]
fn classifies_from_history() {
    let engine = engine_with(Arc::new(stub()), None);
    let report = engine.classify_player_archetype("p108").expect("report");
    assert_eq!(report.player.id, 108);
    assert_eq!(report.player.team, "C1");
    assert_eq!(report.archetype, Archetype::BoomOrBust);
    assert_eq!(report.tags, vec![Tag::SemiExplosive, Tag::Nailed]);
    assert_eq!(report.metrics.explosiveness.avg_points, 4.0);
    assert_eq!(report.metrics.explosiveness.max_points, 15);
    assert_eq!(report.metrics.reliability.reliability_score, 100);
    assert!(report.summary.starts_with("P108 is classified as **boom-or-bust**."));
    assert!(report.summary.ends_with("Reliability score: 100/100."));
}

#[test]
fn volatility_uses_the_recent_window() {
    let engine = engine_with(Arc::new(stub()), None);
    let report = engine.volatility_profile("P108", 8).expect("report");
    assert_eq!(report.profile.points_per_gw, vec![12, 0, 3, 15, 1, 2, 4, 0]);
    assert_eq!(report.profile.window_gws, 8);
    assert!(report.profile.volatility_score <= 100);
}

#[test]
fn unknown_names_and_positions_are_typed_errors() {
    let engine = engine_with(Arc::new(stub()), None);
    assert!(matches!(
        engine.classify_player_archetype("Nobody"),
        Err(FplError::PlayerNotFound(_))
    ));
    assert!(matches!(
        engine.best_value("WING", 5),
        Err(FplError::UnknownPosition(_))
    ));
}

#[test]
fn dream_team_is_legal_and_tagged_with_gameweek() {
    let engine = engine_with(Arc::new(stub()), None);
    let team = engine.dream_team(3).expect("team");
    assert_eq!(team.gameweek, Some(3));
    let xi: Vec<PoolEntry> = team.starters.iter().map(|s| s.entry.clone()).collect();
    let mut squad = xi.clone();
    squad.extend(team.bench.iter().map(|s| s.entry.clone()));
    assert!(is_legal_xi(&xi));
    assert!(is_legal_squad(&squad));
}

#[test]
fn squad_operations_need_a_linked_team() {
    let engine = engine_with(Arc::new(stub()), None);
    assert_eq!(
        engine.squad_risk_profile(None).map(|p| p.gameweek),
        Err(FplError::TeamNotLinked)
    );
    assert_eq!(
        engine
            .recommend_transfers(Horizon::Next, 50, None)
            .map(|p| p.len()),
        Err(FplError::TeamNotLinked)
    );
}

#[test]
fn squad_risk_profiles_every_pick() {
    let source = Arc::new(stub());
    let engine = engine_with(source.clone(), Some(42));
    let profile = engine.squad_risk_profile(None).expect("profile");
    assert_eq!(profile.gameweek, 3);
    assert_eq!(profile.per_player.len(), 15);
    assert_eq!(source.history_calls.load(Ordering::SeqCst), 15);
    assert!(profile.summary.club_concentration.iter().all(|c| c.count == 3));
    // only 108 has history; everyone else is unproven
    assert_eq!(profile.summary.high_risk_players.len(), 14);
    assert!(profile.summary.portfolio_notes.contains("Heavy exposure to:"));
    let bench: Vec<PlayerId> = profile
        .per_player
        .iter()
        .filter(|r| r.on_bench)
        .map(|r| r.id)
        .collect();
    assert_eq!(bench, vec![508, 313, 413, 513]);
}

#[test]
fn transfers_plan_against_the_linked_squad() {
    let engine = engine_with(Arc::new(stub()), Some(42));
    let plans = engine
        .recommend_transfers(Horizon::Next, 80, None)
        .expect("plans");
    assert!(!plans.is_empty());
    for plan in &plans {
        for t in &plan.transfers {
            assert!(SQUAD.contains(&t.out_id));
            assert!(!SQUAD.contains(&t.in_id));
        }
        assert!(plan.data_used.contains("GW4-4"));
    }
}

#[test]
fn replacements_skip_squad_and_enrich_lazily() {
    let source = Arc::new(stub());
    let engine = engine_with(source.clone(), Some(42));
    let report = engine
        .suggest_replacements("P108", Price(130), 2, RiskTier::parse("bogus"), 4)
        .expect("report");

    assert_eq!(report.risk_tier, RiskTier::Medium);
    assert_eq!(report.fixture_window, "GW4-5");
    assert_eq!(report.candidates.len(), 4);
    for c in &report.candidates {
        assert!(!SQUAD.contains(&c.id));
        assert!(c.price <= Price(130));
        assert!(c.behaviour.is_some());
    }
    let fetched = source.history_log.lock().expect("log").clone();
    assert_eq!(fetched.len(), 5);
    assert_eq!(fetched[0], 108);
    assert_eq!(
        report.out_player.behaviour.as_ref().map(|b| b.archetype),
        Some(Archetype::BoomOrBust)
    );
}

#[test]
fn replacements_surface_a_failed_squad_fetch() {
    let mut source = stub();
    source.picks = None;
    let engine = engine_with(Arc::new(source), Some(42));
    assert!(matches!(
        engine.suggest_replacements("P108", Price(150), 2, RiskTier::Medium, 20),
        Err(FplError::DataUnavailable(_))
    ));
}

#[test]
fn replacements_without_a_linked_team_search_everyone() {
    let engine = engine_with(Arc::new(stub()), None);
    let report = engine
        .suggest_replacements("P108", Price(150), u32::MAX, RiskTier::Medium, 50)
        .expect("report");
    assert_eq!(report.fixture_window, "GW4-38");
    assert!(report.candidates.iter().any(|c| SQUAD.contains(&c.id)));
}

#[test]
fn upstream_failure_is_data_unavailable() {
    let source = Arc::new(stub());
    source.fail.store(true, Ordering::SeqCst);
    let engine = engine_with(source, None);
    assert!(matches!(
        engine.top_by_form(5),
        Err(FplError::DataUnavailable(_))
    ));
}

#[test]
fn league_scans_rank_descending() {
    let mut source = stub();
    if let Some(p) = source.bootstrap.players.iter_mut().find(|p| p.id == 301) {
        p.goals = 10;
        p.assists = 2;
        p.expected_goal_involvements = 9.0;
        p.minutes = 1800;
    }
    if let Some(p) = source.bootstrap.players.iter_mut().find(|p| p.id == 309) {
        p.goals = 2;
        p.expected_goal_involvements = 4.0;
        p.minutes = 1800;
    }
    let engine = engine_with(Arc::new(source), None);

    let form = engine.top_by_form(5).expect("form");
    assert_eq!(form.len(), 5);
    assert!(form.windows(2).all(|w| w[0].form >= w[1].form));

    let value = engine.best_value("def", 4).expect("value");
    assert_eq!(value.len(), 4);
    assert!(value.windows(2).all(|w| w[0].value >= w[1].value));

    let talismans = engine.find_talismans(10, 900).expect("talismans");
    assert_eq!(talismans[0].id, 301);
    // 12 of 14 involvements, 9 of 13 xGI
    assert_eq!(talismans[0].talisman_index, 0.775);
    assert!(talismans[0].notes.starts_with("outperforming"));
}

#[test]
fn player_details_show_upcoming_and_recent() {
    let engine = engine_with(Arc::new(stub()), None);
    let details = engine.player_details("p108").expect("details");
    assert_eq!(details.id, 108);
    assert_eq!(details.name, "First108 Last108");
    assert_eq!(details.team, "C1");
    let upcoming: Vec<u32> = details.upcoming_fixtures.iter().map(|f| f.gameweek).collect();
    assert_eq!(upcoming, vec![4, 5]);
    let recent: Vec<u32> = details.recent_history.iter().map(|r| r.gameweek).collect();
    assert_eq!(recent, vec![6, 7, 8, 9, 10]);
    assert_eq!(
        engine.player_details("nobody"),
        Err(FplError::PlayerNotFound("nobody".into()))
    );
}

#[test]
fn calendar_and_round_fixtures() {
    let engine = engine_with(Arc::new(stub()), None);
    let info = engine.gameweek_info().expect("info");
    assert_eq!(info.current_gameweek.map(|g| g.id), Some(3));
    assert_eq!(info.next_gameweek.map(|g| g.id), Some(4));

    let rows = engine.fixtures_for_gameweek(4).expect("fixtures");
    let homes: Vec<&str> = rows.iter().map(|r| r.home.as_str()).collect();
    assert_eq!(homes, vec!["C1", "C3", "C5"]);
    assert!(engine.fixtures_for_gameweek(30).expect("empty round").is_empty());
}

#[test]
fn my_team_splits_xi_and_bench() {
    let engine = engine_with(Arc::new(stub()), Some(42));
    let team = engine.my_team(None).expect("team");
    assert_eq!(team.gameweek, 3);
    assert_eq!(team.manager, "Sam Lee");
    assert_eq!(team.team_name, "Route One");
    assert_eq!(team.bank, Price(25));
    assert_eq!(team.starters.len(), 11);
    let bench: Vec<PlayerId> = team.bench.iter().map(|s| s.id).collect();
    assert_eq!(bench, vec![508, 313, 413, 513]);

    let captain = &team.starters[0];
    assert_eq!(captain.id, 101);
    assert!(captain.is_captain);
    assert_eq!(captain.next_fixture, "C2(H)");
    assert!(team.starters[1].is_vice_captain);
    assert_eq!(team.starters.iter().filter(|s| s.is_captain).count(), 1);
}

#[test]
fn manager_history_and_transfer_log() {
    let engine = engine_with(Arc::new(stub()), Some(42));
    let season = engine.season_history().expect("season");
    assert_eq!(season.current.len(), 1);
    assert_eq!(season.past[0].season_name, "2024/25");

    let log = engine.transfer_history().expect("transfers");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].player_in, "P208");
    assert_eq!(log[0].player_out, "id:999");
    assert_eq!(log[0].price_in, Price(65));
}

#[test]
fn manager_views_need_a_linked_team() {
    let engine = engine_with(Arc::new(stub()), None);
    assert_eq!(engine.my_team(None).map(|t| t.gameweek), Err(FplError::TeamNotLinked));
    assert_eq!(
        engine.season_history().map(|h| h.current.len()),
        Err(FplError::TeamNotLinked)
    );
    assert_eq!(
        engine.transfer_history().map(|l| l.len()),
        Err(FplError::TeamNotLinked)
    );
}
