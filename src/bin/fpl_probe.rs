use anyhow::{Context, Result, bail};
use env_logger::Env;
use serde::Serialize;

use fpl_insight::fixtures::Horizon;
use fpl_insight::insights::DEFAULT_TALISMAN_MINUTES;
use fpl_insight::metrics::DEFAULT_VOLATILITY_WINDOW;
use fpl_insight::models::Price;
use fpl_insight::replacements::RiskTier;
use fpl_insight::{Config, FplEngine};

const USAGE: &str = "usage: fpl_probe <player NAME | gameweek | fixtures GW | team [GW] \
                     | season | my-transfers | archetype NAME | volatility NAME [W] \
                     | talismans [N] | form [N] | value POS [N] | dream GW | risk [GW] \
                     | transfers [1gw|5gw] [RISK] \
                     | replace NAME MAX_PRICE [GWS] [low|medium|high]>";

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };
    let arg = |i: usize| args.get(i).map(String::as_str);
    let num = |i: usize, default: usize| arg(i).and_then(|v| v.parse().ok()).unwrap_or(default);

    let engine = FplEngine::from_config(Config::from_env())?;
    match command.as_str() {
        "player" => print(&engine.player_details(arg(1).context(USAGE)?)?),
        "gameweek" => print(&engine.gameweek_info()?),
        "fixtures" => {
            let gw = arg(1).and_then(|v| v.parse().ok()).context(USAGE)?;
            print(&engine.fixtures_for_gameweek(gw)?)
        }
        "team" => print(&engine.my_team(arg(1).and_then(|v| v.parse().ok()))?),
        "season" => print(&engine.season_history()?),
        "my-transfers" => print(&engine.transfer_history()?),
        "archetype" => print(&engine.classify_player_archetype(arg(1).context(USAGE)?)?),
        "volatility" => print(&engine.volatility_profile(
            arg(1).context(USAGE)?,
            num(2, DEFAULT_VOLATILITY_WINDOW),
        )?),
        "talismans" => print(&engine.find_talismans(num(1, 15), DEFAULT_TALISMAN_MINUTES)?),
        "form" => print(&engine.top_by_form(num(1, 10))?),
        "value" => print(&engine.best_value(arg(1).unwrap_or("MID"), num(2, 10))?),
        "dream" => {
            let gw = arg(1).and_then(|v| v.parse().ok()).context(USAGE)?;
            print(&engine.dream_team(gw)?)
        }
        "risk" => print(&engine.squad_risk_profile(arg(1).and_then(|v| v.parse().ok()))?),
        "transfers" => {
            let horizon = Horizon::parse(arg(1).unwrap_or("1gw"));
            let risk = arg(2).and_then(|v| v.parse().ok()).unwrap_or(50);
            print(&engine.recommend_transfers(horizon, risk, None)?)
        }
        "replace" => {
            let name = arg(1).context(USAGE)?;
            let max_price: f64 = arg(2)
                .and_then(|v| v.parse().ok())
                .context("MAX_PRICE must be a number in millions, e.g. 7.5")?;
            let gws = arg(3).and_then(|v| v.parse().ok()).unwrap_or(3);
            let tier = RiskTier::parse(arg(4).unwrap_or("medium"));
            print(&engine.suggest_replacements(
                name,
                Price::from_millions(max_price),
                gws,
                tier,
                10,
            )?)
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
