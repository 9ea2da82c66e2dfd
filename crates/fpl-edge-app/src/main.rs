// fpl-edge entry point.
//
// One ingestion cycle per run:
// 1. Initialize tracing (stderr)
// 2. Load config
// 3. Fetch league data, build the snapshot and per-player metrics
// 4. League insights (heatmap, congestion, price watch, value board)
// 5. Captain suggestions and simulation
// 6. Squad plan, chips, stacks and template
// 7. Write JSON reports

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use fpl_edge_app::captain::{self, CaptainParams, CaptainReport};
use fpl_edge_app::config;
use fpl_edge_app::ingest::{self, IngestOptions};
use fpl_edge_app::report;
use fpl_edge_app::upstream::HttpLeagueSource;
use fpl_edge_core::simulator::SimulationConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Tracing
    init_tracing()?;
    info!("fpl-edge starting up");

    // 2. Config
    let config = config::load_config().context("failed to load configuration")?;
    info!(base_url = %config.upstream.base_url, "config loaded");

    let source = HttpLeagueSource::new(&config.upstream).context("failed to build HTTP client")?;
    let options = IngestOptions::from_config(&config.ingest);
    let now = Utc::now();

    // 3. Metrics
    let outcome = ingest::run_ingest(&source, &options, now)
        .await
        .context("ingestion failed")?;
    let players = &outcome.report.players;

    // 4. Insights
    let insights = report::build_insights(&outcome.snapshot, players, now, &config.insights);

    // 5. Captaincy
    let params = CaptainParams::from_config(&config.captain, config.valuation.weights());
    let picks = captain::suggest_captains(players, &outcome.histories, &params);

    let sim_config = SimulationConfig {
        trials: config.simulation.trials,
        seed: config.simulation.seed,
        ..SimulationConfig::default()
    };
    let simulation = if picks.is_empty() {
        warn!("no captain picks; skipping simulation");
        Vec::new()
    } else {
        captain::simulate_picks(&picks, players, config.simulation.candidates, &sim_config)
            .context("captaincy simulation failed")?
    };

    let captain_report = CaptainReport {
        generated_at: now,
        current_gameweek: outcome.report.current_gameweek,
        picks,
        simulation,
    };

    // 6. Squad
    let squad_report = report::build_squad_report(
        players,
        outcome.report.current_gameweek,
        now,
        &config.squad,
        config.valuation.weights(),
    );

    // 7. Output
    report::write_json(Path::new(&config.output.metrics_path), &outcome.report)?;
    report::write_json(Path::new(&config.output.insights_path), &insights)?;
    report::write_json(Path::new(&config.output.captain_path), &captain_report)?;
    report::write_json(Path::new(&config.output.squad_path), &squad_report)?;

    info!(
        gameweek = outcome.report.current_gameweek,
        players = outcome.report.count,
        "fpl-edge finished"
    );
    Ok(())
}

/// Initialize tracing to stderr so stdout stays clean for piping.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("fpl_edge_app=info,fpl_edge_core=info,warn")
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
