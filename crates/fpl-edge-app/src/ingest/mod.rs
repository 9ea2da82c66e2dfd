// Ingestion pipeline: upstream records in, a strict snapshot and the
// per-player metrics report out.
//
// bootstrap + fixtures -> LeagueSnapshot -> preselection -> batched history
// lookups -> per-player signals -> MetricsReport.

pub mod batch;

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fpl_edge_core::fdr::{attack_fdr_next_n, FdrParams};
use fpl_edge_core::normalizer::{normalize_history, NormalizerParams};
use fpl_edge_core::signal::round_to;
use fpl_edge_core::{
    LeagueSnapshot, MatchHistoryEntry, Player, PlayerSignals, Signal, Team,
};

use crate::config::IngestConfig;
use crate::upstream::{LeagueSource, RawBootstrap, RawElement, UpstreamError};

pub use batch::{process_in_batches, BatchPolicy};

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub batch: BatchPolicy,
    pub max_players: usize,
    pub min_total_minutes: u32,
    pub fdr: FdrParams,
    pub normalizer: NormalizerParams,
}

impl IngestOptions {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            batch: BatchPolicy {
                batch_size: config.batch_size,
                pause: config.batch_pause(),
                item_timeout: config.history_timeout(),
            },
            max_players: config.max_players,
            min_total_minutes: config.min_total_minutes,
            fdr: FdrParams {
                fixtures: config.fdr_fixtures,
                ..FdrParams::default()
            },
            normalizer: NormalizerParams::default(),
        }
    }
}

/// Output of one ingestion cycle, written to disk as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub generated_at: DateTime<Utc>,
    pub current_gameweek: u32,
    pub count: usize,
    /// Players whose history lookup failed and were scored without it.
    pub missing_history: usize,
    pub players: Vec<Player>,
}

/// Everything one cycle produced. The snapshot is kept for downstream
/// consumers (captaincy, heatmap) that need fixtures as well as players.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub snapshot: LeagueSnapshot,
    pub report: MetricsReport,
    /// Match histories by player id. Players whose lookup failed or timed
    /// out have no entry.
    pub histories: HashMap<u32, Vec<MatchHistoryEntry>>,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Fetch bootstrap and fixtures concurrently and validate them into a
/// snapshot.
pub async fn load_snapshot(source: &dyn LeagueSource) -> Result<(RawBootstrap, LeagueSnapshot)> {
    let (bootstrap, fixtures) = tokio::try_join!(source.bootstrap(), source.fixtures())
        .context("failed to fetch league data")?;

    let teams: Vec<Team> = bootstrap.teams.iter().map(|t| t.to_team()).collect();
    let fixtures = fixtures.iter().map(|f| f.to_fixture()).collect();
    let gameweek = bootstrap.current_gameweek();

    let snapshot = LeagueSnapshot::new(teams, fixtures, gameweek)
        .context("upstream data failed snapshot validation")?;
    info!(
        teams = snapshot.teams().len(),
        fixtures = snapshot.fixtures().len(),
        gameweek,
        "league snapshot built"
    );
    Ok((bootstrap, snapshot))
}

// ---------------------------------------------------------------------------
// Preselection
// ---------------------------------------------------------------------------

/// Cheap pre-ranking from bootstrap fields alone:
/// `provider form × 2 + min(minutes / 90, 5) − ownership × 0.05`.
pub fn preselect_score(element: &RawElement) -> f64 {
    let form = element.form.unwrap_or(0.0);
    let appearances = (element.minutes as f64 / 90.0).min(5.0);
    let ownership = element.ownership().or(0.0);
    form * 2.0 + appearances - ownership * 0.05
}

/// Players with at least `min_total_minutes` season minutes and a known
/// position, best `max_players` by preselect score (ties by id).
pub fn preselect(
    elements: &[RawElement],
    min_total_minutes: u32,
    max_players: usize,
) -> Vec<&RawElement> {
    let mut scored: Vec<(f64, &RawElement)> = elements
        .iter()
        .filter(|e| e.minutes >= min_total_minutes)
        .filter(|e| e.position().is_some())
        .map(|e| (preselect_score(e), e))
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.id.cmp(&b.1.id))
    });
    scored.truncate(max_players);
    scored.into_iter().map(|(_, e)| e).collect()
}

// ---------------------------------------------------------------------------
// Per-player signals
// ---------------------------------------------------------------------------

/// Build one player record with every derived signal.
pub fn build_player(
    element: &RawElement,
    bootstrap: &RawBootstrap,
    snapshot: &LeagueSnapshot,
    history: &[MatchHistoryEntry],
    now: DateTime<Utc>,
    options: &IngestOptions,
) -> Option<Player> {
    let position = element.position()?;
    let availability = element.availability();
    let kickoffs = snapshot.schedule_for(element.team).kickoffs();

    let normalized = normalize_history(history, &availability, &kickoffs, now, &options.normalizer);
    let fdr = attack_fdr_next_n(snapshot, element.team, &options.fdr);

    Some(Player {
        id: element.id,
        name: element.web_name.clone(),
        team_id: element.team,
        team_name: bootstrap.team_name(element.team),
        position,
        price_tenths: element.now_cost,
        ownership: element.ownership(),
        availability,
        signals: PlayerSignals {
            form: normalized.form,
            minutes_risk: normalized.minutes_risk,
            fdr_attack_next3: Signal::Known(fdr),
            xgi: normalized.xgi,
            momentum: round_to(element.net_transfers() as f64 / 1000.0, 2),
            price_change_event: element.cost_change_event,
        },
    })
}

/// Fetch histories for `ids` through the batched lookup. Failed lookups are
/// returned separately so callers can degrade just those players.
pub async fn fetch_histories(
    source: &dyn LeagueSource,
    ids: &[u32],
    policy: BatchPolicy,
) -> (HashMap<u32, Vec<MatchHistoryEntry>>, Vec<(u32, UpstreamError)>) {
    let results = process_in_batches(ids, policy, |id| source.player_history(id)).await;

    let mut histories = HashMap::with_capacity(results.len());
    let mut failures = Vec::new();
    for (id, outcome) in results {
        match outcome {
            Ok(history) => {
                histories.insert(id, history);
            }
            Err(e) => failures.push((id, e)),
        }
    }
    (histories, failures)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run one full ingestion cycle. `now` anchors the congestion lookahead and
/// stamps the report.
pub async fn run_ingest(
    source: &dyn LeagueSource,
    options: &IngestOptions,
    now: DateTime<Utc>,
) -> Result<IngestOutcome> {
    let (bootstrap, snapshot) = load_snapshot(source).await?;

    let selected = preselect(&bootstrap.elements, options.min_total_minutes, options.max_players);
    info!(
        pool = bootstrap.elements.len(),
        selected = selected.len(),
        "players preselected"
    );

    let ids: Vec<u32> = selected.iter().map(|e| e.id).collect();
    let (histories, failures) = fetch_histories(source, &ids, options.batch).await;
    if !failures.is_empty() {
        warn!(
            failed = failures.len(),
            "history lookups failed; those players are scored without history"
        );
    }

    let players: Vec<Player> = selected
        .iter()
        .filter_map(|element| {
            let history = histories.get(&element.id).map(Vec::as_slice).unwrap_or(&[]);
            build_player(element, &bootstrap, &snapshot, history, now, options)
        })
        .collect();
    debug!(players = players.len(), "signals computed");

    let report = MetricsReport {
        generated_at: now,
        current_gameweek: snapshot.current_gameweek(),
        count: players.len(),
        missing_history: failures.len(),
        players,
    };
    info!(
        gameweek = report.current_gameweek,
        players = report.count,
        "metrics report ready"
    );

    Ok(IngestOutcome {
        snapshot,
        report,
        histories,
    })
}
