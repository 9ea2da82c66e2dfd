// League-wide insights, the squad report and JSON output files.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fpl_edge_core::fdr::{
    congestion_report, fixture_heatmap, CongestionParams, FdrParams, FixtureHeatmap, TeamCongestion,
};
use fpl_edge_core::market::{price_watch, PriceWatch, PriceWatchParams};
use fpl_edge_core::ranking::vorp::{MAX_HORIZON, MIN_HORIZON};
use fpl_edge_core::ranking::{
    rank_by_vorp, screen_players, PlayerFilter, RankBy, ScreenCriteria, ScreenOutcome, VorpEntry,
    VorpParams,
};
use fpl_edge_core::signal::round_to;
use fpl_edge_core::squad::{
    chip_advice, plan_squad, team_stacks, template_gap, ChipParams, ChipReport, SquadParams,
    SquadPlan, StackParams, StackSuggestion, TemplateGap,
};
use fpl_edge_core::valuation::ValuationWeights;
use fpl_edge_core::{LeagueSnapshot, Player, Position};

use crate::config::{InsightsConfig, SquadConfig};

/// Everything derived from one snapshot beyond the per-player metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueInsights {
    pub generated_at: DateTime<Utc>,
    pub current_gameweek: u32,
    pub heatmap: FixtureHeatmap,
    pub congestion: Vec<TeamCongestion>,
    pub price_watch: PriceWatch,
    pub value_board: Vec<TransferTarget>,
    pub differentials: ScreenOutcome,
}

// ---------------------------------------------------------------------------
// Transfer reasons
// ---------------------------------------------------------------------------

pub const MAX_TRANSFER_REASONS: usize = 3;

/// Why a player sits on the value board. At most three per player, in the
/// order listed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferReason {
    TopValue { position: Position, horizon: u32 },
    KindFixtures { fdr: f64 },
    HighStartChance { percent: u8 },
    StrongXgi { xgi90: f64 },
    Differential { ownership: f64 },
    HotForm { form: f64 },
}

pub fn transfer_reasons(player: &Player, horizon: u32) -> Vec<TransferReason> {
    let s = &player.signals;
    let mut reasons = vec![TransferReason::TopValue {
        position: player.position,
        horizon,
    }];
    if let Some(fdr) = s.fdr_attack_next3.known().filter(|f| *f <= 3.0) {
        reasons.push(TransferReason::KindFixtures { fdr });
    }
    if s.minutes_risk >= 0.8 {
        let percent = (s.minutes_risk.clamp(0.0, 1.0) * 100.0).round() as u8;
        reasons.push(TransferReason::HighStartChance { percent });
    }
    if let Some(xgi90) = s.xgi.xgi90.known().filter(|x| *x >= 0.35) {
        reasons.push(TransferReason::StrongXgi {
            xgi90: round_to(xgi90, 2),
        });
    }
    if let Some(ownership) = player.ownership.known().filter(|o| *o <= 10.0) {
        reasons.push(TransferReason::Differential { ownership });
    }
    if s.form >= 70.0 {
        reasons.push(TransferReason::HotForm {
            form: s.form.round(),
        });
    }
    reasons.truncate(MAX_TRANSFER_REASONS);
    reasons
}

/// A value-board entry with its reasons attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTarget {
    #[serde(flatten)]
    pub entry: VorpEntry,
    pub reasons: Vec<TransferReason>,
}

fn with_reasons(entries: Vec<VorpEntry>, players: &[Player], horizon: u32) -> Vec<TransferTarget> {
    entries
        .into_iter()
        .map(|entry| {
            let reasons = players
                .iter()
                .find(|p| p.id == entry.player_id)
                .map(|p| transfer_reasons(p, horizon))
                .unwrap_or_default();
            TransferTarget { entry, reasons }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

pub fn build_insights(
    snapshot: &LeagueSnapshot,
    players: &[Player],
    now: DateTime<Utc>,
    config: &InsightsConfig,
) -> LeagueInsights {
    let horizon = config.vorp_horizon.clamp(MIN_HORIZON, MAX_HORIZON);
    let vorp = VorpParams {
        horizon,
        ..VorpParams::default()
    };
    let differentials = ScreenCriteria {
        limit: config.differentials_limit,
        ..ScreenCriteria::differentials()
    };

    LeagueInsights {
        generated_at: now,
        current_gameweek: snapshot.current_gameweek(),
        heatmap: fixture_heatmap(snapshot, config.heatmap_horizon, &FdrParams::default()),
        congestion: congestion_report(snapshot, now, &CongestionParams::default()),
        price_watch: price_watch(players, &PriceWatchParams::default()),
        value_board: with_reasons(
            rank_by_vorp(
                players,
                &PlayerFilter::default(),
                &vorp,
                RankBy::Vorp,
                config.vorp_limit,
            ),
            players,
            horizon,
        ),
        differentials: screen_players(players, &differentials),
    }
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadReport {
    pub generated_at: DateTime<Utc>,
    pub current_gameweek: u32,
    /// Absent without a configured squad or when too few of its players
    /// were scored.
    pub plan: Option<SquadPlan>,
    /// Configured ids with no scored player behind them.
    pub unknown_ids: Vec<u32>,
    pub chips: ChipReport,
    pub stacks: Vec<StackSuggestion>,
    pub template: TemplateGap,
}

pub fn build_squad_report(
    players: &[Player],
    current_gameweek: u32,
    now: DateTime<Utc>,
    config: &SquadConfig,
    weights: ValuationWeights,
) -> SquadReport {
    let mut ids: Vec<u32> = Vec::with_capacity(config.player_ids.len());
    for id in &config.player_ids {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    let (squad, unknown_ids): (Vec<u32>, Vec<u32>) = ids
        .iter()
        .partition(|id| players.iter().any(|p| p.id == **id));
    let squad: Vec<Player> = squad
        .iter()
        .filter_map(|id| players.iter().find(|p| p.id == *id).cloned())
        .collect();
    if !unknown_ids.is_empty() {
        warn!(?unknown_ids, "squad ids without scored players");
    }

    let plan = if squad.is_empty() {
        debug!("no squad configured; skipping squad plan");
        None
    } else {
        let params = SquadParams {
            weights,
            ..SquadParams::default()
        };
        match plan_squad(&squad, players, &params) {
            Ok(plan) => Some(plan),
            Err(e) => {
                warn!(error = %e, "squad plan skipped");
                None
            }
        }
    };

    let chips = chip_advice(
        &squad,
        players,
        &ChipParams {
            horizon: config.chip_horizon,
            weights,
            ..ChipParams::default()
        },
    );
    let stacks = team_stacks(
        players,
        &StackParams {
            limit: config.stacks_limit,
            ..StackParams::default()
        },
    );
    let owned: Vec<u32> = squad.iter().map(|p| p.id).collect();

    SquadReport {
        generated_at: now,
        current_gameweek,
        plan,
        unknown_ids,
        chips,
        stacks,
        template: template_gap(players, &owned, config.template_limit),
    }
}

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}
