// Price watch: which players look likely to rise or fall in price, judged
// by transfer momentum against absolute and percentile thresholds.

use serde::{Deserialize, Serialize};

use crate::model::Player;
use crate::signal::round_to;

/// Score bonus for a price change already made this gameweek.
const PRICE_EVENT_BONUS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceWatchParams {
    /// Total rows across risers and fallers, clamped to [1, 200].
    pub limit: usize,
    /// Absolute momentum (per 1,000 managers) that flags a move.
    pub min_momentum: f64,
    /// Ownership floor in percent; unknown ownership counts as 0.
    pub min_ownership: f64,
    pub rise_percentile: f64,
    pub fall_percentile: f64,
    /// The percentile thresholds never get looser than ±this value.
    pub percentile_guard: f64,
}

impl Default for PriceWatchParams {
    fn default() -> Self {
        Self {
            limit: 40,
            min_momentum: 5.0,
            min_ownership: 0.0,
            rise_percentile: 85.0,
            fall_percentile: 15.0,
            percentile_guard: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFlags {
    pub player_id: u32,
    pub name: String,
    pub team_name: String,
    pub momentum: f64,
    pub price_change_event: i32,
    pub ownership: f64,
    pub rise_risk: bool,
    pub fall_risk: bool,
    pub score_up: f64,
    pub score_down: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceWatch {
    pub risers: Vec<PriceFlags>,
    pub fallers: Vec<PriceFlags>,
    pub p85: f64,
    pub p15: f64,
}

/// Value at index `floor(p / 100 × n)` of the ascending values, clamped to
/// the last index. Zero for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((p / 100.0) * sorted.len() as f64).floor().max(0.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn by_desc<F: Fn(&PriceFlags) -> f64>(key: F) -> impl Fn(&PriceFlags, &PriceFlags) -> std::cmp::Ordering {
    move |a: &PriceFlags, b: &PriceFlags| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.player_id.cmp(&b.player_id))
    }
}

/// Flag likely risers and fallers.
///
/// Risers fill `ceil(limit / 2)` rows by up score, fallers `floor(limit / 2)`
/// by down score. A side with no flagged players falls back to raw momentum
/// order so the watch list is never blank while players exist.
pub fn price_watch(players: &[Player], params: &PriceWatchParams) -> PriceWatch {
    let limit = params.limit.clamp(1, 200);
    let pool: Vec<&Player> = players
        .iter()
        .filter(|p| p.ownership.or(0.0) >= params.min_ownership)
        .collect();

    let momenta: Vec<f64> = pool
        .iter()
        .map(|p| p.signals.momentum)
        .filter(|m| m.is_finite())
        .collect();
    let p85 = percentile(&momenta, params.rise_percentile);
    let p15 = percentile(&momenta, params.fall_percentile);
    let rise_perc = p85.max(params.percentile_guard);
    let fall_perc = p15.min(-params.percentile_guard);

    let flags: Vec<PriceFlags> = pool
        .iter()
        .map(|p| {
            let m = p.signals.momentum;
            let pc = p.signals.price_change_event;
            let own = p.ownership.or(0.0);
            PriceFlags {
                player_id: p.id,
                name: p.name.clone(),
                team_name: p.team_name.clone(),
                momentum: round_to(m, 2),
                price_change_event: pc,
                ownership: own,
                rise_risk: m >= params.min_momentum || m >= rise_perc || pc > 0,
                fall_risk: m <= -params.min_momentum || m <= fall_perc || pc < 0,
                score_up: m + if pc > 0 { PRICE_EVENT_BONUS } else { 0.0 } + own / 10.0,
                score_down: -m + if pc < 0 { PRICE_EVENT_BONUS } else { 0.0 } + own / 10.0,
            }
        })
        .collect();

    let rise_rows = limit.div_ceil(2);
    let fall_rows = limit / 2;

    let mut risers: Vec<PriceFlags> = flags.iter().filter(|f| f.rise_risk).cloned().collect();
    if risers.is_empty() {
        risers = flags.clone();
        risers.sort_by(by_desc(|f| f.momentum));
    } else {
        risers.sort_by(by_desc(|f| f.score_up));
    }
    risers.truncate(rise_rows);

    let mut fallers: Vec<PriceFlags> = flags.iter().filter(|f| f.fall_risk).cloned().collect();
    if fallers.is_empty() {
        fallers = flags;
        fallers.sort_by(by_desc(|f| -f.momentum));
    } else {
        fallers.sort_by(by_desc(|f| f.score_down));
    }
    fallers.truncate(fall_rows);

    PriceWatch {
        risers,
        fallers,
        p85,
        p15,
    }
}
