// Chip timing heuristics: Triple Captain, Bench Boost and Wildcard.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Player;
use crate::ranking::tie_break;
use crate::signal::round_to;
use crate::squad::start_score;
use crate::valuation::{expected_value, ValuationWeights};

pub const MIN_CHIP_HORIZON: u32 = 1;
pub const MAX_CHIP_HORIZON: u32 = 6;

/// FDR assumed for a Triple Captain pick with no known fixtures.
const TRIPLE_CAPTAIN_UNKNOWN_FDR: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipParams {
    /// Gameweeks looked ahead, clamped to [1, 6]. Reported only.
    pub horizon: u32,
    pub weights: ValuationWeights,
    /// Minutes-risk floor for the Triple Captain pool.
    pub captain_pool_min_risk: f64,
    pub triple_captain_min_ev: f64,
    pub triple_captain_max_fdr: f64,
    pub triple_captain_min_risk: f64,
    pub bench_boost_min_risk: f64,
    pub bench_boost_min_players: usize,
    pub wildcard_max_avg_start: f64,
    /// Start score below which a player counts towards the Wildcard.
    pub wildcard_weak_start: f64,
    pub wildcard_min_weak: usize,
}

impl Default for ChipParams {
    fn default() -> Self {
        Self {
            horizon: 3,
            weights: ValuationWeights::default(),
            captain_pool_min_risk: 0.75,
            triple_captain_min_ev: 6.5,
            triple_captain_max_fdr: 3.0,
            triple_captain_min_risk: 0.85,
            bench_boost_min_risk: 0.70,
            bench_boost_min_players: 14,
            wildcard_max_avg_start: 0.50,
            wildcard_weak_start: 0.45,
            wildcard_min_weak: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chip", rename_all = "snake_case")]
pub enum ChipAdvice {
    TripleCaptain {
        player_id: u32,
        name: String,
        ev: f64,
        fdr: f64,
        /// Minutes risk as a whole percentage.
        start_chance: u8,
    },
    BenchBoost {
        secure_players: usize,
    },
    Wildcard {
        avg_start_score: f64,
        weak_players: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipReport {
    pub horizon: u32,
    pub recommendations: Vec<ChipAdvice>,
}

fn triple_captain(squad: &[Player], pool: &[Player], params: &ChipParams) -> Option<ChipAdvice> {
    let weights = params.weights.sanitized();
    let source = if squad.is_empty() { pool } else { squad };
    let (ev, top) = source
        .iter()
        .filter(|p| p.signals.minutes_risk >= params.captain_pool_min_risk)
        .map(|p| (expected_value(&p.signals, weights).ev, p))
        .min_by(|(a_ev, a), (b_ev, b)| {
            b_ev.partial_cmp(a_ev)
                .unwrap_or(Ordering::Equal)
                .then_with(|| tie_break(a, b))
        })?;

    let fdr = top.signals.fdr_attack_next3.or(TRIPLE_CAPTAIN_UNKNOWN_FDR);
    let risk = top.signals.minutes_risk;
    if ev >= params.triple_captain_min_ev
        && fdr <= params.triple_captain_max_fdr
        && risk >= params.triple_captain_min_risk
    {
        Some(ChipAdvice::TripleCaptain {
            player_id: top.id,
            name: top.name.clone(),
            ev,
            fdr,
            start_chance: (risk.clamp(0.0, 1.0) * 100.0).round() as u8,
        })
    } else {
        None
    }
}

fn bench_boost(squad: &[Player], params: &ChipParams) -> Option<ChipAdvice> {
    let secure = squad
        .iter()
        .filter(|p| p.signals.minutes_risk >= params.bench_boost_min_risk)
        .count();
    (squad.len() >= params.bench_boost_min_players && secure >= params.bench_boost_min_players)
        .then_some(ChipAdvice::BenchBoost {
            secure_players: secure,
        })
}

fn wildcard(squad: &[Player], params: &ChipParams) -> Option<ChipAdvice> {
    if squad.is_empty() {
        return None;
    }
    let scores: Vec<f64> = squad.iter().map(|p| start_score(&p.signals)).collect();
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    let weak = scores.iter().filter(|s| **s < params.wildcard_weak_start).count();
    (avg < params.wildcard_max_avg_start && weak >= params.wildcard_min_weak).then(|| {
        ChipAdvice::Wildcard {
            avg_start_score: round_to(avg, 3),
            weak_players: weak,
        }
    })
}

/// Chip suggestions for a squad. With an empty squad only the Triple
/// Captain check runs, over the whole pool.
pub fn chip_advice(squad: &[Player], pool: &[Player], params: &ChipParams) -> ChipReport {
    let recommendations = [
        triple_captain(squad, pool, params),
        bench_boost(squad, params),
        wildcard(squad, params),
    ]
    .into_iter()
    .flatten()
    .collect();

    ChipReport {
        horizon: params.horizon.clamp(MIN_CHIP_HORIZON, MAX_CHIP_HORIZON),
        recommendations,
    }
}
