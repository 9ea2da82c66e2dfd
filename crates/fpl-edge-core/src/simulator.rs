// Monte Carlo captaincy simulator.
//
// Each candidate's attacking involvements per match are modelled as
// Poisson(λ); each involvement is a goal or an assist. Trials produce a
// points distribution summarised by mean, sample standard deviation and the
// probability of reaching a haul threshold.
//
// Candidates are independent and run in parallel. Each candidate draws from
// its own generator seeded from the base seed and the candidate's id, so a
// seeded run gives the same numbers regardless of thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::fdr::NEUTRAL_FDR;
use crate::model::{Player, PlayerSignals};

pub const MIN_TRIALS: usize = 1_000;
pub const MAX_TRIALS: usize = 20_000;
pub const DEFAULT_TRIALS: usize = 10_000;

/// Floor on λ so a candidate never has a zero-width distribution.
const MIN_LAMBDA: f64 = 0.05;
/// Ceiling on λ; keeps the per-trial sampling loop short.
const MAX_LAMBDA: f64 = 10.0;
/// Minutes risk floor inside λ.
const LAMBDA_MINUTES_FLOOR: f64 = 0.5;
/// λ change per FDR step away from neutral.
const LAMBDA_FDR_SLOPE: f64 = 0.12;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Poisson rate of attacking involvements for one match.
///
/// `λ = max(0.05, xGI90 × max(0.5, risk) × (1 + (3 − fdr) × 0.12))`, with
/// unknown xGI as 0 and unknown FDR as 3.
pub fn poisson_rate(signals: &PlayerSignals) -> f64 {
    let xgi = signals.xgi.xgi90.or(0.0);
    let minutes = signals.minutes_risk.max(LAMBDA_MINUTES_FLOOR);
    let fdr = signals.fdr_attack_next3.or(NEUTRAL_FDR);
    let fixture = 1.0 + (NEUTRAL_FDR - fdr) * LAMBDA_FDR_SLOPE;
    (xgi * minutes * fixture).max(MIN_LAMBDA)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptaincyCandidate {
    pub player_id: u32,
    pub name: String,
    pub lambda: f64,
}

impl CaptaincyCandidate {
    pub fn from_player(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            lambda: poisson_rate(&player.signals),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Clamped to [1000, 20000].
    pub trials: usize,
    /// Fixed seed for reproducible runs; `None` draws one from entropy.
    pub seed: Option<u64>,
    pub goal_points: f64,
    pub assist_points: f64,
    /// Probability that an involvement is a goal.
    pub goal_share: f64,
    /// Haul threshold for the tail probability.
    pub threshold: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            goal_points: 5.0,
            assist_points: 3.0,
            goal_share: 0.6,
            threshold: 10.0,
        }
    }
}

impl SimulationConfig {
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.trials = self.trials.clamp(MIN_TRIALS, MAX_TRIALS);
        if !self.goal_share.is_finite() {
            self.goal_share = defaults.goal_share;
        }
        self.goal_share = self.goal_share.clamp(0.0, 1.0);
        if !self.goal_points.is_finite() {
            self.goal_points = defaults.goal_points;
        }
        if !self.assist_points.is_finite() {
            self.assist_points = defaults.assist_points;
        }
        if !self.threshold.is_finite() {
            self.threshold = defaults.threshold;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub player_id: u32,
    pub name: String,
    pub lambda: f64,
    /// Mean points per trial.
    pub ev: f64,
    /// Sample standard deviation of points per trial.
    pub sd: f64,
    /// Share of trials at or above the threshold.
    pub p_threshold: f64,
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Knuth's Poisson sampler: multiply uniforms until the running product
/// falls to e^-λ or below. A non-finite or non-positive λ draws 0.
pub fn sample_poisson<R: Rng + ?Sized>(lambda: f64, rng: &mut R) -> u32 {
    if !lambda.is_finite() || lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut k: u32 = 0;
    let mut product = 1.0;
    loop {
        k += 1;
        product *= rng.gen::<f64>();
        if product <= limit {
            return k - 1;
        }
    }
}

/// λ as simulated: non-finite rates fall back to the floor, the rest are
/// clamped to [0.05, 10].
pub fn effective_lambda(lambda: f64) -> f64 {
    if lambda.is_finite() {
        lambda.clamp(MIN_LAMBDA, MAX_LAMBDA)
    } else {
        MIN_LAMBDA
    }
}

/// Seed for one candidate's stream, mixed so neighbouring ids diverge.
fn candidate_seed(base: u64, player_id: u32) -> u64 {
    let mut z = base ^ (player_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn simulate_one(candidate: &CaptaincyCandidate, config: &SimulationConfig, base_seed: u64) -> SimulationResult {
    let mut rng = StdRng::seed_from_u64(candidate_seed(base_seed, candidate.player_id));
    let trials = config.trials;
    let lambda = effective_lambda(candidate.lambda);

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut hauls = 0usize;

    for _ in 0..trials {
        let involvements = sample_poisson(lambda, &mut rng);
        let mut points = 0.0;
        for _ in 0..involvements {
            points += if rng.gen::<f64>() < config.goal_share {
                config.goal_points
            } else {
                config.assist_points
            };
        }
        sum += points;
        sum_sq += points * points;
        if points >= config.threshold {
            hauls += 1;
        }
    }

    let n = trials as f64;
    let mean = sum / n;
    let variance = if trials > 1 {
        ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0)
    } else {
        0.0
    };

    SimulationResult {
        player_id: candidate.player_id,
        name: candidate.name.clone(),
        lambda,
        ev: mean,
        sd: variance.sqrt(),
        p_threshold: hauls as f64 / n,
    }
}

/// Simulate every candidate and return results sorted by EV descending
/// (ties by player id).
pub fn simulate_captaincy(
    candidates: &[CaptaincyCandidate],
    config: &SimulationConfig,
) -> Result<Vec<SimulationResult>, EngineError> {
    if candidates.is_empty() {
        return Err(EngineError::NoCandidates);
    }
    let config = config.clone().sanitized();
    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());

    let mut results: Vec<SimulationResult> = candidates
        .par_iter()
        .map(|c| simulate_one(c, &config, base_seed))
        .collect();

    results.sort_by(|a, b| {
        b.ev.partial_cmp(&a.ev)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    debug!(
        candidates = results.len(),
        trials = config.trials,
        seeded = config.seed.is_some(),
        "captaincy simulation complete"
    );
    Ok(results)
}
