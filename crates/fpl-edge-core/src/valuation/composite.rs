// Composite expected value.
//
// Three bounded components on a 0-10ish scale (form, xGI, fixture boost)
// are weighted, summed and damped by minutes risk. The damping floor keeps
// a rotation doubt from zeroing out an otherwise strong player.

use serde::{Deserialize, Serialize};

use crate::fdr::NEUTRAL_FDR;
use crate::model::{Player, PlayerSignals};
use crate::signal::round_to;

pub const DEFAULT_W_FORM: f64 = 0.6;
pub const DEFAULT_W_XGI: f64 = 0.4;

/// Minutes-risk floor applied to captain EV.
const EV_MINUTES_FLOOR: f64 = 0.4;
/// Minutes-risk floor applied to transfer projections.
const PROJECTION_MINUTES_FLOOR: f64 = 0.5;

pub const DEFAULT_TRANSFER_HORIZON: u32 = 3;
pub const MAX_TRANSFER_HORIZON: u32 = 6;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationWeights {
    pub w_form: f64,
    pub w_xgi: f64,
}

impl Default for ValuationWeights {
    fn default() -> Self {
        Self {
            w_form: DEFAULT_W_FORM,
            w_xgi: DEFAULT_W_XGI,
        }
    }
}

impl ValuationWeights {
    /// Clamp each weight to [0, 1]; non-finite weights fall back to the
    /// default.
    pub fn sanitized(self) -> Self {
        let fix = |w: f64, default: f64| if w.is_finite() { w.clamp(0.0, 1.0) } else { default };
        Self {
            w_form: fix(self.w_form, DEFAULT_W_FORM),
            w_xgi: fix(self.w_xgi, DEFAULT_W_XGI),
        }
    }
}

// ---------------------------------------------------------------------------
// Expected value
// ---------------------------------------------------------------------------

/// EV with the components that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvBreakdown {
    pub form10: f64,
    pub xgi10: f64,
    pub fixture_boost: f64,
    /// Minutes risk after the EV floor.
    pub minutes_factor: f64,
    /// Weighted sum before minutes damping.
    pub composite: f64,
    /// Rounded to 1 decimal.
    pub ev: f64,
}

fn components(signals: &PlayerSignals, weights: ValuationWeights) -> (f64, f64, f64, f64) {
    let weights = weights.sanitized();
    let form10 = (signals.form / 10.0).clamp(0.0, 10.0);
    let xgi10 = (signals.xgi.xgi90.or(0.0) * 10.0).clamp(0.0, 10.0);
    let fixture_boost = (5.0 - signals.fdr_attack_next3.or(NEUTRAL_FDR)).clamp(0.0, 4.0);
    let composite = weights.w_form * form10 + weights.w_xgi * xgi10 + fixture_boost;
    (form10, xgi10, fixture_boost, composite)
}

/// Captain-style expected value for one player's signals.
///
/// `EV = (wForm·form10 + wXGI·xgi10 + boost) × clamp(risk, 0.4, 1) × 2`.
/// Unknown xGI counts as 0, unknown FDR as 3.
pub fn expected_value(signals: &PlayerSignals, weights: ValuationWeights) -> EvBreakdown {
    let (form10, xgi10, fixture_boost, composite) = components(signals, weights);
    let minutes_factor = signals.minutes_risk.clamp(EV_MINUTES_FLOOR, 1.0);
    EvBreakdown {
        form10,
        xgi10,
        fixture_boost,
        minutes_factor,
        composite,
        ev: round_to(composite * minutes_factor * 2.0, 1),
    }
}

// ---------------------------------------------------------------------------
// Transfer what-if
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferComparison {
    pub out_id: u32,
    pub in_id: u32,
    pub horizon: u32,
    pub projected_out: f64,
    pub projected_in: f64,
    /// `projected_in - projected_out`, 1 decimal.
    pub delta: f64,
}

fn projection(signals: &PlayerSignals, weights: ValuationWeights, horizon: u32) -> f64 {
    let (_, _, _, composite) = components(signals, weights);
    let minutes = signals.minutes_risk.clamp(PROJECTION_MINUTES_FLOOR, 1.0);
    round_to(composite * minutes * horizon as f64, 1)
}

/// Project both players over `horizon` gameweeks (clamped to [1, 6]) and
/// report the gain from swapping `out` for `incoming`.
pub fn transfer_what_if(
    out: &Player,
    incoming: &Player,
    weights: ValuationWeights,
    horizon: u32,
) -> TransferComparison {
    let horizon = horizon.clamp(1, MAX_TRANSFER_HORIZON);
    let projected_out = projection(&out.signals, weights, horizon);
    let projected_in = projection(&incoming.signals, weights, horizon);
    TransferComparison {
        out_id: out.id,
        in_id: incoming.id,
        horizon,
        projected_out,
        projected_in,
        delta: round_to(projected_in - projected_out, 1),
    }
}
