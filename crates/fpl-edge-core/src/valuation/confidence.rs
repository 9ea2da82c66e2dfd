// Confidence score (0-100): how much to trust a player's EV, from minutes
// security, recent volatility and fixture ease.

use serde::{Deserialize, Serialize};

use crate::fdr::NEUTRAL_FDR;
use crate::model::{MatchHistoryEntry, PlayerSignals};
use crate::normalizer::xgi::{entry_involvement_rate, last_played, XGI_WINDOW};
use crate::signal::{round_to, sample_stdev};

/// Points-per-90 standard deviation at which stability bottoms out.
const POINTS_STD_SCALE: f64 = 8.0;
/// Involvement-per-90 standard deviation at which stability bottoms out.
const INVOLVEMENT_STD_SCALE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub confidence: f64,
    pub minutes_safety: f64,
    pub fixture_ease: f64,
    /// `None` when the score came from the no-history formula.
    pub stability: Option<f64>,
    pub points_std: Option<f64>,
    pub involvement_std: Option<f64>,
    /// Per-match points per 90 used for the volatility, 2 decimals.
    pub points_samples: Vec<f64>,
    pub involvement_samples: Vec<f64>,
}

fn stability_of(std: f64, scale: f64) -> f64 {
    1.0 - (std / scale).clamp(0.0, 1.0)
}

fn base_parts(signals: &PlayerSignals) -> (f64, f64) {
    let minutes_safety = signals.minutes_risk.clamp(0.0, 1.0);
    let fixture_ease = ((5.0 - signals.fdr_attack_next3.or(NEUTRAL_FDR)) / 4.0).clamp(0.0, 1.0);
    (minutes_safety, fixture_ease)
}

/// Confidence when no usable history is available (lookup failed, timed out
/// or the player has not played): `100 × (0.7·risk + 0.3·ease)`.
pub fn confidence_without_history(signals: &PlayerSignals) -> ConfidenceBreakdown {
    let (minutes_safety, fixture_ease) = base_parts(signals);
    ConfidenceBreakdown {
        confidence: round_to(100.0 * (0.7 * minutes_safety + 0.3 * fixture_ease), 0),
        minutes_safety,
        fixture_ease,
        stability: None,
        points_std: None,
        involvement_std: None,
        points_samples: Vec::new(),
        involvement_samples: Vec::new(),
    }
}

/// Confidence from the last four played matches.
///
/// Stability is the mean of the points and involvement stabilities, each
/// `1 - clamp(std / scale, 0, 1)`. Falls back to
/// [`confidence_without_history`] when nothing in the history was played.
pub fn confidence_from_history(
    history: &[MatchHistoryEntry],
    signals: &PlayerSignals,
) -> ConfidenceBreakdown {
    let last = last_played(history, XGI_WINDOW);
    if last.is_empty() {
        return confidence_without_history(signals);
    }

    let points: Vec<f64> = last
        .iter()
        .map(|h| h.points as f64 * 90.0 / h.minutes as f64)
        .filter(|v| v.is_finite())
        .collect();
    let involvement: Vec<f64> = last
        .iter()
        .map(|h| entry_involvement_rate(h))
        .filter(|v| v.is_finite())
        .collect();

    let points_std = sample_stdev(&points);
    let involvement_std = sample_stdev(&involvement);
    let stability = 0.5 * stability_of(points_std, POINTS_STD_SCALE)
        + 0.5 * stability_of(involvement_std, INVOLVEMENT_STD_SCALE);

    let (minutes_safety, fixture_ease) = base_parts(signals);
    let confidence = 100.0 * (0.5 * minutes_safety + 0.35 * stability + 0.15 * fixture_ease);

    ConfidenceBreakdown {
        confidence: round_to(confidence, 0),
        minutes_safety,
        fixture_ease,
        stability: Some(round_to(stability, 2)),
        points_std: Some(round_to(points_std, 2)),
        involvement_std: Some(round_to(involvement_std, 2)),
        points_samples: points.iter().map(|v| round_to(*v, 2)).collect(),
        involvement_samples: involvement.iter().map(|v| round_to(*v, 2)).collect(),
    }
}
