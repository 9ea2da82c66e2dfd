// Match-history normalizer: turns a player's raw match records into the
// bounded form, rotation-risk and xGI signals.

pub mod form;
pub mod minutes;
pub mod xgi;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Availability, MatchHistoryEntry, XgiRates};

pub use form::{compute_form, FORM_WINDOW};
pub use minutes::{availability_multiplier, compute_minutes_risk, is_congested, MinutesRiskParams};
pub use xgi::{compute_xgi_rates, entry_involvement_rate, XGI_WINDOW};

/// Window sizes and risk tunables for one normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerParams {
    pub form_window: usize,
    pub xgi_window: usize,
    pub minutes: MinutesRiskParams,
}

impl Default for NormalizerParams {
    fn default() -> Self {
        Self {
            form_window: FORM_WINDOW,
            xgi_window: XGI_WINDOW,
            minutes: MinutesRiskParams::default(),
        }
    }
}

/// History-derived signals for one player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedHistory {
    pub form: f64,
    pub minutes_risk: f64,
    pub xgi: XgiRates,
}

/// Run every history-based signal for one player.
///
/// `kickoffs` are the team's upcoming kickoffs in ascending order and `now`
/// anchors the congestion lookahead.
pub fn normalize_history(
    history: &[MatchHistoryEntry],
    availability: &Availability,
    kickoffs: &[DateTime<Utc>],
    now: DateTime<Utc>,
    params: &NormalizerParams,
) -> NormalizedHistory {
    NormalizedHistory {
        form: compute_form(history, params.form_window),
        minutes_risk: compute_minutes_risk(history, availability, kickoffs, now, &params.minutes),
        xgi: compute_xgi_rates(history, params.xgi_window),
    }
}
