// Minutes / rotation risk: probability-like 0-1 score of meaningful playing
// time next match. Higher is safer.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Availability, AvailabilityStatus, MatchHistoryEntry};
use crate::signal::round_to;

/// Tunables for the rotation-risk heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct MinutesRiskParams {
    /// Trailing entries considered (zero-minute entries included).
    pub window: usize,
    /// Minutes at or above which an appearance counts as a start.
    pub starter_minutes: u32,
    pub starter_weight: f64,
    pub played_weight: f64,
    /// Multiplier for injured, suspended, unavailable or 0% chance.
    pub unavailable_multiplier: f64,
    /// Multiplier for doubtful or a chance below `doubtful_chance_below`.
    pub doubtful_multiplier: f64,
    pub doubtful_chance_below: u8,
    /// Upcoming kickoffs beyond this many days are ignored for congestion.
    pub congestion_lookahead_days: i64,
    /// Two kickoffs closer than this many days count as congested.
    pub congestion_gap_days: f64,
    pub congestion_multiplier: f64,
}

impl Default for MinutesRiskParams {
    fn default() -> Self {
        Self {
            window: 6,
            starter_minutes: 60,
            starter_weight: 0.7,
            played_weight: 0.3,
            unavailable_multiplier: 0.2,
            doubtful_multiplier: 0.6,
            doubtful_chance_below: 75,
            congestion_lookahead_days: 10,
            congestion_gap_days: 3.0,
            congestion_multiplier: 0.9,
        }
    }
}

/// Multiplier derived from the provider's availability status.
pub fn availability_multiplier(availability: &Availability, params: &MinutesRiskParams) -> f64 {
    let chance = availability.chance_next_round;
    match availability.status {
        AvailabilityStatus::Injured
        | AvailabilityStatus::Suspended
        | AvailabilityStatus::Unavailable => params.unavailable_multiplier,
        _ if chance == Some(0) => params.unavailable_multiplier,
        AvailabilityStatus::Doubtful => params.doubtful_multiplier,
        _ if chance.is_some_and(|c| c < params.doubtful_chance_below) => params.doubtful_multiplier,
        _ => 1.0,
    }
}

/// Whether any two kickoffs inside the lookahead window are less than
/// `congestion_gap_days` apart. Kickoffs must be passed in ascending order.
pub fn is_congested(kickoffs: &[DateTime<Utc>], now: DateTime<Utc>, params: &MinutesRiskParams) -> bool {
    let horizon = now + Duration::days(params.congestion_lookahead_days);
    let window: Vec<&DateTime<Utc>> = kickoffs
        .iter()
        .filter(|t| **t >= now && **t <= horizon)
        .collect();
    let gap_limit_secs = params.congestion_gap_days * 86_400.0;
    window
        .windows(2)
        .any(|pair| ((*pair[1] - *pair[0]).num_seconds() as f64) < gap_limit_secs)
}

/// Compute minutes risk for one player.
///
/// `kickoffs` are the team's upcoming kickoff times (ascending) and `now`
/// the reference time for the congestion lookahead. The result is clamped
/// to [0, 1] and rounded to 2 decimals. An empty history scores 0.
pub fn compute_minutes_risk(
    history: &[MatchHistoryEntry],
    availability: &Availability,
    kickoffs: &[DateTime<Utc>],
    now: DateTime<Utc>,
    params: &MinutesRiskParams,
) -> f64 {
    let window = &history[history.len().saturating_sub(params.window)..];
    let len = window.len().max(1) as f64;

    let starts = window
        .iter()
        .filter(|h| h.minutes >= params.starter_minutes)
        .count();
    let played = window.iter().filter(|h| h.played()).count();

    let starter_rate = if played == 0 { 0.0 } else { starts as f64 / len };
    let played_rate = played as f64 / len;

    let base = params.starter_weight * starter_rate + params.played_weight * played_rate;
    let rest = if is_congested(kickoffs, now, params) {
        params.congestion_multiplier
    } else {
        1.0
    };

    let risk = (base * availability_multiplier(availability, params) * rest).clamp(0.0, 1.0);
    round_to(risk, 2)
}
