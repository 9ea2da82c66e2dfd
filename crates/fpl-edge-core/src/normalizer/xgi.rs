// Expected goal involvement per 90: direct expected-goals data when the
// provider has it, otherwise a coarse threat/creativity proxy.

use crate::model::{MatchHistoryEntry, XgSource, XgiRates};
use crate::signal::{round_to, Signal};

/// Number of trailing played matches considered.
pub const XGI_WINDOW: usize = 4;

/// Threat index divisor for the proxy xG rate.
pub const PROXY_THREAT_DIVISOR: f64 = 100.0;
/// Creativity index divisor for the proxy xA rate.
pub const PROXY_CREATIVITY_DIVISOR: f64 = 120.0;

/// The last `window` entries with nonzero minutes, oldest first.
pub(crate) fn last_played(history: &[MatchHistoryEntry], window: usize) -> Vec<&MatchHistoryEntry> {
    let played: Vec<&MatchHistoryEntry> = history.iter().filter(|h| h.played()).collect();
    let start = played.len().saturating_sub(window);
    played[start..].to_vec()
}

/// Compute xG90 / xA90 / xGI90 over the last `window` played matches.
///
/// If any entry in the window carries expected data, the window totals are
/// scaled by `max(1, minutes) / 90` and tagged `Direct`. Otherwise the mean
/// threat and creativity indices give a `Proxy` rate. No played matches
/// yields all-unknown rates tagged `None`.
pub fn compute_xgi_rates(history: &[MatchHistoryEntry], window: usize) -> XgiRates {
    let last = last_played(history, window);
    if last.is_empty() {
        return XgiRates::default();
    }

    if last.iter().any(|h| h.has_expected_data()) {
        let minutes: u32 = last.iter().map(|h| h.minutes).sum();
        let denom = minutes.max(1) as f64 / 90.0;
        let xg: f64 = last.iter().map(|h| h.expected_goals.unwrap_or(0.0)).sum();
        let xa: f64 = last.iter().map(|h| h.expected_assists.unwrap_or(0.0)).sum();
        let xgi: f64 = last.iter().map(|h| h.expected_involvements()).sum();
        return XgiRates {
            xg90: Signal::finite(round_to(xg / denom, 2)),
            xa90: Signal::finite(round_to(xa / denom, 2)),
            xgi90: Signal::finite(round_to(xgi / denom, 2)),
            source: XgSource::Direct,
        };
    }

    let n = last.len() as f64;
    let xg = last.iter().map(|h| h.threat).sum::<f64>() / n / PROXY_THREAT_DIVISOR;
    let xa = last.iter().map(|h| h.creativity).sum::<f64>() / n / PROXY_CREATIVITY_DIVISOR;
    XgiRates {
        xg90: Signal::finite(round_to(xg, 2)),
        xa90: Signal::finite(round_to(xa, 2)),
        xgi90: Signal::finite(round_to(xg + xa, 2)),
        source: XgSource::Proxy,
    }
}

/// Involvement rate for a single appearance, used by the confidence score.
///
/// Direct entries scale their xGI to 90 minutes; entries without expected
/// data use the per-match threat/creativity proxy unscaled.
pub fn entry_involvement_rate(entry: &MatchHistoryEntry) -> f64 {
    if entry.has_expected_data() {
        entry.expected_involvements() * 90.0 / entry.minutes.max(1) as f64
    } else {
        entry.threat / PROXY_THREAT_DIVISOR + entry.creativity / PROXY_CREATIVITY_DIVISOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn direct(minutes: u32, xg: f64, xa: f64) -> MatchHistoryEntry {
        MatchHistoryEntry {
            minutes,
            expected_goals: Some(xg),
            expected_assists: Some(xa),
            ..Default::default()
        }
    }

    fn proxy(minutes: u32, threat: f64, creativity: f64) -> MatchHistoryEntry {
        MatchHistoryEntry {
            minutes,
            threat,
            creativity,
            ..Default::default()
        }
    }

    #[test]
    fn direct_rates_over_two_full_matches() {
        // xG 0.3 and xA 0.1 across 180 minutes
        let history = vec![direct(90, 0.2, 0.0), direct(90, 0.1, 0.1)];
        let rates = compute_xgi_rates(&history, XGI_WINDOW);
        assert_eq!(rates.source, XgSource::Direct);
        assert!(approx_eq(rates.xgi90.or(-1.0), 0.2));
        assert!(approx_eq(rates.xg90.or(-1.0), 0.15));
        assert!(approx_eq(rates.xa90.or(-1.0), 0.05));
    }

    #[test]
    fn explicit_involvement_wins_over_sum() {
        let mut entry = direct(90, 0.2, 0.2);
        entry.expected_goal_involvements = Some(0.5);
        let rates = compute_xgi_rates(&[entry], XGI_WINDOW);
        assert!(approx_eq(rates.xgi90.or(-1.0), 0.5));
    }

    #[test]
    fn proxy_when_no_expected_data() {
        let history = vec![proxy(90, 40.0, 24.0), proxy(90, 20.0, 36.0)];
        let rates = compute_xgi_rates(&history, XGI_WINDOW);
        assert_eq!(rates.source, XgSource::Proxy);
        // threat mean 30 -> 0.3, creativity mean 30 -> 0.25
        assert!(approx_eq(rates.xg90.or(-1.0), 0.3));
        assert!(approx_eq(rates.xa90.or(-1.0), 0.25));
        assert!(approx_eq(rates.xgi90.or(-1.0), 0.55));
    }

    #[test]
    fn unplayed_history_is_unknown() {
        let rates = compute_xgi_rates(&[proxy(0, 50.0, 50.0)], XGI_WINDOW);
        assert_eq!(rates.source, XgSource::None);
        assert!(!rates.xgi90.is_known());
        assert!(!compute_xgi_rates(&[], XGI_WINDOW).xg90.is_known());
    }

    #[test]
    fn per_entry_rate_scales_direct_only() {
        assert!(approx_eq(entry_involvement_rate(&direct(45, 0.2, 0.1)), 0.6));
        assert!(approx_eq(entry_involvement_rate(&proxy(45, 50.0, 60.0)), 1.0));
    }
}
