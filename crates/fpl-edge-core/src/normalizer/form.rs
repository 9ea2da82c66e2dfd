// Form score: recent points-per-90, damped by how much of each match the
// player actually played.

use crate::model::MatchHistoryEntry;
use crate::signal::round_to;

/// Number of trailing played matches considered.
pub const FORM_WINDOW: usize = 4;

/// Compute the 0-100 form score from chronological match history.
///
/// Algorithm:
/// 1. Keep the last `window` entries with nonzero minutes.
/// 2. Average points-per-90 across them and scale ×10, clamped to [0, 100].
/// 3. Minutes-safety = average share of 90 minutes played, capped at 1.
/// 4. Score = scaled × (0.6 + 0.4 × safety), rounded to an integer.
///
/// Returns 0.0 when no entry in the history has minutes.
pub fn compute_form(history: &[MatchHistoryEntry], window: usize) -> f64 {
    let played: Vec<&MatchHistoryEntry> = history.iter().filter(|h| h.played()).collect();
    let last = &played[played.len().saturating_sub(window)..];
    if last.is_empty() {
        return 0.0;
    }

    let n = last.len() as f64;
    let avg_per90 = last
        .iter()
        .map(|h| h.points as f64 * 90.0 / h.minutes.max(1) as f64)
        .sum::<f64>()
        / n;

    let total_minutes: u32 = last.iter().map(|h| h.minutes).sum();
    let minutes_safety = (total_minutes as f64 / (n * 90.0)).min(1.0);

    let scaled = (avg_per90 * 10.0).clamp(0.0, 100.0);
    round_to(scaled * (0.6 + 0.4 * minutes_safety), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(minutes: u32, points: i32) -> MatchHistoryEntry {
        MatchHistoryEntry {
            minutes,
            points,
            ..Default::default()
        }
    }

    #[test]
    fn four_full_matches() {
        // per-90: 6, 4, 8, 5 -> avg 5.75 -> 57.5, safety 1.0 -> 58
        let history = vec![entry(90, 6), entry(90, 4), entry(90, 8), entry(90, 5)];
        assert_eq!(compute_form(&history, FORM_WINDOW), 58.0);
    }

    #[test]
    fn only_last_four_played_matches_count() {
        let history = vec![
            entry(90, 20),
            entry(90, 6),
            entry(0, 0),
            entry(90, 4),
            entry(90, 8),
            entry(90, 5),
        ];
        assert_eq!(compute_form(&history, FORM_WINDOW), 58.0);
    }

    #[test]
    fn single_full_match_keeps_full_score() {
        assert_eq!(compute_form(&[entry(90, 7)], FORM_WINDOW), 70.0);
    }

    #[test]
    fn single_partial_match_is_damped_by_safety() {
        // 4 points in 45 minutes -> 8 per 90 -> 80, safety 0.5 -> × 0.8 = 64
        assert_eq!(compute_form(&[entry(45, 4)], FORM_WINDOW), 64.0);
    }

    #[test]
    fn no_minutes_gives_zero() {
        assert_eq!(compute_form(&[], FORM_WINDOW), 0.0);
        assert_eq!(compute_form(&[entry(0, 0), entry(0, 1)], FORM_WINDOW), 0.0);
    }

    #[test]
    fn clamped_to_range() {
        // a 15-point cameo of 10 minutes would be 135 per 90
        let high = compute_form(&[entry(10, 15)], FORM_WINDOW);
        assert!((0.0..=100.0).contains(&high), "form out of range: {high}");
        let low = compute_form(&[entry(90, -3)], FORM_WINDOW);
        assert_eq!(low, 0.0);
    }
}
