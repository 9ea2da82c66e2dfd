// Explicit known/unknown wrapper for derived signals, plus the small
// rounding helpers every scoring module shares.
//
// A `Signal` never doubles as a sentinel: a missing FDR is `Unknown`, not 3
// or 5. Each consumer picks its own neutral value at the point of use via
// `or(...)`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A derived value that is either known or explicitly unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Signal<T> {
    Known(T),
    #[default]
    Unknown,
}

impl<T: Copy> Signal<T> {
    /// Resolve the signal with a caller-chosen neutral value.
    pub fn or(self, neutral: T) -> T {
        match self {
            Signal::Known(v) => v,
            Signal::Unknown => neutral,
        }
    }

    pub fn known(self) -> Option<T> {
        match self {
            Signal::Known(v) => Some(v),
            Signal::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Signal::Known(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Signal<U> {
        match self {
            Signal::Known(v) => Signal::Known(f(v)),
            Signal::Unknown => Signal::Unknown,
        }
    }
}

impl<T> From<Option<T>> for Signal<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Signal::Known(v),
            None => Signal::Unknown,
        }
    }
}

impl Signal<f64> {
    /// Wrap a float, treating NaN and infinities as unknown.
    pub fn finite(value: f64) -> Self {
        if value.is_finite() {
            Signal::Known(value)
        } else {
            Signal::Unknown
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round to the nearest 0.5.
pub fn round_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// Sample standard deviation (n - 1 denominator). Zero for one sample or fewer.
pub fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Parse a decimal string that may use a comma separator or a trailing `%`.
///
/// Returns `Unknown` for anything that does not parse to a finite number.
pub fn parse_decimal(raw: &str) -> Signal<f64> {
    let cleaned = raw.trim().replace(',', ".");
    let cleaned = cleaned.trim_end_matches('%').trim();
    if cleaned.is_empty() {
        return Signal::Unknown;
    }
    match cleaned.parse::<f64>() {
        Ok(v) => Signal::finite(v),
        Err(_) => Signal::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_uses_neutral_only_when_unknown() {
        assert_eq!(Signal::Known(2.5).or(3.0), 2.5);
        assert_eq!(Signal::<f64>::Unknown.or(3.0), 3.0);
    }

    #[test]
    fn finite_rejects_nan() {
        assert_eq!(Signal::finite(f64::NAN), Signal::Unknown);
        assert_eq!(Signal::finite(f64::INFINITY), Signal::Unknown);
        assert_eq!(Signal::finite(1.25), Signal::Known(1.25));
    }

    #[test]
    fn round_half_steps() {
        assert_eq!(round_half(2.24), 2.0);
        assert_eq!(round_half(2.26), 2.5);
        assert_eq!(round_half(4.75), 5.0);
    }

    #[test]
    fn parse_decimal_handles_locale_and_percent() {
        assert_eq!(parse_decimal("12,5"), Signal::Known(12.5));
        assert_eq!(parse_decimal(" 7.1% "), Signal::Known(7.1));
        assert_eq!(parse_decimal(""), Signal::Unknown);
        assert_eq!(parse_decimal("n/a"), Signal::Unknown);
    }

    #[test]
    fn sample_stdev_small_inputs() {
        assert_eq!(sample_stdev(&[]), 0.0);
        assert_eq!(sample_stdev(&[4.0]), 0.0);
        // mean 5, squared deviations 1+1 = 2, / (2-1) = 2
        assert!((sample_stdev(&[4.0, 6.0]) - 2f64.sqrt()).abs() < 1e-12);
    }
}
