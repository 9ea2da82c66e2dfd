// Composite valuation: expected-value scoring and confidence.

pub mod composite;
pub mod confidence;

pub use composite::{
    expected_value, transfer_what_if, EvBreakdown, TransferComparison, ValuationWeights,
};
pub use confidence::{confidence_from_history, confidence_without_history, ConfidenceBreakdown};
