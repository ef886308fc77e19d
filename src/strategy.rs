//! Signal calculator trait and related utilities.

use crate::types::{IndicatorRecord, StrategyKind, StrategySignal};

/// Trait implemented by the per-strategy scorers.
///
/// Calculators hold no per-call state, so a single instance can be shared
/// across worker threads and reused for every symbol in a run.
pub trait SignalCalculator: Send + Sync {
    /// Returns the name of the calculator.
    fn name(&self) -> &str;

    /// Which strategy this calculator scores for.
    fn kind(&self) -> StrategyKind;

    /// Score one indicator record.
    fn calculate(&self, record: &IndicatorRecord) -> StrategySignal;

    /// Get calculator parameters for display.
    fn parameters(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}
