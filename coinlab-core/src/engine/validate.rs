//! Input preconditions, checked before any simulation state exists.

use crate::domain::{PriceBar, SignalSeries};

use super::config::EngineConfig;
use super::error::EngineError;

/// Check configuration, shape, ordering and bar sanity, in that order.
pub fn validate_inputs(
    bars: &[PriceBar],
    signals: &SignalSeries,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    config.validate()?;

    if bars.len() != signals.len() {
        return Err(EngineError::ShapeMismatch {
            bars: bars.len(),
            signals: signals.len(),
        });
    }

    if let Some(index) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(EngineError::UnorderedInput { index: index + 1 });
    }

    for (index, bar) in bars.iter().enumerate() {
        bar.check()
            .map_err(|reason| EngineError::InvalidBar { index, reason })?;
    }

    Ok(())
}
