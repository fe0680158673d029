//! Marker-size normalization.
//!
//! Sizes are the measurement divided by a typical value (the median, or the
//! mean when the median is zero) and scaled so the typical value lands on
//! [`TYPICAL_SIZE`], then clipped to `[MIN_SIZE, MAX_SIZE]`.

use thiserror::Error;

/// Size of a marker whose value equals the normalizer.
pub const TYPICAL_SIZE: f64 = 25.0;
/// Lower clip bound; also the size of every marker when all values are zero.
pub const MIN_SIZE: f64 = 20.0;
/// Upper clip bound.
pub const MAX_SIZE: f64 = 30.0;

/// A value that violates the normalizer's precondition.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MarkerSizeError {
    /// Inputs must be clamped to `>= 0` before sizing.
    #[error("value {value} at index {index} is negative")]
    Negative {
        /// Position in the input.
        index: usize,
        /// Offending value.
        value: f64,
    },
    /// Inputs must be finite.
    #[error("value at index {index} is not finite")]
    NonFinite {
        /// Position in the input.
        index: usize,
    },
}

/// Maps non-negative values to marker sizes in `[MIN_SIZE, MAX_SIZE]`,
/// preserving length and order.
///
/// # Errors
///
/// Returns [`MarkerSizeError`] if any value is negative or non-finite.
pub fn marker_sizes(values: &[f64]) -> Result<Vec<f64>, MarkerSizeError> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(MarkerSizeError::NonFinite { index });
        }
        if value < 0.0 {
            return Err(MarkerSizeError::Negative { index, value });
        }
    }

    if values.is_empty() {
        return Ok(Vec::new());
    }

    let Some(normalizer) = normalizer(values) else {
        return Ok(vec![MIN_SIZE; values.len()]);
    };

    Ok(values
        .iter()
        .map(|v| (v / normalizer * TYPICAL_SIZE).clamp(MIN_SIZE, MAX_SIZE))
        .collect())
}

/// Median, falling back to the mean when the median is zero. `None` when
/// the mean is zero too.
#[allow(clippy::float_cmp)]
fn normalizer(values: &[f64]) -> Option<f64> {
    let median = median(values);
    if median != 0.0 {
        return Some(median);
    }
    let mean = mean(values);
    if mean == 0.0 { None } else { Some(mean) }
}

/// Median of a non-empty slice; even lengths average the middle pair.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
