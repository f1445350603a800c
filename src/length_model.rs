//! Length statistics over the corpus.
//!
//! Generated messages are bounded to within two standard deviations of the
//! mean corpus message length, which keeps them close to a typical message
//! of the channel. Lengths are counted in characters, not bytes.

use crate::constants::{MIN_MESSAGES_PER_GENERATION, SECOND_ORDER_MEAN_LENGTH};
use crate::generator::{ChainOrder, GenerationError};

/// Character length bounds for one generation cycle.
///
/// Invariant: `min_length <= max_length <= char_ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationBounds {
    /// Shortest acceptable message.
    pub min_length: usize,
    /// Longest acceptable message.
    pub max_length: usize,
}

/// Truncated mean and sample standard deviation of message lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthStats {
    /// Mean length, truncated.
    pub mean: usize,
    /// Sample standard deviation (n - 1) around the truncated mean, truncated.
    pub stdev: usize,
}

impl LengthStats {
    /// Compute stats for `corpus`. Needs at least two messages.
    pub fn from_corpus(corpus: &[String]) -> Result<Self, GenerationError> {
        if corpus.len() < MIN_MESSAGES_PER_GENERATION {
            return Err(GenerationError::InsufficientSamples(corpus.len()));
        }

        let lengths: Vec<usize> = corpus.iter().map(|m| m.chars().count()).collect();
        let n = lengths.len();
        let mean = lengths.iter().sum::<usize>() / n;

        let sum_sq: f64 = lengths
            .iter()
            .map(|&len| {
                let d = len as f64 - mean as f64;
                d * d
            })
            .sum();
        let stdev = (sum_sq / (n - 1) as f64).sqrt() as usize;

        Ok(Self { mean, stdev })
    }

    /// Bounds two standard deviations either side of the mean, clipped to
    /// `0..=char_ceiling`.
    pub fn bounds(&self, char_ceiling: usize) -> GenerationBounds {
        let spread = 2 * self.stdev;
        let max_length = char_ceiling.min(self.mean + spread);
        let min_length = self.mean.saturating_sub(spread).min(max_length);
        GenerationBounds {
            min_length,
            max_length,
        }
    }

    /// Order 1 for short chatter, order 2 once messages average 100 chars,
    /// where longer runs of real word pairs look less like spam.
    pub fn chain_order(&self) -> ChainOrder {
        if self.mean < SECOND_ORDER_MEAN_LENGTH {
            ChainOrder::First
        } else {
            ChainOrder::Second
        }
    }
}

/// Compute generation bounds for `corpus`.
pub fn compute_bounds(
    corpus: &[String],
    char_ceiling: usize,
) -> Result<GenerationBounds, GenerationError> {
    Ok(LengthStats::from_corpus(corpus)?.bounds(char_ceiling))
}
