//! Text generation seam.
//!
//! The engine decides *when* to generate and *which bounds* to ask for; a
//! [`TextGenerator`] decides *what* text comes out. The default generator is
//! [`crate::markov::MarkovGenerator`]; tests plug in stubs.

/// Number of preceding words a Markov chain conditions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainOrder {
    /// One word of state.
    First,
    /// Two words of state.
    Second,
}

impl ChainOrder {
    /// State size in words.
    pub fn state_size(self) -> usize {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl std::fmt::Display for ChainOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.state_size())
    }
}

/// Errors from a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Corpus too small to compute a sample standard deviation.
    InsufficientSamples(usize),
    /// Corpus has no line usable for training.
    EmptyModel,
    /// No sampled sentence fell within the requested bounds.
    NoSentence {
        /// Sampling walks made.
        attempts: usize,
        /// Requested minimum length in characters.
        min_length: usize,
        /// Requested maximum length in characters.
        max_length: usize,
    },
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientSamples(n) => {
                write!(f, "need at least 2 messages to compute bounds (got {n})")
            }
            Self::EmptyModel => write!(f, "corpus has no usable lines"),
            Self::NoSentence {
                attempts,
                min_length,
                max_length,
            } => write!(
                f,
                "no sentence of {min_length}..={max_length} chars after {attempts} attempts"
            ),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Sentence sampler parameterized by chain order and length bounds.
pub trait TextGenerator {
    /// Produce one sentence trained on `corpus_text` (one message per line)
    /// whose character count lies in `min_length..=max_length`.
    fn synthesize(
        &mut self,
        corpus_text: &str,
        order: ChainOrder,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, GenerationError>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for Box<G> {
    fn synthesize(
        &mut self,
        corpus_text: &str,
        order: ChainOrder,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, GenerationError> {
        (**self).synthesize(corpus_text, order, max_length, min_length)
    }
}
