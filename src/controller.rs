//! Generation controller.
//!
//! Owns the corpus and decides when a generation cycle runs:
//!
//! ```text
//!   Collecting ── append, size >= threshold ──► Generating
//!       ▲                                           │
//!       └──── corpus cleared, frame or error ◄──────┘
//! ```
//!
//! A cycle reads the corpus, computes length bounds and chain order, asks the
//! generator for a sentence, clears the corpus and frames the result. The
//! corpus is cleared whatever the outcome, so a corpus that cannot satisfy
//! its bounds is not retried.
//!
//! The controller is driven from a single event loop and takes `&mut self`;
//! cycles cannot overlap.

use crate::config::EngineConfig;
use crate::corpus::CorpusBuffer;
use crate::generator::{GenerationError, TextGenerator};
use crate::irc::framing::{FramingError, MessageFramer, OutboundFrame};
use crate::length_model::{GenerationBounds, LengthStats};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Accepting messages below the trigger threshold.
    Collecting,
    /// A cycle is running.
    Generating,
}

/// Why a cycle produced no message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// The generator could not produce a sentence within bounds.
    Generation(GenerationError),
    /// The generated sentence could not be framed.
    Framing(FramingError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation(e) => write!(f, "Generation failed: {e}"),
            Self::Framing(e) => write!(f, "Framing failed: {e}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Generation(e) => Some(e),
            Self::Framing(e) => Some(e),
        }
    }
}

impl From<GenerationError> for CycleError {
    fn from(e: GenerationError) -> Self {
        Self::Generation(e)
    }
}

impl From<FramingError> for CycleError {
    fn from(e: FramingError) -> Self {
        Self::Framing(e)
    }
}

/// Record of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Bounds requested from the generator.
    pub bounds: GenerationBounds,
    /// Framed message, or why there is none.
    pub outcome: Result<OutboundFrame, CycleError>,
}

/// Collects messages and runs generation cycles.
#[derive(Debug)]
pub struct GenerationController<G> {
    config: EngineConfig,
    corpus: CorpusBuffer,
    framer: MessageFramer,
    generator: G,
    state: ControllerState,
    cycles: u64,
}

impl<G: TextGenerator> GenerationController<G> {
    /// Controller using `generator` and the limits in `config`.
    pub fn new(config: EngineConfig, generator: G) -> Self {
        Self {
            corpus: CorpusBuffer::with_capacity(config.trigger_threshold()),
            framer: MessageFramer::new(config.byte_ceiling()),
            config,
            generator,
            state: ControllerState::Collecting,
            cycles: 0,
        }
    }

    /// Append a message. Runs a cycle when this append reaches the threshold.
    ///
    /// Returns `None` while collecting, `Some(cycle)` when a cycle ran.
    pub fn observe(&mut self, text: impl Into<String>) -> Option<Cycle> {
        self.corpus.append(text);
        if self.corpus.size() < self.config.trigger_threshold() {
            return None;
        }
        Some(self.run_cycle())
    }

    /// Run one cycle on the current corpus.
    fn run_cycle(&mut self) -> Cycle {
        self.state = ControllerState::Generating;
        self.cycles += 1;

        let (bounds, generated) = match LengthStats::from_corpus(self.corpus.snapshot()) {
            Ok(stats) => {
                let bounds = stats.bounds(self.config.char_ceiling());
                let order = stats.chain_order();
                log::debug!(
                    "[Generator] Cycle {}: {} messages, mean {} stdev {}, order {}, bounds {}..={}",
                    self.cycles,
                    self.corpus.size(),
                    stats.mean,
                    stats.stdev,
                    order,
                    bounds.min_length,
                    bounds.max_length
                );
                let generated = self.generator.synthesize(
                    &self.corpus.joined(),
                    order,
                    bounds.max_length,
                    bounds.min_length,
                );
                (bounds, generated)
            }
            Err(e) => (
                GenerationBounds {
                    min_length: 0,
                    max_length: 0,
                },
                Err(e),
            ),
        };

        self.corpus.clear();

        let outcome = generated
            .map_err(CycleError::from)
            .and_then(|text| self.framer.frame(&text).map_err(CycleError::from));

        self.state = ControllerState::Collecting;
        Cycle { bounds, outcome }
    }

    /// Current state. Always `Collecting` between calls.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Messages collected towards the next cycle.
    pub fn corpus(&self) -> &CorpusBuffer {
        &self.corpus
    }

    /// Number of cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Engine limits in force.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ChainOrder;

    /// Generator returning a canned reply and recording its inputs.
    #[derive(Debug, Default)]
    struct StubGenerator {
        reply: Option<String>,
        calls: Vec<(String, ChainOrder, usize, usize)>,
    }

    impl TextGenerator for StubGenerator {
        fn synthesize(
            &mut self,
            corpus_text: &str,
            order: ChainOrder,
            max_length: usize,
            min_length: usize,
        ) -> Result<String, GenerationError> {
            self.calls
                .push((corpus_text.to_string(), order, max_length, min_length));
            self.reply.clone().ok_or(GenerationError::NoSentence {
                attempts: 1,
                min_length,
                max_length,
            })
        }
    }

    fn controller(threshold: usize, reply: Option<&str>) -> GenerationController<StubGenerator> {
        let config = EngineConfig::with_trigger_threshold(threshold).unwrap();
        let generator = StubGenerator {
            reply: reply.map(str::to_string),
            calls: Vec::new(),
        };
        GenerationController::new(config, generator)
    }

    #[test]
    fn test_collects_below_threshold() {
        let mut controller = controller(3, Some("x"));
        assert!(controller.observe("one").is_none());
        assert!(controller.observe("two").is_none());
        assert_eq!(controller.corpus().size(), 2);
        assert_eq!(controller.state(), ControllerState::Collecting);
        assert_eq!(controller.cycles(), 0);
    }

    #[test]
    fn test_worked_example() {
        let mut controller = controller(4, Some("hi friend"));
        for msg in ["hi there", "hello friend", "hi"] {
            assert!(controller.observe(msg).is_none());
        }
        let cycle = controller.observe("yo yo yo").unwrap();

        assert_eq!(
            cycle.bounds,
            GenerationBounds {
                min_length: 0,
                max_length: 15
            }
        );
        assert_eq!(cycle.outcome.unwrap().as_bytes(), b"hi friend\r\n");
        assert_eq!(controller.corpus().size(), 0);
        assert_eq!(
            controller.generator.calls,
            vec![(
                "hi there\nhello friend\nhi\nyo yo yo".to_string(),
                ChainOrder::First,
                15,
                0
            )]
        );
    }

    #[test]
    fn test_cycle_runs_exactly_once_per_threshold() {
        let mut controller = controller(2, Some("ok"));
        let cycles: Vec<_> = (0..6)
            .map(|i| controller.observe(format!("message {i}")))
            .collect();
        assert_eq!(cycles.iter().filter(|c| c.is_some()).count(), 3);
        assert!(cycles[0].is_none());
        assert!(cycles[1].is_some());
        assert_eq!(controller.cycles(), 3);
    }

    #[test]
    fn test_generation_failure_still_clears_corpus() {
        let mut controller = controller(2, None);
        controller.observe("a");
        let cycle = controller.observe("b").unwrap();
        assert!(matches!(
            cycle.outcome,
            Err(CycleError::Generation(GenerationError::NoSentence { .. }))
        ));
        assert_eq!(controller.corpus().size(), 0);
        assert_eq!(controller.state(), ControllerState::Collecting);
    }

    #[test]
    fn test_framing_failure_still_clears_corpus() {
        let mut controller = controller(2, Some("line one\nline two"));
        controller.observe("a");
        let cycle = controller.observe("b").unwrap();
        assert_eq!(
            cycle.outcome,
            Err(CycleError::Framing(FramingError::InvalidCharacters))
        );
        assert_eq!(controller.corpus().size(), 0);
    }

    #[test]
    fn test_long_messages_use_second_order() {
        let mut controller = controller(2, Some("ok"));
        let long = "word ".repeat(30);
        controller.observe(long.clone());
        controller.observe(long);
        assert_eq!(controller.generator.calls[0].1, ChainOrder::Second);
    }
}
