//! Markov chain sentence generator.
//!
//! Trains a word-level chain on newline-separated text on every call and
//! samples sentences from it. Each line is one sentence; lines with stray
//! quotes or brackets are left out of training because they tend to produce
//! unbalanced output.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::generator::{ChainOrder, GenerationError, TextGenerator};

/// Lines matching this are not used for training.
#[allow(clippy::unwrap_used, reason = "constant pattern, covered by tests")]
static REJECT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(^')|('$)|\s'|'\s|["()\[\]]"#).unwrap());

/// One chain token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Token {
    Begin,
    Word(String),
    End,
}

/// Weighted follower list with a running total for sampling.
#[derive(Debug, Default)]
struct Followers {
    choices: Vec<(Token, usize)>,
    total: usize,
}

impl Followers {
    fn pick<R: Rng>(&self, rng: &mut R) -> Option<&Token> {
        if self.total == 0 {
            return None;
        }
        let mut roll = rng.random_range(0..self.total);
        for (token, weight) in &self.choices {
            if roll < *weight {
                return Some(token);
            }
            roll -= weight;
        }
        None
    }
}

/// Word-level Markov chain.
#[derive(Debug)]
pub struct Chain {
    order: usize,
    model: HashMap<Vec<Token>, Followers>,
}

impl Chain {
    /// Train a chain on `text`, one sentence per line.
    pub fn train(text: &str, order: ChainOrder) -> Self {
        let order = order.state_size();
        let mut counts: HashMap<Vec<Token>, BTreeMap<Token, usize>> = HashMap::new();

        for line in text.split('\n').map(str::trim).filter(|l| is_trainable(l)) {
            let mut items = vec![Token::Begin; order];
            items.extend(line.split_whitespace().map(|w| Token::Word(w.to_string())));
            items.push(Token::End);

            for window in items.windows(order + 1) {
                let (state, follow) = window.split_at(order);
                *counts
                    .entry(state.to_vec())
                    .or_default()
                    .entry(follow[0].clone())
                    .or_insert(0) += 1;
            }
        }

        let model = counts
            .into_iter()
            .map(|(state, follows)| {
                let total = follows.values().sum();
                let choices = follows.into_iter().collect();
                (state, Followers { choices, total })
            })
            .collect();

        Self { order, model }
    }

    /// Whether training produced any transitions.
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    /// Walk the chain once. Stops early, returning `None`, once the sentence
    /// grows past `max_chars`.
    pub fn walk<R: Rng>(&self, rng: &mut R, max_chars: usize) -> Option<String> {
        let mut state = vec![Token::Begin; self.order];
        let mut sentence = String::new();
        let mut chars = 0;

        loop {
            let next = self.model.get(&state)?.pick(rng)?;
            let word = match next {
                Token::Word(word) => word,
                Token::End => break,
                Token::Begin => return None,
            };

            if !sentence.is_empty() {
                sentence.push(' ');
                chars += 1;
            }
            sentence.push_str(word);
            chars += word.chars().count();
            if chars > max_chars {
                return None;
            }

            state.remove(0);
            state.push(next.clone());
        }

        (!sentence.is_empty()).then_some(sentence)
    }
}

/// Whether a corpus line is usable for training.
fn is_trainable(line: &str) -> bool {
    !line.is_empty() && !REJECT_LINE.is_match(line)
}

/// [`TextGenerator`] backed by a freshly trained [`Chain`].
#[derive(Debug)]
pub struct MarkovGenerator<R = StdRng> {
    rng: R,
    attempts: usize,
}

impl MarkovGenerator<StdRng> {
    /// Generator seeded from the OS, making up to `attempts` walks per call.
    pub fn new(attempts: usize) -> Self {
        Self::with_rng(StdRng::from_os_rng(), attempts)
    }

    /// Deterministic generator for reproducible runs.
    pub fn seeded(seed: u64, attempts: usize) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), attempts)
    }
}

impl<R: Rng> MarkovGenerator<R> {
    /// Generator using `rng`.
    pub fn with_rng(rng: R, attempts: usize) -> Self {
        Self { rng, attempts }
    }
}

impl<R: Rng> TextGenerator for MarkovGenerator<R> {
    fn synthesize(
        &mut self,
        corpus_text: &str,
        order: ChainOrder,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, GenerationError> {
        let chain = Chain::train(corpus_text, order);
        if chain.is_empty() {
            return Err(GenerationError::EmptyModel);
        }

        for _ in 0..self.attempts {
            let Some(sentence) = chain.walk(&mut self.rng, max_length) else {
                continue;
            };
            if sentence.chars().count() >= min_length {
                return Ok(sentence);
            }
        }

        Err(GenerationError::NoSentence {
            attempts: self.attempts,
            min_length,
            max_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_corpus_reproduces_line() {
        let mut generator = MarkovGenerator::seeded(7, 10);
        let sentence = generator
            .synthesize("hello there friend", ChainOrder::First, 100, 0)
            .unwrap();
        assert_eq!(sentence, "hello there friend");
    }

    #[test]
    fn test_output_only_uses_corpus_words() {
        let corpus = "hi there\nhello friend\nhi friend\nyo yo yo";
        let mut generator = MarkovGenerator::seeded(42, 50);
        for _ in 0..20 {
            let sentence = generator
                .synthesize(corpus, ChainOrder::First, 50, 0)
                .unwrap();
            for word in sentence.split(' ') {
                assert!(corpus.split_whitespace().any(|w| w == word), "{word}");
            }
        }
    }

    #[test]
    fn test_respects_bounds() {
        let corpus = "a b c d e f\ng h\ni j k l m n o p";
        let mut generator = MarkovGenerator::seeded(3, 100);
        let sentence = generator
            .synthesize(corpus, ChainOrder::Second, 5, 3)
            .unwrap();
        let len = sentence.chars().count();
        assert!((3..=5).contains(&len), "{sentence}");
    }

    #[test]
    fn test_unsatisfiable_bounds_fail() {
        let mut generator = MarkovGenerator::seeded(1, 10);
        let err = generator
            .synthesize("short\nlines", ChainOrder::First, 100, 50)
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::NoSentence {
                attempts: 10,
                min_length: 50,
                max_length: 100,
            }
        );
    }

    #[test]
    fn test_rejected_lines_leave_empty_model() {
        let mut generator = MarkovGenerator::seeded(1, 10);
        let err = generator
            .synthesize("\"quoted\"\n(paren)\n\n", ChainOrder::First, 100, 0)
            .unwrap_err();
        assert_eq!(err, GenerationError::EmptyModel);
    }

    #[test]
    fn test_trainable_filter() {
        assert!(is_trainable("don't stop"));
        assert!(!is_trainable("'quoted start"));
        assert!(!is_trainable("ends quoted'"));
        assert!(!is_trainable("a ' b"));
        assert!(!is_trainable("[brackets]"));
        assert!(!is_trainable(""));
    }

    #[test]
    fn test_walk_stops_past_max_chars() {
        let chain = Chain::train("abcdefghij", ChainOrder::First);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(chain.walk(&mut rng, 5), None);
        assert_eq!(chain.walk(&mut rng, 10).as_deref(), Some("abcdefghij"));
    }
}
