//! The word-list collaborators: which guesses are accepted and where
//! solutions come from.
//!
//! Both are traits so the server can be wired to whatever word data the
//! deployment ships. [`WordList`] and [`RandomSolutions`] cover the common
//! case of newline-separated files.

use std::collections::HashSet;
use std::path::Path;

use rand::seq::IndexedRandom;

use crate::{Word, WordError};

/// Decides whether a submitted guess counts as a real word.
pub trait Dictionary: Send + Sync + 'static {
    fn is_accepted_guess(&self, word: &Word) -> bool;
}

/// Supplies the solution for each new session.
pub trait SolutionSource: Send + Sync + 'static {
    fn next_solution(&self) -> Word;
}

/// A small answer list so a development server runs without word files.
pub const BUILTIN_ANSWERS: &str = "\
aback\nabout\nadmit\nadopt\nagent\nalbum\nalert\nangle\napple\narise
badge\nbaker\nbeach\nblame\nblink\nbrave\nbread\nbrick\nbunch\ncabin
candy\ncharm\nchess\nclimb\ncloud\ncoral\ncrane\ncrisp\ndance\ndelta
eagle\nearth\nfable\nfaith\nfeast\nflame\nfrost\nghost\ngiant\ngrape
heart\nhoney\nhumor\nirony\njelly\nknife\nlemon\nlight\nmagic\nmaple
noble\nocean\norbit\npiano\nplant\nquiet\nraven\nshine\nslate\nstorm
tiger\ntoast\nunity\nvivid\nwaltz\nwheat\nyacht\nyouth\nzebra\nzesty";

/// A set of accepted words parsed from newline-separated text.
///
/// Blank lines and lines starting with `#` are skipped; case is folded.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<Word>,
}

impl WordList {
    /// Parses a newline-separated list.
    ///
    /// # Errors
    /// Returns the first malformed entry.
    pub fn parse(text: &str) -> Result<Self, WordError> {
        let words = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(Word::parse)
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self { words })
    }

    /// Reads and parses a word file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WordError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            WordError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;
        Self::parse(&text)
    }

    /// Adds every word of `other` (valid guesses ∪ answers).
    pub fn extend(&mut self, other: &WordList) {
        self.words.extend(other.words.iter().copied());
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The words in sorted order.
    pub fn to_sorted_vec(&self) -> Vec<Word> {
        let mut words: Vec<Word> = self.words.iter().copied().collect();
        words.sort();
        words
    }
}

impl Dictionary for WordList {
    fn is_accepted_guess(&self, word: &Word) -> bool {
        self.contains(word)
    }
}

/// Draws each solution uniformly from an answer list.
#[derive(Debug, Clone)]
pub struct RandomSolutions {
    answers: Vec<Word>,
}

impl RandomSolutions {
    /// # Errors
    /// Returns [`WordError::EmptyList`] when there is nothing to draw from.
    pub fn new(answers: &WordList) -> Result<Self, WordError> {
        if answers.is_empty() {
            return Err(WordError::EmptyList);
        }
        Ok(Self {
            answers: answers.to_sorted_vec(),
        })
    }
}

impl SolutionSource for RandomSolutions {
    fn next_solution(&self) -> Word {
        // `new` guarantees a non-empty list.
        *self
            .answers
            .choose(&mut rand::rng())
            .unwrap_or(&self.answers[0])
    }
}

/// Always hands out the same word. Handy for a word-of-the-day mode and
/// for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedSolution(pub Word);

impl SolutionSource for FixedSolution {
    fn next_solution(&self) -> Word {
        self.0
    }
}
