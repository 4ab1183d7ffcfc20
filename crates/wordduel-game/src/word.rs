//! Validated five-letter words.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wordduel_protocol::WORD_LENGTH;

/// Reasons a string is not a usable word.
#[derive(Debug, thiserror::Error)]
pub enum WordError {
    #[error("expected {WORD_LENGTH} letters, got {0}")]
    WrongLength(usize),

    #[error("'{0}' is not a letter A-Z")]
    NotALetter(char),

    #[error("word list is empty")]
    EmptyList,

    #[error("failed to read word list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Five uppercase ASCII letters.
///
/// Parsing folds case, so `"crane"` and `"CRANE"` are the same word.
/// Serialized as a plain string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word([u8; WORD_LENGTH]);

impl Word {
    /// Parses and upper-cases a word.
    pub fn parse(text: &str) -> Result<Self, WordError> {
        let count = text.chars().count();
        if count != WORD_LENGTH {
            return Err(WordError::WrongLength(count));
        }
        let mut letters = [0u8; WORD_LENGTH];
        for (slot, ch) in letters.iter_mut().zip(text.chars()) {
            *slot = normalize_letter(ch)? as u8;
        }
        Ok(Self(letters))
    }

    /// The letters, in order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().map(|b| char::from(*b))
    }
}

/// Upper-cases `ch` if it is an ASCII letter.
pub fn normalize_letter(ch: char) -> Result<char, WordError> {
    if ch.is_ascii_alphabetic() {
        Ok(ch.to_ascii_uppercase())
    } else {
        Err(WordError::NotALetter(ch))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.letters() {
            fmt::Write::write_char(f, ch)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({self})")
    }
}

impl FromStr for Word {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Word {
    type Error = WordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_folds_case() {
        assert_eq!(Word::parse("crane").unwrap(), Word::parse("CRANE").unwrap());
        assert_eq!(Word::parse("cRaNe").unwrap().to_string(), "CRANE");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(matches!(Word::parse("CRAN"), Err(WordError::WrongLength(4))));
        assert!(matches!(
            Word::parse("CRANES"),
            Err(WordError::WrongLength(6))
        ));
    }

    #[test]
    fn test_parse_rejects_non_letters() {
        assert!(matches!(
            Word::parse("CR4NE"),
            Err(WordError::NotALetter('4'))
        ));
        assert!(matches!(
            Word::parse("CRÄNE"),
            Err(WordError::NotALetter('Ä'))
        ));
    }

    #[test]
    fn test_word_serializes_as_string() {
        let word = Word::parse("slate").unwrap();
        assert_eq!(serde_json::to_string(&word).unwrap(), "\"SLATE\"");
        let back: Word = serde_json::from_str("\"slate\"").unwrap();
        assert_eq!(back, word);
        assert!(serde_json::from_str::<Word>("\"toolong\"").is_err());
    }
}
