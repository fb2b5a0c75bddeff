//! Provenance tags
//!
//! Every component a maker builds carries a tag naming the functions that
//! produced it, e.g. `"rhythm_makers.talea()"`. Callers may pass their own
//! tag; makers append their name to it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered list of provenance words
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    words: Vec<String>,
}

impl Tag {
    /// Create a tag with a single word
    pub fn new<S: Into<String>>(word: S) -> Self {
        Self {
            words: vec![word.into()],
        }
    }

    /// Return a new tag with `word` appended
    pub fn append<S: Into<String>>(&self, word: S) -> Self {
        let mut words = self.words.clone();
        words.push(word.into());
        Self { words }
    }

    /// Tag for a maker or command function of this crate
    pub fn for_function(name: &str) -> Self {
        Self::new(format!("rhythm_makers.{}()", name))
    }

    /// Append a crate function name
    pub fn append_function(&self, name: &str) -> Self {
        self.append(format!("rhythm_makers.{}()", name))
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(":"))
    }
}
