//! Character-by-character disclosure of a fixed text.

/// Outcome of advancing a `Typewriter` by one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// More characters remain; carries the prefix revealed so far.
    Partial(&'a str),
    /// The last character was just revealed; carries the full text.
    Complete(&'a str),
    /// Completion was already reported earlier.
    Exhausted,
}

/// Reveals a text one Unicode scalar value at a time.
#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    /// Byte offset just past each character.
    ends: Vec<usize>,
    revealed: usize,
}

impl Typewriter {
    /// Creates a typewriter with nothing revealed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let ends = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
        Self {
            text,
            ends,
            revealed: 0,
        }
    }

    /// Number of characters in the full text.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.ends.len()
    }

    /// Reveals one more character.
    pub fn advance(&mut self) -> Step<'_> {
        if self.revealed >= self.ends.len() {
            return Step::Exhausted;
        }
        self.revealed += 1;
        let end = self.ends[self.revealed - 1];
        if self.revealed == self.ends.len() {
            Step::Complete(&self.text)
        } else {
            Step::Partial(&self.text[..end])
        }
    }
}
