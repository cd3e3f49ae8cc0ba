use lazy_static::lazy_static;
use regex::Regex;

use crate::Position;

lazy_static! {
    // ASCII whitespace only: [\t\n\v\f\r ]. U+00A0 and friends stay inside a term.
    static ref WS: Regex = Regex::new(r"(?-u:\s)+").expect("valid regex");
}

/// Whitespace-delimited terms of a text. Cheap to copy; every call to
/// [`Terms::iter`] starts a new scan from the beginning.
#[derive(Debug, Clone, Copy)]
pub struct Terms<'a> {
    text: &'a str,
}

impl<'a> Terms<'a> {
    /// Iterate `(term, position)` pairs left to right. Positions count only
    /// non-empty tokens, so leading whitespace does not shift them.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Position)> + 'a {
        WS.split(self.text)
            .filter(|t| !t.is_empty())
            .enumerate()
            .map(|(pos, t)| (t, pos as Position))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Tokenize text into (term, position) by splitting on runs of whitespace.
/// No case folding or punctuation stripping is applied.
pub fn tokenize(text: &str) -> Terms<'_> {
    Terms { text }
}

/// Split a query string with the same rule the index uses for documents.
pub fn split_terms(text: &str) -> Vec<&str> {
    tokenize(text).iter().map(|(t, _)| t).collect()
}
