use std::io;

use thiserror::Error;

/// Errors raised while loading a corpus or building an index.
#[derive(Error, Debug)]
pub enum Error {
    /// A document handed to `build` has no usable text. `offset` is its
    /// position in the input sequence.
    #[error("document at offset {offset} has no text field")]
    MissingText { offset: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The corpus file parsed but does not have a recognised shape.
    #[error("corpus error: {0}")]
    Corpus(String),
}

pub type Result<T> = std::result::Result<T, Error>;
