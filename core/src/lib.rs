//! Positional inverted index over short text documents, with boolean
//! conjunction and exact phrase queries.

pub mod corpus;
pub mod error;
pub mod index;
pub mod scene;
pub mod tokenizer;

pub use error::{Error, Result};
pub use index::{DocId, Document, InvertedIndex, Position};
pub use scene::Scene;
