use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::tokenizer::{split_terms, tokenize};

pub type DocId = u32;
pub type Position = u32;

/// Something that can be indexed. Identity is `Eq + Hash`; two equal
/// documents collapse into one collection entry.
pub trait Document: Eq + Hash {
    /// The text to index, or `None` when the record has no text field.
    fn text(&self) -> Option<&str>;
}

/// doc_id -> strictly increasing positions of one term in that document.
pub type Postings = HashMap<DocId, Vec<Position>>;

#[derive(Debug)]
pub struct InvertedIndex<D> {
    postings: HashMap<String, Postings>,
    docs: Vec<Arc<D>>,
    doc_ids: HashMap<Arc<D>, DocId>,
    /// number of tokens per document, indexed by doc_id
    doc_lens: Vec<u32>,
}

impl<D> Default for InvertedIndex<D> {
    fn default() -> Self {
        Self {
            postings: HashMap::new(),
            docs: Vec::new(),
            doc_ids: HashMap::new(),
            doc_lens: Vec::new(),
        }
    }
}

impl<D: Document> InvertedIndex<D> {
    pub fn new() -> Self { Self::default() }

    /// Index a batch of documents.
    ///
    /// Every document is checked for text before anything is indexed, so a
    /// malformed record fails the whole batch and leaves the index untouched.
    /// Documents already in the collection are skipped; calling `build` again
    /// with new documents appends them.
    pub fn build<I>(&mut self, documents: I) -> Result<()>
    where
        I: IntoIterator<Item = D>,
    {
        let documents: Vec<D> = documents.into_iter().collect();
        if let Some(offset) = documents.iter().position(|d| d.text().is_none()) {
            return Err(Error::MissingText { offset });
        }

        let before = self.docs.len();
        for doc in documents {
            self.add(doc);
        }
        tracing::info!(
            added = self.docs.len() - before,
            num_docs = self.docs.len(),
            num_terms = self.postings.len(),
            "index build complete"
        );
        Ok(())
    }

    fn add(&mut self, doc: D) {
        if self.doc_ids.contains_key(&doc) {
            return;
        }
        let doc_id = self.docs.len() as DocId;
        let doc = Arc::new(doc);

        let mut len = 0u32;
        for (term, pos) in tokenize(doc.text().unwrap_or_default()).iter() {
            // Clone the term only on its first occurrence in the corpus.
            match self.postings.get_mut(term) {
                Some(docs) => docs.entry(doc_id).or_default().push(pos),
                None => {
                    let mut docs = Postings::new();
                    docs.insert(doc_id, vec![pos]);
                    self.postings.insert(term.to_string(), docs);
                }
            }
            len += 1;
        }

        self.doc_lens.push(len);
        self.doc_ids.insert(Arc::clone(&doc), doc_id);
        self.docs.push(doc);
    }

    /// Documents containing every whitespace-separated term of `query`.
    pub fn query_all(&self, query: &str) -> HashSet<&D> {
        self.resolve(self.query_all_ids(query))
    }

    /// Documents containing the terms of `query` as a contiguous, in-order run.
    pub fn query_phrase(&self, query: &str) -> HashSet<&D> {
        self.resolve(self.query_phrase_ids(query))
    }

    /// Run either query form.
    pub fn query(&self, query: &str, phrase: bool) -> HashSet<&D> {
        if phrase {
            self.query_phrase(query)
        } else {
            self.query_all(query)
        }
    }

    pub fn query_all_ids(&self, query: &str) -> HashSet<DocId> {
        let start = Instant::now();
        let hits = self.conjunction(&split_terms(query));
        tracing::debug!(query, hits = hits.len(), took_s = start.elapsed().as_secs_f64(), "boolean query");
        hits
    }

    pub fn query_phrase_ids(&self, query: &str) -> HashSet<DocId> {
        let start = Instant::now();
        let hits = self.phrase(&split_terms(query));
        tracing::debug!(query, hits = hits.len(), took_s = start.elapsed().as_secs_f64(), "phrase query");
        hits
    }

    fn conjunction(&self, terms: &[&str]) -> HashSet<DocId> {
        let mut lists: Vec<&Postings> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings.get(*term) {
                Some(docs) => lists.push(docs),
                None => return HashSet::new(),
            }
        }
        // Drive the intersection from the rarest term.
        lists.sort_by_key(|docs| docs.len());
        let Some((rarest, rest)) = lists.split_first() else {
            return HashSet::new();
        };
        rarest
            .keys()
            .copied()
            .filter(|id| rest.iter().all(|docs| docs.contains_key(id)))
            .collect()
    }

    fn phrase(&self, terms: &[&str]) -> HashSet<DocId> {
        let candidates = self.conjunction(terms);
        let Some((first, rest)) = terms.split_first() else {
            return HashSet::new();
        };
        let Some(head) = self.postings.get(*first) else {
            return HashSet::new();
        };

        // Owned copies: narrowing below must never touch the stored postings.
        let mut tracked: HashMap<DocId, Vec<Position>> = candidates
            .iter()
            .filter_map(|id| head.get(id).map(|positions| (*id, positions.clone())))
            .collect();

        for term in rest {
            if tracked.is_empty() {
                break;
            }
            let Some(next) = self.postings.get(*term) else {
                return HashSet::new();
            };
            tracked.retain(|id, positions| {
                let Some(following) = next.get(id) else {
                    return false;
                };
                *positions = positions
                    .iter()
                    .map(|p| p + 1)
                    .filter(|p| following.binary_search(p).is_ok())
                    .collect();
                !positions.is_empty()
            });
        }
        tracked.into_keys().collect()
    }

    fn resolve(&self, ids: HashSet<DocId>) -> HashSet<&D> {
        ids.into_iter().filter_map(|id| self.document(id)).collect()
    }

    pub fn document(&self, doc_id: DocId) -> Option<&D> {
        self.docs.get(doc_id as usize).map(|d| d.as_ref())
    }

    pub fn doc_id(&self, doc: &D) -> Option<DocId> {
        self.doc_ids.get(doc).copied()
    }

    /// The whole collection in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &D> + '_ {
        self.docs.iter().map(|d| d.as_ref())
    }

    /// Positions of `term` in a document (empty if absent).
    pub fn positions(&self, term: &str, doc_id: DocId) -> &[Position] {
        self.postings
            .get(term)
            .and_then(|docs| docs.get(&doc_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of documents containing `term`.
    pub fn doc_freq(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, |docs| docs.len())
    }

    /// Token count of a document (0 if unknown).
    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.doc_lens.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}
