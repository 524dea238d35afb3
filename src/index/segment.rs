//! Single-segment index adapter.
//!
//! [`SegmentIndex`] wires one [`SegmentStore`] into the full structure set.
//! All validation happens at open time; a failed open never yields a
//! partially initialized adapter.

use std::sync::Arc;

use log::debug;

use crate::error::{CivetError, Result};
use crate::index::config::{DocLengthSource, IndexMode, OpenOptions};
use crate::index::direct::{DirectIndex, SegmentDirectIndex};
use crate::index::document::{DocumentIndex, SegmentDocumentIndex};
use crate::index::lexicon::{Lexicon, LexiconEntry, SegmentLexicon};
use crate::index::meta::{MetaIndex, SegmentMetaIndex};
use crate::index::posting::{PostingCursor, PostingIndex, open_term_postings};
use crate::index::termid::TermIdTable;
use crate::index::{CollectionStatistics, Index, StructureKind};
use crate::store::SegmentStore;

/// Adapter exposing one closed, immutable segment as a logical index.
pub struct SegmentIndex {
    store: Arc<dyn SegmentStore>,
    options: OpenOptions,
    positional: bool,
    term_ids: Option<Arc<TermIdTable>>,
}

impl SegmentIndex {
    /// Open an adapter over a segment store.
    ///
    /// Validates the configured capabilities against the store and, in direct
    /// mode, performs the eager full-dictionary scan that assigns term ids.
    pub fn open(store: Arc<dyn SegmentStore>, options: OpenOptions) -> Result<Self> {
        if !store.has_stored_field(&options.docno_field) {
            return Err(CivetError::config(format!(
                "store has no stored field {:?} for document identifiers",
                options.docno_field
            )));
        }
        match options.doc_length_source {
            DocLengthSource::NormValue => {
                if !store.has_norms() {
                    return Err(CivetError::config(
                        "normalization values are not stored, document lengths cannot be decoded",
                    ));
                }
            }
            DocLengthSource::TermVectorSum => {
                if !store.has_term_vectors() {
                    return Err(CivetError::config(
                        "term vectors are not stored, document lengths cannot be summed",
                    ));
                }
            }
        }

        let term_ids = match options.mode {
            IndexMode::Basic => None,
            IndexMode::Direct => {
                if store.doc_count() == 0 {
                    return Err(CivetError::unsupported(
                        "zero-document stores cannot back a direct index",
                    ));
                }
                if !store.has_term_vectors() {
                    return Err(CivetError::config(
                        "store has no term vectors, a direct index cannot be built",
                    ));
                }
                Some(Arc::new(TermIdTable::build(store.as_ref())?))
            }
        };

        let positional = store.has_positions();
        debug!(
            "opened segment adapter: {} documents, positional={}, direct={}",
            store.doc_count(),
            positional,
            term_ids.is_some()
        );
        Ok(SegmentIndex {
            store,
            options,
            positional,
            term_ids,
        })
    }

    /// Whether postings carry within-document positions.
    pub fn positional(&self) -> bool {
        self.positional
    }

    /// Number of documents in this segment.
    pub fn doc_count(&self) -> u64 {
        self.store.doc_count()
    }

    /// Inverted posting cursor for a term, or `None` when the term is absent.
    ///
    /// Used directly by the multi-segment composer, which skips segments that
    /// do not contain the term.
    pub(crate) fn term_postings(&self, term: &str) -> Result<Option<Box<dyn PostingCursor>>> {
        open_term_postings(
            &self.store,
            term,
            self.options.doc_length_source,
            self.positional,
        )
    }
}

impl Index for SegmentIndex {
    fn lexicon(&self) -> Result<Box<dyn Lexicon>> {
        Ok(Box::new(SegmentLexicon::new(
            Arc::clone(&self.store),
            self.term_ids.clone(),
        )))
    }

    fn inverted_index(&self) -> Result<Box<dyn PostingIndex>> {
        Ok(Box::new(SegmentPostingIndex {
            store: Arc::clone(&self.store),
            length_source: self.options.doc_length_source,
            positional: self.positional,
        }))
    }

    fn direct_index(&self) -> Result<Box<dyn DirectIndex>> {
        match &self.term_ids {
            Some(table) => Ok(Box::new(SegmentDirectIndex::new(
                Arc::clone(&self.store),
                Arc::clone(table),
                self.positional,
            ))),
            None => Err(CivetError::unsupported(
                "index was not opened in direct mode",
            )),
        }
    }

    fn document_index(&self) -> Result<Box<dyn DocumentIndex>> {
        Ok(Box::new(SegmentDocumentIndex::new(
            Arc::clone(&self.store),
            self.options.doc_length_source,
        )))
    }

    fn meta_index(&self) -> Result<Box<dyn MetaIndex>> {
        Ok(Box::new(SegmentMetaIndex::new(
            Arc::clone(&self.store),
            self.options.docno_field.clone(),
        )))
    }

    fn statistics(&self) -> Result<CollectionStatistics> {
        Ok(CollectionStatistics {
            documents: self.store.doc_count(),
            unique_terms: self.store.term_count()?,
            tokens: self.store.token_count()?,
            pointers: self.store.pointer_count()?,
        })
    }

    fn supports(&self, kind: StructureKind) -> bool {
        match kind {
            StructureKind::Direct => self.term_ids.is_some(),
            _ => true,
        }
    }
}

/// Inverted index over a single segment.
struct SegmentPostingIndex {
    store: Arc<dyn SegmentStore>,
    length_source: DocLengthSource,
    positional: bool,
}

impl PostingIndex for SegmentPostingIndex {
    fn postings(&self, entry: &LexiconEntry) -> Result<Box<dyn PostingCursor>> {
        open_term_postings(&self.store, &entry.term, self.length_source, self.positional)?
            .ok_or_else(|| {
                CivetError::corrupted(format!(
                    "postings missing for lexicon term {:?}",
                    entry.term
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySegmentBuilder;

    fn store(term_vectors: bool) -> Arc<dyn SegmentStore> {
        Arc::new(
            MemorySegmentBuilder::new()
                .term_vectors(term_vectors)
                .add_document("doc1", "hello there fox")
                .add_document("doc2", "the lazy fox")
                .build(),
        )
    }

    #[test]
    fn test_open_basic() {
        let index = SegmentIndex::open(store(false), OpenOptions::basic()).unwrap();
        assert!(index.supports(StructureKind::Lexicon));
        assert!(index.supports(StructureKind::Inverted));
        assert!(index.supports(StructureKind::Document));
        assert!(index.supports(StructureKind::Meta));
        assert!(!index.supports(StructureKind::Direct));
        assert!(matches!(
            index.direct_index(),
            Err(CivetError::Unsupported(_))
        ));
    }

    #[test]
    fn test_open_direct_requires_term_vectors() {
        match SegmentIndex::open(store(false), OpenOptions::direct()) {
            Err(CivetError::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }

        let index = SegmentIndex::open(store(true), OpenOptions::direct()).unwrap();
        assert!(index.supports(StructureKind::Direct));
        assert!(index.direct_index().is_ok());
    }

    #[test]
    fn test_open_direct_rejects_empty_stores() {
        let empty: Arc<dyn SegmentStore> =
            Arc::new(MemorySegmentBuilder::new().term_vectors(true).build());
        match SegmentIndex::open(empty, OpenOptions::direct()) {
            Err(CivetError::Unsupported(_)) => {}
            other => panic!("expected Unsupported error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_rejects_missing_docno_field() {
        match SegmentIndex::open(store(false), OpenOptions::basic().docno_field("missing")) {
            Err(CivetError::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_term_vector_lengths_require_vectors() {
        let options = OpenOptions::basic().doc_length_source(DocLengthSource::TermVectorSum);
        match SegmentIndex::open(store(false), options) {
            Err(CivetError::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_statistics() {
        let index = SegmentIndex::open(store(false), OpenOptions::basic()).unwrap();
        let stats = index.statistics().unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.unique_terms, 5);
        assert_eq!(stats.tokens, 6);
        assert_eq!(stats.pointers, 6);
    }
}
