//! Document-length index adapter.

use std::sync::Arc;

use crate::error::{CivetError, Result};
use crate::index::config::DocLengthSource;
use crate::store::{DocId, SegmentStore};

/// One document's entry: its length and the structural pointer (segment-local
/// offset plus term-vector size) the direct index needs to reconstruct its
/// posting list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// Document id; segment-local on a single segment, global on a composed
    /// index.
    pub doc_id: DocId,
    /// Token count of the document.
    pub length: u32,
    /// Number of distinct terms in the stored term vector (zero when vectors
    /// are not kept).
    pub term_count: u32,
}

/// Read access to per-document lengths and entries.
pub trait DocumentIndex: Send + Sync {
    /// Number of documents in the index.
    fn doc_count(&self) -> u64;

    /// Token count of a document; absent ids yield `None`.
    fn length(&self, doc_id: DocId) -> Result<Option<u32>>;

    /// Full entry for a document; absent ids yield `None`.
    fn entry(&self, doc_id: DocId) -> Result<Option<DocumentEntry>>;
}

/// Document index over a single segment.
///
/// Lengths come from exactly one source, fixed for the whole index instance
/// at open time.
pub struct SegmentDocumentIndex {
    store: Arc<dyn SegmentStore>,
    length_source: DocLengthSource,
}

impl SegmentDocumentIndex {
    pub(crate) fn new(store: Arc<dyn SegmentStore>, length_source: DocLengthSource) -> Self {
        SegmentDocumentIndex {
            store,
            length_source,
        }
    }
}

impl DocumentIndex for SegmentDocumentIndex {
    fn doc_count(&self) -> u64 {
        self.store.doc_count()
    }

    fn length(&self, doc_id: DocId) -> Result<Option<u32>> {
        if doc_id >= self.store.doc_count() {
            return Ok(None);
        }
        match self.length_source {
            DocLengthSource::NormValue => {
                let norm = self.store.norms()?.advance(doc_id)?;
                Ok(Some(crate::norm::decode_length(norm)))
            }
            DocLengthSource::TermVectorSum => {
                let mut vector = self.store.term_vector(doc_id)?.ok_or_else(|| {
                    CivetError::corrupted(format!("no term vector stored for document {doc_id}"))
                })?;
                let mut length = 0u32;
                while vector.next_term()?.is_some() {
                    length += vector.frequency();
                }
                Ok(Some(length))
            }
        }
    }

    fn entry(&self, doc_id: DocId) -> Result<Option<DocumentEntry>> {
        let Some(length) = self.length(doc_id)? else {
            return Ok(None);
        };
        let term_count = match self.store.term_vector(doc_id)? {
            Some(mut vector) => {
                let mut count = 0u32;
                while vector.next_term()?.is_some() {
                    count += 1;
                }
                count
            }
            None => 0,
        };
        Ok(Some(DocumentEntry {
            doc_id,
            length,
            term_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySegmentBuilder;

    fn segment_store() -> Arc<dyn SegmentStore> {
        Arc::new(
            MemorySegmentBuilder::new()
                .term_vectors(true)
                .add_document("doc1", "hello there fox")
                .add_document("doc2", "the lazy fox fox")
                .build(),
        )
    }

    #[test]
    fn test_lengths_from_norms() {
        let index = SegmentDocumentIndex::new(segment_store(), DocLengthSource::NormValue);
        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.length(0).unwrap(), Some(3));
        assert_eq!(index.length(1).unwrap(), Some(4));
        assert_eq!(index.length(2).unwrap(), None);
    }

    #[test]
    fn test_lengths_from_term_vectors() {
        let index = SegmentDocumentIndex::new(segment_store(), DocLengthSource::TermVectorSum);
        assert_eq!(index.length(0).unwrap(), Some(3));
        assert_eq!(index.length(1).unwrap(), Some(4));
    }

    #[test]
    fn test_entry_carries_term_vector_size() {
        let index = SegmentDocumentIndex::new(segment_store(), DocLengthSource::NormValue);
        let entry = index.entry(1).unwrap().unwrap();
        assert_eq!(entry.doc_id, 1);
        assert_eq!(entry.length, 4);
        assert_eq!(entry.term_count, 3);
        assert!(index.entry(5).unwrap().is_none());
    }
}
