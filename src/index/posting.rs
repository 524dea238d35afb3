//! Posting cursors over the inverted and direct index paths.
//!
//! A [`PostingCursor`] is a pull-based iterator over one term's occurrences
//! (or, on the direct path, one document's terms). Cursors are exclusively
//! owned by their creator, advanced single-threadedly, and produce ids in the
//! order of the underlying stream, terminating with [`END_OF_LIST`] exactly
//! once.

use std::sync::Arc;

use crate::error::{CivetError, Result};
use crate::index::config::DocLengthSource;
use crate::index::lexicon::LexiconEntry;
use crate::norm;
use crate::store::{DocId, NormCursor, SegmentStore, StorePostingsCursor};

/// End-of-list sentinel, distinct from every valid document id.
pub const END_OF_LIST: DocId = DocId::MAX;

/// Pull-based iterator over a posting list.
///
/// [`advance`](Self::advance) returns ids in strictly increasing order and
/// [`END_OF_LIST`] once the stream is exhausted; advancing past the sentinel
/// is undefined and must not be attempted. The per-posting accessors are
/// valid only while the cursor is positioned on an entry, and their values
/// are not retained across an advance.
pub trait PostingCursor: Send {
    /// Move to the next entry, returning its id or [`END_OF_LIST`].
    fn advance(&mut self) -> Result<DocId>;

    /// Id of the current entry, or [`END_OF_LIST`] when not positioned.
    fn doc_id(&self) -> DocId;

    /// Occurrence count of the current entry.
    fn frequency(&self) -> u32;

    /// Length (token count) of the current document.
    fn doc_length(&self) -> Result<u32>;

    /// Within-document positions of the current entry.
    ///
    /// Fails with an unsupported-capability error when the index was opened
    /// without positional information.
    fn positions(&mut self) -> Result<&[u32]>;
}

/// Source of term postings, keyed by lexicon entry.
pub trait PostingIndex: Send + Sync {
    /// Fresh cursor over the postings of the given lexicon entry.
    fn postings(&self, entry: &LexiconEntry) -> Result<Box<dyn PostingCursor>>;
}

/// Inverted-path cursor coupling a raw occurrence stream with the parallel
/// normalization stream of its segment.
pub struct SegmentPostingCursor {
    postings: Box<dyn StorePostingsCursor>,
    norms: Option<Box<dyn NormCursor>>,
    store: Arc<dyn SegmentStore>,
    length_source: DocLengthSource,
    positional: bool,
    doc_id: DocId,
    frequency: u32,
    norm_value: u8,
    positions: Option<Vec<u32>>,
}

impl SegmentPostingCursor {
    pub(crate) fn new(
        postings: Box<dyn StorePostingsCursor>,
        norms: Option<Box<dyn NormCursor>>,
        store: Arc<dyn SegmentStore>,
        length_source: DocLengthSource,
        positional: bool,
    ) -> Self {
        SegmentPostingCursor {
            postings,
            norms,
            store,
            length_source,
            positional,
            doc_id: END_OF_LIST,
            frequency: 0,
            norm_value: 0,
            positions: None,
        }
    }
}

impl PostingCursor for SegmentPostingCursor {
    fn advance(&mut self) -> Result<DocId> {
        self.positions = None;
        match self.postings.next_doc()? {
            Some(doc_id) => {
                self.frequency = self.postings.frequency();
                if let Some(norms) = &mut self.norms {
                    self.norm_value = norms.advance(doc_id)?;
                }
                self.doc_id = doc_id;
                Ok(doc_id)
            }
            None => {
                self.frequency = 0;
                self.doc_id = END_OF_LIST;
                Ok(END_OF_LIST)
            }
        }
    }

    fn doc_id(&self) -> DocId {
        self.doc_id
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn doc_length(&self) -> Result<u32> {
        if self.doc_id == END_OF_LIST {
            return Err(CivetError::invalid_operation(
                "cursor is not positioned on a document",
            ));
        }
        match self.length_source {
            DocLengthSource::NormValue => Ok(norm::decode_length(self.norm_value)),
            DocLengthSource::TermVectorSum => {
                let mut vector = self.store.term_vector(self.doc_id)?.ok_or_else(|| {
                    CivetError::corrupted(format!(
                        "no term vector stored for document {}",
                        self.doc_id
                    ))
                })?;
                let mut length = 0u32;
                while vector.next_term()?.is_some() {
                    length += vector.frequency();
                }
                Ok(length)
            }
        }
    }

    fn positions(&mut self) -> Result<&[u32]> {
        if !self.positional {
            return Err(CivetError::unsupported(
                "positions were not indexed for this segment",
            ));
        }
        if self.doc_id == END_OF_LIST {
            return Err(CivetError::invalid_operation(
                "cursor is not positioned on a document",
            ));
        }
        if self.positions.is_none() {
            // The raw stream is flat: read exactly `frequency` positions so
            // no position leaks into the next document.
            let mut buffer = Vec::with_capacity(self.frequency as usize);
            for _ in 0..self.frequency {
                buffer.push(self.postings.next_position()?);
            }
            self.positions = Some(buffer);
        }
        Ok(self.positions.as_deref().unwrap_or(&[]))
    }
}

/// Materialized cursor over parallel arrays.
///
/// Used by the direct index, where ids are term identifiers and the
/// enumeration order is the source term vector's own order, not sorted id
/// order.
pub struct ArrayPostingCursor {
    ids: Vec<DocId>,
    frequencies: Vec<u32>,
    positions: Option<Vec<Vec<u32>>>,
    doc_length: u32,
    current: Option<usize>,
    next: usize,
}

impl ArrayPostingCursor {
    /// Cursor without positional information.
    pub fn new(ids: Vec<DocId>, frequencies: Vec<u32>, doc_length: u32) -> Self {
        ArrayPostingCursor {
            ids,
            frequencies,
            positions: None,
            doc_length,
            current: None,
            next: 0,
        }
    }

    /// Cursor with one position list per entry.
    pub fn with_positions(
        ids: Vec<DocId>,
        frequencies: Vec<u32>,
        positions: Vec<Vec<u32>>,
        doc_length: u32,
    ) -> Self {
        ArrayPostingCursor {
            ids,
            frequencies,
            positions: Some(positions),
            doc_length,
            current: None,
            next: 0,
        }
    }
}

impl PostingCursor for ArrayPostingCursor {
    fn advance(&mut self) -> Result<DocId> {
        if self.next < self.ids.len() {
            self.current = Some(self.next);
            self.next += 1;
            Ok(self.ids[self.next - 1])
        } else {
            self.current = None;
            Ok(END_OF_LIST)
        }
    }

    fn doc_id(&self) -> DocId {
        self.current.map_or(END_OF_LIST, |index| self.ids[index])
    }

    fn frequency(&self) -> u32 {
        self.current.map_or(0, |index| self.frequencies[index])
    }

    fn doc_length(&self) -> Result<u32> {
        Ok(self.doc_length)
    }

    fn positions(&mut self) -> Result<&[u32]> {
        let positions = self.positions.as_ref().ok_or_else(|| {
            CivetError::unsupported("positions were not indexed for this segment")
        })?;
        let index = self.current.ok_or_else(|| {
            CivetError::invalid_operation("cursor is not positioned on an entry")
        })?;
        Ok(&positions[index])
    }
}

/// Open an inverted posting cursor for a term, or `None` when the term is
/// absent (or recorded with zero occurrences).
pub(crate) fn open_term_postings(
    store: &Arc<dyn SegmentStore>,
    term: &str,
    length_source: DocLengthSource,
    positional: bool,
) -> Result<Option<Box<dyn PostingCursor>>> {
    let Some(entry) = store.term_entry(term)? else {
        return Ok(None);
    };
    if entry.collection_frequency == 0 {
        return Ok(None);
    }
    let postings = store.postings(term)?.ok_or_else(|| {
        CivetError::corrupted(format!("postings missing for dictionary term {term:?}"))
    })?;
    let norms = match length_source {
        DocLengthSource::NormValue => Some(store.norms()?),
        DocLengthSource::TermVectorSum => None,
    };
    Ok(Some(Box::new(SegmentPostingCursor::new(
        postings,
        norms,
        Arc::clone(store),
        length_source,
        positional,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySegmentBuilder;

    fn fox_cursor(positional: bool) -> Box<dyn PostingCursor> {
        let segment = MemorySegmentBuilder::new()
            .positions(positional)
            .add_document("doc1", "hello there fox")
            .add_document("doc2", "the lazy fox")
            .build();
        let store: Arc<dyn SegmentStore> = Arc::new(segment);
        open_term_postings(&store, "fox", DocLengthSource::NormValue, positional)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_ids_increase_and_terminate_once() {
        let mut cursor = fox_cursor(false);
        assert_eq!(cursor.doc_id(), END_OF_LIST);

        assert_eq!(cursor.advance().unwrap(), 0);
        assert_eq!(cursor.doc_id(), 0);
        assert_eq!(cursor.frequency(), 1);
        assert_eq!(cursor.doc_length().unwrap(), 3);

        assert_eq!(cursor.advance().unwrap(), 1);
        assert_eq!(cursor.doc_length().unwrap(), 3);

        assert_eq!(cursor.advance().unwrap(), END_OF_LIST);
        assert_eq!(cursor.doc_id(), END_OF_LIST);
    }

    #[test]
    fn test_positions_are_grouped_per_document() {
        let segment = MemorySegmentBuilder::new()
            .positions(true)
            .add_document("doc1", "fox fox cub")
            .add_document("doc2", "a fox")
            .build();
        let store: Arc<dyn SegmentStore> = Arc::new(segment);
        let mut cursor = open_term_postings(&store, "fox", DocLengthSource::NormValue, true)
            .unwrap()
            .unwrap();

        assert_eq!(cursor.advance().unwrap(), 0);
        assert_eq!(cursor.frequency(), 2);
        assert_eq!(cursor.positions().unwrap(), &[0, 1]);
        // repeated calls return the cached list, not further stream reads
        assert_eq!(cursor.positions().unwrap(), &[0, 1]);

        assert_eq!(cursor.advance().unwrap(), 1);
        assert_eq!(cursor.positions().unwrap(), &[1]);
    }

    #[test]
    fn test_positions_unsupported_without_positional_indexing() {
        let mut cursor = fox_cursor(false);
        cursor.advance().unwrap();
        match cursor.positions() {
            Err(CivetError::Unsupported(_)) => {}
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn test_absent_term_has_no_cursor() {
        let segment = MemorySegmentBuilder::new().add_document("doc1", "a b").build();
        let store: Arc<dyn SegmentStore> = Arc::new(segment);
        let cursor = open_term_postings(&store, "zebra", DocLengthSource::NormValue, false).unwrap();
        assert!(cursor.is_none());
    }

    #[test]
    fn test_array_cursor_preserves_source_order() {
        let mut cursor = ArrayPostingCursor::with_positions(
            vec![4, 1, 2],
            vec![2, 1, 1],
            vec![vec![0, 3], vec![1], vec![2]],
            4,
        );
        assert_eq!(cursor.advance().unwrap(), 4);
        assert_eq!(cursor.frequency(), 2);
        assert_eq!(cursor.positions().unwrap(), &[0, 3]);
        assert_eq!(cursor.doc_length().unwrap(), 4);
        assert_eq!(cursor.advance().unwrap(), 1);
        assert_eq!(cursor.advance().unwrap(), 2);
        assert_eq!(cursor.advance().unwrap(), END_OF_LIST);
    }
}
