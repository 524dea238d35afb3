//! Direct (document-to-term) index built from stored term vectors.

use std::sync::Arc;

use crate::error::{CivetError, Result};
use crate::index::document::DocumentEntry;
use crate::index::posting::{ArrayPostingCursor, PostingCursor};
use crate::index::termid::TermIdTable;
use crate::store::SegmentStore;

/// Document-to-term postings view, the inverse of the inverted index.
pub trait DirectIndex: Send + Sync {
    /// Posting stream over the terms of one document.
    ///
    /// Ids are term identifiers; enumeration follows the stored term vector's
    /// own order, not sorted id order. Callers requiring sorted output must
    /// sort explicitly.
    fn postings(&self, entry: &DocumentEntry) -> Result<Box<dyn PostingCursor>>;
}

/// Direct index over a single segment.
pub struct SegmentDirectIndex {
    store: Arc<dyn SegmentStore>,
    term_ids: Arc<TermIdTable>,
    positional: bool,
}

impl SegmentDirectIndex {
    pub(crate) fn new(
        store: Arc<dyn SegmentStore>,
        term_ids: Arc<TermIdTable>,
        positional: bool,
    ) -> Self {
        SegmentDirectIndex {
            store,
            term_ids,
            positional,
        }
    }
}

impl DirectIndex for SegmentDirectIndex {
    fn postings(&self, entry: &DocumentEntry) -> Result<Box<dyn PostingCursor>> {
        let mut vector = self.store.term_vector(entry.doc_id)?.ok_or_else(|| {
            CivetError::corrupted(format!(
                "no term vector stored for document {}",
                entry.doc_id
            ))
        })?;

        let mut ids = Vec::new();
        let mut frequencies = Vec::new();
        let mut positions = Vec::new();
        while let Some(term) = vector.next_term()? {
            // The table is built from this segment's dictionary; a vector
            // term missing from it is an invariant violation, never dropped.
            let term_id = self.term_ids.id_of(&term).map_err(|_| {
                CivetError::corrupted(format!(
                    "term vector term {term:?} of document {} is missing from the term identifier table",
                    entry.doc_id
                ))
            })?;
            let frequency = vector.frequency();
            ids.push(term_id);
            frequencies.push(frequency);
            if self.positional {
                let mut term_positions = Vec::with_capacity(frequency as usize);
                for _ in 0..frequency {
                    term_positions.push(vector.next_position()?);
                }
                positions.push(term_positions);
            }
        }

        if self.positional {
            Ok(Box::new(ArrayPostingCursor::with_positions(
                ids,
                frequencies,
                positions,
                entry.length,
            )))
        } else {
            Ok(Box::new(ArrayPostingCursor::new(
                ids,
                frequencies,
                entry.length,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::config::DocLengthSource;
    use crate::index::document::{DocumentIndex, SegmentDocumentIndex};
    use crate::index::posting::END_OF_LIST;
    use crate::store::memory::MemorySegmentBuilder;

    fn direct_over(texts: &[&str], positional: bool) -> (SegmentDirectIndex, SegmentDocumentIndex) {
        let mut builder = MemorySegmentBuilder::new()
            .positions(positional)
            .term_vectors(true);
        for (i, text) in texts.iter().enumerate() {
            builder = builder.add_document(&format!("doc{}", i + 1), text);
        }
        let store: Arc<dyn SegmentStore> = Arc::new(builder.build());
        let table = Arc::new(TermIdTable::build(store.as_ref()).unwrap());
        (
            SegmentDirectIndex::new(Arc::clone(&store), table, positional),
            SegmentDocumentIndex::new(store, DocLengthSource::NormValue),
        )
    }

    #[test]
    fn test_round_trip_frequencies() {
        let (direct, documents) = direct_over(&["a a b"], false);
        let entry = documents.entry(0).unwrap().unwrap();
        let mut cursor = direct.postings(&entry).unwrap();

        let mut seen = Vec::new();
        loop {
            let id = cursor.advance().unwrap();
            if id == END_OF_LIST {
                break;
            }
            seen.push((id, cursor.frequency()));
        }
        // vector order is the per-document term order: a, b
        assert_eq!(seen, vec![(0, 2), (1, 1)]);
        assert_eq!(direct.term_ids.term_of(0).unwrap(), "a");
        assert_eq!(direct.term_ids.term_of(1).unwrap(), "b");
    }

    #[test]
    fn test_positions_follow_frequencies() {
        let (direct, documents) = direct_over(&["hello there fox", "the lazy fox"], true);
        let entry = documents.entry(0).unwrap().unwrap();
        let mut cursor = direct.postings(&entry).unwrap();

        // fox=0, hello=1, the=3, there=4 in the global table
        assert_eq!(cursor.advance().unwrap(), 0);
        assert_eq!(cursor.positions().unwrap(), &[2]);
        assert_eq!(cursor.doc_length().unwrap(), 3);
        assert_eq!(cursor.advance().unwrap(), 1);
        assert_eq!(cursor.positions().unwrap(), &[0]);
        assert_eq!(cursor.advance().unwrap(), 4);
        assert_eq!(cursor.positions().unwrap(), &[1]);
        assert_eq!(cursor.advance().unwrap(), END_OF_LIST);
    }
}
