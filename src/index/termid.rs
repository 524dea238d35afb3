//! Immutable term-identifier table.
//!
//! Built once per segment at adapter-open time by enumerating the term
//! dictionary in sorted order; ids are the positions of that enumeration.
//! The mapping is bijective and never mutated afterwards, so later changes to
//! the underlying store are invisible until the segment is reopened.

use ahash::AHashMap;

use crate::error::{CivetError, Result};
use crate::store::{SegmentStore, TermId};

/// Bidirectional mapping between term strings and dense integer ids.
#[derive(Debug)]
pub struct TermIdTable {
    /// Terms in id order.
    terms: Vec<String>,
    ids: AHashMap<String, TermId>,
}

impl TermIdTable {
    /// Build the table from a full sorted dictionary scan.
    ///
    /// Fails when the dictionary is empty: a direct index over zero terms
    /// signals a malformed source.
    pub fn build(store: &dyn SegmentStore) -> Result<Self> {
        let mut cursor = store.terms()?;
        let mut terms = Vec::new();
        let mut ids = AHashMap::new();
        while let Some(entry) = cursor.next()? {
            ids.insert(entry.term.clone(), terms.len() as TermId);
            terms.push(entry.term);
        }
        if terms.is_empty() {
            return Err(CivetError::config(
                "cannot build a term identifier table over an empty term dictionary",
            ));
        }
        Ok(TermIdTable { terms, ids })
    }

    /// Number of terms in the table.
    pub fn len(&self) -> u64 {
        self.terms.len() as u64
    }

    /// Whether the table holds no terms; never true for a built table.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Id assigned to a term.
    pub fn id_of(&self, term: &str) -> Result<TermId> {
        self.ids
            .get(term)
            .copied()
            .ok_or_else(|| CivetError::not_found(format!("term {term:?} is not in the dictionary")))
    }

    /// Term assigned to an id.
    pub fn term_of(&self, term_id: TermId) -> Result<&str> {
        self.terms
            .get(term_id as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                CivetError::not_found(format!(
                    "term id {term_id} out of range (0..{})",
                    self.terms.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySegmentBuilder;

    #[test]
    fn test_ids_follow_sorted_dictionary_order() {
        let segment = MemorySegmentBuilder::new()
            .add_document("doc1", "hello there fox")
            .add_document("doc2", "the lazy fox")
            .build();
        let table = TermIdTable::build(&segment).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.id_of("fox").unwrap(), 0);
        assert_eq!(table.id_of("hello").unwrap(), 1);
        assert_eq!(table.id_of("there").unwrap(), 4);
    }

    #[test]
    fn test_bijection() {
        let segment = MemorySegmentBuilder::new()
            .add_document("doc1", "c a b a")
            .build();
        let table = TermIdTable::build(&segment).unwrap();

        for id in 0..table.len() {
            let term = table.term_of(id).unwrap().to_string();
            assert_eq!(table.id_of(&term).unwrap(), id);
        }
        assert!(table.term_of(table.len()).is_err());
        assert!(table.id_of("zebra").is_err());
    }

    #[test]
    fn test_empty_dictionary_fails() {
        let segment = MemorySegmentBuilder::new().build();
        match TermIdTable::build(&segment) {
            Err(CivetError::Config(_)) => {}
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
