//! In-memory segment store implementation for testing and embedding.
//!
//! [`MemorySegment`] is a complete, immutable [`SegmentStore`] built from raw
//! document text. Tokenization splits on Unicode word boundaries and
//! lowercases, so small fixtures read naturally. Normalization bytes are
//! produced with the compressed length codec, exactly as a persistent store
//! would keep them.

use std::sync::Arc;

use ahash::AHashMap;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{CivetError, Result};
use crate::norm;
use crate::store::{
    DictEntry, DocId, NormCursor, SegmentStore, StorePostingsCursor, TermDictCursor,
    TermVectorCursor,
};

/// Stored-field name carrying the external document identifier.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone)]
struct PostingData {
    doc_id: DocId,
    frequency: u32,
    positions: Vec<u32>,
}

#[derive(Debug)]
struct TermPostings {
    doc_frequency: u64,
    collection_frequency: u64,
    entries: Arc<Vec<PostingData>>,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    term: String,
    frequency: u32,
    positions: Vec<u32>,
}

#[derive(Debug)]
struct SegmentData {
    /// Dictionary terms in sorted order.
    terms: Vec<String>,
    postings: AHashMap<String, TermPostings>,
    vectors: Option<Vec<Arc<Vec<VectorEntry>>>>,
    norms: Vec<u8>,
    docnos: Vec<String>,
    token_count: u64,
    pointer_count: u64,
    positional: bool,
}

/// An immutable in-memory segment.
///
/// Cheap to clone; all cursors share the same underlying data.
#[derive(Debug, Clone)]
pub struct MemorySegment {
    data: Arc<SegmentData>,
}

/// Builder assembling a [`MemorySegment`] document by document.
#[derive(Debug, Default)]
pub struct MemorySegmentBuilder {
    positional: bool,
    term_vectors: bool,
    docs: Vec<(String, Vec<String>)>,
}

impl MemorySegmentBuilder {
    /// Create a builder with positions and term vectors disabled.
    pub fn new() -> Self {
        MemorySegmentBuilder::default()
    }

    /// Enable or disable positional indexing.
    pub fn positions(mut self, yes: bool) -> Self {
        self.positional = yes;
        self
    }

    /// Enable or disable per-document term vectors.
    pub fn term_vectors(mut self, yes: bool) -> Self {
        self.term_vectors = yes;
        self
    }

    /// Append a document; ids are assigned in insertion order.
    pub fn add_document(mut self, docno: &str, text: &str) -> Self {
        let tokens = text
            .unicode_words()
            .map(|word| word.to_lowercase())
            .collect();
        self.docs.push((docno.to_string(), tokens));
        self
    }

    /// Freeze the collected documents into an immutable segment.
    pub fn build(self) -> MemorySegment {
        let mut dictionary: std::collections::BTreeMap<String, Vec<PostingData>> =
            std::collections::BTreeMap::new();
        let mut vectors = Vec::with_capacity(self.docs.len());
        let mut norms = Vec::with_capacity(self.docs.len());
        let mut docnos = Vec::with_capacity(self.docs.len());
        let mut token_count = 0u64;
        let mut pointer_count = 0u64;

        for (doc_id, (docno, tokens)) in self.docs.into_iter().enumerate() {
            let mut doc_terms: std::collections::BTreeMap<String, Vec<u32>> =
                std::collections::BTreeMap::new();
            for (position, token) in tokens.iter().enumerate() {
                doc_terms
                    .entry(token.clone())
                    .or_default()
                    .push(position as u32);
            }

            token_count += tokens.len() as u64;
            pointer_count += doc_terms.len() as u64;
            norms.push(norm::encode_length(tokens.len() as u32));
            docnos.push(docno);

            let mut vector = Vec::with_capacity(doc_terms.len());
            for (term, positions) in doc_terms {
                let frequency = positions.len() as u32;
                vector.push(VectorEntry {
                    term: term.clone(),
                    frequency,
                    positions: if self.positional {
                        positions.clone()
                    } else {
                        Vec::new()
                    },
                });
                dictionary.entry(term).or_default().push(PostingData {
                    doc_id: doc_id as DocId,
                    frequency,
                    positions: if self.positional { positions } else { Vec::new() },
                });
            }
            vectors.push(Arc::new(vector));
        }

        let terms: Vec<String> = dictionary.keys().cloned().collect();
        let mut postings = AHashMap::with_capacity(dictionary.len());
        for (term, entries) in dictionary {
            let doc_frequency = entries.len() as u64;
            let collection_frequency = entries.iter().map(|p| u64::from(p.frequency)).sum();
            postings.insert(
                term,
                TermPostings {
                    doc_frequency,
                    collection_frequency,
                    entries: Arc::new(entries),
                },
            );
        }

        MemorySegment {
            data: Arc::new(SegmentData {
                terms,
                postings,
                vectors: if self.term_vectors { Some(vectors) } else { None },
                norms,
                docnos,
                token_count,
                pointer_count,
                positional: self.positional,
            }),
        }
    }
}

impl SegmentStore for MemorySegment {
    fn doc_count(&self) -> u64 {
        self.data.docnos.len() as u64
    }

    fn term_count(&self) -> Result<u64> {
        Ok(self.data.terms.len() as u64)
    }

    fn token_count(&self) -> Result<u64> {
        Ok(self.data.token_count)
    }

    fn pointer_count(&self) -> Result<u64> {
        Ok(self.data.pointer_count)
    }

    fn has_positions(&self) -> bool {
        self.data.positional
    }

    fn has_term_vectors(&self) -> bool {
        self.data.vectors.is_some()
    }

    fn has_norms(&self) -> bool {
        true
    }

    fn has_stored_field(&self, name: &str) -> bool {
        name == ID_FIELD
    }

    fn term_entry(&self, term: &str) -> Result<Option<DictEntry>> {
        Ok(self.data.postings.get(term).map(|p| DictEntry {
            term: term.to_string(),
            doc_frequency: p.doc_frequency,
            collection_frequency: p.collection_frequency,
        }))
    }

    fn terms(&self) -> Result<Box<dyn TermDictCursor>> {
        Ok(Box::new(MemoryTermCursor {
            data: Arc::clone(&self.data),
            position: 0,
        }))
    }

    fn postings(&self, term: &str) -> Result<Option<Box<dyn StorePostingsCursor>>> {
        Ok(self.data.postings.get(term).map(|p| {
            Box::new(MemoryPostingsCursor {
                entries: Arc::clone(&p.entries),
                current: None,
                position_index: 0,
                positional: self.data.positional,
            }) as Box<dyn StorePostingsCursor>
        }))
    }

    fn norms(&self) -> Result<Box<dyn NormCursor>> {
        Ok(Box::new(MemoryNormCursor {
            data: Arc::clone(&self.data),
        }))
    }

    fn term_vector(&self, doc_id: DocId) -> Result<Option<Box<dyn TermVectorCursor>>> {
        let Some(vectors) = &self.data.vectors else {
            return Ok(None);
        };
        let vector = vectors
            .get(doc_id as usize)
            .ok_or_else(|| CivetError::store(format!("document id {doc_id} out of range")))?;
        Ok(Some(Box::new(MemoryTermVectorCursor {
            entries: Arc::clone(vector),
            current: None,
            position_index: 0,
            positional: self.data.positional,
        })))
    }

    fn stored_field(&self, doc_id: DocId, name: &str) -> Result<Option<String>> {
        if name != ID_FIELD {
            return Ok(None);
        }
        Ok(self.data.docnos.get(doc_id as usize).cloned())
    }
}

struct MemoryTermCursor {
    data: Arc<SegmentData>,
    position: usize,
}

impl MemoryTermCursor {
    fn entry_at(&self, position: usize) -> Option<DictEntry> {
        let term = self.data.terms.get(position)?;
        let postings = &self.data.postings[term];
        Some(DictEntry {
            term: term.clone(),
            doc_frequency: postings.doc_frequency,
            collection_frequency: postings.collection_frequency,
        })
    }
}

impl TermDictCursor for MemoryTermCursor {
    fn next(&mut self) -> Result<Option<DictEntry>> {
        let entry = self.entry_at(self.position);
        if entry.is_some() {
            self.position += 1;
        }
        Ok(entry)
    }

    fn seek_ceil(&mut self, target: &str) -> Result<Option<DictEntry>> {
        self.position = self
            .data
            .terms
            .partition_point(|term| term.as_str() < target);
        self.next()
    }
}

struct MemoryPostingsCursor {
    entries: Arc<Vec<PostingData>>,
    current: Option<usize>,
    position_index: usize,
    positional: bool,
}

impl StorePostingsCursor for MemoryPostingsCursor {
    fn next_doc(&mut self) -> Result<Option<DocId>> {
        let next = self.current.map_or(0, |index| index + 1);
        self.position_index = 0;
        if next < self.entries.len() {
            self.current = Some(next);
            Ok(Some(self.entries[next].doc_id))
        } else {
            self.current = None;
            Ok(None)
        }
    }

    fn frequency(&self) -> u32 {
        self.current.map_or(0, |index| self.entries[index].frequency)
    }

    fn next_position(&mut self) -> Result<u32> {
        if !self.positional {
            return Err(CivetError::store("positions are not stored"));
        }
        let index = self
            .current
            .ok_or_else(|| CivetError::invalid_operation("cursor is not positioned on a document"))?;
        let positions = &self.entries[index].positions;
        let position = positions.get(self.position_index).copied().ok_or_else(|| {
            CivetError::store("position stream exhausted for the current document")
        })?;
        self.position_index += 1;
        Ok(position)
    }
}

struct MemoryNormCursor {
    data: Arc<SegmentData>,
}

impl NormCursor for MemoryNormCursor {
    fn advance(&mut self, doc_id: DocId) -> Result<u8> {
        self.data
            .norms
            .get(doc_id as usize)
            .copied()
            .ok_or_else(|| CivetError::store(format!("document id {doc_id} out of range")))
    }
}

struct MemoryTermVectorCursor {
    entries: Arc<Vec<VectorEntry>>,
    current: Option<usize>,
    position_index: usize,
    positional: bool,
}

impl TermVectorCursor for MemoryTermVectorCursor {
    fn next_term(&mut self) -> Result<Option<String>> {
        let next = self.current.map_or(0, |index| index + 1);
        self.position_index = 0;
        if next < self.entries.len() {
            self.current = Some(next);
            Ok(Some(self.entries[next].term.clone()))
        } else {
            self.current = None;
            Ok(None)
        }
    }

    fn frequency(&self) -> u32 {
        self.current.map_or(0, |index| self.entries[index].frequency)
    }

    fn next_position(&mut self) -> Result<u32> {
        if !self.positional {
            return Err(CivetError::store("positions are not stored"));
        }
        let index = self
            .current
            .ok_or_else(|| CivetError::invalid_operation("cursor is not positioned on a term"))?;
        let positions = &self.entries[index].positions;
        let position = positions.get(self.position_index).copied().ok_or_else(|| {
            CivetError::store("position stream exhausted for the current term")
        })?;
        self.position_index += 1;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_doc_segment() -> MemorySegment {
        MemorySegmentBuilder::new()
            .positions(true)
            .term_vectors(true)
            .add_document("doc1", "hello there fox")
            .add_document("doc2", "the lazy fox")
            .build()
    }

    #[test]
    fn test_builder_counts() {
        let segment = two_doc_segment();
        assert_eq!(segment.doc_count(), 2);
        assert_eq!(segment.term_count().unwrap(), 5);
        assert_eq!(segment.token_count().unwrap(), 6);
        assert_eq!(segment.pointer_count().unwrap(), 6);
        assert!(segment.has_positions());
        assert!(segment.has_term_vectors());
        assert!(segment.has_stored_field(ID_FIELD));
        assert!(!segment.has_stored_field("title"));
    }

    #[test]
    fn test_dictionary_is_sorted_and_seekable() {
        let segment = two_doc_segment();
        let mut cursor = segment.terms().unwrap();
        let mut terms = Vec::new();
        while let Some(entry) = cursor.next().unwrap() {
            terms.push(entry.term);
        }
        assert_eq!(terms, vec!["fox", "hello", "lazy", "the", "there"]);

        let mut cursor = segment.terms().unwrap();
        let entry = cursor.seek_ceil("l").unwrap().unwrap();
        assert_eq!(entry.term, "lazy");
        let entry = cursor.next().unwrap().unwrap();
        assert_eq!(entry.term, "the");

        let mut cursor = segment.terms().unwrap();
        assert!(cursor.seek_ceil("zebra").unwrap().is_none());
    }

    #[test]
    fn test_postings_and_positions() {
        let segment = two_doc_segment();
        let mut postings = segment.postings("fox").unwrap().unwrap();

        assert_eq!(postings.next_doc().unwrap(), Some(0));
        assert_eq!(postings.frequency(), 1);
        assert_eq!(postings.next_position().unwrap(), 2);

        assert_eq!(postings.next_doc().unwrap(), Some(1));
        assert_eq!(postings.next_position().unwrap(), 2);

        assert_eq!(postings.next_doc().unwrap(), None);
        assert!(segment.postings("missing").unwrap().is_none());
    }

    #[test]
    fn test_norms_encode_document_length() {
        let segment = two_doc_segment();
        let mut norms = segment.norms().unwrap();
        assert_eq!(crate::norm::decode_length(norms.advance(0).unwrap()), 3);
        assert_eq!(crate::norm::decode_length(norms.advance(1).unwrap()), 3);
        assert!(norms.advance(2).is_err());
    }

    #[test]
    fn test_term_vector_order_and_frequencies() {
        let segment = MemorySegmentBuilder::new()
            .term_vectors(true)
            .add_document("doc1", "b a b")
            .build();
        let mut vector = segment.term_vector(0).unwrap().unwrap();

        assert_eq!(vector.next_term().unwrap().as_deref(), Some("a"));
        assert_eq!(vector.frequency(), 1);
        assert_eq!(vector.next_term().unwrap().as_deref(), Some("b"));
        assert_eq!(vector.frequency(), 2);
        assert_eq!(vector.next_term().unwrap(), None);
    }

    #[test]
    fn test_vectors_absent_when_disabled() {
        let segment = MemorySegmentBuilder::new().add_document("doc1", "a b").build();
        assert!(!segment.has_term_vectors());
        assert!(segment.term_vector(0).unwrap().is_none());
    }

    #[test]
    fn test_stored_field_lookup() {
        let segment = two_doc_segment();
        assert_eq!(
            segment.stored_field(0, ID_FIELD).unwrap().as_deref(),
            Some("doc1")
        );
        assert_eq!(
            segment.stored_field(1, ID_FIELD).unwrap().as_deref(),
            Some("doc2")
        );
        assert_eq!(segment.stored_field(2, ID_FIELD).unwrap(), None);
        assert_eq!(segment.stored_field(0, "title").unwrap(), None);
    }
}
