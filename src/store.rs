//! Segment-store collaborator interface.
//!
//! This module defines the read contract Civet expects from the wrapped
//! full-text store: sorted seekable term-dictionary enumeration, per-term
//! postings with optional positions, per-document term vectors, stored
//! fields, and a per-document normalization stream. The store itself is a
//! black box; adapters only ever consume these traits.

pub mod memory;

use crate::error::Result;

/// Segment-local document identifier.
pub type DocId = u64;

/// Dense, zero-based term identifier assigned by sorted dictionary order.
pub type TermId = u64;

/// One entry of a segment's term dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    /// The term text.
    pub term: String,
    /// Number of documents containing this term.
    pub doc_frequency: u64,
    /// Total number of occurrences across all documents.
    pub collection_frequency: u64,
}

/// Read access to one immutable segment of the wrapped store.
///
/// Implementations hand out owned cursors so adapter structures can keep them
/// without borrowing the store. A segment is closed and immutable for the
/// lifetime of the handle; later insertions into the underlying store are
/// never visible through it.
pub trait SegmentStore: Send + Sync + std::fmt::Debug {
    /// Number of documents in this segment.
    fn doc_count(&self) -> u64;

    /// Number of unique terms in the dictionary.
    fn term_count(&self) -> Result<u64>;

    /// Sum of term occurrence counts over all documents.
    fn token_count(&self) -> Result<u64>;

    /// Sum of per-document distinct-term counts.
    fn pointer_count(&self) -> Result<u64>;

    /// Whether postings carry within-document positions.
    fn has_positions(&self) -> bool;

    /// Whether per-document term vectors are stored.
    fn has_term_vectors(&self) -> bool;

    /// Whether per-document normalization values are stored.
    fn has_norms(&self) -> bool;

    /// Whether documents carry the named stored field.
    fn has_stored_field(&self, name: &str) -> bool;

    /// Look up a single dictionary entry.
    fn term_entry(&self, term: &str) -> Result<Option<DictEntry>>;

    /// Fresh cursor over the term dictionary in its native sorted order.
    fn terms(&self) -> Result<Box<dyn TermDictCursor>>;

    /// Raw postings for a term, or `None` if the term is not in the dictionary.
    fn postings(&self, term: &str) -> Result<Option<Box<dyn StorePostingsCursor>>>;

    /// Fresh cursor over the per-document normalization stream.
    fn norms(&self) -> Result<Box<dyn NormCursor>>;

    /// Stored term vector for a document, or `None` when vectors are not kept.
    fn term_vector(&self, doc_id: DocId) -> Result<Option<Box<dyn TermVectorCursor>>>;

    /// Value of a stored field for a document.
    fn stored_field(&self, doc_id: DocId, name: &str) -> Result<Option<String>>;
}

/// Forward-only cursor over a sorted term dictionary.
pub trait TermDictCursor: Send {
    /// Advance to the next term, or `None` when the dictionary is exhausted.
    fn next(&mut self) -> Result<Option<DictEntry>>;

    /// Position the cursor at the first term `>= target` and return it.
    ///
    /// Seeks directly rather than scanning from the start. A following
    /// [`next`](Self::next) continues after the returned term. Returns `None`
    /// when every term sorts below the target.
    fn seek_ceil(&mut self, target: &str) -> Result<Option<DictEntry>>;
}

/// Raw per-term occurrence stream, in increasing document-id order.
pub trait StorePostingsCursor: Send {
    /// Advance to the next document containing the term.
    fn next_doc(&mut self) -> Result<Option<DocId>>;

    /// Occurrence count in the current document; valid after a successful
    /// [`next_doc`](Self::next_doc).
    fn frequency(&self) -> u32;

    /// Next within-document position for the current document.
    ///
    /// The position stream is flat: callers must read exactly
    /// [`frequency`](Self::frequency) positions per document, and the stream
    /// does not itself mark document boundaries.
    fn next_position(&mut self) -> Result<u32>;
}

/// Per-document normalization-value stream.
pub trait NormCursor: Send {
    /// Advance to the given document and return its normalization byte.
    ///
    /// Documents are visited in increasing id order within one cursor.
    fn advance(&mut self, doc_id: DocId) -> Result<u8>;
}

/// Cursor over one document's stored term vector, in the vector's own term order.
pub trait TermVectorCursor: Send {
    /// Advance to the next distinct term of the vector.
    fn next_term(&mut self) -> Result<Option<String>>;

    /// In-document frequency of the current term.
    fn frequency(&self) -> u32;

    /// Next within-document position for the current term; read exactly
    /// [`frequency`](Self::frequency) times when positions are stored.
    fn next_position(&mut self) -> Result<u32>;
}
