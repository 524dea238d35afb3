//! Lexicon adapter: term strings to aggregate statistics and ids.

use std::sync::Arc;

use crate::error::{CivetError, Result};
use crate::index::termid::TermIdTable;
use crate::store::{DictEntry, SegmentStore, TermDictCursor, TermId};

/// One lexicon entry with its aggregate statistics.
///
/// `term_id` is present only on direct-capable single-segment indexes, where
/// the term-identifier table exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    /// The term text.
    pub term: String,
    /// Number of documents containing the term.
    pub doc_frequency: u64,
    /// Total occurrences across all documents.
    pub collection_frequency: u64,
    /// Dense integer id, when a term-identifier table exists.
    pub term_id: Option<TermId>,
}

/// Read access to the term lexicon.
pub trait Lexicon: Send + Sync {
    /// Number of entries in the lexicon.
    fn num_entries(&self) -> Result<u64>;

    /// Look up a term. A term recorded with zero occurrences is absent.
    fn entry(&self, term: &str) -> Result<Option<LexiconEntry>>;

    /// Look up a term by id.
    ///
    /// Fails with an unsupported-capability error when no term-identifier
    /// table exists; with one, an out-of-range id is simply absent.
    fn entry_by_id(&self, term_id: TermId) -> Result<Option<LexiconEntry>>;

    /// Fresh forward-only cursor over all entries in dictionary order.
    fn all_entries(&self) -> Result<Box<dyn LexiconCursor>>;

    /// Fresh forward-only cursor over entries in `[from, to]`, inclusive on
    /// both ends, in dictionary order. Seeks directly to `from`.
    fn entry_range(&self, from: &str, to: &str) -> Result<Box<dyn LexiconCursor>>;
}

/// Forward-only, non-restartable lexicon enumeration.
///
/// Each call to [`Lexicon::all_entries`] or [`Lexicon::entry_range`] produces
/// a fresh cursor; no cursor state is shared across calls.
pub trait LexiconCursor: Send {
    /// Advance to the next entry, or `None` when the sequence is exhausted.
    fn next(&mut self) -> Result<Option<LexiconEntry>>;
}

/// Lexicon over a single segment.
pub struct SegmentLexicon {
    store: Arc<dyn SegmentStore>,
    term_ids: Option<Arc<TermIdTable>>,
}

impl SegmentLexicon {
    pub(crate) fn new(store: Arc<dyn SegmentStore>, term_ids: Option<Arc<TermIdTable>>) -> Self {
        SegmentLexicon { store, term_ids }
    }

    fn entry_from(&self, entry: DictEntry) -> LexiconEntry {
        // The table is built from this same dictionary, so a miss cannot
        // happen on a closed segment.
        let term_id = self
            .term_ids
            .as_ref()
            .and_then(|table| table.id_of(&entry.term).ok());
        LexiconEntry {
            term: entry.term,
            doc_frequency: entry.doc_frequency,
            collection_frequency: entry.collection_frequency,
            term_id,
        }
    }
}

impl Lexicon for SegmentLexicon {
    fn num_entries(&self) -> Result<u64> {
        self.store.term_count()
    }

    fn entry(&self, term: &str) -> Result<Option<LexiconEntry>> {
        match self.store.term_entry(term)? {
            Some(entry) if entry.collection_frequency > 0 => Ok(Some(self.entry_from(entry))),
            _ => Ok(None),
        }
    }

    fn entry_by_id(&self, term_id: TermId) -> Result<Option<LexiconEntry>> {
        let Some(table) = &self.term_ids else {
            return Err(CivetError::unsupported(
                "term identifiers require a direct-capable index",
            ));
        };
        match table.term_of(term_id) {
            Ok(term) => self.entry(term),
            Err(_) => Ok(None),
        }
    }

    fn all_entries(&self) -> Result<Box<dyn LexiconCursor>> {
        Ok(Box::new(SegmentLexiconCursor {
            dict: self.store.terms()?,
            term_ids: self.term_ids.clone(),
            pending: None,
            upper: None,
            done: false,
        }))
    }

    fn entry_range(&self, from: &str, to: &str) -> Result<Box<dyn LexiconCursor>> {
        let mut dict = self.store.terms()?;
        let pending = dict.seek_ceil(from)?;
        Ok(Box::new(SegmentLexiconCursor {
            dict,
            term_ids: self.term_ids.clone(),
            pending,
            upper: Some(to.to_string()),
            done: false,
        }))
    }
}

struct SegmentLexiconCursor {
    dict: Box<dyn TermDictCursor>,
    term_ids: Option<Arc<TermIdTable>>,
    pending: Option<DictEntry>,
    upper: Option<String>,
    done: bool,
}

impl LexiconCursor for SegmentLexiconCursor {
    fn next(&mut self) -> Result<Option<LexiconEntry>> {
        if self.done {
            return Ok(None);
        }
        let entry = match self.pending.take() {
            Some(entry) => Some(entry),
            None => self.dict.next()?,
        };
        let Some(entry) = entry else {
            self.done = true;
            return Ok(None);
        };
        if let Some(upper) = &self.upper {
            if entry.term.as_str() > upper.as_str() {
                self.done = true;
                return Ok(None);
            }
        }
        let term_id = self
            .term_ids
            .as_ref()
            .and_then(|table| table.id_of(&entry.term).ok());
        Ok(Some(LexiconEntry {
            term: entry.term,
            doc_frequency: entry.doc_frequency,
            collection_frequency: entry.collection_frequency,
            term_id,
        }))
    }
}
