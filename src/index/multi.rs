//! Multi-segment composition.
//!
//! [`MultiIndex`] presents several independent segment adapters as one
//! logical index. The global document-id space is the concatenation of the
//! per-segment ranges, fixed at construction from each segment's document
//! count; routing locates the owning segment by binary search over the
//! cumulative offsets. Term-keyed operations merge statistics across
//! segments; a direct index is never available, because per-segment term-id
//! tables are independent and not mutually consistent.

use std::sync::Arc;

use log::info;

use crate::error::{CivetError, Result};
use crate::index::direct::DirectIndex;
use crate::index::document::{DocumentEntry, DocumentIndex};
use crate::index::lexicon::{Lexicon, LexiconCursor, LexiconEntry};
use crate::index::meta::{DOCNO_KEY, MetaIndex};
use crate::index::posting::{END_OF_LIST, PostingCursor, PostingIndex};
use crate::index::segment::SegmentIndex;
use crate::index::{CollectionStatistics, Index, StructureKind};
use crate::store::DocId;

/// One logical index over several independent segments.
pub struct MultiIndex {
    segments: Vec<Arc<SegmentIndex>>,
    /// First global id of each segment; prefix sums of the document counts.
    offsets: Vec<u64>,
    total_docs: u64,
}

impl MultiIndex {
    /// Compose segment adapters into one logical index.
    pub fn new(segments: Vec<Arc<SegmentIndex>>) -> Result<Self> {
        if segments.is_empty() {
            return Err(CivetError::config(
                "a logical index needs at least one segment",
            ));
        }
        let mut offsets = Vec::with_capacity(segments.len());
        let mut total_docs = 0u64;
        for segment in &segments {
            offsets.push(total_docs);
            total_docs += segment.doc_count();
        }
        info!(
            "composed logical index over {} segments ({} documents)",
            segments.len(),
            total_docs
        );
        Ok(MultiIndex {
            segments,
            offsets,
            total_docs,
        })
    }

    /// Number of composed segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Owning segment and segment-local id for a global document id.
    fn locate(&self, doc_id: DocId) -> Option<(usize, DocId)> {
        if doc_id >= self.total_docs {
            return None;
        }
        let segment = self.offsets.partition_point(|&offset| offset <= doc_id) - 1;
        Some((segment, doc_id - self.offsets[segment]))
    }
}

impl Index for MultiIndex {
    fn lexicon(&self) -> Result<Box<dyn Lexicon>> {
        let lexicons = self
            .segments
            .iter()
            .map(|segment| segment.lexicon())
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(MultiLexicon { lexicons }))
    }

    fn inverted_index(&self) -> Result<Box<dyn PostingIndex>> {
        Ok(Box::new(MultiPostingIndex {
            segments: self.segments.clone(),
            offsets: self.offsets.clone(),
        }))
    }

    fn direct_index(&self) -> Result<Box<dyn DirectIndex>> {
        Err(CivetError::unsupported(
            "a direct index cannot span multiple segments",
        ))
    }

    fn document_index(&self) -> Result<Box<dyn DocumentIndex>> {
        let parts = self
            .segments
            .iter()
            .map(|segment| segment.document_index())
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(MultiDocumentIndex {
            parts,
            offsets: self.offsets.clone(),
            total_docs: self.total_docs,
        }))
    }

    fn meta_index(&self) -> Result<Box<dyn MetaIndex>> {
        let parts = self
            .segments
            .iter()
            .map(|segment| segment.meta_index())
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(MultiMetaIndex {
            parts,
            offsets: self.offsets.clone(),
            total_docs: self.total_docs,
        }))
    }

    fn statistics(&self) -> Result<CollectionStatistics> {
        let mut total = CollectionStatistics {
            documents: 0,
            unique_terms: 0,
            tokens: 0,
            pointers: 0,
        };
        for segment in &self.segments {
            let stats = segment.statistics()?;
            total.documents += stats.documents;
            // upper bound: a term present in several segments is counted once
            // per segment
            total.unique_terms += stats.unique_terms;
            total.tokens += stats.tokens;
            total.pointers += stats.pointers;
        }
        Ok(total)
    }

    fn supports(&self, kind: StructureKind) -> bool {
        !matches!(kind, StructureKind::Direct)
    }
}

/// Merged lexicon view over all segments.
struct MultiLexicon {
    lexicons: Vec<Box<dyn Lexicon>>,
}

impl MultiLexicon {
    fn merged(&self, cursors: Vec<Box<dyn LexiconCursor>>) -> Result<MultiLexiconCursor> {
        let mut heads = Vec::with_capacity(cursors.len());
        let mut cursors = cursors;
        for cursor in &mut cursors {
            heads.push(cursor.next()?);
        }
        Ok(MultiLexiconCursor { cursors, heads })
    }
}

impl Lexicon for MultiLexicon {
    fn num_entries(&self) -> Result<u64> {
        // distinct terms require a merged scan; per-segment counts overlap
        let mut cursor = self.all_entries()?;
        let mut count = 0u64;
        while cursor.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    fn entry(&self, term: &str) -> Result<Option<LexiconEntry>> {
        let mut doc_frequency = 0u64;
        let mut collection_frequency = 0u64;
        let mut found = false;
        for lexicon in &self.lexicons {
            if let Some(entry) = lexicon.entry(term)? {
                doc_frequency += entry.doc_frequency;
                collection_frequency += entry.collection_frequency;
                found = true;
            }
        }
        if !found {
            return Ok(None);
        }
        Ok(Some(LexiconEntry {
            term: term.to_string(),
            doc_frequency,
            collection_frequency,
            term_id: None,
        }))
    }

    fn entry_by_id(&self, _term_id: crate::store::TermId) -> Result<Option<LexiconEntry>> {
        Err(CivetError::unsupported(
            "per-segment term identifiers cannot be addressed on a composed index",
        ))
    }

    fn all_entries(&self) -> Result<Box<dyn LexiconCursor>> {
        let cursors = self
            .lexicons
            .iter()
            .map(|lexicon| lexicon.all_entries())
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(self.merged(cursors)?))
    }

    fn entry_range(&self, from: &str, to: &str) -> Result<Box<dyn LexiconCursor>> {
        let cursors = self
            .lexicons
            .iter()
            .map(|lexicon| lexicon.entry_range(from, to))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(self.merged(cursors)?))
    }
}

/// K-way merge over per-segment lexicon cursors; entries with equal terms are
/// combined by summing their frequencies.
struct MultiLexiconCursor {
    cursors: Vec<Box<dyn LexiconCursor>>,
    heads: Vec<Option<LexiconEntry>>,
}

impl LexiconCursor for MultiLexiconCursor {
    fn next(&mut self) -> Result<Option<LexiconEntry>> {
        let mut min_term: Option<String> = None;
        for head in self.heads.iter().flatten() {
            match &min_term {
                Some(term) if head.term.as_str() >= term.as_str() => {}
                _ => min_term = Some(head.term.clone()),
            }
        }
        let Some(term) = min_term else {
            return Ok(None);
        };

        let mut doc_frequency = 0u64;
        let mut collection_frequency = 0u64;
        for index in 0..self.heads.len() {
            let matches = self.heads[index]
                .as_ref()
                .is_some_and(|head| head.term == term);
            if matches {
                let head = self.heads[index].take();
                if let Some(head) = head {
                    doc_frequency += head.doc_frequency;
                    collection_frequency += head.collection_frequency;
                }
                self.heads[index] = self.cursors[index].next()?;
            }
        }
        Ok(Some(LexiconEntry {
            term,
            doc_frequency,
            collection_frequency,
            term_id: None,
        }))
    }
}

/// Inverted index merging per-segment posting streams into the global id
/// space.
struct MultiPostingIndex {
    segments: Vec<Arc<SegmentIndex>>,
    offsets: Vec<u64>,
}

impl PostingIndex for MultiPostingIndex {
    fn postings(&self, entry: &LexiconEntry) -> Result<Box<dyn PostingCursor>> {
        let mut parts = Vec::new();
        for (segment, &offset) in self.segments.iter().zip(&self.offsets) {
            if let Some(cursor) = segment.term_postings(&entry.term)? {
                parts.push((cursor, offset));
            }
        }
        if parts.is_empty() {
            return Err(CivetError::corrupted(format!(
                "postings missing for lexicon term {:?} in every segment",
                entry.term
            )));
        }
        Ok(Box::new(MultiPostingCursor {
            parts,
            active: 0,
            doc_id: END_OF_LIST,
        }))
    }
}

/// Global posting stream over per-segment cursors.
///
/// Segments own disjoint, increasing global id ranges, so visiting them in
/// order with their offsets applied yields one id-ordered stream.
struct MultiPostingCursor {
    parts: Vec<(Box<dyn PostingCursor>, u64)>,
    active: usize,
    doc_id: DocId,
}

impl MultiPostingCursor {
    fn active_part(&self) -> Result<&(Box<dyn PostingCursor>, u64)> {
        self.parts.get(self.active).ok_or_else(|| {
            CivetError::invalid_operation("cursor is not positioned on a document")
        })
    }
}

impl PostingCursor for MultiPostingCursor {
    fn advance(&mut self) -> Result<DocId> {
        while let Some((cursor, offset)) = self.parts.get_mut(self.active) {
            let doc_id = cursor.advance()?;
            if doc_id != END_OF_LIST {
                self.doc_id = doc_id + *offset;
                return Ok(self.doc_id);
            }
            self.active += 1;
        }
        self.doc_id = END_OF_LIST;
        Ok(END_OF_LIST)
    }

    fn doc_id(&self) -> DocId {
        self.doc_id
    }

    fn frequency(&self) -> u32 {
        self.parts
            .get(self.active)
            .map_or(0, |(cursor, _)| cursor.frequency())
    }

    fn doc_length(&self) -> Result<u32> {
        self.active_part()?.0.doc_length()
    }

    fn positions(&mut self) -> Result<&[u32]> {
        let active = self.active;
        let (cursor, _) = self.parts.get_mut(active).ok_or_else(|| {
            CivetError::invalid_operation("cursor is not positioned on a document")
        })?;
        cursor.positions()
    }
}

/// Document index routing global ids to the owning segment.
struct MultiDocumentIndex {
    parts: Vec<Box<dyn DocumentIndex>>,
    offsets: Vec<u64>,
    total_docs: u64,
}

impl MultiDocumentIndex {
    fn locate(&self, doc_id: DocId) -> Option<(usize, DocId)> {
        if doc_id >= self.total_docs {
            return None;
        }
        let segment = self.offsets.partition_point(|&offset| offset <= doc_id) - 1;
        Some((segment, doc_id - self.offsets[segment]))
    }
}

impl DocumentIndex for MultiDocumentIndex {
    fn doc_count(&self) -> u64 {
        self.total_docs
    }

    fn length(&self, doc_id: DocId) -> Result<Option<u32>> {
        match self.locate(doc_id) {
            Some((segment, local)) => self.parts[segment].length(local),
            None => Ok(None),
        }
    }

    fn entry(&self, doc_id: DocId) -> Result<Option<DocumentEntry>> {
        match self.locate(doc_id) {
            Some((segment, local)) => Ok(self.parts[segment].entry(local)?.map(|entry| {
                DocumentEntry {
                    doc_id,
                    ..entry
                }
            })),
            None => Ok(None),
        }
    }
}

/// Metadata index routing global ids to the owning segment.
struct MultiMetaIndex {
    parts: Vec<Box<dyn MetaIndex>>,
    offsets: Vec<u64>,
    total_docs: u64,
}

impl MetaIndex for MultiMetaIndex {
    fn keys(&self) -> Vec<String> {
        vec![DOCNO_KEY.to_string()]
    }

    fn item(&self, key: &str, doc_id: DocId) -> Result<Option<String>> {
        if doc_id >= self.total_docs {
            return Ok(None);
        }
        let segment = self.offsets.partition_point(|&offset| offset <= doc_id) - 1;
        self.parts[segment].item(key, doc_id - self.offsets[segment])
    }
}
