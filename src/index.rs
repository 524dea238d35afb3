//! Generic IR index structures over a wrapped segment store.
//!
//! An [`Index`] bundles the five read structures consumers work with: the
//! lexicon, the inverted postings index, the optional direct index, the
//! document index and the metadata index. Single segments are served by
//! [`segment::SegmentIndex`], partitioned stores by [`multi::MultiIndex`];
//! both are usually obtained through [`factory::open_index`].

pub mod config;
pub mod direct;
pub mod document;
pub mod factory;
pub mod lexicon;
pub mod meta;
pub mod multi;
pub mod posting;
pub mod segment;
pub mod termid;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CivetError, Result};
use crate::index::direct::DirectIndex;
use crate::index::document::DocumentIndex;
use crate::index::lexicon::Lexicon;
use crate::index::meta::MetaIndex;
use crate::index::posting::PostingIndex;

/// The structures an index can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Term lexicon.
    Lexicon,
    /// Document-length index.
    Document,
    /// Direct (document-to-term) index.
    Direct,
    /// Inverted (term-to-document) index.
    Inverted,
    /// Document-metadata index.
    Meta,
}

impl StructureKind {
    /// Canonical structure name.
    pub fn name(&self) -> &'static str {
        match self {
            StructureKind::Lexicon => "lexicon",
            StructureKind::Document => "document",
            StructureKind::Direct => "direct",
            StructureKind::Inverted => "inverted",
            StructureKind::Meta => "meta",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructureKind {
    type Err = CivetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lexicon" => Ok(StructureKind::Lexicon),
            "document" => Ok(StructureKind::Document),
            "direct" => Ok(StructureKind::Direct),
            "inverted" => Ok(StructureKind::Inverted),
            "meta" => Ok(StructureKind::Meta),
            _ => Err(CivetError::not_found(format!(
                "unknown index structure {s:?}"
            ))),
        }
    }
}

/// Aggregate statistics of one logical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStatistics {
    /// Number of documents.
    pub documents: u64,
    /// Number of unique terms (an upper bound on composed indexes).
    pub unique_terms: u64,
    /// Sum of term occurrence counts.
    pub tokens: u64,
    /// Sum of per-document distinct-term counts.
    pub pointers: u64,
}

/// One structure instance, tagged by kind.
pub enum IndexStructure {
    /// Term lexicon.
    Lexicon(Box<dyn Lexicon>),
    /// Document-length index.
    Document(Box<dyn DocumentIndex>),
    /// Direct index.
    Direct(Box<dyn DirectIndex>),
    /// Inverted index.
    Inverted(Box<dyn PostingIndex>),
    /// Metadata index.
    Meta(Box<dyn MetaIndex>),
}

/// A logical, read-only IR index.
///
/// Structure accessors hand out independent instances; no state is shared
/// between them, and nothing is cached, so repeated access re-reads the
/// wrapped store.
pub trait Index: Send + Sync {
    /// The term lexicon.
    fn lexicon(&self) -> Result<Box<dyn Lexicon>>;

    /// The inverted (term-to-document) index.
    fn inverted_index(&self) -> Result<Box<dyn PostingIndex>>;

    /// The direct (document-to-term) index; unsupported unless the index was
    /// opened direct-capable over a single segment with term vectors.
    fn direct_index(&self) -> Result<Box<dyn DirectIndex>>;

    /// The document-length index.
    fn document_index(&self) -> Result<Box<dyn DocumentIndex>>;

    /// The document-metadata index.
    fn meta_index(&self) -> Result<Box<dyn MetaIndex>>;

    /// Aggregate collection statistics.
    fn statistics(&self) -> Result<CollectionStatistics>;

    /// Whether a structure is available, without constructing it.
    fn supports(&self, kind: StructureKind) -> bool;

    /// Structure accessor by kind; unsupported kinds are absent.
    fn structure(&self, kind: StructureKind) -> Result<Option<IndexStructure>> {
        if !self.supports(kind) {
            return Ok(None);
        }
        let structure = match kind {
            StructureKind::Lexicon => IndexStructure::Lexicon(self.lexicon()?),
            StructureKind::Document => IndexStructure::Document(self.document_index()?),
            StructureKind::Direct => IndexStructure::Direct(self.direct_index()?),
            StructureKind::Inverted => IndexStructure::Inverted(self.inverted_index()?),
            StructureKind::Meta => IndexStructure::Meta(self.meta_index()?),
        };
        Ok(Some(structure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_kind_names_round_trip() {
        for kind in [
            StructureKind::Lexicon,
            StructureKind::Document,
            StructureKind::Direct,
            StructureKind::Inverted,
            StructureKind::Meta,
        ] {
            assert_eq!(kind.name().parse::<StructureKind>().unwrap(), kind);
        }
        assert!("postings".parse::<StructureKind>().is_err());
    }
}
