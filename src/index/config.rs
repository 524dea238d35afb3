//! Open-time configuration for index adapters.

use serde::{Deserialize, Serialize};

/// Which structures an adapter is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMode {
    /// Lexicon, inverted, document and metadata structures only.
    Basic,
    /// Additionally builds the term-identifier table and the direct index.
    Direct,
}

/// Designated source for document lengths.
///
/// The wrapped store exposes two length computations that can disagree for
/// compressed encodings. The choice is fixed per index at open time and used
/// by both the inverted and direct paths; it is never mixed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocLengthSource {
    /// Decode the per-document normalization byte (authoritative default).
    #[default]
    NormValue,
    /// Sum the frequencies recorded in the document's term vector.
    TermVectorSum,
}

/// Options controlling how an adapter is opened over a segment store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Structure set to open; overridden by the reference scheme when an
    /// index is opened through the factory.
    pub mode: IndexMode,
    /// Document-length source for the whole index instance.
    pub doc_length_source: DocLengthSource,
    /// Stored field holding the external document identifier.
    pub docno_field: String,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            mode: IndexMode::Basic,
            doc_length_source: DocLengthSource::default(),
            docno_field: "id".to_string(),
        }
    }
}

impl OpenOptions {
    /// Options for a basic (inverted-only) adapter.
    pub fn basic() -> Self {
        OpenOptions::default()
    }

    /// Options for a direct-capable adapter.
    pub fn direct() -> Self {
        OpenOptions {
            mode: IndexMode::Direct,
            ..OpenOptions::default()
        }
    }

    /// Select the document-length source.
    pub fn doc_length_source(mut self, source: DocLengthSource) -> Self {
        self.doc_length_source = source;
        self
    }

    /// Select the stored field holding document identifiers.
    pub fn docno_field(mut self, field: &str) -> Self {
        self.docno_field = field.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = OpenOptions::default();
        assert_eq!(options.mode, IndexMode::Basic);
        assert_eq!(options.doc_length_source, DocLengthSource::NormValue);
        assert_eq!(options.docno_field, "id");
    }

    #[test]
    fn test_serde_round_trip() {
        let options = OpenOptions::direct().doc_length_source(DocLengthSource::TermVectorSum);
        let json = serde_json::to_string(&options).unwrap();
        let back: OpenOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode, IndexMode::Direct);
        assert_eq!(back.doc_length_source, DocLengthSource::TermVectorSum);
    }
}
