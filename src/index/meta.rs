//! Document-metadata index adapter.

use std::sync::Arc;

use crate::error::Result;
use crate::store::{DocId, SegmentStore};

/// Metadata key for the external document identifier.
pub const DOCNO_KEY: &str = "docno";

/// Read-forward access to per-document metadata strings.
///
/// Batch variants are defined elementwise over [`item`](Self::item), so the
/// scalar and batch forms always agree. Reverse lookup is unsupported.
pub trait MetaIndex: Send + Sync {
    /// Metadata keys this index provides.
    fn keys(&self) -> Vec<String>;

    /// Value of one key for one document; unknown keys and absent documents
    /// yield `None`.
    fn item(&self, key: &str, doc_id: DocId) -> Result<Option<String>>;

    /// Values of several keys for one document.
    fn items(&self, keys: &[&str], doc_id: DocId) -> Result<Vec<Option<String>>> {
        keys.iter().map(|key| self.item(key, doc_id)).collect()
    }

    /// Values of one key for several documents.
    fn items_for(&self, key: &str, doc_ids: &[DocId]) -> Result<Vec<Option<String>>> {
        doc_ids.iter().map(|&doc_id| self.item(key, doc_id)).collect()
    }

    /// Values of every key for one document, in [`keys`](Self::keys) order.
    fn all_items(&self, doc_id: DocId) -> Result<Vec<Option<String>>> {
        self.keys()
            .iter()
            .map(|key| self.item(key, doc_id))
            .collect()
    }

    /// Reverse lookup from value to document id; this index is read-forward
    /// only, so the result is always absent.
    fn document_id(&self, key: &str, value: &str) -> Result<Option<DocId>> {
        let _ = (key, value);
        Ok(None)
    }
}

/// Metadata index over a single segment, backed by one stored field.
pub struct SegmentMetaIndex {
    store: Arc<dyn SegmentStore>,
    docno_field: String,
}

impl SegmentMetaIndex {
    pub(crate) fn new(store: Arc<dyn SegmentStore>, docno_field: String) -> Self {
        SegmentMetaIndex { store, docno_field }
    }
}

impl MetaIndex for SegmentMetaIndex {
    fn keys(&self) -> Vec<String> {
        vec![DOCNO_KEY.to_string()]
    }

    fn item(&self, key: &str, doc_id: DocId) -> Result<Option<String>> {
        if key != DOCNO_KEY {
            return Ok(None);
        }
        self.store.stored_field(doc_id, &self.docno_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{ID_FIELD, MemorySegmentBuilder};

    fn meta() -> SegmentMetaIndex {
        let segment = MemorySegmentBuilder::new()
            .add_document("doc1", "hello there fox")
            .add_document("doc2", "the lazy fox")
            .build();
        SegmentMetaIndex::new(Arc::new(segment), ID_FIELD.to_string())
    }

    #[test]
    fn test_keys_and_items() {
        let meta = meta();
        assert_eq!(meta.keys(), vec![DOCNO_KEY.to_string()]);
        assert_eq!(meta.item(DOCNO_KEY, 0).unwrap().as_deref(), Some("doc1"));
        assert_eq!(meta.item(DOCNO_KEY, 1).unwrap().as_deref(), Some("doc2"));
        assert_eq!(meta.item(DOCNO_KEY, 9).unwrap(), None);
        assert_eq!(meta.item("title", 0).unwrap(), None);
    }

    #[test]
    fn test_batch_forms_match_scalar_form() {
        let meta = meta();
        let by_docs = meta.items_for(DOCNO_KEY, &[0, 1, 9]).unwrap();
        assert_eq!(
            by_docs,
            vec![Some("doc1".to_string()), Some("doc2".to_string()), None]
        );

        let by_keys = meta.items(&[DOCNO_KEY, "title"], 0).unwrap();
        assert_eq!(by_keys, vec![Some("doc1".to_string()), None]);

        assert_eq!(meta.all_items(1).unwrap(), vec![Some("doc2".to_string())]);
    }

    #[test]
    fn test_reverse_lookup_is_unsupported() {
        let meta = meta();
        assert_eq!(meta.document_id(DOCNO_KEY, "doc1").unwrap(), None);
    }
}
