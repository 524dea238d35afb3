//! Index references and the open entry point.
//!
//! A logical index is named by a reference of the form
//! `<scheme>:<path>[#<segment-index>]`. The scheme selects the adapter mode;
//! the optional fragment pins the reference to one segment of a partitioned
//! store. Loading the store itself from `<path>` is bootstrap glue outside
//! this crate: callers hand the already-loaded segment stores to
//! [`open_index`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{CivetError, Result};
use crate::index::Index;
use crate::index::config::{IndexMode, OpenOptions};
use crate::index::multi::MultiIndex;
use crate::index::segment::SegmentIndex;
use crate::store::SegmentStore;

/// Scheme of basic (inverted-only) index references.
pub const BASIC_SCHEME: &str = "civet";

/// Scheme of direct-capable index references.
pub const DIRECT_SCHEME: &str = "civet-direct";

/// Parsed logical index reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRef {
    scheme: String,
    path: String,
    segment: Option<usize>,
}

impl IndexRef {
    /// Reference to a basic index at the given location.
    pub fn basic(path: &str) -> Self {
        IndexRef {
            scheme: BASIC_SCHEME.to_string(),
            path: path.to_string(),
            segment: None,
        }
    }

    /// Reference to a direct-capable index at the given location.
    pub fn direct(path: &str) -> Self {
        IndexRef {
            scheme: DIRECT_SCHEME.to_string(),
            path: path.to_string(),
            segment: None,
        }
    }

    /// Pin the reference to one segment of a partitioned store.
    pub fn with_segment(mut self, segment: usize) -> Self {
        self.segment = Some(segment);
        self
    }

    /// Parse a `<scheme>:<path>[#<segment-index>]` string.
    pub fn parse(reference: &str) -> Result<Self> {
        let (scheme, rest) = reference.split_once(':').ok_or_else(|| {
            CivetError::config(format!(
                "index reference {reference:?} must look like <scheme>:<path>"
            ))
        })?;
        if scheme.is_empty() {
            return Err(CivetError::config(format!(
                "index reference {reference:?} has an empty scheme"
            )));
        }
        let (path, segment) = match rest.rsplit_once('#') {
            Some((path, fragment)) => {
                let segment = fragment.parse::<usize>().map_err(|_| {
                    CivetError::config(format!(
                        "index reference {reference:?} has a malformed segment index {fragment:?}"
                    ))
                })?;
                (path, Some(segment))
            }
            None => (rest, None),
        };
        Ok(IndexRef {
            scheme: scheme.to_string(),
            path: path.to_string(),
            segment,
        })
    }

    /// Reference scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Store location.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pinned segment index, if any.
    pub fn segment(&self) -> Option<usize> {
        self.segment
    }

    /// Adapter mode selected by the scheme, or `None` for foreign schemes.
    pub fn mode(&self) -> Option<IndexMode> {
        match self.scheme.as_str() {
            BASIC_SCHEME => Some(IndexMode::Basic),
            DIRECT_SCHEME => Some(IndexMode::Direct),
            _ => None,
        }
    }
}

impl FromStr for IndexRef {
    type Err = CivetError;

    fn from_str(s: &str) -> Result<Self> {
        IndexRef::parse(s)
    }
}

impl fmt::Display for IndexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)?;
        if let Some(segment) = self.segment {
            write!(f, "#{segment}")?;
        }
        Ok(())
    }
}

/// Whether this crate can open the referenced index.
pub fn is_supported(reference: &IndexRef) -> bool {
    reference.mode().is_some()
}

/// Open a logical index over already-loaded segment stores.
///
/// Builds one adapter per store (or only the one pinned by the reference's
/// segment fragment) and composes a [`MultiIndex`] when several remain.
/// Direct-capable references are single-segment only.
pub fn open_index(
    reference: &IndexRef,
    stores: Vec<Arc<dyn SegmentStore>>,
    options: OpenOptions,
) -> Result<Box<dyn Index>> {
    let mode = reference.mode().ok_or_else(|| {
        CivetError::config(format!(
            "unsupported index reference scheme {:?}",
            reference.scheme()
        ))
    })?;
    if stores.is_empty() {
        return Err(CivetError::config(format!(
            "no segment stores supplied for {reference}"
        )));
    }
    let mut stores = stores;
    if let Some(segment) = reference.segment() {
        if segment >= stores.len() {
            return Err(CivetError::not_found(format!(
                "segment {segment} out of range, {reference} has {} segments",
                stores.len()
            )));
        }
        stores = vec![stores.swap_remove(segment)];
    }

    let options = OpenOptions { mode, ..options };
    info!("opening {reference} with {} segment(s)", stores.len());
    if stores.len() == 1 {
        let store = stores.into_iter().next().ok_or_else(|| {
            CivetError::invalid_operation("segment store list emptied unexpectedly")
        })?;
        return Ok(Box::new(SegmentIndex::open(store, options)?));
    }
    if mode == IndexMode::Direct {
        return Err(CivetError::unsupported(
            "a direct index cannot span multiple segments",
        ));
    }
    let segments = stores
        .into_iter()
        .map(|store| SegmentIndex::open(store, options.clone()).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(MultiIndex::new(segments)?))
}
