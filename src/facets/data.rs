//! Loaded per-segment facet data
//!
//! Each facet's values are dictionary encoded:
//! - dictionary: sorted distinct values, ordinal = index
//! - ordinals: per-document ascending ordinal lists (multi-valued)
//! - postings: per-ordinal roaring bitmap of documents
//!
//! [`SegmentFacets`] is the arena holding one entry per registered handler,
//! addressed by [`FacetSlot`]. It is built once when the segment is opened and
//! never mutated afterwards.

use roaring::RoaringBitmap;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

use super::{FacetHandler, FacetHandlers};
use crate::segment::{DocNo, PostingSource};
use crate::Result;

/// Index of a handler in the registry and of its data in a segment arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FacetSlot(pub usize);

/// Dictionary-encoded multi-valued column for one facet
#[derive(Clone, Debug, Default)]
pub struct FacetData {
    /// Dictionary: ordinal -> value, sorted ascending
    dictionary: Vec<String>,
    /// Ordinals indexed by docno
    ordinals: Vec<Vec<u32>>,
    /// Documents per ordinal
    postings: Vec<RoaringBitmap>,
}

impl FacetData {
    /// Build from per-document values (index = docno)
    pub fn from_doc_values(doc_values: Vec<Vec<String>>) -> Self {
        let distinct: BTreeSet<&str> = doc_values
            .iter()
            .flat_map(|values| values.iter().map(String::as_str))
            .collect();
        let dictionary: Vec<String> = distinct.into_iter().map(str::to_string).collect();

        let mut postings = vec![RoaringBitmap::new(); dictionary.len()];
        let mut ordinals = Vec::with_capacity(doc_values.len());

        for (docno, values) in doc_values.iter().enumerate() {
            let mut doc_ords: Vec<u32> = values
                .iter()
                .filter_map(|v| dictionary.binary_search(v).ok())
                .map(|ord| ord as u32)
                .collect();
            doc_ords.sort_unstable();
            doc_ords.dedup();
            for &ord in &doc_ords {
                postings[ord as usize].insert(docno as u32);
            }
            ordinals.push(doc_ords);
        }

        Self {
            dictionary,
            ordinals,
            postings,
        }
    }

    /// Sorted distinct values
    pub fn values(&self) -> &[String] {
        &self.dictionary
    }

    pub fn value(&self, ordinal: u32) -> Option<&str> {
        self.dictionary.get(ordinal as usize).map(String::as_str)
    }

    pub fn ordinal(&self, value: &str) -> Option<u32> {
        self.dictionary
            .binary_search_by(|v| v.as_str().cmp(value))
            .ok()
            .map(|ord| ord as u32)
    }

    /// Ordinals of a document, ascending
    pub fn ordinals(&self, docno: DocNo) -> &[u32] {
        self.ordinals
            .get(docno.as_usize())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Values of a document in dictionary order
    pub fn field_values(&self, docno: DocNo) -> Vec<String> {
        self.ordinals(docno)
            .iter()
            .filter_map(|&ord| self.value(ord))
            .map(str::to_string)
            .collect()
    }

    /// Documents carrying the value at `ordinal`
    pub fn docs(&self, ordinal: u32) -> Option<&RoaringBitmap> {
        self.postings.get(ordinal as usize)
    }

    /// Ordinal range of values starting with `prefix`
    pub fn prefix_range(&self, prefix: &str) -> Range<usize> {
        let start = self.dictionary.partition_point(|v| v.as_str() < prefix);
        let len = self.dictionary[start..].partition_point(|v| v.starts_with(prefix));
        start..start + len
    }

    /// Union of the postings of every ordinal in `range`
    pub fn docs_in_range(&self, range: Range<usize>) -> RoaringBitmap {
        let mut result = RoaringBitmap::new();
        for bitmap in &self.postings[range] {
            result |= bitmap;
        }
        result
    }

    pub fn doc_count(&self) -> usize {
        self.ordinals.len()
    }

    pub fn value_count(&self) -> usize {
        self.dictionary.len()
    }
}

/// Facet arena of one segment
#[derive(Debug)]
pub struct SegmentFacets {
    handlers: Arc<FacetHandlers>,
    data: Vec<Option<FacetData>>,
    doc_count: u32,
}

impl SegmentFacets {
    /// Load every handler's data; nothing is returned unless all loads succeed
    pub fn load(handlers: Arc<FacetHandlers>, source: &dyn PostingSource) -> Result<Self> {
        let doc_count = source.document_count();
        let mut data = Vec::with_capacity(handlers.len());
        for handler in handlers.iter() {
            let loaded = handler.load(source)?;
            if let Some(ref d) = loaded {
                debug!(
                    facet = handler.name(),
                    values = d.value_count(),
                    docs = d.doc_count(),
                    "loaded facet data"
                );
            }
            data.push(loaded);
        }
        Ok(Self {
            handlers,
            data,
            doc_count,
        })
    }

    pub fn handlers(&self) -> &FacetHandlers {
        &self.handlers
    }

    pub fn data(&self, slot: FacetSlot) -> Option<&FacetData> {
        self.data.get(slot.0).and_then(Option::as_ref)
    }

    pub fn data_by_name(&self, name: &str) -> Option<&FacetData> {
        self.handlers.slot(name).and_then(|slot| self.data(slot))
    }

    pub fn handler(&self, name: &str) -> Option<&FacetHandler> {
        self.handlers.get(name)
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Every document of the segment
    pub fn all_docs(&self) -> RoaringBitmap {
        let mut all = RoaringBitmap::new();
        all.insert_range(0..self.doc_count);
        all
    }
}
