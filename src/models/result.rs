use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::segment::{DocNo, SegmentId};

/// One counted facet value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseFacet {
    pub value: String,
    pub hit_count: u32,
}

impl BrowseFacet {
    pub fn new(value: impl Into<String>, hit_count: u32) -> Self {
        Self {
            value: value.into(),
            hit_count,
        }
    }
}

/// Ordered facet entries for one facet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub facets: Vec<BrowseFacet>,
    /// Matching documents carrying at least one value of the facet
    pub total: u32,
}

impl FacetResult {
    pub fn get(&self, value: &str) -> Option<u32> {
        self.facets
            .iter()
            .find(|f| f.value == value)
            .map(|f| f.hit_count)
    }
}

/// A matching document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseHit {
    /// Position in the concatenation of all live segments
    pub doc_id: u64,
    pub segment: SegmentId,
    pub docno: DocNo,
}

/// Browse response
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BrowseResult {
    /// Total matching documents before paging
    pub num_hits: usize,
    pub hits: Vec<BrowseHit>,
    pub facets: BTreeMap<String, FacetResult>,
}

impl BrowseResult {
    pub fn facet(&self, name: &str) -> Option<&FacetResult> {
        self.facets.get(name)
    }

    /// Global ids of the returned page
    pub fn doc_ids(&self) -> Vec<u64> {
        self.hits.iter().map(|h| h.doc_id).collect()
    }
}
