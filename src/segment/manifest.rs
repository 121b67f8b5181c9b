//! Segment set for tracking live browse segments
//!
//! Publication protocol:
//! 1. Load every facet of the new segment into its arena
//! 2. Only if loading succeeded, swap in a new segment list
//!
//! Readers take a snapshot of the list and never block. A failed load leaves
//! the published list untouched.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::source::PostingSource;
use super::types::SegmentId;
use crate::facets::{FacetHandlers, SegmentFacets};
use crate::{BrowseError, Result};

/// A published segment: its postings plus loaded facet data
pub struct BrowseSegment {
    id: SegmentId,
    source: Arc<dyn PostingSource>,
    facets: SegmentFacets,
}

impl BrowseSegment {
    /// Load all facets for `source`
    pub fn open(id: SegmentId, source: Arc<dyn PostingSource>, handlers: Arc<FacetHandlers>) -> Result<Self> {
        let facets = SegmentFacets::load(handlers, source.as_ref()).map_err(|e| BrowseError::SegmentLoad {
            segment: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { id, source, facets })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn source(&self) -> &dyn PostingSource {
        self.source.as_ref()
    }

    pub fn facets(&self) -> &SegmentFacets {
        &self.facets
    }

    pub fn doc_count(&self) -> u32 {
        self.facets.doc_count()
    }
}

impl std::fmt::Debug for BrowseSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseSegment")
            .field("id", &self.id)
            .field("doc_count", &self.doc_count())
            .finish()
    }
}

/// Immutable view of the live segments, in publication order
pub type SegmentSnapshot = Arc<Vec<Arc<BrowseSegment>>>;

/// Thread-safe segment list with atomic publication
pub struct SegmentSet {
    handlers: Arc<FacetHandlers>,
    inner: ArcSwap<Vec<Arc<BrowseSegment>>>,
    /// Serializes writers; holds the next segment id
    write_lock: Mutex<SegmentId>,
}

impl SegmentSet {
    pub fn new(handlers: FacetHandlers) -> Self {
        Self {
            handlers: Arc::new(handlers),
            inner: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(SegmentId::new(0)),
        }
    }

    pub fn handlers(&self) -> &Arc<FacetHandlers> {
        &self.handlers
    }

    /// Load and publish a segment
    pub fn open(&self, source: Arc<dyn PostingSource>) -> Result<SegmentId> {
        let mut next_id = self.write_lock.lock();
        let id = *next_id;

        let segment = match BrowseSegment::open(id, source, self.handlers.clone()) {
            Ok(segment) => segment,
            Err(e) => {
                warn!(segment = %id, error = %e, "Segment load failed, not publishing");
                return Err(e);
            }
        };
        let doc_count = segment.doc_count();

        let mut segments = (**self.inner.load()).clone();
        segments.push(Arc::new(segment));
        self.inner.store(Arc::new(segments));
        *next_id = id.next();

        info!(segment = %id, doc_count, "Published segment");
        Ok(id)
    }

    /// Remove a segment from the live set
    pub fn retire(&self, id: SegmentId) -> bool {
        let _guard = self.write_lock.lock();
        let current = self.inner.load();
        if !current.iter().any(|s| s.id() == id) {
            return false;
        }
        let segments: Vec<_> = current.iter().filter(|s| s.id() != id).cloned().collect();
        self.inner.store(Arc::new(segments));
        info!(segment = %id, "Retired segment");
        true
    }

    /// Get the current segments
    pub fn snapshot(&self) -> SegmentSnapshot {
        self.inner.load_full()
    }

    pub fn segment_count(&self) -> usize {
        self.inner.load().len()
    }

    /// Get total document count across all segments
    pub fn total_doc_count(&self) -> u64 {
        self.inner.load().iter().map(|s| s.doc_count() as u64).sum()
    }
}
