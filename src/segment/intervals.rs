//! Section interval sets and the metadata cache that serves them
//!
//! A section is a `[start, end)` range on a document's position axis. Sections
//! are indexed as the positions of a metadata term, read pairwise; an unpaired
//! trailing start runs to the end of the document.

use roaring::RoaringBitmap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::source::PostingSource;
use super::types::{DocNo, Posting, Term};

/// Open end used for sections that run to the end of the document
pub const DOC_END: u32 = u32::MAX;

/// Half-open position range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The whole document
    pub fn whole() -> Self {
        Self {
            start: 0,
            end: DOC_END,
        }
    }

    /// Whether this interval overlaps `[lo, hi)`; an empty interval counts as a point
    pub fn intersects(&self, lo: u32, hi: u32) -> bool {
        let end = self.end.max(self.start.saturating_add(1));
        self.start < hi && end > lo
    }
}

/// Per-document section intervals for one metadata term
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntervalSet {
    docs: BTreeMap<u32, Vec<Interval>>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive intervals from raw term positions, read pairwise
    pub fn from_postings(postings: &[Posting]) -> Self {
        let mut set = Self::new();
        for posting in postings {
            for pair in posting.positions.chunks(2) {
                let end = pair.get(1).copied().unwrap_or(DOC_END);
                set.insert(posting.docno, Interval::new(pair[0], end));
            }
        }
        set
    }

    pub fn insert(&mut self, docno: DocNo, interval: Interval) {
        let intervals = self.docs.entry(docno.as_u32()).or_default();
        let at = intervals.partition_point(|i| i.start <= interval.start);
        intervals.insert(at, interval);
    }

    /// Intervals of one document, ordered by start
    pub fn intervals(&self, docno: DocNo) -> &[Interval] {
        self.docs
            .get(&docno.as_u32())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn intersects(&self, docno: DocNo, lo: u32, hi: u32) -> bool {
        self.intervals(docno).iter().any(|i| i.intersects(lo, hi))
    }

    /// Documents having at least one interval
    pub fn docs(&self) -> RoaringBitmap {
        self.docs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Precomputed interval data keyed by term
pub trait MetaDataCache: Send + Sync {
    fn lookup(&self, term: &Term) -> Option<Arc<IntervalSet>>;
}

/// Metadata cache holding interval sets computed once from a posting source
#[derive(Clone, Debug, Default)]
pub struct MemoryMetaDataCache {
    entries: HashMap<Term, Arc<IntervalSet>>,
}

impl MemoryMetaDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precompute interval sets for `terms` from `source`
    pub fn build<'a>(source: &dyn PostingSource, terms: impl IntoIterator<Item = &'a Term>) -> Self {
        let mut cache = Self::new();
        for term in terms {
            let intervals = IntervalSet::from_postings(&source.postings(term));
            cache.insert(term.clone(), intervals);
        }
        cache
    }

    pub fn insert(&mut self, term: Term, intervals: IntervalSet) {
        self.entries.insert(term, Arc::new(intervals));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetaDataCache for MemoryMetaDataCache {
    fn lookup(&self, term: &Term) -> Option<Arc<IntervalSet>> {
        self.entries.get(term).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_intersects() {
        let interval = Interval::new(5, 10);
        assert!(interval.intersects(0, 6));
        assert!(interval.intersects(9, 20));
        assert!(!interval.intersects(10, 20));
        assert!(!interval.intersects(0, 5));
        assert!(Interval::new(4, 4).intersects(4, 5));
    }

    #[test]
    fn test_from_postings_pairs() {
        let postings = vec![
            Posting::with_positions(DocNo(0), vec![0, 4, 10, 12]),
            Posting::with_positions(DocNo(2), vec![7]),
        ];
        let set = IntervalSet::from_postings(&postings);

        assert_eq!(
            set.intervals(DocNo(0)),
            &[Interval::new(0, 4), Interval::new(10, 12)]
        );
        assert_eq!(set.intervals(DocNo(2)), &[Interval::new(7, DOC_END)]);
        assert!(set.intervals(DocNo(1)).is_empty());
        assert_eq!(set.docs().iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut set = IntervalSet::new();
        set.insert(DocNo(1), Interval::new(8, 9));
        set.insert(DocNo(1), Interval::new(2, 3));
        assert_eq!(
            set.intervals(DocNo(1)),
            &[Interval::new(2, 3), Interval::new(8, 9)]
        );
        assert!(set.intersects(DocNo(1), 2, 3));
        assert!(!set.intersects(DocNo(1), 3, 8));
    }
}
