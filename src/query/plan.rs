//! Evaluation plan for section-scoped queries
//!
//! Every node answers one question: does document `d` match within the
//! position range `[lo, hi)`.

use roaring::RoaringBitmap;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::segment::{DocNo, IntervalSet, Posting, Term};

/// Where a term node reads its occurrences from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermSource {
    /// Raw positions per document
    Positions(BTreeMap<u32, Vec<u32>>),
    /// Section intervals per document
    Intervals(Arc<IntervalSet>),
}

/// Leaf over one term's occurrences
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermNode {
    term: Term,
    source: TermSource,
    /// Position of the term within its phrase
    offset: u32,
}

impl TermNode {
    pub fn positions(term: Term, postings: Vec<Posting>) -> Self {
        let positions = postings
            .into_iter()
            .map(|p| (p.docno.as_u32(), p.positions))
            .collect();
        Self {
            term,
            source: TermSource::Positions(positions),
            offset: 0,
        }
    }

    pub fn intervals(term: Term, intervals: Arc<IntervalSet>) -> Self {
        Self {
            term,
            source: TermSource::Intervals(intervals),
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn source(&self) -> &TermSource {
        &self.source
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    fn doc_positions(&self, docno: DocNo) -> &[u32] {
        match &self.source {
            TermSource::Positions(docs) => docs.get(&docno.as_u32()).map(Vec::as_slice).unwrap_or(&[]),
            TermSource::Intervals(_) => &[],
        }
    }

    /// Whether the term occurs at exactly `position`
    fn occurs_at(&self, docno: DocNo, position: u32) -> bool {
        match &self.source {
            TermSource::Positions(_) => self.doc_positions(docno).binary_search(&position).is_ok(),
            TermSource::Intervals(set) => set.intersects(docno, position, position.saturating_add(1)),
        }
    }

    pub fn matches(&self, docno: DocNo, lo: u32, hi: u32) -> bool {
        match &self.source {
            TermSource::Positions(_) => {
                let positions = self.doc_positions(docno);
                let first = positions.partition_point(|&p| p < lo);
                positions.get(first).is_some_and(|&p| p < hi)
            }
            TermSource::Intervals(set) => set.intersects(docno, lo, hi),
        }
    }

    pub fn candidates(&self) -> RoaringBitmap {
        match &self.source {
            TermSource::Positions(docs) => docs.keys().copied().collect(),
            TermSource::Intervals(set) => set.docs(),
        }
    }
}

/// Terms at fixed offsets from a common base position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhraseNode {
    terms: Vec<TermNode>,
}

impl PhraseNode {
    pub fn new(terms: Vec<TermNode>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[TermNode] {
        &self.terms
    }

    pub fn matches(&self, docno: DocNo, lo: u32, hi: u32) -> bool {
        let Some(anchor) = self.terms.first() else {
            return false;
        };
        let max_offset = self.terms.iter().map(TermNode::offset).max().unwrap_or(0);

        anchor.doc_positions(docno).iter().any(|&p| {
            let Some(base) = p.checked_sub(anchor.offset) else {
                return false;
            };
            if base < lo || base.saturating_add(max_offset) >= hi {
                return false;
            }
            self.terms
                .iter()
                .all(|t| t.occurs_at(docno, base + t.offset))
        })
    }

    pub fn candidates(&self) -> RoaringBitmap {
        let mut terms = self.terms.iter();
        let Some(first) = terms.next() else {
            return RoaringBitmap::new();
        };
        let mut docs = first.candidates();
        for term in terms {
            docs &= term.candidates();
        }
        docs
    }
}

/// Compiled plan node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanNode {
    Term(TermNode),
    Phrase(PhraseNode),
    And(Vec<PlanNode>),
    Or(Vec<PlanNode>),
    UnaryNot(Box<PlanNode>),
    AndNot {
        positive: Box<PlanNode>,
        negative: Box<PlanNode>,
    },
}

impl PlanNode {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanNode::Term(_) => "term",
            PlanNode::Phrase(_) => "phrase",
            PlanNode::And(_) => "and",
            PlanNode::Or(_) => "or",
            PlanNode::UnaryNot(_) => "not",
            PlanNode::AndNot { .. } => "and_not",
        }
    }

    /// Evaluate within `[lo, hi)`
    pub fn matches(&self, docno: DocNo, lo: u32, hi: u32) -> bool {
        match self {
            PlanNode::Term(node) => node.matches(docno, lo, hi),
            PlanNode::Phrase(node) => node.matches(docno, lo, hi),
            PlanNode::And(nodes) => nodes.iter().all(|n| n.matches(docno, lo, hi)),
            PlanNode::Or(nodes) => nodes.iter().any(|n| n.matches(docno, lo, hi)),
            PlanNode::UnaryNot(inner) => !inner.matches(docno, lo, hi),
            PlanNode::AndNot { positive, negative } => {
                positive.matches(docno, lo, hi) && !negative.matches(docno, lo, hi)
            }
        }
    }

    /// Documents that can possibly match; `None` means any document
    pub fn candidates(&self) -> Option<RoaringBitmap> {
        match self {
            PlanNode::Term(node) => Some(node.candidates()),
            PlanNode::Phrase(node) => Some(node.candidates()),
            PlanNode::And(nodes) => {
                let mut result: Option<RoaringBitmap> = None;
                for docs in nodes.iter().filter_map(PlanNode::candidates) {
                    result = Some(match result {
                        Some(r) => r & docs,
                        None => docs,
                    });
                }
                result
            }
            PlanNode::Or(nodes) => {
                let mut result = RoaringBitmap::new();
                for node in nodes {
                    result |= node.candidates()?;
                }
                Some(result)
            }
            PlanNode::UnaryNot(_) => None,
            PlanNode::AndNot { positive, .. } => positive.candidates(),
        }
    }
}
