//! Document filters built from facet values
//!
//! A [`Filter`] is a segment-independent predicate. It binds to a segment's
//! facet arena to produce a document bitmap ([`Filter::doc_id_set`]) or to
//! test a single document ([`Filter::matches`]).
//!
//! Composition rules:
//! - `Empty` matches nothing
//! - `and` with any `Empty` input is `Empty`
//! - `or` drops `Empty` inputs; nothing left is `Empty`
//! - a single input is returned as-is, never wrapped

mod selection;

pub use selection::{compose_selections, selection_filter};

use roaring::RoaringBitmap;

use crate::facets::{FacetData, SegmentFacets};
use crate::segment::DocNo;

/// How a filter leaf selects facet values
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueMatcher {
    /// The stored value equals this string
    Exact(String),
    /// The stored value equals `value` or starts with `value` followed by `separator`
    Attribute { value: String, separator: String },
}

impl ValueMatcher {
    pub fn matches(&self, stored: &str) -> bool {
        match self {
            ValueMatcher::Exact(value) => stored == value,
            ValueMatcher::Attribute { value, separator } => {
                stored == value
                    || stored
                        .strip_prefix(value.as_str())
                        .is_some_and(|rest| rest.starts_with(separator.as_str()))
            }
        }
    }

    /// Documents whose values satisfy this matcher
    pub fn doc_id_set(&self, data: &FacetData) -> RoaringBitmap {
        match self {
            ValueMatcher::Exact(value) => data
                .ordinal(value)
                .and_then(|ord| data.docs(ord))
                .cloned()
                .unwrap_or_default(),
            ValueMatcher::Attribute { value, separator } => {
                let mut result = data
                    .ordinal(value)
                    .and_then(|ord| data.docs(ord))
                    .cloned()
                    .unwrap_or_default();
                let prefix = format!("{}{}", value, separator);
                result |= data.docs_in_range(data.prefix_range(&prefix));
                result
            }
        }
    }
}

/// Predicate over the documents of a segment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// Matches no document
    Empty,
    /// Documents whose values for `facet` satisfy `matcher`
    Values { facet: String, matcher: ValueMatcher },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn values(facet: impl Into<String>, matcher: ValueMatcher) -> Self {
        Filter::Values {
            facet: facet.into(),
            matcher,
        }
    }

    /// Intersection; absorbing on `Empty`
    pub fn and(filters: Vec<Filter>) -> Filter {
        if filters.iter().any(Filter::is_empty) {
            return Filter::Empty;
        }
        let mut filters = dedup(filters);
        match filters.len() {
            0 => Filter::Empty,
            1 => filters.remove(0),
            _ => Filter::And(filters),
        }
    }

    /// Union; `Empty` is the identity
    pub fn or(filters: Vec<Filter>) -> Filter {
        let mut filters = dedup(filters.into_iter().filter(|f| !f.is_empty()).collect());
        match filters.len() {
            0 => Filter::Empty,
            1 => filters.remove(0),
            _ => Filter::Or(filters),
        }
    }

    /// Complement within the segment
    pub fn not(filter: Filter) -> Filter {
        Filter::Not(Box::new(filter))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Filter::Empty)
    }

    /// Bind to a segment and compute the matching documents
    pub fn doc_id_set(&self, facets: &SegmentFacets) -> RoaringBitmap {
        match self {
            Filter::Empty => RoaringBitmap::new(),
            Filter::Values { facet, matcher } => facets
                .data_by_name(facet)
                .map(|data| matcher.doc_id_set(data))
                .unwrap_or_default(),
            Filter::And(filters) => {
                let mut result: Option<RoaringBitmap> = None;
                for filter in filters {
                    let matches = filter.doc_id_set(facets);
                    let r = match result {
                        Some(r) => r & matches,
                        None => matches,
                    };
                    // Early exit if no matches
                    if r.is_empty() {
                        return r;
                    }
                    result = Some(r);
                }
                result.unwrap_or_default()
            }
            Filter::Or(filters) => {
                let mut result = RoaringBitmap::new();
                for filter in filters {
                    result |= filter.doc_id_set(facets);
                }
                result
            }
            Filter::Not(inner) => {
                let mut all = facets.all_docs();
                all -= inner.doc_id_set(facets);
                all
            }
        }
    }

    /// Test one document without materializing a bitmap
    pub fn matches(&self, facets: &SegmentFacets, docno: DocNo) -> bool {
        match self {
            Filter::Empty => false,
            Filter::Values { facet, matcher } => facets.data_by_name(facet).is_some_and(|data| {
                data.ordinals(docno)
                    .iter()
                    .filter_map(|&ord| data.value(ord))
                    .any(|value| matcher.matches(value))
            }),
            Filter::And(filters) => filters.iter().all(|f| f.matches(facets, docno)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(facets, docno)),
            Filter::Not(inner) => docno.as_u32() < facets.doc_count() && !inner.matches(facets, docno),
        }
    }
}

fn dedup(filters: Vec<Filter>) -> Vec<Filter> {
    let mut unique: Vec<Filter> = Vec::with_capacity(filters.len());
    for filter in filters {
        if !unique.contains(&filter) {
            unique.push(filter);
        }
    }
    unique
}
