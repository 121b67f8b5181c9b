//! Browse request execution
//!
//! A [`Browser`] works on a snapshot of the live segments. Per segment it
//! intersects the selection filter with the section query matches, counts the
//! requested facets over the result, and collects hits. Counts are merged
//! across segments before they are ordered and truncated.

use roaring::RoaringBitmap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::BrowseConfig;
use crate::facets::{compare_sort_values, FacetCounter, FacetHandler, FacetHandlers, ValueCounts};
use crate::filter::{compose_selections, Filter};
use crate::models::{BrowseHit, BrowseRequest, BrowseResult, FacetSpec};
use crate::query::{QueryPlanBuilder, SectionSearcher};
use crate::segment::{BrowseSegment, DocNo, SegmentSet, SegmentSnapshot};
use crate::{BrowseError, Result};

/// Executes browse requests over a fixed set of segments
pub struct Browser {
    segments: SegmentSnapshot,
    handlers: Arc<FacetHandlers>,
    config: BrowseConfig,
}

/// A facet to count and how
struct FacetTask<'r> {
    name: &'r str,
    handler: &'r FacetHandler,
    spec: &'r FacetSpec,
    /// Filter replacing the full one when the facet's own selection is ignored
    expanded: Option<Option<Filter>>,
    counts: ValueCounts,
}

impl Browser {
    /// Browse the segments currently published in `set`
    pub fn new(set: &SegmentSet, config: BrowseConfig) -> Self {
        Self {
            segments: set.snapshot(),
            handlers: set.handlers().clone(),
            config,
        }
    }

    pub fn config(&self) -> &BrowseConfig {
        &self.config
    }

    pub fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult> {
        let start = Instant::now();
        if request.section.is_some() && request.query.is_none() {
            return Err(BrowseError::InvalidRequest(
                "section given without a query".to_string(),
            ));
        }

        let filter = compose_selections(&self.handlers, &request.selections, None)?;
        let mut tasks = self.facet_tasks(request)?;
        for sort in &request.sort {
            self.handlers.require(&sort.facet)?;
        }

        let mut hits: Vec<(BrowseHit, Vec<Option<String>>)> = Vec::new();
        let mut base = 0u64;
        for segment in self.segments.iter() {
            let query_docs = self.query_docs(segment, request)?;
            let facets = segment.facets();

            let mut matched = match &filter {
                Some(filter) => filter.doc_id_set(facets),
                None => facets.all_docs(),
            };
            if let Some(ref docs) = query_docs {
                matched &= docs;
            }

            for task in tasks.iter_mut() {
                let counts = match &task.expanded {
                    Some(expanded) => {
                        let mut docs = match expanded {
                            Some(filter) => filter.doc_id_set(facets),
                            None => facets.all_docs(),
                        };
                        if let Some(ref query_docs) = query_docs {
                            docs &= query_docs;
                        }
                        task.handler.count(facets, docs.iter())?
                    }
                    None => task.handler.count(facets, matched.iter())?,
                };
                task.counts.merge(counts);
            }

            let comparators = request
                .sort
                .iter()
                .map(|sort| self.handlers.require(&sort.facet)?.doc_comparator(facets))
                .collect::<Result<Vec<_>>>()?;
            for docno in matched.iter() {
                let keys = comparators
                    .iter()
                    .map(|c| c.sort_value(DocNo(docno)).map(str::to_string))
                    .collect();
                let hit = BrowseHit {
                    doc_id: base + docno as u64,
                    segment: segment.id(),
                    docno: DocNo(docno),
                };
                hits.push((hit, keys));
            }
            base += segment.doc_count() as u64;
        }

        if !request.sort.is_empty() {
            hits.sort_by(|(a, a_keys), (b, b_keys)| {
                for ((sort, x), y) in request.sort.iter().zip(a_keys).zip(b_keys) {
                    let ord = compare_sort_values(x.as_deref(), y.as_deref());
                    let ord = if sort.reverse && x.is_some() && y.is_some() {
                        ord.reverse()
                    } else {
                        ord
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.doc_id.cmp(&b.doc_id)
            });
        }

        let num_hits = hits.len();
        let hits = hits
            .into_iter()
            .skip(request.offset)
            .take(request.count)
            .map(|(hit, _)| hit)
            .collect();

        let facets = tasks
            .into_iter()
            .map(|task| {
                let options = task.handler.count_options(request.selection(task.name));
                let result = FacetCounter::new(task.spec)
                    .with_options(options)
                    .finish(task.counts);
                (task.name.to_string(), result)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            segments = self.segments.len(),
            num_hits,
            facets = facets.len(),
            took_us = start.elapsed().as_micros() as u64,
            "Browse complete"
        );

        Ok(BrowseResult {
            num_hits,
            hits,
            facets,
        })
    }

    /// Documents of one segment matching the request's query, `None` when unrestricted
    fn query_docs(&self, segment: &BrowseSegment, request: &BrowseRequest) -> Result<Option<RoaringBitmap>> {
        let Some(query) = &request.query else {
            return Ok(None);
        };
        let source = segment.source();
        let plan = QueryPlanBuilder::new(source).plan(Some(query))?;
        let docs = match plan {
            Some(plan) => SectionSearcher::new(source)
                .with_section_field(self.config.section_field.as_str())
                .search(&plan, request.section.as_deref()),
            None => RoaringBitmap::new(),
        };
        Ok(Some(docs))
    }

    fn facet_tasks<'r>(&'r self, request: &'r BrowseRequest) -> Result<Vec<FacetTask<'r>>> {
        let mut specs: BTreeMap<&str, &FacetSpec> = request
            .facet_specs
            .iter()
            .map(|(name, spec)| (name.as_str(), spec))
            .collect();
        for name in &request.facets {
            specs.entry(name.as_str()).or_insert(&self.config.default_facet_spec);
        }

        let mut tasks = Vec::with_capacity(specs.len());
        for (name, spec) in specs {
            let handler = self.handlers.require(name)?;
            let expanded = if spec.expand_selection && request.selection(name).is_some() {
                Some(compose_selections(&self.handlers, &request.selections, Some(name))?)
            } else {
                None
            };
            tasks.push(FacetTask {
                name,
                handler,
                spec,
                expanded,
                counts: ValueCounts::new(),
            });
        }
        Ok(tasks)
    }
}
