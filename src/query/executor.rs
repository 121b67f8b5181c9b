//! Section-scoped query execution
//!
//! A document matches when the plan matches inside at least one section of the
//! requested tag, or anywhere in the document when no tag is given.

use roaring::RoaringBitmap;
use std::sync::Arc;
use tracing::debug;

use super::ast::SectionQuery;
use super::plan::PlanNode;
use super::planner::QueryPlanBuilder;
use crate::config::DEFAULT_SECTION_FIELD;
use crate::segment::{DocNo, Interval, IntervalSet, PostingSource, Term};
use crate::Result;

/// Runs plans against one segment
pub struct SectionSearcher<'a> {
    source: &'a dyn PostingSource,
    section_field: String,
}

impl<'a> SectionSearcher<'a> {
    pub fn new(source: &'a dyn PostingSource) -> Self {
        Self {
            source,
            section_field: DEFAULT_SECTION_FIELD.to_string(),
        }
    }

    pub fn with_section_field(mut self, field: impl Into<String>) -> Self {
        self.section_field = field.into();
        self
    }

    /// Sections of `tag`, from the metadata cache when possible
    fn sections(&self, tag: &str) -> Arc<IntervalSet> {
        let term = Term::new(self.section_field.as_str(), tag);
        self.source
            .metadata_cache()
            .and_then(|cache| cache.lookup(&term))
            .unwrap_or_else(|| Arc::new(IntervalSet::from_postings(&self.source.postings(&term))))
    }

    /// Documents matching `plan` within the sections of `section`
    pub fn search(&self, plan: &PlanNode, section: Option<&str>) -> RoaringBitmap {
        let mut candidates = plan
            .candidates()
            .unwrap_or_else(|| (0..self.source.document_count()).collect());

        let matched: RoaringBitmap = match section {
            Some(tag) => {
                let sections = self.sections(tag);
                candidates &= sections.docs();
                candidates
                    .iter()
                    .filter(|&doc| {
                        sections
                            .intervals(DocNo(doc))
                            .iter()
                            .any(|s| plan.matches(DocNo(doc), s.start, s.end))
                    })
                    .collect()
            }
            None => {
                let whole = Interval::whole();
                candidates
                    .iter()
                    .filter(|&doc| plan.matches(DocNo(doc), whole.start, whole.end))
                    .collect()
            }
        };

        debug!(
            plan = plan.kind(),
            section = section.unwrap_or("*"),
            matched = matched.len(),
            "Section search complete"
        );
        matched
    }

    /// Compile and run a query; a query with no plan matches nothing
    pub fn search_query(&self, query: &SectionQuery, section: Option<&str>) -> Result<RoaringBitmap> {
        let plan = QueryPlanBuilder::new(self.source).plan(Some(query))?;
        Ok(plan
            .map(|plan| self.search(&plan, section))
            .unwrap_or_default())
    }
}
