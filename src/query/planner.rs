//! Query plan compiler
//!
//! Translates a [`SectionQuery`] into a [`PlanNode`] bound to one segment's
//! postings. Boolean clauses are partitioned into required, prohibited and
//! optional groups; optional clauses only count when nothing is required.

use std::sync::Arc;
use tracing::debug;

use super::ast::{BooleanQuery, Occur, PhraseQuery, SectionQuery};
use super::plan::{PhraseNode, PlanNode, TermNode};
use crate::segment::{IntervalSet, MetaDataCache, PostingSource, Term};
use crate::{BrowseError, Result};

/// Compiles queries against one segment
pub struct QueryPlanBuilder<'a> {
    source: &'a dyn PostingSource,
    cache: Option<&'a dyn MetaDataCache>,
}

impl<'a> QueryPlanBuilder<'a> {
    /// Use the segment's own metadata cache, if it has one
    pub fn new(source: &'a dyn PostingSource) -> Self {
        Self {
            source,
            cache: source.metadata_cache(),
        }
    }

    pub fn with_cache(mut self, cache: Option<&'a dyn MetaDataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Plan for a top-level query; `None` when nothing can match
    ///
    /// A purely negative query has nothing to subtract from, so it plans to
    /// `None` as well.
    pub fn plan(&self, query: Option<&SectionQuery>) -> Result<Option<PlanNode>> {
        let Some(query) = query else {
            return Ok(None);
        };
        let plan = self.translate(query)?;
        match plan {
            Some(PlanNode::UnaryNot(_)) => {
                debug!(kind = query.kind(), "Top-level plan is negative only, no plan");
                Ok(None)
            }
            other => {
                debug!(
                    kind = query.kind(),
                    plan = other.as_ref().map_or("none", PlanNode::kind),
                    "Translated query"
                );
                Ok(other)
            }
        }
    }

    /// Translate one node
    pub fn translate(&self, query: &SectionQuery) -> Result<Option<PlanNode>> {
        match query {
            SectionQuery::Term(term) => Ok(Some(PlanNode::Term(self.term_node(term)))),
            SectionQuery::Phrase(phrase) => Ok(self.phrase_node(phrase).map(PlanNode::Phrase)),
            SectionQuery::Boolean(boolean) => self.boolean_node(boolean),
            SectionQuery::MetaData(term) => Ok(Some(PlanNode::Term(self.metadata_node(term)))),
            SectionQuery::Prefix(_)
            | SectionQuery::Wildcard(_)
            | SectionQuery::Fuzzy { .. }
            | SectionQuery::Range { .. }
            | SectionQuery::MatchAll => Err(BrowseError::TranslationFailure { kind: query.kind() }),
        }
    }

    fn cached(&self, term: &Term) -> Option<Arc<IntervalSet>> {
        self.cache.and_then(|cache| cache.lookup(term))
    }

    fn term_node(&self, term: &Term) -> TermNode {
        match self.cached(term) {
            Some(intervals) => TermNode::intervals(term.clone(), intervals),
            None => TermNode::positions(term.clone(), self.source.postings(term)),
        }
    }

    fn metadata_node(&self, term: &Term) -> TermNode {
        let intervals = self
            .cached(term)
            .unwrap_or_else(|| Arc::new(IntervalSet::from_postings(&self.source.postings(term))));
        TermNode::intervals(term.clone(), intervals)
    }

    fn phrase_node(&self, phrase: &PhraseQuery) -> Option<PhraseNode> {
        let base = phrase.terms.iter().map(|t| t.position).min()?;
        let terms = phrase
            .terms
            .iter()
            .map(|t| {
                TermNode::positions(t.term.clone(), self.source.postings(&t.term))
                    .with_offset(t.position - base)
            })
            .collect();
        Some(PhraseNode::new(terms))
    }

    fn boolean_node(&self, boolean: &BooleanQuery) -> Result<Option<PlanNode>> {
        let mut required = Vec::new();
        let mut prohibited = Vec::new();
        let mut optional = Vec::new();
        for clause in &boolean.clauses {
            match clause.occur {
                Occur::Must => required.push(&clause.query),
                Occur::MustNot => prohibited.push(&clause.query),
                Occur::Should => optional.push(&clause.query),
            }
        }

        let positive = if required.is_empty() {
            self.combine(&optional, PlanNode::Or)?
        } else {
            self.combine(&required, PlanNode::And)?
        };
        let negative = self.combine(&prohibited, PlanNode::Or)?;

        Ok(match (positive, negative) {
            (positive, None) => positive,
            (None, Some(negative)) => Some(PlanNode::UnaryNot(Box::new(negative))),
            (Some(positive), Some(negative)) => Some(PlanNode::AndNot {
                positive: Box::new(positive),
                negative: Box::new(negative),
            }),
        })
    }

    /// One clause translates directly; several are joined by `join`
    fn combine(
        &self,
        queries: &[&SectionQuery],
        join: fn(Vec<PlanNode>) -> PlanNode,
    ) -> Result<Option<PlanNode>> {
        match queries {
            [] => Ok(None),
            [single] => self.translate(single),
            _ => {
                let mut nodes = Vec::with_capacity(queries.len());
                for query in queries {
                    if let Some(node) = self.translate(query)? {
                        nodes.push(node);
                    }
                }
                Ok(if nodes.is_empty() { None } else { Some(join(nodes)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SECTION_FIELD;
    use crate::query::ast::BooleanQuery;
    use crate::query::plan::TermSource;
    use crate::segment::{MemoryDocument, MemorySegment, DocNo, DOC_END};

    fn segment(cache: bool) -> MemorySegment {
        MemorySegment::builder()
            .cache_sections(cache)
            .document(
                MemoryDocument::new()
                    .text("body", "a b c")
                    .section("title", 0, 2),
            )
            .document(MemoryDocument::new().text("body", "c a"))
            .build()
    }

    fn term(text: &str) -> SectionQuery {
        SectionQuery::term("body", text)
    }

    #[test]
    fn test_required_only_is_and() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new().must(term("a")).must(term("b")).into();
        match builder.plan(Some(&query)).unwrap() {
            Some(PlanNode::And(nodes)) => {
                assert_eq!(nodes.len(), 2);
                assert!(nodes.iter().all(|n| matches!(n, PlanNode::Term(_))));
            }
            other => panic!("expected and node, got {:?}", other),
        }
    }

    #[test]
    fn test_prohibited_only_has_no_plan() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new().must_not(term("c")).into();

        assert!(matches!(
            builder.translate(&query).unwrap(),
            Some(PlanNode::UnaryNot(_))
        ));
        assert_eq!(builder.plan(Some(&query)).unwrap(), None);
        assert_eq!(builder.plan(None).unwrap(), None);
    }

    #[test]
    fn test_required_and_prohibited_is_and_not() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new().must(term("a")).must_not(term("b")).into();
        let plan = builder.plan(Some(&query)).unwrap().unwrap();
        assert_eq!(plan.kind(), "and_not");
        assert!(!plan.matches(DocNo(0), 0, DOC_END));
        assert!(plan.matches(DocNo(1), 0, DOC_END));
    }

    #[test]
    fn test_several_prohibited_are_or() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new()
            .must(term("a"))
            .must_not(term("b"))
            .must_not(term("x"))
            .into();
        match builder.plan(Some(&query)).unwrap() {
            Some(PlanNode::AndNot { positive, negative }) => {
                assert!(matches!(*positive, PlanNode::Term(_)));
                assert!(matches!(*negative, PlanNode::Or(ref n) if n.len() == 2));
            }
            other => panic!("expected and_not node, got {:?}", other),
        }

        let optional: SectionQuery = BooleanQuery::new()
            .should(term("a"))
            .should(term("c"))
            .must_not(term("b"))
            .into();
        let plan = builder.plan(Some(&optional)).unwrap().unwrap();
        match &plan {
            PlanNode::AndNot { positive, negative } => {
                assert!(matches!(**positive, PlanNode::Or(ref n) if n.len() == 2));
                assert!(matches!(**negative, PlanNode::Term(_)));
            }
            other => panic!("expected and_not node, got {:?}", other),
        }
        assert!(!plan.matches(DocNo(0), 0, DOC_END));
        assert!(plan.matches(DocNo(1), 0, DOC_END));
    }

    #[test]
    fn test_optional_ignored_when_required_present() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new().must(term("b")).should(term("c")).into();
        let plan = builder.plan(Some(&query)).unwrap().unwrap();
        assert!(matches!(plan, PlanNode::Term(ref t) if t.term().text == "b"));

        let optional: SectionQuery = BooleanQuery::new().should(term("a")).should(term("b")).into();
        assert_eq!(builder.plan(Some(&optional)).unwrap().unwrap().kind(), "or");
    }

    #[test]
    fn test_empty_boolean_dropped() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new()
            .must(term("a"))
            .must(BooleanQuery::new().into())
            .into();
        match builder.translate(&query).unwrap() {
            Some(PlanNode::And(nodes)) => assert_eq!(nodes.len(), 1),
            other => panic!("expected and node, got {:?}", other),
        }
        assert_eq!(builder.translate(&BooleanQuery::new().into()).unwrap(), None);
    }

    #[test]
    fn test_unsupported_kind_fails() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let query: SectionQuery = BooleanQuery::new()
            .must(term("a"))
            .should(SectionQuery::Prefix(Term::new("body", "a")))
            .must(SectionQuery::MatchAll)
            .into();
        match builder.translate(&query) {
            Err(BrowseError::TranslationFailure { kind }) => assert_eq!(kind, "match_all"),
            other => panic!("expected translation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_uses_cache_when_present() {
        let tag = Term::new(DEFAULT_SECTION_FIELD, "title");
        let query = SectionQuery::MetaData(tag.clone());

        let uncached = segment(false);
        let derived = QueryPlanBuilder::new(&uncached).translate(&query).unwrap().unwrap();
        let cached = segment(true);
        let from_cache = QueryPlanBuilder::new(&cached).translate(&query).unwrap().unwrap();

        for plan in [&derived, &from_cache] {
            match plan {
                PlanNode::Term(node) => assert!(matches!(node.source(), TermSource::Intervals(_))),
                other => panic!("expected term node, got {:?}", other),
            }
            assert!(plan.matches(DocNo(0), 1, 5));
            assert!(!plan.matches(DocNo(0), 2, 5));
            assert!(!plan.matches(DocNo(1), 0, DOC_END));
        }
        assert_eq!(derived, from_cache);

        // a plain term query on a cached tag reads the cached intervals too
        let term_plan = QueryPlanBuilder::new(&cached)
            .translate(&SectionQuery::Term(tag))
            .unwrap()
            .unwrap();
        assert!(matches!(term_plan, PlanNode::Term(ref n) if matches!(n.source(), TermSource::Intervals(_))));
    }

    #[test]
    fn test_cache_override() {
        let cached = segment(true);
        let tag = Term::new(DEFAULT_SECTION_FIELD, "title");
        let plan = QueryPlanBuilder::new(&cached)
            .with_cache(None)
            .translate(&SectionQuery::Term(tag))
            .unwrap()
            .unwrap();
        assert!(matches!(plan, PlanNode::Term(ref n) if matches!(n.source(), TermSource::Positions(_))));
    }

    #[test]
    fn test_phrase_offsets_relative() {
        let source = segment(false);
        let builder = QueryPlanBuilder::new(&source);
        let phrase = PhraseQuery::new()
            .add(Term::new("body", "a"), 4)
            .add(Term::new("body", "c"), 6);
        let plan = builder.translate(&phrase.into()).unwrap().unwrap();
        assert!(plan.matches(DocNo(0), 0, DOC_END));
        assert!(!plan.matches(DocNo(1), 0, DOC_END));
        assert_eq!(builder.translate(&PhraseQuery::new().into()).unwrap(), None);
    }
}
