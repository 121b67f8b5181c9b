//! Integration tests for section-scoped queries
//!
//! Tests query compilation and section search through the browse API.

use std::sync::Arc;

use parabrowse::config::DEFAULT_SECTION_FIELD;
use parabrowse::facets::FacetHandler;
use parabrowse::query::{PlanNode, QueryPlanBuilder};
use parabrowse::segment::{MemoryDocument, MemorySegment, SegmentSet, Term};
use parabrowse::{
    BooleanQuery, BrowseConfig, BrowseRequest, BrowseSelection, Browser, FacetHandlers,
    SectionQuery, SimpleFacetHandler,
};

fn article(title: &str, body: &str, lang: &str) -> MemoryDocument {
    let title_len = title.split_whitespace().count() as u32;
    let body_len = body.split_whitespace().count() as u32;
    MemoryDocument::new()
        .text("text", title)
        .text("text", body)
        .section("title", 0, title_len)
        .section("body", title_len, title_len + body_len)
        .stored("lang", lang)
}

fn setup(cache: bool) -> (SegmentSet, MemorySegment) {
    let build = || {
        MemorySegment::builder()
            .cache_sections(cache)
            .document(article("rust search engine", "written in rust with facets", "en"))
            .document(article("facet counting", "a rust crate for search", "en"))
            .document(article("moteur de recherche", "rust et facettes", "fr"))
            .document(article("query planning", "sections and phrases", "en"))
            .build()
    };
    let set = SegmentSet::new(
        FacetHandlers::new(vec![FacetHandler::Simple(SimpleFacetHandler::new("lang"))]).unwrap(),
    );
    set.open(Arc::new(build())).unwrap();
    (set, build())
}

fn term(text: &str) -> SectionQuery {
    SectionQuery::term("text", text)
}

#[test]
fn test_query_scoped_to_section() {
    for cache in [false, true] {
        let (set, _) = setup(cache);
        let browser = Browser::new(&set, BrowseConfig::default());

        let in_title = browser
            .browse(&BrowseRequest::new().with_query(term("rust")).with_section("title"))
            .unwrap();
        assert_eq!(in_title.doc_ids(), vec![0]);

        let in_body = browser
            .browse(&BrowseRequest::new().with_query(term("rust")).with_section("body"))
            .unwrap();
        assert_eq!(in_body.doc_ids(), vec![0, 1, 2]);

        let anywhere = browser
            .browse(&BrowseRequest::new().with_query(term("search")))
            .unwrap();
        assert_eq!(anywhere.doc_ids(), vec![0, 1]);
    }
}

#[test]
fn test_query_and_selection_intersect() {
    let (set, _) = setup(false);
    let browser = Browser::new(&set, BrowseConfig::default());
    let request = BrowseRequest::new()
        .with_query(term("rust"))
        .with_section("body")
        .with_selection(BrowseSelection::new("lang").value("en"))
        .with_facet("lang");
    let result = browser.browse(&request).unwrap();

    assert_eq!(result.doc_ids(), vec![0, 1]);
    assert_eq!(result.facet("lang").unwrap().get("en"), Some(2));
    assert_eq!(result.facet("lang").unwrap().get("fr"), None);
}

#[test]
fn test_boolean_within_section() {
    let (set, _) = setup(false);
    let browser = Browser::new(&set, BrowseConfig::default());
    let query: SectionQuery = BooleanQuery::new()
        .must(term("rust"))
        .must_not(term("search"))
        .into();

    // doc 1 has "search" in its body, doc 0 only in its title
    let result = browser
        .browse(&BrowseRequest::new().with_query(query.clone()).with_section("body"))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![0, 2]);

    let result = browser
        .browse(&BrowseRequest::new().with_query(query))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![2]);
}

#[test]
fn test_either_prohibited_term_excludes_within_section() {
    let (set, _) = setup(false);
    let browser = Browser::new(&set, BrowseConfig::default());
    let query: SectionQuery = BooleanQuery::new()
        .must(term("rust"))
        .must_not(term("facets"))
        .must_not(term("search"))
        .into();

    // doc 0 has "facets" in its body, doc 1 has "search"
    let result = browser
        .browse(&BrowseRequest::new().with_query(query.clone()).with_section("body"))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![2]);

    // only doc 0 has "rust" in its title, and "search" sits beside it
    let result = browser
        .browse(&BrowseRequest::new().with_query(query).with_section("title"))
        .unwrap();
    assert_eq!(result.num_hits, 0);

    let optional: SectionQuery = BooleanQuery::new()
        .should(term("rust"))
        .should(term("sections"))
        .must_not(term("facets"))
        .must_not(term("search"))
        .into();
    let result = browser
        .browse(&BrowseRequest::new().with_query(optional).with_section("body"))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![2, 3]);
}

#[test]
fn test_phrase_respects_section_bounds() {
    let (set, _) = setup(false);
    let browser = Browser::new(&set, BrowseConfig::default());

    let phrase = SectionQuery::phrase("text", ["search", "engine"]);
    let result = browser
        .browse(&BrowseRequest::new().with_query(phrase.clone()).with_section("title"))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![0]);
    let result = browser
        .browse(&BrowseRequest::new().with_query(phrase).with_section("body"))
        .unwrap();
    assert_eq!(result.num_hits, 0);

    // "counting a" crosses from title into body
    let crossing = SectionQuery::phrase("text", ["counting", "a"]);
    let result = browser
        .browse(&BrowseRequest::new().with_query(crossing.clone()))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![1]);
    let result = browser
        .browse(&BrowseRequest::new().with_query(crossing).with_section("title"))
        .unwrap();
    assert_eq!(result.num_hits, 0);
}

#[test]
fn test_negative_only_query_matches_nothing() {
    let (set, _) = setup(false);
    let browser = Browser::new(&set, BrowseConfig::default());
    let query: SectionQuery = BooleanQuery::new().must_not(term("rust")).into();
    let result = browser
        .browse(&BrowseRequest::new().with_query(query))
        .unwrap();
    assert_eq!(result.num_hits, 0);
}

#[test]
fn test_metadata_query() {
    let (set, _) = setup(true);
    let browser = Browser::new(&set, BrowseConfig::default());
    let query: SectionQuery = BooleanQuery::new()
        .must(SectionQuery::metadata(DEFAULT_SECTION_FIELD, "title"))
        .must(term("facet"))
        .into();
    let result = browser
        .browse(&BrowseRequest::new().with_query(query))
        .unwrap();
    assert_eq!(result.doc_ids(), vec![1]);
}

#[test]
fn test_plan_shapes() {
    let (_, source) = setup(false);
    let builder = QueryPlanBuilder::new(&source);

    let and: SectionQuery = BooleanQuery::new().must(term("rust")).must(term("search")).into();
    assert!(matches!(builder.plan(Some(&and)).unwrap(), Some(PlanNode::And(ref n)) if n.len() == 2));

    let not: SectionQuery = BooleanQuery::new().must_not(term("rust")).into();
    assert_eq!(builder.plan(Some(&not)).unwrap(), None);

    let and_not: SectionQuery = BooleanQuery::new().must(term("rust")).must_not(term("search")).into();
    assert!(matches!(
        builder.plan(Some(&and_not)).unwrap(),
        Some(PlanNode::AndNot { .. })
    ));

    let two_prohibited: SectionQuery = BooleanQuery::new()
        .must(term("rust"))
        .must_not(term("search"))
        .must_not(term("facets"))
        .into();
    assert!(matches!(
        builder.plan(Some(&two_prohibited)).unwrap(),
        Some(PlanNode::AndNot { ref negative, .. }) if matches!(**negative, PlanNode::Or(ref n) if n.len() == 2)
    ));

    let optional_and_prohibited: SectionQuery = BooleanQuery::new()
        .should(term("rust"))
        .should(term("query"))
        .must_not(term("search"))
        .into();
    assert!(matches!(
        builder.plan(Some(&optional_and_prohibited)).unwrap(),
        Some(PlanNode::AndNot { ref positive, .. }) if matches!(**positive, PlanNode::Or(_))
    ));

    let fuzzy = SectionQuery::Fuzzy {
        term: Term::new("text", "rsut"),
        max_edits: 1,
    };
    let err = builder.plan(Some(&fuzzy)).unwrap_err();
    assert_eq!(err.to_string(), "unable to translate query kind: fuzzy");
    assert!(err.is_request_error());
}
