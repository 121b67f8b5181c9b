//! Section-scoped query compilation and execution
//!
//! A [`SectionQuery`] is compiled per segment by [`QueryPlanBuilder`] into a
//! [`PlanNode`] tree, which [`SectionSearcher`] evaluates inside the tagged
//! sections of each candidate document.
//!
//! # Example
//!
//! ```json
//! {
//!   "boolean": {
//!     "clauses": [
//!       { "query": { "term": { "field": "text", "text": "rust" } }, "occur": "must" },
//!       { "query": { "phrase": { "terms": [
//!           { "term": { "field": "text", "text": "search" }, "position": 0 },
//!           { "term": { "field": "text", "text": "engine" }, "position": 1 }
//!       ] } }, "occur": "must_not" }
//!     ]
//!   }
//! }
//! ```

pub mod ast;
pub mod executor;
pub mod plan;
pub mod planner;

pub use ast::{BooleanClause, BooleanQuery, Occur, PhraseQuery, PhraseTerm, SectionQuery};
pub use executor::SectionSearcher;
pub use plan::{PhraseNode, PlanNode, TermNode, TermSource};
pub use planner::QueryPlanBuilder;
