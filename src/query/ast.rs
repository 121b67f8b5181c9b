//! Query tree accepted by the section plan compiler
//!
//! Only `Term`, `Phrase`, `Boolean` and `MetaData` can be evaluated inside a
//! section. The remaining kinds exist so requests can carry them; the
//! compiler rejects them with a typed error.

use serde::{Deserialize, Serialize};

use crate::segment::Term;

/// How a clause takes part in a boolean query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    Must,
    MustNot,
    Should,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    pub query: SectionQuery,
    pub occur: Occur,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
    pub clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, query: SectionQuery, occur: Occur) -> Self {
        self.clauses.push(BooleanClause { query, occur });
        self
    }

    pub fn must(self, query: SectionQuery) -> Self {
        self.add(query, Occur::Must)
    }

    pub fn must_not(self, query: SectionQuery) -> Self {
        self.add(query, Occur::MustNot)
    }

    pub fn should(self, query: SectionQuery) -> Self {
        self.add(query, Occur::Should)
    }
}

/// A phrase term and its position within the phrase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseTerm {
    pub term: Term,
    pub position: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseQuery {
    pub terms: Vec<PhraseTerm>,
}

impl PhraseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjacent terms of one field, in order
    pub fn from_texts<'a>(field: &str, texts: impl IntoIterator<Item = &'a str>) -> Self {
        let terms = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PhraseTerm {
                term: Term::new(field, text),
                position: i as u32,
            })
            .collect();
        Self { terms }
    }

    /// Add a term at an explicit phrase position; gaps are allowed
    pub fn add(mut self, term: Term, position: u32) -> Self {
        self.terms.push(PhraseTerm { term, position });
        self
    }
}

/// A query node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionQuery {
    Term(Term),
    Phrase(PhraseQuery),
    Boolean(BooleanQuery),
    /// Match by section metadata term
    #[serde(rename = "metadata")]
    MetaData(Term),
    Prefix(Term),
    Wildcard(Term),
    Fuzzy { term: Term, max_edits: u32 },
    Range {
        field: String,
        lower: Option<String>,
        upper: Option<String>,
    },
    MatchAll,
}

impl SectionQuery {
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        SectionQuery::Term(Term::new(field, text))
    }

    pub fn metadata(field: impl Into<String>, text: impl Into<String>) -> Self {
        SectionQuery::MetaData(Term::new(field, text))
    }

    pub fn phrase<'a>(field: &str, texts: impl IntoIterator<Item = &'a str>) -> Self {
        SectionQuery::Phrase(PhraseQuery::from_texts(field, texts))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SectionQuery::Term(_) => "term",
            SectionQuery::Phrase(_) => "phrase",
            SectionQuery::Boolean(_) => "boolean",
            SectionQuery::MetaData(_) => "metadata",
            SectionQuery::Prefix(_) => "prefix",
            SectionQuery::Wildcard(_) => "wildcard",
            SectionQuery::Fuzzy { .. } => "fuzzy",
            SectionQuery::Range { .. } => "range",
            SectionQuery::MatchAll => "match_all",
        }
    }
}

impl From<BooleanQuery> for SectionQuery {
    fn from(query: BooleanQuery) -> Self {
        SectionQuery::Boolean(query)
    }
}

impl From<PhraseQuery> for SectionQuery {
    fn from(query: PhraseQuery) -> Self {
        SectionQuery::Phrase(query)
    }
}
