//! Posting source abstraction and an in-memory implementation
//!
//! The browse engine never writes to the index. It reads postings (with
//! positions) and stored field values through [`PostingSource`].

use roaring::RoaringBitmap;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::intervals::{MemoryMetaDataCache, MetaDataCache};
use super::types::{DocNo, Posting, Term};
use crate::config::DEFAULT_SECTION_FIELD;

/// Read-only access to one segment's postings and stored values
pub trait PostingSource: Send + Sync {
    /// Postings for a term, ascending by document, positions ascending
    fn postings(&self, term: &Term) -> Vec<Posting>;

    /// First stored value of a field for a document
    fn stored_value(&self, docno: DocNo, field: &str) -> Option<String>;

    /// All stored values of a field for a document
    fn stored_values(&self, docno: DocNo, field: &str) -> Vec<String> {
        self.stored_value(docno, field).into_iter().collect()
    }

    /// Number of documents in the segment
    fn document_count(&self) -> u32;

    /// Optional cache of precomputed section intervals
    fn metadata_cache(&self) -> Option<&dyn MetaDataCache> {
        None
    }

    /// Documents containing a term
    fn postings_bitmap(&self, term: &Term) -> RoaringBitmap {
        self.postings(term).iter().map(|p| p.docno.as_u32()).collect()
    }
}

/// A document staged for a [`MemorySegment`]
#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    tokens: Vec<(String, String)>,
    stored: Vec<(String, String)>,
    sections: Vec<(String, u32, u32)>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append whitespace-separated tokens of `text` to the document's position axis
    pub fn text(mut self, field: impl Into<String>, text: &str) -> Self {
        let field = field.into();
        for token in text.split_whitespace() {
            self.tokens.push((field.clone(), token.to_string()));
        }
        self
    }

    /// Add a stored value; repeated calls make the field multi-valued
    pub fn stored(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.stored.push((field.into(), value.into()));
        self
    }

    /// Add several stored values for one field
    pub fn stored_all<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.stored.push((field.to_string(), value.into()));
        }
        self
    }

    /// Tag positions `[start, end)` as a section named `tag`
    ///
    /// Sections sharing a tag within one document must not overlap.
    pub fn section(mut self, tag: impl Into<String>, start: u32, end: u32) -> Self {
        self.sections.push((tag.into(), start, end));
        self
    }
}

/// Immutable in-memory segment
#[derive(Debug, Default)]
pub struct MemorySegment {
    postings: HashMap<Term, Vec<Posting>>,
    stored: Vec<HashMap<String, Vec<String>>>,
    cache: Option<MemoryMetaDataCache>,
}

impl MemorySegment {
    pub fn builder() -> MemorySegmentBuilder {
        MemorySegmentBuilder::default()
    }
}

impl PostingSource for MemorySegment {
    fn postings(&self, term: &Term) -> Vec<Posting> {
        self.postings.get(term).cloned().unwrap_or_default()
    }

    fn stored_value(&self, docno: DocNo, field: &str) -> Option<String> {
        self.stored
            .get(docno.as_usize())
            .and_then(|fields| fields.get(field))
            .and_then(|values| values.first().cloned())
    }

    fn stored_values(&self, docno: DocNo, field: &str) -> Vec<String> {
        self.stored
            .get(docno.as_usize())
            .and_then(|fields| fields.get(field))
            .cloned()
            .unwrap_or_default()
    }

    fn document_count(&self) -> u32 {
        self.stored.len() as u32
    }

    fn metadata_cache(&self) -> Option<&dyn MetaDataCache> {
        self.cache.as_ref().map(|c| c as &dyn MetaDataCache)
    }
}

/// Builder for [`MemorySegment`]
pub struct MemorySegmentBuilder {
    section_field: String,
    cache_sections: bool,
    documents: Vec<MemoryDocument>,
}

impl Default for MemorySegmentBuilder {
    fn default() -> Self {
        Self {
            section_field: DEFAULT_SECTION_FIELD.to_string(),
            cache_sections: false,
            documents: Vec::new(),
        }
    }
}

impl MemorySegmentBuilder {
    /// Set the field that section tags are indexed under
    pub fn section_field(mut self, field: impl Into<String>) -> Self {
        self.section_field = field.into();
        self
    }

    /// Precompute a metadata cache for every section tag
    pub fn cache_sections(mut self, enabled: bool) -> Self {
        self.cache_sections = enabled;
        self
    }

    /// Append a document; documents are numbered in insertion order
    pub fn document(mut self, document: MemoryDocument) -> Self {
        self.documents.push(document);
        self
    }

    pub fn build(self) -> MemorySegment {
        let mut positions: HashMap<Term, BTreeMap<u32, Vec<u32>>> = HashMap::new();
        let mut stored = Vec::with_capacity(self.documents.len());
        let mut section_terms = BTreeSet::new();

        for (docno, doc) in self.documents.into_iter().enumerate() {
            let docno = docno as u32;
            for (pos, (field, text)) in doc.tokens.into_iter().enumerate() {
                positions
                    .entry(Term::new(field, text))
                    .or_default()
                    .entry(docno)
                    .or_default()
                    .push(pos as u32);
            }
            for (tag, start, end) in doc.sections {
                let term = Term::new(self.section_field.clone(), tag);
                let doc_positions = positions.entry(term.clone()).or_default().entry(docno).or_default();
                doc_positions.push(start);
                doc_positions.push(end);
                doc_positions.sort_unstable();
                section_terms.insert(term);
            }

            let mut fields: HashMap<String, Vec<String>> = HashMap::new();
            for (field, value) in doc.stored {
                fields.entry(field).or_default().push(value);
            }
            stored.push(fields);
        }

        let postings = positions
            .into_iter()
            .map(|(term, docs)| {
                let list = docs
                    .into_iter()
                    .map(|(docno, pos)| Posting::with_positions(DocNo(docno), pos))
                    .collect();
                (term, list)
            })
            .collect();

        let mut segment = MemorySegment {
            postings,
            stored,
            cache: None,
        };
        if self.cache_sections {
            segment.cache = Some(MemoryMetaDataCache::build(&segment, section_terms.iter()));
        }
        segment
    }
}
