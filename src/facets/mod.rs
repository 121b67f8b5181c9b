//! Facet handlers
//!
//! A handler knows how to load one facet's per-document values from a segment
//! and how to turn selected values into [`Filter`]s. Handlers are registered
//! once in a [`FacetHandlers`] registry shared by every segment; the loaded
//! data lives in each segment's [`SegmentFacets`] arena.
//!
//! - `Simple`: one value per document
//! - `Attribute`: many `key=value` entries per document
//! - `Combo`: delegates to named dependent handlers

mod attribute;
mod combo;
mod counter;
mod data;
mod simple;

pub use attribute::{AttributeFacetHandler, DEFAULT_ATTRIBUTE_SEPARATOR};
pub use combo::{ComboFacetHandler, DEFAULT_COMBO_SEPARATOR};
pub use counter::{CountOptions, FacetCounter, ValueCounts};
pub use data::{FacetData, FacetSlot, SegmentFacets};
pub use simple::SimpleFacetHandler;

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::FacetProperties;
use crate::filter::Filter;
use crate::models::BrowseSelection;
use crate::segment::{DocNo, PostingSource};
use crate::{BrowseError, Result};

/// A registered facet handler
#[derive(Clone, Debug)]
pub enum FacetHandler {
    Simple(SimpleFacetHandler),
    Attribute(AttributeFacetHandler),
    Combo(ComboFacetHandler),
}

impl FacetHandler {
    pub fn name(&self) -> &str {
        match self {
            FacetHandler::Simple(h) => h.name(),
            FacetHandler::Attribute(h) => h.name(),
            FacetHandler::Combo(h) => h.name(),
        }
    }

    /// Handler kind for logging and errors
    pub fn kind(&self) -> &'static str {
        match self {
            FacetHandler::Simple(_) => "simple",
            FacetHandler::Attribute(_) => "attribute",
            FacetHandler::Combo(_) => "combo",
        }
    }

    pub fn depends_on(&self) -> &[String] {
        match self {
            FacetHandler::Combo(h) => h.depends_on(),
            _ => &[],
        }
    }

    /// Load this handler's per-document values; combos own no data
    pub(crate) fn load(&self, source: &dyn PostingSource) -> Result<Option<FacetData>> {
        let data = match self {
            FacetHandler::Simple(h) => Some(h.load(source)?),
            FacetHandler::Attribute(h) => Some(h.load(source)),
            FacetHandler::Combo(_) => None,
        };
        Ok(data)
    }

    pub fn build_filter(&self, value: &str, props: &FacetProperties, handlers: &FacetHandlers) -> Filter {
        match self {
            FacetHandler::Simple(h) => h.build_filter(value),
            FacetHandler::Attribute(h) => h.build_filter(value),
            FacetHandler::Combo(h) => h.build_filter(value, props, handlers),
        }
    }

    pub fn build_and_filter(
        &self,
        values: &[String],
        props: &FacetProperties,
        handlers: &FacetHandlers,
    ) -> Filter {
        match self {
            FacetHandler::Simple(h) => h.build_and_filter(values),
            FacetHandler::Attribute(h) => h.build_and_filter(values),
            FacetHandler::Combo(h) => h.build_and_filter(values, props, handlers),
        }
    }

    pub fn build_or_filter(
        &self,
        values: &[String],
        props: &FacetProperties,
        negate: bool,
        handlers: &FacetHandlers,
    ) -> Filter {
        match self {
            FacetHandler::Simple(h) => h.build_or_filter(values, negate),
            FacetHandler::Attribute(h) => h.build_or_filter(values, negate),
            FacetHandler::Combo(h) => h.build_or_filter(values, props, negate, handlers),
        }
    }

    /// Values of a document for this facet
    pub fn field_values(&self, facets: &SegmentFacets, docno: DocNo) -> Vec<String> {
        match self {
            FacetHandler::Combo(h) => h.field_values(facets, docno),
            _ => facets
                .data_by_name(self.name())
                .map(|data| data.field_values(docno))
                .unwrap_or_default(),
        }
    }

    /// Number of values a document carries for this facet
    pub fn num_items(&self, facets: &SegmentFacets, docno: DocNo) -> usize {
        match self {
            FacetHandler::Combo(h) => h.num_items(facets, docno),
            _ => facets
                .data_by_name(self.name())
                .map_or(0, |data| data.ordinals(docno).len()),
        }
    }

    /// Count values over `docs` in one segment
    pub fn count(&self, facets: &SegmentFacets, docs: impl IntoIterator<Item = u32>) -> Result<ValueCounts> {
        match self {
            FacetHandler::Combo(h) => Err(BrowseError::UnsupportedOperation {
                facet: h.name().to_string(),
                operation: "facet counting",
            }),
            _ => Ok(facets
                .data_by_name(self.name())
                .map(|data| ValueCounts::collect(data, docs))
                .unwrap_or_default()),
        }
    }

    /// Counting options derived from the handler and the facet's own selection
    pub fn count_options(&self, selection: Option<&BrowseSelection>) -> CountOptions {
        match self {
            FacetHandler::Attribute(h) => {
                let keys = selection
                    .filter(|sel| !sel.values.is_empty())
                    .map(|sel| sel.values.iter().map(|v| h.key_of(v).to_string()).collect());
                CountOptions {
                    max_per_key: h.max_facets_per_key(selection.map(|sel| &sel.properties)),
                    separator: Some(h.separator().to_string()),
                    keys,
                }
            }
            _ => CountOptions::default(),
        }
    }

    /// Comparator ordering documents by their smallest value for this facet
    pub fn doc_comparator<'a>(&self, facets: &'a SegmentFacets) -> Result<DocComparator<'a>> {
        match self {
            FacetHandler::Combo(h) => Err(BrowseError::UnsupportedOperation {
                facet: h.name().to_string(),
                operation: "sorting",
            }),
            _ => Ok(DocComparator {
                data: facets.data_by_name(self.name()),
            }),
        }
    }
}

/// Orders documents of one segment by facet value; documents without a value sort last
#[derive(Clone, Copy, Debug)]
pub struct DocComparator<'a> {
    data: Option<&'a FacetData>,
}

impl<'a> DocComparator<'a> {
    /// Smallest value of the document, used as its sort key
    pub fn sort_value(&self, docno: DocNo) -> Option<&'a str> {
        let data = self.data?;
        data.ordinals(docno).first().and_then(|&ord| data.value(ord))
    }

    pub fn compare(&self, a: DocNo, b: DocNo) -> Ordering {
        compare_sort_values(self.sort_value(a), self.sort_value(b))
    }
}

/// Present values first, ascending
pub fn compare_sort_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Registry of facet handlers, addressed by name or slot
#[derive(Clone, Debug, Default)]
pub struct FacetHandlers {
    handlers: Vec<FacetHandler>,
    by_name: HashMap<String, FacetSlot>,
}

impl FacetHandlers {
    /// Register handlers in order; a combo may only depend on handlers listed before it
    pub fn new(handlers: Vec<FacetHandler>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(handlers.len());
        for (idx, handler) in handlers.iter().enumerate() {
            for dependency in handler.depends_on() {
                if !by_name.contains_key(dependency) {
                    return Err(BrowseError::UnknownDependency {
                        facet: handler.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
            if by_name.insert(handler.name().to_string(), FacetSlot(idx)).is_some() {
                return Err(BrowseError::DuplicateFacet(handler.name().to_string()));
            }
        }
        Ok(Self { handlers, by_name })
    }

    pub fn get(&self, name: &str) -> Option<&FacetHandler> {
        self.slot(name).map(|slot| &self.handlers[slot.0])
    }

    pub fn require(&self, name: &str) -> Result<&FacetHandler> {
        self.get(name)
            .ok_or_else(|| BrowseError::UnknownFacet(name.to_string()))
    }

    pub fn slot(&self, name: &str) -> Option<FacetSlot> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacetHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
