use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::result::BrowseFacet;
use crate::config::FacetProperties;
use crate::query::SectionQuery;

/// How the included values of one selection combine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueOperation {
    /// Every value must match
    And,
    /// Any value may match
    #[default]
    Or,
}

/// Values chosen (or excluded) for one facet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowseSelection {
    pub field_name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub not_values: Vec<String>,
    #[serde(default)]
    pub operation: ValueOperation,
    #[serde(default)]
    pub properties: FacetProperties,
}

impl BrowseSelection {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            ..Default::default()
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn not_value(mut self, value: impl Into<String>) -> Self {
        self.not_values.push(value.into());
        self
    }

    pub fn operation(mut self, operation: ValueOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn properties(mut self, properties: FacetProperties) -> Self {
        self.properties = properties;
        self
    }
}

/// Caller-supplied ordering for facet entries
#[derive(Clone)]
pub struct FacetComparator(Arc<dyn Fn(&BrowseFacet, &BrowseFacet) -> Ordering + Send + Sync>);

impl FacetComparator {
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&BrowseFacet, &BrowseFacet) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(compare))
    }

    pub fn compare(&self, a: &BrowseFacet, b: &BrowseFacet) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for FacetComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FacetComparator(..)")
    }
}

/// Ordering of facet entries
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetSortSpec {
    /// Ascending by value
    #[default]
    Value,
    /// Descending by hit count, ties ascending by value
    HitsDesc,
    /// Custom comparator, ties ascending by value
    #[serde(skip)]
    Custom(FacetComparator),
}

/// Output options for one facet's counts
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetSpec {
    /// Entries counted fewer times are dropped
    pub min_hit_count: u32,
    pub order_by: FacetSortSpec,
    /// Maximum number of entries returned (0 for unlimited)
    pub max_count: usize,
    /// Count as if this facet's own selection were absent
    pub expand_selection: bool,
}

impl Default for FacetSpec {
    fn default() -> Self {
        Self {
            min_hit_count: 1,
            order_by: FacetSortSpec::Value,
            max_count: 0,
            expand_selection: false,
        }
    }
}

impl FacetSpec {
    pub fn with_min_hit_count(mut self, min_hit_count: u32) -> Self {
        self.min_hit_count = min_hit_count;
        self
    }

    pub fn with_order_by(mut self, order_by: FacetSortSpec) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_expand_selection(mut self, expand: bool) -> Self {
        self.expand_selection = expand;
        self
    }
}

/// Sort hits by a facet's value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub facet: String,
    #[serde(default)]
    pub reverse: bool,
}

impl SortField {
    pub fn new(facet: impl Into<String>) -> Self {
        Self {
            facet: facet.into(),
            reverse: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// Browse request
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseRequest {
    pub selections: Vec<BrowseSelection>,
    /// Facets to count, by name
    pub facet_specs: BTreeMap<String, FacetSpec>,
    /// Facets to count with the browser's default spec
    pub facets: Vec<String>,
    pub query: Option<SectionQuery>,
    /// Section tag the query is scoped to; whole documents when absent
    pub section: Option<String>,
    pub offset: usize,
    pub count: usize,
    pub sort: Vec<SortField>,
}

impl Default for BrowseRequest {
    fn default() -> Self {
        Self {
            selections: Vec::new(),
            facet_specs: BTreeMap::new(),
            facets: Vec::new(),
            query: None,
            section: None,
            offset: 0,
            count: 10,
            sort: Vec::new(),
        }
    }
}

impl BrowseRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: BrowseSelection) -> Self {
        self.selections.push(selection);
        self
    }

    pub fn with_facet_spec(mut self, facet: impl Into<String>, spec: FacetSpec) -> Self {
        self.facet_specs.insert(facet.into(), spec);
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facets.push(facet.into());
        self
    }

    pub fn with_query(mut self, query: SectionQuery) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_section(mut self, tag: impl Into<String>) -> Self {
        self.section = Some(tag.into());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// The selection made for a facet, if any
    pub fn selection(&self, facet: &str) -> Option<&BrowseSelection> {
        self.selections.iter().find(|s| s.field_name == facet)
    }
}
