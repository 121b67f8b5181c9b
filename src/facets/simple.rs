//! Single-valued facet over a stored field

use crate::filter::{Filter, ValueMatcher};
use crate::segment::{DocNo, PostingSource};
use crate::{BrowseError, Result};

use super::FacetData;

/// Facet with at most one value per document
#[derive(Clone, Debug)]
pub struct SimpleFacetHandler {
    name: String,
    field: String,
}

impl SimpleFacetHandler {
    /// Create a handler reading the stored field of the same name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            name,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn load(&self, source: &dyn PostingSource) -> Result<FacetData> {
        let mut doc_values = Vec::with_capacity(source.document_count() as usize);
        for doc in 0..source.document_count() {
            let values = source.stored_values(DocNo(doc), &self.field);
            if values.len() > 1 {
                return Err(BrowseError::FacetLoad {
                    facet: self.name.clone(),
                    reason: format!("document {} has {} values for single-valued field {}", doc, values.len(), self.field),
                });
            }
            doc_values.push(values);
        }
        Ok(FacetData::from_doc_values(doc_values))
    }

    pub fn build_filter(&self, value: &str) -> Filter {
        Filter::values(self.name.clone(), ValueMatcher::Exact(value.to_string()))
    }

    pub fn build_and_filter(&self, values: &[String]) -> Filter {
        Filter::and(values.iter().map(|v| self.build_filter(v)).collect())
    }

    pub fn build_or_filter(&self, values: &[String], negate: bool) -> Filter {
        let filter = Filter::or(values.iter().map(|v| self.build_filter(v)).collect());
        if negate {
            Filter::not(filter)
        } else {
            filter
        }
    }
}
