//! Multi-valued `key=value` attribute facet
//!
//! Each stored value is parsed as `key<separator>value`. Entries without the
//! separator, or with an empty key or value, are dropped at load time.
//!
//! Selected values are opaque strings: a selection `s` matches a stored entry
//! `v` when `v == s` or `v` starts with `s<separator>`, so selecting a bare key
//! matches every entry under it.

use crate::config::FacetProperties;
use crate::filter::{Filter, ValueMatcher};
use crate::segment::{DocNo, PostingSource};

use super::FacetData;

/// Default separator between attribute key and value
pub const DEFAULT_ATTRIBUTE_SEPARATOR: &str = "=";

/// Facet over `key=value` attribute strings
#[derive(Clone, Debug)]
pub struct AttributeFacetHandler {
    name: String,
    field: String,
    separator: String,
    properties: FacetProperties,
}

impl AttributeFacetHandler {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            name,
            separator: DEFAULT_ATTRIBUTE_SEPARATOR.to_string(),
            properties: FacetProperties::default(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Handler-level defaults; a separator given here replaces the current one
    pub fn with_properties(mut self, properties: FacetProperties) -> Self {
        if let Some(ref sep) = properties.separator {
            self.separator = sep.clone();
        }
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn properties(&self) -> &FacetProperties {
        &self.properties
    }

    /// Split a raw entry into key and value
    pub fn parse<'a>(&self, raw: &'a str) -> Option<(&'a str, &'a str)> {
        let (key, value) = raw.split_once(self.separator.as_str())?;
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some((key, value))
    }

    /// Key part of a selected or stored value
    pub fn key_of<'a>(&self, value: &'a str) -> &'a str {
        value
            .split_once(self.separator.as_str())
            .map_or(value, |(key, _)| key)
    }

    /// Effective per-key limit once selection properties are applied
    pub fn max_facets_per_key(&self, selection: Option<&FacetProperties>) -> Option<usize> {
        match selection {
            Some(props) => self.properties.merged(props).max_facets_per_key,
            None => self.properties.max_facets_per_key,
        }
    }

    pub(crate) fn load(&self, source: &dyn PostingSource) -> FacetData {
        let doc_values = (0..source.document_count())
            .map(|doc| {
                source
                    .stored_values(DocNo(doc), &self.field)
                    .into_iter()
                    .filter(|raw| self.parse(raw).is_some())
                    .collect()
            })
            .collect();
        FacetData::from_doc_values(doc_values)
    }

    pub fn build_filter(&self, value: &str) -> Filter {
        Filter::values(
            self.name.clone(),
            ValueMatcher::Attribute {
                value: value.to_string(),
                separator: self.separator.clone(),
            },
        )
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
