use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::models::FacetSpec;

/// Property key for the per-key facet limit of attribute facets
pub const MAX_FACETS_PER_KEY: &str = "maxFacetsPerKey";

/// Property key for a handler's value separator
pub const SEPARATOR: &str = "separator";

/// Default field carrying section boundary terms
pub const DEFAULT_SECTION_FIELD: &str = "_SECTION";

/// Typed facet properties recognized by the handlers
///
/// Handler-level properties act as defaults; a selection's properties
/// override them key by key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_facets_per_key: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl FacetProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an opaque string map; unknown keys are ignored
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let mut props = Self::default();
        for (key, value) in map {
            match key.as_str() {
                MAX_FACETS_PER_KEY => match value.trim().parse::<usize>() {
                    Ok(n) => props.max_facets_per_key = Some(n),
                    Err(_) => warn!(value = %value, "ignoring unparsable {}", MAX_FACETS_PER_KEY),
                },
                SEPARATOR => props.separator = Some(value.clone()),
                _ => {}
            }
        }
        props
    }

    pub fn with_max_facets_per_key(mut self, max: usize) -> Self {
        self.max_facets_per_key = Some(max);
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Overlay `other` on top of `self`: options set in `other` win
    pub fn merged(&self, other: &FacetProperties) -> FacetProperties {
        FacetProperties {
            max_facets_per_key: other.max_facets_per_key.or(self.max_facets_per_key),
            separator: other.separator.clone().or_else(|| self.separator.clone()),
        }
    }
}

/// Browse-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Field whose terms tag section boundaries
    pub section_field: String,
    /// Facet spec used for facets requested without one
    pub default_facet_spec: FacetSpec,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            section_field: DEFAULT_SECTION_FIELD.to_string(),
            default_facet_spec: FacetSpec::default(),
        }
    }
}

impl BrowseConfig {
    pub fn with_section_field(mut self, field: impl Into<String>) -> Self {
        self.section_field = field.into();
        self
    }
}
