//! Turning browse selections into filters

use crate::config::FacetProperties;
use crate::facets::{FacetHandler, FacetHandlers};
use crate::models::{BrowseSelection, ValueOperation};
use crate::Result;

use super::Filter;

/// Effective properties: handler defaults overridden by the selection
fn effective_properties(handler: &FacetHandler, selection: &BrowseSelection) -> FacetProperties {
    match handler {
        FacetHandler::Attribute(h) => h.properties().merged(&selection.properties),
        _ => selection.properties.clone(),
    }
}

/// Filter for a single selection, or `None` when it restricts nothing
pub fn selection_filter(
    handler: &FacetHandler,
    selection: &BrowseSelection,
    handlers: &FacetHandlers,
) -> Option<Filter> {
    let props = effective_properties(handler, selection);

    let positive = if selection.values.is_empty() {
        None
    } else {
        Some(match selection.operation {
            ValueOperation::And => handler.build_and_filter(&selection.values, &props, handlers),
            ValueOperation::Or => handler.build_or_filter(&selection.values, &props, false, handlers),
        })
    };

    let negative = if selection.not_values.is_empty() {
        None
    } else {
        Some(handler.build_or_filter(&selection.not_values, &props, true, handlers))
    };

    match (positive, negative) {
        (Some(pos), Some(neg)) => Some(Filter::and(vec![pos, neg])),
        (Some(filter), None) | (None, Some(filter)) => Some(filter),
        (None, None) => None,
    }
}

/// AND together every selection except the one for `skip`
///
/// Returns `None` when no selection restricts the result.
pub fn compose_selections(
    handlers: &FacetHandlers,
    selections: &[BrowseSelection],
    skip: Option<&str>,
) -> Result<Option<Filter>> {
    let mut filters = Vec::new();
    for selection in selections {
        let handler = handlers.require(&selection.field_name)?;
        if skip == Some(selection.field_name.as_str()) {
            continue;
        }
        if let Some(filter) = selection_filter(handler, selection, handlers) {
            filters.push(filter);
        }
    }
    if filters.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Filter::and(filters)))
    }
}
