//! Combo facet: a view over several dependent facets
//!
//! Combo values have the form `<dependent><separator><value>`. Filters are
//! delegated to the named dependent. AND needs every group to resolve and
//! collapses to the empty filter otherwise; OR skips groups that do not.

use crate::config::FacetProperties;
use crate::filter::Filter;
use crate::segment::DocNo;

use super::{FacetHandler, FacetHandlers, SegmentFacets};

/// Default separator between dependent name and value
pub const DEFAULT_COMBO_SEPARATOR: &str = ":";

#[derive(Clone, Debug)]
pub struct ComboFacetHandler {
    name: String,
    separator: String,
    depends_on: Vec<String>,
}

impl ComboFacetHandler {
    pub fn new<I, S>(name: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            separator: DEFAULT_COMBO_SEPARATOR.to_string(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Split `<dependent><sep><value>`; both parts must be non-empty
    pub fn parse_selection<'a>(&self, value: &'a str) -> Option<(&'a str, &'a str)> {
        let (name, val) = value.split_once(self.separator.as_str())?;
        if name.is_empty() || val.is_empty() {
            return None;
        }
        Some((name, val))
    }

    /// Resolve a dependent declared by this combo
    fn dependent<'a>(&self, name: &str, handlers: &'a FacetHandlers) -> Option<&'a FacetHandler> {
        if self.depends_on.iter().any(|d| d == name) {
            handlers.get(name)
        } else {
            None
        }
    }

    /// Parsed values grouped by dependent name, in first-seen order
    fn group(&self, values: &[String]) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for value in values {
            let Some((name, val)) = self.parse_selection(value) else {
                continue;
            };
            match groups.iter_mut().find(|(n, _)| n == name) {
                Some((_, vals)) => vals.push(val.to_string()),
                None => groups.push((name.to_string(), vec![val.to_string()])),
            }
        }
        groups
    }

    pub fn build_filter(&self, value: &str, props: &FacetProperties, handlers: &FacetHandlers) -> Filter {
        self.parse_selection(value)
            .and_then(|(name, val)| {
                self.dependent(name, handlers)
                    .map(|handler| handler.build_filter(val, props, handlers))
            })
            .unwrap_or(Filter::Empty)
    }

    pub fn build_and_filter(
        &self,
        values: &[String],
        props: &FacetProperties,
        handlers: &FacetHandlers,
    ) -> Filter {
        let mut filters = Vec::new();
        for (name, vals) in self.group(values) {
            let Some(handler) = self.dependent(&name, handlers) else {
                return Filter::Empty;
            };
            if vals.is_empty() {
                return Filter::Empty;
            }
            let filter = handler.build_and_filter(&vals, props, handlers);
            if filter.is_empty() {
                return filter;
            }
            filters.push(filter);
        }
        Filter::and(filters)
    }

    pub fn build_or_filter(
        &self,
        values: &[String],
        props: &FacetProperties,
        negate: bool,
        handlers: &FacetHandlers,
    ) -> Filter {
        let mut filters = Vec::new();
        for (name, vals) in self.group(values) {
            let Some(handler) = self.dependent(&name, handlers) else {
                continue;
            };
            if vals.is_empty() {
                continue;
            }
            let filter = handler.build_or_filter(&vals, props, negate, handlers);
            if !filter.is_empty() {
                filters.push(filter);
            }
        }
        if negate {
            // NOT (a OR b) == (NOT a) AND (NOT b); excluding nothing keeps everything
            if filters.is_empty() {
                return Filter::not(Filter::Empty);
            }
            Filter::and(filters)
        } else {
            Filter::or(filters)
        }
    }

    pub fn field_values(&self, facets: &SegmentFacets, docno: DocNo) -> Vec<String> {
        let mut values = Vec::new();
        for name in &self.depends_on {
            let Some(handler) = facets.handler(name) else {
                continue;
            };
            for value in handler.field_values(facets, docno) {
                values.push(format!("{}{}{}", name, self.separator, value));
            }
        }
        values
    }

    /// Number of dependents with at least one value for the document
    pub fn num_items(&self, facets: &SegmentFacets, docno: DocNo) -> usize {
        self.depends_on
            .iter()
            .filter_map(|name| facets.handler(name))
            .filter(|handler| handler.num_items(facets, docno) > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::{AttributeFacetHandler, SimpleFacetHandler};
    use crate::segment::{MemoryDocument, MemorySegment};
    use std::sync::Arc;

    fn handlers() -> FacetHandlers {
        FacetHandlers::new(vec![
            FacetHandler::Simple(SimpleFacetHandler::new("a")),
            FacetHandler::Attribute(AttributeFacetHandler::new("b")),
            FacetHandler::Simple(SimpleFacetHandler::new("unlisted")),
            FacetHandler::Combo(ComboFacetHandler::new("combo", ["a", "b"])),
        ])
        .unwrap()
    }

    fn combo(handlers: &FacetHandlers) -> &ComboFacetHandler {
        match handlers.get("combo") {
            Some(FacetHandler::Combo(c)) => c,
            _ => panic!("combo handler missing"),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_selection() {
        let handler = ComboFacetHandler::new("combo", ["a"]);
        assert_eq!(handler.parse_selection("a:v1"), Some(("a", "v1")));
        assert_eq!(handler.parse_selection("b:x=y"), Some(("b", "x=y")));
        assert_eq!(handler.parse_selection("a:"), None);
        assert_eq!(handler.parse_selection(":v1"), None);
        assert_eq!(handler.parse_selection("novalue"), None);
    }

    #[test]
    fn test_build_filter_delegates() {
        let handlers = handlers();
        let props = FacetProperties::default();
        let combo = combo(&handlers);

        let expected = handlers.get("a").unwrap().build_filter("v1", &props, &handlers);
        assert_eq!(combo.build_filter("a:v1", &props, &handlers), expected);
        assert_eq!(combo.build_filter("garbage", &props, &handlers), Filter::Empty);
        assert_eq!(combo.build_filter("unlisted:v1", &props, &handlers), Filter::Empty);
        assert_eq!(combo.build_filter("nobody:v1", &props, &handlers), Filter::Empty);
    }

    #[test]
    fn test_and_filter_short_circuits_on_unknown() {
        let handlers = handlers();
        let props = FacetProperties::default();
        let combo = combo(&handlers);

        let ok = combo.build_and_filter(&strings(&["a:v1", "b:k=v"]), &props, &handlers);
        assert!(matches!(ok, Filter::And(ref fs) if fs.len() == 2));

        let bad = combo.build_and_filter(&strings(&["a:v1", "nobody:x"]), &props, &handlers);
        assert_eq!(bad, Filter::Empty);
        assert_eq!(combo.build_and_filter(&[], &props, &handlers), Filter::Empty);
    }

    #[test]
    fn test_or_filter_skips_unknown() {
        let handlers = handlers();
        let props = FacetProperties::default();
        let combo = combo(&handlers);

        let filter = combo.build_or_filter(&strings(&["a:v1", "nobody:x"]), &props, false, &handlers);
        let expected = handlers.get("a").unwrap().build_or_filter(&strings(&["v1"]), &props, false, &handlers);
        assert_eq!(filter, expected);

        let negated = combo.build_or_filter(&strings(&["a:v1", "b:k"]), &props, true, &handlers);
        match negated {
            Filter::And(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(parts.iter().all(|p| matches!(p, Filter::Not(_))));
            }
            other => panic!("expected intersection of negations, got {:?}", other),
        }

        let nothing_excluded = combo.build_or_filter(&strings(&["nobody:x", "garbage"]), &props, true, &handlers);
        assert_eq!(nothing_excluded, Filter::not(Filter::Empty));
    }

    #[test]
    fn test_field_values_prefixed_in_dependency_order() {
        let handlers = Arc::new(handlers());
        let segment = MemorySegment::builder()
            .document(
                MemoryDocument::new()
                    .stored("b", "k=v3")
                    .stored("b", "k=v2")
                    .stored("a", "v1"),
            )
            .document(MemoryDocument::new())
            .build();
        let facets = SegmentFacets::load(handlers, &segment).unwrap();
        let combo = combo(facets.handlers());

        assert_eq!(
            combo.field_values(&facets, DocNo(0)),
            strings(&["a:v1", "b:k=v2", "b:k=v3"])
        );
        assert_eq!(combo.num_items(&facets, DocNo(0)), 2);
        assert!(combo.field_values(&facets, DocNo(1)).is_empty());
        assert_eq!(combo.num_items(&facets, DocNo(1)), 0);
    }
}
