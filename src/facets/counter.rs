//! Facet value counting
//!
//! Counting runs in two phases: [`ValueCounts::collect`] scans one segment's
//! matching documents, and [`FacetCounter::finish`] turns the (possibly
//! merged) counts into the ordered, truncated list returned to callers.

use std::collections::{BTreeMap, HashMap};

use super::FacetData;
use crate::models::{BrowseFacet, FacetResult, FacetSortSpec, FacetSpec};
use crate::segment::DocNo;

/// Raw per-value hit counts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueCounts {
    counts: BTreeMap<String, u32>,
    /// Documents that contributed at least one value
    total: u32,
}

impl ValueCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every value of every document in `docs`
    pub fn collect(data: &FacetData, docs: impl IntoIterator<Item = u32>) -> Self {
        let mut by_ordinal = vec![0u32; data.value_count()];
        let mut total = 0;
        for doc in docs {
            let ordinals = data.ordinals(DocNo(doc));
            if ordinals.is_empty() {
                continue;
            }
            total += 1;
            for &ord in ordinals {
                by_ordinal[ord as usize] += 1;
            }
        }

        let counts = by_ordinal
            .into_iter()
            .enumerate()
            .filter(|(_, count)| *count > 0)
            .filter_map(|(ord, count)| data.value(ord as u32).map(|v| (v.to_string(), count)))
            .collect();

        Self { counts, total }
    }

    /// Fold counts from another segment into this one
    pub fn merge(&mut self, other: ValueCounts) {
        for (value, count) in other.counts {
            *self.counts.entry(value).or_insert(0) += count;
        }
        self.total += other.total;
    }

    pub fn get(&self, value: &str) -> u32 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Attribute-specific counting options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountOptions {
    /// Keep at most this many entries per key
    pub max_per_key: Option<usize>,
    /// Separator between key and value
    pub separator: Option<String>,
    /// Report only entries under these keys
    pub keys: Option<Vec<String>>,
}

/// Finalizes counts according to a [`FacetSpec`]
pub struct FacetCounter<'a> {
    spec: &'a FacetSpec,
    options: CountOptions,
}

impl<'a> FacetCounter<'a> {
    pub fn new(spec: &'a FacetSpec) -> Self {
        Self {
            spec,
            options: CountOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CountOptions) -> Self {
        self.options = options;
        self
    }

    fn key_of<'v>(&self, value: &'v str) -> &'v str {
        match self.options.separator.as_deref() {
            Some(sep) => value.split_once(sep).map_or(value, |(key, _)| key),
            None => value,
        }
    }

    /// Filter, order and truncate the counted values
    pub fn finish(&self, counts: ValueCounts) -> FacetResult {
        let total = counts.total;
        let mut facets: Vec<BrowseFacet> = counts
            .counts
            .into_iter()
            .filter(|(_, count)| *count >= self.spec.min_hit_count)
            .filter(|(value, _)| match &self.options.keys {
                Some(keys) => {
                    let key = self.key_of(value);
                    keys.iter().any(|k| k == key)
                }
                None => true,
            })
            .map(|(value, hit_count)| BrowseFacet::new(value, hit_count))
            .collect();

        match &self.spec.order_by {
            FacetSortSpec::Value => facets.sort_by(|a, b| a.value.cmp(&b.value)),
            FacetSortSpec::HitsDesc => facets.sort_by(|a, b| {
                b.hit_count
                    .cmp(&a.hit_count)
                    .then_with(|| a.value.cmp(&b.value))
            }),
            FacetSortSpec::Custom(comparator) => {
                facets.sort_by(|a, b| comparator.compare(a, b).then_with(|| a.value.cmp(&b.value)))
            }
        }

        if let Some(max) = self.options.max_per_key {
            let mut per_key: HashMap<String, usize> = HashMap::new();
            facets.retain(|facet| {
                let seen = per_key.entry(self.key_of(&facet.value).to_string()).or_insert(0);
                *seen += 1;
                *seen <= max
            });
        }

        if self.spec.max_count > 0 {
            facets.truncate(self.spec.max_count);
        }

        FacetResult { facets, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacetComparator;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn attribute_data() -> FacetData {
        FacetData::from_doc_values(vec![
            strings(&["prop1=val1", "prop2=val1", "prop5=val1"]),
            strings(&["prop1=val2", "prop3=val1", "prop7=val7"]),
            strings(&["prop1=val2", "prop3=val2", "prop3=val3"]),
            strings(&["prop1=val1", "prop2=val1"]),
            strings(&["prop1=val1", "prop2=val1"]),
            strings(&["prop1=val1", "prop2=val1", "prop4=val2", "prop4=val3"]),
        ])
    }

    fn values(result: &FacetResult) -> Vec<(&str, u32)> {
        result
            .facets
            .iter()
            .map(|f| (f.value.as_str(), f.hit_count))
            .collect()
    }

    fn attribute_options(max_per_key: Option<usize>) -> CountOptions {
        CountOptions {
            max_per_key,
            separator: Some("=".to_string()),
            keys: None,
        }
    }

    #[test]
    fn test_collect_counts() {
        let data = attribute_data();
        let counts = ValueCounts::collect(&data, 0..6);
        assert_eq!(counts.get("prop1=val1"), 4);
        assert_eq!(counts.get("prop1=val2"), 2);
        assert_eq!(counts.get("prop3=val3"), 1);
        assert_eq!(counts.get("missing"), 0);
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_collect_counts_subset() {
        let data = FacetData::from_doc_values(vec![strings(&["a"]), strings(&[]), strings(&["a", "b"])]);
        let counts = ValueCounts::collect(&data, [1, 2]);
        assert_eq!(counts.get("a"), 1);
        assert_eq!(counts.get("b"), 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_merge() {
        let mut left = ValueCounts {
            counts: [("a".to_string(), 1), ("b".to_string(), 1)].into(),
            total: 1,
        };
        let right = ValueCounts {
            counts: [("a".to_string(), 1)].into(),
            total: 1,
        };
        left.merge(right);
        assert_eq!(left.get("a"), 2);
        assert_eq!(left.get("b"), 1);
        assert_eq!(left.total(), 2);
    }

    #[test]
    fn test_min_hit_count_and_value_order() {
        let data = attribute_data();
        let spec = FacetSpec::default().with_min_hit_count(2);
        let result = FacetCounter::new(&spec).finish(ValueCounts::collect(&data, 0..6));
        assert_eq!(
            values(&result),
            vec![("prop1=val1", 4), ("prop1=val2", 2), ("prop2=val1", 4)]
        );
    }

    #[test]
    fn test_hits_desc_with_one_per_key() {
        let data = attribute_data();
        let spec = FacetSpec::default().with_order_by(FacetSortSpec::HitsDesc);
        let result = FacetCounter::new(&spec)
            .with_options(attribute_options(Some(1)))
            .finish(ValueCounts::collect(&data, 0..6));
        assert_eq!(
            values(&result),
            vec![
                ("prop1=val1", 4),
                ("prop2=val1", 4),
                ("prop3=val1", 1),
                ("prop4=val2", 1),
                ("prop5=val1", 1),
                ("prop7=val7", 1),
            ]
        );
    }

    #[test]
    fn test_hits_desc_with_two_per_key() {
        let data = attribute_data();
        let spec = FacetSpec::default().with_order_by(FacetSortSpec::HitsDesc);
        let result = FacetCounter::new(&spec)
            .with_options(attribute_options(Some(2)))
            .finish(ValueCounts::collect(&data, 0..6));
        assert_eq!(result.facets.len(), 9);
        assert_eq!(
            &values(&result)[..4],
            &[("prop1=val1", 4), ("prop2=val1", 4), ("prop1=val2", 2), ("prop3=val1", 1)]
        );
    }

    #[test]
    fn test_key_restriction() {
        let data = attribute_data();
        let spec = FacetSpec::default();
        let options = CountOptions {
            keys: Some(strings(&["prop3"])),
            ..attribute_options(None)
        };
        let result = FacetCounter::new(&spec)
            .with_options(options)
            .finish(ValueCounts::collect(&data, [1, 2]));
        assert_eq!(
            values(&result),
            vec![("prop3=val1", 1), ("prop3=val2", 1), ("prop3=val3", 1)]
        );
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_custom_comparator_and_max_count() {
        let data = attribute_data();
        let by_len_desc = FacetComparator::new(|a: &BrowseFacet, b: &BrowseFacet| {
            b.value.len().cmp(&a.value.len())
        });
        let spec = FacetSpec::default()
            .with_order_by(FacetSortSpec::Custom(by_len_desc))
            .with_max_count(2);
        let result = FacetCounter::new(&spec).finish(ValueCounts::collect(&data, 0..6));
        // all values share a length, so ties fall back to value order
        assert_eq!(values(&result), vec![("prop1=val1", 4), ("prop1=val2", 2)]);
    }
}
