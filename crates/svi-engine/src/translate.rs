//! Multi-language slug translation
//!
//! Records are authored against the canonical-language product. When a
//! translated product is displayed its attribute slugs differ, so records
//! are rewritten to the displayed slugs before resolution.

use crate::host::{Catalog, ProductId, Translations, VariationAttribute};
use indexmap::IndexMap;
use svi_core::slug::sanitize;
use svi_core::AssignmentRecord;

/// Canonical slug to displayed slug
pub type SlugMap = IndexMap<String, String>;

/// Check if records of `displayed` need translating
#[must_use]
pub fn needs_translation<H: Translations>(host: &H, variable: bool, displayed: ProductId, canonical: ProductId) -> bool {
    host.is_active() && variable && displayed != canonical
}

/// Build the canonical to displayed slug map
///
/// Taxonomy terms of the displayed product map through their canonical
/// counterpart. Free-text attributes present on both products pair their
/// values by position.
pub fn translation_map<H>(host: &H, displayed: ProductId, canonical: ProductId) -> SlugMap
where
    H: Catalog + Translations,
{
    let shown = host.variation_attributes(displayed);
    let source = host.variation_attributes(canonical);

    let mut map = SlugMap::new();
    for attribute in shown.iter().filter(|a| a.variation && a.taxonomy) {
        for term in &attribute.values {
            let canonical_slug = term
                .term_id
                .and_then(|id| host.canonical_counterpart(id))
                .and_then(|id| host.term_slug(id))
                .unwrap_or_else(|| term.slug.clone());
            map.insert(canonical_slug.to_lowercase(), term.slug.to_lowercase());
        }
    }

    for attribute in source.iter().filter(|a| a.variation && !a.taxonomy) {
        let Some(counterpart) = free_text_counterpart(&shown, &attribute.name) else {
            continue;
        };
        for (from, to) in attribute.values.iter().zip(&counterpart.values) {
            let (from, to) = (sanitize(&from.label), sanitize(&to.label));
            if !from.is_empty() && !to.is_empty() {
                map.insert(from, to);
            }
        }
    }

    tracing::debug!(%displayed, %canonical, entries = map.len(), "built translation map");
    map
}

fn free_text_counterpart<'a>(attributes: &'a [VariationAttribute], name: &str) -> Option<&'a VariationAttribute> {
    attributes.iter().find(|a| !a.taxonomy && a.name == name)
}

/// Rewrite every mapped slug; returns the number of rewrites
pub fn translate_records(records: &mut [AssignmentRecord], map: &SlugMap) -> usize {
    let mut rewrites = 0;
    for slug in records.iter_mut().flat_map(|r| r.slugs.iter_mut()) {
        if let Some(target) = map.get(slug.as_str()).or_else(|| map.get(&slug.to_lowercase())) {
            if slug != target {
                *slug = target.clone();
                rewrites += 1;
            }
        }
    }
    rewrites
}

#[cfg(test)]
mod tests {
    use super::*;
    use svi_core::ImageId;

    fn map(entries: &[(&str, &str)]) -> SlugMap {
        entries.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn rewrites_mapped_slugs_only() {
        let img = ImageId::new(1).unwrap();
        let mut records = vec![
            AssignmentRecord::new(["red", "large"], vec![img]),
            AssignmentRecord::new(["sviproglobal"], vec![img]),
        ];
        let rewrites = translate_records(&mut records, &map(&[("red", "rojo"), ("large", "grande")]));
        assert_eq!(rewrites, 2);
        assert_eq!(records[0].slugs, vec!["rojo", "grande"]);
        assert_eq!(records[1].slugs, vec!["sviproglobal"]);
    }

    #[test]
    fn mixed_case_slugs_are_looked_up_lowercased() {
        let img = ImageId::new(1).unwrap();
        let mut records = vec![AssignmentRecord::new(["Red"], vec![img])];
        assert_eq!(translate_records(&mut records, &map(&[("red", "rouge")])), 1);
        assert_eq!(records[0].slugs, vec!["rouge"]);
    }
}
