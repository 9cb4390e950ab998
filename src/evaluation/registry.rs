//! Capability sets keyed by scenario category.
//!
//! Every scenario gets the baseline contributors; a category tag adds its own
//! set on top. New categories are registered, not branched on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::evaluation::contributor::{FactorContributor, WeightedFactor};

pub const DECEPTION: &str = "deception";
pub const MANEUVER: &str = "maneuver";
pub const DEFENSIVE: &str = "defensive";
pub const ATTRITION: &str = "attrition";

#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    baseline: Vec<Arc<dyn FactorContributor>>,
    categories: HashMap<String, Vec<Arc<dyn FactorContributor>>>,
}

fn weighted(pairs: &[(&str, f64)]) -> Vec<Arc<dyn FactorContributor>> {
    pairs
        .iter()
        .map(|&(factor, weight)| Arc::new(WeightedFactor::new(factor, weight)) as Arc<dyn FactorContributor>)
        .collect()
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

impl CategoryRegistry {
    /// No contributors at all; the score is just the base rate.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Baseline factor set plus the built-in categories.
    pub fn standard() -> Self {
        let mut registry = Self {
            baseline: weighted(&[
                ("terrain_advantage", 0.20),
                ("resource_availability", 0.15),
                ("timing_advantage", 0.10),
                ("leadership_quality", 0.15),
                ("enemy_intelligence", -0.10),
                ("enemy_morale", -0.10),
            ]),
            categories: HashMap::new(),
        };
        registry.register_all(
            DECEPTION,
            weighted(&[
                ("deception_credibility", 0.20),
                ("intelligence_superiority", 0.15),
                ("enemy_intelligence", -0.05),
            ]),
        );
        registry.register_all(
            MANEUVER,
            weighted(&[("mobility", 0.15), ("terrain_advantage", 0.05)]),
        );
        registry.register_all(
            DEFENSIVE,
            weighted(&[("fortification_strength", 0.20), ("supply_lines", 0.10)]),
        );
        registry.register_all(
            ATTRITION,
            weighted(&[("supply_lines", 0.15), ("enemy_morale", -0.10)]),
        );
        registry
    }

    pub fn add_baseline(&mut self, contributor: Arc<dyn FactorContributor>) {
        self.baseline.push(contributor);
    }

    pub fn register(&mut self, category: &str, contributor: Arc<dyn FactorContributor>) {
        self.categories
            .entry(normalize_tag(category))
            .or_default()
            .push(contributor);
    }

    pub fn register_all<I>(&mut self, category: &str, contributors: I)
    where
        I: IntoIterator<Item = Arc<dyn FactorContributor>>,
    {
        for contributor in contributors {
            self.register(category, contributor);
        }
    }

    pub fn is_registered(&self, category: &str) -> bool {
        self.categories.contains_key(&normalize_tag(category))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Baseline contributors followed by the category's extras, if any.
    /// Unknown categories resolve to the baseline alone.
    pub fn resolve(&self, category: Option<&str>) -> impl Iterator<Item = &dyn FactorContributor> {
        let extras = category
            .and_then(|tag| self.categories.get(&normalize_tag(tag)))
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.baseline
            .iter()
            .chain(extras.iter())
            .map(|c| c.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deception_adds_its_factors_on_top_of_baseline() {
        let registry = CategoryRegistry::standard();
        let baseline: Vec<&str> = registry.resolve(None).map(|c| c.factor()).collect();
        let deception: Vec<&str> = registry.resolve(Some("Deception")).map(|c| c.factor()).collect();
        assert_eq!(baseline.len(), 6);
        assert_eq!(deception.len(), 9);
        assert!(deception.contains(&"deception_credibility"));
        assert!(deception.contains(&"intelligence_superiority"));
    }

    #[test]
    fn unknown_category_falls_back_to_baseline() {
        let registry = CategoryRegistry::standard();
        assert_eq!(registry.resolve(Some("naval")).count(), 6);
        assert!(!registry.is_registered("naval"));
    }

    #[test]
    fn new_categories_plug_in_without_touching_existing_ones() {
        let mut registry = CategoryRegistry::standard();
        registry.register("naval", Arc::new(WeightedFactor::new("sea_state", -0.05)));
        assert!(registry.is_registered("NAVAL"));
        assert_eq!(registry.resolve(Some("naval")).count(), 7);
        assert_eq!(registry.resolve(Some(DECEPTION)).count(), 9);
    }
}
