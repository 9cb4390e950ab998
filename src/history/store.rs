//! Read-only catalog of historical reference outcomes, loaded once at startup.
//! Arena-style: records live in one `Vec`, with a parallel lowercase search index.
//! Share it across threads with `Arc`; nothing mutates it after `load`.

use std::sync::Arc;

use serde::Serialize;

use crate::error::ComparisonError;
use crate::history::outcome::HistoricalOutcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoricalOutcomeStore {
    records: Vec<HistoricalOutcome>,
    /// Lowercased name + context + key factors, one per record.
    search_text: Vec<String>,
    report: LoadReport,
}

impl HistoricalOutcomeStore {
    /// Load already-parsed records. Malformed records are skipped and listed in
    /// the [LoadReport]; loading never fails.
    pub fn load(records: Vec<HistoricalOutcome>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut report = LoadReport::default();
        for (index, record) in records.into_iter().enumerate() {
            match record.validate(index) {
                Ok(()) => kept.push(record),
                Err(err) => {
                    tracing::warn!(%err, "skipping historical record");
                    report.skipped.push(err.to_string());
                }
            }
        }
        report.loaded = kept.len();
        let search_text = kept.iter().map(search_text).collect();
        Self {
            records: kept,
            search_text,
            report,
        }
    }

    /// Built-in curated catalog.
    pub fn curated() -> Self {
        Self::load(crate::history::catalog::curated_outcomes())
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HistoricalOutcome] {
        &self.records
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Records whose name, context or key factors contain any keyword
    /// (case-insensitive), ordered by applicability descending with ties in
    /// insertion order. No keywords selects the whole catalog.
    pub fn find_relevant<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<&HistoricalOutcome> {
        let needles: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        let mut matches: Vec<&HistoricalOutcome> = self
            .records
            .iter()
            .zip(&self.search_text)
            .filter(|(_, text)| needles.is_empty() || needles.iter().any(|n| text.contains(n)))
            .map(|(record, _)| record)
            .collect();
        // sort_by is stable, so equal scores keep insertion order.
        matches.sort_by(|left, right| {
            right
                .applicability_score
                .total_cmp(&left.applicability_score)
        });
        matches
    }

    /// `Err(EmptyCatalog)` when there is nothing to compare against.
    pub fn ensure_not_empty(&self) -> Result<(), ComparisonError> {
        if self.records.is_empty() {
            Err(ComparisonError::EmptyCatalog)
        } else {
            Ok(())
        }
    }
}

fn search_text(record: &HistoricalOutcome) -> String {
    let mut text = String::with_capacity(record.name.len() + record.context.len() + 32);
    text.push_str(&record.name.to_lowercase());
    text.push('\n');
    text.push_str(&record.context.to_lowercase());
    for factor in &record.key_factors {
        text.push('\n');
        text.push_str(&factor.to_lowercase());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HistoricalOutcomeStore {
        HistoricalOutcomeStore::load(vec![
            HistoricalOutcome::new("A", "Feigned retreat", 0.7, 0.6)
                .with_context("Cavalry lured the enemy off the ridge"),
            HistoricalOutcome::new("B", "Night crossing", 0.5, 0.9)
                .with_key_factors(["Deception", "timing"]),
            HistoricalOutcome::new("C", "Frontal assault", 0.2, 0.6)
                .with_context("Cavalry charge into prepared positions"),
            HistoricalOutcome::new("D", "Broken record", 1.7, 0.5),
        ])
    }

    #[test]
    fn load_skips_malformed_records() {
        let s = store();
        assert_eq!(s.len(), 3);
        assert_eq!(s.load_report().skipped.len(), 1);
    }

    #[test]
    fn find_relevant_is_case_insensitive_and_stable() {
        let s = store();
        let hits = s.find_relevant(&["CAVALRY"]);
        let names: Vec<&str> = hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Feigned retreat", "Frontal assault"]);

        let deception = s.find_relevant(&["deception"]);
        assert_eq!(deception.len(), 1);
        assert_eq!(deception[0].source, "B");
    }

    #[test]
    fn no_keywords_returns_catalog_by_applicability() {
        let s = store();
        let all: Vec<&str> = s
            .find_relevant::<&str>(&[])
            .iter()
            .map(|h| h.source.as_str())
            .collect();
        assert_eq!(all, vec!["B", "A", "C"]);
    }

    #[test]
    fn empty_store_reports_empty_catalog() {
        let s = HistoricalOutcomeStore::load(Vec::new());
        assert!(s.find_relevant(&["anything"]).is_empty());
        assert_eq!(s.ensure_not_empty(), Err(ComparisonError::EmptyCatalog));
    }
}
