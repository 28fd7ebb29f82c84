//! Destination catalog
//!
//! The fixed set of destinations users can browse and search. Built once
//! from configuration at startup and shared read-only.

use crate::config::CatalogConfig;
use crate::models::Destination;

/// Immutable, ordered list of destinations
#[derive(Debug, Clone)]
pub struct Catalog {
    destinations: Vec<Destination>,
}

impl Catalog {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.destinations.clone())
    }

    /// All destinations in declared order
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Case-insensitive substring search on destination names.
    ///
    /// Matches keep catalog order. An empty key matches everything.
    pub fn search(&self, key: &str) -> Vec<Destination> {
        let key = key.to_lowercase();
        self.destinations
            .iter()
            .filter(|d| d.name.to_lowercase().contains(&key))
            .cloned()
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every result contains the key, and results are a subsequence of
        /// the catalog.
        #[test]
        fn search_results_match_and_keep_order(key in "[a-zA-Z ]{0,6}") {
            let catalog = Catalog::default();
            let results = catalog.search(&key);
            let lowered = key.to_lowercase();

            for d in &results {
                prop_assert!(d.name.to_lowercase().contains(&lowered));
            }

            let mut remaining = catalog.destinations().iter();
            for d in &results {
                prop_assert!(remaining.any(|c| c == d));
            }
        }

        /// Searching is insensitive to the case of the key.
        #[test]
        fn search_ignores_key_case(key in "[a-zA-Z]{0,5}") {
            let catalog = Catalog::default();
            prop_assert_eq!(
                catalog.search(&key.to_uppercase()),
                catalog.search(&key.to_lowercase())
            );
        }

        /// Any substring of a name finds that destination.
        #[test]
        fn search_finds_own_name(index in 0usize..6, start in 0usize..8, len in 0usize..8) {
            let catalog = Catalog::default();
            let name = &catalog.destinations()[index].name;
            let chars: Vec<char> = name.chars().collect();
            let start = start.min(chars.len());
            let end = (start + len).min(chars.len());
            let key: String = chars[start..end].iter().collect();

            let results = catalog.search(&key);
            prop_assert!(results.iter().any(|d| &d.name == name));
        }
    }
}
