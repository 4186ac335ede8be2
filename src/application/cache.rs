//! Session-scoped entity cache
//!
//! Populated once by the first successful full load and replaced only as a
//! whole. A blank search restores the displayed list from this snapshot
//! without touching the network.

use crate::domain::criteria::SearchQuery;
use crate::domain::entities::CatalogEntity;

#[derive(Debug, Clone)]
pub struct EntityCache<E> {
    entries: Option<Vec<E>>,
}

impl<E> Default for EntityCache<E> {
    fn default() -> Self {
        Self { entries: None }
    }
}

impl<E: CatalogEntity> EntityCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a full load has completed in this session.
    pub fn is_populated(&self) -> bool {
        self.entries.is_some()
    }

    /// Cached entities, empty when unpopulated.
    pub fn entries(&self) -> &[E] {
        self.entries.as_deref().unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<E> {
        self.entries().to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Replace the whole cache. An empty result still counts as populated.
    pub fn populate(&mut self, entries: Vec<E>) {
        self.entries = Some(entries);
    }

    pub fn invalidate(&mut self) {
        self.entries = None;
    }

    /// Entities whose display name or secondary labels contain `query`,
    /// in cache order.
    pub fn scan(&self, query: &SearchQuery) -> Vec<E> {
        self.entries()
            .iter()
            .filter(|entity| entity.matches(query))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Brand;

    fn brand(id: &str, name: &str) -> Brand {
        Brand {
            id: id.into(),
            name: name.into(),
            ..Brand::default()
        }
    }

    #[test]
    fn test_empty_population_is_still_populated() {
        let mut cache = EntityCache::<Brand>::new();
        assert!(!cache.is_populated());
        cache.populate(Vec::new());
        assert!(cache.is_populated());
        assert!(cache.is_empty());

        cache.invalidate();
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_scan_preserves_cache_order() {
        let mut cache = EntityCache::new();
        cache.populate(vec![
            brand("1", "Philips Healthcare"),
            brand("2", "Medtronic"),
            brand("3", "GE Healthcare"),
        ]);

        let hits: Vec<String> = cache
            .scan(&SearchQuery::new("health"))
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(hits, ["1", "3"]);
        assert!(cache.scan(&SearchQuery::new("zeiss")).is_empty());
    }
}
