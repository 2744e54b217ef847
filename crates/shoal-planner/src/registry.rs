//! Application lookup.
//!
//! The registry is owned by the persistence layer; the planner only reads
//! from it during `filter`.

use std::collections::BTreeMap;

use shoal_core::Application;

/// Lookup of applications by id.
pub trait ApplicationRegistry {
    fn get(&self, appid: &str) -> Option<Application>;

    /// Every registered application, ordered by id.
    fn list(&self) -> Vec<Application>;
}

/// Registry backed by an in-memory map, for drivers and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    apps: BTreeMap<String, Application>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an application, returning the previous one.
    pub fn insert(&mut self, app: Application) -> Option<Application> {
        self.apps.insert(app.appid.clone(), app)
    }

    pub fn remove(&mut self, appid: &str) -> Option<Application> {
        self.apps.remove(appid)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl FromIterator<Application> for InMemoryRegistry {
    fn from_iter<I: IntoIterator<Item = Application>>(iter: I) -> Self {
        let mut registry = Self::new();
        for app in iter {
            registry.insert(app);
        }
        registry
    }
}

impl ApplicationRegistry for InMemoryRegistry {
    fn get(&self, appid: &str) -> Option<Application> {
        self.apps.get(appid).cloned()
    }

    fn list(&self) -> Vec<Application> {
        self.apps.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_inserted_application() {
        let mut registry = InMemoryRegistry::new();
        assert!(registry.get("etl").is_none());

        registry.insert(Application::new("etl", "key-1"));
        assert_eq!(registry.get("etl").map(|a| a.owner), Some("key-1".to_string()));
    }

    #[test]
    fn insert_replaces_existing() {
        let mut registry = InMemoryRegistry::new();
        registry.insert(Application::new("etl", "old"));
        let previous = registry.insert(Application::new("etl", "new"));

        assert_eq!(previous.map(|a| a.owner), Some("old".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_is_sorted_by_appid() {
        let registry: InMemoryRegistry = ["zeta", "alpha", "mid"]
            .into_iter()
            .map(|id| Application::new(id, "owner"))
            .collect();
        let ids: Vec<String> = registry.list().into_iter().map(|a| a.appid).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn remove_forgets_application() {
        let mut registry: InMemoryRegistry =
            std::iter::once(Application::new("etl", "o")).collect();
        assert!(registry.remove("etl").is_some());
        assert!(registry.is_empty());
        assert!(registry.get("etl").is_none());
    }
}
