use chrono::{DateTime, Local};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::FetchResult;
use crate::model::ClusterDescriptor;

/// Reachable clusters and their capability flags.
///
/// Refreshed only when a session becomes active or on explicit request.
/// Every refresh is numbered; only the most recently issued one may land.
#[derive(Debug, Default)]
pub struct ClusterRegistry {
    clusters: Vec<ClusterDescriptor>,
    issued: u64,
    loading: bool,
    error: Option<String>,
    last_refreshed: Option<DateTime<Local>>,
}

impl ClusterRegistry {
    pub fn list_clusters(&self) -> &[ClusterDescriptor] {
        &self.clusters
    }

    pub fn get(&self, name: &str) -> Option<&ClusterDescriptor> {
        self.clusters.iter().find(|cluster| cluster.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.clusters
            .iter()
            .map(|cluster| cluster.name.clone())
            .collect()
    }

    pub fn metrics_available(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|cluster| cluster.metrics_available)
    }

    pub fn logs_available(&self, name: &str) -> bool {
        self.get(name).is_some_and(|cluster| cluster.logs_available)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed
    }

    pub fn begin_refresh(&mut self) -> u64 {
        self.issued += 1;
        self.loading = true;
        self.issued
    }

    /// Replaces the cluster set wholesale; a failed refresh keeps the old set.
    /// Returns true only when a successful, current refresh was applied.
    pub fn apply(&mut self, generation: u64, result: FetchResult<Vec<ClusterDescriptor>>) -> bool {
        if generation < self.issued {
            debug!(generation, current = self.issued, "dropping superseded cluster list");
            return false;
        }
        self.loading = false;
        match result {
            Ok(clusters) => {
                let mut seen = HashSet::new();
                self.clusters = clusters
                    .into_iter()
                    .filter(|cluster| seen.insert(cluster.name.clone()))
                    .collect();
                self.error = None;
                self.last_refreshed = Some(Local::now());
                info!(count = self.clusters.len(), "cluster registry refreshed");
                true
            }
            Err(error) => {
                warn!(%error, "cluster registry refresh failed");
                self.error = Some(error.to_string());
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.clusters.clear();
        self.loading = false;
        self.error = None;
        self.last_refreshed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::ClusterRegistry;
    use crate::error::FetchError;
    use crate::testutil::cluster;

    #[test]
    fn refresh_replaces_and_dedupes_by_name() {
        let mut registry = ClusterRegistry::default();
        let generation = registry.begin_refresh();
        assert!(registry.loading());

        let applied = registry.apply(generation, Ok(vec![
            cluster("east", true),
            cluster("west", false),
            cluster("east", false),
        ]));
        assert!(applied);
        assert!(!registry.loading());
        assert_eq!(registry.names(), vec!["east", "west"]);
        assert!(registry.metrics_available("east"));
        assert!(!registry.metrics_available("west"));
        assert!(!registry.metrics_available("north"));
        assert!(registry.last_refreshed().is_some());
    }

    #[test]
    fn failed_refresh_keeps_previous_clusters() {
        let mut registry = ClusterRegistry::default();
        registry.apply(0, Ok(vec![cluster("east", true)]));

        let applied = registry.apply(0, Err(FetchError::Transport("timeout".to_string())));
        assert!(!applied);
        assert_eq!(registry.names(), vec!["east"]);
        assert_eq!(registry.error(), Some("request failed: timeout"));
    }

    #[test]
    fn clear_empties_registry() {
        let mut registry = ClusterRegistry::default();
        registry.apply(0, Ok(vec![cluster("east", true)]));
        registry.clear();
        assert!(registry.list_clusters().is_empty());
        assert!(!registry.contains("east"));
    }

    #[test]
    fn older_refresh_landing_late_is_ignored() {
        let mut registry = ClusterRegistry::default();
        let first = registry.begin_refresh();
        let second = registry.begin_refresh();

        assert!(registry.apply(second, Ok(vec![cluster("east", true), cluster("new", true)])));
        assert!(!registry.apply(first, Ok(vec![cluster("east", true), cluster("old", true)])));
        assert_eq!(registry.names(), vec!["east", "new"]);

        assert!(!registry.apply(first, Err(FetchError::Transport("late".to_string()))));
        assert_eq!(registry.error(), None);
        assert!(!registry.loading());
    }
}
