use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::ConsoleBackend;
use crate::error::FetchResult;

pub type NamespaceOutcome = (String, FetchResult<Vec<String>>);

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct MergeReport {
    pub updated: usize,
    pub failed: usize,
    pub superseded: usize,
}

/// Per-cluster namespace lists.
///
/// Each entry is an immutable list swapped in whole, so a reader holding an
/// `Arc` never sees a half-written collection. Fan-outs are numbered and each
/// cluster remembers the last one that asked for it; an outcome from an older
/// fan-out never overwrites that cluster.
#[derive(Debug, Default)]
pub struct NamespaceCache {
    entries: BTreeMap<String, Arc<[String]>>,
    errors: BTreeMap<String, String>,
    loading: HashSet<String>,
    issued: u64,
    latest: BTreeMap<String, u64>,
}

impl NamespaceCache {
    pub fn namespaces_for(&self, cluster: &str) -> Arc<[String]> {
        self.entries
            .get(cluster)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn contains(&self, cluster: &str) -> bool {
        self.entries.contains_key(cluster)
    }

    pub fn is_loading(&self, cluster: &str) -> bool {
        self.loading.contains(cluster)
    }

    pub fn error_for(&self, cluster: &str) -> Option<&str> {
        self.errors.get(cluster).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks the clusters as loading and returns the generation the fan-out
    /// must hand back to [`NamespaceCache::merge`].
    pub fn begin(&mut self, clusters: &[String]) -> u64 {
        self.issued += 1;
        for cluster in clusters {
            self.loading.insert(cluster.clone());
            self.latest.insert(cluster.clone(), self.issued);
        }
        self.issued
    }

    /// Merges a settled fan-out: successes overwrite their cluster's entry,
    /// failures leave whatever was cached (or nothing) in place.
    pub fn merge(&mut self, generation: u64, outcomes: Vec<NamespaceOutcome>) -> MergeReport {
        let mut report = MergeReport::default();
        for (cluster, result) in outcomes {
            if self.latest.get(&cluster).is_some_and(|latest| *latest > generation) {
                debug!(%cluster, generation, "dropping superseded namespace listing");
                report.superseded += 1;
                continue;
            }
            self.loading.remove(&cluster);
            match result {
                Ok(namespaces) => {
                    self.errors.remove(&cluster);
                    self.entries.insert(cluster, Arc::from(namespaces));
                    report.updated += 1;
                }
                Err(error) => {
                    warn!(%cluster, %error, "namespace listing failed, keeping cached entry");
                    self.errors.insert(cluster, error.to_string());
                    report.failed += 1;
                }
            }
        }
        report
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.errors.clear();
        self.loading.clear();
        self.latest.clear();
    }
}

/// Lists namespaces on every cluster concurrently and waits for all of them,
/// successful or not.
pub async fn fetch_all(
    backend: &dyn ConsoleBackend,
    clusters: Vec<String>,
) -> Vec<NamespaceOutcome> {
    debug!(count = clusters.len(), "namespace fan-out");
    join_all(clusters.into_iter().map(|cluster| async move {
        let result = backend.list_namespaces(&cluster).await;
        (cluster, result)
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::{MergeReport, NamespaceCache, fetch_all};
    use crate::error::FetchError;
    use crate::testutil::FakeBackend;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn partial_failure_keeps_failed_entries_and_updates_the_rest() {
        let mut cache = NamespaceCache::default();
        cache.merge(0, vec![
            ("east".to_string(), Ok(names(&["default", "payments"]))),
            ("west".to_string(), Ok(names(&["default"]))),
        ]);

        let report = cache.merge(0, vec![
            ("east".to_string(), Ok(names(&["default", "payments", "billing"]))),
            (
                "west".to_string(),
                Err(FetchError::Transport("unreachable".to_string())),
            ),
            (
                "north".to_string(),
                Err(FetchError::Transport("unreachable".to_string())),
            ),
        ]);

        assert_eq!(
            report,
            MergeReport {
                updated: 1,
                failed: 2,
                superseded: 0,
            }
        );
        assert_eq!(cache.namespaces_for("east").len(), 3);
        assert_eq!(&*cache.namespaces_for("west"), names(&["default"]).as_slice());
        assert!(!cache.contains("north"));
        assert!(cache.namespaces_for("north").is_empty());
        assert_eq!(
            cache.error_for("west"),
            Some("request failed: unreachable")
        );
    }

    #[test]
    fn readers_keep_their_snapshot_across_overwrites() {
        let mut cache = NamespaceCache::default();
        cache.merge(0, vec![("east".to_string(), Ok(names(&["a", "b"])))]);
        let snapshot = cache.namespaces_for("east");

        cache.merge(0, vec![("east".to_string(), Ok(names(&["c"])))]);
        assert_eq!(&*snapshot, names(&["a", "b"]).as_slice());
        assert_eq!(&*cache.namespaces_for("east"), names(&["c"]).as_slice());
    }

    #[test]
    fn loading_flags_clear_on_merge() {
        let mut cache = NamespaceCache::default();
        let generation = cache.begin(&names(&["east", "west"]));
        assert!(cache.is_loading("east"));

        cache.merge(generation, vec![("east".to_string(), Ok(names(&["default"])))]);
        assert!(!cache.is_loading("east"));
        assert!(cache.is_loading("west"));
    }

    #[test]
    fn older_fan_out_cannot_overwrite_a_newer_listing() {
        let mut cache = NamespaceCache::default();
        let everything = cache.begin(&names(&["east", "west"]));
        let east_only = cache.begin(&names(&["east"]));

        cache.merge(east_only, vec![("east".to_string(), Ok(names(&["new"])))]);
        assert!(!cache.is_loading("east"));
        assert!(cache.is_loading("west"));

        let report = cache.merge(
            everything,
            vec![
                ("east".to_string(), Ok(names(&["old"]))),
                ("west".to_string(), Ok(names(&["default"]))),
            ],
        );
        assert_eq!(report.superseded, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(&*cache.namespaces_for("east"), names(&["new"]).as_slice());
        assert_eq!(&*cache.namespaces_for("west"), names(&["default"]).as_slice());
        assert!(!cache.is_loading("west"));
    }

    #[tokio::test]
    async fn fan_out_settles_every_cluster() {
        let backend = FakeBackend::default();
        backend.set_namespaces("east", Ok(names(&["default"])));
        backend.set_namespaces("west", Err(FetchError::Transport("refused".to_string())));
        backend.set_namespaces("south", Ok(names(&["kube-system", "payments"])));

        let outcomes = fetch_all(&backend, names(&["east", "west", "south"])).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].1.is_ok());
        assert!(outcomes[1].1.is_err());
        assert_eq!(outcomes[2].1.as_ref().unwrap().len(), 2);
    }
}
