use futures::future::join;
use std::collections::BTreeMap;
use tracing::debug;

use crate::backend::ConsoleBackend;
use crate::error::{FetchError, FetchResult};
use crate::fetcher::Resolution;
use crate::model::{ContainerUsage, EventRecord, QueryResult};

pub const RECENT_EVENT_LIMIT: usize = 20;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PodKey {
    pub cluster: String,
    pub namespace: String,
    pub pod: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DetailTicket {
    generation: u64,
    key: PodKey,
}

impl DetailTicket {
    pub fn key(&self) -> &PodKey {
        &self.key
    }
}

/// One half of the detail view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Slot<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Metrics and recent events for the pod currently inspected.
///
/// Both halves load independently. A result is kept only while the pod it was
/// requested for is still the open one, under the same open generation.
#[derive(Debug, Default)]
pub struct PodDetailAggregator {
    open: Option<PodKey>,
    generation: u64,
    metrics: Slot<Vec<ContainerUsage>>,
    events: Slot<Vec<EventRecord>>,
}

impl PodDetailAggregator {
    pub fn open_pod(&self) -> Option<&PodKey> {
        self.open.as_ref()
    }

    pub fn metrics(&self) -> &Slot<Vec<ContainerUsage>> {
        &self.metrics
    }

    pub fn events(&self) -> &Slot<Vec<EventRecord>> {
        &self.events
    }

    pub fn open(&mut self, key: PodKey) -> DetailTicket {
        self.generation += 1;
        self.open = Some(key.clone());
        self.metrics = Slot::Loading;
        self.events = Slot::Loading;
        DetailTicket {
            generation: self.generation,
            key,
        }
    }

    pub fn close(&mut self) {
        if self.open.is_none() {
            return;
        }
        self.generation += 1;
        self.open = None;
        self.metrics = Slot::Idle;
        self.events = Slot::Idle;
    }

    pub fn is_current(&self, ticket: &DetailTicket) -> bool {
        ticket.generation == self.generation && self.open.as_ref() == Some(&ticket.key)
    }

    pub fn resolve_metrics(
        &mut self,
        ticket: &DetailTicket,
        result: FetchResult<Vec<ContainerUsage>>,
    ) -> Resolution {
        if !self.is_current(ticket) {
            debug!(pod = %ticket.key.pod, "dropping metrics for a closed detail view");
            return Resolution::Stale;
        }
        let (slot, resolution) = settle(result);
        self.metrics = slot;
        resolution
    }

    pub fn resolve_events(
        &mut self,
        ticket: &DetailTicket,
        result: FetchResult<Vec<EventRecord>>,
    ) -> Resolution {
        if !self.is_current(ticket) {
            debug!(pod = %ticket.key.pod, "dropping events for a closed detail view");
            return Resolution::Stale;
        }
        let (slot, resolution) = settle(result.map(most_recent));
        self.events = slot;
        resolution
    }
}

fn settle<T>(result: FetchResult<T>) -> (Slot<T>, Resolution) {
    match result {
        Ok(value) => (Slot::Ready(value), Resolution::Applied),
        Err(error) => (Slot::Failed(error.to_string()), Resolution::Failed),
    }
}

fn most_recent(mut events: Vec<EventRecord>) -> Vec<EventRecord> {
    events.sort_by(|left, right| right.last_timestamp.cmp(&left.last_timestamp));
    events.truncate(RECENT_EVENT_LIMIT);
    events
}

fn pod_selector(key: &PodKey) -> String {
    format!(
        "namespace=\"{}\",pod=\"{}\",container!=\"\",container!=\"POD\"",
        key.namespace, key.pod
    )
}

pub fn cpu_query(key: &PodKey) -> String {
    format!(
        "sum by (container) (rate(container_cpu_usage_seconds_total{{{}}}[5m]))",
        pod_selector(key)
    )
}

pub fn memory_query(key: &PodKey) -> String {
    format!(
        "sum by (container) (container_memory_working_set_bytes{{{}}})",
        pod_selector(key)
    )
}

/// Per-container CPU (cores) and working-set memory (bytes).
pub async fn load_container_usage(
    backend: &dyn ConsoleBackend,
    key: &PodKey,
) -> FetchResult<Vec<ContainerUsage>> {
    let cpu_query = cpu_query(key);
    let memory_query = memory_query(key);
    let (cpu, memory) = join(
        backend.run_query(&key.cluster, &cpu_query, None),
        backend.run_query(&key.cluster, &memory_query, None),
    )
    .await;
    let cpu = accepted(cpu?)?;
    let memory = accepted(memory?)?;

    let mut usage: BTreeMap<String, ContainerUsage> = BTreeMap::new();
    for series in &cpu.series {
        let container = series.label("container").unwrap_or_default().to_string();
        let entry = usage.entry(container.clone()).or_insert_with(|| ContainerUsage {
            container,
            ..ContainerUsage::default()
        });
        entry.cpu_cores = series.latest().and_then(|sample| sample.as_f64());
    }
    for series in &memory.series {
        let container = series.label("container").unwrap_or_default().to_string();
        let entry = usage.entry(container.clone()).or_insert_with(|| ContainerUsage {
            container,
            ..ContainerUsage::default()
        });
        entry.memory_bytes = series.latest().and_then(|sample| sample.as_f64());
    }

    Ok(usage.into_values().collect())
}

pub async fn load_recent_events(
    backend: &dyn ConsoleBackend,
    key: &PodKey,
) -> FetchResult<Vec<EventRecord>> {
    backend
        .list_events(&key.cluster, &key.namespace, Some(&key.pod), None)
        .await
}

fn accepted(result: QueryResult) -> FetchResult<QueryResult> {
    if result.ok {
        Ok(result)
    } else {
        Err(FetchError::Rejected(
            result.error.unwrap_or_else(|| "no reason given".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PodDetailAggregator, PodKey, RECENT_EVENT_LIMIT, Slot, cpu_query, load_container_usage,
        memory_query,
    };
    use crate::error::FetchError;
    use crate::fetcher::Resolution;
    use crate::model::{EventRecord, QueryResult};
    use crate::testutil::FakeBackend;

    fn key(pod: &str) -> PodKey {
        PodKey {
            cluster: "east".to_string(),
            namespace: "payments".to_string(),
            pod: pod.to_string(),
        }
    }

    fn envelope(raw: &str) -> QueryResult {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn halves_resolve_independently() {
        let mut detail = PodDetailAggregator::default();
        let ticket = detail.open(key("api-0"));
        assert!(detail.metrics().is_loading());

        detail.resolve_events(&ticket, Ok(vec![EventRecord::default()]));
        assert!(detail.metrics().is_loading());
        assert_eq!(detail.events().ready().map(Vec::len), Some(1));

        detail.resolve_metrics(&ticket, Err(FetchError::unavailable("metrics")));
        assert_eq!(
            detail.metrics(),
            &Slot::Failed("metrics is not available for this cluster".to_string())
        );
    }

    #[test]
    fn closing_or_switching_pods_discards_late_results() {
        let mut detail = PodDetailAggregator::default();
        let first = detail.open(key("api-0"));
        detail.close();
        assert_eq!(
            detail.resolve_events(&first, Ok(Vec::new())),
            Resolution::Stale
        );
        assert_eq!(detail.events(), &Slot::Idle);

        let reopened = detail.open(key("api-0"));
        let _other = detail.open(key("api-1"));
        assert_eq!(
            detail.resolve_metrics(&reopened, Ok(Vec::new())),
            Resolution::Stale
        );
        assert!(detail.metrics().is_loading());
    }

    #[test]
    fn recent_events_are_newest_first_and_bounded() {
        let mut detail = PodDetailAggregator::default();
        let ticket = detail.open(key("api-0"));
        let events = (0..30)
            .map(|minute| EventRecord {
                reason: Some(format!("r{minute}")),
                last_timestamp: Some(format!("2024-05-01T10:{minute:02}:00Z")),
                ..EventRecord::default()
            })
            .collect();

        detail.resolve_events(&ticket, Ok(events));
        let shown = detail.events().ready().unwrap();
        assert_eq!(shown.len(), RECENT_EVENT_LIMIT);
        assert_eq!(shown[0].reason.as_deref(), Some("r29"));
    }

    #[tokio::test]
    async fn usage_merges_cpu_and_memory_by_container() {
        let backend = FakeBackend::default();
        let pod = key("api-0");
        backend.set_query(
            &cpu_query(&pod),
            Ok(envelope(
                r#"{"ok": true, "result": [
                    {"metric": {"container": "app"}, "value": [1700000000, "0.25"]},
                    {"metric": {"container": "sidecar"}, "value": [1700000000, "0.01"]}
                ]}"#,
            )),
        );
        backend.set_query(
            &memory_query(&pod),
            Ok(envelope(
                r#"{"ok": true, "result": [
                    {"metric": {"container": "app"}, "value": [1700000000, "134217728"]}
                ]}"#,
            )),
        );

        let usage = load_container_usage(&backend, &pod).await.unwrap();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].container, "app");
        assert_eq!(usage[0].cpu_cores, Some(0.25));
        assert_eq!(usage[0].memory_bytes, Some(134217728.0));
        assert_eq!(usage[1].memory_bytes, None);
        assert_eq!(backend.calls_to("query"), 2);
    }

    #[tokio::test]
    async fn rejected_usage_query_fails_the_metrics_half() {
        let backend = FakeBackend::default();
        let pod = key("api-0");
        backend.set_query(&memory_query(&pod), Ok(QueryResult::rejected("no data source")));

        let error = load_container_usage(&backend, &pod).await.unwrap_err();
        assert_eq!(error, FetchError::Rejected("no data source".to_string()));
    }
}
