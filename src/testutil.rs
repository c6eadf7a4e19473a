use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::backend::ConsoleBackend;
use crate::error::FetchResult;
use crate::model::{
    AlarmRecord, ClusterDescriptor, ContainerStatus, EventRecord, EventTypeFilter, MonitorSnapshot,
    NamespaceSummary, PodRecord, QueryResult, RunState, SessionState, TriggerAck,
};

pub fn cluster(name: &str, metrics_available: bool) -> ClusterDescriptor {
    ClusterDescriptor {
        name: name.to_string(),
        api_endpoint: format!("https://api.{name}.example:6443"),
        insecure_tls: false,
        metrics_available,
        logs_available: false,
        metrics_endpoint: String::new(),
        logs_endpoint: String::new(),
    }
}

pub fn pod(name: &str, namespace: &str) -> PodRecord {
    PodRecord {
        name: name.to_string(),
        namespace: namespace.to_string(),
        phase: "Running".to_string(),
        containers: vec![ContainerStatus {
            name: "app".to_string(),
            image: "registry.example/app:1".to_string(),
            ready: true,
            restart_count: 0,
        }],
        ..PodRecord::default()
    }
}

pub fn active_session() -> SessionState {
    SessionState {
        logged_in: true,
        has_backend_url: true,
    }
}

#[derive(Default)]
struct Script {
    session: Option<FetchResult<SessionState>>,
    clusters: Option<FetchResult<Vec<ClusterDescriptor>>>,
    namespaces: HashMap<String, FetchResult<Vec<String>>>,
    pods: HashMap<String, FetchResult<Vec<PodRecord>>>,
    events: HashMap<String, FetchResult<Vec<EventRecord>>>,
    queries: HashMap<String, FetchResult<QueryResult>>,
    alerts: HashMap<String, FetchResult<QueryResult>>,
    summaries: HashMap<String, FetchResult<NamespaceSummary>>,
    trigger: Option<FetchResult<TriggerAck>>,
    runs: VecDeque<FetchResult<RunState>>,
    run_default: Option<FetchResult<RunState>>,
    snapshots: HashMap<String, FetchResult<Vec<MonitorSnapshot>>>,
    alarms: Option<FetchResult<Vec<AlarmRecord>>>,
    last_events_filter: Option<(Option<String>, Option<EventTypeFilter>)>,
}

/// Scripted in-memory backend.
///
/// Unscripted calls succeed with empty data. A call whose key is held with
/// [`FakeBackend::hold`] blocks until [`FakeBackend::release`].
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeBackend {
    pub fn set_session(&self, result: FetchResult<SessionState>) {
        self.script.lock().unwrap().session = Some(result);
    }

    pub fn set_clusters(&self, result: FetchResult<Vec<ClusterDescriptor>>) {
        self.script.lock().unwrap().clusters = Some(result);
    }

    pub fn set_namespaces(&self, cluster: &str, result: FetchResult<Vec<String>>) {
        self.script
            .lock()
            .unwrap()
            .namespaces
            .insert(cluster.to_string(), result);
    }

    pub fn set_pods(&self, cluster: &str, namespace: &str, result: FetchResult<Vec<PodRecord>>) {
        self.script
            .lock()
            .unwrap()
            .pods
            .insert(format!("{cluster}/{namespace}"), result);
    }

    pub fn set_events(
        &self,
        cluster: &str,
        namespace: &str,
        result: FetchResult<Vec<EventRecord>>,
    ) {
        self.script
            .lock()
            .unwrap()
            .events
            .insert(format!("{cluster}/{namespace}"), result);
    }

    pub fn set_query(&self, query: &str, result: FetchResult<QueryResult>) {
        self.script
            .lock()
            .unwrap()
            .queries
            .insert(query.to_string(), result);
    }

    pub fn set_alerts(&self, cluster: &str, result: FetchResult<QueryResult>) {
        self.script
            .lock()
            .unwrap()
            .alerts
            .insert(cluster.to_string(), result);
    }

    pub fn set_summary(
        &self,
        cluster: &str,
        namespace: &str,
        result: FetchResult<NamespaceSummary>,
    ) {
        self.script
            .lock()
            .unwrap()
            .summaries
            .insert(format!("{cluster}/{namespace}"), result);
    }

    pub fn set_trigger(&self, result: FetchResult<TriggerAck>) {
        self.script.lock().unwrap().trigger = Some(result);
    }

    /// Queues run reports returned in order; afterwards the default applies.
    pub fn push_run(&self, result: FetchResult<RunState>) {
        self.script.lock().unwrap().runs.push_back(result);
    }

    pub fn set_run_default(&self, result: FetchResult<RunState>) {
        self.script.lock().unwrap().run_default = Some(result);
    }

    /// Snapshots for a filter key: `cluster:<name>`, `namespace:<name>` or `all`.
    pub fn set_snapshots(&self, filter: &str, result: FetchResult<Vec<MonitorSnapshot>>) {
        self.script
            .lock()
            .unwrap()
            .snapshots
            .insert(filter.to_string(), result);
    }

    pub fn set_alarms(&self, result: FetchResult<Vec<AlarmRecord>>) {
        self.script.lock().unwrap().alarms = Some(result);
    }

    pub fn last_events_filter(&self) -> Option<(Option<String>, Option<EventTypeFilter>)> {
        self.script.lock().unwrap().last_events_filter.clone()
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or_default()
    }

    pub fn hold(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(key) {
            gate.add_permits(1);
        }
    }

    async fn enter(&self, name: &'static str, key: String) {
        *self.calls.lock().unwrap().entry(name).or_default() += 1;
        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
    }
}

#[async_trait]
impl ConsoleBackend for FakeBackend {
    async fn session_status(&self) -> FetchResult<SessionState> {
        self.enter("session", "session".to_string()).await;
        self.script
            .lock()
            .unwrap()
            .session
            .clone()
            .unwrap_or_else(|| Ok(SessionState::default()))
    }

    async fn list_clusters(&self) -> FetchResult<Vec<ClusterDescriptor>> {
        self.enter("clusters", "clusters".to_string()).await;
        self.script
            .lock()
            .unwrap()
            .clusters
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_namespaces(&self, cluster: &str) -> FetchResult<Vec<String>> {
        self.enter("namespaces", format!("namespaces:{cluster}")).await;
        self.script
            .lock()
            .unwrap()
            .namespaces
            .get(cluster)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_pods(&self, cluster: &str, namespace: &str) -> FetchResult<Vec<PodRecord>> {
        let key = format!("{cluster}/{namespace}");
        self.enter("pods", format!("pods:{key}")).await;
        self.script
            .lock()
            .unwrap()
            .pods
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_events(
        &self,
        cluster: &str,
        namespace: &str,
        pod: Option<&str>,
        event_type: Option<EventTypeFilter>,
    ) -> FetchResult<Vec<EventRecord>> {
        let key = format!("{cluster}/{namespace}");
        self.enter("events", format!("events:{key}")).await;
        let mut script = self.script.lock().unwrap();
        script.last_events_filter = Some((pod.map(str::to_string), event_type));
        script
            .events
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn run_query(
        &self,
        _cluster: &str,
        query: &str,
        _time: Option<&str>,
    ) -> FetchResult<QueryResult> {
        self.enter("query", format!("query:{query}")).await;
        self.script
            .lock()
            .unwrap()
            .queries
            .get(query)
            .cloned()
            .unwrap_or_else(|| {
                Ok(QueryResult {
                    ok: true,
                    ..QueryResult::default()
                })
            })
    }

    async fn list_alerts(&self, cluster: &str) -> FetchResult<QueryResult> {
        self.enter("alerts", format!("alerts:{cluster}")).await;
        self.script
            .lock()
            .unwrap()
            .alerts
            .get(cluster)
            .cloned()
            .unwrap_or_else(|| {
                Ok(QueryResult {
                    ok: true,
                    ..QueryResult::default()
                })
            })
    }

    async fn namespace_summary(
        &self,
        cluster: &str,
        namespace: &str,
    ) -> FetchResult<NamespaceSummary> {
        let key = format!("{cluster}/{namespace}");
        self.enter("summary", format!("summary:{key}")).await;
        self.script
            .lock()
            .unwrap()
            .summaries
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(NamespaceSummary::default()))
    }

    async fn trigger_run(&self, _config: Option<&str>) -> FetchResult<TriggerAck> {
        self.enter("trigger", "trigger".to_string()).await;
        self.script
            .lock()
            .unwrap()
            .trigger
            .clone()
            .unwrap_or_else(|| {
                Ok(TriggerAck {
                    ok: true,
                    message: "run started".to_string(),
                })
            })
    }

    async fn last_run(&self) -> FetchResult<RunState> {
        self.enter("last_run", "last_run".to_string()).await;
        let mut script = self.script.lock().unwrap();
        match script.runs.pop_front() {
            Some(result) => result,
            None => script
                .run_default
                .clone()
                .unwrap_or_else(|| Ok(RunState::default())),
        }
    }

    async fn monitor_snapshots(
        &self,
        cluster: Option<&str>,
        namespace: Option<&str>,
    ) -> FetchResult<Vec<MonitorSnapshot>> {
        let filter = match (cluster, namespace) {
            (Some(cluster), _) => format!("cluster:{cluster}"),
            (None, Some(namespace)) => format!("namespace:{namespace}"),
            (None, None) => "all".to_string(),
        };
        self.enter("snapshots", format!("snapshots:{filter}")).await;
        self.script
            .lock()
            .unwrap()
            .snapshots
            .get(&filter)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn recent_alarms(&self, _limit: u32) -> FetchResult<Vec<AlarmRecord>> {
        self.enter("alarms", "alarms".to_string()).await;
        self.script
            .lock()
            .unwrap()
            .alarms
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
