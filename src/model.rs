use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum ConsoleTab {
    #[default]
    Pods,
    Events,
    Alerts,
    Query,
    Summary,
    Monitor,
    Alarms,
}

impl ConsoleTab {
    pub const ALL: [Self; 7] = [
        Self::Pods,
        Self::Events,
        Self::Alerts,
        Self::Query,
        Self::Summary,
        Self::Monitor,
        Self::Alarms,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Pods => "Pods",
            Self::Events => "Events",
            Self::Alerts => "Alerts",
            Self::Query => "PromQL",
            Self::Summary => "Summary",
            Self::Monitor => "Monitor",
            Self::Alarms => "Alarms",
        }
    }

    /// Whether the view reads from the observe service, which needs a session.
    pub fn needs_session(self) -> bool {
        !matches!(self, Self::Monitor | Self::Alarms)
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "po" | "pod" | "pods" => Some(Self::Pods),
            "ev" | "event" | "events" => Some(Self::Events),
            "al" | "alert" | "alerts" => Some(Self::Alerts),
            "q" | "query" | "promql" | "metrics" => Some(Self::Query),
            "sum" | "summary" | "overview" => Some(Self::Summary),
            "mon" | "monitor" | "snapshots" => Some(Self::Monitor),
            "alarm" | "alarms" | "dashboard" => Some(Self::Alarms),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|tab| *tab == self)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EventTypeFilter {
    Warning,
    Normal,
}

impl EventTypeFilter {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Normal => "Normal",
        }
    }

    /// Cycles `None -> Warning -> Normal -> None`.
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::Warning),
            Some(Self::Warning) => Some(Self::Normal),
            Some(Self::Normal) => None,
        }
    }
}

impl Display for EventTypeFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_query_value())
    }
}

/// Which selection field narrows the monitor snapshots.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum MonitorFilter {
    #[default]
    Cluster,
    Namespace,
}

impl MonitorFilter {
    pub fn toggled(self) -> Self {
        match self {
            Self::Cluster => Self::Namespace,
            Self::Namespace => Self::Cluster,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Namespace => "namespace",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub has_backend_url: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct ClusterDescriptor {
    pub name: String,
    #[serde(rename = "ocp_api", default)]
    pub api_endpoint: String,
    #[serde(rename = "insecure", default)]
    pub insecure_tls: bool,
    #[serde(rename = "prometheus_available", default)]
    pub metrics_available: bool,
    #[serde(rename = "loki_available", default)]
    pub logs_available: bool,
    #[serde(rename = "prometheus_url", default)]
    pub metrics_endpoint: String,
    #[serde(rename = "loki_url", default)]
    pub logs_endpoint: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(rename = "restarts", default)]
    pub restart_count: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct PodRecord {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub containers: Vec<ContainerStatus>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl PodRecord {
    pub fn ready_count(&self) -> usize {
        self.containers
            .iter()
            .filter(|container| container.ready)
            .count()
    }

    pub fn total_restarts(&self) -> u32 {
        self.containers
            .iter()
            .map(|container| container.restart_count)
            .sum()
    }

    pub fn ready_label(&self) -> String {
        format!("{}/{}", self.ready_count(), self.containers.len())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(rename = "first_time", default)]
    pub first_timestamp: Option<String>,
    #[serde(rename = "last_time", default)]
    pub last_timestamp: Option<String>,
    #[serde(rename = "object", default)]
    pub involved_object: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl EventRecord {
    pub fn is_warning(&self) -> bool {
        self.event_type.as_deref() == Some("Warning")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub timestamp: f64,
    pub value: String,
}

impl MetricSample {
    pub fn as_f64(&self) -> Option<f64> {
        self.value.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySeries {
    pub label_set: BTreeMap<String, String>,
    pub samples: Vec<MetricSample>,
}

impl QuerySeries {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.label_set.get(key).map(String::as_str)
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.last()
    }

    pub fn selector(&self) -> String {
        let labels = self
            .label_set
            .iter()
            .map(|(key, value)| format!("{key}=\"{value}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{labels}}}")
    }
}

/// Result envelope shared by the metrics query and alerts endpoints.
///
/// A semantic failure (for example a malformed query) arrives as
/// `ok == false` with an `error` message and is a regular value, not an `Err`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawQueryResult")]
pub struct QueryResult {
    pub ok: bool,
    pub error: Option<String>,
    pub series: Vec<QuerySeries>,
}

impl QueryResult {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            series: Vec::new(),
        }
    }

    pub fn filter_by_namespace(&self, namespace: &str) -> Vec<&QuerySeries> {
        self.series
            .iter()
            .filter(|series| series.label("namespace") == Some(namespace))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawQueryResult {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    result: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    value: Option<(f64, String)>,
    #[serde(default)]
    values: Option<Vec<(f64, String)>>,
}

impl From<RawQueryResult> for QueryResult {
    fn from(raw: RawQueryResult) -> Self {
        let series = raw
            .result
            .into_iter()
            .map(|entry| {
                let points = match (entry.values, entry.value) {
                    (Some(values), _) => values,
                    (None, Some(value)) => vec![value],
                    (None, None) => Vec::new(),
                };
                QuerySeries {
                    label_set: entry.metric,
                    samples: points
                        .into_iter()
                        .map(|(timestamp, value)| MetricSample { timestamp, value })
                        .collect(),
                }
            })
            .collect();

        Self {
            ok: raw.ok,
            error: raw.error,
            series,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    NeverRun,
    Running,
    Done,
    Timeout,
    Error,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::NeverRun => "never run",
            Self::Running => "running",
            Self::Done => "done",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub config: Option<String>,
    #[serde(default)]
    pub started_at: Option<f64>,
}

impl RunState {
    pub fn running() -> Self {
        Self {
            status: RunStatus::Running,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn exit_label(&self) -> Option<&'static str> {
        self.exit_code.and_then(exit_code_label)
    }
}

pub fn exit_code_label(code: i32) -> Option<&'static str> {
    match code {
        0 => Some("OK"),
        1 => Some("PROBLEM"),
        2 => Some("NOTIFY FAILED"),
        3 => Some("LOCKED"),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerAck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
pub struct NamespaceSummary {
    #[serde(default)]
    pub running: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub total_restarts: u32,
    #[serde(default)]
    pub warning_event_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerUsage {
    pub container: String,
    pub cpu_cores: Option<f64>,
    pub memory_bytes: Option<f64>,
}

/// Outcome the check runner recorded for a namespace or an alarm.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Ok,
    Problem,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CheckStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Problem => "PROBLEM",
            Self::Error => "ERROR",
            Self::Unknown => "?",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct SnapshotPod {
    #[serde(rename = "pod")]
    pub name: String,
    #[serde(default)]
    pub ready_str: String,
    #[serde(default)]
    pub restarts: u32,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub waiting: Option<String>,
    #[serde(default)]
    pub terminated: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub workload: Option<String>,
}

impl SnapshotPod {
    /// `"2/3"` style readiness; anything unparsable counts as not ready.
    pub fn fully_ready(&self) -> bool {
        match self.ready_str.split_once('/') {
            Some((ready, total)) => ready.trim() == total.trim() && !ready.trim().is_empty(),
            None => false,
        }
    }

    pub fn reason(&self) -> Option<String> {
        let parts = [self.waiting.as_deref(), self.terminated.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

/// Pod health for one namespace on one cluster, as last recorded by the
/// check runner.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize)]
pub struct MonitorSnapshot {
    pub namespace: String,
    pub cluster: String,
    #[serde(default)]
    pub status: CheckStatus,
    #[serde(default)]
    pub timestamp_utc: String,
    #[serde(default)]
    pub pods: Vec<SnapshotPod>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AlarmRecord {
    pub alarm_name: String,
    #[serde(default)]
    pub status: CheckStatus,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp_utc: String,
    #[serde(default)]
    pub dedup_key: String,
    #[serde(default)]
    pub evidence: BTreeMap<String, serde_json::Value>,
}

impl AlarmRecord {
    pub fn evidence_text(&self, key: &str) -> Option<String> {
        match self.evidence.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(value) => Some(value.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct StatusCounts {
    pub ok: usize,
    pub problem: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = CheckStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                CheckStatus::Ok => counts.ok += 1,
                CheckStatus::Problem => counts.problem += 1,
                CheckStatus::Error => counts.error += 1,
                CheckStatus::Unknown => {}
            }
        }
        counts
    }
}

/// What the operator currently wants to see.
///
/// Values are never edited in place by consumers; every change produces a new
/// `Selection` that is broadcast to subscribers.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Selection {
    pub cluster: Option<String>,
    pub namespace: Option<String>,
    pub tab: ConsoleTab,
    pub pod_for_events: Option<String>,
    pub pod_for_detail: Option<String>,
    pub event_type: Option<EventTypeFilter>,
    pub alert_namespace: Option<String>,
    pub monitor_filter: MonitorFilter,
}

impl Selection {
    pub fn with_cluster(&self, cluster: Option<String>) -> Self {
        let cluster = cluster.filter(|name| !name.trim().is_empty());
        if cluster == self.cluster {
            return self.clone();
        }
        Self {
            cluster,
            namespace: None,
            tab: self.tab,
            pod_for_events: None,
            pod_for_detail: None,
            event_type: self.event_type,
            alert_namespace: None,
            monitor_filter: self.monitor_filter,
        }
    }

    pub fn with_namespace(&self, namespace: Option<String>) -> Self {
        let namespace = namespace.filter(|name| !name.trim().is_empty());
        if namespace == self.namespace {
            return self.clone();
        }
        Self {
            namespace,
            pod_for_events: None,
            pod_for_detail: None,
            ..self.clone()
        }
    }

    pub fn with_tab(&self, tab: ConsoleTab) -> Self {
        Self {
            tab,
            ..self.clone()
        }
    }

    pub fn with_event_pod(&self, pod: Option<String>) -> Self {
        Self {
            pod_for_events: pod.filter(|name| !name.trim().is_empty()),
            ..self.clone()
        }
    }

    pub fn with_detail_pod(&self, pod: Option<String>) -> Self {
        Self {
            pod_for_detail: pod,
            ..self.clone()
        }
    }

    pub fn with_event_type(&self, event_type: Option<EventTypeFilter>) -> Self {
        Self {
            event_type,
            ..self.clone()
        }
    }

    pub fn with_alert_namespace(&self, namespace: Option<String>) -> Self {
        Self {
            alert_namespace: namespace.filter(|name| !name.trim().is_empty()),
            ..self.clone()
        }
    }

    pub fn with_monitor_filter(&self, monitor_filter: MonitorFilter) -> Self {
        Self {
            monitor_filter,
            ..self.clone()
        }
    }

    pub fn cleared(&self) -> Self {
        Self {
            tab: self.tab,
            monitor_filter: self.monitor_filter,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AlarmRecord, CheckStatus, ConsoleTab, EventTypeFilter, MonitorSnapshot, QueryResult,
        RunState, RunStatus, Selection, StatusCounts, exit_code_label,
    };

    #[test]
    fn tab_aliases_map_to_expected_tabs() {
        assert_eq!(ConsoleTab::from_token("po"), Some(ConsoleTab::Pods));
        assert_eq!(ConsoleTab::from_token("EVENTS"), Some(ConsoleTab::Events));
        assert_eq!(ConsoleTab::from_token("promql"), Some(ConsoleTab::Query));
        assert_eq!(ConsoleTab::from_token("overview"), Some(ConsoleTab::Summary));
        assert_eq!(ConsoleTab::from_token("nodes"), None);
        assert_eq!(ConsoleTab::Alerts.index(), 2);
    }

    #[test]
    fn instant_and_range_vectors_decode_into_series() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"metric": {"namespace": "payments", "alertname": "PodCrashLooping"}, "value": [1700000000.5, "1"]},
                {"metric": {"namespace": "billing"}, "values": [[1700000000, "0.5"], [1700000030, "0.75"]]}
            ]
        }"#;
        let parsed: QueryResult = serde_json::from_str(raw).unwrap();

        assert!(parsed.ok);
        assert_eq!(parsed.series.len(), 2);
        assert_eq!(parsed.series[0].samples.len(), 1);
        assert_eq!(parsed.series[0].latest().unwrap().as_f64(), Some(1.0));
        assert_eq!(parsed.series[1].samples.len(), 2);
        assert_eq!(parsed.series[1].latest().unwrap().value, "0.75");
        assert_eq!(
            parsed.series[0].selector(),
            r#"{alertname="PodCrashLooping", namespace="payments"}"#
        );
        assert_eq!(parsed.filter_by_namespace("billing").len(), 1);
    }

    #[test]
    fn rejected_query_envelope_decodes_without_result() {
        let raw = r#"{"ok": false, "error": "parse error at char 5"}"#;
        let parsed: QueryResult = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error.as_deref(), Some("parse error at char 5"));
        assert!(parsed.series.is_empty());
    }

    #[test]
    fn run_state_decodes_known_and_unknown_statuses() {
        let done: RunState = serde_json::from_str(
            r#"{"status": "done", "exit_code": 1, "stdout": "ok", "duration_sec": 4.2}"#,
        )
        .unwrap();
        assert_eq!(done.status, RunStatus::Done);
        assert_eq!(done.exit_label(), Some("PROBLEM"));

        let never: RunState = serde_json::from_str(r#"{"status": "never_run"}"#).unwrap();
        assert_eq!(never.status, RunStatus::NeverRun);

        let odd: RunState = serde_json::from_str(r#"{"status": "queued"}"#).unwrap();
        assert_eq!(odd.status, RunStatus::Unknown);
        assert!(!odd.is_running());
        assert_eq!(exit_code_label(42), None);
    }

    #[test]
    fn changing_cluster_resets_namespace_scoped_fields() {
        let selection = Selection::default()
            .with_cluster(Some("east".to_string()))
            .with_namespace(Some("payments".to_string()))
            .with_event_pod(Some("api-0".to_string()))
            .with_event_type(Some(EventTypeFilter::Warning));

        let moved = selection.with_cluster(Some("west".to_string()));
        assert_eq!(moved.cluster.as_deref(), Some("west"));
        assert_eq!(moved.namespace, None);
        assert_eq!(moved.pod_for_events, None);
        assert_eq!(moved.event_type, Some(EventTypeFilter::Warning));

        let same = selection.with_cluster(Some("east".to_string()));
        assert_eq!(same, selection);
    }

    #[test]
    fn event_type_filter_cycles_through_none() {
        let first = EventTypeFilter::cycle(None);
        let second = EventTypeFilter::cycle(first);
        assert_eq!(first, Some(EventTypeFilter::Warning));
        assert_eq!(second, Some(EventTypeFilter::Normal));
        assert_eq!(EventTypeFilter::cycle(second), None);
    }

    #[test]
    fn monitor_snapshot_decodes_pod_rows() {
        let raw = r#"[{
            "namespace": "payments",
            "cluster": "east",
            "status": "PROBLEM",
            "timestamp_utc": "2026-10-19T08:00:00Z",
            "pods": [
                {"pod": "api-0", "ready_str": "1/2", "restarts": 4, "phase": "Running",
                 "waiting": "CrashLoopBackOff", "workload": "api"},
                {"pod": "api-1", "ready_str": "2/2", "restarts": 0, "phase": "Running"}
            ]
        }]"#;
        let parsed: Vec<MonitorSnapshot> = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed[0].status, CheckStatus::Problem);
        assert_eq!(parsed[0].pods[0].name, "api-0");
        assert!(!parsed[0].pods[0].fully_ready());
        assert_eq!(parsed[0].pods[0].reason().as_deref(), Some("CrashLoopBackOff"));
        assert!(parsed[0].pods[1].fully_ready());
        assert_eq!(parsed[0].pods[1].reason(), None);
    }

    #[test]
    fn alarm_statuses_tally_and_evidence_reads_as_text() {
        let raw = r#"[
            {"alarm_name": "a", "status": "PROBLEM", "evidence": {"cluster": "east", "count": 3}},
            {"alarm_name": "b", "status": "OK"},
            {"alarm_name": "c", "status": "ERROR", "evidence": {"namespace": null}},
            {"alarm_name": "d", "status": "SKIPPED"}
        ]"#;
        let alarms: Vec<AlarmRecord> = serde_json::from_str(raw).unwrap();

        assert_eq!(alarms[3].status, CheckStatus::Unknown);
        assert_eq!(alarms[0].evidence_text("cluster").as_deref(), Some("east"));
        assert_eq!(alarms[0].evidence_text("count").as_deref(), Some("3"));
        assert_eq!(alarms[2].evidence_text("namespace"), None);
        assert_eq!(
            StatusCounts::tally(alarms.iter().map(|alarm| alarm.status)),
            StatusCounts {
                ok: 1,
                problem: 1,
                error: 1
            }
        );
    }
}
