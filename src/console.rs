use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::backend::ConsoleBackend;
use crate::detail::{self, DetailTicket, PodDetailAggregator, PodKey};
use crate::error::{FetchError, FetchResult};
use crate::fetcher::{
    AlarmsParams, AlertsParams, EventsParams, FetchPlan, FetchTicket, MonitorParams, PodsParams,
    QueryParams, SummaryParams, TabFetcher, filter_alerts,
};
use crate::model::{
    AlarmRecord, ClusterDescriptor, ConsoleTab, ContainerUsage, EventRecord, EventTypeFilter,
    MonitorSnapshot, NamespaceSummary, PodRecord, QueryResult, QuerySeries, RunState, Selection,
    SessionState, StatusCounts, TriggerAck,
};
use crate::namespaces::{self, NamespaceCache, NamespaceOutcome};
use crate::registry::ClusterRegistry;
use crate::run_poller::RunPoller;
use crate::session::{SessionMonitor, SessionTransition};

/// Completion of a spawned backend call, applied by [`Console::apply`].
#[derive(Debug)]
pub enum ConsoleEvent {
    Session(FetchResult<SessionState>),
    Clusters {
        epoch: u64,
        generation: u64,
        result: FetchResult<Vec<ClusterDescriptor>>,
    },
    Namespaces {
        epoch: u64,
        generation: u64,
        outcomes: Vec<NamespaceOutcome>,
    },
    Pods(FetchTicket<PodsParams>, FetchResult<Vec<PodRecord>>),
    Events(FetchTicket<EventsParams>, FetchResult<Vec<EventRecord>>),
    Alerts(FetchTicket<AlertsParams>, FetchResult<QueryResult>),
    Query(FetchTicket<QueryParams>, FetchResult<QueryResult>),
    Summary(FetchTicket<SummaryParams>, FetchResult<NamespaceSummary>),
    Monitor(FetchTicket<MonitorParams>, FetchResult<Vec<MonitorSnapshot>>),
    Alarms(FetchTicket<AlarmsParams>, FetchResult<Vec<AlarmRecord>>),
    DetailMetrics(DetailTicket, FetchResult<Vec<ContainerUsage>>),
    DetailEvents(DetailTicket, FetchResult<Vec<EventRecord>>),
    RunTriggered(FetchResult<TriggerAck>),
    RunPolled {
        cycle: u64,
        tick: u32,
        result: FetchResult<RunState>,
    },
    RunPollFinished {
        cycle: u64,
        ticks: u32,
    },
    RunChecked(FetchResult<RunState>),
}

#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    pub session_interval: Duration,
    pub run_poll_interval: Duration,
    pub run_poll_max_ticks: u32,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            session_interval: Duration::from_secs(5),
            run_poll_interval: Duration::from_secs(2),
            run_poll_max_ticks: 30,
        }
    }
}

/// Owner of every piece of console state.
///
/// Backend calls run on spawned tasks and come back as [`ConsoleEvent`]s on a
/// single channel; `apply` folds them in one at a time, so nothing here is
/// ever touched concurrently.
pub struct Console {
    backend: Arc<dyn ConsoleBackend>,
    tx: UnboundedSender<ConsoleEvent>,
    selection: watch::Sender<Selection>,
    session: SessionMonitor,
    registry: ClusterRegistry,
    namespaces: NamespaceCache,
    pods: TabFetcher<PodsParams, Vec<PodRecord>>,
    events: TabFetcher<EventsParams, Vec<EventRecord>>,
    alerts: TabFetcher<AlertsParams, QueryResult>,
    query: TabFetcher<QueryParams, QueryResult>,
    summary: TabFetcher<SummaryParams, NamespaceSummary>,
    monitor: TabFetcher<MonitorParams, Vec<MonitorSnapshot>>,
    alarms: TabFetcher<AlarmsParams, Vec<AlarmRecord>>,
    detail: PodDetailAggregator,
    run: RunPoller,
    notice: Option<String>,
}

impl Console {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        settings: ConsoleSettings,
    ) -> (Self, UnboundedReceiver<ConsoleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (selection, _) = watch::channel(Selection::default());
        let console = Self {
            backend,
            tx,
            selection,
            session: SessionMonitor::new(settings.session_interval),
            registry: ClusterRegistry::default(),
            namespaces: NamespaceCache::default(),
            pods: TabFetcher::new("pods"),
            events: TabFetcher::new("events"),
            alerts: TabFetcher::new("alerts"),
            query: TabFetcher::new("query"),
            summary: TabFetcher::new("summary"),
            monitor: TabFetcher::new("monitor"),
            alarms: TabFetcher::new("alarms"),
            detail: PodDetailAggregator::default(),
            run: RunPoller::new(settings.run_poll_interval, settings.run_poll_max_ticks),
            notice: Some("waiting for session".to_string()),
        };
        (console, rx)
    }

    /// Starts the session tick and looks up the last run once, so a run
    /// started elsewhere is followed from the first frame.
    pub fn start(&mut self) {
        self.session.start(self.backend.clone(), self.tx.clone());
        self.poll_run_once();
        self.sync_views();
    }

    pub fn shutdown(&mut self) {
        self.session.stop();
        self.run.stop();
    }

    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.selection.subscribe()
    }

    pub fn selection(&self) -> Selection {
        self.selection.borrow().clone()
    }

    pub fn session(&self) -> SessionState {
        self.session.current_session()
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    pub fn namespaces(&self) -> &NamespaceCache {
        &self.namespaces
    }

    pub fn pods(&self) -> &TabFetcher<PodsParams, Vec<PodRecord>> {
        &self.pods
    }

    pub fn events(&self) -> &TabFetcher<EventsParams, Vec<EventRecord>> {
        &self.events
    }

    pub fn alerts(&self) -> &TabFetcher<AlertsParams, QueryResult> {
        &self.alerts
    }

    pub fn query(&self) -> &TabFetcher<QueryParams, QueryResult> {
        &self.query
    }

    pub fn summary(&self) -> &TabFetcher<SummaryParams, NamespaceSummary> {
        &self.summary
    }

    pub fn monitor(&self) -> &TabFetcher<MonitorParams, Vec<MonitorSnapshot>> {
        &self.monitor
    }

    pub fn alarms(&self) -> &TabFetcher<AlarmsParams, Vec<AlarmRecord>> {
        &self.alarms
    }

    pub fn detail(&self) -> &PodDetailAggregator {
        &self.detail
    }

    pub fn run(&self) -> &RunPoller {
        &self.run
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Alerts narrowed by the selection's alert namespace, computed from the
    /// held result set.
    pub fn visible_alerts(&self) -> Vec<&QuerySeries> {
        let namespace = self.selection.borrow().alert_namespace.clone();
        self.alerts
            .data()
            .map(|alerts| filter_alerts(alerts, namespace.as_deref()))
            .unwrap_or_default()
    }

    pub fn monitor_counts(&self) -> StatusCounts {
        self.monitor
            .data()
            .map(|snapshots| StatusCounts::tally(snapshots.iter().map(|snapshot| snapshot.status)))
            .unwrap_or_default()
    }

    pub fn alarm_counts(&self) -> StatusCounts {
        self.alarms
            .data()
            .map(|alarms| StatusCounts::tally(alarms.iter().map(|alarm| alarm.status)))
            .unwrap_or_default()
    }

    pub fn active_tab_loading(&self) -> bool {
        let tab = self.selection.borrow().tab;
        match tab {
            ConsoleTab::Pods => self.pods.loading(),
            ConsoleTab::Events => self.events.loading(),
            ConsoleTab::Alerts => self.alerts.loading(),
            ConsoleTab::Query => self.query.loading(),
            ConsoleTab::Summary => self.summary.loading(),
            ConsoleTab::Monitor => self.monitor.loading(),
            ConsoleTab::Alarms => self.alarms.loading(),
        }
    }

    /// Seeds the selection without checking it against the registry, for an
    /// initial cluster/namespace given before any session exists.
    pub fn preselect(&mut self, cluster: Option<String>, namespace: Option<String>) {
        let next = self
            .selection()
            .with_cluster(cluster)
            .with_namespace(namespace);
        self.selection.send_replace(next);
    }

    pub fn select_cluster(&mut self, cluster: Option<String>) {
        if let Some(name) = cluster.as_deref() {
            if !self.registry.contains(name) {
                self.set_notice(format!("unknown cluster {name}"));
                return;
            }
        }
        let next = self.selection().with_cluster(cluster);
        self.set_selection(next);
    }

    pub fn select_namespace(&mut self, namespace: Option<String>) {
        let next = self.selection().with_namespace(namespace);
        self.set_selection(next);
    }

    pub fn select_tab(&mut self, tab: ConsoleTab) {
        let next = self.selection().with_tab(tab);
        self.set_selection(next);
    }

    pub fn set_event_pod(&mut self, pod: Option<String>) {
        let next = self.selection().with_event_pod(pod);
        self.set_selection(next);
    }

    pub fn set_event_type(&mut self, event_type: Option<EventTypeFilter>) {
        let next = self.selection().with_event_type(event_type);
        self.set_selection(next);
    }

    pub fn cycle_event_type(&mut self) {
        let current = self.selection.borrow().event_type;
        self.set_event_type(EventTypeFilter::cycle(current));
    }

    pub fn toggle_monitor_filter(&mut self) {
        let selection = self.selection();
        let next = selection.monitor_filter.toggled();
        self.set_selection(selection.with_monitor_filter(next));
    }

    pub fn set_alert_namespace(&mut self, namespace: Option<String>) {
        let next = self.selection().with_alert_namespace(namespace);
        self.set_selection(next);
    }

    /// Jumps to the events view filtered to one pod.
    pub fn show_events_for_pod(&mut self, pod: &str) {
        let next = self
            .selection()
            .with_event_pod(Some(pod.to_string()))
            .with_tab(ConsoleTab::Events);
        self.set_selection(next);
    }

    pub fn open_pod_detail(&mut self, pod: &str) {
        let selection = self.selection();
        let (Some(cluster), Some(namespace)) = (selection.cluster.clone(), selection.namespace.clone())
        else {
            return;
        };
        if !self.session.logged_in() {
            return;
        }

        let key = PodKey {
            cluster,
            namespace,
            pod: pod.to_string(),
        };
        let ticket = self.detail.open(key.clone());
        self.selection
            .send_replace(selection.with_detail_pod(Some(key.pod.clone())));

        if self.registry.metrics_available(&key.cluster) {
            let backend = self.backend.clone();
            let metrics_ticket = ticket.clone();
            self.spawn(async move {
                let result = detail::load_container_usage(&*backend, metrics_ticket.key()).await;
                ConsoleEvent::DetailMetrics(metrics_ticket, result)
            });
        } else {
            self.detail.resolve_metrics(
                &ticket,
                Err(FetchError::unavailable("metrics")),
            );
        }

        let backend = self.backend.clone();
        self.spawn(async move {
            let result = detail::load_recent_events(&*backend, ticket.key()).await;
            ConsoleEvent::DetailEvents(ticket, result)
        });
    }

    pub fn close_pod_detail(&mut self) {
        self.detail.close();
        let next = self.selection().with_detail_pod(None);
        self.selection.send_replace(next);
    }

    /// Runs a metrics query. Never polled and never retried.
    pub fn submit_query(&mut self, query: &str, time: Option<String>) {
        let query = query.trim();
        let Some(cluster) = self.selection().cluster else {
            self.set_notice("select a cluster first");
            return;
        };
        if query.is_empty() {
            self.query.update(None);
            return;
        }
        if !self.session.logged_in() {
            return;
        }

        let ticket = self.query.submit(QueryParams {
            cluster: cluster.clone(),
            query: query.to_string(),
            time,
        });
        if !self.registry.metrics_available(&cluster) {
            self.query.resolve(
                ticket,
                Ok(QueryResult::rejected(format!(
                    "metrics backend is not available for cluster {cluster}"
                ))),
            );
            return;
        }

        let backend = self.backend.clone();
        self.spawn(async move {
            let params = ticket.params();
            let result = backend
                .run_query(&params.cluster, &params.query, params.time.as_deref())
                .await;
            ConsoleEvent::Query(ticket, result)
        });
    }

    /// Re-issues the active tab's fetch with unchanged inputs.
    pub fn refresh_active_tab(&mut self) {
        let tab = self.selection.borrow().tab;
        if tab.needs_session() && !self.session.logged_in() {
            return;
        }
        match tab {
            ConsoleTab::Pods => {
                let plan = self.pods.refresh();
                self.dispatch_pods(plan);
            }
            ConsoleTab::Events => {
                let plan = self.events.refresh();
                self.dispatch_events(plan);
            }
            ConsoleTab::Alerts => {
                let plan = self.alerts.refresh();
                self.dispatch_alerts(plan);
            }
            ConsoleTab::Query => {
                if let Some(params) = self.query.params().cloned() {
                    self.submit_query(&params.query, params.time);
                }
            }
            ConsoleTab::Summary => {
                let plan = self.summary.refresh();
                self.dispatch_summary(plan);
            }
            ConsoleTab::Monitor => {
                let plan = self.monitor.refresh();
                self.dispatch_monitor(plan);
            }
            ConsoleTab::Alarms => {
                let plan = self.alarms.refresh();
                self.dispatch_alarms(plan);
            }
        }
    }

    /// Periodic refresh: skips the query tab and any tab still loading.
    pub fn auto_refresh(&mut self) {
        let tab = self.selection.borrow().tab;
        if tab == ConsoleTab::Query || self.active_tab_loading() {
            return;
        }
        self.refresh_active_tab();
    }

    pub fn refresh_clusters(&mut self) {
        if !self.session.logged_in() {
            return;
        }
        let generation = self.registry.begin_refresh();
        let epoch = self.session.epoch();
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.list_clusters().await;
            ConsoleEvent::Clusters {
                epoch,
                generation,
                result,
            }
        });
    }

    pub fn refresh_namespaces(&mut self) {
        let clusters = self.registry.names();
        self.fan_out_namespaces(clusters);
    }

    pub fn refresh_namespaces_for(&mut self, cluster: &str) {
        if self.registry.contains(cluster) {
            self.fan_out_namespaces(vec![cluster.to_string()]);
        }
    }

    fn fan_out_namespaces(&mut self, clusters: Vec<String>) {
        if !self.session.logged_in() || clusters.is_empty() {
            return;
        }
        let generation = self.namespaces.begin(&clusters);
        let epoch = self.session.epoch();
        let backend = self.backend.clone();
        self.spawn(async move {
            let outcomes = namespaces::fetch_all(&*backend, clusters).await;
            ConsoleEvent::Namespaces {
                epoch,
                generation,
                outcomes,
            }
        });
    }

    pub fn trigger_run(&mut self, config: Option<String>) {
        if self.run.is_busy() {
            self.set_notice("a run is already in progress");
            return;
        }
        self.run.begin_trigger();
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.trigger_run(config.as_deref()).await;
            ConsoleEvent::RunTriggered(result)
        });
    }

    pub fn poll_run_once(&mut self) {
        let backend = self.backend.clone();
        self.spawn(async move { ConsoleEvent::RunChecked(backend.last_run().await) });
    }

    pub fn apply(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Session(result) => match self.session.observe(result) {
                Some(SessionTransition::Activated) => {
                    self.clear_notice();
                    self.refresh_clusters();
                }
                Some(SessionTransition::Deactivated) => self.reset_for_session_loss(),
                None => {}
            },
            ConsoleEvent::Clusters {
                epoch,
                generation,
                result,
            } => {
                if epoch != self.session.epoch() {
                    debug!(epoch, current = self.session.epoch(), "dropping cluster list from an old session");
                    return;
                }
                if self.registry.apply(generation, result) {
                    self.deselect_missing_cluster();
                    self.refresh_namespaces();
                    self.sync_views();
                }
            }
            ConsoleEvent::Namespaces {
                epoch,
                generation,
                outcomes,
            } => {
                if epoch != self.session.epoch() {
                    debug!(epoch, current = self.session.epoch(), "dropping namespaces from an old session");
                    return;
                }
                let report = self.namespaces.merge(generation, outcomes);
                debug!(
                    updated = report.updated,
                    failed = report.failed,
                    superseded = report.superseded,
                    "namespace cache merged"
                );
            }
            ConsoleEvent::Pods(ticket, result) => {
                self.pods.resolve(ticket, result);
            }
            ConsoleEvent::Events(ticket, result) => {
                self.events.resolve(ticket, result);
            }
            ConsoleEvent::Alerts(ticket, result) => {
                self.alerts.resolve(ticket, result);
            }
            ConsoleEvent::Query(ticket, result) => {
                self.query.resolve(ticket, result);
            }
            ConsoleEvent::Summary(ticket, result) => {
                self.summary.resolve(ticket, result);
            }
            ConsoleEvent::Monitor(ticket, result) => {
                self.monitor.resolve(ticket, result);
            }
            ConsoleEvent::Alarms(ticket, result) => {
                self.alarms.resolve(ticket, result);
            }
            ConsoleEvent::DetailMetrics(ticket, result) => {
                self.detail.resolve_metrics(&ticket, result);
            }
            ConsoleEvent::DetailEvents(ticket, result) => {
                self.detail.resolve_events(&ticket, result);
            }
            ConsoleEvent::RunTriggered(result) => {
                if self.run.apply_trigger(result) {
                    self.run.start_polling(self.backend.clone(), self.tx.clone());
                }
            }
            ConsoleEvent::RunPolled { cycle, tick, result } => {
                if self.run.apply_poll(cycle, tick, result) {
                    self.after_run_finished();
                }
            }
            ConsoleEvent::RunPollFinished { cycle, ticks } => self.run.apply_finished(cycle, ticks),
            ConsoleEvent::RunChecked(result) => {
                if self.run.apply_check(result) {
                    self.after_run_finished();
                } else if self.run.state().is_running() && !self.run.is_active() {
                    info!("run in progress, following it");
                    self.run.start_polling(self.backend.clone(), self.tx.clone());
                }
            }
        }
    }

    fn after_run_finished(&mut self) {
        let tab = self.selection.borrow().tab;
        if tab != ConsoleTab::Query {
            self.refresh_active_tab();
        }
        self.refresh_namespaces();
    }

    fn reset_for_session_loss(&mut self) {
        info!("session lost, clearing cached console state");
        self.registry.clear();
        self.namespaces.clear();
        self.pods.reset();
        self.events.reset();
        self.alerts.reset();
        self.query.reset();
        self.summary.reset();
        self.detail.close();
        let cleared = self.selection().cleared();
        self.selection.send_replace(cleared);
        self.set_notice("no session");
        self.sync_views();
    }

    fn deselect_missing_cluster(&mut self) {
        let Some(cluster) = self.selection().cluster else {
            return;
        };
        if !self.registry.contains(&cluster) {
            info!(%cluster, "selected cluster is gone, deselecting");
            let next = self.selection().with_cluster(None);
            self.set_selection(next);
        }
    }

    fn set_selection(&mut self, next: Selection) {
        let previous = self.selection();
        if next == previous {
            return;
        }
        if next.cluster != previous.cluster {
            self.query.reset();
        }
        let detail_still_open = match self.detail.open_pod() {
            Some(key) => {
                next.cluster.as_deref() == Some(key.cluster.as_str())
                    && next.namespace.as_deref() == Some(key.namespace.as_str())
                    && next.pod_for_detail.as_deref() == Some(key.pod.as_str())
            }
            None => true,
        };
        if !detail_still_open {
            self.detail.close();
        }
        self.selection.send_replace(next);
        self.sync_views();
    }

    /// Brings every view in line with the selection. The visible one fetches;
    /// hidden ones only drop what no longer matches, so a late answer for old
    /// inputs can never land in them.
    fn sync_views(&mut self) {
        let selection = self.selection();
        let tab = selection.tab;
        let fetch = !tab.needs_session() || self.session.logged_in();

        let params = PodsParams::from_selection(&selection);
        let visible = fetch && tab == ConsoleTab::Pods;
        if let Some(plan) = follow(&mut self.pods, params, visible) {
            self.dispatch_pods(plan);
        }
        let params = EventsParams::from_selection(&selection);
        let visible = fetch && tab == ConsoleTab::Events;
        if let Some(plan) = follow(&mut self.events, params, visible) {
            self.dispatch_events(plan);
        }
        let params = AlertsParams::from_selection(&selection);
        let visible = fetch && tab == ConsoleTab::Alerts;
        if let Some(plan) = follow(&mut self.alerts, params, visible) {
            self.dispatch_alerts(plan);
        }
        let params = SummaryParams::from_selection(&selection);
        let visible = fetch && tab == ConsoleTab::Summary;
        if let Some(plan) = follow(&mut self.summary, params, visible) {
            self.dispatch_summary(plan);
        }
        let params = MonitorParams::from_selection(&selection);
        if let Some(plan) = follow(&mut self.monitor, params, tab == ConsoleTab::Monitor) {
            self.dispatch_monitor(plan);
        }
        let params = AlarmsParams::from_selection(&selection);
        if let Some(plan) = follow(&mut self.alarms, params, tab == ConsoleTab::Alarms) {
            self.dispatch_alarms(plan);
        }
    }

    fn dispatch_pods(&self, plan: FetchPlan<PodsParams>) {
        let FetchPlan::Issue(ticket) = plan else {
            return;
        };
        let backend = self.backend.clone();
        self.spawn(async move {
            let params = ticket.params();
            let result = backend.list_pods(&params.cluster, &params.namespace).await;
            ConsoleEvent::Pods(ticket, result)
        });
    }

    fn dispatch_events(&self, plan: FetchPlan<EventsParams>) {
        let FetchPlan::Issue(ticket) = plan else {
            return;
        };
        let backend = self.backend.clone();
        self.spawn(async move {
            let params = ticket.params();
            let result = backend
                .list_events(
                    &params.cluster,
                    &params.namespace,
                    params.pod.as_deref(),
                    params.event_type,
                )
                .await;
            ConsoleEvent::Events(ticket, result)
        });
    }

    fn dispatch_alerts(&self, plan: FetchPlan<AlertsParams>) {
        let FetchPlan::Issue(ticket) = plan else {
            return;
        };
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.list_alerts(&ticket.params().cluster).await;
            ConsoleEvent::Alerts(ticket, result)
        });
    }

    fn dispatch_summary(&self, plan: FetchPlan<SummaryParams>) {
        let FetchPlan::Issue(ticket) = plan else {
            return;
        };
        let backend = self.backend.clone();
        self.spawn(async move {
            let params = ticket.params();
            let result = backend
                .namespace_summary(&params.cluster, &params.namespace)
                .await;
            ConsoleEvent::Summary(ticket, result)
        });
    }

    fn dispatch_monitor(&self, plan: FetchPlan<MonitorParams>) {
        let FetchPlan::Issue(ticket) = plan else {
            return;
        };
        let backend = self.backend.clone();
        self.spawn(async move {
            let params = ticket.params();
            let result = backend
                .monitor_snapshots(params.cluster.as_deref(), params.namespace.as_deref())
                .await;
            ConsoleEvent::Monitor(ticket, result)
        });
    }

    fn dispatch_alarms(&self, plan: FetchPlan<AlarmsParams>) {
        let FetchPlan::Issue(ticket) = plan else {
            return;
        };
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.recent_alarms(ticket.params().limit).await;
            ConsoleEvent::Alarms(ticket, result)
        });
    }

    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ConsoleEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = future.await;
            if tx.send(event).is_err() {
                debug!("console closed before a backend call completed");
            }
        });
    }
}

/// Updates a visible view, or invalidates a hidden one. Only a visible view
/// can produce a fetch plan.
fn follow<P, T>(
    fetcher: &mut TabFetcher<P, T>,
    params: Option<P>,
    visible: bool,
) -> Option<FetchPlan<P>>
where
    P: Clone + Eq + std::fmt::Debug,
{
    if visible {
        Some(fetcher.update(params))
    } else {
        fetcher.invalidate(params.as_ref());
        None
    }
}
