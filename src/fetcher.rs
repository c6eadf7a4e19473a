use chrono::{DateTime, Local};
use std::fmt::Debug;
use tracing::debug;

use crate::error::FetchResult;
use crate::model::{EventTypeFilter, MonitorFilter, QueryResult, QuerySeries, Selection};

/// Number of recent alarms the alarms view asks for.
pub const ALARM_LIMIT: u32 = 100;

/// Request-time snapshot of a fetcher's inputs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FetchTicket<P> {
    generation: u64,
    params: P,
}

impl<P> FetchTicket<P> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> &P {
        &self.params
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FetchPlan<P> {
    /// Inputs changed (or a refresh was asked for); the caller must run the fetch.
    Issue(FetchTicket<P>),
    /// Inputs are incomplete; the view was emptied without a network call.
    Cleared,
    /// Nothing to do.
    Unchanged,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Resolution {
    Applied,
    Failed,
    Stale,
}

/// One view's data with its loading/error state.
///
/// Every issued request bumps the generation. A response is applied only if
/// its ticket still carries the current generation and inputs, so whichever
/// request was issued last wins no matter the order responses come back in.
#[derive(Debug)]
pub struct TabFetcher<P, T> {
    name: &'static str,
    params: Option<P>,
    generation: u64,
    data: Option<T>,
    shown_params: Option<P>,
    loading: bool,
    error: Option<String>,
    last_refreshed: Option<DateTime<Local>>,
}

impl<P, T> TabFetcher<P, T>
where
    P: Clone + Eq + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: None,
            generation: 0,
            data: None,
            shown_params: None,
            loading: false,
            error: None,
            last_refreshed: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Data only if it was fetched for the current inputs, not left over from
    /// earlier ones while a new fetch is loading.
    pub fn current_data(&self) -> Option<&T> {
        match (&self.params, &self.shown_params) {
            (Some(params), Some(shown)) if params == shown => self.data.as_ref(),
            _ => None,
        }
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

    /// Declares the current inputs. A fetch is issued only when they differ
    /// from the previous ones.
    pub fn update(&mut self, params: Option<P>) -> FetchPlan<P> {
        match params {
            None => {
                if self.params.is_none() && self.data.is_none() && !self.loading {
                    return FetchPlan::Unchanged;
                }
                self.reset();
                FetchPlan::Cleared
            }
            Some(params) if self.params.as_ref() == Some(&params) => FetchPlan::Unchanged,
            Some(params) => FetchPlan::Issue(self.issue(params)),
        }
    }

    /// Re-issues with the current inputs.
    pub fn refresh(&mut self) -> FetchPlan<P> {
        match self.params.clone() {
            Some(params) => FetchPlan::Issue(self.issue(params)),
            None => FetchPlan::Unchanged,
        }
    }

    /// Issues unconditionally, for user-triggered fetches.
    pub fn submit(&mut self, params: P) -> FetchTicket<P> {
        self.issue(params)
    }

    fn issue(&mut self, params: P) -> FetchTicket<P> {
        self.generation += 1;
        self.params = Some(params.clone());
        self.loading = true;
        debug!(fetcher = self.name, generation = self.generation, ?params, "fetch issued");
        FetchTicket {
            generation: self.generation,
            params,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket<P>) -> bool {
        ticket.generation == self.generation && self.params.as_ref() == Some(&ticket.params)
    }

    pub fn resolve(&mut self, ticket: FetchTicket<P>, result: FetchResult<T>) -> Resolution {
        if !self.is_current(&ticket) {
            debug!(
                fetcher = self.name,
                generation = ticket.generation,
                current = self.generation,
                "dropping stale response"
            );
            return Resolution::Stale;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.shown_params = Some(ticket.params);
                self.error = None;
                self.last_refreshed = Some(Local::now());
                Resolution::Applied
            }
            Err(error) => {
                // A failed refresh of the same view keeps its last good data;
                // data belonging to other inputs must go.
                if self.shown_params.as_ref() != Some(&ticket.params) {
                    self.data = None;
                    self.shown_params = None;
                }
                self.error = Some(error.to_string());
                Resolution::Failed
            }
        }
    }

    /// Follows an input change without fetching, for a view that is not on
    /// screen. Outstanding requests and data for other inputs are dropped;
    /// the next `update` issues a fresh fetch.
    pub fn invalidate(&mut self, params: Option<&P>) -> bool {
        if self.params.as_ref() == params {
            return false;
        }
        if self.params.is_none() && self.data.is_none() && !self.loading {
            return false;
        }
        debug!(fetcher = self.name, generation = self.generation, "inputs moved while hidden");
        self.reset();
        true
    }

    /// Forgets everything, including in-flight requests.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.params = None;
        self.data = None;
        self.shown_params = None;
        self.loading = false;
        self.error = None;
        self.last_refreshed = None;
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PodsParams {
    pub cluster: String,
    pub namespace: String,
}

impl PodsParams {
    pub fn from_selection(selection: &Selection) -> Option<Self> {
        Some(Self {
            cluster: selection.cluster.clone()?,
            namespace: selection.namespace.clone()?,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EventsParams {
    pub cluster: String,
    pub namespace: String,
    pub pod: Option<String>,
    pub event_type: Option<EventTypeFilter>,
}

impl EventsParams {
    pub fn from_selection(selection: &Selection) -> Option<Self> {
        Some(Self {
            cluster: selection.cluster.clone()?,
            namespace: selection.namespace.clone()?,
            pod: selection.pod_for_events.clone(),
            event_type: selection.event_type,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AlertsParams {
    pub cluster: String,
}

impl AlertsParams {
    pub fn from_selection(selection: &Selection) -> Option<Self> {
        Some(Self {
            cluster: selection.cluster.clone()?,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QueryParams {
    pub cluster: String,
    pub query: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SummaryParams {
    pub cluster: String,
    pub namespace: String,
}

impl SummaryParams {
    pub fn from_selection(selection: &Selection) -> Option<Self> {
        Some(Self {
            cluster: selection.cluster.clone()?,
            namespace: selection.namespace.clone()?,
        })
    }
}

/// Snapshot filter: one of cluster or namespace, or nothing for every
/// snapshot the runner recorded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MonitorParams {
    pub cluster: Option<String>,
    pub namespace: Option<String>,
}

impl MonitorParams {
    pub fn from_selection(selection: &Selection) -> Option<Self> {
        Some(match selection.monitor_filter {
            MonitorFilter::Cluster => Self {
                cluster: selection.cluster.clone(),
                namespace: None,
            },
            MonitorFilter::Namespace => Self {
                cluster: None,
                namespace: selection.namespace.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AlarmsParams {
    pub limit: u32,
}

impl AlarmsParams {
    pub fn from_selection(_selection: &Selection) -> Option<Self> {
        Some(Self { limit: ALARM_LIMIT })
    }
}

/// Alerts narrowed to one namespace label. Runs on the held alert set only.
pub fn filter_alerts<'a>(alerts: &'a QueryResult, namespace: Option<&str>) -> Vec<&'a QuerySeries> {
    if !alerts.ok {
        return Vec::new();
    }
    match namespace {
        Some(namespace) => alerts.filter_by_namespace(namespace),
        None => alerts.series.iter().collect(),
    }
}
