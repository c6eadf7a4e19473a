use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::model::{
    AlarmRecord, ClusterDescriptor, EventRecord, EventTypeFilter, MonitorSnapshot,
    NamespaceSummary, PodRecord, QueryResult, RunState, SessionState, TriggerAck,
};

/// Request/response contracts of every backend the console talks to.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    async fn session_status(&self) -> FetchResult<SessionState>;

    async fn list_clusters(&self) -> FetchResult<Vec<ClusterDescriptor>>;

    async fn list_namespaces(&self, cluster: &str) -> FetchResult<Vec<String>>;

    async fn list_pods(&self, cluster: &str, namespace: &str) -> FetchResult<Vec<PodRecord>>;

    async fn list_events(
        &self,
        cluster: &str,
        namespace: &str,
        pod: Option<&str>,
        event_type: Option<EventTypeFilter>,
    ) -> FetchResult<Vec<EventRecord>>;

    async fn run_query(
        &self,
        cluster: &str,
        query: &str,
        time: Option<&str>,
    ) -> FetchResult<QueryResult>;

    async fn list_alerts(&self, cluster: &str) -> FetchResult<QueryResult>;

    async fn namespace_summary(
        &self,
        cluster: &str,
        namespace: &str,
    ) -> FetchResult<NamespaceSummary>;

    async fn trigger_run(&self, config: Option<&str>) -> FetchResult<TriggerAck>;

    async fn last_run(&self) -> FetchResult<RunState>;

    /// Latest runner snapshots, narrowed by cluster or namespace when given.
    async fn monitor_snapshots(
        &self,
        cluster: Option<&str>,
        namespace: Option<&str>,
    ) -> FetchResult<Vec<MonitorSnapshot>>;

    async fn recent_alarms(&self, limit: u32) -> FetchResult<Vec<AlarmRecord>>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    cluster: &'a str,
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TriggerRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a str>,
}

/// `ConsoleBackend` over the control API and the observe API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    api_base: Url,
    observe_base: Url,
}

impl HttpBackend {
    pub fn new(api_url: &str, observe_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: parse_base(api_url).context("invalid control API URL")?,
            observe_base: parse_base(observe_url).context("invalid observe API URL")?,
        })
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    pub fn observe_base(&self) -> &str {
        self.observe_base.as_str()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        base: &Url,
        path: &str,
        query: &[(&str, &str)],
    ) -> FetchResult<T> {
        let url = join(base, path)?;
        debug!(%url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        base: &Url,
        path: &str,
        body: &B,
    ) -> FetchResult<T> {
        let url = join(base, path)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }

    /// The query endpoints may answer a malformed query with a non-2xx status
    /// whose body is still a regular `{ok: false, error}` envelope.
    async fn post_query(&self, path: &str, body: &QueryRequest<'_>) -> FetchResult<QueryResult> {
        let url = join(&self.observe_base, path)?;
        debug!(%url, cluster = body.cluster, "POST query");
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<QueryResult>(&text) {
            Ok(envelope) if !envelope.ok && envelope.error.is_some() => Ok(envelope),
            _ => Err(FetchError::Backend {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}

#[async_trait]
impl ConsoleBackend for HttpBackend {
    async fn session_status(&self) -> FetchResult<SessionState> {
        self.get_json(&self.observe_base, "api/observe/auth", &[])
            .await
    }

    async fn list_clusters(&self) -> FetchResult<Vec<ClusterDescriptor>> {
        self.get_json(&self.observe_base, "api/observe/clusters", &[])
            .await
    }

    async fn list_namespaces(&self, cluster: &str) -> FetchResult<Vec<String>> {
        self.get_json(
            &self.observe_base,
            "api/observe/namespaces",
            &[("cluster", cluster)],
        )
        .await
    }

    async fn list_pods(&self, cluster: &str, namespace: &str) -> FetchResult<Vec<PodRecord>> {
        self.get_json(
            &self.observe_base,
            "api/observe/pods",
            &[("cluster", cluster), ("namespace", namespace)],
        )
        .await
    }

    async fn list_events(
        &self,
        cluster: &str,
        namespace: &str,
        pod: Option<&str>,
        event_type: Option<EventTypeFilter>,
    ) -> FetchResult<Vec<EventRecord>> {
        let mut query = vec![("cluster", cluster), ("namespace", namespace)];
        if let Some(pod) = pod {
            query.push(("pod", pod));
        }
        if let Some(event_type) = event_type {
            query.push(("type", event_type.as_query_value()));
        }
        self.get_json(&self.observe_base, "api/observe/events", &query)
            .await
    }

    async fn run_query(
        &self,
        cluster: &str,
        query: &str,
        time: Option<&str>,
    ) -> FetchResult<QueryResult> {
        self.post_query(
            "api/observe/promql",
            &QueryRequest {
                cluster,
                query,
                time,
            },
        )
        .await
    }

    async fn list_alerts(&self, cluster: &str) -> FetchResult<QueryResult> {
        self.get_json(
            &self.observe_base,
            "api/observe/alerts",
            &[("cluster", cluster)],
        )
        .await
    }

    async fn namespace_summary(
        &self,
        cluster: &str,
        namespace: &str,
    ) -> FetchResult<NamespaceSummary> {
        self.get_json(
            &self.observe_base,
            "api/observe/summary",
            &[("cluster", cluster), ("namespace", namespace)],
        )
        .await
    }

    async fn trigger_run(&self, config: Option<&str>) -> FetchResult<TriggerAck> {
        self.post_json(&self.api_base, "api/run", &TriggerRequest { config })
            .await
    }

    async fn last_run(&self) -> FetchResult<RunState> {
        self.get_json(&self.api_base, "api/run/last", &[]).await
    }

    async fn monitor_snapshots(
        &self,
        cluster: Option<&str>,
        namespace: Option<&str>,
    ) -> FetchResult<Vec<MonitorSnapshot>> {
        let mut query = Vec::new();
        if let Some(cluster) = cluster.filter(|value| !value.is_empty()) {
            query.push(("cluster", cluster));
        }
        if let Some(namespace) = namespace.filter(|value| !value.is_empty()) {
            query.push(("namespace", namespace));
        }
        self.get_json(&self.api_base, "api/monitor/pods", &query)
            .await
    }

    async fn recent_alarms(&self, limit: u32) -> FetchResult<Vec<AlarmRecord>> {
        let limit = limit.to_string();
        self.get_json(&self.api_base, "api/alarms", &[("limit", limit.as_str())])
            .await
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalized).with_context(|| format!("cannot parse '{trimmed}'"))
}

fn join(base: &Url, path: &str) -> FetchResult<Url> {
    base.join(path)
        .map_err(|error| FetchError::Transport(format!("invalid path {path}: {error}")))
}

async fn decode<T: DeserializeOwned>(response: Response) -> FetchResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Backend {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
