//! HTTP client for the monitoring platform's v2 API

use super::responses::{
    CommentRequest, EntitiesPage, ExtensionsPage, MetricQueryResponse, MonitoringConfigurationDto,
    Paged, ProblemsPage,
};
use super::{selectors, GatewayFactory, MonitoringApi};
use crate::config::EndpointConfig;
use crate::error::GatewayError;
use crate::models::{MetricSample, Problem, TimeWindow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROBLEMS_PAGE_SIZE: u32 = 10;
const METRICS_PAGE_SIZE: u32 = 10_000;
const EXTENSIONS_PAGE_SIZE: u32 = 100;
const ENTITIES_PAGE_SIZE: u32 = 500;

const COMMENT_CONTEXT: &str = "DDU root cause analysis";

/// API client bound to one environment and token
pub struct GatewayClient {
    client: Client,
    base_url: Url,
    api_token: String,
}

impl GatewayClient {
    /// Create a client for an endpoint
    pub fn new(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!endpoint.verify_ssl)
            .build()
            .map_err(|source| GatewayError::Transport {
                endpoint: endpoint.environment_url.clone(),
                source,
            })?;

        let base_url = Url::parse(&endpoint.environment_url)?;

        Ok(Self {
            client,
            base_url,
            api_token: endpoint.api_token.clone(),
        })
    }

    /// Environment base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the environment URL, keeping any path prefix
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Api-Token {}", self.api_token))
    }

    /// Send a request and check the status
    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<String, GatewayError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|source| GatewayError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// GET and parse a JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.url(segments)?;
        let endpoint = url.path().to_string();

        debug!(endpoint = %endpoint, "GET");
        let body = self.send(self.client.get(url).query(params), &endpoint).await?;

        serde_json::from_str(&body).map_err(|e| GatewayError::malformed(&endpoint, e.to_string()))
    }

    /// GET every page of a list endpoint
    async fn get_all<P: Paged>(
        &self,
        segments: &[&str],
        params: Vec<(&str, String)>,
    ) -> Result<Vec<P::Item>, GatewayError> {
        let endpoint = format!("/{}", segments.join("/"));
        let mut items = Vec::new();
        let mut params = params;

        loop {
            let page: P = self.get_json(segments, &params).await?;
            let (page_items, next_page_key) = page.into_parts(&endpoint)?;
            items.extend(page_items);

            match next_page_key {
                Some(key) if !key.is_empty() => {
                    // Follow-up pages only accept the page key
                    params = vec![("nextPageKey", key)];
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl MonitoringApi for GatewayClient {
    async fn open_problems(
        &self,
        problem_text: &str,
        window: &TimeWindow,
    ) -> Result<Vec<Problem>, GatewayError> {
        let params = vec![
            ("pageSize", PROBLEMS_PAGE_SIZE.to_string()),
            ("from", window.from_param()),
            ("to", window.to_param()),
            ("problemSelector", selectors::open_problems(problem_text)),
            ("fields", "recentComments".to_string()),
        ];

        self.get_all::<ProblemsPage>(&["api", "v2", "problems"], params)
            .await
    }

    async fn query_metric(
        &self,
        metric_selector: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MetricSample>, GatewayError> {
        let params = vec![
            ("metricSelector", metric_selector.to_string()),
            ("from", window.from_param()),
            ("to", window.to_param()),
            ("pageSize", METRICS_PAGE_SIZE.to_string()),
        ];

        self.get_all::<MetricQueryResponse>(&["api", "v2", "metrics", "query"], params)
            .await
    }

    async fn extension_names(&self) -> Result<HashSet<String>, GatewayError> {
        let params = vec![("pageSize", EXTENSIONS_PAGE_SIZE.to_string())];

        let names = self
            .get_all::<ExtensionsPage>(&["api", "v2", "extensions"], params)
            .await?;
        Ok(names.into_iter().collect())
    }

    async fn monitoring_scope(
        &self,
        extension_name: &str,
        config_id: &str,
    ) -> Result<String, GatewayError> {
        let config: MonitoringConfigurationDto = self
            .get_json(
                &[
                    "api",
                    "v2",
                    "extensions",
                    extension_name,
                    "monitoringConfigurations",
                    config_id,
                ],
                &[],
            )
            .await?;

        Ok(config.scope)
    }

    async fn entity_ids(
        &self,
        entity_selector: &str,
        window: &TimeWindow,
    ) -> Result<Vec<String>, GatewayError> {
        let params = vec![
            ("pageSize", ENTITIES_PAGE_SIZE.to_string()),
            ("from", window.from_param()),
            ("to", window.to_param()),
            ("entitySelector", entity_selector.to_string()),
        ];

        self.get_all::<EntitiesPage>(&["api", "v2", "entities"], params)
            .await
    }

    async fn post_comment(&self, problem_id: &str, message: &str) -> Result<(), GatewayError> {
        let url = self.url(&["api", "v2", "problems", problem_id, "comments"])?;
        let endpoint = url.path().to_string();

        let body = CommentRequest {
            message,
            context: COMMENT_CONTEXT,
        };

        debug!(endpoint = %endpoint, "POST");
        self.send(self.client.post(url).json(&body), &endpoint)
            .await?;

        Ok(())
    }
}

/// Creates a [`GatewayClient`] per endpoint
#[derive(Debug, Clone)]
pub struct HttpGatewayFactory {
    timeout: Duration,
}

impl HttpGatewayFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpGatewayFactory {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl GatewayFactory for HttpGatewayFactory {
    fn connect(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn MonitoringApi>, GatewayError> {
        Ok(Arc::new(GatewayClient::new(endpoint, self.timeout)?))
    }
}
