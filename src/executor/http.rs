//! HTTP search backend speaking the OpenSearch/Elasticsearch `_search` API.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use super::{BackendResponse, SearchBackend};
use crate::types::{BasicAuth, ClientConfig};
use crate::{Result, SearchError};

/// Backend client built from a [`ClientConfig`]. Cheap to clone; clones share one
/// connection pool, so a single instance can serve every in-flight query.
#[derive(Clone)]
pub struct HttpSearchBackend {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
    basic_auth: Option<BasicAuth>,
}

impl HttpSearchBackend {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SearchError::InvalidConfig {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        let endpoint = parse_endpoint(&config.endpoint)?;

        Ok(Self {
            client,
            endpoint,
            auth_token: config.auth_token.clone(),
            basic_auth: config.basic_auth.clone(),
        })
    }

    /// Wraps an existing client, e.g. one shared with other parts of the caller.
    pub fn with_client(client: Client, endpoint: &str) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: parse_endpoint(endpoint)?,
            auth_token: None,
            basic_auth: None,
        })
    }

    /// `{endpoint}/{index}/_search`, with the index escaped as a single path segment.
    pub fn search_url(&self, index: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| SearchError::InvalidConfig {
                reason: format!("endpoint cannot carry a path: {}", self.endpoint),
            })?
            .pop_if_empty()
            .push(index)
            .push("_search");
        Ok(url)
    }
}

impl fmt::Debug for HttpSearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSearchBackend")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_auth_token", &self.auth_token.is_some())
            .field("basic_auth", &self.basic_auth)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, index: &str, body: Vec<u8>) -> Result<BackendResponse> {
        let mut request = self
            .client
            .post(self.search_url(index)?)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(ref basic) = self.basic_auth {
            request = request.basic_auth(&basic.username, Some(&basic.password));
        }

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::transport("failed to read search response body", e))?;

        Ok(BackendResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim();
    let url = Url::parse(endpoint).map_err(|e| SearchError::InvalidConfig {
        reason: format!("invalid endpoint {endpoint}: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::InvalidConfig {
            reason: format!("endpoint must be an http(s) URL: {endpoint}"),
        });
    }
    Ok(url)
}

fn classify_send_error(err: reqwest::Error) -> SearchError {
    let reason = if err.is_timeout() {
        "search request timeout"
    } else if err.is_connect() {
        "failed to connect to search backend"
    } else {
        "search request failed"
    };
    SearchError::transport(reason, err)
}
