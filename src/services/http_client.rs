use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::data_source::TableDataSource;
use super::error_handling::{MsmError, Result};
use super::session::SessionHandle;
use crate::config::ApiConfig;
use crate::domain::pagination::{IdName, PaginationInfo, ServerTableParams, ServerTableResponse};

/// The three backend deployments the app talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Core,
    Msm,
    Golam,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Core => "core",
            Backend::Msm => "msm",
            Backend::Golam => "golam",
        };
        f.write_str(name)
    }
}

/// Login and token refresh go out without the bearer header.
pub fn is_auth_endpoint(path: &str) -> bool {
    path.contains("/auth/login") || path.contains("/auth/refresh")
}

/// JSON client over the three backends. Requests carry the session's access
/// token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
    session: SessionHandle,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: SessionHandle) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| MsmError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self {
            http,
            config: Arc::new(config),
            session,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `path` appended to the backend's base URL, keeping any path prefix
    /// the base carries.
    pub fn url(&self, backend: Backend, path: &str) -> Result<Url> {
        let base = match backend {
            Backend::Core => self.config.core_url.as_ref(),
            Backend::Msm => self.config.msm_url.as_ref(),
            Backend::Golam => self.config.golam_url.as_ref(),
        }
        .ok_or(MsmError::MissingBaseUrl { backend })?;

        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|error| MsmError::Configuration {
            message: format!("Cannot build a URL for {path}: {error}"),
        })
    }

    pub fn request(&self, method: Method, backend: Backend, path: &str) -> Result<RequestBuilder> {
        let url = self.url(backend, path)?;
        let request = self.http.request(method, url);
        if is_auth_endpoint(path) {
            return Ok(request);
        }
        Ok(match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    pub async fn get_json(
        &self,
        backend: Backend,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value> {
        let request = self.request(Method::GET, backend, path)?.query(query);
        self.send(request).await
    }

    pub async fn post_json<B>(&self, backend: Backend, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, backend, path)?.json(body);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let request = request.build().map_err(|source| MsmError::Http {
            url: String::new(),
            source,
        })?;
        let url = request.url().to_string();
        debug!(method = %request.method(), url = %url, "Sending API request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|source| MsmError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MsmError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| MsmError::Http { url, source })
    }
}

/// Query string for a table request: `search` when present, one entry per
/// non-empty filter field (lists JSON-encoded), then `limit` and `offset`.
pub fn query_pairs<F: Serialize>(params: &ServerTableParams<F>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    if let Some(search) = params.search.as_deref().filter(|search| !search.is_empty()) {
        pairs.push(("search".to_string(), search.to_string()));
    }

    match serde_json::to_value(&params.filters)? {
        Value::Object(fields) => {
            for (name, value) in fields {
                match value {
                    Value::Null => {}
                    Value::Array(ref items) if items.is_empty() => {}
                    Value::String(ref text) if text.is_empty() => {}
                    Value::String(text) => pairs.push((name, text)),
                    other => pairs.push((name, other.to_string())),
                }
            }
        }
        Value::Null => {}
        _ => {
            return Err(MsmError::Configuration {
                message: "Table filters must serialize to an object".to_string(),
            });
        }
    }

    pairs.push(("limit".to_string(), params.limit.to_string()));
    pairs.push(("offset".to_string(), params.offset.to_string()));
    Ok(pairs)
}

/// Normalizes the list envelopes the backends use into one response shape.
///
/// Accepted: `{data: {items, pagination}}`, `{items, pagination}`,
/// `{data: [...]}` and a bare array. A missing pagination block is derived
/// from the item count and the requested window.
pub fn parse_list_envelope<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
    limit: usize,
    offset: usize,
) -> Result<ServerTableResponse<T>> {
    let (items, pagination) = match body {
        Value::Array(items) => (Some(Value::Array(items)), None),
        Value::Object(mut root) => match root.remove("data") {
            Some(Value::Object(mut data)) => (data.remove("items"), data.remove("pagination")),
            Some(Value::Array(items)) => (Some(Value::Array(items)), root.remove("pagination")),
            Some(_) => return Err(MsmError::malformed(endpoint, "`data` is neither a list nor an object")),
            None => (root.remove("items"), root.remove("pagination")),
        },
        _ => return Err(MsmError::malformed(endpoint, "expected a JSON object or array")),
    };

    let items = match items {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(|error| MsmError::malformed(endpoint, format!("bad item: {error}")))?,
        _ => return Err(MsmError::malformed(endpoint, "missing `items` list")),
    };

    let pagination = match pagination {
        None | Some(Value::Null) => {
            let limit = limit.max(1);
            PaginationInfo::from_total(offset + items.len(), offset / limit, limit)
        }
        Some(pagination) => serde_json::from_value(pagination)
            .map_err(|error| MsmError::malformed(endpoint, format!("bad pagination: {error}")))?,
    };

    Ok(ServerTableResponse { items, pagination })
}

/// Table rows served by a backend list endpoint.
pub struct HttpTableSource<I, F> {
    client: ApiClient,
    backend: Backend,
    endpoint: String,
    _marker: PhantomData<fn() -> (I, F)>,
}

impl<I, F> HttpTableSource<I, F> {
    pub fn new(client: ApiClient, backend: Backend, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            backend,
            endpoint: endpoint.into(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<I, F> TableDataSource for HttpTableSource<I, F>
where
    I: DeserializeOwned + Clone + Send + Sync + 'static,
    F: Serialize + Clone + PartialEq + Send + Sync + 'static,
{
    type Item = I;
    type Filters = F;

    async fn fetch(&self, params: &ServerTableParams<F>) -> Result<ServerTableResponse<I>> {
        let query = query_pairs(params)?;
        let body = self.client.get_json(self.backend, &self.endpoint, &query).await?;
        parse_list_envelope(&self.endpoint, body, params.limit, params.offset)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

/// Options for a filter dropdown. Any shape other than `{data: [...]}` is
/// treated as no options; entries that are not `{id, value}` are skipped.
pub async fn fetch_id_names(client: &ApiClient, backend: Backend, path: &str) -> Result<Vec<IdName>> {
    let body = client.get_json(backend, path, &[]).await?;
    Ok(id_names_from(body))
}

fn id_names_from(body: Value) -> Vec<IdName> {
    match body {
        Value::Object(mut root) => match root.remove("data") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
