//! HTTP gateway for the Sanity query API
//!
//! One rate-limited `reqwest` client serves every entity kind. Queries are
//! sent as `GET /v{api_version}/data/query/{dataset}?query=...&$param=<json>`
//! and the `{"result": ...}` envelope is unwrapped before decoding.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::domain::criteria::{FilterCriteria, SearchQuery};
use crate::domain::entities::{CatalogEntity, Department, EntityKind};
use crate::domain::errors::FetchError;
use crate::domain::gateway::{CountGateway, QueryGateway};
use crate::infrastructure::config::GatewayConfig;
use crate::infrastructure::groq::{self, GroqQuery};

const DEFAULT_RETRY_AFTER_SECONDS: u64 = 1;
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Deserialize)]
struct QueryEnvelope<T> {
    result: T,
}

/// Rate-limited client for one project/dataset
pub struct SanityGateway {
    client: Client,
    endpoint: Url,
    token: Option<String>,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl std::fmt::Debug for SanityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityGateway")
            .field("endpoint", &self.endpoint.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

/// `https://{project}.api.sanity.io/v{version}/data/query/{dataset}` (or
/// `apicdn` when `use_cdn`), or the same path under `base_url`.
pub fn query_endpoint(config: &GatewayConfig) -> Result<Url, FetchError> {
    let base = match &config.base_url {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => {
            let host = if config.use_cdn { "apicdn" } else { "api" };
            format!("https://{}.{host}.sanity.io", config.project_id)
        }
    };

    let version = config.api_version.trim_start_matches('v');
    let raw = format!("{base}/v{version}/data/query/{}", config.dataset);
    Url::parse(&raw).map_err(|e| FetchError::invalid_request(format!("Invalid endpoint {raw}: {e}")))
}

impl SanityGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::invalid_request(format!("Invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        let per_second = NonZeroU32::new(config.max_requests_per_second).ok_or_else(|| {
            FetchError::invalid_request("Rate limit must be greater than 0")
        })?;

        Ok(Self {
            client,
            endpoint: query_endpoint(config)?,
            token: config.token.clone().filter(|t| !t.is_empty()),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for `query`.
    pub fn request_url(&self, query: &GroqQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &query.query);
            for (name, value) in &query.params {
                pairs.append_pair(&format!("${name}"), &value.to_string());
            }
        }
        url
    }

    /// Run `query` and decode its `result`.
    pub async fn fetch<T: DeserializeOwned>(&self, query: &GroqQuery) -> Result<T, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = self.request_url(query);
        debug!("GROQ request: {} ({} params)", self.endpoint, query.params.len());

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECONDS);
            warn!("⚠️ Query API rate limited, retry after {}s", retry_after_seconds);
            return Err(FetchError::RateLimited { retry_after_seconds });
        }

        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            warn!("Query API responded with HTTP {}", status.as_u16());
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: QueryEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.result)
    }

    async fn fetch_list<E: DeserializeOwned>(&self, query: &GroqQuery) -> Result<Vec<E>, FetchError> {
        // An empty dataset can come back as `null`
        Ok(self.fetch::<Option<Vec<E>>>(query).await?.unwrap_or_default())
    }
}

#[async_trait]
impl<E> QueryGateway<E> for SanityGateway
where
    E: CatalogEntity + DeserializeOwned,
{
    async fn list_all(&self) -> Result<Vec<E>, FetchError> {
        let items = self.fetch_list(&groq::list_all(E::KIND)).await?;
        debug!("Fetched {} {} documents", items.len(), E::KIND);
        Ok(items)
    }

    async fn search_by_query(&self, query: &SearchQuery) -> Result<Vec<E>, FetchError> {
        self.fetch_list(&groq::search(E::KIND, query)).await
    }

    async fn filter_by(&self, criteria: &FilterCriteria) -> Result<Vec<E>, FetchError> {
        let query = groq::filter(E::KIND, criteria)?;
        self.fetch_list(&query).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>, FetchError> {
        self.fetch(&groq::by_slug(E::KIND, slug)).await
    }
}

#[async_trait]
impl CountGateway for SanityGateway {
    async fn count_by_brand(&self, brand_id: &str) -> Result<u64, FetchError> {
        self.fetch(&groq::count_by_brand(brand_id)).await
    }

    async fn count_by_department(&self, department_id: &str) -> Result<u64, FetchError> {
        self.fetch(&groq::count_by_department(department_id)).await
    }

    async fn list_departments(&self) -> Result<Vec<Department>, FetchError> {
        debug!("Fetching {} options", EntityKind::Department);
        self.fetch_list(&groq::departments()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            project_id: "abc123".to_string(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn test_endpoint_uses_cdn_host_by_default() {
        let url = query_endpoint(&config()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc123.apicdn.sanity.io/v2024-01-01/data/query/production"
        );

        let live = GatewayConfig {
            use_cdn: false,
            api_version: "v2023-05-03".to_string(),
            ..config()
        };
        assert_eq!(
            query_endpoint(&live).unwrap().as_str(),
            "https://abc123.api.sanity.io/v2023-05-03/data/query/production"
        );
    }

    #[test]
    fn test_base_url_override() {
        let cfg = GatewayConfig {
            base_url: Some("http://127.0.0.1:4010/".to_string()),
            ..config()
        };
        assert_eq!(
            query_endpoint(&cfg).unwrap().as_str(),
            "http://127.0.0.1:4010/v2024-01-01/data/query/production"
        );
    }

    #[test]
    fn test_request_url_encodes_params_as_json() {
        let gateway = SanityGateway::new(&config()).unwrap();
        let url = gateway.request_url(&groq::by_slug(EntityKind::Blog, "new-ct"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0].0, "query");
        assert_eq!(pairs[1], ("$slug".to_string(), "\"new-ct\"".to_string()));
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let cfg = GatewayConfig {
            max_requests_per_second: 0,
            ..config()
        };
        assert!(matches!(
            SanityGateway::new(&cfg),
            Err(FetchError::InvalidRequest { .. })
        ));
    }
}
