//! Network transport: direct and proxied HTTP GET.

use crate::config::NetworkConfig;
use crate::error::{Error, FetchError, Result};

/// Which network route a request takes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Straight to the origin server
    Direct,
    /// Through the configured proxy
    Proxy,
}

/// Abstraction over HTTP fetching, enabling testability.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` over `route` and return the response body.
    ///
    /// Non-success status codes are reported as [`FetchError::Status`].
    async fn get(&self, url: &url::Url, route: Route) -> std::result::Result<Vec<u8>, FetchError>;

    /// Whether a proxy route is available
    fn has_proxy(&self) -> bool;
}

/// Production [`Transport`] backed by two reqwest clients.
///
/// The direct client ignores proxy environment variables; the proxied client routes
/// every request through the configured proxy. Each client carries its own timeout.
pub struct HttpTransport {
    direct: reqwest::Client,
    proxied: Option<reqwest::Client>,
}

impl HttpTransport {
    /// Build both clients from the network configuration.
    ///
    /// Fails if the proxy address cannot be used by the HTTP stack.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let direct = reqwest::Client::builder()
            .user_agent(network.user_agent.as_str())
            .timeout(network.direct_timeout)
            .no_proxy()
            .build()
            .map_err(|e| Error::config("network", format!("failed to create HTTP client: {}", e)))?;

        let proxied = match network.proxy() {
            Some(address) => {
                let proxy = reqwest::Proxy::all(address).map_err(|e| {
                    Error::config("proxy", format!("unusable proxy '{}': {}", address, e))
                })?;
                let client = reqwest::Client::builder()
                    .user_agent(network.user_agent.as_str())
                    .timeout(network.proxy_timeout)
                    .proxy(proxy)
                    .build()
                    .map_err(|e| {
                        Error::config("proxy", format!("failed to create proxied HTTP client: {}", e))
                    })?;
                Some(client)
            }
            None => None,
        };

        Ok(Self { direct, proxied })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &url::Url, route: Route) -> std::result::Result<Vec<u8>, FetchError> {
        let client = match route {
            Route::Direct => &self.direct,
            Route::Proxy => self.proxied.as_ref().ok_or(FetchError::NoProxy)?,
        };

        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn has_proxy(&self) -> bool {
        self.proxied.is_some()
    }
}
