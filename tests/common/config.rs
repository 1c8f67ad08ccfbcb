//! Test configuration helpers and mock HTTP servers

use std::time::Duration;

use asset_localizer::{Config, LocalizeOutcome, LocalizedDocument, Localizer, RetryConfig};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Owner segment used by every test configuration
pub const OWNER: &str = "Alice";

/// Configuration writing into `dir` with short timeouts and near-instant retries
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::new(dir.path());
    config.owner = Some(OWNER.to_string());
    config.network.direct_timeout = Duration::from_secs(5);
    config.network.proxy_timeout = Duration::from_secs(5);
    config.network.retry = RetryConfig {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        ..Default::default()
    };
    config
}

/// Same as [`test_config`], routing proxied requests through `proxy`
pub fn test_config_with_proxy(dir: &TempDir, proxy: &MockServer) -> Config {
    let mut config = test_config(dir);
    config.network.proxy = Some(proxy.uri());
    config
}

/// Serve `body` at `route` on `server`
pub async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Answer `status` at `route` on `server`
pub async fn refuse(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Start a server that plays an HTTP forward proxy answering every request with `body`
///
/// Requests arrive in absolute form, so only the method is matched.
pub async fn start_proxy(body: &[u8]) -> MockServer {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(&proxy)
        .await;
    proxy
}

/// Run `localizer` to completion, failing the test if the run was cancelled
pub async fn localize(localizer: &Localizer, document: &serde_json::Value) -> LocalizedDocument {
    match localizer
        .localize(document, &CancellationToken::new())
        .await
        .unwrap()
    {
        LocalizeOutcome::Completed(done) => done,
        LocalizeOutcome::Cancelled(summary) => panic!("run unexpectedly cancelled: {}", summary),
    }
}
