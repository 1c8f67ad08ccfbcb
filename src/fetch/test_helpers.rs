//! Scripted in-memory transport for deterministic fetch and pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::FetchError;

use super::transport::{Route, Transport};

/// One scripted response
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    /// 200 with this body
    Body(Vec<u8>),
    /// Non-success status code
    Status(u16),
}

impl Reply {
    pub(crate) fn text(body: &str) -> Self {
        Reply::Body(body.as_bytes().to_vec())
    }
}

/// Transport answering from per-(url, route) scripts.
///
/// Each call pops the next reply of its script; the last reply repeats once the
/// script is exhausted. Unscripted requests answer 404.
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<(String, Route), VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Route)>>,
    proxy: bool,
}

impl ScriptedTransport {
    pub(crate) fn new(proxy: bool) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            proxy,
        }
    }

    /// Script the replies for `url` over `route`
    pub(crate) fn on(self, url: &str, route: Route, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert((url.to_string(), route), replies.into());
        self
    }

    /// Serve `body` directly for `url`
    pub(crate) fn serve(self, url: &str, body: &str) -> Self {
        self.on(url, Route::Direct, vec![Reply::text(body)])
    }

    /// Number of requests made for `url` over `route`
    pub(crate) fn calls_for(&self, url: &str, route: Route) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, r)| u == url && *r == route)
            .count()
    }

    /// Total number of requests made
    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, url: &str, route: Route) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&(url.to_string(), route)) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap_or(Reply::Status(404)),
            None => Reply::Status(404),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &url::Url, route: Route) -> Result<Vec<u8>, FetchError> {
        if route == Route::Proxy && !self.proxy {
            return Err(FetchError::NoProxy);
        }
        self.calls
            .lock()
            .unwrap()
            .push((url.as_str().to_string(), route));

        match self.next_reply(url.as_str(), route) {
            Reply::Body(body) => Ok(body),
            Reply::Status(status) => Err(FetchError::Status { status }),
        }
    }

    fn has_proxy(&self) -> bool {
        self.proxy
    }
}
