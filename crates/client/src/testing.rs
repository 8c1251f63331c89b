//! Scripted network double for tests.
//!
//! Enabled for this crate's own tests and, through the `test` feature, for
//! downstream crates' tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::fetch::Network;
use shellcache_core::{AssetResponse, Error, Request, ResponseType};

/// Origin the scripted network treats as same-origin.
pub const TEST_ORIGIN: &str = "https://app.example.com";

enum Route {
    Respond(AssetResponse),
    Fail(String),
}

/// In-memory [`Network`] answering from scripted routes.
///
/// A URL without an exact route falls back to the route for the same URL
/// minus its query. Anything else answers 404. Every call is recorded by URL.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Absolute URL string for a path on [`TEST_ORIGIN`], or the input unchanged.
pub fn test_url(target: &str) -> String {
    if target.starts_with('/') { format!("{TEST_ORIGIN}{target}") } else { target.to_string() }
}

/// GET request for a path on [`TEST_ORIGIN`] or an absolute URL.
pub fn test_request(target: &str) -> Request {
    Request::get(Url::parse(&test_url(target)).unwrap_or_else(|e| panic!("bad test url {target}: {e}")))
}

/// A response as [`ScriptedNetwork`] would produce it for `target`.
pub fn test_response(target: &str, status: u16, body: &str) -> AssetResponse {
    let url = test_url(target);
    let response_type = if url.starts_with(TEST_ORIGIN) { ResponseType::Basic } else { ResponseType::Cors };
    AssetResponse {
        url,
        status,
        status_text: String::new(),
        response_type,
        headers: vec![("content-type".into(), "text/plain".into())],
        body: Bytes::from(body.to_string()),
    }
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `target` with the given status and body.
    pub fn respond(&self, target: &str, status: u16, body: &str) {
        self.respond_with(target, test_response(target, status, body));
    }

    pub fn respond_with(&self, target: &str, response: AssetResponse) {
        lock(&self.routes).insert(test_url(target), Route::Respond(response));
    }

    /// Reject requests for `target` with a network error.
    pub fn fail(&self, target: &str) {
        lock(&self.routes).insert(test_url(target), Route::Fail(format!("connection reset: {target}")));
    }

    /// Reject every request while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total number of fetches.
    pub fn calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of fetches for `target`.
    pub fn calls_to(&self, target: &str) -> usize {
        let url = test_url(target);
        lock(&self.calls).iter().filter(|c| **c == url).count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<AssetResponse, Error> {
        let url = request.url.to_string();
        lock(&self.calls).push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let routes = lock(&self.routes);
        let route = routes.get(&url).or_else(|| {
            let mut bare = request.url.clone();
            bare.set_query(None);
            routes.get(bare.as_str())
        });

        match route {
            Some(Route::Respond(response)) => Ok(response.clone()),
            Some(Route::Fail(reason)) => Err(Error::Network(reason.clone())),
            None => Ok(test_response(&url, 404, "not found")),
        }
    }
}
