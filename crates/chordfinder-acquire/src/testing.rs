//! In-memory fetcher and page builders for tests.

use crate::error::FetchError;
use crate::http::{FetchRequest, FetchResult, Fetcher};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned responses keyed by request URL and records every request.
/// Unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, Result<FetchResult, FetchError>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.redirect(url, url, body)
    }

    /// `url` answers with `body` as if redirected to `final_url`.
    pub fn redirect(mut self, url: &str, final_url: &str, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Ok(FetchResult {
                body: body.to_string(),
                final_url: final_url.to_string(),
            }),
        );
        self
    }

    pub fn fail(mut self, url: &str, err: FetchError) -> Self {
        self.routes.insert(url.to_string(), Err(err));
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.routes
            .get(&request.url)
            .cloned()
            .unwrap_or(Err(FetchError::HttpStatus { code: 404 }))
    }
}

/// An Ultimate Guitar style page carrying `store` in a `js-store` div.
pub fn ug_store_page(store: &Value) -> String {
    let escaped = store
        .to_string()
        .replace('&', "&amp;")
        .replace('"', "&quot;");
    format!(
        "<html><body><div class=\"js-store\" data-content=\"{escaped}\"></div></body></html>"
    )
}

/// Ultimate Guitar search store with the given `results` array.
pub fn ug_search_store(results: Value) -> Value {
    serde_json::json!({ "store": { "page": { "data": { "results": results } } } })
}

/// Ultimate Guitar tab store with `data` as the page data object.
pub fn ug_tab_store(data: Value) -> Value {
    serde_json::json!({ "store": { "page": { "data": data } } })
}
