use crate::error::SourceError;
use crate::html::{resolve_link, selector};
use crate::http::{FetchRequest, Fetcher};
use crate::normalize::{normalize_text, strip_ug_markup};
use crate::source::{Candidate, Source};
use async_trait::async_trait;
use chordfinder_model::{ExtractedText, Query, SourceId};
use regex::Regex;
use scraper::Html;
use serde_json::{json, Value};
use std::sync::LazyLock;
use std::time::Duration;

const BASE_URL: &str = "https://www.ultimate-guitar.com";
const TIMEOUT: Duration = Duration::from_secs(15);

static STORE_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.UGAPP\.store\.page\s*=\s*(\{.*?\});").expect("valid regex")
});

/// Places the tab text has been seen under, relative to `store.page.data`,
/// in the order they are tried.
const TAB_CONTENT_PATHS: [fn(&Value) -> Option<&str>; 3] =
    [wiki_tab_content, tab_text, tab_view_content];

fn wiki_tab_content(data: &Value) -> Option<&str> {
    non_empty_str(data, "/tab_view/wiki_tab/content")
}

fn tab_text(data: &Value) -> Option<&str> {
    non_empty_str(data, "/tab/text")
}

fn tab_view_content(data: &Value) -> Option<&str> {
    non_empty_str(data, "/tab_view/content")
}

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// ultimate-guitar.com.
///
/// Both the search page and the tab page are server-rendered shells around
/// a JSON store; everything of interest is read from that JSON.
pub struct UltimateGuitar {
    base_url: String,
}

impl Default for UltimateGuitar {
    fn default() -> Self {
        Self::new()
    }
}

impl UltimateGuitar {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

/// Find the page store JSON.
///
/// Prefers the `data-content` attribute of `div.js-store`. Older pages
/// assign the page object in an inline script instead; that object is
/// wrapped back into `{"store": {"page": ...}}` so callers see one shape.
fn locate_store(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);

    let attr = document
        .select(&selector("div.js-store"))
        .filter_map(|div| div.value().attr("data-content"))
        .find(|content| !content.is_empty());

    if let Some(content) = attr {
        return match serde_json::from_str(content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "js-store data-content is not valid JSON");
                None
            }
        };
    }

    let script = document
        .select(&selector("script"))
        .map(|s| s.text().collect::<String>())
        .find(|text| text.contains("window.UGAPP.store.page"))?;

    let captures = STORE_SCRIPT_RE.captures(&script)?;
    match serde_json::from_str::<Value>(&captures[1]) {
        Ok(page) => Some(json!({ "store": { "page": page } })),
        Err(e) => {
            tracing::debug!(error = %e, "UGAPP store script is not valid JSON");
            None
        }
    }
}

#[async_trait]
impl Source for UltimateGuitar {
    fn id(&self) -> SourceId {
        SourceId::UltimateGuitar
    }

    fn search_url(&self, query: &Query) -> String {
        format!(
            "{}/search.php?search_type=title&value={}",
            self.base_url,
            query.url_encoded()
        )
    }

    async fn search(&self, query: &Query, fetcher: &dyn Fetcher) -> Result<Candidate, SourceError> {
        let url = self.search_url(query);
        tracing::info!(url = %url, "Searching Ultimate Guitar");
        let page = fetcher.fetch(&FetchRequest::get(url, TIMEOUT)).await?;

        let store = locate_store(&page.body)
            .ok_or_else(|| SourceError::parse("could not locate/parse search JSON"))?;

        let results = store
            .pointer("/store/page/data/results")
            .and_then(Value::as_array)
            .filter(|results| !results.is_empty())
            .ok_or_else(|| SourceError::not_found(format!("no results found for '{query}'")))?;

        tracing::debug!(results = results.len(), "Parsed search results");

        let tab_url = results
            .iter()
            .filter(|r| r.get("type").and_then(Value::as_str) == Some("Chords"))
            .find_map(|r| non_empty_str(r, "/tab_url"))
            .ok_or_else(|| SourceError::not_found(format!("no 'Chords' tab found for '{query}'")))?;

        tracing::info!(url = %tab_url, "Found Chords tab");
        Ok(Candidate::Link(resolve_link(&self.base_url, tab_url)?))
    }

    async fn extract(
        &self,
        candidate: Candidate,
        fetcher: &dyn Fetcher,
    ) -> Result<ExtractedText, SourceError> {
        let page = match candidate {
            Candidate::Link(url) => fetcher.fetch(&FetchRequest::get(url, TIMEOUT)).await?,
            // Our own search never yields this, but a caller may hand over a tab page it already has.
            Candidate::Page(page) => page,
        };

        let store = locate_store(&page.body)
            .ok_or_else(|| SourceError::parse("could not locate/parse tab JSON"))?;

        let data = store
            .pointer("/store/page/data")
            .filter(|data| data.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| SourceError::parse("could not find data object in tab JSON"))?;

        let content = TAB_CONTENT_PATHS
            .iter()
            .find_map(|path| path(data))
            .ok_or_else(|| SourceError::not_found("no tab content"))?;

        let text = normalize_text(&strip_ug_markup(content));
        if text.is_empty() {
            return Err(SourceError::not_found("no tab content"));
        }

        Ok(ExtractedText::new(SourceId::UltimateGuitar, page.final_url, &text))
    }
}
