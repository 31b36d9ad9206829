use crate::error::SourceError;
use crate::html::{element_text, resolve_link, selector};
use crate::http::{FetchRequest, Fetcher};
use crate::normalize::{drop_lines, normalize_text};
use crate::source::{Candidate, Source};
use async_trait::async_trait;
use chordfinder_model::{ExtractedText, Query, SourceId};
use scraper::Html;
use std::time::Duration;

const BASE_URL: &str = "https://lacuerda.net";
const TIMEOUT: Duration = Duration::from_secs(10);

/// Song pages are served as Latin-1 regardless of what the headers claim.
const SONG_PAGE_CHARSET: &str = "ISO-8859-1";

/// Branding and disclaimer lines the site puts inside the tab block.
const NOISE_PREFIXES: [&str; 3] = ["lacuerda.net", "ATENCION:", "-------"];

/// lacuerda.net, mostly Spanish-language songs.
pub struct LaCuerda {
    base_url: String,
}

impl Default for LaCuerda {
    fn default() -> Self {
        Self::new()
    }
}

impl LaCuerda {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

/// First link to a tab page inside the results table.
fn find_tab_link(html: &str) -> Result<String, SourceError> {
    let document = Html::parse_document(html);

    let table = document
        .select(&selector("table.tbl"))
        .next()
        .ok_or_else(|| SourceError::not_found("no results table"))?;

    table
        .select(&selector("a[href]"))
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("/tabs/"))
        .map(str::to_string)
        .ok_or_else(|| SourceError::not_found("no tab link in results table"))
}

fn parse_song_page(html: &str) -> Result<String, SourceError> {
    let document = Html::parse_document(html);

    let pre = document
        .select(&selector("pre#tab_content"))
        .next()
        .ok_or_else(|| SourceError::not_found("no tab_content block on song page"))?;

    let text = element_text(pre);
    let text = drop_lines(text.trim(), |line| {
        NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
    });
    Ok(normalize_text(&text))
}

#[async_trait]
impl Source for LaCuerda {
    fn id(&self) -> SourceId {
        SourceId::LaCuerda
    }

    fn search_url(&self, query: &Query) -> String {
        format!("{}/BUSCADOR/index.php?keyword={}", self.base_url, query.url_encoded())
    }

    async fn search(&self, query: &Query, fetcher: &dyn Fetcher) -> Result<Candidate, SourceError> {
        let url = self.search_url(query);
        tracing::info!(url = %url, "Searching LaCuerda.net");
        let page = fetcher.fetch(&FetchRequest::get(url, TIMEOUT)).await?;

        let href = find_tab_link(&page.body)?;
        let song_url = resolve_link(&self.base_url, &href)?;
        tracing::info!(url = %song_url, "Found potential match");
        Ok(Candidate::Link(song_url))
    }

    async fn extract(
        &self,
        candidate: Candidate,
        fetcher: &dyn Fetcher,
    ) -> Result<ExtractedText, SourceError> {
        let page = match candidate {
            Candidate::Link(url) => {
                let request = FetchRequest::get(url, TIMEOUT).charset(SONG_PAGE_CHARSET);
                fetcher.fetch(&request).await?
            }
            // Assumed already decoded; only search results come back as links.
            Candidate::Page(page) => page,
        };

        let text = parse_song_page(&page.body)?;
        if text.is_empty() {
            return Err(SourceError::not_found("tab_content block is empty"));
        }

        Ok(ExtractedText::new(SourceId::LaCuerda, page.final_url, &text))
    }
}
