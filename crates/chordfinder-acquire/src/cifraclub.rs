use crate::error::SourceError;
use crate::html::{element_text, resolve_link, selector};
use crate::http::{FetchRequest, Fetcher};
use crate::normalize::{drop_lines, normalize_text};
use crate::source::{Candidate, Source};
use async_trait::async_trait;
use chordfinder_model::{ExtractedText, Query, SourceId};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use std::time::Duration;

const BASE_URL: &str = "https://www.cifraclub.com";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const SONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything shorter is an empty placeholder `<pre>`, not a song.
pub const MIN_CONTENT_CHARS: usize = 20;

/// Chord diagram rows and part labels that precede the actual sheet.
static NOISE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\|--.*--\||Tom:|Intro:|Base:|Solo:)").expect("valid regex")
});

/// cifraclub.com, mostly Brazilian songs.
///
/// A good match makes the search endpoint redirect straight to the song
/// page, so the search response may already be the answer.
pub struct CifraClub {
    base_url: String,
}

impl Default for CifraClub {
    fn default() -> Self {
        Self::new()
    }
}

impl CifraClub {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

enum SearchPage {
    SongPage,
    ResultLink(String),
}

fn classify_search_page(html: &str) -> Result<SearchPage, SourceError> {
    let document = Html::parse_document(html);

    if document.select(&selector("pre")).next().is_some() {
        return Ok(SearchPage::SongPage);
    }

    document
        .select(&selector("ol.list-links"))
        .next()
        .and_then(|list| list.select(&selector("a[href]")).next())
        .and_then(|a| a.value().attr("href"))
        .map(|href| SearchPage::ResultLink(href.to_string()))
        .ok_or_else(|| SourceError::not_found("no result link on search page"))
}

fn parse_song_page(html: &str) -> Result<String, SourceError> {
    let document = Html::parse_document(html);

    let pre = document
        .select(&selector("pre"))
        .next()
        .ok_or_else(|| SourceError::not_found("no <pre> block on song page"))?;

    let text = drop_lines(&element_text(pre), |line| NOISE_LINE_RE.is_match(line));
    Ok(normalize_text(&text))
}

#[async_trait]
impl Source for CifraClub {
    fn id(&self) -> SourceId {
        SourceId::CifraClub
    }

    fn search_url(&self, query: &Query) -> String {
        format!("{}/find/?q={}", self.base_url, query.url_encoded())
    }

    async fn search(&self, query: &Query, fetcher: &dyn Fetcher) -> Result<Candidate, SourceError> {
        let url = self.search_url(query);
        tracing::info!(url = %url, "Searching Cifra Club");
        let request = FetchRequest::get(url, SEARCH_TIMEOUT).follow_redirects(true);
        let page = fetcher.fetch(&request).await?;

        match classify_search_page(&page.body)? {
            SearchPage::SongPage => {
                tracing::info!(url = %page.final_url, "Search landed directly on song page");
                Ok(Candidate::Page(page))
            }
            SearchPage::ResultLink(href) => {
                let song_url = resolve_link(&self.base_url, &href)?;
                tracing::info!(url = %song_url, "Found potential match link");
                Ok(Candidate::Link(song_url))
            }
        }
    }

    async fn extract(
        &self,
        candidate: Candidate,
        fetcher: &dyn Fetcher,
    ) -> Result<ExtractedText, SourceError> {
        let page = match candidate {
            Candidate::Link(url) => fetcher.fetch(&FetchRequest::get(url, SONG_TIMEOUT)).await?,
            Candidate::Page(page) => page,
        };

        let text = parse_song_page(&page.body)?;
        let chars = text.chars().count();
        if chars < MIN_CONTENT_CHARS {
            tracing::debug!(chars, "Extracted content too short");
            return Err(SourceError::not_found(format!(
                "extracted content too short ({chars} characters)"
            )));
        }

        Ok(ExtractedText::new(SourceId::CifraClub, page.final_url, &text))
    }
}
