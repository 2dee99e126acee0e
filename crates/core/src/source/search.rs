//! Keyword image search against the Google Custom Search JSON API.

use serde::Deserialize;
use thiserror::Error;

use crate::shared::constants::SEARCH_PAGE_SIZE;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One page of search results: up to 10 image links plus the continuation
/// cursor for the next page, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchPage {
    pub links: Vec<String>,
    pub next_start_index: Option<u32>,
}

/// External search collaborator seam.
pub trait ImageSearchApi {
    fn fetch_page(&self, query: &str, start_index: u32) -> Result<SearchPage, SearchError>;
}

/// Credentials and filters for the search collaborator, scoped to one run.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
    /// Language restrict parameter, e.g. `lang_ja`.
    pub language: Option<String>,
}

/// Production search client over the Custom Search JSON API.
pub struct GoogleImageSearch {
    config: SearchConfig,
    client: reqwest::blocking::Client,
}

impl GoogleImageSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl ImageSearchApi for GoogleImageSearch {
    fn fetch_page(&self, query: &str, start_index: u32) -> Result<SearchPage, SearchError> {
        let num = SEARCH_PAGE_SIZE.to_string();
        let start = start_index.to_string();
        let mut request = self.client.get(SEARCH_ENDPOINT).query(&[
            ("key", self.config.api_key.as_str()),
            ("cx", self.config.engine_id.as_str()),
            ("q", query),
            ("num", num.as_str()),
            ("start", start.as_str()),
            ("searchType", "image"),
        ]);
        if let Some(lr) = &self.config.language {
            request = request.query(&[("lr", lr.as_str())]);
        }

        let body = request.send()?.error_for_status()?.text()?;
        page_from_json(&body)
    }
}

/// Decode one raw API response body into a [`SearchPage`].
///
/// A response without `items` is a valid end-of-results page.
fn page_from_json(body: &str) -> Result<SearchPage, SearchError> {
    #[derive(Deserialize)]
    struct RawResponse {
        items: Option<Vec<RawItem>>,
        queries: Option<RawQueries>,
    }
    #[derive(Deserialize)]
    struct RawItem {
        link: String,
    }
    #[derive(Deserialize)]
    struct RawQueries {
        #[serde(rename = "nextPage")]
        next_page: Option<Vec<RawPageInfo>>,
    }
    #[derive(Deserialize)]
    struct RawPageInfo {
        #[serde(rename = "startIndex")]
        start_index: u32,
    }

    let raw: RawResponse = serde_json::from_str(body)?;
    Ok(SearchPage {
        links: raw
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.link)
            .collect(),
        next_start_index: raw
            .queries
            .and_then(|q| q.next_page)
            .and_then(|pages| pages.first().map(|p| p.start_index)),
    })
}

/// Collect up to `count` image links by paginating the search collaborator.
///
/// The cursor starts at 1 and advances from each page's continuation field.
/// Pagination stops as soon as enough links are collected, a page has no
/// items, or the continuation cursor is absent; at most `ceil(count / 10)`
/// requests are issued and the result is truncated to exactly `count`.
pub fn collect_links(
    api: &dyn ImageSearchApi,
    query: &str,
    count: usize,
) -> Result<Vec<String>, SearchError> {
    let page_limit = count.div_ceil(SEARCH_PAGE_SIZE);
    let mut links = Vec::new();
    let mut start_index = 1;

    for _ in 0..page_limit {
        let page = api.fetch_page(query, start_index)?;
        if page.links.is_empty() {
            break;
        }
        links.extend(page.links);
        if links.len() >= count {
            break;
        }
        match page.next_start_index {
            Some(next) => start_index = next,
            None => break,
        }
    }

    links.truncate(count);
    Ok(links)
}
