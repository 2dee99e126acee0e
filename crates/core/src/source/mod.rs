//! Input sources: keyword search, URL list file, or local directory.

pub mod search;

use std::path::PathBuf;

use thiserror::Error;

use search::{collect_links, ImageSearchApi, SearchError};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{path} doesn't exist or can't be opened: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image search failed: {0}")]
    SearchFailed(#[from] SearchError),
}

/// Where an item's bytes live before processing.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceRef {
    Remote(String),
    Local(PathBuf),
}

/// One resolved image, owned by the driver for its processing lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageItem {
    pub source_ref: SourceRef,
    pub display_name: String,
}

impl ImageItem {
    fn remote(url: String) -> Self {
        let display_name = url_basename(&url);
        Self {
            source_ref: SourceRef::Remote(url),
            display_name,
        }
    }

    fn local(path: PathBuf) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_ref: SourceRef::Local(path),
            display_name,
        }
    }
}

/// The URL's trailing path segment, used as scratch and output file name.
fn url_basename(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

/// An input source resolving to an ordered sequence of fetchable items.
///
/// Resolution errors are fatal to the run; per-item problems surface later,
/// in the pipeline driver.
pub enum ImageSource {
    Keyword {
        api: Box<dyn ImageSearchApi>,
        query: String,
        count: usize,
    },
    UrlList {
        path: PathBuf,
    },
    Directory {
        path: PathBuf,
    },
}

impl ImageSource {
    pub fn resolve(&self) -> Result<Vec<ImageItem>, SourceError> {
        match self {
            Self::Keyword { api, query, count } => {
                let links = collect_links(api.as_ref(), query, *count)?;
                Ok(links.into_iter().map(ImageItem::remote).collect())
            }
            Self::UrlList { path } => {
                let text =
                    std::fs::read_to_string(path).map_err(|e| SourceError::SourceUnavailable {
                        path: path.clone(),
                        source: e,
                    })?;
                Ok(text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| ImageItem::remote(line.to_string()))
                    .collect())
            }
            Self::Directory { path } => {
                let entries =
                    std::fs::read_dir(path).map_err(|e| SourceError::SourceUnavailable {
                        path: path.clone(),
                        source: e,
                    })?;
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| {
                        entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                    })
                    .map(|entry| entry.path())
                    .collect();
                // Filesystem enumeration order is not guaranteed; sort so
                // output order is deterministic.
                files.sort();
                Ok(files.into_iter().map(ImageItem::local).collect())
            }
        }
    }
}
