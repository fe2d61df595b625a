//! Ubuntu package mirror selection.
//!
//! The chosen mirror is cached in a one-line text file and reused forever,
//! because switching mirrors makes `apt-get` download all package metadata
//! again. Delete the file to pick again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{HostError, Result};

/// Geo-IP aware list of nearby mirrors, best first.
pub const DEFAULT_MIRROR_LIST_URL: &str = "http://mirrors.ubuntu.com/mirrors.txt";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a fresh mirror choice comes from.
pub trait MirrorSource {
    /// Describes the source in errors and logs.
    fn location(&self) -> &str;

    /// The first line of the mirror list.
    fn first_line(&self) -> Result<String>;
}

/// Downloads a mirror list over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMirrorList {
    url: String,
}

impl HttpMirrorList {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for HttpMirrorList {
    fn default() -> Self {
        Self::new(DEFAULT_MIRROR_LIST_URL)
    }
}

impl MirrorSource for HttpMirrorList {
    fn location(&self) -> &str {
        &self.url
    }

    fn first_line(&self) -> Result<String> {
        let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
        let body = agent
            .get(&self.url)
            .call()
            .map_err(|source| HostError::MirrorFetch {
                url: self.url.clone(),
                source: Box::new(source),
            })?
            .into_string()
            .map_err(|source| HostError::MirrorRead {
                url: self.url.clone(),
                source,
            })?;
        Ok(body.lines().next().unwrap_or_default().to_string())
    }
}

/// Picks a mirror once and remembers it.
#[derive(Debug, Clone)]
pub struct MirrorSelector<S = HttpMirrorList> {
    cache_file: PathBuf,
    source: S,
}

impl MirrorSelector<HttpMirrorList> {
    /// Cache under the Redock configuration directory, list from
    /// mirrors.ubuntu.com.
    pub fn from_config() -> Self {
        Self::new(redock_config::mirror_file_path(), HttpMirrorList::default())
    }
}

impl<S: MirrorSource> MirrorSelector<S> {
    pub fn new(cache_file: impl Into<PathBuf>, source: S) -> Self {
        Self {
            cache_file: cache_file.into(),
            source,
        }
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// The cached mirror, resolving and caching one first if needed.
    pub fn select(&self) -> Result<String> {
        if !self.cache_file.is_file() {
            debug!(source = self.source.location(), "Finding nearby Ubuntu package mirror");
            let mirror = self.source.first_line()?.trim().to_string();
            if mirror.is_empty() {
                return Err(HostError::EmptyMirrorList {
                    url: self.source.location().to_string(),
                });
            }
            if let Some(parent) = self.cache_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| HostError::io("create directory", parent, e))?;
            }
            std::fs::write(&self.cache_file, format!("{mirror}\n"))
                .map_err(|e| HostError::io("write", &self.cache_file, e))?;
        }

        let mirror = std::fs::read_to_string(&self.cache_file)
            .map_err(|e| HostError::io("read", &self.cache_file, e))?
            .trim()
            .to_string();
        debug!(%mirror, "Selected Ubuntu package mirror");
        Ok(mirror)
    }
}
