use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::revision::{CACHED_TOKEN, CURRENT_TOKEN, Pathspec};
use crate::io_utils;

/// Prefix every valid cached summary starts with.
pub static SUMMARY_MARKER: &str = "Commit:";

/// Ignore file dropped into the cache directory so cached Markdown never
/// shows up as untracked working-tree content.
static IGNORE_FILE: &str = ".gitignore";

/// Kinds of per-commit artifacts kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    History,
    Summary,
}

impl CacheKind {
    fn suffix(&self) -> &'static str {
        match self {
            CacheKind::History => "history",
            CacheKind::Summary => "summary",
        }
    }
}

/// Write-once/read store of rendered artifacts keyed by commit.
#[derive(Debug, Clone)]
pub struct HistoryCache {
    dir: PathBuf,
    enabled: bool,
}

impl HistoryCache {
    pub fn new<P: AsRef<Path>>(dir: P, enabled: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            enabled,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    /// Cache file for `commit`, or `None` when the commit is live state that
    /// must never be cached.
    pub fn path_for(&self, commit: &str, paths: &Pathspec, kind: CacheKind) -> Option<PathBuf> {
        if !self.enabled || commit == CURRENT_TOKEN || commit == CACHED_TOKEN {
            return None;
        }
        let key = if paths.is_empty() {
            commit.replace('/', "_")
        } else {
            format!("{}-{:08x}", commit.replace('/', "_"), pathspec_digest(paths))
        };
        Some(self.dir.join(format!("{}-{}.md", key, kind.suffix())))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn read(&self, commit: &str, paths: &Pathspec, kind: CacheKind) -> Option<String> {
        let path = self.path_for(commit, paths, kind)?;
        let content = match io_utils::read_optional(&path).await {
            Ok(content) => content?,
            Err(e) => {
                warn!("Failed to read cache file {:?}: {}", path, e);
                return None;
            }
        };
        if kind == CacheKind::Summary && !content.starts_with(SUMMARY_MARKER) {
            debug!("Cache exists but lacks metadata, removing: {:?}", path);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove stale cache file {:?}: {}", path, e);
            }
            return None;
        }
        debug!("Cache hit for {} at {:?}", commit, path);
        Some(content)
    }

    #[tracing::instrument(level = "trace", skip(self, content))]
    pub async fn write(&self, commit: &str, paths: &Pathspec, kind: CacheKind, content: &str) {
        let Some(path) = self.path_for(commit, paths, kind) else {
            return;
        };
        match io_utils::write_file(&path, content).await {
            Ok(()) => debug!("Cached {:?} for {} at {:?}", kind, commit, path),
            Err(e) => {
                warn!("Failed to cache {:?} for {}: {}", kind, commit, e);
                return;
            }
        }
        self.ensure_ignored().await;
    }

    async fn ensure_ignored(&self) {
        let ignore = self.dir.join(IGNORE_FILE);
        match io_utils::read_optional(&ignore).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(e) = io_utils::write_file(&ignore, "*\n").await {
                    warn!("Failed to write {:?}: {}", ignore, e);
                }
            }
            Err(e) => warn!("Failed to read {:?}: {}", ignore, e),
        }
    }
}

/// Stable digest of the path filters, so filtered and unfiltered renders of
/// the same commit never share a file.
fn pathspec_digest(paths: &Pathspec) -> u32 {
    let joined = paths.as_slice().join("\0");
    murmur3::murmur3_32(&mut Cursor::new(joined.as_bytes()), 0).unwrap_or_default()
}
