use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::cache::{CacheKind, HistoryCache};
use super::diff::DiffAssembler;
use super::resolver::RevisionResolver;
use super::revision::{Pathspec, RevisionSpec};
use super::runner::CommandRunner;
use crate::error::RevisionError;
use crate::time_utils;

/// Read-only facts about one commit reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMetadata {
    pub hash: String,
    pub short_hash: String,
    #[serde(with = "crate::serde_helpers::offset_datetime")]
    pub date: OffsetDateTime,
    pub subject: String,
    pub body: String,
    pub author: String,
    pub branch: String,
}

impl CommitMetadata {
    pub fn date_string(&self) -> String {
        time_utils::date_string(&self.date)
    }
}

/// Renders per-commit Markdown history, reusing cached renders when present.
pub struct HistoryBuilder<'r, R> {
    resolver: &'r RevisionResolver<R>,
    cache: HistoryCache,
}

impl<'r, R: CommandRunner> HistoryBuilder<'r, R> {
    pub fn new(resolver: &'r RevisionResolver<R>, cache: HistoryCache) -> Self {
        Self { resolver, cache }
    }

    /// History of one commit (or live token) as Markdown.
    ///
    /// The cache is keyed by the resolved hash so symbolic names such as
    /// `HEAD` never serve a stale render. Only the part below the heading is
    /// cached; the heading always names `commit` as given.
    #[tracing::instrument(name = "Building commit history", level = "debug", skip(self))]
    pub async fn build_commit_history(
        &self,
        commit: &str,
        paths: &Pathspec,
    ) -> Result<String, RevisionError> {
        let heading = format!("### Commit ID {}", commit);
        let key = self.resolver.cache_key(commit).await;
        if let Some(cached) = self.cache.read(&key, paths, CacheKind::History).await {
            return Ok(format!("{}\n{}", heading, cached));
        }

        let spec = RevisionSpec::parse(commit);
        let meta = self.resolver.commit_metadata(commit).await;
        let base = self.resolver.resolve(&spec, paths).await?;
        let diff = DiffAssembler::new(self.resolver)
            .assemble(base, &spec, paths)
            .await;

        let message = if meta.subject.is_empty() {
            "No commit message"
        } else {
            meta.subject.as_str()
        };
        let mut parts = vec![
            format!("**Date:** {}", meta.date_string()),
            format!("**Message:** {}", message),
        ];
        if !diff.is_empty() {
            let stats = self.resolver.diff_stats(&spec, paths).await;
            if stats.is_empty() {
                parts.push(format!("```diff\n{}\n```", diff.text));
            } else {
                parts.push(format!("```diff\n{}\n{}\n```", diff.text, stats));
            }
        }
        let body = parts.join("\n");

        self.cache.write(&key, paths, CacheKind::History, &body).await;
        Ok(format!("{}\n{}", heading, body))
    }

    /// Histories of every commit the revision expands to, oldest first,
    /// separated by a blank line.
    #[tracing::instrument(name = "Building history", level = "info", skip(self))]
    pub async fn build_history(
        &self,
        revision: &str,
        paths: &Pathspec,
    ) -> Result<String, RevisionError> {
        let commits = self.resolver.parse_commit_list(revision).await?;
        info!("Building history for {} commit(s)", commits.len());
        let mut sections = Vec::with_capacity(commits.len());
        for commit in &commits {
            debug!("Rendering history for {}", commit);
            sections.push(self.build_commit_history(commit, paths).await?);
        }
        Ok(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::ResolverConfig;
    use crate::git::runner::GitRunner;
    use crate::git::runner::fake::FakeRunner;
    use crate::git::testing::{TestRepo, git_available};

    #[tokio::test]
    async fn cache_hit_on_full_hash_skips_git_entirely() {
        let dir = TempDir::new().unwrap();
        let cache = HistoryCache::new(dir.path(), true);
        let paths = Pathspec::default();
        let hash = "0123456789abcdef0123456789abcdef01234567";
        cache
            .write(hash, &paths, CacheKind::History, "**Date:** 2023-11-14\ncached")
            .await;

        let resolver = RevisionResolver::new(FakeRunner::missing_binary(), ResolverConfig::default());
        let history = HistoryBuilder::new(&resolver, cache)
            .build_commit_history(hash, &paths)
            .await
            .unwrap();
        assert_eq!(
            history,
            format!("### Commit ID {}\n**Date:** 2023-11-14\ncached", hash)
        );
        assert!(resolver.runner().calls().is_empty());
    }

    #[tokio::test]
    async fn symbolic_names_follow_the_commit_they_point_at() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        repo.commit("Add one", &[("one.txt", "1\n")]);
        let cache_dir = repo.path().join(".giv/cache");
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());
        let builder = HistoryBuilder::new(&resolver, HistoryCache::new(&cache_dir, true));

        let first = builder
            .build_history("HEAD", &Pathspec::default())
            .await
            .unwrap();
        assert!(first.contains("**Message:** Add one"));

        let c2 = repo.commit("Add two", &[("two.txt", "2\n")]);
        let second = builder
            .build_history("HEAD", &Pathspec::default())
            .await
            .unwrap();
        assert!(second.starts_with("### Commit ID HEAD\n"));
        assert!(second.contains("**Message:** Add two"), "history was: {}", second);
        assert!(!second.contains("Add one"));
        assert!(cache_dir.join(format!("{}-history.md", c2)).exists());
        assert!(!cache_dir.join("HEAD-history.md").exists());
    }

    #[tokio::test]
    async fn empty_diff_omits_code_block() {
        let resolver = RevisionResolver::new(FakeRunner::missing_binary(), ResolverConfig::default());
        let history = HistoryBuilder::new(&resolver, HistoryCache::disabled())
            .build_commit_history("--cached", &Pathspec::default())
            .await
            .unwrap();
        assert!(history.starts_with("### Commit ID --cached\n**Date:** "));
        assert!(history.ends_with("**Message:** No commit message"));
    }

    #[tokio::test]
    async fn cached_histories_stay_out_of_the_working_tree_diff() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        repo.commit("Add one", &[("one.txt", "1\n")]);
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());
        HistoryBuilder::new(&resolver, HistoryCache::new(repo.path().join(".giv/cache"), true))
            .build_history("HEAD", &Pathspec::default())
            .await
            .unwrap();

        let diff = crate::git::resolve_diff(&resolver, "--current", &[]).await.unwrap();
        assert!(!diff.text.contains(".giv"), "diff was: {}", diff.text);
        assert!(!diff.includes_untracked);
    }

    #[tokio::test]
    async fn range_history_renders_and_caches_each_commit() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let c1 = repo.commit("Add one", &[("one.txt", "1\n")]);
        let c2 = repo.commit("Add two", &[("two.txt", "2\n")]);
        let cache_dir = repo.path().join(".giv/cache");
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());
        let builder = HistoryBuilder::new(&resolver, HistoryCache::new(&cache_dir, true));

        let history = builder
            .build_history(&format!("{}..{}", c1, c2), &Pathspec::default())
            .await
            .unwrap();
        let first = history.find(&format!("### Commit ID {}", c1)).unwrap();
        let second = history.find(&format!("### Commit ID {}", c2)).unwrap();
        assert!(first < second);
        // The root base renders its own change, not the later one.
        let root_section = &history[first..second];
        assert!(root_section.contains("one.txt"), "history was: {}", history);
        assert!(!root_section.contains("two.txt"), "history was: {}", history);
        assert!(history.contains("**Message:** Add two"));
        assert!(history.contains("```diff\n"));
        assert!(history.contains("two.txt"));
        assert!(cache_dir.join(format!("{}-history.md", c2)).exists());
    }
}
