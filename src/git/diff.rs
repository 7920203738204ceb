use serde::{Deserialize, Serialize};
use tracing::debug;

use super::resolver::RevisionResolver;
use super::revision::{Pathspec, RevisionSpec};
use super::runner::CommandRunner;
use crate::error::RevisionError;

/// Unified diff text produced for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub text: String,
    /// Set when diffs of untracked files were appended to `text`.
    pub includes_untracked: bool,
}

impl DiffResult {
    pub fn tracked(text: String) -> Self {
        Self {
            text,
            includes_untracked: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Join two diff halves with a single newline, skipping the separator when
/// either side is empty.
fn join_halves(tracked: String, untracked: String) -> String {
    match (tracked.is_empty(), untracked.is_empty()) {
        (_, true) => tracked,
        (true, false) => untracked,
        (false, false) => format!("{}\n{}", tracked, untracked),
    }
}

/// Extends a tracked-file diff with untracked files when the revision is the
/// live working tree.
pub struct DiffAssembler<'r, R> {
    resolver: &'r RevisionResolver<R>,
}

impl<'r, R: CommandRunner> DiffAssembler<'r, R> {
    pub fn new(resolver: &'r RevisionResolver<R>) -> Self {
        Self { resolver }
    }

    #[tracing::instrument(name = "Assembling diff", level = "debug", skip(self, base))]
    pub async fn assemble(
        &self,
        base: DiffResult,
        spec: &RevisionSpec,
        paths: &Pathspec,
    ) -> DiffResult {
        if *spec != RevisionSpec::Current {
            return base;
        }

        let files = self.resolver.untracked_files().await;
        let mut untracked = Vec::new();
        for file in files.iter().filter(|f| paths.matches_untracked(f)) {
            let diff = self.resolver.untracked_diff(file).await;
            if !diff.is_empty() {
                untracked.push(diff);
            }
        }
        debug!(
            "Appending {} untracked file diff(s) out of {} untracked file(s)",
            untracked.len(),
            files.len()
        );

        let includes_untracked = base.includes_untracked || !untracked.is_empty();
        DiffResult {
            text: join_halves(base.text, untracked.join("\n")),
            includes_untracked,
        }
    }
}

/// Resolve a raw revision token and path list into the full diff, untracked
/// files included for the working tree.
#[tracing::instrument(name = "Resolving diff", level = "info", skip(resolver))]
pub async fn resolve_diff<R: CommandRunner>(
    resolver: &RevisionResolver<R>,
    revision_token: &str,
    paths: &[String],
) -> Result<DiffResult, RevisionError> {
    let spec = RevisionSpec::parse(revision_token);
    let paths = Pathspec::new(paths.iter().cloned());
    let base = resolver.resolve(&spec, &paths).await?;
    Ok(DiffAssembler::new(resolver).assemble(base, &spec, &paths).await)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ResolverConfig;
    use crate::git::runner::GitRunner;
    use crate::git::runner::fake::{FakeRunner, ok};
    use crate::git::testing::{TestRepo, git_available};

    #[test]
    fn halves_join_without_stray_separator() {
        assert_eq!(join_halves("a".into(), "".into()), "a");
        assert_eq!(join_halves("".into(), "b".into()), "b");
        assert_eq!(join_halves("a".into(), "b".into()), "a\nb");
        assert_eq!(join_halves("".into(), "".into()), "");
    }

    #[tokio::test]
    async fn non_current_revisions_skip_untracked_lookup() {
        let resolver = RevisionResolver::new(
            FakeRunner::new(|_| Some(ok("stray.txt\n"))),
            ResolverConfig::default(),
        );
        let assembler = DiffAssembler::new(&resolver);
        let base = DiffResult::tracked("tracked".into());
        for spec in [
            RevisionSpec::Cached,
            RevisionSpec::Single("HEAD".into()),
            RevisionSpec::parse("a..b"),
        ] {
            let out = assembler.assemble(base.clone(), &spec, &Pathspec::default()).await;
            assert_eq!(out, base);
        }
        assert!(resolver.runner().calls().is_empty());
    }

    #[tokio::test]
    async fn current_always_lists_untracked_files() {
        let resolver = RevisionResolver::new(
            FakeRunner::new(|_| Some(ok(""))),
            ResolverConfig::default(),
        );
        let out = DiffAssembler::new(&resolver)
            .assemble(DiffResult::default(), &RevisionSpec::Current, &Pathspec::default())
            .await;
        assert!(out.is_empty());
        assert!(!out.includes_untracked);
        assert_eq!(
            resolver.runner().calls(),
            vec![vec!["ls-files", "-z", "--others", "--exclude-standard"]]
        );
    }

    #[tokio::test]
    async fn untracked_file_content_is_appended() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        repo.commit("init", &[("tracked.txt", "one\n")]);
        repo.write("tracked.txt", "one\ntwo\n");
        repo.write("new.txt", "hello");
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());

        let diff = resolve_diff(&resolver, "--current", &[]).await.unwrap();
        assert!(diff.includes_untracked);
        assert!(diff.text.contains("+hello"), "diff was: {}", diff.text);
        assert!(diff.text.contains("+two"), "diff was: {}", diff.text);
        let tracked_at = diff.text.find("tracked.txt").unwrap();
        let untracked_at = diff.text.find("new.txt").unwrap();
        assert!(tracked_at < untracked_at);
    }

    #[tokio::test]
    async fn untracked_names_arrive_unquoted() {
        let resolver = RevisionResolver::new(
            FakeRunner::new(|_| Some(ok("caf\u{e9}.txt\0dir/with space.md\0"))),
            ResolverConfig::default(),
        );
        assert_eq!(
            resolver.untracked_files().await,
            vec!["caf\u{e9}.txt", "dir/with space.md"]
        );
    }

    #[tokio::test]
    async fn non_ascii_untracked_file_is_diffed() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        repo.commit("init", &[("README.md", "readme\n")]);
        repo.write("caf\u{e9}.txt", "hello");
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());

        let diff = resolve_diff(&resolver, "--current", &[]).await.unwrap();
        assert!(diff.includes_untracked);
        assert!(diff.text.contains("+hello"), "diff was: {}", diff.text);
    }

    #[tokio::test]
    async fn untracked_files_respect_pathspec() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        repo.commit("init", &[("README.md", "readme\n")]);
        repo.write("src/new.rs", "fn added() {}\n");
        repo.write("docs/guide.md", "guide\n");
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());

        let diff = resolve_diff(&resolver, "--current", &["src".to_string()])
            .await
            .unwrap();
        assert!(diff.text.contains("src/new.rs"));
        assert!(!diff.text.contains("guide.md"));
    }

    #[tokio::test]
    async fn cached_never_contains_untracked_content() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        repo.commit("init", &[("README.md", "readme\n")]);
        repo.write("new.txt", "hello");
        let resolver = RevisionResolver::new(GitRunner::new(repo.path()), repo.resolver_config());

        let diff = resolve_diff(&resolver, "--cached", &[]).await.unwrap();
        assert!(!diff.includes_untracked);
        assert!(!diff.text.contains("hello"));
    }
}
