use tracing::{debug, warn};

use super::diff::DiffResult;
use super::hist::CommitMetadata;
use super::revision::{CACHED_TOKEN, CURRENT_TOKEN, Pathspec, RevisionSpec, endpoint_or_head};
use super::runner::{CommandOutput, CommandRunner};
use crate::config::ResolverConfig;
use crate::error::{DiffToolError, RevisionError};
use crate::time_utils;

/// Turns revision expressions and path filters into diff text, commit lists
/// and commit metadata by asking git.
#[derive(Debug)]
pub struct RevisionResolver<R> {
    runner: R,
    config: ResolverConfig,
}

/// Tree object of an empty directory in SHA-1 repositories, used when git
/// cannot be asked.
pub static EMPTY_TREE_SHA1: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Whether `token` is already a full object name (SHA-1 or SHA-256).
pub fn is_full_hash(token: &str) -> bool {
    matches!(token.len(), 40 | 64) && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl<R: CommandRunner> RevisionResolver<R> {
    pub fn new(runner: R, config: ResolverConfig) -> Self {
        Self { runner, config }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Common prefix of every diff invocation: fixed context, no `a/`/`b/`
    /// prefixes, no colour.
    fn diff_args(&self) -> Vec<String> {
        vec![
            "--no-pager".to_string(),
            "diff".to_string(),
            format!("--unified={}", self.config.context_lines),
            "--no-prefix".to_string(),
            "--color=never".to_string(),
        ]
    }

    /// Run a non-diff command. Anything but status 0 is treated as no output.
    pub(crate) async fn run_git(&self, args: &[String]) -> String {
        match self.runner.run(args).await {
            Ok(output) if output.success() => output.stdout,
            Ok(CommandOutput {
                stderr, exit_code, ..
            }) => {
                let err = DiffToolError::ExitStatus {
                    code: exit_code,
                    stderr: stderr.trim().to_string(),
                };
                debug!("git {} failed: {}", args.join(" "), err);
                String::new()
            }
            Err(err) => {
                debug!("git {} could not run: {}", args.join(" "), err);
                String::new()
            }
        }
    }

    /// Run a diff command. Status 0 (no differences) and 1 (differences)
    /// are both success; anything else degrades to empty output.
    pub(crate) async fn run_diff(&self, args: &[String]) -> String {
        match self.runner.run(args).await {
            Ok(output) if output.diff_success() => output.stdout,
            Ok(CommandOutput {
                stderr, exit_code, ..
            }) => {
                let err = DiffToolError::ExitStatus {
                    code: exit_code,
                    stderr: stderr.trim().to_string(),
                };
                warn!("git diff failed, treating as no changes: {}", err);
                String::new()
            }
            Err(err) => {
                warn!("git diff could not run, treating as no changes: {}", err);
                String::new()
            }
        }
    }

    /// Whether `token` names a commit. The special live tokens always pass.
    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn is_valid_commit(&self, token: &str) -> bool {
        if token == CURRENT_TOKEN || token == CACHED_TOKEN {
            return true;
        }
        !self.resolve_commit(token).await.is_empty()
    }

    /// Full hash of `token` peeled to a commit, or empty when it does not resolve.
    pub async fn resolve_commit(&self, token: &str) -> String {
        let spec = format!("{}^{{commit}}", token);
        self.run_git(&args(["rev-parse", "--verify", "--quiet", spec.as_str()]))
            .await
            .trim()
            .to_string()
    }

    /// Hash that identifies `token` in caches. Live tokens and tokens git
    /// cannot resolve are kept as given.
    pub async fn cache_key(&self, token: &str) -> String {
        if RevisionSpec::parse(token).is_live() || is_full_hash(token) {
            return token.to_string();
        }
        let hash = self.resolve_commit(token).await;
        if hash.is_empty() {
            token.to_string()
        } else {
            hash
        }
    }

    async fn empty_tree(&self) -> String {
        let hash = self
            .run_git(&args(["hash-object", "-t", "tree", "/dev/null"]))
            .await
            .trim()
            .to_string();
        if hash.is_empty() {
            EMPTY_TREE_SHA1.to_string()
        } else {
            hash
        }
    }

    /// Diff selector for one commit's own change: `rev^!` when it has a
    /// parent, the empty tree against `rev` for a root commit.
    async fn single_commit_selector(&self, rev: &str) -> Vec<String> {
        if !self.resolve_commit(&format!("{}^", rev)).await.is_empty() {
            return vec![format!("{}^!", rev)];
        }
        debug!("{} has no parent, diffing against the empty tree", rev);
        vec![self.empty_tree().await, rev.to_string()]
    }

    async fn validate_endpoints(&self, left: &str, right: &str) -> Result<(), RevisionError> {
        for endpoint in [left, right] {
            let endpoint = endpoint_or_head(endpoint);
            if !self.is_valid_commit(endpoint).await {
                return Err(RevisionError::InvalidEndpoint(endpoint.to_string()));
            }
        }
        Ok(())
    }

    /// Tracked-file diff for a revision. Untracked files are never part of
    /// this result; see [`super::diff::DiffAssembler`].
    #[tracing::instrument(name = "Resolving revision diff", level = "debug", skip(self))]
    pub async fn resolve(
        &self,
        spec: &RevisionSpec,
        paths: &Pathspec,
    ) -> Result<DiffResult, RevisionError> {
        let mut cmd = self.diff_args();
        match spec {
            RevisionSpec::Current => {}
            RevisionSpec::Cached => cmd.push("--cached".to_string()),
            RevisionSpec::Single(rev) => cmd.extend(self.single_commit_selector(rev).await),
            RevisionSpec::RangeTwoDot(left, right) | RevisionSpec::RangeThreeDot(left, right) => {
                self.validate_endpoints(left, right).await?;
                cmd.push(spec.to_string());
            }
        }
        paths.extend_args(&mut cmd);
        let text = self.run_diff(&cmd).await;
        Ok(DiffResult::tracked(text))
    }

    /// Commits of a range, oldest first.
    ///
    /// For two-dot ranges the left endpoint is put at the front when it is
    /// not already listed, so that the base commit's own change is part of
    /// the history.
    #[tracing::instrument(name = "Listing commits in range", level = "debug", skip(self))]
    pub async fn commit_list(&self, spec: &RevisionSpec) -> Result<Vec<String>, RevisionError> {
        let (left, right) = match spec {
            RevisionSpec::RangeTwoDot(left, right) | RevisionSpec::RangeThreeDot(left, right) => {
                (left, right)
            }
            other => return Err(RevisionError::InvalidRevision(other.to_string())),
        };
        self.validate_endpoints(left, right).await?;

        let token = spec.to_string();
        let output = self
            .run_git(&args(["rev-list", "--reverse", token.as_str()]))
            .await;
        let mut commits: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if commits.is_empty() {
            return Ok(commits);
        }

        if let RevisionSpec::RangeTwoDot(..) = spec {
            let base = self.resolve_commit(endpoint_or_head(left)).await;
            if !base.is_empty() && !commits.contains(&base) {
                debug!("Prepending range base {} to commit list", base);
                commits.insert(0, base);
            }
        }
        Ok(commits)
    }

    /// Expand any revision token into the commits to walk. Live tokens come
    /// back as themselves.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn parse_commit_list(&self, token: &str) -> Result<Vec<String>, RevisionError> {
        let spec = RevisionSpec::parse(token);
        match &spec {
            RevisionSpec::Current | RevisionSpec::Cached => Ok(vec![spec.to_string()]),
            RevisionSpec::RangeTwoDot(..) | RevisionSpec::RangeThreeDot(..) => {
                self.commit_list(&spec).await
            }
            RevisionSpec::Single(rev) => {
                if self.is_valid_commit(rev).await {
                    Ok(vec![rev.clone()])
                } else {
                    Err(RevisionError::InvalidRevision(rev.clone()))
                }
            }
        }
    }

    /// Untracked, non-ignored files relative to the working directory.
    /// NUL-separated output keeps non-ASCII names unquoted.
    pub async fn untracked_files(&self) -> Vec<String> {
        self.run_git(&args(["ls-files", "-z", "--others", "--exclude-standard"]))
            .await
            .split('\0')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Diff of one untracked file against an empty baseline, formatted like
    /// any added file.
    pub async fn untracked_diff(&self, file: &str) -> String {
        let full_path = self.config.repo_path.join(file);
        match tokio::fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                debug!("Skipping untracked path {:?}", full_path);
                return String::new();
            }
        }
        let cmd = vec![
            "--no-pager".to_string(),
            "diff".to_string(),
            "--no-prefix".to_string(),
            format!("--unified={}", self.config.context_lines),
            "--no-color".to_string(),
            "--no-index".to_string(),
            "--".to_string(),
            "/dev/null".to_string(),
            file.to_string(),
        ];
        self.run_diff(&cmd).await
    }

    /// `git diff --stat` for the same selection `resolve` would use.
    pub async fn diff_stats(&self, spec: &RevisionSpec, paths: &Pathspec) -> String {
        let mut cmd = args(["--no-pager", "diff", "--stat"]);
        match spec {
            RevisionSpec::Current => {}
            RevisionSpec::Cached => cmd.push("--cached".to_string()),
            RevisionSpec::Single(rev) => cmd.extend(self.single_commit_selector(rev).await),
            range => cmd.push(range.to_string()),
        }
        paths.extend_args(&mut cmd);
        self.run_diff(&cmd).await.trim().to_string()
    }

    /// Read-only metadata for one commit reference. Live tokens describe
    /// `HEAD` with today's date.
    #[tracing::instrument(name = "Reading commit metadata", level = "debug", skip(self))]
    pub async fn commit_metadata(&self, reference: &str) -> CommitMetadata {
        let spec = RevisionSpec::parse(reference);
        let target = spec.metadata_ref().to_string();

        let show = |format: &'static str| {
            let target = target.clone();
            async move {
                self.run_git(&args(["show", "-s", format, target.as_str()]))
                    .await
                    .trim()
                    .to_string()
            }
        };

        let date = if spec.is_live() {
            time_utils::now()
        } else {
            time_utils::parse_iso(&show("--format=%cI").await).unwrap_or_else(time_utils::now)
        };

        CommitMetadata {
            hash: self
                .run_git(&args(["rev-parse", target.as_str()]))
                .await
                .trim()
                .to_string(),
            short_hash: self
                .run_git(&args(["rev-parse", "--short", target.as_str()]))
                .await
                .trim()
                .to_string(),
            date,
            subject: show("--format=%s").await,
            body: show("--format=%B").await,
            author: show("--format=%an").await,
            branch: self
                .run_git(&args(["branch", "--show-current"]))
                .await
                .trim()
                .to_string(),
        }
    }
}
