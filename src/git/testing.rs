//! Throwaway repositories for tests that exercise the real git binary.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

use crate::config::ResolverConfig;

/// Commit times start here and move forward one minute per commit, so
/// history order is unambiguous.
const BASE_TIME: i64 = 1_700_000_000;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

pub struct TestRepo {
    dir: TempDir,
    repo: Repository,
    commits: Cell<i64>,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp repo");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("init repo");
        Self {
            dir,
            repo,
            commits: Cell::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            repo_path: self.path().to_path_buf(),
            ..ResolverConfig::default()
        }
    }

    /// Write a file into the working tree without staging it.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, content).expect("write file");
        path
    }

    /// Write `files`, stage everything and commit. Returns the full hash.
    pub fn commit(&self, message: &str, files: &[(&str, &str)]) -> String {
        for (name, content) in files {
            self.write(name, content);
        }
        let mut index = self.repo.index().expect("index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("stage files");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");

        let n = self.commits.get();
        self.commits.set(n + 1);
        let sig = Signature::new(
            "Test User",
            "test@example.com",
            &Time::new(BASE_TIME + n * 60, 0),
        )
        .expect("signature");

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .map(|oid| self.repo.find_commit(oid).expect("parent commit"));
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("commit");
        oid.to_string()
    }

    /// Date of every commit made by this fixture (all land on the same UTC day).
    pub fn commit_date_string(&self) -> &'static str {
        "2023-11-14"
    }
}
