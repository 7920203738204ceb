use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub static DEFAULT_TITLE: &str = "# Changelog";
pub static DEFAULT_VERSION_LABEL: &str = "Unreleased";
pub static DEFAULT_FOOTER_TEXT: &str = "Managed by giv";
pub static DEFAULT_FOOTER_URL: &str = "https://github.com/giv-cli/giv";
pub const DEFAULT_CONTEXT_LINES: u32 = 3;

/// Directory, relative to the repository, holding per-commit cache files.
pub static CACHE_SUBDIR: &str = ".giv/cache";

/// Link appended once to every document written through the merger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub text: String,
    pub url: String,
}

impl Default for FooterLink {
    fn default() -> Self {
        Self {
            text: DEFAULT_FOOTER_TEXT.to_string(),
            url: DEFAULT_FOOTER_URL.to_string(),
        }
    }
}

impl FooterLink {
    /// `[text](url)`, the literal searched for when deciding whether to append.
    pub fn link(&self) -> String {
        format!("[{}]({})", self.text, self.url)
    }

    /// The full footer block as written to disk.
    pub fn block(&self) -> String {
        format!("---\n*{}*\n", self.link())
    }
}

/// What the revision resolver needs to talk to git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub repo_path: PathBuf,
    pub context_lines: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// What the section merger needs to shape a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub default_title: String,
    pub default_version_label: String,
    pub footer: Option<FooterLink>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            default_version_label: DEFAULT_VERSION_LABEL.to_string(),
            footer: Some(FooterLink::default()),
        }
    }
}

/// Settings for one CLI invocation, built once from the parsed arguments and
/// handed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub resolver: ResolverConfig,
    pub merge: MergeConfig,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
}

impl Settings {
    pub fn new(repo_path: PathBuf) -> Self {
        let cache_dir = repo_path.join(CACHE_SUBDIR);
        Self {
            resolver: ResolverConfig {
                repo_path,
                ..ResolverConfig::default()
            },
            merge: MergeConfig::default(),
            cache_dir,
            use_cache: true,
        }
    }
}
