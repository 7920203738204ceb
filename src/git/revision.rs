use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub static CURRENT_TOKEN: &str = "--current";
pub static CACHED_TOKEN: &str = "--cached";

/// A classified revision expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevisionSpec {
    /// Working tree against `HEAD`.
    Current,
    /// Staged changes only.
    Cached,
    /// One commit's own change set.
    Single(String),
    /// `a..b`: commits reachable from `b` but not from `a`.
    RangeTwoDot(String, String),
    /// `a...b`: symmetric difference.
    RangeThreeDot(String, String),
}

impl RevisionSpec {
    /// Classify a raw token. An empty token means the working tree.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() || token == CURRENT_TOKEN {
            return Self::Current;
        }
        if token == CACHED_TOKEN {
            return Self::Cached;
        }
        if let Some((left, right)) = token.split_once("...") {
            return Self::RangeThreeDot(left.to_string(), right.to_string());
        }
        if let Some((left, right)) = token.split_once("..") {
            return Self::RangeTwoDot(left.to_string(), right.to_string());
        }
        Self::Single(token.to_string())
    }

    /// `Current` and `Cached` describe live state rather than history.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Current | Self::Cached)
    }

    /// The commit reference metadata should be read from.
    pub fn metadata_ref(&self) -> &str {
        match self {
            Self::Current | Self::Cached => "HEAD",
            Self::Single(rev) => rev,
            Self::RangeTwoDot(_, right) | Self::RangeThreeDot(_, right) => {
                endpoint_or_head(right)
            }
        }
    }
}

impl Display for RevisionSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "{}", CURRENT_TOKEN),
            Self::Cached => write!(f, "{}", CACHED_TOKEN),
            Self::Single(rev) => write!(f, "{}", rev),
            Self::RangeTwoDot(left, right) => write!(f, "{}..{}", left, right),
            Self::RangeThreeDot(left, right) => write!(f, "{}...{}", left, right),
        }
    }
}

/// git reads an omitted range side as `HEAD`.
pub fn endpoint_or_head(endpoint: &str) -> &str {
    if endpoint.is_empty() { "HEAD" } else { endpoint }
}

/// Ordered path filters; empty means no filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathspec(Vec<String>);

impl Pathspec {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            paths
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Prefix/substring match used for untracked files. Pathspec magic such
    /// as `:(exclude)` is not interpreted here.
    pub fn matches_untracked(&self, file: &str) -> bool {
        self.is_empty()
            || self
                .0
                .iter()
                .any(|pattern| file.starts_with(pattern.as_str()) || file.contains(pattern.as_str()))
    }

    /// Append `-- <paths>` to a git argv when filters are present.
    pub fn extend_args(&self, args: &mut Vec<String>) {
        if !self.is_empty() {
            args.push("--".to_string());
            args.extend(self.0.iter().cloned());
        }
    }
}
