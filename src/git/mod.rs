/// On-disk cache of rendered per-commit artifacts.
pub mod cache;

/// Diff results and untracked-file assembly.
pub mod diff;

/// Commit metadata and Markdown history rendering.
pub mod hist;

/// Revision expressions and path filters.
pub mod revision;

pub mod resolver;

/// The process port every git call goes through.
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::HistoryCache;
pub use diff::resolve_diff;
pub use hist::HistoryBuilder;
pub use resolver::RevisionResolver;
pub use revision::Pathspec;
pub use runner::GitRunner;
