/// Markdown document model.
pub mod document;

/// Pure merge of generated content into existing document text.
pub mod merge;

/// Filesystem and stdout boundary.
pub mod writer;

use std::fmt::{Display, Formatter};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use merge::SectionMerger;
pub use writer::write_output;

/// File name that makes `auto` resolve to a section update.
pub static CHANGELOG_FILE_NAME: &str = "changelog.md";

/// How generated content is combined with the target file.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Leave the target untouched
    None,
    /// Replace the whole file
    Overwrite,
    /// Add after the existing content
    Append,
    /// Add before the existing content
    Prepend,
    /// Replace or insert the section named by the version label
    Update,
    /// `update` for changelog files, `overwrite` otherwise
    Auto,
}

impl Display for OutputMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputMode::None => "none",
            OutputMode::Overwrite => "overwrite",
            OutputMode::Append => "append",
            OutputMode::Prepend => "prepend",
            OutputMode::Update => "update",
            OutputMode::Auto => "auto",
        };
        write!(f, "{}", s)
    }
}

impl OutputMode {
    /// Caller-side policy for `Auto`: changelog files get section updates,
    /// everything else is overwritten. Other modes pass through.
    pub fn resolve_auto(self, target: &Path) -> OutputMode {
        if self != OutputMode::Auto {
            return self;
        }
        let is_changelog = target
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.eq_ignore_ascii_case(CHANGELOG_FILE_NAME));
        if is_changelog {
            OutputMode::Update
        } else {
            OutputMode::Overwrite
        }
    }
}
