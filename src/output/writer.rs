use std::path::Path;

use tracing::{error, info, warn};

use super::OutputMode;
use super::merge::SectionMerger;
use crate::error::OutputError;
use crate::io_utils;

/// Compute the new text for `path` without writing it.
async fn render(
    merger: &SectionMerger,
    path: &Path,
    mode: OutputMode,
    content: &str,
    version_label: Option<&str>,
    dry_run: bool,
) -> Result<String, OutputError> {
    let existing = match io_utils::read_optional(path).await {
        Ok(existing) => existing.unwrap_or_default(),
        Err(source) if dry_run => {
            warn!("Unable to read {:?} during dry run, assuming empty: {}", path, source);
            String::new()
        }
        Err(source) => {
            return Err(OutputError::ReadFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    merger.merge(&existing, mode, content, version_label)
}

/// Write generated `content` to `path` using `mode`, or to stdout when no
/// path is given (mode and version label are then ignored).
///
/// The new text is fully computed before a single write. Returns `false`
/// when reading or writing the target fails.
#[tracing::instrument(
    name = "Writing output",
    level = "info",
    skip(merger, content)
)]
pub async fn write_output(
    merger: &SectionMerger,
    path: Option<&Path>,
    mode: OutputMode,
    content: &str,
    version_label: Option<&str>,
    dry_run: bool,
) -> bool {
    let Some(path) = path else {
        if dry_run {
            println!("Dry run: would write to stdout:");
        }
        println!("{}", content);
        return true;
    };

    if mode == OutputMode::None {
        info!("Output mode is none; {} left untouched", path.display());
        return true;
    }

    let mode = mode.resolve_auto(path);
    let rendered = match render(merger, path, mode, content, version_label, dry_run).await {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    if dry_run {
        info!("Dry run: {} not modified", path.display());
        println!(
            "Dry run: would write to {} using mode '{}'",
            path.display(),
            mode
        );
        println!("Content:");
        println!("{}", rendered);
        return true;
    }

    match io_utils::write_file(path, &rendered).await {
        Ok(()) => {
            info!("Output written to {} ({} mode)", path.display(), mode);
            true
        }
        Err(source) => {
            let e = OutputError::WriteFailed {
                path: path.to_path_buf(),
                source,
            };
            error!("{}", e);
            false
        }
    }
}
