use tracing::debug;

use super::OutputMode;
use super::document::{DocumentModel, FenceState, SECTION_MARKER, Section, is_section_heading};
use crate::config::{FooterLink, MergeConfig};
use crate::error::OutputError;

/// Applies an output mode to existing document text. Pure: no I/O.
#[derive(Debug, Clone, Default)]
pub struct SectionMerger {
    config: MergeConfig,
}

/// Join two blocks with exactly one blank line between them.
fn join_blocks(first: &str, second: &str) -> String {
    format!("{}\n\n{}", first.trim_end_matches('\n'), second)
}

/// Second-level headings inside generated content would split the section on
/// the next parse; push them one level down.
fn demote_headings(content: &str) -> String {
    let mut fence = FenceState::default();
    content
        .lines()
        .map(|line| {
            if !fence.step(line) && is_section_heading(line) {
                format!("#{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl SectionMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merge `generated` into `doc_text` according to `mode`.
    ///
    /// `Auto` must already be resolved by the caller.
    #[tracing::instrument(
        name = "Merging generated content",
        level = "debug",
        skip(self, doc_text, generated)
    )]
    pub fn merge(
        &self,
        doc_text: &str,
        mode: OutputMode,
        generated: &str,
        version_label: Option<&str>,
    ) -> Result<String, OutputError> {
        let body = match mode {
            OutputMode::None => return Ok(doc_text.to_string()),
            OutputMode::Auto => return Err(OutputError::UnresolvedAuto),
            OutputMode::Overwrite => generated.to_string(),
            OutputMode::Append => {
                if doc_text.is_empty() {
                    generated.to_string()
                } else {
                    join_blocks(doc_text, generated)
                }
            }
            OutputMode::Prepend => {
                if doc_text.trim().is_empty() {
                    generated.to_string()
                } else {
                    join_blocks(generated, doc_text)
                }
            }
            OutputMode::Update => {
                let label = version_label.unwrap_or(self.config.default_version_label.as_str());
                self.update_section(doc_text, generated, label)
            }
        };
        Ok(self.append_footer(body))
    }

    fn update_section(&self, doc_text: &str, generated: &str, label: &str) -> String {
        let existing = self.detach_footer(doc_text);
        let mut doc = DocumentModel::parse(existing);
        if doc.title.is_none() {
            doc.title = Some(self.config.default_title.clone());
        }

        let content = demote_headings(generated);
        let label = label.trim();
        match doc.find_section_mut(label) {
            Some(section) => {
                debug!("Replacing body of section {}{}", SECTION_MARKER, label);
                section.set_body(&content);
            }
            None => {
                debug!("Inserting new section {}{}", SECTION_MARKER, label);
                doc.insert_first(Section::new(label, &content));
            }
        }
        doc.serialize()
    }

    fn footer(&self) -> Option<&FooterLink> {
        self.config.footer.as_ref()
    }

    /// Strip a managed footer block sitting at the very end of `text`.
    pub fn detach_footer<'t>(&self, text: &'t str) -> &'t str {
        let Some(footer) = self.footer() else {
            return text;
        };
        let block = footer.block();
        let block = block.trim_end();
        let trimmed = text.trim_end();
        match trimmed.strip_suffix(block) {
            Some(rest) => rest,
            None => text,
        }
    }

    /// Add the footer link once. Presence is decided by a literal search for
    /// the rendered link anywhere in the text.
    pub fn append_footer(&self, text: String) -> String {
        let Some(footer) = self.footer() else {
            return text;
        };
        if text.contains(&footer.link()) {
            return text;
        }
        if text.trim().is_empty() {
            return footer.block();
        }
        join_blocks(&text, &footer.block())
    }
}
