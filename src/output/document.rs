//! Line-oriented model of a Markdown document made of optional leading lines
//! (YAML front matter, comments, badges), an optional `# ` title, an optional
//! preamble and a list of `## ` sections.
//!
//! Parsing trims blank lines at the edges of every block and serialization
//! puts exactly one blank line after each heading and after each body, so a
//! parse/serialize cycle of its own output is the identity.

/// Marker that opens a section.
pub static SECTION_MARKER: &str = "## ";
/// Marker of the document title.
pub static TITLE_MARKER: &str = "# ";
/// Opening and closing line of a YAML front matter block.
static FRONT_MATTER_MARKER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading line as found in the document, e.g. `## 1.2.0`.
    pub heading: String,
    /// Heading text without the marker, used as the section identity.
    pub label: String,
    pub body: Vec<String>,
}

impl Section {
    pub fn new(label: &str, content: &str) -> Self {
        let label = label.trim();
        let mut section = Self {
            heading: format!("{}{}", SECTION_MARKER, label),
            label: label.to_string(),
            body: Vec::new(),
        };
        section.set_body(content);
        section
    }

    fn from_heading(line: &str) -> Self {
        let label = line[SECTION_MARKER.len()..].trim().to_string();
        // An empty label keeps its trailing space so it still reads as a heading.
        let heading = if label.is_empty() {
            SECTION_MARKER.to_string()
        } else {
            line.trim_end().to_string()
        };
        Self {
            heading,
            label,
            body: Vec::new(),
        }
    }

    /// Replace the body with `content`, trimmed at both ends.
    pub fn set_body(&mut self, content: &str) {
        self.body = content.trim().lines().map(str::to_string).collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentModel {
    /// Lines that precede the title and stay above it.
    pub leading: Vec<String>,
    pub title: Option<String>,
    /// Lines between the title and the first section.
    pub preamble: Vec<String>,
    pub sections: Vec<Section>,
}

/// Tracks fenced code blocks so headings inside them are left alone.
#[derive(Debug, Default)]
pub(crate) struct FenceState {
    open: Option<&'static str>,
}

impl FenceState {
    /// Feed one line; returns true while the line belongs to a fence,
    /// including the fence delimiters themselves.
    pub(crate) fn step(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self.open {
            Some(delim) => {
                if trimmed.starts_with(delim) {
                    self.open = None;
                }
                true
            }
            None => {
                for delim in ["```", "~~~"] {
                    if trimmed.starts_with(delim) {
                        self.open = Some(delim);
                        return true;
                    }
                }
                false
            }
        }
    }
}

fn is_title(line: &str) -> bool {
    line.starts_with(TITLE_MARKER)
}

pub(crate) fn is_section_heading(line: &str) -> bool {
    line.starts_with(SECTION_MARKER)
}

/// Number of lines taken by a YAML front matter block at the very top, or 0.
fn front_matter_len(lines: &[&str]) -> usize {
    if lines.first().is_none_or(|l| l.trim_end() != FRONT_MATTER_MARKER) {
        return 0;
    }
    lines
        .iter()
        .skip(1)
        .position(|l| l.trim_end() == FRONT_MATTER_MARKER)
        .map_or(0, |closing| closing + 2)
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.trim().is_empty()).count();
    lines.drain(..leading);
}

impl DocumentModel {
    pub fn parse(text: &str) -> Self {
        let mut doc = DocumentModel::default();
        let mut fence = FenceState::default();
        let mut current: Option<Section> = None;
        let lines: Vec<&str> = text.lines().collect();

        // A closed front matter block is opaque: its `# ` comments are not titles.
        let body_start = front_matter_len(&lines);
        doc.leading
            .extend(lines[..body_start].iter().map(|l| l.to_string()));

        for &line in &lines[body_start..] {
            let fenced = fence.step(line);
            if !fenced && is_section_heading(line) {
                if let Some(done) = current.take() {
                    doc.sections.push(done);
                }
                current = Some(Section::from_heading(line));
                continue;
            }
            match current.as_mut() {
                Some(section) => section.body.push(line.to_string()),
                None if !fenced && doc.title.is_none() && is_title(line) => {
                    doc.title = Some(line.trim_end().to_string());
                    let before_title = std::mem::take(&mut doc.preamble);
                    doc.leading.extend(before_title);
                }
                None => doc.preamble.push(line.to_string()),
            }
        }
        if let Some(done) = current {
            doc.sections.push(done);
        }

        trim_blank_edges(&mut doc.leading);
        trim_blank_edges(&mut doc.preamble);
        for section in &mut doc.sections {
            trim_blank_edges(&mut section.body);
        }
        doc
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if !self.leading.is_empty() {
            out.push_str(&self.leading.join("\n"));
            out.push_str("\n\n");
        }
        if let Some(title) = &self.title {
            out.push_str(title);
            out.push_str("\n\n");
        }
        if !self.preamble.is_empty() {
            out.push_str(&self.preamble.join("\n"));
            out.push_str("\n\n");
        }
        for section in &self.sections {
            out.push_str(&section.heading);
            out.push_str("\n\n");
            if !section.body.is_empty() {
                out.push_str(&section.body.join("\n"));
                out.push_str("\n\n");
            }
        }
        out
    }

    pub fn find_section_mut(&mut self, label: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.label == label)
    }

    #[cfg(test)]
    pub fn find_section(&self, label: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.label == label)
    }

    /// Put `section` ahead of every existing section, after title and preamble.
    pub fn insert_first(&mut self, section: Section) {
        self.sections.insert(0, section);
    }
}
