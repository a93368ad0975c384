//! Sort the global list inside its `## section:` blocks.

const SECTION_PREFIX: &str = "## section:";

#[derive(Debug, Default)]
struct Section {
    /// Text after the prefix; `None` for lines before the first heading.
    name: Option<String>,
    /// (declaration line, comment lines attached above it)
    entries: Vec<(String, Vec<String>)>,
}

/// Entries are sorted case-insensitively within each section; a comment
/// block travels with the declaration that follows it. Blank lines are
/// dropped and sections are re-emitted one blank line apart.
pub fn sort_sections(content: &str) -> String {
    let mut sections: Vec<Section> = vec![Section::default()];
    let mut current = 0;
    let mut pending: Vec<String> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix(SECTION_PREFIX) {
            // A re-opened section is merged into its first occurrence.
            let existing = sections
                .iter()
                .position(|s| s.name.as_deref() == Some(name));
            current = match existing {
                Some(idx) => idx,
                None => {
                    sections.push(Section {
                        name: Some(name.to_string()),
                        entries: Vec::new(),
                    });
                    sections.len() - 1
                }
            };
            continue;
        }
        if line.starts_with('#') {
            pending.push(line.to_string());
            continue;
        }
        sections[current]
            .entries
            .push((line.to_string(), std::mem::take(&mut pending)));
    }
    if !pending.is_empty() {
        // Trailing comments with nothing below them stay at the end.
        sections[current].entries.push((String::new(), pending));
    }

    let mut out = String::new();
    let mut first = true;
    for section in sections.iter_mut() {
        if section.name.is_none() && section.entries.is_empty() {
            continue;
        }
        section
            .entries
            .sort_by_cached_key(|(line, _)| (line.is_empty(), line.to_lowercase()));
        if !first {
            out.push('\n');
        }
        first = false;
        if let Some(name) = &section.name {
            out.push_str(SECTION_PREFIX);
            out.push_str(name);
            out.push('\n');
        }
        for (line, comments) in &section.entries {
            for comment in comments {
                out.push_str(comment);
                out.push('\n');
            }
            if !line.is_empty() {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_within_sections() {
        let input = "\
## section: core
zeta>=1
# needed by alpha
Alpha>=2

## section: test
mock
coverage>=4
";
        assert_eq!(
            sort_sections(input),
            "## section: core\n# needed by alpha\nAlpha>=2\nzeta>=1\n\n## section: test\ncoverage>=4\nmock\n"
        );
    }

    #[test]
    fn reopened_sections_are_merged() {
        let input = "## section:a\nb\n## section:c\nz\n## section:a\na\n";
        assert_eq!(sort_sections(input), "## section:a\na\nb\n\n## section:c\nz\n");
    }

    #[test]
    fn lines_before_any_heading_are_kept_first() {
        let input = "b\na\n## section:x\nq\n# trailing\n";
        assert_eq!(sort_sections(input), "a\nb\n\n## section:x\nq\n# trailing\n");
    }

    #[test]
    fn sorting_is_idempotent() {
        let input = "## section:x\nB\na\n# c-comment\nC\n";
        let once = sort_sections(input);
        assert_eq!(sort_sections(&once), once);
    }
}
