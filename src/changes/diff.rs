use super::types::{ChangeStatus, FileChange};

/// Header markers observed for the file section currently being scanned.
/// Status is only decided once the whole section has been seen, because
/// e.g. the rename markers arrive as two separate lines.
#[derive(Debug, Default)]
struct HeaderBlock {
    new_file: bool,
    deleted_file: bool,
    rename_from: bool,
    rename_to: bool,
}

impl HeaderBlock {
    fn note(&mut self, line: &str) {
        let lower = line.to_ascii_lowercase();
        if lower.starts_with("new file mode") {
            self.new_file = true;
        } else if lower.starts_with("deleted file mode") {
            self.deleted_file = true;
        } else if lower.starts_with("rename from") {
            self.rename_from = true;
        } else if lower.starts_with("rename to") {
            self.rename_to = true;
        }
    }

    fn status(&self) -> ChangeStatus {
        if self.new_file {
            ChangeStatus::Added
        } else if self.deleted_file {
            ChangeStatus::Removed
        } else if self.rename_from && self.rename_to {
            ChangeStatus::Renamed
        } else {
            ChangeStatus::Modified
        }
    }
}

/// Parse raw unified-diff text (possibly spanning many files) into an
/// ordered list of FileChange, one per `diff --git` section.
///
/// Best-effort by design: unrecognized lines inside a section (binary-file
/// markers, similarity indexes) are treated as opaque headers, and lines
/// before the first section are ignored.
pub fn parse_unified_diff(diff_text: &str) -> Vec<FileChange> {
    let mut files = Vec::new();
    let mut current: Option<FileChange> = None;
    let mut headers = HeaderBlock::default();
    let mut patch_lines: Vec<String> = Vec::new();

    let flush = |files: &mut Vec<FileChange>,
                 current: &mut Option<FileChange>,
                 headers: &mut HeaderBlock,
                 patch_lines: &mut Vec<String>| {
        if let Some(mut file) = current.take() {
            file.status = headers.status();
            file.patch = patch_lines.join("\n");
            files.push(file);
        }
        *headers = HeaderBlock::default();
        patch_lines.clear();
    };

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush(&mut files, &mut current, &mut headers, &mut patch_lines);
            // Tentative path from the b/ side; a later `+++ b/` line wins.
            let b_path = rest
                .split_whitespace()
                .last()
                .map(|token| token.strip_prefix("b/").unwrap_or(token))
                .unwrap_or_default();
            current = Some(FileChange::new(b_path));
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if is_header_line(line) {
            headers.note(line);
            if let Some(path) = line.strip_prefix("+++ b/") {
                file.path = path.to_string();
            }
            continue;
        }

        if line.starts_with("@@")
            || line.starts_with('+')
            || line.starts_with('-')
            || line.starts_with(' ')
        {
            patch_lines.push(line.to_string());
            if line.starts_with('+') && !line.starts_with("+++") {
                file.additions += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                file.deletions += 1;
            }
            continue;
        }

        // Anything else (e.g. "Binary files ... differ") is an opaque header.
        headers.note(line);
    }

    flush(&mut files, &mut current, &mut headers, &mut patch_lines);
    files
}

fn is_header_line(line: &str) -> bool {
    const HEADER_PREFIXES: [&str; 8] = [
        "index ",
        "--- ",
        "+++ ",
        "new file mode",
        "deleted file mode",
        "rename from",
        "rename to",
        "similarity index",
    ];
    HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}
