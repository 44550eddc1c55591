use std::collections::HashMap;

use super::types::FileChange;

/// Deduplicate file-change records by path, preserving first-seen order.
///
/// The same path can show up several times (once per commit, or once per
/// upstream page); `additions`/`deletions` accumulate and non-empty patch
/// chunks are newline-joined. The first sighting decides the status —
/// later records carrying a different status for the same path are
/// intentionally discarded rather than renegotiated.
pub fn merge_by_path(changes: impl IntoIterator<Item = FileChange>) -> Vec<FileChange> {
    let mut merged: Vec<FileChange> = Vec::new();
    let mut index_by_path: HashMap<String, usize> = HashMap::new();

    for change in changes {
        let path = change.path.trim();
        if path.is_empty() {
            continue;
        }

        match index_by_path.get(path) {
            None => {
                index_by_path.insert(path.to_string(), merged.len());
                merged.push(change);
            }
            Some(&i) => {
                let existing = &mut merged[i];
                existing.additions += change.additions;
                existing.deletions += change.deletions;
                let patch = change.patch.trim();
                if !patch.is_empty() {
                    if existing.patch.is_empty() {
                        existing.patch = patch.to_string();
                    } else {
                        existing.patch.push('\n');
                        existing.patch.push_str(patch);
                    }
                }
            }
        }
    }

    merged
}
