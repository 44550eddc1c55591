use serde_json::Value;
use tracing::debug;

use super::types::{ChangeStatus, FileChange};

/// Envelope keys probed, in priority order, when the response is a map
/// rather than a bare list.
const ITEM_KEYS: [&str; 5] = ["files", "data", "items", "pull_request_files", "changed_files"];

/// Locate the nested list of raw file/item records inside a response
/// envelope of unknown shape.
///
/// Never fails: an unrecognized shape is indistinguishable from "no data"
/// for the callers, so it yields an empty slice.
pub fn extract_file_items(plain: &Value) -> &[Value] {
    if let Value::Array(items) = plain {
        return items;
    }
    if let Value::Object(map) = plain {
        for key in ITEM_KEYS {
            match map.get(key) {
                Some(Value::Array(items)) => return items,
                Some(Value::Object(inner)) => {
                    if let Some(Value::Array(items)) = inner.get("files") {
                        return items;
                    }
                }
                _ => {}
            }
        }
    }
    debug!("no recognizable file list in response envelope");
    &[]
}

/// Normalize raw upstream file records into FileChange. Records that are
/// not objects or carry no usable path are dropped.
pub fn normalize_files(items: &[Value]) -> Vec<FileChange> {
    let mut normalized = Vec::new();
    for item in items {
        let Value::Object(map) = item else {
            continue;
        };
        let path = map
            .get("filename")
            .or_else(|| map.get("path"))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if path.is_empty() {
            continue;
        }
        normalized.push(FileChange {
            path: path.to_string(),
            status: map
                .get("status")
                .and_then(Value::as_str)
                .map(ChangeStatus::from_upstream)
                .unwrap_or_default(),
            additions: count_field(map.get("additions")),
            deletions: count_field(map.get("deletions")),
            patch: map
                .get("patch")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    normalized
}

fn count_field(value: Option<&Value>) -> usize {
    value.and_then(Value::as_u64).unwrap_or(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_bare_list() {
        let plain = json!([{"filename": "a.rs"}]);
        assert_eq!(extract_file_items(&plain).len(), 1);
    }

    #[test]
    fn test_extract_probes_envelope_keys_in_order() {
        let plain = json!({"data": [{"filename": "a.rs"}, {"filename": "b.rs"}]});
        assert_eq!(extract_file_items(&plain).len(), 2);

        let plain = json!({"changed_files": [{"filename": "a.rs"}]});
        assert_eq!(extract_file_items(&plain).len(), 1);
    }

    #[test]
    fn test_extract_nested_files_under_envelope_key() {
        // compare-commits style: {"data": {"files": [...]}}
        let plain = json!({"data": {"files": [{"filename": "a.rs"}]}});
        assert_eq!(extract_file_items(&plain).len(), 1);
    }

    #[test]
    fn test_unknown_shape_yields_empty() {
        assert!(extract_file_items(&json!({"unrelated": 1})).is_empty());
        assert!(extract_file_items(&json!("just a string")).is_empty());
        assert!(extract_file_items(&Value::Null).is_empty());
    }

    #[test]
    fn test_normalize_maps_fields() {
        let items = vec![json!({
            "filename": "src/lib.rs",
            "status": "added",
            "additions": 10,
            "deletions": 2,
            "patch": "@@ -0,0 +1,10 @@"
        })];
        let files = normalize_files(&items);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/lib.rs");
        assert_eq!(files[0].status, ChangeStatus::Added);
        assert_eq!(files[0].additions, 10);
        assert_eq!(files[0].deletions, 2);
        assert_eq!(files[0].patch, "@@ -0,0 +1,10 @@");
    }

    #[test]
    fn test_normalize_accepts_path_alias_and_defaults() {
        let items = vec![json!({"path": "docs/readme.md"})];
        let files = normalize_files(&items);
        assert_eq!(files[0].path, "docs/readme.md");
        assert_eq!(files[0].status, ChangeStatus::Modified);
        assert_eq!(files[0].additions, 0);
        assert_eq!(files[0].deletions, 0);
        assert!(files[0].patch.is_empty());
    }

    #[test]
    fn test_normalize_drops_unusable_records() {
        let items = vec![
            json!("not an object"),
            json!({"filename": "   "}),
            json!({"status": "added"}),
            json!({"filename": "kept.rs"}),
        ];
        let files = normalize_files(&items);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "kept.rs");
    }
}
