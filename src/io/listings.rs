use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

/// Listing ids from a search results file, in file order.
///
/// Missing or corrupt files yield no ids; callers treat that as "not ready".
pub fn read_listing_ids(path: &Path) -> Vec<String> {
    if !path.is_file() {
        warn!(
            path = %path.display(),
            "search results not found, cannot derive listing ids"
        );
        return Vec::new();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read search results");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(value) => listing_ids_from_value(&value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "malformed search results");
            Vec::new()
        }
    }
}

pub fn listing_ids_from_value(value: &Value) -> Vec<String> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    let mut ids: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = ["room_id", "id"]
            .iter()
            .filter_map(|key| entry.get(*key))
            .find_map(id_string);
        let Some(id) = id else {
            continue;
        };
        if !is_plain_id(&id) {
            warn!(id = %id, "listing id is not a plain file name component, skipped");
            continue;
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Ids end up inside file names, so they must not contain separators or `..`.
pub fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains("..")
        && id.chars().all(|c| c != '/' && c != '\\' && !c.is_control())
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Listing ids that have a `<prefix>_<area>_<id>.json` file in `dir`, sorted.
pub fn scan_listing_files(dir: &Path, prefix: &str, area_key: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let stem_prefix = format!("{}_{}_", prefix, area_key);
    let mut ids: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let id = name.strip_prefix(&stem_prefix)?.strip_suffix(".json")?;
            (!id.is_empty()).then(|| id.to_string())
        })
        .collect();
    ids.sort();
    ids
}
