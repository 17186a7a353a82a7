use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::io::listings;

#[derive(Debug, Default)]
pub struct CompSet {
    pub listings: Map<String, Value>,
    pub duplicates_skipped: usize,
}

/// Merges this area's `listing_<area>_<id>.json` objects into one comp set.
///
/// First occurrence of a listing key wins. Unreadable files are skipped.
pub fn compile_comp_set(dir: &Path, area_key: &str) -> CompSet {
    let mut comp_set = CompSet::default();
    for id in listings::scan_listing_files(dir, "listing", area_key) {
        let path = dir.join(format!("listing_{}_{}.json", area_key, id));
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()));
        let object = match parsed {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                warn!(path = %path.display(), "listing file is not a JSON object, skipped");
                continue;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable listing file, skipped");
                continue;
            }
        };
        for (listing_id, details) in object {
            if comp_set.listings.contains_key(&listing_id) {
                comp_set.duplicates_skipped += 1;
            } else {
                comp_set.listings.insert(listing_id, details);
            }
        }
    }
    info!(
        area = area_key,
        listings = comp_set.listings.len(),
        duplicates_skipped = comp_set.duplicates_skipped,
        "comp set compiled"
    );
    comp_set
}
