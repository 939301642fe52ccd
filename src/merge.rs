use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

/// Named input trees, e.g. "body" / "query" / "params".
pub type Sources = HashMap<String, Value>;

/// Combine named sources into one working tree. For each top-level key the
/// first source in `priority` that defines it wins, and its entire subtree
/// comes from that source only — no deep merge, so nested data from
/// different sources never interleaves.
pub fn merge(sources: &Sources, priority: &[String]) -> Value {
    let mut merged = Map::new();
    for name in priority {
        let Some(Value::Object(tree)) = sources.get(name) else {
            continue;
        };
        for (key, value) in tree {
            if !merged.contains_key(key) {
                debug!(source = %name, key = %key, "claimed top-level key");
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}
