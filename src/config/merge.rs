//! Option layering
//!
//! Reference options are layered over module manifest defaults with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use pagecheck_plugin::Options;
use serde_json::Value;

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive)
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_options(base_map, overlay_map))
        }

        // Arrays and scalars: REPLACE (no concatenation)
        (_, overlay) => overlay,
    }
}

/// Layer `overlay` options over `base` options.
pub fn merge_options(mut base: Options, overlay: Options) -> Options {
    for (key, overlay_value) in overlay {
        let merged = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
    base
}
