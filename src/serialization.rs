use crate::flatten::FlatTokens;
use crate::tree::FlatEntry;
use serde_json::{Map, Value};

/// Rebuilds a nested token object from the flat artifact, splitting each
/// dotted key back into a path of nested objects ending in a token entry.
pub(crate) fn to_nested(tokens: &FlatTokens) -> Value {
    let mut root = Map::new();
    for (key, entry) in tokens {
        let segments: Vec<&str> = key.split('.').collect();
        set_nested(&mut root, &segments, entry);
    }
    Value::Object(root)
}

fn set_nested(root: &mut Map<String, Value>, segments: &[&str], entry: &FlatEntry) {
    let Some((last, ancestors)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in ancestors {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        // A token entry and a group can collide at a segment when a flat
        // key is a prefix of another; the group wins.
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(children) = slot else {
            return;
        };
        current = children;
    }
    current.insert(
        (*last).to_string(),
        serde_json::to_value(entry).unwrap_or(Value::Null),
    );
}
