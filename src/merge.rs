use crate::tree::{TokenNode, TokenTree};
use indexmap::map::Entry;

/// Deep-merges `source` into `target` in place.
///
/// Groups present on both sides merge recursively; everything else (token
/// leaves, including array values, which are opaque) is replaced wholesale,
/// so the most recently merged source wins at the leaf level. Merge order
/// across files is the loader's deterministic enumeration order, which makes
/// repeated runs byte-for-byte identical.
pub fn merge(target: &mut TokenTree, source: TokenTree) {
    for (key, incoming) in source {
        match target.entry(key) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (TokenNode::Group(existing), TokenNode::Group(children)) => {
                    merge(existing, children);
                }
                (slot_value, incoming) => *slot_value = incoming,
            },
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
    }
}
