use crate::color::normalize_color;
use crate::error::ResolveError;
use crate::expr;
use crate::resolver::{Resolver, Visited};
use crate::tree::{FlatEntry, RawValue, TokenNode, TokenTree, TokenValue};
use std::collections::BTreeMap;

/// The flat artifact mapping. Ordered, so serialization is byte-identical
/// across runs.
pub type FlatTokens = BTreeMap<String, FlatEntry>;

/// A token that failed to resolve and was left out of the artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedToken {
    pub path: String,
    pub error: ResolveError,
}

/// Depth-first flattening of `tree`: every leaf is resolved through
/// `resolver` (references and expressions resolve against the resolver's
/// tree) and written under its flattened path, the ancestor keys joined
/// with `.` and lowercased. Color-tagged string values are normalized on
/// the way out. Entries already present in `out` are overwritten, which is
/// how alias-derived entries win over core entries.
///
/// A token that fails to resolve is omitted and logged; its siblings are
/// unaffected.
pub fn flatten_into(
    tree: &TokenTree,
    resolver: &mut Resolver<'_>,
    out: &mut FlatTokens,
    skipped: &mut Vec<SkippedToken>,
) {
    let mut ancestors = vec![resolver.namespace().to_string()];
    walk(tree, resolver, &mut ancestors, out, skipped);
}

fn walk(
    tree: &TokenTree,
    resolver: &mut Resolver<'_>,
    ancestors: &mut Vec<String>,
    out: &mut FlatTokens,
    skipped: &mut Vec<SkippedToken>,
) {
    for (key, node) in tree {
        ancestors.push(key.clone());
        match node {
            TokenNode::Group(children) => walk(children, resolver, ancestors, out, skipped),
            TokenNode::Leaf(leaf) => {
                emit(&leaf.value, leaf.tag.as_deref(), resolver, ancestors, out, skipped);
            }
        }
        ancestors.pop();
    }
}

fn emit(
    value: &RawValue,
    tag: Option<&str>,
    resolver: &mut Resolver<'_>,
    ancestors: &mut Vec<String>,
    out: &mut FlatTokens,
    skipped: &mut Vec<SkippedToken>,
) {
    // Composite tokens fan out into one entry per sub-member, the sub-key
    // becoming the final path segment.
    if let RawValue::Composite(children) = value {
        for (sub_key, sub_value) in children {
            ancestors.push(sub_key.clone());
            emit(sub_value, tag, resolver, ancestors, out, skipped);
            ancestors.pop();
        }
        return;
    }

    let key = flat_key(ancestors);
    match resolve_raw(value, resolver) {
        Ok(mut resolved) => {
            if tag == Some("color") {
                if let TokenValue::String(s) = &resolved {
                    resolved = TokenValue::String(normalize_color(s));
                }
            }
            out.insert(
                key,
                FlatEntry {
                    tag: tag.map(str::to_string),
                    value: resolved,
                },
            );
        }
        Err(error) => {
            log::warn!("skipping token '{key}': {error}");
            skipped.push(SkippedToken { path: key, error });
        }
    }
}

/// Resolves one raw value to its final literal, dispatching references to
/// the resolver and expressions to the evaluator. Literals pass through
/// unchanged.
pub fn resolve_raw(
    value: &RawValue,
    resolver: &mut Resolver<'_>,
) -> Result<TokenValue, ResolveError> {
    let mut visited = Visited::new();
    match value {
        RawValue::Number(n) => Ok(TokenValue::Number(*n)),
        RawValue::Bool(b) => Ok(TokenValue::Bool(*b)),
        RawValue::String(s) => Ok(TokenValue::String(s.clone())),
        RawValue::Opaque(json) => Ok(TokenValue::Other(json.clone())),
        RawValue::Reference(path) => expr::resolve_reference(path, resolver, &mut visited),
        RawValue::Expression(raw) => expr::evaluate(raw, resolver, &mut visited),
        // Composites are fanned out by the flattener before this point.
        RawValue::Composite(_) => Ok(TokenValue::Other(serde_json::Value::Null)),
    }
}

/// Joins path segments into the artifact key: dotted, lowercased.
fn flat_key(segments: &[String]) -> String {
    segments.join(".").to_lowercase()
}
