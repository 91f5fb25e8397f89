use crate::error::BuildError;
use crate::expr;
use crate::merge::merge;
use crate::tree::{RawValue, TokenLeaf, TokenNode, TokenPath, TokenTree};
use crate::utils;
use indexmap::IndexMap;
use miette::NamedSource;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Directory name whose files hold canonical, non-derived tokens. A file is
/// a core source when any directory component of its path below the input
/// root matches this name.
pub const CORE_DIR: &str = "core";

/// Sentinel value forced onto transparent color tokens before merge.
pub const TRANSPARENT_VALUE: &str = "#1b1b1b00";

/// The merged core tree and the merged alias-source tree for one build.
#[derive(Debug, Default)]
pub struct SourceSet {
    pub core: TokenTree,
    pub aliases: TokenTree,
}

/// Reads every `*.json` under `root`, classifies each file as a core or
/// alias source, and deep-merges the namespace tree of each into the
/// matching output tree.
///
/// Files are visited in lexicographic file-name order, so merge precedence
/// is stable across runs and platforms. A file whose root object lacks the
/// configured namespace key is skipped.
///
/// # Errors
///
/// Fails on any I/O error or malformed JSON; there is no meaningful partial
/// tree to build from.
pub fn load_sources(root: &Path, namespace: &str) -> Result<SourceSet, BuildError> {
    let mut sources = SourceSet::default();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document: Value =
            serde_json::from_str(&text).map_err(|err| json_error(path, &text, &err))?;

        let Some(namespace_root) = document.get_mut(namespace) else {
            log::debug!(
                "skipping {}: no '{}' namespace at the root",
                path.display(),
                namespace
            );
            continue;
        };
        patch_transparent(namespace_root);
        let tree = to_token_tree(namespace_root, namespace);

        let relative = path.strip_prefix(root).unwrap_or(path);
        if is_core_source(relative) {
            merge(&mut sources.core, tree);
        } else {
            merge(&mut sources.aliases, tree);
        }
    }
    Ok(sources)
}

/// A file is a core source when any component of its path is the reserved
/// core directory.
pub fn is_core_source(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::Normal(name) if name == CORE_DIR))
}

/// Forces the transparent sentinel onto any color token whose key mentions
/// "transparent". Runs on the raw JSON before tree conversion so it also
/// supplies a `$value` for transparent color tokens authored without one,
/// and strictly before merge.
pub fn patch_transparent(value: &mut Value) {
    let Value::Object(members) = value else {
        return;
    };
    for (key, member) in members.iter_mut() {
        if let Value::Object(child) = member {
            let is_color = child.get("$type").and_then(Value::as_str) == Some("color");
            if is_color && key.to_lowercase().contains("transparent") {
                child.insert(
                    "$value".to_string(),
                    Value::String(TRANSPARENT_VALUE.to_string()),
                );
            }
        }
        patch_transparent(member);
    }
}

/// Converts one namespace tree of raw JSON into a [`TokenTree`], deciding
/// group-vs-leaf for every node exactly once. An object containing `$value`
/// is a leaf; any other object is a group; `$`-prefixed members are
/// metadata and are not part of the tree.
pub fn to_token_tree(value: &Value, namespace: &str) -> TokenTree {
    let mut tree = TokenTree::new();
    let Value::Object(members) = value else {
        return tree;
    };
    for (key, member) in members {
        if key.starts_with('$') {
            continue;
        }
        match member {
            Value::Object(child) if child.contains_key("$value") => {
                let tag = child.get("$type").and_then(Value::as_str).map(str::to_string);
                let value = classify_value(&child["$value"], namespace);
                tree.insert(key.clone(), TokenNode::Leaf(TokenLeaf { tag, value }));
            }
            Value::Object(_) => {
                tree.insert(
                    key.clone(),
                    TokenNode::Group(to_token_tree(member, namespace)),
                );
            }
            other => {
                log::warn!("skipping '{key}': expected a token group or a token object, found {other}");
            }
        }
    }
    tree
}

/// Classifies an authored `$value` once, at load time.
fn classify_value(value: &Value, namespace: &str) -> RawValue {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(n) => RawValue::Number(n),
            None => RawValue::Opaque(value.clone()),
        },
        Value::Bool(b) => RawValue::Bool(*b),
        Value::String(s) => classify_string(s, namespace),
        Value::Object(members) => {
            let mut children = IndexMap::new();
            for (key, child) in members {
                if key.starts_with('$') {
                    continue;
                }
                children.insert(key.clone(), classify_value(child, namespace));
            }
            RawValue::Composite(children)
        }
        Value::Array(_) | Value::Null => RawValue::Opaque(value.clone()),
    }
}

fn classify_string(s: &str, namespace: &str) -> RawValue {
    if let Some(caps) = expr::FULL_REFERENCE.captures(s.trim()) {
        RawValue::Reference(TokenPath::from_reference(&caps[1], namespace))
    } else if expr::REFERENCE.is_match(s) {
        RawValue::Expression(s.to_string())
    } else {
        RawValue::String(s.to_string())
    }
}

fn json_error(path: &Path, text: &str, err: &serde_json::Error) -> BuildError {
    let offset = utils::byte_offset(text, err.line(), err.column());
    BuildError::Json {
        src: NamedSource::new(path.to_string_lossy(), text.to_string()),
        span: (offset, 0).into(),
        message: err.to_string(),
    }
}
