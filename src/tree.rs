use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A token source tree: an ordered mapping from key to node. Insertion order
/// is preserved so traversal order, and with it diagnostic output, is
/// reproducible from run to run.
pub type TokenTree = IndexMap<String, TokenNode>;

/// A node in a token tree. Every key maps to exactly one of these; the
/// choice is made once when the source JSON is loaded and never re-inspected
/// during traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenNode {
    /// A nested group of tokens.
    Group(TokenTree),
    /// A single token carrying a value. On the wire this is a JSON object
    /// containing a `$value` member.
    Leaf(TokenLeaf),
}

/// A token leaf: the optional `$type` tag and the authored `$value`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLeaf {
    pub tag: Option<String>,
    pub value: RawValue,
}

/// The authored value of a token, classified once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A numeric literal, e.g. `4`.
    Number(f64),
    /// A boolean literal.
    Bool(bool),
    /// A plain string with no embedded reference syntax.
    String(String),
    /// A string of the exact form `{namespace.path...}`: substitute the
    /// resolved value at that path.
    Reference(TokenPath),
    /// A string combining one or more `{...}` references with other text,
    /// usually arithmetic, e.g. `"{pillow.core.unit} * 3"`.
    Expression(String),
    /// An object-valued `$value` (composite tokens such as typography
    /// groups); each sub-member flattens to its own entry.
    Composite(IndexMap<String, RawValue>),
    /// Arrays and nulls: carried through untouched, never merged
    /// element-wise or resolved.
    Opaque(serde_json::Value),
}

/// A canonical token path: the ordered key segments from the namespace root
/// down to a token. This is the key type for the resolver's visited set and
/// memo table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TokenPath {
    segments: Vec<String>,
}

impl TokenPath {
    pub fn new(segments: Vec<String>) -> Self {
        TokenPath { segments }
    }

    /// Parses the body of a `{...}` reference into a path. The leading
    /// segment is dropped when it names the configured namespace, so
    /// `pillow.core.unit` and `core.unit` address the same token.
    pub fn from_reference(body: &str, namespace: &str) -> Self {
        let mut segments: Vec<String> = body.split('.').map(str::to_string).collect();
        if segments.first().map(String::as_str) == Some(namespace) {
            segments.remove(0);
        }
        TokenPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Walks `tree` along `path` and returns the node it lands on, if any.
pub fn lookup<'t>(tree: &'t TokenTree, path: &TokenPath) -> Option<&'t TokenNode> {
    let (first, rest) = path.segments().split_first()?;
    let mut node = tree.get(first)?;
    for segment in rest {
        match node {
            TokenNode::Group(children) => node = children.get(segment)?,
            TokenNode::Leaf(_) => return None,
        }
    }
    Some(node)
}

/// A fully resolved token value as it appears in the flat artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Number(f64),
    Bool(bool),
    String(String),
    Other(serde_json::Value),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Number(n) => write!(f, "{n}"),
            TokenValue::Bool(b) => write!(f, "{b}"),
            TokenValue::String(s) => write!(f, "{s}"),
            TokenValue::Other(value) => write!(f, "{value}"),
        }
    }
}

/// One entry of the flat output artifact, keyed by the flattened path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatEntry {
    #[serde(rename = "$type", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "$value")]
    pub value: TokenValue,
}
