use crate::error::ResolveError;
use crate::tree::{lookup, RawValue, TokenNode, TokenPath, TokenTree, TokenValue};
use std::collections::{HashMap, HashSet};

/// Hard ceiling on reference dereferences for a single token. A chain that
/// needs more hops than this fails with [`ResolveError::ChainTooDeep`].
pub const MAX_CHAIN_HOPS: usize = 20;

/// Bookkeeping for one resolution: the set of paths already visited and the
/// number of hops taken so far. One `Visited` spans a whole expression, so
/// cycles running between the expression's references are caught too.
#[derive(Debug, Default)]
pub struct Visited {
    pub(crate) seen: HashSet<TokenPath>,
    pub(crate) hops: usize,
}

impl Visited {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// What a reference chain terminated on.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The chain reached a literal; resolution is complete.
    Value(TokenValue),
    /// The chain reached a leaf whose raw value is an expression. The
    /// resolver never evaluates arithmetic; the caller finishes through
    /// [`crate::expr::evaluate`].
    Expression(String),
}

/// Resolves token references against one tree, memoizing literal results
/// under their canonical paths for the duration of a build.
pub struct Resolver<'t> {
    tree: &'t TokenTree,
    namespace: &'t str,
    memo: HashMap<TokenPath, TokenValue>,
}

impl<'t> Resolver<'t> {
    pub fn new(tree: &'t TokenTree, namespace: &'t str) -> Self {
        Resolver {
            tree,
            namespace,
            memo: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    /// Follows the reference chain starting at `path` until it terminates in
    /// a literal or an expression leaf.
    ///
    /// The walk is iterative: the visited set and hop count are first-class
    /// data rather than properties of the host call stack. Each dereference
    /// counts one hop against [`MAX_CHAIN_HOPS`]; a path already present in
    /// `visited` is a cycle.
    pub fn resolve(
        &mut self,
        path: &TokenPath,
        visited: &mut Visited,
    ) -> Result<Resolution, ResolveError> {
        let mut current = path.clone();
        let mut walked: Vec<TokenPath> = Vec::new();
        if !visited.seen.insert(current.clone()) {
            return Err(ResolveError::CircularReference { path: current });
        }
        loop {
            if let Some(hit) = self.memo.get(&current) {
                let value = hit.clone();
                self.remember(&walked, &value);
                return Ok(Resolution::Value(value));
            }
            let leaf = match lookup(self.tree, &current) {
                Some(TokenNode::Leaf(leaf)) => leaf,
                // Only a leaf with a scalar-resolvable value can terminate
                // a chain; groups and missing paths cannot.
                _ => return Err(ResolveError::UnresolvedReference { path: current }),
            };
            walked.push(current.clone());
            match &leaf.value {
                RawValue::Number(n) => {
                    let value = TokenValue::Number(*n);
                    self.remember(&walked, &value);
                    return Ok(Resolution::Value(value));
                }
                RawValue::Bool(b) => {
                    let value = TokenValue::Bool(*b);
                    self.remember(&walked, &value);
                    return Ok(Resolution::Value(value));
                }
                RawValue::String(s) => {
                    let value = TokenValue::String(s.clone());
                    self.remember(&walked, &value);
                    return Ok(Resolution::Value(value));
                }
                RawValue::Opaque(json) => {
                    let value = TokenValue::Other(json.clone());
                    self.remember(&walked, &value);
                    return Ok(Resolution::Value(value));
                }
                RawValue::Composite(_) => {
                    return Err(ResolveError::UnresolvedReference { path: current });
                }
                RawValue::Expression(raw) => {
                    return Ok(Resolution::Expression(raw.clone()));
                }
                RawValue::Reference(target) => {
                    if visited.seen.contains(target) {
                        return Err(ResolveError::CircularReference {
                            path: target.clone(),
                        });
                    }
                    visited.hops += 1;
                    if visited.hops > MAX_CHAIN_HOPS {
                        return Err(ResolveError::ChainTooDeep { path: path.clone() });
                    }
                    visited.seen.insert(target.clone());
                    current = target.clone();
                }
            }
        }
    }

    fn remember(&mut self, walked: &[TokenPath], value: &TokenValue) {
        for path in walked {
            self.memo.insert(path.clone(), value.clone());
        }
    }
}
