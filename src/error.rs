use crate::tree::TokenPath;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for a whole build run. There is no meaningful partial tree
/// to build from once reading or parsing a source fails.
#[derive(Error, Debug, Diagnostic)]
pub enum BuildError {
    #[error("failed to read token source '{}'", path.display())]
    #[diagnostic(
        code(loader::unreadable_source),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to enumerate token sources")]
    #[diagnostic(
        code(loader::walk_failed),
        help("Check that the input directory exists and is readable.")
    )]
    Walk(#[from] walkdir::Error),

    #[error("malformed JSON in token source")]
    #[diagnostic(
        code(loader::malformed_json),
        help("Every token source must be a single well-formed JSON object.")
    )]
    Json {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("failed to serialize the artifact")]
    #[diagnostic(code(artifact::serialize_failed))]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write artifact '{}'", path.display())]
    #[diagnostic(code(artifact::write_failed))]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-token resolution failures. These never abort a build: the offending
/// token is skipped and logged, and flattening of sibling tokens continues.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ResolveError {
    #[error("circular reference through '{path}'")]
    #[diagnostic(
        code(resolver::circular_reference),
        help("A reference chain revisits a token that is already being resolved.")
    )]
    CircularReference { path: TokenPath },

    #[error("reference chain too deep at '{path}'")]
    #[diagnostic(
        code(resolver::chain_too_deep),
        help("Reference chains are limited to 20 hops.")
    )]
    ChainTooDeep { path: TokenPath },

    #[error("unresolved reference '{path}'")]
    #[diagnostic(
        code(resolver::unresolved_reference),
        help("The referenced path does not name a token in the tree.")
    )]
    UnresolvedReference { path: TokenPath },

    #[error("malformed expression '{expr}': {reason}")]
    #[diagnostic(
        code(expr::malformed_expression),
        help("Expressions support numbers, references, parentheses and the + - * / operators.")
    )]
    MalformedExpression { expr: String, reason: String },
}
