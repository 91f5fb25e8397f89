use crate::error::BuildError;
use crate::flatten::{flatten_into, FlatTokens, SkippedToken};
use crate::loader;
use crate::resolver::Resolver;
use crate::serialization;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Build configuration. `namespace` is the root key expected in every token
/// source file and the leading segment of every reference.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub namespace: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            namespace: "pillow".to_string(),
        }
    }
}

/// The result of a token build: the flat artifact mapping plus the tokens
/// that failed to resolve and were skipped. Serializes as the artifact
/// itself, so it can be handed straight to downstream generators.
pub struct BuildResult {
    pub tokens: FlatTokens,
    pub skipped: Vec<SkippedToken>,
}

impl Serialize for BuildResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.tokens.serialize(serializer)
    }
}

impl BuildResult {
    /// Serializes the flat artifact into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the flat artifact into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// Rebuilds a nested token object from the flat mapping.
    #[must_use]
    pub fn to_nested(&self) -> serde_json::Value {
        serialization::to_nested(&self.tokens)
    }

    /// Writes the flat artifact to `path` as pretty-printed JSON.
    ///
    /// # Errors
    /// Fails if serialization fails or the file cannot be written.
    pub fn write_artifact(&self, path: &Path) -> Result<(), BuildError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| BuildError::Output {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Builds the flat token artifact from a directory of token sources using
/// the default options.
///
/// # Errors
///
/// Fails on I/O errors and malformed JSON. Resolution failures never fail
/// the build; they are logged and reported in [`BuildResult::skipped`].
pub fn build(input_dir: &Path) -> Result<BuildResult, BuildError> {
    build_with_options(input_dir, &BuildOptions::default())
}

/// Builds the flat token artifact: loads and merges the sources, flattens
/// the core tree against itself, then flattens the alias tree against the
/// merged core tree. Alias flattening runs last, so where the same flat
/// path exists on both sides the alias-derived entry wins.
///
/// # Errors
///
/// Fails on I/O errors and malformed JSON. Resolution failures never fail
/// the build; they are logged and reported in [`BuildResult::skipped`].
pub fn build_with_options(
    input_dir: &Path,
    options: &BuildOptions,
) -> Result<BuildResult, BuildError> {
    let sources = loader::load_sources(input_dir, &options.namespace)?;
    let mut tokens = FlatTokens::new();
    let mut skipped = Vec::new();
    let mut resolver = Resolver::new(&sources.core, &options.namespace);
    flatten_into(&sources.core, &mut resolver, &mut tokens, &mut skipped);
    flatten_into(&sources.aliases, &mut resolver, &mut tokens, &mut skipped);
    Ok(BuildResult { tokens, skipped })
}

#[cfg(test)]
mod tests {
    use crate::build;
    use std::fs;

    fn write_fixture(root: &std::path::Path, relative: &str, json: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    #[test]
    fn test_build_resolves_core_and_alias_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            dir.path(),
            "core/dimensions.json",
            r#"{ "pillow": { "core": { "unit": { "$type": "dimension", "$value": 4 } } } }"#,
        );
        write_fixture(
            dir.path(),
            "components/button.json",
            r#"{ "pillow": { "button": { "padding": { "$value": "{pillow.core.unit} * 2" } } } }"#,
        );

        let result = build(dir.path()).unwrap();
        assert_eq!(
            result.tokens["pillow.core.unit"].value,
            crate::tree::TokenValue::Number(4.0)
        );
        assert_eq!(
            result.tokens["pillow.button.padding"].value,
            crate::tree::TokenValue::Number(8.0)
        );
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_empty_input_still_produces_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = build(dir.path()).unwrap();
        assert!(result.tokens.is_empty());
        assert_eq!(result.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_to_nested_rebuilds_groups() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            dir.path(),
            "core/colors.json",
            r##"{ "pillow": { "core": { "color": { "ink": { "$type": "color", "$value": "#1B1B1BFF" } } } } }"##,
        );

        let result = build(dir.path()).unwrap();
        let nested = result.to_nested();
        assert_eq!(
            nested["pillow"]["core"]["color"]["ink"]["$value"],
            serde_json::json!("rgba(27, 27, 27, 1)")
        );
    }
}
