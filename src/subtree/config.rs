//! Configuration loader
//!
//! `defaults/subtree-spec.default.toml` is embedded into the library so that
//! documentation and runtime defaults cannot drift apart. Callers layer their
//! own files and overrides on top through [`Loader`] before deserializing into
//! [`SubtreeSpecConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::formats::OutputFormat;

const DEFAULT_TOML: &str = include_str!("../../defaults/subtree-spec.default.toml");

/// Configuration file picked up from the working directory when present.
pub const PROJECT_CONFIG_FILE: &str = "subtree-spec.toml";

/// Nesting limit used when no configuration is given.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeSpecConfig {
    pub parser: ParserConfig,
    pub output: OutputConfig,
}

/// Knobs of [`crate::subtree::SubtreeSpecificationParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Deepest filter block or refinement accepted.
    pub max_nesting_depth: usize,
    pub duplicate_components: DuplicatePolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            duplicate_components: DuplicatePolicy::LastWins,
        }
    }
}

impl ParserConfig {
    /// Default limits, but duplicate components are errors.
    pub fn strict() -> Self {
        Self {
            duplicate_components: DuplicatePolicy::Reject,
            ..Self::default()
        }
    }
}

/// Handling of a component that appears more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later occurrence replaces the earlier one.
    #[default]
    LastWins,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files are an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a configuration file if it exists.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<SubtreeSpecConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with nothing but the embedded defaults.
pub fn load_defaults() -> Result<SubtreeSpecConfig, ConfigError> {
    Loader::new().build()
}
