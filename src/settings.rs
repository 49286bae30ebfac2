//! Configuration loading.
//!
//! `defaults/language-css.default.toml` is embedded into the binary so that docs and runtime
//! behavior stay in sync. Callers layer user files and command line overrides on top of those
//! defaults via [`Loader`] before deserializing into [`HarnessConfig`].

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;

use crate::output::TokenFormat;

const DEFAULT_TOML: &str = include_str!("../defaults/language-css.default.toml");

/// Top-level configuration consumed by the harness and the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    pub paths: PathsConfig,
    pub grammar: GrammarConfig,
    pub output: OutputConfig,
}

/// Where the grammar and the sample live.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub grammar_source: PathBuf,
    pub grammar_json: PathBuf,
    pub sample: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrammarConfig {
    /// The one scope name the grammar loader answers for
    pub scope_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: TokenFormat,
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

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<HarnessConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
