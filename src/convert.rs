//! Grammar conversion and sample seeding
//!
//! The grammar is authored in CSON and consumed as JSON. Conversion reads the whole source,
//! parses it and only then writes the target, so a malformed grammar never leaves a partial
//! JSON file behind.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::cson;
use crate::error::{Error, Result};
use crate::settings::HarnessConfig;

/// Content of the sample stylesheet created by [seed_sample].
pub const SAMPLE_CSS: &str = ".foo {\n\tcolor: lime;\n}\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

/// What [prepare] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareReport {
    pub grammar_json: PathBuf,
    pub sample: PathBuf,
    pub seed: SeedOutcome,
}

/// Converts CSON text to JSON text.
pub fn convert_str(source: &str) -> Result<String> {
    let value = cson::parse(source).map_err(|source| Error::Cson {
        path: PathBuf::from("<input>"),
        source,
    })?;
    Ok(cson::to_json_string(&value)?)
}

/// Reads and parses a CSON file.
pub fn read_cson(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    cson::parse(&text).map_err(|source| Error::Cson {
        path: path.to_path_buf(),
        source,
    })
}

/// Converts the CSON file at `source` into JSON text at `target`.
#[tracing::instrument(skip_all, fields(source = %source.display(), target = %target.display()))]
pub fn convert_file(source: &Path, target: &Path) -> Result<Value> {
    let value = read_cson(source)?;
    let json = cson::to_json_string(&value)?;
    write_creating_parents(target, json.as_bytes())?;
    debug!(bytes = json.len(), "wrote JSON grammar");
    Ok(value)
}

/// Creates the sample stylesheet unless a file is already there.
///
/// Creation is exclusive: a file that appears concurrently is left alone.
pub fn seed_sample(path: &Path) -> Result<SeedOutcome> {
    create_parents(path)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "sample already present");
            return Ok(SeedOutcome::AlreadyPresent);
        }
        Err(err) => return Err(Error::io(path, err)),
    };
    file.write_all(SAMPLE_CSS.as_bytes())
        .map_err(|err| Error::io(path, err))?;
    info!(path = %path.display(), "seeded sample stylesheet");
    Ok(SeedOutcome::Created)
}

/// Converts the configured grammar and seeds the configured sample.
#[tracing::instrument(skip_all)]
pub fn prepare(config: &HarnessConfig) -> Result<PrepareReport> {
    let paths = &config.paths;
    convert_file(&paths.grammar_source, &paths.grammar_json)?;
    let seed = seed_sample(&paths.sample)?;
    Ok(PrepareReport {
        grammar_json: paths.grammar_json.clone(),
        sample: paths.sample.clone(),
        seed,
    })
}

fn create_parents(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    Ok(())
}

fn write_creating_parents(path: &Path, contents: &[u8]) -> Result<()> {
    create_parents(path)?;
    fs::write(path, contents).map_err(|err| Error::io(path, err))
}
