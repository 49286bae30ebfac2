//! Error type shared by the converter, the engine and the harness.

use std::path::PathBuf;

use crate::cson::CsonError;

/// Everything that can go wrong while converting, loading or tokenizing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Cson {
        path: PathBuf,
        #[source]
        source: CsonError,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid regex `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("no grammar registered for scope `{0}`")]
    GrammarNotFound(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = Error::io(
            "grammars/css.cson",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(
            err.to_string(),
            "failed to access grammars/css.cson: missing"
        );
    }

    #[test]
    fn regex_error_display() {
        let err = Error::InvalidRegex {
            pattern: "(".to_string(),
            message: "end pattern with unmatched parenthesis".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid regex `(`: end pattern with unmatched parenthesis"
        );
    }
}
