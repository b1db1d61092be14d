use std::{fmt, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Whether a config file belongs to the main directory or to a robot overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Main,
    Overlay,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Main => write!(f, "main"),
            ConfigKind::Overlay => write!(f, "overlay"),
        }
    }
}

/// Configuration error variants
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("failed to read {kind} config `{}`", path.display())]
    #[diagnostic(code(mimir::config::read))]
    Read {
        path: PathBuf,
        kind: ConfigKind,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse `{}`", path.display())]
    #[diagnostic(code(mimir::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("`{name}` does not describe a valid config")]
    #[diagnostic(
        code(mimir::config::invalid),
        help("check the file for missing, misspelled or unknown fields")
    )]
    Invalid {
        name: &'static str,
        #[source]
        source: toml::de::Error,
    },
}
