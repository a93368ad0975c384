//! Error types for kernel parsing operations.
//!
//! Only grammar problems are errors. Semantic mismatches between files are
//! validation findings and live in `reqpolicy-check`.

/// A requirement line that cannot be turned into a declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// URL or editable install where only index requirements are allowed.
    #[error("URL requirement not permitted here: {line:?}")]
    UrlNotPermitted { line: String },

    /// An installer option line such as `-f <index>`.
    #[error("option line is not a requirement: {line:?}")]
    OptionLine { line: String },

    /// A location requirement without a `#egg=<name>` fragment.
    #[error("location requirement has no #egg=<name> fragment: {line:?}")]
    MissingEgg { line: String },

    /// Name, extras, or specifier grammar did not parse.
    #[error("invalid requirement {line:?}: {reason}")]
    Malformed { line: String, reason: String },

    /// Any of the above, tagged with the file and 1-based line number.
    #[error("{file}:{line_no}: {source}")]
    InFile {
        file: String,
        line_no: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach a source position. Already-positioned errors are kept as is.
    pub fn at(self, file: &str, line_no: usize) -> Self {
        match self {
            Self::InFile { .. } => self,
            other => Self::InFile {
                file: file.to_string(),
                line_no,
                source: Box::new(other),
            },
        }
    }

    /// The offending line text.
    pub fn line(&self) -> &str {
        match self {
            Self::UrlNotPermitted { line }
            | Self::OptionLine { line }
            | Self::MissingEgg { line }
            | Self::Malformed { line, .. } => line,
            Self::InFile { source, .. } => source.line(),
        }
    }
}

/// A version token outside the supported grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version {0:?}")]
pub struct VersionError(pub String);

/// Errors from parsing or evaluating an environment marker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkerError {
    #[error("invalid marker {marker:?}: {reason}")]
    Syntax { marker: String, reason: String },

    /// The marker names a variable the supplied environment does not bind.
    #[error("undefined environment name {0:?}")]
    UndefinedName(String),
}
