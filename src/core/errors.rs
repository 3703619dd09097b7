//! Error kinds raised by the engine.
//!
//! Most failure modes never surface as errors: an unresolved callable or a missing
//! owning type just means "nothing to report for this call". What remains here is
//! configuration and I/O trouble, plus the internal iteration failure that the
//! analyzer catches and logs per call.

use std::path::PathBuf;

use miette::Diagnostic;

/// Configuration, parsing, and settings errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load the Java grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("tree-sitter produced no syntax tree for {0}")]
    Parse(String),

    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid signature stub `{0}` (expected `Type.name(p1, p2, rest...)`)")]
    Stub(String),

    #[error("argument at bytes {start}..{end} is no longer part of an argument list")]
    StaleArgument { start: usize, end: usize },

    #[error("settings I/O at {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid TOML: {source}")]
    SettingsDecode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    SettingsEncode(#[from] toml::ser::Error),
}

/// Failure while walking one call's argument list.
///
/// Never escapes [`crate::core::CallSiteAnalyzer::analyze`]; it is logged with the
/// call-site context and converted to "no diagnostics for this call".
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("argument list contains a syntax error near byte {byte}")]
    Malformed { byte: usize },

    #[error("two argument expressions share position {index} (missing comma)")]
    MissingDelimiter { index: usize },

    #[error("source text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Reasons a cursor annotation cannot be performed.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum AnnotateError {
    #[error("no annotation available at {line}:{column}: {reason}")]
    #[diagnostic(
        code(argnote::annotate::unavailable),
        help("place the cursor on an argument expression of a resolvable call")
    )]
    Unavailable {
        line: usize,
        column: usize,
        reason: &'static str,
    },

    #[error("position {line}:{column} is outside the file")]
    #[diagnostic(code(argnote::annotate::position))]
    OutOfRange { line: usize, column: usize },

    #[error(transparent)]
    #[diagnostic(code(argnote::annotate::engine))]
    Engine(#[from] EngineError),
}
