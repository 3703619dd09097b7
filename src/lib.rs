//! **argnote** - Flags bare literal arguments in Java call sites
//!
//! An unannotated `true`, `0`, or `null` says nothing about the parameter it fills.
//! argnote resolves each call against the declarations it has indexed, skips call
//! shapes that document themselves, and offers a fix that inserts `/* name= */`
//! before the literal. Parsing is tree-sitter based; comments are siblings of the
//! argument expressions, which is what the adjacency analysis walks.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Detection and annotation engine
pub mod core {
    /// Error taxonomy shared by the engine
    pub mod errors;
    pub use errors::{AnalyzeError, AnnotateError, EngineError};

    /// Canonical `Type.name(p1, p2)` signatures
    pub mod signature;
    pub use signature::{CallableSignature, SignatureFormatter};

    /// Ordered pattern blacklist of self-documenting call shapes
    pub mod blacklist;
    pub use blacklist::{BlacklistMatcher, BlacklistRule};

    /// Literal, cast, and sentinel classification
    pub mod literal;
    pub use literal::{LiteralClassifier, LiteralVerdict};

    /// Token-adjacency scan for comments around arguments
    pub mod adjacency;
    pub use adjacency::CommentAdjacencyScanner;

    /// Call resolution against indexed declarations
    pub mod resolve;
    pub use resolve::{CallResolver, SignatureIndex};

    /// Per-call analysis producing flagged argument slots
    pub mod analyzer;
    pub use analyzer::{ArgumentSlot, CallKind, CallSiteAnalyzer, FlaggedArgument};

    /// Comment template and its settings capability
    pub mod template;
    pub use template::{CommentTemplate, TemplateSettings};

    /// Comment insertion, duplicate cleanup, and reformatting
    pub mod fix;
    pub use fix::{ArgumentRef, CommentEditing, CommentFixApplier, FixOutcome, JavaDocument};

    /// Cursor-driven annotation of a single argument
    pub mod intention;
    pub use intention::{AnnotationTarget, annotate_at};

    /// Configured engine and multi-file project model
    pub mod engine;
    pub use engine::{Engine, Finding, Project, SourceFile, Workspace};

    /// `check` command: report findings
    pub mod check;
    pub use check::{rules as rules_run, run as check_run};

    /// `fix` and `annotate` commands: rewrite sources
    pub mod rewrite;
    pub use rewrite::{annotate_run, fix_all, fix_run};
}

/// Language processing - Java parsing and declaration extraction
pub mod parsers {
    /// Java parsing with tree-sitter (declarations, owning types, varargs)
    pub mod java_parser;
    pub use java_parser::{JavaDeclarations, JavaParser};
}

/// Infrastructure - Configuration, settings, I/O, and walking
pub mod infra {
    /// Configuration management with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Persisted key/value settings (comment template lives here)
    pub mod settings;
    pub use settings::{FileSettings, MemorySettings, SettingsStore};

    /// Source reading with memory mapping for large files
    pub mod io;
    pub use io::{FileContent, read_file_smart};

    /// CRLF/LF-robust line indexing for line/column mapping
    pub mod line_index;
    pub use line_index::NewlineIndex;

    /// Gitignore-aware directory walking
    pub mod walk;
    pub use walk::FileWalker;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{
    BlacklistMatcher, CallSiteAnalyzer, CommentFixApplier, Engine, LiteralClassifier, LiteralVerdict,
    check_run,
};
pub use infra::{Config, FileWalker, load_config};
pub use parsers::JavaParser;
