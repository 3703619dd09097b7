//! Configured engine and the multi-file project it runs over.
//!
//! The engine owns the immutable pieces (grammar, blacklist, classifier, stubs).
//! A [`Project`] is a set of parsed sources plus the [`SignatureIndex`] built from
//! all of them, so calls across files resolve. Files are parsed and analyzed in
//! parallel; each file's analysis is single-threaded.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use tree_sitter::Tree;

use crate::{
    core::{
        analyzer::{CallKind, CallSiteAnalyzer, FlaggedArgument},
        blacklist::BlacklistMatcher,
        errors::EngineError,
        literal::LiteralClassifier,
        resolve::SignatureIndex,
        signature::CallableSignature,
    },
    cli::AppContext,
    infra::{
        config::{Config, RulesConfig, load_config},
        io::read_source,
        line_index::NewlineIndex,
        settings::FileSettings,
        walk::FileWalker,
    },
    parsers::JavaParser,
};

/// Severity attached to every finding.
pub const SEVERITY: &str = "weak_warning";

/// Grammar, rules, and library stubs.
pub struct Engine {
    parser: JavaParser,
    blacklist: BlacklistMatcher,
    classifier: LiteralClassifier,
    stubs: Vec<CallableSignature>,
}

impl Engine {
    /// Engine with built-in rules and no stubs.
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            parser: JavaParser::new()?,
            blacklist: BlacklistMatcher::builtin()?,
            classifier: LiteralClassifier::builtin()?,
            stubs: Vec::new(),
        })
    }

    pub fn from_rules(rules: &RulesConfig) -> Result<Self, EngineError> {
        let mut blacklist = if rules.replace_default_blacklist {
            BlacklistMatcher::default()
        } else {
            BlacklistMatcher::builtin()?
        };
        blacklist.extend(&rules.blacklist)?;

        let stubs = rules
            .signatures
            .iter()
            .map(|s| CallableSignature::parse_stub(s))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rules = blacklist.len(), stubs = stubs.len(), "engine configured");
        Ok(Self {
            parser: JavaParser::new()?,
            blacklist,
            classifier: LiteralClassifier::new(rules.exempt_types.iter().cloned())?,
            stubs,
        })
    }

    pub fn parser(&self) -> &JavaParser {
        &self.parser
    }

    pub fn blacklist(&self) -> &BlacklistMatcher {
        &self.blacklist
    }

    pub fn classifier(&self) -> &LiteralClassifier {
        &self.classifier
    }

    pub fn analyzer<'a>(&'a self, index: &'a SignatureIndex) -> CallSiteAnalyzer<'a, SignatureIndex> {
        CallSiteAnalyzer::new(index, &self.blacklist, &self.classifier)
    }
}

/// Configuration, engine, and walker shared by the commands.
pub struct Workspace {
    pub config: Config,
    pub engine: Engine,
    walker: FileWalker,
}

impl Workspace {
    pub fn load(ctx: &AppContext) -> Result<Self> {
        let config = load_config(ctx.config.as_deref())?;
        let engine = Engine::from_rules(&config.rules).context("Invalid rules configuration")?;
        let walker = FileWalker::new(&config.ignore_patterns)
            .context("Invalid ignore pattern")?
            .with_include_hidden(config.include_hidden);
        Ok(Self { config, engine, walker })
    }

    /// `.java` files named by, or found under, `paths`.
    pub fn java_sources(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let expanded: Vec<PathBuf> = paths.iter().map(|p| expand_path(p)).collect();
        if let Some(missing) = expanded.iter().find(|p| !p.exists()) {
            anyhow::bail!("Path does not exist: {}", missing.display());
        }
        let files = self.walker.java_sources(&expanded);
        debug!(files = files.len(), "collected Java sources");
        Ok(files)
    }

    /// Settings store from `--settings`, else the configured file.
    pub fn settings(&self, ctx: &AppContext) -> Result<FileSettings> {
        let path = ctx
            .settings
            .clone()
            .unwrap_or_else(|| self.config.settings_file.clone());
        let path = expand_path(&path);
        FileSettings::open(&path)
            .with_context(|| format!("Failed to open settings store {}", path.display()))
    }
}

/// `~` and `$VAR` expansion; paths that fail to expand are used as given.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}

/// One parsed source file.
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
}

/// Parsed sources and the index built over all of them.
pub struct Project {
    pub files: Vec<SourceFile>,
    pub index: SignatureIndex,
}

impl Project {
    /// Read and parse `paths`.
    pub fn load(engine: &Engine, paths: &[PathBuf], progress: &ProgressBar) -> Result<Self> {
        let sources = paths
            .par_iter()
            .map(|path| {
                let text = read_source(path)?;
                progress.inc(1);
                Ok::<_, anyhow::Error>((path.clone(), text))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_sources(engine, sources).context("Failed to index Java sources")
    }

    /// Parse in-memory sources and index their declarations plus the stubs.
    pub fn from_sources(engine: &Engine, sources: Vec<(PathBuf, String)>) -> Result<Self, EngineError> {
        let parsed = sources
            .into_par_iter()
            .map(|(path, text)| {
                let tree = engine.parser.parse(&text)?;
                let decls = engine.parser.declarations(&tree, &text)?;
                if tree.root_node().has_error() {
                    warn!(path = %path.display(), "syntax errors; affected calls are skipped");
                }
                Ok::<_, EngineError>((SourceFile { path, text, tree }, decls))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let mut index = SignatureIndex::new();
        let mut files = Vec::with_capacity(parsed.len());
        for (file, decls) in parsed {
            index.add_declarations(decls);
            files.push(file);
        }
        for stub in &engine.stubs {
            index.add_stub(stub.clone());
        }

        info!(
            files = files.len(),
            methods = index.method_count(),
            constructors = index.constructor_count(),
            "project indexed"
        );
        Ok(Self { files, index })
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Findings for every file, sorted by file then offset.
    pub fn findings(&self, engine: &Engine) -> Vec<Finding> {
        let mut all: Vec<Finding> = self
            .files
            .par_iter()
            .flat_map_iter(|file| self.file_findings(engine, file))
            .collect();
        all.sort_by(|a, b| (&a.file, a.start).cmp(&(&b.file, b.start)));
        all
    }

    pub fn file_findings(&self, engine: &Engine, file: &SourceFile) -> Vec<Finding> {
        let bytes = file.text.as_bytes();
        let lines = NewlineIndex::build(bytes);
        engine
            .analyzer(&self.index)
            .analyze_tree(&file.tree, bytes)
            .into_iter()
            .map(|flag| Finding::new(&file.path, &flag, bytes, &lines))
            .collect()
    }
}

/// A reported argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
    pub kind: CallKind,
    pub parameter: String,
    pub index: usize,
    pub signature: String,
    pub argument: String,
    pub severity: &'static str,
    pub message: String,
}

impl Finding {
    fn new(path: &Path, flag: &FlaggedArgument<'_>, bytes: &[u8], lines: &NewlineIndex) -> Self {
        let expr = flag.slot.expr;
        let (line, column) = lines.position_of_byte(expr.start_byte(), bytes);
        Self {
            file: path.to_path_buf(),
            line,
            column,
            start: expr.start_byte(),
            end: expr.end_byte(),
            kind: flag.kind,
            parameter: flag.parameter.clone(),
            index: flag.slot.index,
            signature: flag.signature.clone(),
            argument: String::from_utf8_lossy(&bytes[expr.byte_range()]).into_owned(),
            severity: SEVERITY,
            message: flag.kind.message(),
        }
    }
}
