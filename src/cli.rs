use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub quiet: bool,                // global --quiet
    pub no_color: bool,             // global --no-color
    pub config: Option<PathBuf>,    // global --config
    pub settings: Option<PathBuf>,  // global --settings
}

#[derive(Parser)]
#[command(name = "argnote")]
#[command(about = "Flags bare literal arguments in Java calls and annotates them with parameter names")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: first of argnote.toml/.yaml/.json, .argnote.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Settings store holding the comment template
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            config: self.config.clone(),
            settings: self.settings.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report literal arguments passed without a parameter comment
    Check(CheckArgs),

    /// Annotate every reported argument (preview unless --apply)
    Fix(FixArgs),

    /// Annotate the argument under a cursor position
    Annotate(AnnotateArgs),

    /// Read or change the comment template
    Template(TemplateArgs),

    /// Print the effective blacklist and exempt types
    Rules,

    /// Initialize an argnote.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Labelled source snippets
    #[default]
    Text,
    /// One JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit with status 1 when anything is reported
    #[arg(long)]
    pub fail_on_findings: bool,
}

#[derive(Debug, Parser)]
pub struct FixArgs {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Write changes to files (default shows a diff)
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Parser)]
pub struct AnnotateArgs {
    /// Cursor position (format: File.java:LINE:COL, 1-based)
    pub position: String,

    /// Directory indexed for declarations
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Write the change to the file (default shows a diff)
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum TemplateSubcommand {
    /// Print the current template
    Get,

    /// Store a new template; must contain one %s and render to /* ... */
    Set {
        /// Template text, e.g. "/* %s= */"
        text: String,
    },
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

/// Split `File.java:LINE:COL` into its parts.
pub fn parse_position(text: &str) -> Option<(PathBuf, usize, usize)> {
    let (rest, column) = text.rsplit_once(':')?;
    let (file, line) = rest.rsplit_once(':')?;
    if file.is_empty() {
        return None;
    }
    Some((PathBuf::from(file), line.parse().ok()?, column.parse().ok()?))
}
