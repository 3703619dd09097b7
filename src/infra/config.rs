use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{AppContext, InitArgs},
    core::literal::DEFAULT_EXEMPT_TYPES,
};

/// Config files probed in the working directory, first match wins
pub const CONFIG_FILES: &[&str] = &["argnote.toml", "argnote.yaml", "argnote.json", ".argnote.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Default ignore patterns (in addition to .gitignore)
    pub ignore_patterns: Vec<String>,

    /// Walk into hidden (dot) files and directories
    pub include_hidden: bool,

    /// Detection rules
    pub rules: RulesConfig,

    /// Persisted settings store (comment template)
    pub settings_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig
{
    /// Extra blacklist patterns, appended after the built-in list
    pub blacklist: Vec<String>,

    /// Use only `blacklist`, dropping the built-in list
    pub replace_default_blacklist: bool,

    /// Literal types that never need a comment
    pub exempt_types: Vec<String>,

    /// Library signatures, e.g. `java.util.Map.put(key, value)`
    pub signatures: Vec<String>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec![
                "target/**".to_string(),
                "build/**".to_string(),
                "out/**".to_string(),
                ".git/**".to_string(),
                "node_modules/**".to_string(),
            ],
            include_hidden: false,
            rules: RulesConfig::default(),
            settings_file: PathBuf::from(".argnote/settings.toml"),
        }
    }
}

impl Default for RulesConfig
{
    fn default() -> Self
    {
        Self {
            blacklist: Vec::new(),
            replace_default_blacklist: false,
            exempt_types: DEFAULT_EXEMPT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            signatures: Vec::new(),
        }
    }
}

/// Load from the first config file found (or `explicit`), then `ARGNOTE_*` env vars.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            if !path.exists()
            {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }
        None =>
        {
            for path in CONFIG_FILES
            {
                if Path::new(path).exists()
                {
                    builder = builder.add_source(config::File::with_name(path));
                    break;
                }
            }
        }
    }

    // Add environment variables with ARGNOTE_ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("ARGNOTE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("ignore_patterns")
            .with_list_parse_key("rules.blacklist")
            .with_list_parse_key("rules.exempt_types")
            .with_list_parse_key("rules.signatures")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("argnote.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::create_dir_all(&args.path)
        .with_context(|| format!("Failed to create {}", args.path.display()))?;

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
