// CLI module for argument parsing and configuration

use crate::config::{load_deny_list, UserConfig};
use crate::coordinator::LoadDelays;
use crate::domain::RESULT_LIMIT;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Appseek - type a few letters, launch the thing
///
/// Searches a catalog of configured files and folders as you type, and can
/// dive into any folder to search its whole subtree.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "appseek")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Catalog source: a file, or a directory whose files are listed
    ///
    /// Can be specified multiple times. Added to the sources from the config file.
    #[arg(short = 's', long = "source")]
    pub sources: Vec<PathBuf>,

    /// Initial search key
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,

    /// Start by searching the subtree of this directory
    #[arg(short = 'b', long = "base")]
    pub base: Option<PathBuf>,

    /// File listing extensions whose icons are never cached, one per line
    #[arg(long = "deny-list")]
    pub deny_list: Option<PathBuf>,

    /// Directory containing genericFileThumbnail.png and genericFolderThumbnail.png
    #[arg(long = "icons")]
    pub icons_dir: Option<PathBuf>,

    /// Print the ranked matches for --key and exit
    #[arg(long = "print", action = ArgAction::SetTrue)]
    pub print: bool,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments against the loaded config and return any errors
    pub fn validate(&self, config: &UserConfig) -> Result<(), String> {
        if self.sources.is_empty() && config.sources.is_empty() && self.base.is_none() {
            return Err(
                "No catalog sources. Pass --source or add \"sources\" to the config file"
                    .to_string(),
            );
        }

        for source in &self.sources {
            if !source.exists() {
                return Err(format!("Source does not exist: {}", source.display()));
            }
        }

        if let Some(ref base) = self.base {
            if !base.is_dir() {
                return Err(format!("Search base is not a directory: {}", base.display()));
            }
        }

        if self.print && self.key.as_deref().map_or(true, str::is_empty) {
            return Err("--print needs a non-empty --key".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments and the config file
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources: Vec<PathBuf>,
    pub key: String,
    pub base: Option<PathBuf>,
    pub deny_list: Vec<String>,
    pub icons_dir: Option<PathBuf>,
    pub result_limit: usize,
    pub delays: LoadDelays,
    pub print: bool,
    pub verbose: bool,
}

impl AppConfig {
    /// Merges `args` over `config`. Command-line sources come after the
    /// configured ones; the deny-list file is read here.
    pub fn from_parts(args: Args, config: UserConfig) -> Self {
        let mut sources = config.sources;
        for source in args.sources {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        let deny_list = args
            .deny_list
            .or(config.deny_list)
            .map(|path| load_deny_list(&path))
            .unwrap_or_default();

        let result_limit = if config.result_limit == 0 {
            RESULT_LIMIT
        } else {
            config.result_limit
        };

        AppConfig {
            sources,
            key: args.key.unwrap_or_default(),
            base: args.base,
            deny_list,
            icons_dir: args.icons_dir.or(config.icons_dir),
            result_limit,
            delays: config.delays.into(),
            print: args.print,
            verbose: args.verbose,
        }
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig::from_parts(args, UserConfig::default())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from(Args::default())
    }
}
