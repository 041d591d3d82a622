//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// squish - Lockfiles and offline caches for sbt builds
///
/// Records every artifact an sbt build downloads, pinned by content hash,
/// and rebuilds that Coursier cache later without sbt.
#[derive(Parser, Debug)]
#[command(name = "squish")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file path
    #[arg(short, long, global = true, env = "SQUISH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run sbt in an isolated home and write a lockfile
    Generate(GenerateArgs),

    /// Rebuild a Coursier cache from a lockfile
    Reconstruct(ReconstructArgs),

    /// Show or initialize settings
    Config(ConfigArgs),
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Run configuration (JSON)
    pub run_config: PathBuf,

    /// Lockfile to write
    #[arg(short, long, default_value = crate::lockfile::DEFAULT_LOCKFILE_NAME)]
    pub output: PathBuf,

    /// Print the lockfile without writing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Keep the isolated build home for inspection
    #[arg(long)]
    pub keep_temp: bool,

    /// sbt project directory (defaults to the current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

/// Arguments for the reconstruct command
#[derive(Parser, Debug)]
pub struct ReconstructArgs {
    /// Lockfile to read
    pub lockfile: PathBuf,

    /// Cache directory to populate
    pub target: PathBuf,

    /// Maximum concurrent downloads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Retries per artifact after a transient failure
    #[arg(long)]
    pub retries: Option<u32>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current settings
    Show,

    /// Show settings file path
    Path,

    /// Write default settings
    Init {
        /// Overwrite existing settings
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_generate_defaults() {
        let cli = Cli::parse_from(["squish", "generate", "sbt-runs.json"]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.run_config, PathBuf::from("sbt-runs.json"));
                assert_eq!(args.output, PathBuf::from("deps.lock.json"));
                assert!(!args.dry_run);
                assert!(!args.keep_temp);
                assert!(args.project.is_none());
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn cli_parses_generate_flags() {
        let cli = Cli::parse_from([
            "squish", "generate", "runs.json", "-o", "out.json", "-n", "--keep-temp", "-p", "app",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.output, PathBuf::from("out.json"));
                assert!(args.dry_run);
                assert!(args.keep_temp);
                assert_eq!(args.project, Some(PathBuf::from("app")));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn cli_parses_reconstruct() {
        let cli = Cli::parse_from(["squish", "reconstruct", "deps.lock.json", "cache", "-j", "4"]);
        match cli.command {
            Commands::Reconstruct(args) => {
                assert_eq!(args.lockfile, PathBuf::from("deps.lock.json"));
                assert_eq!(args.target, PathBuf::from("cache"));
                assert_eq!(args.jobs, Some(4));
                assert_eq!(args.retries, None);
            }
            _ => panic!("expected Reconstruct command"),
        }
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["squish", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected Config Init command"),
        }
    }

    #[test]
    fn cli_counts_verbosity() {
        let cli = Cli::parse_from(["squish", "-vv", "config"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_requires_reconstruct_target() {
        assert!(Cli::try_parse_from(["squish", "reconstruct", "deps.lock.json"]).is_err());
    }
}
