//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Silt static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Path of the silt settings file
    #[arg(short, long, default_value = "settings.toml")]
    pub settings_file: PathBuf,

    /// Where silt saves its output [default: read from settings file]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build website and save to the output directory
    Build {
        /// Run `clean` before building
        #[arg(short, long)]
        clean: bool,
    },

    /// Delete contents of the output directory
    Clean,

    /// Serve the output directory over http
    Serve {
        /// The port to bind on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },

    /// Build once, then rebuild incrementally as source files change
    Watch {
        /// Run `clean` before the initial build
        #[arg(short, long)]
        clean: bool,
    },

    /// Print the currently installed version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_clean() {
        let cli = Cli::parse_from(["silt", "build", "--clean"]);
        assert!(matches!(cli.command, Commands::Build { clean: true }));
        assert_eq!(cli.settings_file, PathBuf::from("settings.toml"));
    }

    #[test]
    fn test_settings_file_override() {
        let cli = Cli::parse_from(["silt", "-s", "other.toml", "clean"]);
        assert_eq!(cli.settings_file, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Commands::Clean));
    }

    #[test]
    fn test_serve_port() {
        let cli = Cli::parse_from(["silt", "serve", "--port", "4000"]);
        assert!(matches!(cli.command, Commands::Serve { port: 4000 }));
    }

    #[test]
    fn test_output_dir_flag() {
        let cli = Cli::parse_from(["silt", "-o", "public", "watch"]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("public")));
    }
}
