//! Command-line interface for Cypress.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cypress - a compiler from an indentation-structured scripting
/// language to readable C
#[derive(Parser)]
#[command(name = "cypress")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// File to build (when no subcommand is specified)
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a Cypress file for errors without generating code
    Check {
        /// Path to the Cypress file
        file: PathBuf,

        /// Treat warnings as errors
        #[arg(short, long)]
        strict: bool,
    },

    /// Compile a Cypress file to a C header and source pair
    Build {
        /// Path to the Cypress file
        file: PathBuf,

        /// Directory for the generated files (defaults to the input's)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Resolve the actual command to run.
    pub fn resolve_command(&self) -> Option<ResolvedCommand> {
        match &self.command {
            Some(Commands::Check { file, strict }) => Some(ResolvedCommand::Check {
                file: file.clone(),
                strict: *strict,
            }),
            Some(Commands::Build { file, out_dir }) => Some(ResolvedCommand::Build {
                file: file.clone(),
                out_dir: out_dir.clone(),
            }),
            None => self.file.as_ref().map(|file| ResolvedCommand::Build {
                file: file.clone(),
                out_dir: None,
            }),
        }
    }
}

/// Resolved command after processing CLI arguments.
pub enum ResolvedCommand {
    Check { file: PathBuf, strict: bool },
    Build { file: PathBuf, out_dir: Option<PathBuf> },
}
