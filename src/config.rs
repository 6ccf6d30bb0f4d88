//! Command line surface and the settings resolved from it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::BaseDirs;

use crate::db::{data_dir, default_db_path};

pub const LOG_FILE_NAME: &str = "repertoire-manager.log";

#[derive(Parser, Debug)]
#[command(name = "repertoire-manager")]
#[command(about = "Song catalog and show setlists for working musicians", version)]
pub struct Cli {
    /// SQLite database file (defaults to ~/.repertoire-manager/repertorio.db)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Directory offered by default when saving PDFs and backups
    #[arg(long, value_name = "PATH")]
    pub export_dir: Option<PathBuf>,

    /// Where log output goes; the terminal is reserved for the UI
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Write a show's setlist as a PDF without opening the UI
    ExportPdf {
        /// Show id
        #[arg(long)]
        show: i64,

        /// Output file (defaults to the generated name inside the export dir)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Export or import a JSON backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackupAction {
    /// Write the whole catalog to a file
    Export { path: PathBuf },
    /// Merge a backup file into the catalog
    Import { path: PathBuf },
}

/// Paths the application runs with, after defaults are filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        let export_dir = match &cli.export_dir {
            Some(path) => path.clone(),
            None => BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .context("could not determine the home directory")?,
        };
        let log_file = match &cli.log_file {
            Some(path) => path.clone(),
            None => data_dir()?.join(LOG_FILE_NAME),
        };

        Ok(Self {
            db_path,
            export_dir,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win_over_defaults() {
        let cli = Cli::parse_from([
            "repertoire-manager",
            "--db",
            "/tmp/r.db",
            "--export-dir",
            "/tmp/out",
            "--log-file",
            "/tmp/r.log",
        ]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("/tmp/r.db"));
        assert_eq!(settings.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(settings.log_file, PathBuf::from("/tmp/r.log"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_headless_subcommands() {
        let cli = Cli::parse_from(["repertoire-manager", "export-pdf", "--show", "3"]);
        assert_eq!(cli.command, Some(CliCommand::ExportPdf { show: 3, out: None }));

        let cli = Cli::parse_from(["repertoire-manager", "backup", "import", "b.json"]);
        assert_eq!(
            cli.command,
            Some(CliCommand::Backup {
                action: BackupAction::Import {
                    path: PathBuf::from("b.json")
                }
            })
        );
    }
}
