//! Binary entry point: parse the command line, start logging, open the
//! database, then either run a headless command or the interactive UI.
use anyhow::Result;
use clap::Parser;
use tracing::info;

use repertoire_manager::backup::{restore_backup, write_backup};
use repertoire_manager::config::{BackupAction, Cli, CliCommand, Settings};
use repertoire_manager::db::{fetch_show, open_database};
use repertoire_manager::export::{default_pdf_path, export_setlist_pdf};
use repertoire_manager::logging::init_logging;
use repertoire_manager::platform::SystemOpener;
use repertoire_manager::{run_app, App};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;
    init_logging(&settings.log_file)?;
    info!(db = %settings.db_path.display(), "starting repertoire manager");

    let conn = open_database(&settings.db_path)?;

    match cli.command {
        None => {
            let mut app = App::new(conn, settings, Box::new(SystemOpener))?;
            run_app(&mut app)
        }
        Some(CliCommand::ExportPdf { show, out }) => {
            let path = match out {
                Some(path) => path,
                None => default_pdf_path(&settings.export_dir, &fetch_show(&conn, show)?),
            };
            export_setlist_pdf(&conn, show, &path)?;
            println!("Setlist written to {}", path.display());
            Ok(())
        }
        Some(CliCommand::Backup {
            action: BackupAction::Export { path },
        }) => {
            let backup = write_backup(&conn, &path)?;
            println!(
                "Backup written to {}: {} songs, {} shows, {} setlist entries",
                path.display(),
                backup.musicas.len(),
                backup.shows.len(),
                backup.repertorios.len()
            );
            Ok(())
        }
        Some(CliCommand::Backup {
            action: BackupAction::Import { path },
        }) => {
            let summary = restore_backup(&conn, &path)?;
            println!(
                "Imported {} songs, {} shows, {} setlist entries ({} skipped)",
                summary.songs, summary.shows, summary.links, summary.skipped
            );
            Ok(())
        }
    }
}
