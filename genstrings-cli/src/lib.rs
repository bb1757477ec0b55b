//! Command-line front end: keeps `Localizable.strings` and
//! `InfoPlist.strings` of every lproj in sync with the routine calls in the
//! source code and with `Info.plist`.

pub mod args;
pub mod dump;
pub mod error;
pub mod find;
pub mod io;
pub mod sync;
pub mod validation;

pub use args::{Args, Command, SyncArgs};
pub use error::CliError;
pub use sync::{SyncOptions, SyncSummary, run_sync};

use std::path::Path;

use log::info;

/// Runs the selected subcommand.
pub fn run(args: &Args) -> Result<(), CliError> {
    match &args.command {
        Command::Sync(sync_args) => {
            let options = SyncOptions::from_args(sync_args)?;
            info!(root:? = options.root, info_plist:? = options.info_plist; "Syncing strings");
            let summary = run_sync(&options)?;
            info!(
                written = summary.written.len(),
                removed = summary.removed.len(),
                keys = summary.keys;
                "Strings synced"
            );
        }
        Command::Dump { input, routine } => {
            println!("{}", dump::dump_file(Path::new(input), routine)?);
        }
    }
    Ok(())
}
