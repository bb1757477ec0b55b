//! Command-line argument definitions.
//!
//! [`Args`] is parsed with [`clap`]. `sync` is the tool's main mode; `dump`
//! is a debugging aid that shows what the parsers make of a single file.

use clap::{Parser, Subcommand};

pub const DEFAULT_ROUTINE: &str = "NSLocalizedString";

#[derive(Parser, Debug)]
#[command(name = "genstrings", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Update Localizable.strings and InfoPlist.strings of every lproj.
    Sync(SyncArgs),

    /// Parse one file and print it as JSON.
    Dump {
        /// A .strings, .plist, .swift, .m or .h file
        input: String,

        /// The routine name to extract from source files
        #[arg(long, default_value = DEFAULT_ROUTINE)]
        routine: String,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SyncArgs {
    /// The root path to the target
    #[arg(long, default_value = ".")]
    pub root: String,

    /// The path to Info.plist [default: <root>/Info.plist]
    #[arg(long)]
    pub infoplist: Option<String>,

    /// The development language
    #[arg(long, default_value = "en")]
    pub devlang: String,

    /// The routine name to extract
    #[arg(long, default_value = DEFAULT_ROUTINE)]
    pub routine: String,

    /// Source files whose path matches this regex are skipped
    #[arg(long)]
    pub exclude: Option<String>,
}
