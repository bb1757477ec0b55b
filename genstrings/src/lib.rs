#![forbid(unsafe_code)]
//! Extracts localizable strings from Swift and Objective-C sources and keeps
//! per-language `.strings` tables in sync with them.
//!
//! The crate is a set of small hand-written lexers and parsers:
//!
//! - ASCII property lists, which is what `.strings` files are
//! - XML property lists such as `Info.plist`
//! - calls to a localization routine (`NSLocalizedString` by default) in
//!   Swift or Objective-C source
//!
//! plus the entry model and the merge rules built on top of them.
//!
//! # Quick Start
//!
//! ```rust
//! use genstrings::{index_routine_calls, parse_strings_file, scan_routine_calls};
//!
//! let source = r#"label.text = NSLocalizedString("greeting", comment: "Shown on launch")"#;
//! let calls = scan_routine_calls(source, "NSLocalizedString", "View.swift")?;
//! let calls = index_routine_calls(&calls)?;
//!
//! let existing = parse_strings_file("", "en.lproj/Localizable.strings")?;
//! let table = existing.to_entry_map()?.merge_calls(&calls);
//! assert_eq!(
//!     table.to_entries().print(false),
//!     "/* Shown on launch */\n\"greeting\" = \"greeting\";\n\n"
//! );
//! # Ok::<(), genstrings::Error>(())
//! ```
//!
//! Every parser stops at the first problem and reports it as an [`Error`]
//! positioned as `path:line:col`.

pub mod ascii_plist;
pub mod entry;
pub mod error;
mod escape;
pub mod info_plist;
pub mod lexer;
pub mod plist;
pub mod position;
pub mod routine_call;
pub mod strings;
pub mod xml_plist;

// Re-export most used types for easy consumption
pub use crate::{
    ascii_plist::{AsciiNode, AsciiValue, DictEntry, parse_ascii_plist},
    entry::{Entries, Entry, EntryMap, NO_COMMENT},
    error::{Error, LexErrorKind, Location},
    escape::serialize_ascii_plist_string,
    info_plist::InfoPlist,
    lexer::{Dialect, Grammar, Lexer, Token, TokenKind, TokenStream},
    plist::Plist,
    position::LineIndex,
    routine_call::{RoutineCall, index_routine_calls, scan_routine_calls},
    strings::parse_strings_file,
    xml_plist::{XmlNode, XmlValue, parse_xml_plist},
};
