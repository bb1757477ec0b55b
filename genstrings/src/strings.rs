//! `.strings` files: flat ASCII property lists of string to string.

use log::debug;

use crate::{
    ascii_plist::{AsciiPlistParser, AsciiValue, DictEntry},
    entry::{Entries, Entry},
    error::Error,
    lexer::Grammar,
};

/// Parses `.strings` content into entries in file order.
///
/// Only quoted strings, `=`, `;` and block comments are allowed. The comment
/// right before a key becomes the entry's comment; the entry's position is
/// the key's. Repeated keys are rejected.
pub fn parse_strings_file(src: &str, path: &str) -> Result<Entries, Error> {
    let root = AsciiPlistParser::new(src, path, Grammar::DotStrings).parse()?;
    let (location, kind) = (root.location(path), root.kind());
    let AsciiValue::Dict(dict) = root.value else {
        return Err(Error::parse(
            location,
            format!("unexpected {kind}; expected dict"),
        ));
    };

    let mut entries = Entries::new();
    for (key, DictEntry { key: key_node, value }) in dict {
        let (location, kind) = (value.location(path), value.kind());
        let AsciiValue::String(text) = value.value else {
            return Err(Error::parse(
                location,
                format!("unexpected {kind}; expected string"),
            ));
        };
        entries.push(Entry {
            path: path.to_string(),
            start_line: key_node.line,
            start_col: key_node.col,
            comment: key_node.comment_before,
            key,
            value: text,
        });
    }
    debug!(path, entries = entries.len(); "Parsed strings file");
    Ok(entries)
}
