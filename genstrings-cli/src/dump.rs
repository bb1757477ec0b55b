use std::path::Path;

use genstrings::{
    Error, parse_ascii_plist, parse_strings_file, parse_xml_plist, scan_routine_calls,
};
use log::debug;
use serde::Serialize;

use crate::{
    find::is_source_file,
    io::{read_required, read_strings},
};

fn to_json<T: Serialize>(path: &str, value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| Error::file(path, e.to_string()))
}

/// Parses `input` the way `sync` would read it and renders the result as
/// pretty JSON: entries for `.strings`, the value tree for property lists,
/// and the calls to `routine` for source files.
pub fn dump_file(input: &Path, routine: &str) -> Result<String, Error> {
    let path = input.display().to_string();
    let extension = input.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    debug!(path = path.as_str(), extension; "Dumping file");

    match extension {
        "strings" => {
            let content = read_strings(input)?
                .ok_or_else(|| Error::file(path.as_str(), "file not found"))?;
            to_json(&path, &parse_strings_file(&content, &path)?)
        }
        "plist" => {
            let content = read_required(input)?;
            to_json(&path, &parse_xml_plist(&content, &path)?.flatten())
        }
        _ if is_source_file(input) => {
            let content = read_required(input)?;
            to_json(&path, &scan_routine_calls(&content, routine, &path)?)
        }
        _ => {
            let content = read_required(input)?;
            to_json(&path, &parse_ascii_plist(&content, &path)?.flatten())
        }
    }
}
