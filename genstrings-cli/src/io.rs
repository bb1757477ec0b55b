//! Reading and writing project files.

use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::Path,
};

use genstrings::Error;
use log::debug;
use tempfile::NamedTempFile;

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

fn not_utf8(path: &Path) -> Error {
    Error::file(path_string(path), "is not UTF-8 encoded")
}

/// Reads a UTF-8 text file.
pub fn read_text(path: &Path) -> Result<String, Error> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| not_utf8(path))
}

/// Like [`read_text`], but a missing file is reported as "file not found".
pub fn read_required(path: &Path) -> Result<String, Error> {
    match read_text(path) {
        Err(Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            Err(Error::file(path_string(path), "file not found"))
        }
        other => other,
    }
}

/// Reads a `.strings` file, or `None` if it does not exist.
///
/// A byte order mark selects UTF-16 or UTF-8; without one the file must be
/// UTF-8.
pub fn read_strings(path: &Path) -> Result<Option<String>, Error> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .bom_override(true)
        .build(file);

    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::InvalidData => return Err(not_utf8(path)),
        Err(err) => return Err(err.into()),
    }
    // The decoder passes a UTF-8 byte order mark through.
    if let Some(stripped) = decoded.strip_prefix('\u{FEFF}') {
        decoded = stripped.to_string();
    }
    Ok(Some(decoded))
}

/// Replaces `path` with `content` through a temporary file in the same
/// directory, so readers never see a partial file.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.persist(path).map_err(|err| Error::Io(err.error))?;
    debug!(path:? = path, bytes = content.len(); "Wrote file");
    Ok(())
}

/// Removes `path`; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path:? = path; "Removed file");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
