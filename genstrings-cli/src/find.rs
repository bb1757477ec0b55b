//! Discovery of language directories and source files under the root.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use genstrings::Error;
use ignore::{DirEntry, Walk, WalkBuilder};
use log::debug;
use regex::Regex;

const SOURCE_EXTENSIONS: [&str; 3] = ["swift", "m", "h"];

/// Walks everything under `root`, ignore files and hidden entries included,
/// in path order.
fn walk(root: &Path) -> Walk {
    WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build()
}

fn walk_error(root: &Path, err: ignore::Error) -> Error {
    let message = err.to_string();
    match err.into_io_error() {
        Some(io) => Error::Io(io),
        None => Error::file(root.display().to_string(), message),
    }
}

fn walk_entries(root: &Path) -> impl Iterator<Item = Result<DirEntry, Error>> + '_ {
    walk(root).map(move |entry| entry.map_err(|err| walk_error(root, err)))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(OsStr::to_str)
}

/// Every `*.lproj` directory except `Base.lproj`.
pub fn find_lprojs(root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut lprojs = Vec::new();
    for entry in walk_entries(root) {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        let is_lproj = file_name(entry.path())
            .is_some_and(|name| name.ends_with(".lproj") && name != "Base.lproj");
        if is_lproj {
            lprojs.push(entry.into_path());
        }
    }
    debug!(root:? = root, lprojs = lprojs.len(); "Found lproj directories");
    Ok(lprojs)
}

/// The lproj of the development language.
pub fn find_dev_lproj<'a>(
    root: &Path,
    lprojs: &'a [PathBuf],
    dev_lang: &str,
) -> Result<&'a Path, Error> {
    let target = format!("{dev_lang}.lproj");
    lprojs
        .iter()
        .find(|lproj| file_name(lproj) == Some(target.as_str()))
        .map(PathBuf::as_path)
        .ok_or_else(|| {
            Error::file(root.join(&target).display().to_string(), "directory not found")
        })
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Regular `.swift`, `.m` and `.h` files whose path does not match `exclude`.
pub fn find_source_files(root: &Path, exclude: Option<&Regex>) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in walk_entries(root) {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_source_file(entry.path()) {
            continue;
        }
        if exclude.is_some_and(|re| re.is_match(&entry.path().to_string_lossy())) {
            continue;
        }
        files.push(entry.into_path());
    }
    debug!(root:? = root, files = files.len(); "Found source files");
    Ok(files)
}
