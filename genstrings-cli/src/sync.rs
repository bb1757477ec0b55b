//! The sync workflow: find the lprojs and source files, read and validate
//! every input, merge, then write every table back.
//!
//! Nothing is written unless every input parsed and validated.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use genstrings::{
    Entries, EntryMap, Error, InfoPlist, RoutineCall, index_routine_calls, parse_strings_file,
    parse_xml_plist, scan_routine_calls,
};
use log::{debug, info};
use rayon::prelude::*;
use regex::Regex;

use crate::{
    args::SyncArgs,
    error::CliError,
    find::{find_dev_lproj, find_lprojs, find_source_files},
    io::{read_required, read_strings, read_text, remove_if_exists, write_atomic},
    validation::{compile_exclude, validate_language_code, validate_routine_name},
};

const LOCALIZABLE_STRINGS: &str = "Localizable.strings";
const INFO_PLIST_STRINGS: &str = "InfoPlist.strings";

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub root: PathBuf,
    pub info_plist: PathBuf,
    pub dev_lang: String,
    pub routine: String,
    pub exclude: Option<Regex>,
}

impl SyncOptions {
    /// Validates the flags. The Info.plist defaults to `<root>/Info.plist`.
    pub fn from_args(args: &SyncArgs) -> Result<Self, CliError> {
        validate_language_code(&args.devlang).map_err(CliError::InvalidArgument)?;
        validate_routine_name(&args.routine).map_err(CliError::InvalidArgument)?;
        let exclude =
            compile_exclude(args.exclude.as_deref()).map_err(CliError::InvalidArgument)?;

        let root = PathBuf::from(&args.root);
        let info_plist = match &args.infoplist {
            Some(path) => PathBuf::from(path),
            None => root.join("Info.plist"),
        };
        Ok(SyncOptions {
            root,
            info_plist,
            dev_lang: args.devlang.clone(),
            routine: args.routine.clone(),
            exclude,
        })
    }
}

/// What a sync touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub lprojs: usize,
    pub source_files: usize,
    pub keys: usize,
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Parsed `.strings` files of one kind, keyed by lproj. Missing files are
/// empty.
fn read_tables(
    lprojs: &[PathBuf],
    file_name: &str,
) -> Result<BTreeMap<PathBuf, Entries>, Error> {
    lprojs
        .iter()
        .map(|lproj| {
            let path = lproj.join(file_name);
            let entries = match read_strings(&path)? {
                Some(content) => parse_strings_file(&content, &path_string(&path))?,
                None => Entries::new(),
            };
            Ok((lproj.clone(), entries))
        })
        .collect()
}

fn to_entry_maps(
    tables: &BTreeMap<PathBuf, Entries>,
) -> Result<BTreeMap<PathBuf, EntryMap>, Error> {
    tables
        .iter()
        .map(|(lproj, entries)| Ok((lproj.clone(), entries.to_entry_map()?)))
        .collect()
}

/// Scans the source files in parallel; the calls come back in file order.
fn read_routine_calls(files: &[PathBuf], routine: &str) -> Result<Vec<RoutineCall>, Error> {
    let per_file = files
        .par_iter()
        .map(|path| {
            let content = read_text(path)?;
            scan_routine_calls(&content, routine, &path_string(path))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(per_file.into_iter().flatten().collect())
}

fn read_info_plist(path: &Path) -> Result<InfoPlist, Error> {
    let path_str = path_string(path);
    let content = read_required(path)?;
    let root = parse_xml_plist(&content, &path_str)?;
    InfoPlist::from_xml_plist(&root, &path_str)
}

/// Merges the development table first, then every other table against it.
fn merge_languages(
    tables: &BTreeMap<PathBuf, EntryMap>,
    dev_lproj: &Path,
    merge_dev_table: impl FnOnce(&EntryMap) -> EntryMap,
) -> BTreeMap<PathBuf, EntryMap> {
    let empty = EntryMap::new();
    let dev = merge_dev_table(tables.get(dev_lproj).unwrap_or(&empty));
    let mut merged: BTreeMap<_, _> = tables
        .iter()
        .filter(|(lproj, _)| lproj.as_path() != dev_lproj)
        .map(|(lproj, table)| (lproj.clone(), table.merge_dev(&dev)))
        .collect();
    merged.insert(dev_lproj.to_path_buf(), dev);
    merged
}

/// Runs one sync over the project at `options.root`.
pub fn run_sync(options: &SyncOptions) -> Result<SyncSummary, Error> {
    // Find
    let lprojs = find_lprojs(&options.root)?;
    let dev_lproj = find_dev_lproj(&options.root, &lprojs, &options.dev_lang)?;
    let source_files = find_source_files(&options.root, options.exclude.as_ref())?;
    info!(
        lprojs = lprojs.len(),
        source_files = source_files.len(),
        dev_lproj:? = dev_lproj;
        "Found project files"
    );

    // Read
    let info_plist = read_info_plist(&options.info_plist)?;
    let localizable = read_tables(&lprojs, LOCALIZABLE_STRINGS)?;
    let info_plist_strings = read_tables(&lprojs, INFO_PLIST_STRINGS)?;
    let calls = read_routine_calls(&source_files, &options.routine)?;

    // Validate
    let localizable = to_entry_maps(&localizable)?;
    let info_plist_strings = to_entry_maps(&info_plist_strings)?;
    let calls = index_routine_calls(&calls)?;
    debug!(keys = calls.len(), info_plist_keys = info_plist.len(); "Validated inputs");

    // Process
    let localizable = merge_languages(&localizable, dev_lproj, |dev| dev.merge_calls(&calls));
    let info_plist_entries = info_plist.to_entry_map();
    let info_plist_strings =
        merge_languages(&info_plist_strings, dev_lproj, |dev| dev.merge_dev(&info_plist_entries));

    // Write
    let mut summary = SyncSummary {
        lprojs: lprojs.len(),
        source_files: source_files.len(),
        keys: calls.len(),
        ..SyncSummary::default()
    };
    for (lproj, table) in &localizable {
        let path = lproj.join(LOCALIZABLE_STRINGS);
        write_atomic(&path, &table.to_entries().sort().print(false))?;
        summary.written.push(path);
    }
    for (lproj, table) in &info_plist_strings {
        let path = lproj.join(INFO_PLIST_STRINGS);
        let entries = table.to_entries().sort();
        if entries.is_empty() {
            remove_if_exists(&path)?;
            summary.removed.push(path);
        } else {
            write_atomic(&path, &entries.print(true))?;
            summary.written.push(path);
        }
    }
    Ok(summary)
}
