//! String-table entries and the merge rules that keep every language's table
//! in step with the source code.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::{
    error::{Error, Location},
    escape::serialize_ascii_plist_string,
    routine_call::RoutineCall,
};

/// Comment given to entries whose call site has none.
pub const NO_COMMENT: &str = "No comment provided by engineer.";

/// One `"key" = "value";` row of a `.strings` file. Key, value and comment
/// are decoded text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub path: String,
    pub start_line: usize,
    pub start_col: usize,
    pub comment: String,
    pub key: String,
    pub value: String,
}

fn comment_or_default(comment: &str) -> String {
    if comment.is_empty() {
        NO_COMMENT.to_string()
    } else {
        comment.to_string()
    }
}

impl Entry {
    /// A fresh, untranslated entry for a call site: the key doubles as the
    /// value.
    pub fn from_routine_call(call: &RoutineCall) -> Self {
        Entry {
            path: call.path.clone(),
            start_line: call.start_line,
            start_col: call.start_col,
            comment: comment_or_default(&call.comment),
            key: call.key.clone(),
            value: call.key.clone(),
        }
    }

    pub fn location(&self) -> Location {
        Location::new(&self.path, self.start_line, self.start_col)
    }

    /// Whether the value is still the key placeholder.
    pub fn is_untranslated(&self) -> bool {
        self.value == self.key
    }

    /// Takes the comment from the call site, keeping the value.
    pub fn merge_call(mut self, call: &RoutineCall) -> Self {
        self.comment = comment_or_default(&call.comment);
        self
    }

    /// Takes the comment from the development language, and its value too if
    /// this entry has not been translated yet.
    pub fn merge_dev(mut self, dev: &Entry) -> Self {
        self.comment = dev.comment.clone();
        if self.is_untranslated() {
            self.value = dev.value.clone();
        }
        self
    }

    /// Renders the entry as `.strings` text followed by a blank line.
    pub fn print(&self, suppress_empty_comment: bool) -> String {
        let mut out = String::new();
        if !suppress_empty_comment || !self.comment.is_empty() {
            // A `*/` inside the comment would close it early.
            out.push_str(&format!("/* {} */\n", self.comment.replace("*/", "* /")));
        }
        out.push_str(&format!(
            "{} = {};\n\n",
            serialize_ascii_plist_string(&self.key),
            serialize_ascii_plist_string(&self.value)
        ));
        out
    }
}

/// Entries in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Entries(Vec<Entry>);

impl Entries {
    pub fn new() -> Self {
        Entries::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.0.iter()
    }

    pub fn push(&mut self, entry: Entry) {
        self.0.push(entry);
    }

    /// Stable sort by key in byte order.
    pub fn sort(mut self) -> Self {
        self.0.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }

    pub fn print(&self, suppress_empty_comment: bool) -> String {
        self.0
            .iter()
            .map(|entry| entry.print(suppress_empty_comment))
            .collect()
    }

    /// Keys the entries, failing on the first repeated key.
    pub fn to_entry_map(&self) -> Result<EntryMap, Error> {
        let mut map = BTreeMap::new();
        for entry in &self.0 {
            if map.contains_key(&entry.key) {
                return Err(Error::DuplicatedKey {
                    location: entry.location(),
                    key: entry.key.clone(),
                });
            }
            map.insert(entry.key.clone(), entry.clone());
        }
        Ok(EntryMap(map))
    }
}

impl From<Vec<Entry>> for Entries {
    fn from(entries: Vec<Entry>) -> Self {
        Entries(entries)
    }
}

impl FromIterator<Entry> for Entries {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Entries(iter.into_iter().collect())
    }
}

impl IntoIterator for Entries {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Entries {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Entries keyed by their key; one per string table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMap(BTreeMap<String, Entry>);

impl EntryMap {
    pub fn new() -> Self {
        EntryMap::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.0.get(key)
    }

    /// Inserts `entry` under its own key, replacing any previous entry.
    pub fn insert(&mut self, entry: Entry) {
        self.0.insert(entry.key.clone(), entry);
    }

    /// Rebuilds the development-language table from the call index. Entries
    /// still referenced by a call are kept and take the call's comment; calls
    /// without an entry become new untranslated entries; everything else is
    /// dropped.
    pub fn merge_calls(&self, calls: &BTreeMap<String, RoutineCall>) -> EntryMap {
        let merged: BTreeMap<_, _> = calls
            .iter()
            .map(|(key, call)| {
                let entry = match self.0.get(key) {
                    Some(existing) => existing.clone().merge_call(call),
                    None => Entry::from_routine_call(call),
                };
                (key.clone(), entry)
            })
            .collect();
        debug!(
            before = self.len(),
            after = merged.len(),
            calls = calls.len();
            "Merged routine calls"
        );
        EntryMap(merged)
    }

    /// Rebuilds a table against the development table `dev`: shared keys are
    /// merged with [`Entry::merge_dev`], keys only in `dev` are copied, keys
    /// missing from `dev` are dropped.
    pub fn merge_dev(&self, dev: &EntryMap) -> EntryMap {
        let merged: BTreeMap<_, _> = dev
            .0
            .iter()
            .map(|(key, dev_entry)| {
                let entry = match self.0.get(key) {
                    Some(existing) => existing.clone().merge_dev(dev_entry),
                    None => dev_entry.clone(),
                };
                (key.clone(), entry)
            })
            .collect();
        debug!(before = self.len(), after = merged.len(); "Merged development table");
        EntryMap(merged)
    }

    /// The entries sorted by key.
    pub fn to_entries(&self) -> Entries {
        self.0.values().cloned().collect()
    }
}

impl FromIterator<Entry> for EntryMap {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut map = EntryMap::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str, comment: &str) -> Entry {
        Entry {
            key: key.to_string(),
            value: value.to_string(),
            comment: comment.to_string(),
            ..Entry::default()
        }
    }

    fn call(key: &str, comment: &str) -> RoutineCall {
        RoutineCall {
            path: "A.swift".to_string(),
            start_line: 1,
            start_col: 1,
            key: key.to_string(),
            comment: comment.to_string(),
        }
    }

    #[test]
    fn test_from_routine_call() {
        let e = Entry::from_routine_call(&call("greeting", ""));
        assert_eq!(e.comment, NO_COMMENT);
        assert_eq!(e.value, "greeting");
        assert!(e.is_untranslated());
        assert_eq!(e.location(), Location::new("A.swift", 1, 1));

        let e = Entry::from_routine_call(&call("greeting", "Shown on launch"));
        assert_eq!(e.comment, "Shown on launch");
    }

    #[test]
    fn test_merge_call() {
        let e = Entry::default().merge_call(&call("k", "comment"));
        assert_eq!(e.comment, "comment");
        let e = e.merge_call(&call("k", ""));
        assert_eq!(e.comment, NO_COMMENT);
    }

    #[test]
    fn test_merge_dev() {
        let e = Entry::default().merge_dev(&entry("", "", "comment"));
        assert_eq!(e.comment, "comment");

        let untranslated = entry("key", "key", "").merge_dev(&entry("key", "value", ""));
        assert_eq!(untranslated.value, "value");

        let translated = entry("key", "Schlüssel", "").merge_dev(&entry("key", "value", ""));
        assert_eq!(translated.value, "Schlüssel");
    }

    #[test]
    fn test_entry_print() {
        assert_eq!(
            entry("key", "value", "comment").print(false),
            "/* comment */\n\"key\" = \"value\";\n\n"
        );
        assert_eq!(entry("key", "value", "").print(true), "\"key\" = \"value\";\n\n");
        assert_eq!(entry("key", "value", "").print(false), "/*  */\n\"key\" = \"value\";\n\n");
        assert_eq!(
            entry("say \"hi\"", "line\nbreak", "c").print(true),
            "/* c */\n\"say \\\"hi\\\"\" = \"line\\nbreak\";\n\n"
        );
    }

    #[test]
    fn test_entry_print_keeps_comment_open_until_its_end() {
        let printed = entry("k", "v", "50% */ off").print(false);
        assert_eq!(printed, "/* 50% * / off */\n\"k\" = \"v\";\n\n");

        let parsed = crate::strings::parse_strings_file(&printed, "Localizable.strings").unwrap();
        let parsed = parsed.iter().next().unwrap();
        assert_eq!(parsed.comment, "50% * / off");
        assert_eq!(parsed.value, "v");
    }

    #[test]
    fn test_entries_sort_by_byte_order() {
        let entries: Entries = vec![entry("a", "", ""), entry("A", "", ""), entry("0", "", "")].into();
        let keys: Vec<_> = entries.sort().iter().map(|e| e.key.clone()).collect();
        assert_eq!(keys, ["0", "A", "a"]);
    }

    #[test]
    fn test_entries_print() {
        let entries: Entries = vec![
            entry("key1", "value1", "comment1"),
            entry("key2", "value2", "comment2"),
        ]
        .into();
        assert_eq!(
            entries.print(false),
            "/* comment1 */\n\"key1\" = \"value1\";\n\n/* comment2 */\n\"key2\" = \"value2\";\n\n"
        );

        let entries: Entries = vec![
            entry("NFCReaderUsageDescription", "Use NFC", ""),
            entry("NSCameraUsageDescription", "Use camera", ""),
        ]
        .into();
        assert_eq!(
            entries.print(true),
            "\"NFCReaderUsageDescription\" = \"Use NFC\";\n\n\"NSCameraUsageDescription\" = \"Use camera\";\n\n"
        );
    }

    #[test]
    fn test_to_entry_map_rejects_duplicates() {
        let mut second = entry("k", "2", "");
        second.path = "en.lproj/Localizable.strings".to_string();
        second.start_line = 4;
        second.start_col = 1;
        let entries: Entries = vec![entry("k", "1", ""), second].into();
        let err = entries.to_entry_map().unwrap_err();
        assert_eq!(
            err.to_string(),
            "en.lproj/Localizable.strings:4:1: duplicated key `k`"
        );
    }

    #[test]
    fn test_entry_map_merge_calls() {
        let existing: EntryMap = [
            entry("key1", "value1", "comment1"),
            entry("key2", "value2", "comment2_old"),
        ]
        .into_iter()
        .collect();
        let calls = BTreeMap::from([
            ("key2".to_string(), call("key2", "comment2_new")),
            ("key3".to_string(), call("key3", "comment3")),
        ]);
        let merged = existing.merge_calls(&calls);

        assert_eq!(merged.len(), 2);
        assert!(merged.get("key1").is_none());
        let key2 = merged.get("key2").unwrap();
        assert_eq!((key2.value.as_str(), key2.comment.as_str()), ("value2", "comment2_new"));
        let key3 = merged.get("key3").unwrap();
        assert_eq!((key3.value.as_str(), key3.comment.as_str()), ("key3", "comment3"));
    }

    #[test]
    fn test_entry_map_merge_dev() {
        let ja: EntryMap = [
            entry("unused_key", "", ""),
            entry("key1", "key1", ""),
            entry("key2", "value2_ja", ""),
        ]
        .into_iter()
        .collect();
        let en: EntryMap = [
            entry("key1", "value1_en", "c1"),
            entry("key2", "value2_en", "c2"),
            entry("key3", "value3_en", "c3"),
        ]
        .into_iter()
        .collect();
        let merged = ja.merge_dev(&en);

        assert!(merged.get("unused_key").is_none());
        assert_eq!(merged.get("key1").unwrap().value, "value1_en");
        assert_eq!(merged.get("key2").unwrap().value, "value2_ja");
        assert_eq!(merged.get("key2").unwrap().comment, "c2");
        assert_eq!(merged.get("key3").unwrap(), en.get("key3").unwrap());
    }

    #[test]
    fn test_to_entries_is_sorted() {
        let map: EntryMap = [entry("a", "", ""), entry("A", "", ""), entry("0", "", "")]
            .into_iter()
            .collect();
        let keys: Vec<_> = map.to_entries().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, ["0", "A", "a"]);
    }
}
