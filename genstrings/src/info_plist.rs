//! The localizable subset of an `Info.plist`.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    entry::{Entry, EntryMap},
    error::Error,
    xml_plist::{XmlNode, XmlValue},
};

/// Keys that `InfoPlist.strings` may translate: every privacy usage
/// description plus the display name.
pub fn is_localizable_key(key: &str) -> bool {
    key.ends_with("UsageDescription") || key == "CFBundleDisplayName"
}

/// Values like `$(PRODUCT_NAME)` are filled in at build time.
pub fn is_build_variable(value: &str) -> bool {
    value.starts_with("$(") && value.ends_with(')')
}

/// Localizable key/value pairs of an `Info.plist`, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoPlist(BTreeMap<String, String>);

impl InfoPlist {
    /// Picks the localizable string values out of a parsed `Info.plist`,
    /// whose root must be a dict.
    pub fn from_xml_plist(root: &XmlNode, path: &str) -> Result<Self, Error> {
        let XmlValue::Dict(dict) = &root.value else {
            return Err(Error::parse(
                root.location(path),
                format!("unexpected {}; expected <dict>", root.value),
            ));
        };
        let localizable: BTreeMap<_, _> = dict
            .iter()
            .filter_map(|(key, node)| match &node.value {
                XmlValue::String(value)
                    if is_localizable_key(key) && !is_build_variable(value) =>
                {
                    Some((key.clone(), value.clone()))
                }
                _ => None,
            })
            .collect();
        debug!(path, keys = localizable.len(); "Collected localizable Info.plist keys");
        Ok(InfoPlist(localizable))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Comment-less entries, one per key.
    pub fn to_entry_map(&self) -> EntryMap {
        self.0
            .iter()
            .map(|(key, value)| Entry {
                key: key.clone(),
                value: value.clone(),
                ..Entry::default()
            })
            .collect()
    }
}
