use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A property-list value stripped of positions and comments.
///
/// Both [`crate::AsciiNode`] and [`crate::XmlNode`] flatten into this type.
/// ASCII plists only ever produce `String`, `Data`, `Array` and `Dict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Plist {
    String(String),
    Data(Vec<u8>),
    Real(f64),
    Integer(i64),
    Bool(bool),
    Date(DateTime<Utc>),
    Array(Vec<Plist>),
    Dict(BTreeMap<String, Plist>),
}

impl Plist {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Plist::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Plist>> {
        match self {
            Plist::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<&str> for Plist {
    fn from(value: &str) -> Self {
        Plist::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_untagged_json() {
        let mut dict = BTreeMap::new();
        dict.insert("b".to_string(), Plist::Data(vec![1, 255]));
        dict.insert("a".to_string(), Plist::Array(vec!["x".into(), Plist::Bool(true)]));
        dict.insert("c".to_string(), Plist::Integer(-3));
        let json = serde_json::to_string(&Plist::Dict(dict)).unwrap();
        assert_eq!(json, r#"{"a":["x",true],"b":[1,255],"c":-3}"#);
    }

    #[test]
    fn test_date_serializes_as_rfc3339() {
        let date = DateTime::parse_from_rfc3339("2006-01-02T15:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_string(&Plist::Date(date)).unwrap();
        assert_eq!(json, r#""2006-01-02T15:04:05Z""#);
    }
}
