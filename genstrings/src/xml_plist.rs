//! Parser for Apple XML property lists, driven by `quick-xml` events.
//!
//! The document must be exactly
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
//! <plist>VALUE</plist>
//! ```
//!
//! with comments and whitespace allowed between elements.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use log::debug;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::{
    error::{Error, Location},
    plist::Plist,
    position::LineIndex,
};

const PLIST_DOCTYPE: &str =
    r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

const ANY_VALUE: &str =
    "one of <string>, <real>, <integer>, <true>, <false>, <date>, <data>, <array>, <dict>";

/// A parsed value and the position of its opening tag.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub value: XmlValue,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    String(String),
    Real(f64),
    Integer(i64),
    Bool(bool),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    Array(Vec<XmlNode>),
    Dict(BTreeMap<String, XmlNode>),
}

impl Display for XmlValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            XmlValue::String(_) => "<string>",
            XmlValue::Real(_) => "<real>",
            XmlValue::Integer(_) => "<integer>",
            XmlValue::Bool(true) => "<true>",
            XmlValue::Bool(false) => "<false>",
            XmlValue::Date(_) => "<date>",
            XmlValue::Data(_) => "<data>",
            XmlValue::Array(_) => "<array>",
            XmlValue::Dict(_) => "<dict>",
        };
        f.write_str(name)
    }
}

impl XmlNode {
    pub fn location(&self, path: &str) -> Location {
        Location::new(path, self.line, self.col)
    }

    pub fn flatten(&self) -> Plist {
        match &self.value {
            XmlValue::String(s) => Plist::String(s.clone()),
            XmlValue::Real(f) => Plist::Real(*f),
            XmlValue::Integer(i) => Plist::Integer(*i),
            XmlValue::Bool(b) => Plist::Bool(*b),
            XmlValue::Date(d) => Plist::Date(*d),
            XmlValue::Data(bytes) => Plist::Data(bytes.clone()),
            XmlValue::Array(items) => Plist::Array(items.iter().map(Self::flatten).collect()),
            XmlValue::Dict(entries) => Plist::Dict(
                entries
                    .iter()
                    .map(|(key, node)| (key.clone(), node.flatten()))
                    .collect(),
            ),
        }
    }
}

/// How an event reads in a diagnostic.
fn describe(event: &Event<'_>) -> String {
    match event {
        Event::Start(e) | Event::Empty(e) => {
            format!("<{}>", String::from_utf8_lossy(e.name().as_ref()))
        }
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) => "text".to_string(),
        Event::CData(_) => "CDATA".to_string(),
        Event::Comment(_) => "comment".to_string(),
        Event::Decl(_) => "<?xml?>".to_string(),
        Event::PI(_) => "processing instruction".to_string(),
        Event::DocType(_) => "<!DOCTYPE>".to_string(),
        Event::Eof => "EOF".to_string(),
    }
}

struct XmlPlistParser<'a> {
    reader: Reader<&'a [u8]>,
    index: LineIndex,
    path: &'a str,
    /// Byte offset where the most recently read event starts.
    offset: usize,
}

impl<'a> XmlPlistParser<'a> {
    fn new(src: &'a str, path: &'a str) -> Self {
        let mut reader = Reader::from_str(src);
        reader.config_mut().expand_empty_elements = true;
        XmlPlistParser {
            reader,
            index: LineIndex::new(src),
            path,
            offset: 0,
        }
    }

    fn here(&self) -> Location {
        let (line, col) = self.index.line_col(self.offset);
        Location::new(self.path, line, col)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::parse(self.here(), message)
    }

    fn unexpected(&self, event: &Event<'_>, expected: &str) -> Error {
        self.error_here(format!("unexpected {}; expected {expected}", describe(event)))
    }

    fn next_event(&mut self) -> Result<Event<'a>, Error> {
        self.offset = self.reader.buffer_position() as usize;
        self.reader
            .read_event()
            .map_err(|err| self.error_here(err.to_string()))
    }

    /// Skips comments and whitespace-only text.
    fn next_non_space(&mut self) -> Result<Event<'a>, Error> {
        loop {
            match self.next_event()? {
                Event::Comment(_) => {}
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
                event => return Ok(event),
            }
        }
    }

    fn expect_start(&mut self, expected: &str) -> Result<BytesStart<'a>, Error> {
        match self.next_non_space()? {
            Event::Start(start) => Ok(start),
            event => Err(self.unexpected(&event, expected)),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<(), Error> {
        match self.next_non_space()? {
            Event::End(end) if end.name().as_ref() == name.as_bytes() => Ok(()),
            event => Err(self.unexpected(&event, &format!("</{name}>"))),
        }
    }

    fn parse(&mut self) -> Result<XmlNode, Error> {
        self.expect_declaration()?;
        self.expect_doctype()?;
        let plist = self.expect_start("<plist>")?;
        if plist.name().as_ref() != b"plist" {
            return Err(self.unexpected(&Event::Start(plist), "<plist>"));
        }
        let start = self.expect_start(ANY_VALUE)?;
        let node = self
            .parse_value(&start)?
            .ok_or_else(|| self.unexpected(&Event::Start(start.clone()), ANY_VALUE))?;
        self.expect_end("plist")?;
        match self.next_non_space()? {
            Event::Eof => Ok(node),
            event => Err(self.unexpected(&event, "EOF")),
        }
    }

    /// The attributes must be spelled exactly as Xcode writes them.
    fn expect_declaration(&mut self) -> Result<(), Error> {
        const EXPECTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
        const ATTRIBUTES: &[u8] = br#"version="1.0" encoding="UTF-8""#;
        match self.next_event()? {
            Event::Decl(decl)
                if decl
                    .strip_prefix(b"xml")
                    .map(<[u8]>::trim_ascii_start)
                    == Some(ATTRIBUTES) =>
            {
                Ok(())
            }
            event => Err(self.unexpected(&event, EXPECTED)),
        }
    }

    fn expect_doctype(&mut self) -> Result<(), Error> {
        match self.next_non_space()? {
            Event::DocType(doctype) => {
                let text = String::from_utf8_lossy(&doctype);
                let text = text.trim();
                let text = text.strip_prefix("DOCTYPE").unwrap_or(text).trim();
                if text == PLIST_DOCTYPE {
                    Ok(())
                } else {
                    Err(self.error_here(format!(
                        "unexpected <!DOCTYPE {text}>; expected <!DOCTYPE {PLIST_DOCTYPE}>"
                    )))
                }
            }
            event => Err(self.unexpected(&event, "<!DOCTYPE>")),
        }
    }

    /// Parses the element opened by `start`. Returns `None` without consuming
    /// anything further when the element is not a plist value.
    fn parse_value(&mut self, start: &BytesStart<'_>) -> Result<Option<XmlNode>, Error> {
        let (line, col) = self.index.line_col(self.offset);
        let path = self.path;
        let invalid = |message: String| Error::parse(Location::new(path, line, col), message);
        let value = match start.name().as_ref() {
            b"string" => XmlValue::String(self.parse_text("string")?),
            b"real" => {
                let text = self.parse_text("real")?;
                let real = text.parse::<f64>();
                XmlValue::Real(real.map_err(|err| invalid(err.to_string()))?)
            }
            b"integer" => {
                let text = self.parse_text("integer")?;
                let integer = text.parse::<i64>();
                XmlValue::Integer(integer.map_err(|err| invalid(err.to_string()))?)
            }
            b"true" => {
                self.expect_end("true")?;
                XmlValue::Bool(true)
            }
            b"false" => {
                self.expect_end("false")?;
                XmlValue::Bool(false)
            }
            b"date" => {
                let text = self.parse_text("date")?;
                let date = DateTime::parse_from_rfc3339(&text)
                    .map_err(|err| invalid(format!("invalid date: {err}")))?;
                XmlValue::Date(date.with_timezone(&Utc))
            }
            b"data" => {
                let text = self.parse_text("data")?;
                let compact: String = text.split_ascii_whitespace().collect();
                let bytes = STANDARD
                    .decode(compact)
                    .map_err(|err| invalid(format!("invalid data: {err}")))?;
                XmlValue::Data(bytes)
            }
            b"array" => XmlValue::Array(self.parse_array()?),
            b"dict" => XmlValue::Dict(self.parse_dict()?),
            _ => return Ok(None),
        };
        Ok(Some(XmlNode { value, line, col }))
    }

    /// Collects the character data of a text-only element up to `</name>`.
    fn parse_text(&mut self, name: &str) -> Result<String, Error> {
        let mut out = String::new();
        loop {
            match self.next_event()? {
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|err| self.error_here(err.to_string()))?;
                    out.push_str(&text);
                }
                Event::CData(cdata) => {
                    let text = std::str::from_utf8(&cdata)
                        .map_err(|err| self.error_here(err.to_string()))?;
                    out.push_str(text);
                }
                Event::Comment(_) => {}
                Event::End(end) if end.name().as_ref() == name.as_bytes() => return Ok(out),
                event => return Err(self.unexpected(&event, &format!("</{name}>"))),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Vec<XmlNode>, Error> {
        let mut items = Vec::new();
        loop {
            match self.next_non_space()? {
                Event::End(end) if end.name().as_ref() == b"array" => return Ok(items),
                Event::Start(start) => match self.parse_value(&start)? {
                    Some(node) => items.push(node),
                    None => return Err(self.unexpected(&Event::Start(start), ANY_VALUE)),
                },
                event => return Err(self.unexpected(&event, ANY_VALUE)),
            }
        }
    }

    fn parse_dict(&mut self) -> Result<BTreeMap<String, XmlNode>, Error> {
        let mut entries = BTreeMap::new();
        loop {
            match self.next_non_space()? {
                Event::End(end) if end.name().as_ref() == b"dict" => return Ok(entries),
                Event::Start(start) if start.name().as_ref() == b"key" => {
                    let location = self.here();
                    let key = self.parse_text("key")?;
                    let start = self.expect_start(ANY_VALUE)?;
                    if entries.contains_key(&key) {
                        return Err(Error::DuplicatedKey { location, key });
                    }
                    match self.parse_value(&start)? {
                        Some(node) => {
                            entries.insert(key, node);
                        }
                        None => {
                            debug!(
                                path = self.path,
                                key = key.as_str();
                                "Skipping unknown element in plist dict"
                            );
                            self.reader
                                .read_to_end(start.name())
                                .map_err(|err| self.error_here(err.to_string()))?;
                        }
                    }
                }
                event => return Err(self.unexpected(&event, "<key>")),
            }
        }
    }
}

/// Parses an XML property list. `path` is only used in diagnostics.
pub fn parse_xml_plist(src: &str, path: &str) -> Result<XmlNode, Error> {
    let node = XmlPlistParser::new(src, path).parse()?;
    debug!(path, root:% = node.value; "Parsed XML plist");
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = r#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd"><plist version="1.0">"#;

    fn wrapped(body: &str) -> String {
        format!("{PREFIX}{body}</plist>")
    }

    fn flat(body: &str) -> Plist {
        parse_xml_plist(&wrapped(body), "")
            .unwrap_or_else(|err| panic!("{body:?}: {err}"))
            .flatten()
    }

    fn error(src: &str) -> String {
        parse_xml_plist(src, "Info.plist").unwrap_err().to_string()
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(flat("<string/>"), Plist::from(""));
        assert_eq!(flat("<string></string>"), Plist::from(""));
        assert_eq!(flat("<string>1</string>"), Plist::from("1"));
        assert_eq!(flat("<string>a &amp; b</string>"), Plist::from("a & b"));
        assert_eq!(flat("<string><![CDATA[<x>]]></string>"), Plist::from("<x>"));
        assert_eq!(flat("<integer>-1</integer>"), Plist::Integer(-1));
        assert_eq!(flat("<real>1.5</real>"), Plist::Real(1.5));
        assert_eq!(flat("<true></true>"), Plist::Bool(true));
        assert_eq!(flat("<true/>"), Plist::Bool(true));
        assert_eq!(flat("<false></false>"), Plist::Bool(false));
        assert_eq!(flat("<false/>"), Plist::Bool(false));
    }

    #[test]
    fn test_parse_date() {
        let expected = DateTime::parse_from_rfc3339("2017-12-25T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            flat("<date>2017-12-25T00:00:00Z</date>"),
            Plist::Date(expected)
        );
    }

    #[test]
    fn test_parse_data() {
        assert_eq!(flat("<data>ab+/</data>"), Plist::Data(vec![105, 191, 191]));
        assert_eq!(
            flat("<data>\t\n ab+/\t\n </data>"),
            Plist::Data(vec![105, 191, 191])
        );
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(flat("<array></array>"), Plist::Array(vec![]));
        assert_eq!(
            flat("<array><true/></array>"),
            Plist::Array(vec![Plist::Bool(true)])
        );
        assert_eq!(flat("<dict></dict>"), Plist::Dict(BTreeMap::new()));
        assert_eq!(
            flat("<dict><key/><string/></dict>"),
            Plist::Dict(BTreeMap::from([(String::new(), Plist::from(""))]))
        );
    }

    #[test]
    fn test_unknown_element_after_key_is_skipped() {
        let plist = flat(
            "<dict><key>a</key><future><x>1</x></future><key>b</key><string>2</string></dict>",
        );
        assert_eq!(
            plist,
            Plist::Dict(BTreeMap::from([("b".to_string(), Plist::from("2"))]))
        );
    }

    #[test]
    fn test_positions_point_at_opening_tags() {
        let src = indoc::indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
            <plist version="1.0">
            <dict>
                <key>CFBundleDisplayName</key>
                <string>Demo</string>
            </dict>
            </plist>
        "#};
        let node = parse_xml_plist(src, "").unwrap();
        assert_eq!((node.line, node.col), (4, 1));
        let XmlValue::Dict(entries) = &node.value else {
            panic!("expected a dict");
        };
        let value = &entries["CFBundleDisplayName"];
        assert_eq!((value.line, value.col), (6, 5));
        assert_eq!(value.value.to_string(), "<string>");
    }

    #[test]
    fn test_self_closing_unknown_element_after_key_is_skipped() {
        let plist = flat("<dict><key>a</key><future/><key>b</key><true/></dict>");
        assert_eq!(
            plist,
            Plist::Dict(BTreeMap::from([("b".to_string(), Plist::Bool(true))]))
        );
    }

    #[test]
    fn test_duplicated_key() {
        let src = indoc::indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
            <plist version="1.0">
            <dict>
                <key>a</key><true/>
                <key>a</key><false/>
            </dict>
            </plist>
        "#};
        let err = parse_xml_plist(src, "Info.plist").unwrap_err();
        assert!(matches!(err, Error::DuplicatedKey { ref key, .. } if key == "a"));
        assert_eq!(err.to_string(), "Info.plist:6:5: duplicated key `a`");
    }

    #[test]
    fn test_header_is_required() {
        let body = "<plist><string/></plist>";
        assert!(error(body).contains("expected <?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let wrong_encoding = format!(r#"<?xml version="1.0" encoding="UTF-16"?>{body}"#);
        assert!(error(&wrong_encoding).starts_with("Info.plist:1:1: unexpected <?xml?>"));

        let single_quoted = format!("<?xml version='1.0' encoding='UTF-8'?>{body}");
        assert!(error(&single_quoted).starts_with("Info.plist:1:1: unexpected <?xml?>"));

        let reordered = format!(r#"<?xml encoding="UTF-8" version="1.0"?>{body}"#);
        assert!(error(&reordered).starts_with("Info.plist:1:1: unexpected <?xml?>"));

        let missing_doctype = format!(r#"<?xml version="1.0" encoding="UTF-8"?>{body}"#);
        assert!(error(&missing_doctype).contains("unexpected <plist>; expected <!DOCTYPE>"));

        let wrong_doctype = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE plist SYSTEM "plist.dtd">{body}"#
        );
        assert!(
            error(&wrong_doctype)
                .contains(r#"unexpected <!DOCTYPE plist SYSTEM "plist.dtd">; expected <!DOCTYPE plist PUBLIC"#)
        );
    }

    #[test]
    fn test_value_errors() {
        assert!(error(&wrapped("<integer>1.5</integer>")).contains("invalid digit"));
        assert!(error(&wrapped("<integer> 5 </integer>")).contains("invalid digit"));
        assert!(error(&wrapped("<real> 1.5</real>")).contains("invalid float literal"));
        assert!(error(&wrapped("<date> 2017-12-25T00:00:00Z</date>")).contains("invalid date"));
        assert!(error(&wrapped("<real>x</real>")).contains("invalid float literal"));
        assert!(error(&wrapped("<date>yesterday</date>")).contains("invalid date"));
        assert!(error(&wrapped("<data>!!</data>")).contains("invalid data"));
        assert!(error(&wrapped("<foo/>")).contains(&format!("unexpected <foo>; expected {ANY_VALUE}")));
        assert!(error(&wrapped("<dict><string/></dict>")).contains("unexpected <string>; expected <key>"));
        assert!(error(&wrapped("<true>x</true>")).contains("unexpected text; expected </true>"));
    }

    #[test]
    fn test_trailing_content_is_rejected() {
        let src = format!("{}<string/>", wrapped("<true/>"));
        assert!(error(&src).contains("unexpected <string>; expected EOF"));
    }

    #[test]
    fn test_xml_value_display() {
        assert_eq!(XmlValue::Bool(false).to_string(), "<false>");
        assert_eq!(XmlValue::Dict(BTreeMap::new()).to_string(), "<dict>");
    }
}
