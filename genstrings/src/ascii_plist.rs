//! Recursive-descent parser for ASCII (OpenStep style) property lists.
//!
//! ```text
//! value  := string | data | array | dict
//! dict   := '{' (string '=' value ';')* '}'
//! array  := '(' (value (',' value)*)? ')'
//! data   := '<' hex* '>'
//! string := quoted | bare
//! ```
//!
//! The top level may also be an empty document (an empty dict), a single
//! string, or a brace-less `key = value;` sequence.
//!
//! Block comments are attached to nodes. A comment directly before a token
//! that starts a value (a string, `{`, `(` or `<`) becomes that node's
//! `comment_before`. A comment after a node that does not precede another
//! value becomes the node's `comment_after`.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::debug;

use crate::{
    error::{Error, Location},
    lexer::{Grammar, Lexer, Lookahead, Token, TokenKind, TokenStream},
    plist::Plist,
};

/// A parsed value with its position and attached comments.
#[derive(Debug, Clone, PartialEq)]
pub struct AsciiNode {
    pub value: AsciiValue,
    pub line: usize,
    pub col: usize,
    pub comment_before: String,
    pub comment_after: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsciiValue {
    String(String),
    Data(Vec<u8>),
    Array(Vec<AsciiNode>),
    /// Keyed by the decoded key, in source order.
    Dict(IndexMap<String, DictEntry>),
}

/// One `key = value;` pair. The key node keeps its own position and comments.
#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub key: AsciiNode,
    pub value: AsciiNode,
}

impl AsciiNode {
    pub fn location(&self, path: &str) -> Location {
        Location::new(path, self.line, self.col)
    }

    /// Drops positions and comments.
    pub fn flatten(&self) -> Plist {
        match &self.value {
            AsciiValue::String(s) => Plist::String(s.clone()),
            AsciiValue::Data(bytes) => Plist::Data(bytes.clone()),
            AsciiValue::Array(items) => Plist::Array(items.iter().map(Self::flatten).collect()),
            AsciiValue::Dict(entries) => Plist::Dict(
                entries
                    .iter()
                    .map(|(key, entry)| (key.clone(), entry.value.flatten()))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    /// Name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self.value {
            AsciiValue::String(_) => "string",
            AsciiValue::Data(_) => "data",
            AsciiValue::Array(_) => "array",
            AsciiValue::Dict(_) => "dict",
        }
    }
}

/// A token together with the last block comment seen before it.
#[derive(Debug, Clone)]
struct Annotated<'a> {
    token: Token<'a>,
    comment: Option<String>,
}

impl Annotated<'_> {
    fn comment(&self) -> String {
        self.comment.clone().unwrap_or_default()
    }

    fn can_have_comment_before(&self) -> bool {
        self.comment.is_some()
            && matches!(
                self.token.kind,
                TokenKind::String
                    | TokenKind::BareString
                    | TokenKind::BraceLeft
                    | TokenKind::LessThan
                    | TokenKind::ParenLeft
            )
    }
}

/// Parser over one input. Used directly by [`parse_ascii_plist`] and, with
/// the `.strings` grammar, by [`crate::strings::parse_strings_file`].
pub(crate) struct AsciiPlistParser<'a> {
    path: &'a str,
    tokens: TokenStream<'a>,
    pending: Lookahead<Annotated<'a>>,
}

impl<'a> AsciiPlistParser<'a> {
    pub(crate) fn new(src: &'a str, path: &'a str, grammar: Grammar) -> Self {
        AsciiPlistParser {
            path,
            tokens: TokenStream::new(Lexer::new(src, grammar)),
            pending: Lookahead::new(),
        }
    }

    fn next(&mut self) -> Annotated<'a> {
        match self.pending.pop() {
            Some(annotated) => annotated,
            None => Annotated {
                token: self.tokens.next_token(),
                comment: None,
            },
        }
    }

    fn backup(&mut self, annotated: Annotated<'a>) {
        self.pending.push(annotated);
    }

    /// Pushes back two tokens so that `first` is read before `second`.
    fn backup2(&mut self, first: Annotated<'a>, second: Annotated<'a>) {
        self.pending.push(second);
        self.pending.push(first);
    }

    /// Skips spaces and comments, annotating the result with the last
    /// comment skipped.
    fn next_non_space(&mut self) -> Annotated<'a> {
        let mut comment = None;
        loop {
            let mut annotated = self.next();
            match annotated.token.kind {
                TokenKind::Spaces => {}
                TokenKind::Comment => comment = Some(annotated.token.value),
                _ => {
                    if comment.is_some() {
                        annotated.comment = comment;
                    }
                    return annotated;
                }
            }
        }
    }

    fn peek_non_space(&mut self) -> Annotated<'a> {
        let annotated = self.next_non_space();
        self.backup(annotated.clone());
        annotated
    }

    /// The comment trailing a node, unless it belongs to the next value.
    fn comment_after(&mut self) -> String {
        let next = self.peek_non_space();
        if next.can_have_comment_before() {
            String::new()
        } else {
            next.comment()
        }
    }

    fn location(&self, token: &Token<'_>) -> Location {
        Location::new(self.path, token.start_line, token.start_col)
    }

    fn unexpected(&self, annotated: &Annotated<'_>) -> Error {
        self.unexpected_token(&annotated.token, None)
    }

    pub(crate) fn unexpected_token(&self, token: &Token<'_>, expected: Option<&str>) -> Error {
        if let Some(kind) = &token.error {
            return Error::Lex {
                location: self.location(token),
                kind: kind.clone(),
            };
        }
        let message = match expected {
            Some(expected) => format!("unexpected {}; expected {expected}", token.describe()),
            None => format!("unexpected {}", token.describe()),
        };
        Error::parse(self.location(token), message)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Annotated<'a>, Error> {
        let annotated = self.next_non_space();
        if annotated.token.kind != kind {
            return Err(self.unexpected_token(&annotated.token, Some(&kind.to_string())));
        }
        Ok(annotated)
    }

    fn node(&self, start: &Annotated<'_>, value: AsciiValue) -> AsciiNode {
        AsciiNode {
            value,
            line: start.token.start_line,
            col: start.token.start_col,
            comment_before: start.comment(),
            comment_after: String::new(),
        }
    }

    pub(crate) fn parse(&mut self) -> Result<AsciiNode, Error> {
        let first = self.next_non_space();
        let node = match first.token.kind {
            TokenKind::Eof => {
                self.backup(first.clone());
                self.parse_dict(&first, TokenKind::Eof)?
            }
            TokenKind::String | TokenKind::BareString => {
                let second = self.next_non_space();
                match second.token.kind {
                    TokenKind::Eof => {
                        self.backup2(first, second);
                        self.parse_string()?
                    }
                    TokenKind::EqualSign => {
                        let start = first.clone();
                        self.backup2(first, second);
                        self.parse_dict(&start, TokenKind::Eof)?
                    }
                    _ => return Err(self.unexpected(&second)),
                }
            }
            _ => {
                self.backup(first);
                self.parse_value()?
            }
        };
        self.expect(TokenKind::Eof)?;
        Ok(node)
    }

    fn parse_value(&mut self) -> Result<AsciiNode, Error> {
        let start = self.next_non_space();
        match start.token.kind {
            TokenKind::String | TokenKind::BareString => {
                self.backup(start);
                self.parse_string()
            }
            TokenKind::BraceLeft => self.parse_dict(&start, TokenKind::BraceRight),
            TokenKind::LessThan => self.parse_data(&start),
            TokenKind::ParenLeft => self.parse_array(&start),
            _ => Err(self.unexpected(&start)),
        }
    }

    fn parse_string(&mut self) -> Result<AsciiNode, Error> {
        self.parse_key().map(|(_, node)| node)
    }

    /// Parses a string node, also handing back its decoded text.
    fn parse_key(&mut self) -> Result<(String, AsciiNode), Error> {
        let token = self.next_non_space();
        match token.token.kind {
            TokenKind::String | TokenKind::BareString => {
                let text = token.token.value.clone();
                let mut node = self.node(&token, AsciiValue::String(text.clone()));
                node.comment_after = self.comment_after();
                Ok((text, node))
            }
            _ => Err(self.unexpected_token(&token.token, Some("string"))),
        }
    }

    fn parse_dict(
        &mut self,
        start: &Annotated<'a>,
        terminator: TokenKind,
    ) -> Result<AsciiNode, Error> {
        let mut entries: IndexMap<String, DictEntry> = IndexMap::new();
        loop {
            let token = self.next_non_space();
            if token.token.kind == terminator {
                let mut node = self.node(start, AsciiValue::Dict(entries));
                node.comment_after = self.comment_after();
                return Ok(node);
            }
            self.backup(token);
            let (name, key) = self.parse_key()?;
            self.expect(TokenKind::EqualSign)?;
            let value = self.parse_value()?;
            self.expect(TokenKind::Semicolon)?;

            if entries.contains_key(&name) {
                return Err(Error::DuplicatedKey {
                    location: key.location(self.path),
                    key: name,
                });
            }
            entries.insert(name, DictEntry { key, value });
        }
    }

    fn parse_array(&mut self, start: &Annotated<'a>) -> Result<AsciiNode, Error> {
        let mut items = Vec::new();
        loop {
            let token = self.next_non_space();
            if token.token.kind == TokenKind::ParenRight {
                let mut node = self.node(start, AsciiValue::Array(items));
                node.comment_after = self.comment_after();
                return Ok(node);
            }
            self.backup(token);
            if !items.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            items.push(self.parse_value()?);
        }
    }

    fn parse_data(&mut self, start: &Annotated<'a>) -> Result<AsciiNode, Error> {
        let mut digits = String::new();
        loop {
            let token = self.next_non_space();
            match token.token.kind {
                TokenKind::GreaterThan => {
                    let bytes = hex::decode(&digits).map_err(|err| {
                        Error::parse(
                            self.location(&start.token),
                            format!("malformed data: {err}"),
                        )
                    })?;
                    let mut node = self.node(start, AsciiValue::Data(bytes));
                    node.comment_after = self.comment_after();
                    return Ok(node);
                }
                TokenKind::BareString
                    if token.token.value.chars().all(|c| c.is_ascii_hexdigit()) =>
                {
                    digits.push_str(&token.token.value);
                }
                _ => return Err(self.unexpected_token(&token.token, Some("hex digits"))),
            }
        }
    }
}

/// Parses an ASCII property list. `path` is only used in diagnostics.
///
/// ```
/// use genstrings::{parse_ascii_plist, Plist};
///
/// let node = parse_ascii_plist("greeting = hello;", "demo.plist").unwrap();
/// let Plist::Dict(dict) = node.flatten() else { panic!() };
/// assert_eq!(dict["greeting"], Plist::from("hello"));
/// ```
pub fn parse_ascii_plist(src: &str, path: &str) -> Result<AsciiNode, Error> {
    let node = AsciiPlistParser::new(src, path, Grammar::AsciiPlist).parse()?;
    debug!(path, kind = node.kind(); "Parsed ASCII plist");
    Ok(node)
}
