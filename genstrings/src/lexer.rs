//! A small state-machine lexer shared by every text grammar in the crate.
//!
//! A [`Lexer`] walks an immutable input and yields positioned [`Token`]s on
//! demand. Each call to [`Iterator::next`] runs state transitions until one
//! token has been emitted, so the parser pulls tokens one at a time and the
//! lexer never runs ahead of it. The last token is always [`TokenKind::Eof`]
//! or [`TokenKind::Error`]; after that the iterator is exhausted.
//!
//! Three grammars are built on the same engine, see [`Grammar`].

use std::fmt::{Display, Formatter};

use crate::{error::LexErrorKind, escape, position::LineIndex};

/// The kinds of token the lexers produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Error,
    Eof,
    Comment,
    Spaces,
    /// A quoted string; the token value holds the decoded text.
    String,
    /// An unquoted ASCII plist token, `[A-Za-z0-9$_.:/-]+`.
    BareString,
    Identifier,
    EqualSign,
    Semicolon,
    AtSign,
    Colon,
    Comma,
    ParenLeft,
    ParenRight,
    BraceLeft,
    BraceRight,
    LessThan,
    GreaterThan,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Error => "error",
            TokenKind::Eof => "EOF",
            TokenKind::Comment => "comment",
            TokenKind::Spaces => "spaces",
            TokenKind::String => "string",
            TokenKind::BareString => "bare string",
            TokenKind::Identifier => "identifier",
            TokenKind::EqualSign => "`=`",
            TokenKind::Semicolon => "`;`",
            TokenKind::AtSign => "`@`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::ParenLeft => "`(`",
            TokenKind::ParenRight => "`)`",
            TokenKind::BraceLeft => "`{`",
            TokenKind::BraceRight => "`}`",
            TokenKind::LessThan => "`<`",
            TokenKind::GreaterThan => "`>`",
        };
        f.write_str(name)
    }
}

/// One lexed token. `start`/`end` are byte offsets into the input; the line
/// and column pairs come from [`LineIndex::line_col`] and are `0:0` when the
/// offset is the end of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub raw: &'a str,
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub error: Option<LexErrorKind>,
}

impl Token<'_> {
    /// Whether no token can follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, TokenKind::Eof | TokenKind::Error)
    }

    /// A short human readable description used in "unexpected" diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::String | TokenKind::BareString | TokenKind::Identifier => {
                format!("{} `{}`", self.kind, self.raw)
            }
            kind => kind.to_string(),
        }
    }
}

/// String literal escaping rules of the scanned source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Swift: `\0 \\ \t \n \r \" \'` and `\u{1-8 hex}`.
    Swift,
    /// Objective-C: C escapes, octal, `\x`, `\u`/`\U` universal character names.
    ObjectiveC,
}

/// Which token set a lexer recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `.strings` files: quoted strings, `=`, `;` and block comments.
    DotStrings,
    /// ASCII property lists: adds `{ } ( ) , < >` and bare strings.
    AsciiPlist,
    /// Arbitrary source code scanned for routine calls. Anything that is not
    /// an identifier, a string or one of `@ ( ) : ,` is skipped.
    RoutineCall(Dialect),
}

impl Grammar {
    fn has_block_comments(self) -> bool {
        !matches!(self, Grammar::RoutineCall(_))
    }

    fn punctuation(self, c: char) -> Option<TokenKind> {
        let kind = match (self, c) {
            (Grammar::DotStrings | Grammar::AsciiPlist, '=') => TokenKind::EqualSign,
            (Grammar::DotStrings | Grammar::AsciiPlist, ';') => TokenKind::Semicolon,
            (Grammar::AsciiPlist, '{') => TokenKind::BraceLeft,
            (Grammar::AsciiPlist, '}') => TokenKind::BraceRight,
            (Grammar::AsciiPlist | Grammar::RoutineCall(_), '(') => TokenKind::ParenLeft,
            (Grammar::AsciiPlist | Grammar::RoutineCall(_), ')') => TokenKind::ParenRight,
            (Grammar::AsciiPlist | Grammar::RoutineCall(_), ',') => TokenKind::Comma,
            (Grammar::AsciiPlist, '<') => TokenKind::LessThan,
            (Grammar::AsciiPlist, '>') => TokenKind::GreaterThan,
            (Grammar::RoutineCall(_), '@') => TokenKind::AtSign,
            (Grammar::RoutineCall(_), ':') => TokenKind::Colon,
            _ => return None,
        };
        Some(kind)
    }
}

pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// The bare string alphabet of `plutil`-compatible ASCII plists.
pub(crate) fn is_bare_string_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '$' | '-' | '_' | '.' | ':' | '/')
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Read position over the input. Escape decoders drive it directly.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `c` if it is next.
    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes characters while `pred` holds.
    pub(crate) fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Decide what comes next; emits single-character tokens itself.
    Top,
    Spaces,
    Comment,
    QuotedString,
    BareString,
    Identifier,
    Done,
}

/// Pull-based lexer over one input.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    start: usize,
    index: LineIndex,
    grammar: Grammar,
    state: State,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, grammar: Grammar) -> Self {
        Lexer {
            cursor: Cursor::new(input),
            start: 0,
            index: LineIndex::new(input),
            grammar,
            state: State::Top,
        }
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Runs one state transition, returning a token if one was emitted.
    fn step(&mut self) -> Option<Token<'a>> {
        match self.state {
            State::Top => self.lex_top(),
            State::Spaces => self.lex_spaces(),
            State::Comment => self.lex_comment(),
            State::QuotedString => self.lex_quoted_string(),
            State::BareString => self.lex_bare_string(),
            State::Identifier => self.lex_identifier(),
            State::Done => None,
        }
    }

    fn lex_top(&mut self) -> Option<Token<'a>> {
        if self.grammar.has_block_comments() && self.cursor.rest().starts_with("/*") {
            self.state = State::Comment;
            return None;
        }
        let Some(c) = self.cursor.peek() else {
            return Some(self.eof());
        };
        if is_space(c) {
            self.state = State::Spaces;
            return None;
        }
        if c == '"' {
            self.state = State::QuotedString;
            return None;
        }
        if let Some(kind) = self.grammar.punctuation(c) {
            self.cursor.bump();
            return Some(self.emit(kind));
        }
        match self.grammar {
            Grammar::AsciiPlist if is_bare_string_char(c) => {
                self.state = State::BareString;
                None
            }
            Grammar::RoutineCall(_) if is_identifier_start(c) => {
                self.state = State::Identifier;
                None
            }
            Grammar::RoutineCall(_) => {
                self.cursor.bump();
                self.ignore();
                None
            }
            Grammar::DotStrings | Grammar::AsciiPlist => {
                self.cursor.bump();
                Some(self.fail(LexErrorKind::UnexpectedChar(c)))
            }
        }
    }

    fn lex_spaces(&mut self) -> Option<Token<'a>> {
        self.cursor.eat_while(is_space);
        self.state = State::Top;
        Some(self.emit(TokenKind::Spaces))
    }

    fn lex_comment(&mut self) -> Option<Token<'a>> {
        self.cursor.bump();
        self.cursor.bump();
        let body_start = self.cursor.pos();
        loop {
            if self.cursor.rest().starts_with("*/") {
                let body = self.slice(body_start, self.cursor.pos()).trim().to_string();
                self.cursor.bump();
                self.cursor.bump();
                self.state = State::Top;
                return Some(self.emit_value(TokenKind::Comment, body));
            }
            if self.cursor.bump().is_none() {
                return Some(self.fail(LexErrorKind::UnexpectedEof));
            }
        }
    }

    fn lex_quoted_string(&mut self) -> Option<Token<'a>> {
        self.cursor.bump();
        let decoded = match self.grammar {
            Grammar::DotStrings | Grammar::AsciiPlist => escape::decode_plist(&mut self.cursor),
            Grammar::RoutineCall(Dialect::Swift) => escape::decode_swift(&mut self.cursor),
            Grammar::RoutineCall(Dialect::ObjectiveC) => escape::decode_objc(&mut self.cursor),
        };
        Some(match decoded {
            Ok(value) => {
                self.state = State::Top;
                self.emit_value(TokenKind::String, value)
            }
            Err(kind) => self.fail(kind),
        })
    }

    fn lex_bare_string(&mut self) -> Option<Token<'a>> {
        while let Some(c) = self.cursor.peek() {
            if !is_bare_string_char(c) || self.cursor.rest().starts_with("/*") {
                break;
            }
            self.cursor.bump();
        }
        self.state = State::Top;
        Some(self.emit(TokenKind::BareString))
    }

    fn lex_identifier(&mut self) -> Option<Token<'a>> {
        self.cursor.eat_while(is_identifier);
        self.state = State::Top;
        Some(self.emit(TokenKind::Identifier))
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.cursor.input[from..to]
    }

    fn ignore(&mut self) {
        self.start = self.cursor.pos();
    }

    fn emit(&mut self, kind: TokenKind) -> Token<'a> {
        let value = self.slice(self.start, self.cursor.pos()).to_string();
        self.emit_value(kind, value)
    }

    fn emit_value(&mut self, kind: TokenKind, value: String) -> Token<'a> {
        let token = self.token(kind, value, None);
        self.start = self.cursor.pos();
        token
    }

    fn eof(&mut self) -> Token<'a> {
        self.state = State::Done;
        self.emit_value(TokenKind::Eof, String::new())
    }

    fn fail(&mut self, kind: LexErrorKind) -> Token<'a> {
        self.state = State::Done;
        let token = self.token(TokenKind::Error, String::new(), Some(kind));
        self.start = self.cursor.pos();
        token
    }

    fn token(&self, kind: TokenKind, value: String, error: Option<LexErrorKind>) -> Token<'a> {
        let (start, end) = (self.start, self.cursor.pos());
        let (start_line, start_col) = self.index.line_col(start);
        let (end_line, end_col) = self.index.line_col(end);
        Token {
            kind,
            raw: self.slice(start, end),
            value,
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
            error,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state != State::Done {
            if let Some(token) = self.step() {
                return Some(token);
            }
        }
        None
    }
}

/// How many tokens a parser may push back.
pub(crate) const LOOKAHEAD_DEPTH: usize = 2;

/// Bounded push-back buffer. Pushing past [`LOOKAHEAD_DEPTH`] is a bug in the
/// calling parser, not an input error, and panics.
#[derive(Debug)]
pub(crate) struct Lookahead<T> {
    pending: Vec<T>,
}

impl<T> Lookahead<T> {
    pub(crate) fn new() -> Self {
        Lookahead {
            pending: Vec::with_capacity(LOOKAHEAD_DEPTH),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        self.pending.pop()
    }

    pub(crate) fn push(&mut self, item: T) {
        assert!(
            self.pending.len() < LOOKAHEAD_DEPTH,
            "parser pushed back more than {LOOKAHEAD_DEPTH} tokens"
        );
        self.pending.push(item);
    }
}

/// A lexer whose terminal token repeats forever, so parsers can ask for
/// "the next token" without caring whether the lexer already finished.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    terminal: Option<Token<'a>>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        TokenStream {
            lexer,
            terminal: None,
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        if let Some(terminal) = &self.terminal {
            return terminal.clone();
        }
        match self.lexer.next() {
            Some(token) => {
                if token.is_terminal() {
                    self.terminal = Some(token.clone());
                }
                token
            }
            // The lexer always ends with a terminal token, so this only runs
            // if a caller drained it before wrapping it.
            None => self.lexer.eof(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str, grammar: Grammar) -> Vec<TokenKind> {
        Lexer::new(input, grammar).map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_ascii_plist_positions() {
        let input = "\n\t{\n\t\t$-_.:/ = (1, 2);\n\t\ta = <dead beef>;\n\t}\n";
        let tokens = Lexer::new(input, Grammar::AsciiPlist).collect::<Vec<_>>();

        let brace = &tokens[1];
        assert_eq!(brace.kind, TokenKind::BraceLeft);
        assert_eq!((brace.start, brace.end), (2, 3));
        assert_eq!((brace.start_line, brace.start_col), (2, 2));
        assert_eq!((brace.end_line, brace.end_col), (3, 0));

        let bare = &tokens[3];
        assert_eq!(bare.kind, TokenKind::BareString);
        assert_eq!(bare.raw, "$-_.:/");
        assert_eq!((bare.start_line, bare.start_col), (3, 3));
        assert_eq!((bare.end_line, bare.end_col), (3, 9));

        let last_spaces = &tokens[tokens.len() - 2];
        assert_eq!(last_spaces.kind, TokenKind::Spaces);
        assert_eq!((last_spaces.end_line, last_spaces.end_col), (0, 0));

        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.start, eof.end), (45, 45));
        assert_eq!((eof.start_line, eof.start_col), (0, 0));
    }

    #[test]
    fn test_lex_ascii_plist_kinds() {
        use TokenKind::*;
        assert_eq!(
            kinds("a = <dead beef>;", Grammar::AsciiPlist),
            vec![
                BareString,
                Spaces,
                EqualSign,
                Spaces,
                LessThan,
                BareString,
                Spaces,
                BareString,
                GreaterThan,
                Semicolon,
                Eof
            ]
        );
    }

    #[test]
    fn test_comment_value_is_trimmed_body() {
        let tokens = Lexer::new("/*  hello */", Grammar::DotStrings).collect::<Vec<_>>();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].raw, "/*  hello */");
        assert_eq!(tokens[0].value, "hello");
    }

    #[test]
    fn test_unterminated_comment_is_unexpected_eof() {
        let tokens = Lexer::new("/* open", Grammar::AsciiPlist).collect::<Vec<_>>();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].error, Some(LexErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_bare_string_stops_at_comment() {
        let tokens = Lexer::new("abc/*x*/", Grammar::AsciiPlist).collect::<Vec<_>>();
        assert_eq!(tokens[0].raw, "abc");
        assert_eq!(tokens[1].kind, TokenKind::Comment);
    }

    #[test]
    fn test_dot_strings_rejects_bare_words() {
        let tokens = Lexer::new("a = \"b\";", Grammar::DotStrings).collect::<Vec<_>>();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].error, Some(LexErrorKind::UnexpectedChar('a')));
        assert_eq!((tokens[0].start_line, tokens[0].start_col), (1, 1));
    }

    #[test]
    fn test_error_token_is_last() {
        let mut lexer = Lexer::new("\"open", Grammar::AsciiPlist);
        let token = lexer.next().unwrap();
        assert_eq!(token.error, Some(LexErrorKind::UnterminatedString));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_routine_call_skips_unknown_characters() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = f(@\"a\", 1 + b: #);", Grammar::RoutineCall(Dialect::ObjectiveC)),
            vec![
                Identifier, Spaces, Spaces, Identifier, ParenLeft, AtSign, String, Comma, Spaces,
                Spaces, Spaces, Identifier, Colon, Spaces, ParenRight, Eof
            ]
        );
    }

    #[test]
    fn test_string_token_value_is_decoded() {
        let tokens =
            Lexer::new("\"a\\nb\"", Grammar::RoutineCall(Dialect::Swift)).collect::<Vec<_>>();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].raw, "\"a\\nb\"");
        assert_eq!(tokens[0].value, "a\nb");
    }

    #[test]
    fn test_token_stream_repeats_terminal() {
        let mut stream = TokenStream::new(Lexer::new("", Grammar::AsciiPlist));
        assert_eq!(stream.next_token().kind, TokenKind::Eof);
        assert_eq!(stream.next_token().kind, TokenKind::Eof);
    }

    #[test]
    #[should_panic(expected = "pushed back more than")]
    fn test_lookahead_is_bounded() {
        let mut lookahead = Lookahead::new();
        lookahead.push(1);
        lookahead.push(2);
        lookahead.push(3);
    }
}
