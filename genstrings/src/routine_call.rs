//! Finds calls to a localization routine in Swift and Objective-C source.
//!
//! Source text is tokenized loosely: anything that is not an identifier, a
//! string literal or one of `@ ( ) : ,` is skipped. Whenever an identifier
//! equal to the routine name shows up the parser expects
//!
//! ```text
//! name '(' string-expr ',' [label ':'] string-expr ')'
//! ```
//!
//! where a string expression is a run of adjacent `"..."` literals or a run of
//! adjacent `@"..."` literals, concatenated.

use std::{collections::BTreeMap, path::Path};

use log::{debug, trace};
use serde::Serialize;

use crate::{
    error::{Error, Location},
    lexer::{Dialect, Grammar, Lexer, Lookahead, Token, TokenKind, TokenStream},
};

/// One call site of the localization routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineCall {
    pub path: String,
    pub start_line: usize,
    pub start_col: usize,
    pub key: String,
    pub comment: String,
}

impl RoutineCall {
    pub fn location(&self) -> Location {
        Location::new(&self.path, self.start_line, self.start_col)
    }
}

/// Picks the string dialect from the file extension.
pub fn dialect_for_path(path: &str) -> Option<Dialect> {
    match Path::new(path).extension()?.to_str()? {
        "swift" => Some(Dialect::Swift),
        "m" | "h" => Some(Dialect::ObjectiveC),
        _ => None,
    }
}

struct RoutineCallParser<'a> {
    path: &'a str,
    routine: &'a str,
    tokens: TokenStream<'a>,
    pending: Lookahead<Token<'a>>,
}

impl<'a> RoutineCallParser<'a> {
    fn next(&mut self) -> Token<'a> {
        self.pending
            .pop()
            .unwrap_or_else(|| self.tokens.next_token())
    }

    fn backup(&mut self, token: Token<'a>) {
        self.pending.push(token);
    }

    fn next_non_space(&mut self) -> Token<'a> {
        loop {
            let token = self.next();
            if token.kind != TokenKind::Spaces {
                return token;
            }
        }
    }

    fn unexpected(&self, token: &Token<'_>, expected: &str) -> Error {
        let location = Location::new(self.path, token.start_line, token.start_col);
        match &token.error {
            Some(kind) => Error::Lex {
                location,
                kind: kind.clone(),
            },
            None => Error::parse(
                location,
                format!("unexpected {}; expected {expected}", token.describe()),
            ),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, Error> {
        let token = self.next_non_space();
        if token.kind != kind {
            return Err(self.unexpected(&token, &kind.to_string()));
        }
        Ok(token)
    }

    fn parse(&mut self) -> Result<Vec<RoutineCall>, Error> {
        let mut calls = Vec::new();
        loop {
            let token = self.next_non_space();
            match token.kind {
                TokenKind::Eof => return Ok(calls),
                TokenKind::Error => return Err(self.unexpected(&token, "")),
                TokenKind::Identifier if token.raw == self.routine => {
                    let call = self.parse_call(&token)?;
                    trace!(path = self.path, key = call.key.as_str(); "Found routine call");
                    calls.push(call);
                }
                _ => {}
            }
        }
    }

    fn parse_call(&mut self, name: &Token<'a>) -> Result<RoutineCall, Error> {
        self.expect(TokenKind::ParenLeft)?;
        let key = self.parse_string()?;
        self.expect(TokenKind::Comma)?;
        self.skip_label()?;
        let comment = self.parse_string()?;
        self.expect(TokenKind::ParenRight)?;

        let location = Location::new(self.path, name.start_line, name.start_col);
        if key.is_empty() {
            return Err(Error::EmptyKey { location });
        }
        Ok(RoutineCall {
            path: location.path,
            start_line: location.line,
            start_col: location.col,
            key,
            comment,
        })
    }

    /// Parses a run of plain literals or a run of `@` literals.
    fn parse_string(&mut self) -> Result<String, Error> {
        let first = self.next_non_space();
        let at_sign = first.kind == TokenKind::AtSign;
        let mut out = if at_sign {
            self.expect(TokenKind::String)?.value
        } else if first.kind == TokenKind::String {
            first.value
        } else {
            return Err(self.unexpected(&first, "string"));
        };

        loop {
            let token = self.next_non_space();
            match token.kind {
                TokenKind::AtSign if at_sign => out.push_str(&self.expect(TokenKind::String)?.value),
                TokenKind::String if !at_sign => out.push_str(&token.value),
                _ => {
                    self.backup(token);
                    return Ok(out);
                }
            }
        }
    }

    /// Skips an optional `label:` before the comment argument.
    fn skip_label(&mut self) -> Result<(), Error> {
        let token = self.next_non_space();
        if token.kind != TokenKind::Identifier {
            self.backup(token);
            return Ok(());
        }
        self.expect(TokenKind::Colon)?;
        Ok(())
    }
}

/// Scans `src` for calls to `routine`. The string dialect follows the
/// extension of `path`: `.swift`, or `.m`/`.h` for Objective-C.
pub fn scan_routine_calls(src: &str, routine: &str, path: &str) -> Result<Vec<RoutineCall>, Error> {
    let dialect = dialect_for_path(path).ok_or_else(|| Error::UnknownFileType {
        path: path.to_string(),
    })?;
    let mut parser = RoutineCallParser {
        path,
        routine,
        tokens: TokenStream::new(Lexer::new(src, Grammar::RoutineCall(dialect))),
        pending: Lookahead::new(),
    };
    let calls = parser.parse()?;
    debug!(path, dialect:?, calls = calls.len(); "Scanned routine calls");
    Ok(calls)
}

/// Indexes calls by key. Every call must have a key, and all calls sharing a
/// key must carry the same comment. The first call seen for a key is kept.
pub fn index_routine_calls<'c>(
    calls: impl IntoIterator<Item = &'c RoutineCall>,
) -> Result<BTreeMap<String, RoutineCall>, Error> {
    let mut index: BTreeMap<String, RoutineCall> = BTreeMap::new();
    for call in calls {
        if call.key.is_empty() {
            return Err(Error::EmptyKey {
                location: call.location(),
            });
        }
        match index.get(&call.key) {
            Some(first) if first.comment != call.comment => {
                return Err(Error::ConflictingComment {
                    key: call.key.clone(),
                    first: first.location(),
                    second: call.location(),
                });
            }
            Some(_) => {}
            None => {
                index.insert(call.key.clone(), call.clone());
            }
        }
    }
    Ok(index)
}
