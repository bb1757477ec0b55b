//! String literal decoders for the three escape grammars, and the inverse
//! escaper for property-list strings.
//!
//! Each decoder starts right after the opening `"`, consumes up to and
//! including the closing `"`, and returns the decoded text. On failure the
//! cursor is left wherever the problem was found; the lexer reports the
//! error at the start of the literal.

use unicode_general_category::{GeneralCategory, get_general_category};

use crate::{error::LexErrorKind, lexer::Cursor};

fn hex_digits(cursor: &mut Cursor<'_>, max: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut count = 0;
    while count < max {
        let Some(digit) = cursor.peek().and_then(|c| c.to_digit(16)) else {
            break;
        };
        cursor.bump();
        value = value * 16 + digit;
        count += 1;
    }
    (value, count)
}

fn octal_digits(cursor: &mut Cursor<'_>, first: u32, max: usize) -> (u32, usize) {
    let mut value = first;
    let mut count = 1;
    while count < max {
        let Some(digit) = cursor.peek().and_then(|c| c.to_digit(8)) else {
            break;
        };
        cursor.bump();
        value = value * 8 + digit;
        count += 1;
    }
    (value, count)
}

/// Escapes shared by the Objective-C and property-list grammars.
fn c_escape(c: char) -> Option<char> {
    let decoded = match c {
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{0B}',
        '\'' => '\'',
        '"' => '"',
        '?' => '?',
        '\\' => '\\',
        _ => return None,
    };
    Some(decoded)
}

/// Decodes a Swift string literal body.
pub(crate) fn decode_swift(cursor: &mut Cursor<'_>) -> Result<String, LexErrorKind> {
    let mut out = String::new();
    loop {
        match cursor.bump() {
            None | Some('\n' | '\r') => return Err(LexErrorKind::UnterminatedString),
            Some('"') => return Ok(out),
            Some('\\') => match cursor.bump() {
                None | Some('\n' | '\r') => return Err(LexErrorKind::UnterminatedString),
                Some('\\') => out.push('\\'),
                Some('0') => out.push('\0'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('\'') => out.push('\''),
                Some('"') => out.push('"'),
                Some('u') => out.push(swift_unicode_scalar(cursor)?),
                Some(_) => return Err(LexErrorKind::InvalidEscape),
            },
            Some(c) => out.push(c),
        }
    }
}

/// `\u{H...}` with one to eight hex digits.
fn swift_unicode_scalar(cursor: &mut Cursor<'_>) -> Result<char, LexErrorKind> {
    if !cursor.eat('{') {
        return Err(LexErrorKind::InvalidUnicodeEscape);
    }
    let (value, count) = hex_digits(cursor, 8);
    if count == 0 || !cursor.eat('}') {
        return Err(LexErrorKind::InvalidUnicodeEscape);
    }
    char::from_u32(value).ok_or(LexErrorKind::InvalidUnicodeEscape)
}

/// Decodes an Objective-C string literal body.
pub(crate) fn decode_objc(cursor: &mut Cursor<'_>) -> Result<String, LexErrorKind> {
    let mut out = String::new();
    loop {
        match cursor.bump() {
            None | Some('\n') => return Err(LexErrorKind::UnterminatedString),
            Some('"') => return Ok(out),
            Some('\\') => {
                let Some(c) = cursor.bump() else {
                    return Err(LexErrorKind::UnterminatedString);
                };
                if let Some(decoded) = c_escape(c) {
                    out.push(decoded);
                    continue;
                }
                match c {
                    'u' => out.push(universal_character_name(cursor, 4)?),
                    'U' => out.push(universal_character_name(cursor, 8)?),
                    'x' => {
                        let (value, count) = hex_digits(cursor, 2);
                        out.push(ascii_escape(value, count)?);
                    }
                    '0'..='7' => {
                        let (value, count) = octal_digits(cursor, c as u32 - '0' as u32, 3);
                        out.push(ascii_escape(value, count)?);
                    }
                    '\n' => return Err(LexErrorKind::UnterminatedString),
                    _ => return Err(LexErrorKind::InvalidEscape),
                }
            }
            Some(c) => out.push(c),
        }
    }
}

fn ascii_escape(value: u32, count: usize) -> Result<char, LexErrorKind> {
    if count == 0 || value > 0x7F {
        return Err(LexErrorKind::InvalidEscape);
    }
    char::from_u32(value).ok_or(LexErrorKind::InvalidEscape)
}

/// `\uHHHH` or `\UHHHHHHHH`, which must name a character C allows as a
/// universal character name.
fn universal_character_name(cursor: &mut Cursor<'_>, digits: usize) -> Result<char, LexErrorKind> {
    let (value, count) = hex_digits(cursor, digits);
    if count != digits {
        return Err(LexErrorKind::InvalidUniversalCharacterName);
    }
    if value < 0xA0 && !matches!(value, 0x24 | 0x40 | 0x60) {
        return Err(LexErrorKind::InvalidUniversalCharacterName);
    }
    // `char::from_u32` also rejects the surrogate block.
    char::from_u32(value).ok_or(LexErrorKind::InvalidUniversalCharacterName)
}

/// Decodes a property-list string body. Raw newlines are allowed.
pub(crate) fn decode_plist(cursor: &mut Cursor<'_>) -> Result<String, LexErrorKind> {
    let mut out = String::new();
    loop {
        match cursor.bump() {
            None => return Err(LexErrorKind::UnterminatedString),
            Some('"') => return Ok(out),
            Some('\\') => {
                let Some(c) = cursor.bump() else {
                    return Err(LexErrorKind::UnterminatedString);
                };
                if let Some(decoded) = c_escape(c) {
                    out.push(decoded);
                    continue;
                }
                match c {
                    'U' => out.push(utf16_escape(cursor)?),
                    '0'..='7' => {
                        let (value, count) = octal_digits(cursor, c as u32 - '0' as u32, 3);
                        if count != 3 {
                            return Err(LexErrorKind::InvalidEscape);
                        }
                        out.push(char::from_u32(value).ok_or(LexErrorKind::InvalidEscape)?);
                    }
                    _ => return Err(LexErrorKind::InvalidEscape),
                }
            }
            Some(c) => out.push(c),
        }
    }
}

/// `\UH{1,4}` holds one UTF-16 code unit; a high surrogate must be followed
/// by `\UHHHH` holding the low half.
fn utf16_escape(cursor: &mut Cursor<'_>) -> Result<char, LexErrorKind> {
    let (unit, count) = hex_digits(cursor, 4);
    if count == 0 {
        return Err(LexErrorKind::InvalidUtf16Escape);
    }
    match unit {
        0xD800..=0xDBFF => {
            if !(cursor.eat('\\') && cursor.eat('U')) {
                return Err(LexErrorKind::InvalidUtf16Escape);
            }
            let (low, count) = hex_digits(cursor, 4);
            if count != 4 || !(0xDC00..=0xDFFF).contains(&low) {
                return Err(LexErrorKind::InvalidUtf16Escape);
            }
            let scalar = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            char::from_u32(scalar).ok_or(LexErrorKind::InvalidUtf16Escape)
        }
        0xDC00..=0xDFFF => Err(LexErrorKind::InvalidUtf16Escape),
        _ => char::from_u32(unit).ok_or(LexErrorKind::InvalidUtf16Escape),
    }
}

/// Whether `c` can be written literally inside a quoted plist string:
/// letters, marks, numbers, punctuation, symbols and the ASCII space.
fn is_printable(c: char) -> bool {
    use GeneralCategory::*;

    c == ' '
        || matches!(
            get_general_category(c),
            UppercaseLetter
                | LowercaseLetter
                | TitlecaseLetter
                | ModifierLetter
                | OtherLetter
                | NonspacingMark
                | SpacingMark
                | EnclosingMark
                | DecimalNumber
                | LetterNumber
                | OtherNumber
                | ConnectorPunctuation
                | DashPunctuation
                | OpenPunctuation
                | ClosePunctuation
                | InitialPunctuation
                | FinalPunctuation
                | OtherPunctuation
                | MathSymbol
                | CurrencySymbol
                | ModifierSymbol
                | OtherSymbol
        )
}

/// Renders `s` as a quoted ASCII property-list string literal that
/// [`crate::ascii_plist::parse_ascii_plist`] decodes back to `s`.
///
/// ```
/// use genstrings::serialize_ascii_plist_string;
///
/// assert_eq!(serialize_ascii_plist_string("a\"b\n"), r#""a\"b\n""#);
/// assert_eq!(serialize_ascii_plist_string("\u{00A0}"), r#""\U00A0""#);
/// ```
pub fn serialize_ascii_plist_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\u{07}' => out.push_str(r"\a"),
            '\u{08}' => out.push_str(r"\b"),
            '\u{0C}' => out.push_str(r"\f"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            '\u{0B}' => out.push_str(r"\v"),
            '"' => out.push_str("\\\""),
            c if is_printable(c) => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\U{unit:04X}"));
                }
            }
        }
    }
    out.push('"');
    out
}
